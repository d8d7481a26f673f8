//! Adaptive polling interval with a circuit breaker.
//!
//! Backoff steps up linearly, not exponentially: every time the
//! consecutive-failure counter crosses another multiple of the delay
//! threshold, one more (multiplier - 1) share of the base interval is
//! added. A hard failure ceiling trips the breaker; from there no poll
//! fires until an explicit reset.

use std::time::Duration;

/// Whether the consuming surface is in the foreground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Foreground,
    Background,
}

/// Tuning knobs, taken from config.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Interval between polls while things are healthy.
    pub base: Duration,
    /// Interval while the tab/window is out of focus.
    pub background: Duration,
    /// Failures per backoff step.
    pub delay_threshold: u32,
    /// Interval factor applied at the first step.
    pub delay_multiplier: u32,
    /// Consecutive failures that trip the breaker.
    pub max_consecutive_retries: u32,
}

/// Consecutive-failure counter plus the tripped flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct BackoffState {
    failures: u32,
    stopped: bool,
}

impl BackoffState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn on_success(&mut self) {
        self.failures = 0;
    }

    /// Count a failure. Returns false once the breaker has tripped.
    pub fn on_failure(&mut self, policy: &BackoffPolicy) -> bool {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= policy.max_consecutive_retries {
            self.stopped = true;
        }
        !self.stopped
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.stopped = false;
    }

    /// Delay before the next poll at the current failure count.
    pub fn next_delay(&self, policy: &BackoffPolicy, focus: Focus) -> Duration {
        let base = match focus {
            Focus::Foreground => policy.base,
            Focus::Background => policy.background,
        };
        let steps = if policy.delay_threshold == 0 {
            0
        } else {
            self.failures / policy.delay_threshold
        };
        let factor = 1 + steps * policy.delay_multiplier.saturating_sub(1);
        base * factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_secs(10),
            background: Duration::from_secs(60),
            delay_threshold: 5,
            delay_multiplier: 2,
            max_consecutive_retries: 100,
        }
    }

    #[test]
    fn interval_unchanged_below_threshold() {
        let policy = policy();
        let mut state = BackoffState::new();
        for _ in 0..4 {
            assert!(state.on_failure(&policy));
        }
        assert_eq!(
            state.next_delay(&policy, Focus::Foreground),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn fifth_failure_doubles_the_interval() {
        let policy = policy();
        let mut state = BackoffState::new();
        for _ in 0..5 {
            assert!(state.on_failure(&policy));
        }
        assert_eq!(
            state.next_delay(&policy, Focus::Foreground),
            Duration::from_secs(20)
        );
    }

    #[test]
    fn step_up_is_linear_not_exponential() {
        let policy = policy();
        let mut state = BackoffState::new();
        for _ in 0..10 {
            assert!(state.on_failure(&policy));
        }
        // two steps: x3, not x4
        assert_eq!(
            state.next_delay(&policy, Focus::Foreground),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn success_resets_the_counter() {
        let policy = policy();
        let mut state = BackoffState::new();
        for _ in 0..7 {
            state.on_failure(&policy);
        }
        state.on_success();
        assert_eq!(state.failures(), 0);
        assert_eq!(
            state.next_delay(&policy, Focus::Foreground),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn breaker_trips_at_the_ceiling_and_reset_rearms() {
        let policy = policy();
        let mut state = BackoffState::new();
        for _ in 0..99 {
            assert!(state.on_failure(&policy));
        }
        assert!(!state.is_stopped());
        // the 100th consecutive failure stops everything
        assert!(!state.on_failure(&policy));
        assert!(state.is_stopped());

        state.reset();
        assert!(!state.is_stopped());
        assert_eq!(state.failures(), 0);
    }

    #[test]
    fn background_focus_uses_the_longer_base() {
        let policy = policy();
        let state = BackoffState::new();
        assert_eq!(
            state.next_delay(&policy, Focus::Background),
            Duration::from_secs(60)
        );
    }
}
