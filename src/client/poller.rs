//! The polling controller.
//!
//! A driver thread owns the schedule and the backoff state; a separate
//! fetch worker runs the blocking fetch so the driver can enforce a
//! per-fetch timeout and keep handling commands. Fetches are serialized
//! by construction (one worker, one queue), and every request carries a
//! poll sequence number so a response that arrives after its deadline,
//! or after the stream context moved on, is discarded instead of
//! applied.

use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use thiserror::Error;

use crate::api::WireEntry;
use crate::core::{StreamId, Timestamp};
use crate::error::{Effect, Transience};

use super::backoff::{BackoffPolicy, BackoffState, Focus};

/// Why a fetch failed. All of these feed the backoff counter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("network: {0}")]
    Network(String),

    #[error("fetch timed out")]
    Timeout,

    #[error("server returned status {0}")]
    Status(u16),
}

impl FetchError {
    pub fn transience(&self) -> Transience {
        Transience::Retryable
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// One poll: "give me everything since `since`".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollRequest {
    pub stream: StreamId,
    pub since: Timestamp,
    /// Driver-assigned sequence; responses with a stale sequence are
    /// dropped.
    pub seq: u64,
}

/// A successful poll response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollUpdate {
    pub entries: Vec<WireEntry>,
    /// Watermark for the next poll window.
    pub latest_timestamp: Option<Timestamp>,
}

/// The transport seam. The host client implements this over its HTTP
/// stack; tests script it.
pub trait EntryFetcher: Send + 'static {
    fn fetch(&mut self, request: &PollRequest) -> Result<PollUpdate, FetchError>;
}

impl<F> EntryFetcher for F
where
    F: FnMut(&PollRequest) -> Result<PollUpdate, FetchError> + Send + 'static,
{
    fn fetch(&mut self, request: &PollRequest) -> Result<PollUpdate, FetchError> {
        self(request)
    }
}

/// Everything the driver needs to know, taken from config.
#[derive(Clone, Copy, Debug)]
pub struct PollingConfig {
    pub policy: BackoffPolicy,
    pub fetch_timeout: std::time::Duration,
}

/// What stopped the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The failure ceiling was reached; polling stays off until reset.
    BreakerTripped,
    /// `stop()` was called or the controller was dropped.
    Requested,
}

/// Delivered to the consumer over the event channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollEvent {
    Update(PollUpdate),
    Failure(FetchError),
    Stopped(StopReason),
}

enum Command {
    PollNow,
    SetFocus(Focus),
    Reset,
    Stop,
}

/// Handle to a running controller. Dropping it stops polling.
pub struct PollingController {
    control: Sender<Command>,
    events: Receiver<PollEvent>,
    driver: Option<JoinHandle<()>>,
}

impl PollingController {
    /// Start polling `stream` from the `since` watermark.
    pub fn spawn<F: EntryFetcher>(
        config: PollingConfig,
        stream: StreamId,
        since: Timestamp,
        fetcher: F,
    ) -> Self {
        let (control_tx, control_rx) = unbounded::<Command>();
        let (event_tx, event_rx) = unbounded::<PollEvent>();
        let (request_tx, request_rx) = unbounded::<PollRequest>();
        let (result_tx, result_rx) = unbounded::<(u64, Result<PollUpdate, FetchError>)>();

        // detached on purpose: it exits when the driver drops its queue
        let _ = std::thread::Builder::new()
            .name("liveline-poll-fetch".into())
            .spawn(move || fetch_worker(fetcher, request_rx, result_tx))
            .expect("spawn fetch worker");

        let driver = std::thread::Builder::new()
            .name("liveline-poll-driver".into())
            .spawn(move || {
                Driver {
                    config,
                    stream,
                    since,
                    control: control_rx,
                    events: event_tx,
                    requests: request_tx,
                    results: result_rx,
                    backoff: BackoffState::new(),
                    focus: Focus::Foreground,
                    seq: 0,
                }
                .run()
            })
            .expect("spawn poll driver");

        Self {
            control: control_tx,
            events: event_rx,
            driver: Some(driver),
        }
    }

    /// Event stream for the consumer to select on.
    pub fn events(&self) -> &Receiver<PollEvent> {
        &self.events
    }

    /// Fire a poll immediately, ignoring the current delay.
    pub fn poll_now(&self) {
        let _ = self.control.send(Command::PollNow);
    }

    pub fn set_focus(&self, focus: Focus) {
        let _ = self.control.send(Command::SetFocus(focus));
    }

    /// Re-arm after the breaker tripped (user-initiated retry). Also
    /// clears the failure counter while running.
    pub fn reset(&self) {
        let _ = self.control.send(Command::Reset);
    }

    pub fn stop(&self) {
        let _ = self.control.send(Command::Stop);
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        let _ = self.control.send(Command::Stop);
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}

fn fetch_worker<F: EntryFetcher>(
    mut fetcher: F,
    requests: Receiver<PollRequest>,
    results: Sender<(u64, Result<PollUpdate, FetchError>)>,
) {
    for request in requests.iter() {
        let seq = request.seq;
        let outcome = fetcher.fetch(&request);
        if results.send((seq, outcome)).is_err() {
            break;
        }
    }
}

struct Driver {
    config: PollingConfig,
    stream: StreamId,
    since: Timestamp,
    control: Receiver<Command>,
    events: Sender<PollEvent>,
    requests: Sender<PollRequest>,
    results: Receiver<(u64, Result<PollUpdate, FetchError>)>,
    backoff: BackoffState,
    focus: Focus,
    seq: u64,
}

impl Driver {
    fn run(mut self) {
        loop {
            if self.backoff.is_stopped() {
                // breaker tripped: no polls, commands only
                match self.control.recv() {
                    Ok(Command::Reset) => {
                        self.backoff.reset();
                        tracing::debug!(stream = %self.stream, "poller reset after breaker");
                        self.poll();
                    }
                    Ok(Command::SetFocus(focus)) => self.focus = focus,
                    Ok(Command::PollNow) => {}
                    Ok(Command::Stop) | Err(_) => {
                        let _ = self.events.send(PollEvent::Stopped(StopReason::Requested));
                        return;
                    }
                }
                continue;
            }

            let delay = self.backoff.next_delay(&self.config.policy, self.focus);
            match self.control.recv_timeout(delay) {
                Ok(Command::PollNow) | Err(RecvTimeoutError::Timeout) => self.poll(),
                Ok(Command::SetFocus(focus)) => self.focus = focus,
                Ok(Command::Reset) => self.backoff.reset(),
                Ok(Command::Stop) => {
                    let _ = self.events.send(PollEvent::Stopped(StopReason::Requested));
                    return;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    fn poll(&mut self) {
        self.seq += 1;
        // flush results from polls that already timed out
        while self.results.try_recv().is_ok() {}

        let request = PollRequest {
            stream: self.stream,
            since: self.since,
            seq: self.seq,
        };
        if self.requests.send(request).is_err() {
            let _ = self.events.send(PollEvent::Stopped(StopReason::Requested));
            return;
        }

        let deadline = Instant::now() + self.config.fetch_timeout;
        let outcome = loop {
            match self.results.recv_deadline(deadline) {
                Ok((seq, outcome)) if seq == self.seq => break Some(outcome),
                // stale response from a cancelled poll - discard
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => break None,
                Err(RecvTimeoutError::Disconnected) => {
                    break Some(Err(FetchError::Network("fetch worker gone".into())))
                }
            }
        };

        match outcome {
            Some(Ok(update)) => {
                self.backoff.on_success();
                if let Some(ts) = update.latest_timestamp {
                    self.since = ts;
                }
                let _ = self.events.send(PollEvent::Update(update));
            }
            Some(Err(err)) => self.fail(err),
            None => self.fail(FetchError::Timeout),
        }
    }

    fn fail(&mut self, err: FetchError) {
        tracing::debug!(stream = %self.stream, failures = self.backoff.failures() + 1, %err, "poll failed");
        if self.backoff.on_failure(&self.config.policy) {
            let _ = self.events.send(PollEvent::Failure(err));
        } else {
            tracing::warn!(stream = %self.stream, "poll circuit breaker tripped");
            let _ = self
                .events
                .send(PollEvent::Stopped(StopReason::BreakerTripped));
        }
    }
}
