//! Typed content-filter registry.
//!
//! Filters rewrite entry text between its raw (stored/editable) form and
//! its rendered form. The registry is an ordered list iterated in
//! registration order; the projection layer stays decoupled from any
//! specific filter. Concrete mention/hashtag/emoji filters belong to the
//! host pipeline - only the key-command filter ships here, because the
//! CRUD surface depends on it.

/// One reversible text transform.
pub trait ContentFilter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Does the raw text carry this filter's marker?
    fn matches(&self, text: &str) -> bool;

    /// Raw -> rendered.
    fn apply(&self, text: &str) -> String;

    /// Rendered -> raw, for editing round-trips.
    fn revert(&self, text: &str) -> String;
}

/// Ordered filter pipeline.
#[derive(Default)]
pub struct FilterRegistry {
    filters: Vec<Box<dyn ContentFilter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock pipeline: just the key-command filter.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(KeyCommandFilter));
        registry
    }

    pub fn register(&mut self, filter: Box<dyn ContentFilter>) {
        self.filters.push(filter);
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ContentFilter> {
        self.filters.iter().map(|f| f.as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&dyn ContentFilter> {
        self.iter().find(|f| f.name() == name)
    }

    /// Run every matching filter's `apply`, in registration order.
    pub fn apply_all(&self, text: &str) -> String {
        self.filters.iter().fold(text.to_string(), |acc, filter| {
            if filter.matches(&acc) {
                filter.apply(&acc)
            } else {
                acc
            }
        })
    }

    /// Run every filter's `revert`, in registration order.
    pub fn revert_all(&self, text: &str) -> String {
        self.filters
            .iter()
            .fold(text.to_string(), |acc, filter| filter.revert(&acc))
    }
}

/// The `/key` slash command: flags an entry as a key event.
///
/// Raw form starts with `/key`; rendered form has the command stripped.
pub struct KeyCommandFilter;

pub const KEY_COMMAND: &str = "/key";

impl KeyCommandFilter {
    fn strip(text: &str) -> Option<&str> {
        let trimmed = text.trim_start();
        let rest = trimmed.strip_prefix(KEY_COMMAND)?;
        // "/key" alone or followed by whitespace; "/keynote" is content
        if rest.is_empty() {
            Some("")
        } else if rest.starts_with(char::is_whitespace) {
            Some(rest.trim_start())
        } else {
            None
        }
    }
}

impl ContentFilter for KeyCommandFilter {
    fn name(&self) -> &'static str {
        "key_command"
    }

    fn matches(&self, text: &str) -> bool {
        Self::strip(text).is_some()
    }

    fn apply(&self, text: &str) -> String {
        Self::strip(text).map_or_else(|| text.to_string(), |rest| rest.to_string())
    }

    fn revert(&self, text: &str) -> String {
        if self.matches(text) {
            text.to_string()
        } else {
            format!("{KEY_COMMAND} {text}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_command_round_trip() {
        let filter = KeyCommandFilter;
        assert!(filter.matches("/key Goal!"));
        assert_eq!(filter.apply("/key Goal!"), "Goal!");
        assert_eq!(filter.revert("Goal!"), "/key Goal!");
        assert!(!filter.matches("/keynote speech"));
        assert!(!filter.matches("just text"));
    }

    #[test]
    fn registry_applies_in_registration_order() {
        struct Tag(&'static str);
        impl ContentFilter for Tag {
            fn name(&self) -> &'static str {
                self.0
            }
            fn matches(&self, _: &str) -> bool {
                true
            }
            fn apply(&self, text: &str) -> String {
                format!("{text}+{}", self.0)
            }
            fn revert(&self, text: &str) -> String {
                text.strip_suffix(&format!("+{}", self.0))
                    .unwrap_or(text)
                    .to_string()
            }
        }

        let mut registry = FilterRegistry::new();
        registry.register(Box::new(Tag("a")));
        registry.register(Box::new(Tag("b")));
        assert_eq!(registry.apply_all("x"), "x+a+b");
    }

    #[test]
    fn non_matching_filters_leave_text_alone() {
        let registry = FilterRegistry::with_defaults();
        assert_eq!(registry.apply_all("plain entry"), "plain entry");
    }
}
