use crate::error::StoreError;
use std::env;
use std::time::Duration;

/// Recording and error policy, replaceable at runtime via
/// [`Store::with_options`](crate::Store::with_options).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Capture dispatched actions in the history buffer.
    pub record: bool,
    /// Maximum history length; 0 keeps everything.
    pub record_size: usize,
    /// Keep the previous state when the reducer reports an error.
    pub rollback_on_error: bool,
}

impl Options {
    /// Record every action with no bound.
    pub fn recording() -> Self {
        Self {
            record: true,
            ..Self::default()
        }
    }

    /// Record the last `size` actions.
    pub fn recording_last(size: usize) -> Self {
        Self {
            record: true,
            record_size: size,
            ..Self::default()
        }
    }
}

/// What fan-out does when a subscriber's buffer is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overflow {
    /// Wait for room. A sink that is never drained stalls the dispatcher.
    #[default]
    Block,
    /// Wait for room up to the given duration, then skip this notification.
    Timeout(Duration),
    /// Skip the notification immediately.
    DropNewest,
}

/// Construction-time settings for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Capacity of the action queue shared by `submit` and `dispatch`.
    pub queue_capacity: usize,
    /// Buffer size of channels created by `Store::subscription`.
    pub subscriber_capacity: usize,
    /// Policy used by `Store::subscribe` and `Store::subscription`.
    pub overflow: Overflow,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            subscriber_capacity: 16,
            overflow: Overflow::Block,
        }
    }
}

impl StoreConfig {
    /// Set the action queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the buffer size used by `Store::subscription`.
    pub fn with_subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity;
        self
    }

    /// Set the overflow policy used by `Store::subscribe`.
    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// - `TINDUX_QUEUE_CAPACITY`
    /// - `TINDUX_SUBSCRIBER_CAPACITY`
    /// - `TINDUX_NOTIFY_TIMEOUT_MS` (switches the overflow policy to `Timeout`)
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let mut config = Self::default();
        let queue: Option<usize> = parse_var(&lookup, "TINDUX_QUEUE_CAPACITY")?;
        let subscriber: Option<usize> = parse_var(&lookup, "TINDUX_SUBSCRIBER_CAPACITY")?;
        let timeout_ms: Option<u64> = parse_var(&lookup, "TINDUX_NOTIFY_TIMEOUT_MS")?;

        if let Some(capacity) = queue {
            config.queue_capacity = capacity;
        }
        if let Some(capacity) = subscriber {
            config.subscriber_capacity = capacity;
        }
        if let Some(millis) = timeout_ms {
            config.overflow = Overflow::Timeout(Duration::from_millis(millis));
        }
        config.validate()?;
        Ok(config)
    }

    /// tokio channels panic on zero capacity, so reject it up front.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.queue_capacity == 0 {
            return Err(StoreError::Config("queue_capacity must be at least 1".into()));
        }
        if self.subscriber_capacity == 0 {
            return Err(StoreError::Config(
                "subscriber_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, L>(lookup: &L, key: &str) -> Result<Option<T>, StoreError>
where
    T: std::str::FromStr,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| {
                StoreError::Config(format!("{key} must be a non-negative integer, got {raw:?}"))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("TINDUX_QUEUE_CAPACITY", "8"),
            ("TINDUX_SUBSCRIBER_CAPACITY", " 2 "),
            ("TINDUX_NOTIFY_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.subscriber_capacity, 2);
        assert_eq!(config.overflow, Overflow::Timeout(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_garbage_and_zero() {
        let err = StoreConfig::from_lookup(lookup(&[("TINDUX_QUEUE_CAPACITY", "lots")])).unwrap_err();
        assert!(matches!(err, StoreError::Config(msg) if msg.contains("TINDUX_QUEUE_CAPACITY")));

        let err = StoreConfig::from_lookup(lookup(&[("TINDUX_SUBSCRIBER_CAPACITY", "0")])).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn options_presets() {
        assert!(!Options::default().record);
        assert_eq!(Options::recording().record_size, 0);
        let last = Options::recording_last(5);
        assert!(last.record);
        assert_eq!(last.record_size, 5);
        assert!(!last.rollback_on_error);
    }
}
