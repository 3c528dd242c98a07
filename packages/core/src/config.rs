//! Tracker configuration.

use serde::{Deserialize, Serialize};

/// Upper bound on the live buffer of a subscriber channel.
pub const MAX_SUBSCRIBER_CAPACITY: usize = 65_536;

/// Configuration shared by every queue and job of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Live buffer of each subscriber channel, on top of the replayed history.
    ///
    /// A producer blocks once any subscriber has this many undelivered
    /// entries queued. Entries are never dropped.
    pub subscriber_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: 100,
        }
    }
}

impl TrackerConfig {
    /// Set the subscriber buffer size, clamped to `1..=MAX_SUBSCRIBER_CAPACITY`.
    pub fn with_subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity.clamp(1, MAX_SUBSCRIBER_CAPACITY);
        self
    }

    /// Effective capacity, within `1..=MAX_SUBSCRIBER_CAPACITY`.
    pub fn capacity(&self) -> usize {
        self.subscriber_capacity.clamp(1, MAX_SUBSCRIBER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: TrackerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.subscriber_capacity, 100);
    }

    #[test]
    fn capacity_is_never_zero() {
        let config = TrackerConfig::default().with_subscriber_capacity(0);
        assert_eq!(config.capacity(), 1);

        let raw: TrackerConfig = serde_json::from_str(r#"{"subscriber_capacity":0}"#).unwrap();
        assert_eq!(raw.capacity(), 1);
    }

    #[test]
    fn capacity_is_bounded_above() {
        let config = TrackerConfig::default().with_subscriber_capacity(usize::MAX);
        assert_eq!(config.subscriber_capacity, MAX_SUBSCRIBER_CAPACITY);

        let raw = TrackerConfig {
            subscriber_capacity: usize::MAX,
        };
        assert_eq!(raw.capacity(), MAX_SUBSCRIBER_CAPACITY);
    }
}
