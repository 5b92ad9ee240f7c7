//! Simulator settings: where readings go and how often.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Topic used both for the subscription on connect and for every reading.
pub const DEFAULT_TOPIC: &str = "smartguard/sensors";

/// Pause between two publications.
pub const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 1000;

/// The `[simulator]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Topic readings are published to.
    #[validate(length(min = 1, max = 65535, message = "Topic must not be empty"))]
    pub topic: String,

    /// Delay after each publication, in milliseconds.
    #[validate(range(min = 1, message = "Publish interval must be at least 1 ms"))]
    pub publish_interval_ms: u64,

    /// QoS for publications and the subscription. The simulator does not wait
    /// for acknowledgments at any level.
    #[validate(range(max = 2, message = "QoS must be 0, 1 or 2"))]
    pub qos: u8,

    /// Retain flag on publications.
    pub retain: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            publish_interval_ms: DEFAULT_PUBLISH_INTERVAL_MS,
            qos: 0,
            retain: false,
        }
    }
}

impl SimulatorConfig {
    pub fn publish_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.publish_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulatorConfig::default();
        assert_eq!(config.topic, "smartguard/sensors");
        assert_eq!(config.publish_interval(), std::time::Duration::from_secs(1));
        assert_eq!(config.qos, 0);
        assert!(!config.retain);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = SimulatorConfig {
            topic: String::new(),
            publish_interval_ms: 0,
            qos: 3,
            retain: false,
        };
        let errors = config.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("topic"));
        assert!(fields.contains_key("publish_interval_ms"));
        assert!(fields.contains_key("qos"));
    }
}
