//! Configuration for the MQTT 3.1.1 transport.
//!
//! `Config` supports serde deserialization, so it can be embedded as the
//! `[transport]` table of the simulator's TOML file. Defaults reproduce the
//! public-broker setup the simulator was designed around:
//! `broker.hivemq.com:1883` with a 60 second keep-alive.
//!
//! # Validation
//!
//! All constraints are expressed with the `validator` crate, so invalid
//! settings fail at load time instead of at connect time.
//!
//! # Examples
//!
//! ```ignore
//! let config = Config {
//!     host: "mqtt.example.com".into(),
//!     keep_alive: 30,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Default public broker.
pub const DEFAULT_HOST: &str = "broker.hivemq.com";

/// Default unencrypted MQTT port.
pub const DEFAULT_PORT: u16 = 1883;

/// Default keep-alive interval in seconds.
pub const DEFAULT_KEEP_ALIVE: u64 = 60;

/// Main MQTT connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Broker hostname or IP address.
    ///
    /// DNS resolution happens when the network loop first connects.
    ///
    /// ```toml
    /// host = "broker.hivemq.com"
    /// ```
    #[validate(length(
        min = 1,
        max = 255,
        message = "Host must be between 1 and 255 characters"
    ))]
    pub host: String,

    /// Broker port number (1883 for plain MQTT).
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Keep-alive interval in seconds.
    ///
    /// The client pings the broker when idle for this long; the broker drops
    /// the session after 1.5x this interval of silence.
    #[validate(range(
        min = 5,
        max = 3600,
        message = "Keep alive must be between 5 and 3600 seconds"
    ))]
    pub keep_alive: u64,

    /// Unique identifier for this client.
    ///
    /// If empty, a UUID is generated when the client is built.
    #[validate(length(max = 36, message = "Client ID must be at most 36 characters"))]
    pub client_id: String,

    /// Whether to request a clean session from the broker.
    pub clean_session: bool,

    /// Maximum number of QoS 1 and QoS 2 messages in flight.
    #[validate(range(
        min = 1,
        max = 1000,
        message = "Max inflight must be between 1 and 1000"
    ))]
    pub max_inflight: u16,

    /// Maximum MQTT packet size in bytes, for both directions.
    #[validate(range(
        min = 64,
        max = 65535,
        message = "Max packet size must be between 64 and 65535 bytes"
    ))]
    pub max_packet_size: Option<u16>,

    /// How many requests may queue between the client and the network loop
    /// before `publish` waits.
    #[validate(range(
        min = 1,
        max = 255,
        message = "Request channel capacity must be between 1 and 255"
    ))]
    pub request_channel_capacity: Option<u8>,

    /// Upper bound, in milliseconds, on flushing the DISCONNECT packet during
    /// shutdown.
    #[validate(range(
        min = 1,
        max = 60000,
        message = "Disconnect timeout must be between 1 and 60000 milliseconds"
    ))]
    pub disconnect_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            keep_alive: DEFAULT_KEEP_ALIVE,
            client_id: String::new(),
            clean_session: true,
            max_inflight: 10,
            max_packet_size: None,
            request_channel_capacity: Some(10),
            disconnect_timeout_ms: 2000,
        }
    }
}

impl Config {
    /// Returns the configured client id, or a fresh UUID when none is set.
    pub fn resolved_client_id(&self) -> String {
        if self.client_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            self.client_id.clone()
        }
    }

    /// Broker address as `host:port`, for log lines.
    pub fn broker_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.host, "broker.hivemq.com");
        assert_eq!(config.port, 1883);
        assert_eq!(config.keep_alive, 60);
    }

    #[test]
    fn test_empty_host_rejected() {
        let config = Config {
            host: String::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Host must be between"));
    }

    #[test]
    fn test_keep_alive_out_of_range_rejected() {
        let config = Config {
            keep_alive: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolved_client_id_generates_uuid() {
        let config = Config::default();
        let id = config.resolved_client_id();
        assert_eq!(id.len(), 36);
        assert_ne!(id, config.resolved_client_id());
    }

    #[test]
    fn test_resolved_client_id_keeps_explicit_value() {
        let config = Config {
            client_id: "crane-01".into(),
            ..Default::default()
        };
        assert_eq!(config.resolved_client_id(), "crane-01");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("host = \"localhost\"\nport = 1884\n").unwrap();
        assert_eq!(config.broker_addr(), "localhost:1884");
        assert_eq!(config.keep_alive, DEFAULT_KEEP_ALIVE);
        assert_eq!(config.request_channel_capacity, Some(10));
    }
}
