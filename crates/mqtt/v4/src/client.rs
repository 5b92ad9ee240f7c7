//! MQTT client builder.
//!
//! `ClientBuilder` turns a `Config` into rumqttc's `AsyncClient` and
//! `EventLoop` pair. Plain TCP only: the simulator talks to a public broker
//! and carries no credentials.
//!
//! # Examples
//!
//! ```ignore
//! let (client, event_loop) = ClientBuilder::from_config(&config)?.build();
//! ```

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions};
use validator::Validate;

use super::{config::Config, error::TransferError};

/// Builder for constructing MQTT clients with a fluent API.
///
/// The returned `AsyncClient` is cheap to clone and thread-safe. The
/// `EventLoop` must be polled from a single task.
pub struct ClientBuilder {
    /// MQTT protocol options (host, port, keep-alive, etc.)
    opts: MqttOptions,

    /// Capacity of the request channel between client and event loop.
    cap: usize,
}

impl ClientBuilder {
    /// Creates a builder from a validated `Config`.
    ///
    /// # Errors
    /// Returns `TransferError::ConfigError` when validation fails.
    pub fn from_config(config: &Config) -> Result<Self, TransferError> {
        config.validate()?;

        let mut opts = MqttOptions::new(
            config.resolved_client_id(),
            config.host.clone(),
            config.port,
        );
        opts.set_keep_alive(Duration::from_secs(config.keep_alive));
        opts.set_clean_session(config.clean_session);
        opts.set_inflight(config.max_inflight);

        if let Some(max_packet_size) = config.max_packet_size {
            opts.set_max_packet_size(max_packet_size as usize, max_packet_size as usize);
        }

        let cap = config.request_channel_capacity.unwrap_or(10) as usize;

        Ok(Self { opts, cap })
    }

    /// Constructs the MQTT client and event loop.
    ///
    /// Nothing touches the network here; the connection is opened the first
    /// time the event loop is polled.
    pub fn build(self) -> (AsyncClient, EventLoop) {
        AsyncClient::new(self.opts, self.cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_from_config() {
        let config = Config {
            host: "localhost".to_string(),
            client_id: "test_client".to_string(),
            keep_alive: 30,
            clean_session: false,
            request_channel_capacity: Some(5),
            ..Default::default()
        };

        let builder = ClientBuilder::from_config(&config).unwrap();
        assert_eq!(builder.cap, 5);
        assert_eq!(builder.opts.client_id(), "test_client");
        assert_eq!(builder.opts.broker_address(), ("localhost".to_string(), 1883));
        assert_eq!(builder.opts.keep_alive(), Duration::from_secs(30));
        assert!(!builder.opts.clean_session());
        let _ = builder.build();
    }

    #[test]
    fn test_missing_channel_capacity_defaults_to_ten() {
        let config = Config {
            request_channel_capacity: None,
            ..Default::default()
        };
        assert_eq!(ClientBuilder::from_config(&config).unwrap().cap, 10);
    }

    #[test]
    fn test_build_from_config_invalid() {
        let config = Config {
            host: "".to_string(),
            ..Default::default()
        };

        let result = ClientBuilder::from_config(&config);
        assert!(matches!(result, Err(TransferError::ConfigError(_))));
    }
}
