//! Error type for MQTT transport operations.
//!
//! `TransferError` aggregates everything that can go wrong between the
//! simulator and the broker: configuration problems caught at startup,
//! client-side request failures, and event loop errors.
//!
//! # Error Categories
//!
//! **Setup errors** (caught before the network loop runs):
//! - `ConfigError`: validation failures in settings
//! - `InvalidMetadata`: bad QoS or empty topic
//!
//! **Runtime errors**:
//! - `ClientTransfer`: a publish/subscribe/disconnect request could not be queued,
//!   usually because the network loop is gone
//! - `ConnectionKernel`: the background task could not be joined
//!
//! No variant is retried anywhere in the transport.

use thiserror::Error;

/// The unified error type for MQTT transfer operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// QoS value is not 0, 1, or 2, or the topic is empty.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The background network task could not be stopped or joined.
    #[error("Connection kernel error: {0}")]
    ConnectionKernel(String),

    /// Configuration validation failed.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] validator::ValidationErrors),

    /// The client failed to hand a request to the network loop.
    ///
    /// Once the network loop has exited its request channel is closed, so every
    /// later publish ends up here.
    #[error("Client transfer error: {0}")]
    ClientTransfer(#[from] rumqttc::ClientError),
}
