use thiserror::Error;

/// Faults that end the generation loop.
///
/// Each one is logged and followed by the same orderly shutdown; none is
/// retried.
#[derive(Error, Debug)]
pub enum SimulatorError {
    /// The broker connection could not be set up.
    #[error("Connection fault: {0}")]
    Connection(String),

    /// The transport refused to take a reading, typically because its network
    /// loop is no longer running.
    #[error("Publish fault: {0}")]
    Publish(String),

    /// A reading could not be encoded.
    #[error("Serialization fault: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<smartguard_mqtt_v4::TransferError> for SimulatorError {
    fn from(err: smartguard_mqtt_v4::TransferError) -> Self {
        use smartguard_mqtt_v4::TransferError;

        match err {
            TransferError::ClientTransfer(_) => SimulatorError::Publish(err.to_string()),
            TransferError::InvalidMetadata(_)
            | TransferError::ConfigError(_)
            | TransferError::ConnectionKernel(_) => SimulatorError::Connection(err.to_string()),
        }
    }
}
