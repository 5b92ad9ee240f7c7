//! Connection observers: log-only reactions to the CONNECT handshake and to
//! publish acknowledgments. Neither one changes control flow.

use smartguard_mqtt_v4::{ConnectOutcome, Hooks, PublishAck};
use tracing::{error, info};

/// Hooks wired to [`log_connect`] and [`log_publish`].
pub fn logging_hooks() -> Hooks {
    Hooks::new().on_connect(log_connect).on_publish(log_publish)
}

/// A refusal is logged and nothing else; the publish loop is not told.
pub fn log_connect(outcome: &ConnectOutcome) {
    match outcome {
        ConnectOutcome::Accepted => info!("Connected to MQTT broker successfully"),
        ConnectOutcome::Refused(_) => error!("Connection failed with code {}", outcome.code()),
    }
}

pub fn log_publish(ack: &PublishAck) {
    info!(
        "Message {} published with reason code {}",
        ack.message_id, ack.reason
    );
}
