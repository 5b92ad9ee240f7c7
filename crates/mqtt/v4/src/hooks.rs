//! Observer hooks invoked by the network loop.
//!
//! Two independent callbacks can be registered: one for the outcome of the
//! CONNECT handshake and one for publish acknowledgments. They run on the
//! kernel's task, which is not the caller's task, so anything they capture
//! must be `Send + Sync`.

use std::{fmt, sync::Arc};

use rumqttc::ConnectReturnCode;

/// Result of the CONNECT handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// CONNACK carried the success code.
    Accepted,
    /// CONNACK carried a refusal code.
    Refused(ConnectReturnCode),
}

impl ConnectOutcome {
    /// Numeric CONNACK return code (0 on success).
    pub fn code(&self) -> u8 {
        match self {
            ConnectOutcome::Accepted => 0,
            ConnectOutcome::Refused(code) => return_code_value(*code),
        }
    }
}

fn return_code_value(code: ConnectReturnCode) -> u8 {
    match code {
        ConnectReturnCode::Success => 0,
        ConnectReturnCode::RefusedProtocolVersion => 1,
        ConnectReturnCode::BadClientId => 2,
        ConnectReturnCode::ServiceUnavailable => 3,
        ConnectReturnCode::BadUserNamePassword => 4,
        ConnectReturnCode::NotAuthorized => 5,
    }
}

/// How far a published message got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckReason {
    /// QoS 0: written to the socket, no acknowledgment exists.
    Sent,
    /// QoS 1: PUBACK received.
    Acknowledged,
    /// QoS 2: PUBCOMP received.
    Completed,
}

impl fmt::Display for AckReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckReason::Sent => f.write_str("Success (sent)"),
            AckReason::Acknowledged => f.write_str("Success (puback)"),
            AckReason::Completed => f.write_str("Success (pubcomp)"),
        }
    }
}

/// Notification that a previously published message went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishAck {
    /// Packet id for QoS 1/2, running sequence number for QoS 0.
    pub message_id: u64,
    pub reason: AckReason,
}

pub type ConnectHook = Arc<dyn Fn(&ConnectOutcome) + Send + Sync>;
pub type PublishHook = Arc<dyn Fn(&PublishAck) + Send + Sync>;

/// The pair of optional observers carried by the connection kernel.
#[derive(Clone, Default)]
pub struct Hooks {
    on_connect: Option<ConnectHook>,
    on_publish: Option<PublishHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the connect-result observer, replacing any previous one.
    pub fn on_connect<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ConnectOutcome) + Send + Sync + 'static,
    {
        self.on_connect = Some(Arc::new(hook));
        self
    }

    /// Registers the publish-acknowledgment observer, replacing any previous one.
    pub fn on_publish<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PublishAck) + Send + Sync + 'static,
    {
        self.on_publish = Some(Arc::new(hook));
        self
    }

    pub(crate) fn connected(&self, outcome: &ConnectOutcome) {
        if let Some(hook) = &self.on_connect {
            hook(outcome);
        }
    }

    pub(crate) fn published(&self, ack: &PublishAck) {
        if let Some(hook) = &self.on_publish {
            hook(ack);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_publish", &self.on_publish.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_connect_outcome_codes() {
        assert_eq!(ConnectOutcome::Accepted.code(), 0);
        assert_eq!(
            ConnectOutcome::Refused(ConnectReturnCode::BadUserNamePassword).code(),
            4
        );
        assert_eq!(
            ConnectOutcome::Refused(ConnectReturnCode::NotAuthorized).code(),
            5
        );
    }

    #[test]
    fn test_hooks_dispatch_independently() {
        let connects = Arc::new(Mutex::new(Vec::new()));
        let acks = Arc::new(Mutex::new(Vec::new()));

        let hooks = {
            let connects = connects.clone();
            let acks = acks.clone();
            Hooks::new()
                .on_connect(move |outcome| connects.lock().unwrap().push(*outcome))
                .on_publish(move |ack| acks.lock().unwrap().push(*ack))
        };

        hooks.connected(&ConnectOutcome::Accepted);
        hooks.published(&PublishAck {
            message_id: 7,
            reason: AckReason::Acknowledged,
        });

        assert_eq!(*connects.lock().unwrap(), vec![ConnectOutcome::Accepted]);
        assert_eq!(acks.lock().unwrap()[0].message_id, 7);
    }

    #[test]
    fn test_empty_hooks_are_noops() {
        let hooks = Hooks::new();
        hooks.connected(&ConnectOutcome::Accepted);
        hooks.published(&PublishAck {
            message_id: 1,
            reason: AckReason::Sent,
        });
        assert_eq!(
            format!("{hooks:?}"),
            "Hooks { on_connect: false, on_publish: false }"
        );
    }
}
