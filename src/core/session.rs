//! The connection seam between the simulator and its transport.
//!
//! The generation loop only needs to publish; the shutdown path needs to stop
//! the background network loop and then close the connection. `Session`
//! captures exactly that so the loop and the lifecycle can be driven by the
//! MQTT transport in production and by in-memory doubles in tests.

use tracing::debug;

use super::error::SimulatorError;
use crate::config::simulator::SimulatorConfig;

/// An explicitly owned broker connection.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    /// Hands a payload to the transport without waiting for the broker.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), SimulatorError>;

    /// Stops the background network loop.
    async fn stop(&mut self) -> Result<(), SimulatorError>;

    /// Closes the connection. Called after `stop`.
    async fn close(&mut self) -> Result<(), SimulatorError>;
}

/// `MqttInstance` bound to the simulator's QoS and retain settings.
pub struct MqttSession {
    instance: smartguard_mqtt_v4::MqttInstance,
    qos: u8,
    retain: bool,
}

impl MqttSession {
    pub fn new(instance: smartguard_mqtt_v4::MqttInstance, config: &SimulatorConfig) -> Self {
        Self {
            instance,
            qos: config.qos,
            retain: config.retain,
        }
    }

    pub fn instance(&self) -> &smartguard_mqtt_v4::MqttInstance {
        &self.instance
    }
}

#[async_trait::async_trait]
impl Session for MqttSession {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), SimulatorError> {
        self.instance
            .publish(topic, self.qos, self.retain, payload)
            .await
            .map_err(|e| SimulatorError::Publish(e.to_string()))
    }

    async fn stop(&mut self) -> Result<(), SimulatorError> {
        debug!("Stopping MQTT network loop");
        self.instance.stop().await.map_err(SimulatorError::from)
    }

    async fn close(&mut self) -> Result<(), SimulatorError> {
        debug!(
            "Disconnecting from broker (session established: {})",
            self.instance.is_connected()
        );
        self.instance
            .disconnect()
            .await
            .map_err(|e| SimulatorError::Connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use smartguard_mqtt_v4::{
        Config, ConnectOutcome, ConnectReturnCode, ConnectionState, Hooks, MqttManager,
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::*;
    use crate::core::{
        executor::Executor,
        lifecycle::{run_until_stopped, Outcome},
        reading::Reading,
    };

    const CONNECT: u8 = 0x10;
    const PUBLISH_QOS0: u8 = 0x30;
    const SUBSCRIBE: u8 = 0x82;
    const DISCONNECT: u8 = 0xE0;

    /// Single-connection broker: answers CONNECT with the given CONNACK code
    /// and returns every byte the client sent until it hangs up.
    async fn fake_broker(connack_code: u8) -> (u16, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];

            let n = socket.read(&mut buf).await.unwrap();
            received.extend_from_slice(&buf[..n]);
            socket
                .write_all(&[0x20, 0x02, 0x00, connack_code])
                .await
                .unwrap();

            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => received.extend_from_slice(&buf[..n]),
                }
            }
            received
        });

        (port, handle)
    }

    /// Splits a captured byte stream into (first header byte, body) frames.
    fn frames(bytes: &[u8]) -> Vec<(u8, &[u8])> {
        let mut frames = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let header = bytes[i];
            i += 1;
            let mut len = 0usize;
            let mut multiplier = 1usize;
            loop {
                let byte = bytes[i];
                i += 1;
                len += usize::from(byte & 0x7f) * multiplier;
                multiplier *= 128;
                if byte & 0x80 == 0 {
                    break;
                }
            }
            frames.push((header, &bytes[i..i + len]));
            i += len;
        }
        frames
    }

    fn local_config(port: u16) -> Config {
        Config {
            host: "127.0.0.1".into(),
            port,
            client_id: "session-test".into(),
            ..Default::default()
        }
    }

    async fn wait_for_state(session: &MqttSession, state: &'static str) {
        let mut state_rx = session.instance().state_receiver();
        tokio::time::timeout(
            Duration::from_secs(10),
            state_rx.wait_for(|s: &ConnectionState| s.as_str() == state),
        )
        .await
        .unwrap()
        .unwrap();
    }

    #[tokio::test]
    async fn test_accepted_session_publishes_then_disconnects_after_stop() {
        let (port, broker) = fake_broker(0x00).await;
        let simulator = SimulatorConfig::default();
        let instance = MqttManager::from_config(local_config(port))
            .unwrap()
            .subscribe_on_connect(simulator.topic.clone(), simulator.qos)
            .unwrap()
            .start()
            .unwrap();
        let mut session = MqttSession::new(instance, &simulator);
        wait_for_state(&session, "Connected").await;

        let executor = Executor::new(simulator.topic.clone(), Duration::from_millis(100));
        let outcome = run_until_stopped(
            &mut session,
            &executor,
            tokio::time::sleep(Duration::from_millis(250)),
        )
        .await;
        assert!(matches!(outcome, Outcome::Interrupted));
        assert!(!session.instance().is_connected());

        let received = tokio::time::timeout(Duration::from_secs(10), broker)
            .await
            .unwrap()
            .unwrap();
        let frames = frames(&received);

        assert_eq!(frames.first().map(|f| f.0), Some(CONNECT));
        assert!(frames.iter().any(|f| f.0 == SUBSCRIBE));
        assert_eq!(frames.last().map(|f| f.0), Some(DISCONNECT));
        assert!(frames.last().is_some_and(|f| f.1.is_empty()));

        let publishes: Vec<&[u8]> = frames
            .iter()
            .filter(|f| f.0 == PUBLISH_QOS0)
            .map(|f| f.1)
            .collect();
        assert!(!publishes.is_empty());
        for body in publishes {
            // Two-byte topic length, topic, then the JSON payload.
            let topic_len = usize::from(u16::from_be_bytes([body[0], body[1]]));
            assert_eq!(&body[2..2 + topic_len], simulator.topic.as_bytes());
            let reading = Reading::from_payload(&body[2 + topic_len..]).unwrap();
            assert!(reading.is_within_bounds());
        }
    }

    #[tokio::test]
    async fn test_refused_session_notifies_hook_and_fails_first_publish() {
        let (port, broker) = fake_broker(0x05).await;
        let connects = Arc::new(Mutex::new(Vec::new()));
        let hooks = {
            let connects = connects.clone();
            Hooks::new().on_connect(move |o| connects.lock().unwrap().push(*o))
        };

        let instance = MqttManager::from_config(local_config(port))
            .unwrap()
            .with_hooks(hooks)
            .start()
            .unwrap();
        let mut session = MqttSession::new(instance, &SimulatorConfig::default());
        wait_for_state(&session, "Disconnected").await;

        let refused = connects.lock().unwrap().clone();
        assert_eq!(
            refused,
            vec![ConnectOutcome::Refused(ConnectReturnCode::NotAuthorized)]
        );
        assert_eq!(refused[0].code(), 5);

        // Give the kernel task a moment to drop the event loop.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (_keep, never) = tokio::sync::oneshot::channel::<()>();
        let executor = Executor::new("smartguard/sensors", Duration::from_secs(1));
        let outcome = run_until_stopped(&mut session, &executor, never).await;
        assert!(matches!(outcome, Outcome::Failed(SimulatorError::Publish(_))));

        let received = tokio::time::timeout(Duration::from_secs(10), broker)
            .await
            .unwrap()
            .unwrap();
        assert!(frames(&received).iter().all(|f| f.0 != PUBLISH_QOS0));
    }

    #[tokio::test]
    async fn test_unreachable_broker_surfaces_as_publish_fault() {
        let instance = MqttManager::from_config(local_config(1))
            .unwrap()
            .start()
            .unwrap();
        let mut session = MqttSession::new(instance, &SimulatorConfig::default());
        wait_for_state(&session, "Disconnected").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = session.publish("smartguard/sensors", b"{}".to_vec()).await;
        assert!(matches!(result, Err(SimulatorError::Publish(_))));

        session.stop().await.unwrap();
        session.close().await.unwrap();
    }
}
