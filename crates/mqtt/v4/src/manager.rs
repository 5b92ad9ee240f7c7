//! High-level entry point tying the transport pieces together.
//!
//! `MqttManager` collects configuration, hooks and subscribe-on-connect
//! topics, then `start()` builds the client, spawns the `ConnectionKernel`
//! and returns an `MqttInstance`.
//!
//! # Typical Usage
//!
//! ```ignore
//! let mut instance = MqttManager::from_config(config)?
//!     .with_hooks(hooks)
//!     .subscribe_on_connect("smartguard/sensors", 0)?
//!     .start()?;
//!
//! instance.publish("smartguard/sensors", 0, false, payload).await?;
//!
//! instance.stop().await?;
//! instance.disconnect().await?;
//! ```

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use rumqttc::{AsyncClient, EventLoop, QoS};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use validator::Validate;

use super::{
    client::ClientBuilder,
    config::Config,
    connection::{self, ConnectionKernel},
    error::TransferError,
    hooks::Hooks,
    state::ConnectionState,
};

/// Converts a numeric QoS level into rumqttc's enum.
pub fn qos_from_level(level: u8) -> Result<QoS, TransferError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        _ => Err(TransferError::InvalidMetadata(format!(
            "Invalid QoS value {level}, must be 0, 1, or 2"
        ))),
    }
}

/// Builder for a running MQTT connection.
pub struct MqttManager {
    config: Config,
    hooks: Hooks,
    subscriptions: Vec<(String, QoS)>,
}

impl MqttManager {
    /// Creates a manager from a configuration struct.
    ///
    /// # Errors
    /// Returns `TransferError::ConfigError` if validation fails.
    pub fn from_config(config: Config) -> Result<Self, TransferError> {
        config.validate()?;
        Ok(Self {
            config,
            hooks: Hooks::default(),
            subscriptions: Vec::new(),
        })
    }

    /// Sets the connect and publish observers.
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Adds a topic to subscribe to once the broker accepts the connection.
    pub fn subscribe_on_connect(
        mut self,
        topic: impl Into<String>,
        qos: u8,
    ) -> Result<Self, TransferError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(TransferError::InvalidMetadata(
                "Subscription topic must not be empty".into(),
            ));
        }
        self.subscriptions.push((topic, qos_from_level(qos)?));
        Ok(self)
    }

    /// Builds the client and spawns the network loop.
    ///
    /// Must be called from within a tokio runtime. The TCP connection is
    /// opened asynchronously by the spawned kernel; watch
    /// `MqttInstance::state_receiver` to learn the outcome.
    pub fn start(self) -> Result<MqttInstance, TransferError> {
        let (client, event_loop) = ClientBuilder::from_config(&self.config)?.build();

        let cancel = CancellationToken::new();
        let kernel = ConnectionKernel::new(client.clone(), event_loop, self.hooks, cancel.clone())
            .with_subscriptions(self.subscriptions);
        let state_rx = kernel.subscribe_state();
        let is_connected = kernel.is_connected();

        let handle = tokio::spawn(kernel.run());

        info!("Attempting to connect to {}...", self.config.broker_addr());

        Ok(MqttInstance {
            client,
            cancel,
            kernel: Some(handle),
            released_loop: Mutex::new(None),
            state_rx,
            is_connected,
            disconnect_timeout: Duration::from_millis(self.config.disconnect_timeout_ms),
            closed: false,
        })
    }
}

/// A live MQTT connection: client handle plus the background network loop.
pub struct MqttInstance {
    client: AsyncClient,

    /// Stops the kernel
    cancel: CancellationToken,

    /// Kernel task, `None` once joined
    kernel: Option<JoinHandle<Option<EventLoop>>>,

    /// Event loop handed back by a stopped kernel, consumed by `disconnect`.
    /// `EventLoop` is not `Sync`, the mutex keeps `MqttInstance` `Sync`. Only
    /// touched through `&mut self`, so it is never contended.
    released_loop: Mutex<Option<EventLoop>>,

    state_rx: watch::Receiver<ConnectionState>,
    is_connected: Arc<AtomicBool>,
    disconnect_timeout: Duration,
    closed: bool,
}

impl MqttInstance {
    /// Queues a publish and returns without waiting for the broker.
    ///
    /// # Errors
    /// - `InvalidMetadata` for a bad QoS level
    /// - `ClientTransfer` when the network loop is gone
    pub async fn publish(
        &self,
        topic: &str,
        qos: u8,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), TransferError> {
        let qos = qos_from_level(qos)?;
        self.client.publish(topic, qos, retain, payload).await?;
        Ok(())
    }

    /// Stops the background network loop and waits for it to exit.
    ///
    /// Calling it again is a no-op.
    pub async fn stop(&mut self) -> Result<(), TransferError> {
        let Some(handle) = self.kernel.take() else {
            debug!("Network loop already stopped");
            return Ok(());
        };

        self.cancel.cancel();
        let released = handle
            .await
            .map_err(|e| TransferError::ConnectionKernel(e.to_string()))?;
        *self
            .released_loop
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = released;
        info!("Network loop stopped");
        Ok(())
    }

    /// Closes the connection, stopping the network loop first if needed.
    ///
    /// When the broker never accepted the session, or the loop died on its own,
    /// there is nothing to send and this only releases resources.
    pub async fn disconnect(&mut self) -> Result<(), TransferError> {
        if self.closed {
            return Ok(());
        }
        self.stop().await?;
        self.closed = true;

        let event_loop = self
            .released_loop
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match event_loop {
            Some(event_loop) if self.is_connected.load(Ordering::Acquire) => {
                connection::close(&self.client, event_loop, self.disconnect_timeout).await?;
                self.is_connected.store(false, Ordering::Release);
                info!("Disconnected from broker");
            }
            _ => {
                debug!("No established session to close");
            }
        }
        Ok(())
    }

    /// Returns a receiver for connection state changes.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Whether the broker has accepted the session and it is still up.
    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::Acquire)
    }
}
