//! Background network loop and connection teardown.
//!
//! - `ConnectionKernel`: drives rumqttc's event loop on its own task, reports
//!   CONNACK and acknowledgments to the registered hooks, and tracks state.
//! - `close`: flushes a DISCONNECT over an event loop that the kernel has
//!   handed back after being stopped.
//!
//! # Architecture
//!
//! ```text
//! Simulator loop
//!     ↓ publish (AsyncClient, request channel)
//! ConnectionKernel (polls EventLoop, invokes hooks)
//!     ↓
//! rumqttc EventLoop (MQTT 3.1.1)
//!     ↓
//! TCP
//! ```
//!
//! The kernel never reconnects. Any event loop error ends it and drops the
//! event loop, which closes the request channel: the next publish from the
//! client side then fails instead of queueing forever.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, Outgoing, Packet, QoS,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::{
    error::TransferError,
    hooks::{AckReason, ConnectOutcome, Hooks, PublishAck},
    state::ConnectionState,
};

/// Drives the MQTT event loop until cancelled or until it fails.
///
/// Runs on a single tokio task. The `AsyncClient` it holds is only used to
/// queue the subscriptions made after a successful CONNACK.
pub struct ConnectionKernel {
    /// Client used for subscribe-on-connect
    client: AsyncClient,

    /// The event loop that owns the socket
    event_loop: EventLoop,

    /// Connect and publish observers
    hooks: Hooks,

    /// Topics subscribed once CONNACK succeeds
    subscriptions: Vec<(String, QoS)>,

    /// Set on successful CONNACK, cleared when the loop stops
    is_connected: Arc<AtomicBool>,

    /// Stop request from the owner
    cancel: CancellationToken,

    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,

    /// Running id handed to QoS 0 publish notifications
    sent_sequence: u64,
}

/// What the select loop decided after one iteration.
enum Step {
    Continue,
    Stop,
    Fail,
}

impl ConnectionKernel {
    /// Creates a new kernel in the `Connecting` state.
    pub fn new(
        client: AsyncClient,
        event_loop: EventLoop,
        hooks: Hooks,
        cancel: CancellationToken,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        Self {
            client,
            event_loop,
            hooks,
            subscriptions: Vec::new(),
            is_connected: Arc::new(AtomicBool::new(false)),
            cancel,
            state_tx,
            state_rx,
            sent_sequence: 0,
        }
    }

    /// Registers topics to subscribe to right after a successful CONNACK.
    pub fn with_subscriptions(mut self, subscriptions: Vec<(String, QoS)>) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    /// Returns a receiver for connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Shared connected flag, readable without waiting on the state channel.
    pub fn is_connected(&self) -> Arc<AtomicBool> {
        self.is_connected.clone()
    }

    fn update_state(&self, state: ConnectionState) {
        let changed = *self.state_tx.borrow() != state;
        if changed {
            info!("Connection state changed to: {}", state);
            // The kernel keeps its own receiver, so send cannot fail.
            let _ = self.state_tx.send(state);
        }
    }

    /// Runs the network loop.
    ///
    /// Returns the event loop when stopped through the cancellation token so
    /// the owner can still flush a DISCONNECT. Returns `None` when the loop
    /// failed; in that case the event loop has been dropped.
    pub async fn run(mut self) -> Option<EventLoop> {
        info!("Starting network loop...");
        loop {
            let step = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => Step::Stop,

                event_result = self.event_loop.poll() => match event_result {
                    Ok(event) => {
                        self.handle_event(event);
                        Step::Continue
                    }
                    Err(e) => {
                        self.handle_error(&e);
                        Step::Fail
                    }
                },
            };

            match step {
                Step::Continue => {}
                Step::Stop => {
                    debug!("Network loop stop requested");
                    return Some(self.event_loop);
                }
                Step::Fail => {
                    self.is_connected.store(false, Ordering::Release);
                    return None;
                }
            }
        }
    }

    /// Processes a single event from the event loop.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Incoming(packet) => match packet {
                Packet::ConnAck(conn_ack) => {
                    if conn_ack.code == ConnectReturnCode::Success {
                        self.is_connected.store(true, Ordering::Release);
                        self.update_state(ConnectionState::Connected);
                        self.subscribe_all();
                        self.hooks.connected(&ConnectOutcome::Accepted);
                    } else {
                        self.hooks.connected(&ConnectOutcome::Refused(conn_ack.code));
                    }
                }
                Packet::PubAck(ack) => {
                    self.hooks.published(&PublishAck {
                        message_id: u64::from(ack.pkid),
                        reason: AckReason::Acknowledged,
                    });
                }
                Packet::PubComp(comp) => {
                    self.hooks.published(&PublishAck {
                        message_id: u64::from(comp.pkid),
                        reason: AckReason::Completed,
                    });
                }
                Packet::SubAck(sub_ack) => {
                    debug!("Subscription {} acknowledged", sub_ack.pkid);
                }
                Packet::PingResp | Packet::PingReq => {}
                Packet::Publish(publish) => {
                    trace!("Received publish on topic {}", publish.topic);
                }
                Packet::Disconnect => {
                    warn!("Disconnected by broker");
                    self.is_connected.store(false, Ordering::Release);
                    self.update_state(ConnectionState::Disconnected(
                        "Disconnected by broker".into(),
                    ));
                }
                other => {
                    trace!("Incoming packet: {:?}", other);
                }
            },
            // pkid 0 marks a QoS 0 publish: leaving the socket is all the
            // acknowledgment it will ever get.
            Event::Outgoing(Outgoing::Publish(0)) => {
                self.sent_sequence += 1;
                self.hooks.published(&PublishAck {
                    message_id: self.sent_sequence,
                    reason: AckReason::Sent,
                });
            }
            Event::Outgoing(outgoing) => {
                trace!("Outgoing packet: {:?}", outgoing);
            }
        }
    }

    /// Records a terminal event loop error. No retry follows.
    fn handle_error(&mut self, err: &ConnectionError) {
        match err {
            ConnectionError::ConnectionRefused(code) => {
                self.hooks.connected(&ConnectOutcome::Refused(*code));
                self.update_state(ConnectionState::Disconnected(format!(
                    "Connection refused: {code:?}"
                )));
            }
            other => {
                error!("Network loop stopped: {}", get_error_message(other));
                self.update_state(ConnectionState::Disconnected(other.to_string()));
            }
        }
    }

    fn subscribe_all(&self) {
        for (topic, qos) in &self.subscriptions {
            // try_subscribe: this task is the channel's consumer, awaiting a
            // full channel here would never complete.
            match self.client.try_subscribe(topic.as_str(), *qos) {
                Ok(()) => debug!("Subscribed to {}", topic),
                Err(e) => error!("Failed to subscribe to '{}': {}", topic, e),
            }
        }
    }
}

/// Sends DISCONNECT through an event loop the kernel has released and waits
/// until it is written or `timeout` elapses.
///
/// Errors from the event loop after DISCONNECT was queued only mean the
/// socket is already gone, and are logged rather than returned.
pub async fn close(
    client: &AsyncClient,
    mut event_loop: EventLoop,
    timeout: Duration,
) -> Result<(), TransferError> {
    client.try_disconnect()?;

    let flush = async {
        loop {
            match event_loop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    debug!("DISCONNECT written");
                    break;
                }
                Ok(event) => trace!("Draining event before disconnect: {:?}", event),
                Err(e) => {
                    debug!("Event loop closed during disconnect: {}", e);
                    break;
                }
            }
        }
    };

    if tokio::time::timeout(timeout, flush).await.is_err() {
        warn!(
            "DISCONNECT not flushed within {} ms, dropping connection",
            timeout.as_millis()
        );
    }
    Ok(())
}

/// Extracts the innermost error message from an error chain.
fn get_error_message(e: &dyn std::error::Error) -> String {
    let mut current = e;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string().trim_matches('"').to_string()
}
