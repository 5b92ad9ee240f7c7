//! # smartguard-mqtt-v4: MQTT 3.1.1 transport for the SmartGuard simulator
//!
//! A thin layer over `rumqttc` that gives the simulator an explicitly owned
//! connection object:
//!
//! - a background network loop (`ConnectionKernel`) on its own tokio task
//! - two observer hooks, one for the CONNECT outcome and one for publish
//!   acknowledgments
//! - fire-and-forget publishing through the cloneable `AsyncClient`
//! - an ordered teardown: `stop()` the network loop, then `disconnect()`
//!
//! There is no reconnection, no backoff and no TLS. A failed
//! network loop stays failed and surfaces as errors on the next publish.
//!
//! # Quick Start
//!
//! ```ignore
//! use smartguard_mqtt_v4::{Config, Hooks, MqttManager};
//!
//! let hooks = Hooks::new()
//!     .on_connect(|outcome| println!("connect: {:?}", outcome))
//!     .on_publish(|ack| println!("message {} {}", ack.message_id, ack.reason));
//!
//! let mut instance = MqttManager::from_config(Config::default())?
//!     .with_hooks(hooks)
//!     .subscribe_on_connect("smartguard/sensors", 0)?
//!     .start()?;
//!
//! instance.publish("smartguard/sensors", 0, false, b"{}".to_vec()).await?;
//! instance.stop().await?;
//! instance.disconnect().await?;
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod hooks;
pub mod manager;
pub mod state;

pub use client::ClientBuilder;
pub use config::Config;
pub use connection::ConnectionKernel;
pub use error::TransferError;
pub use hooks::{AckReason, ConnectOutcome, Hooks, PublishAck};
pub use manager::{qos_from_level, MqttInstance, MqttManager};
pub use rumqttc::ConnectReturnCode;
pub use state::ConnectionState;
