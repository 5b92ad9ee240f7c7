//! Reading generation loop.
//!
//! The `Executor` draws a fresh reading, publishes it, logs the payload and
//! sleeps for the configured interval. It runs until a publish or encoding
//! fault, which it returns; cancellation is handled by dropping the future.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use super::{error::SimulatorError, reading::Reading, session::Session};
use crate::config::simulator::SimulatorConfig;

/// Periodic publisher of synthetic readings.
#[derive(Debug, Clone)]
pub struct Executor {
    topic: String,
    interval: Duration,
}

impl Executor {
    pub fn new(topic: impl Into<String>, interval: Duration) -> Self {
        Self {
            topic: topic.into(),
            interval,
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self::new(config.topic.clone(), config.publish_interval())
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs the loop until the first fault and returns it.
    ///
    /// The first reading goes out immediately; each later one follows the
    /// previous publication by `interval` plus the time spent publishing.
    pub async fn run<S: Session + ?Sized>(&self, session: &S) -> SimulatorError {
        debug!(
            "Publishing to '{}' every {} ms",
            self.topic,
            self.interval.as_millis()
        );

        loop {
            if let Err(e) = self.publish_once(session).await {
                return e;
            }
            sleep(self.interval).await;
        }
    }

    async fn publish_once<S: Session + ?Sized>(&self, session: &S) -> Result<(), SimulatorError> {
        let payload = Reading::random().to_payload()?;
        let text = String::from_utf8_lossy(&payload).into_owned();

        session.publish(&self.topic, payload).await?;
        info!("Published: {}", text);
        Ok(())
    }
}
