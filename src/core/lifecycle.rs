//! Run-until-stopped supervision of the generation loop.
//!
//! The loop races against an interrupt future. Whichever finishes first
//! decides the `Outcome`; both paths then stop the background network loop
//! and close the connection, in that order and exactly once.

use std::future::Future;

use tracing::{error, info, warn};

use super::{error::SimulatorError, executor::Executor, session::Session};

/// Why the simulator stopped.
#[derive(Debug)]
pub enum Outcome {
    /// The interrupt future completed.
    Interrupted,
    /// The generation loop hit a fault.
    Failed(SimulatorError),
}

impl Outcome {
    /// Process exit status. A fault is logged but is not an abnormal exit.
    pub fn exit_code(&self) -> i32 {
        0
    }
}

/// Drives `executor` on `session` until `stop` resolves or the loop fails,
/// then shuts the session down.
pub async fn run_until_stopped<S, F>(session: &mut S, executor: &Executor, stop: F) -> Outcome
where
    S: Session + ?Sized,
    F: Future,
{
    let outcome = tokio::select! {
        _ = stop => {
            info!("Stopping simulator...");
            Outcome::Interrupted
        }
        e = executor.run(&*session) => {
            error!("Error: {}", e);
            Outcome::Failed(e)
        }
    };

    shutdown(session).await;
    outcome
}

async fn shutdown<S: Session + ?Sized>(session: &mut S) {
    if let Err(e) = session.stop().await {
        warn!("Failed to stop network loop: {}", e);
    }
    if let Err(e) = session.close().await {
        warn!("Failed to close connection: {}", e);
    }
}
