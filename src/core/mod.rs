//! Simulator runtime: reading generation, the publish loop and its shutdown.

pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod observers;
pub mod reading;
pub mod session;

pub use error::SimulatorError;
pub use executor::Executor;
pub use lifecycle::{run_until_stopped, Outcome};
pub use observers::logging_hooks;
pub use reading::Reading;
pub use session::{MqttSession, Session};
