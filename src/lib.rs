//! smartguard - synthetic crane sensor publisher
//!
//! Connects to an MQTT broker, subscribes to its sensor topic, and publishes
//! a freshly drawn crane reading (load, wind, stability, boom angle, swing
//! speed, power draw) at a fixed interval until interrupted or a publish
//! fails.
//!
//! ## Modules
//!
//! * `config`: TOML configuration with `validator` rules and built-in
//!   defaults for every field.
//!
//! * `core`: Runtime components:
//!   - Reading generation and JSON payload encoding
//!   - The publish loop (`Executor`)
//!   - The `Session` seam over the MQTT transport
//!   - Run-until-stopped supervision and ordered shutdown
//!
//! * `logger`: Centralized logging initialization using `tracing`.
//!   Supports console output in multiple formats (compact, pretty, JSON)
//!   and optional systemd journald integration.
//!
//! The transport itself lives in the `smartguard_mqtt_v4` crate.

pub mod config;
pub mod core;
pub mod logger;
