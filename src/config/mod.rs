//! Application configuration loading and validation.
//!
//! The top-level `Config` aggregates logging, simulator and transport
//! settings. Every field has a built-in default, so running without any file
//! publishes to `broker.hivemq.com:1883` on `smartguard/sensors` once per
//! second.
//!
//! The configuration is loaded once at startup and stays immutable.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::{logger::LoggerConfig, simulator::SimulatorConfig};

pub mod logger;
pub mod simulator;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "SMARTGUARD_CONFIG";

/// System-wide configuration file, used when present.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/smartguard/config.toml";

/// Timestamped console output for use before the tracing subscriber exists.
#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        $crate::config::bootstrap_line("INFO", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_warn {
    ($($arg:tt)*) => {
        $crate::config::bootstrap_line("WARN", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::config::bootstrap_line("ERROR", format_args!($($arg)*))
    };
}

#[doc(hidden)]
pub fn bootstrap_line(level: &'static str, message: std::fmt::Arguments<'_>) {
    let format = time::macros::format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
    );
    let now = time::OffsetDateTime::now_utc()
        .format(format)
        .unwrap_or_default();
    let level = match level {
        "ERROR" => console::style(level).red(),
        "WARN" => console::style(level).yellow(),
        _ => console::style(level).green(),
    };
    println!("{}  {} {}", console::style(now).dim(), level, message);
}

/// Errors raised while locating, reading, parsing or validating the
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error while reading configuration: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error while reading configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Top-level application configuration.
#[derive(Serialize, Deserialize, Debug, Validate, Clone, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub logger: LoggerConfig,

    #[validate(nested)]
    pub simulator: SimulatorConfig,

    /// Broker connection settings, the `[transport]` table.
    #[validate(nested)]
    pub transport: TransportConfig,
}

pub type TransportConfig = smartguard_mqtt_v4::Config;

impl Config {
    /// Locates and loads the configuration, falling back to built-in defaults
    /// when no file exists.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a file was named or found but cannot be read,
    /// parsed, or validated.
    pub fn new() -> Result<Self, ConfigError> {
        match Self::get_config_path(std::env::var(CONFIG_ENV).ok())? {
            Some(path) => Self::load(&path),
            None => {
                print_info!("No configuration file found, using built-in defaults");
                Ok(Config::default())
            }
        }
    }

    /// Determines the configuration file path.
    ///
    /// Priority:
    /// 1. `SMARTGUARD_CONFIG` (must exist when set)
    /// 2. `/etc/smartguard/config.toml` (only if present)
    fn get_config_path(from_env: Option<String>) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(config_path) = from_env {
            let path = PathBuf::from(config_path);
            if !path.exists() {
                return Err(ConfigError::Config(format!(
                    "{} points to a missing file: {}",
                    CONFIG_ENV,
                    path.display()
                )));
            }
            print_info!("Using config from {}: {}", CONFIG_ENV, path.display());
            return Ok(Some(path));
        }

        let fallback = Path::new(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            print_info!("Using default config path: {}", fallback.display());
            return Ok(Some(fallback.to_path_buf()));
        }

        Ok(None)
    }

    /// Loads and validates configuration from the specified path.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        print_info!("Loading configuration from: {}", path.display());

        let config_str = fs::read_to_string(path)?;
        let config = Self::from_toml(&config_str)?;

        print_info!("Successfully loaded config from: {}", path.display());
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(source: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
}
