//! Agent configuration read from the environment
//!
//! Everything is optional. A missing identity key is sent as an empty string;
//! the collector decides what to make of it.

use thiserror_no_std::Error;

/// Device identity credential attached to every payload.
pub const KEY_VAR: &str = "Key";
/// Serial device the sensors are attached to.
pub const SERIAL_PORT_VAR: &str = "THERMO_SERIAL_PORT";
/// Base URL of the collector, without the endpoint path.
pub const COLLECTOR_URL_VAR: &str = "THERMO_COLLECTOR_URL";

pub const DEFAULT_COLLECTOR_URL: &str = "http://localhost:8080";

#[cfg(windows)]
pub const DEFAULT_SERIAL_PORT: &str = "COM2";
#[cfg(not(windows))]
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("THERMO_COLLECTOR_URL must be an http:// or https:// URL, got {0:?}")]
    InvalidCollectorUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub identity_key: String,
    pub serial_port: String,
    pub collector_url: String,
}

impl AgentConfig {
    /// Build the configuration from a variable lookup such as `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let identity_key = lookup(KEY_VAR).unwrap_or_default();
        let serial_port =
            non_empty(SERIAL_PORT_VAR).unwrap_or_else(|| DEFAULT_SERIAL_PORT.to_owned());
        let collector_url =
            non_empty(COLLECTOR_URL_VAR).unwrap_or_else(|| DEFAULT_COLLECTOR_URL.to_owned());

        let collector_url = collector_url.trim().trim_end_matches('/').to_owned();
        if !(collector_url.starts_with("http://") || collector_url.starts_with("https://")) {
            return Err(ConfigError::InvalidCollectorUrl(collector_url));
        }

        Ok(Self {
            identity_key,
            serial_port,
            collector_url,
        })
    }
}
