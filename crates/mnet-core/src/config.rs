//! Sniffer configuration
//!
//! Settings come from an optional JSON file, with command line flags
//! layered on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::decoder::AddressFilter;
use crate::protocol::{ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

/// Default serial device
pub const DEFAULT_PORT: &str = "/dev/ttyS0";

/// Default trace file
pub const DEFAULT_LOG_PATH: &str = "log.txt";

/// Capture settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnifferConfig {
    /// Serial device name
    pub port_name: String,
    /// Bus baud rate
    pub baud_rate: u32,
    /// Idle window before the decoder resynchronises, in milliseconds
    pub timeout_ms: u64,
    /// Only render frames addressed to this unit
    pub filter_unit: Option<u8>,
    /// Trace file, opened for appending
    pub log_path: PathBuf,
    /// Echo the trace to stdout
    pub echo: bool,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            filter_unit: None,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            echo: true,
        }
    }
}

impl SnifferConfig {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProtocolError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: SnifferConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Render as pretty-printed JSON, the format read by [`Self::from_file`]
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the capture loop cannot run with
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.port_name.is_empty() {
            return Err(ProtocolError::InvalidConfig(
                "port name must not be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(ProtocolError::InvalidConfig(
                "baud rate must be greater than zero".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ProtocolError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Idle window as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Filter for the configured unit, if any
    pub fn address_filter(&self) -> AddressFilter {
        AddressFilter::new(self.filter_unit)
    }
}
