//! Protocol errors

use thiserror::Error;

/// Errors that end a capture session
///
/// Bus anomalies (bad checksums, oversized frames, unknown commands) are not
/// errors; they are reported in the trace and decoding carries on.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The serial driver reported a failure
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// The named device does not exist
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Settings the capture loop cannot run with
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file is not valid JSON
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Reading the bus or writing the trace failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
