//! # M-NET Sniffer Core Library
//!
//! Passive decoding of the M-NET HVAC serial bus into a timestamped,
//! human-readable trace.
//!
//! This library provides:
//! - Byte-at-a-time frame accumulation with checksum validation
//! - Command recognition against a fixed mask/value table
//! - Field decoding (temperatures, fan speed, mode, status)
//! - Trace rendering and an append-only trace log
//! - A cancellable, single-threaded capture loop
//!
//! ## Example
//!
//! ```rust,ignore
//! use mnet_core::prelude::*;
//!
//! let config = SnifferConfig::default();
//! let source = open_port(&config.port_name, Some(config.baud_rate))?;
//! let sink = TraceLog::open(&config.log_path, config.echo)?;
//! let cancel = Arc::new(AtomicBool::new(false));
//! let decoder = Decoder::new(config.address_filter());
//!
//! let stats = Sniffer::new(source, sink, decoder, config.timeout(), cancel).run()?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod decoder;
pub mod protocol;
pub mod sniffer;
pub mod trace;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SnifferConfig;
    pub use crate::decoder::{AddressFilter, Decoder, DecoderStats};
    pub use crate::protocol::{
        list_ports, open_port, ByteSource, Command, FrameEvent, ProtocolError,
    };
    pub use crate::sniffer::Sniffer;
    pub use crate::trace::{TraceLog, TraceSink};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
