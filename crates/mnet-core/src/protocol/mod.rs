//! M-NET Bus Protocol
//!
//! Framing, checksum validation and command decoding for the half-duplex
//! M-NET serial bus used by Mitsubishi HVAC units.
//!
//! Frame layout:
//! - byte 0: destination address
//! - bytes 1-2: unit address pair (used by the address filter)
//! - byte 3: source address
//! - byte 4: payload length `L`
//! - `L` bytes: payload
//! - 1 byte: additive checksum (bytes 0..=5+L sum to zero mod 256)
//! - 1 byte: trailer

pub mod checksum;
pub mod commands;
mod error;
pub mod fields;
mod frame;
pub mod serial;

pub use checksum::ChecksumStatus;
pub use commands::{match_bytes, match_command, Command, CommandPattern, COMMAND_TABLE};
pub use error::ProtocolError;
pub use frame::{Frame, FrameAccumulator, FrameEvent, FramePhase, SkipReason};
pub use serial::{list_ports, open_port, ByteSource, PortInfo, SerialByteSource};

/// Default bus baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default idle window before the decoder resynchronises, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// How often a blocked read wakes up to check for cancellation, in milliseconds
pub const POLL_INTERVAL_MS: u64 = 100;

/// Maximum payload length
pub const MAX_DATA: usize = 20;

/// Header (5 bytes), checksum and trailer
pub const FRAME_OVERHEAD: usize = 7;

/// Capacity of the frame buffer
pub const MAX_FRAME_SIZE: usize = MAX_DATA + FRAME_OVERHEAD;

/// Offset of the payload length byte
pub const LENGTH_OFFSET: usize = 4;

/// Offset of the first payload byte
pub const PAYLOAD_OFFSET: usize = 5;

/// Bus address of the CoolMaster gateway
pub const COOLMASTER_ADDR: u8 = 0xFB;
