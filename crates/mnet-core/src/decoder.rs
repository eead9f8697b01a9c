//! Frame decoder
//!
//! Owns the frame accumulator, the address filter and the running counters,
//! and turns accumulator events into trace text.

use std::fmt;
use std::time::Duration;

use crate::protocol::commands::match_command;
use crate::protocol::{FrameAccumulator, FrameEvent, ProtocolError, COOLMASTER_ADDR};
use crate::trace::{
    render_bad_checksum, render_frame, render_heartbeat, TraceSink, OVERFLOW_MARKER,
    UNRECOGNIZED_MARKER,
};

/// Bus address as shown in log events: `CM` for the gateway, hex otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressLabel(pub u8);

impl fmt::Display for AddressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == COOLMASTER_ADDR {
            write!(f, "CM")
        } else {
            write!(f, "{:02X}", self.0)
        }
    }
}

/// Restricts rendering to frames addressed to one unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressFilter {
    unit: Option<u8>,
}

impl AddressFilter {
    /// `None` accepts every frame
    pub fn new(unit: Option<u8>) -> Self {
        Self { unit }
    }

    /// Unit address being watched
    pub fn unit(&self) -> Option<u8> {
        self.unit
    }

    /// Whether a frame with this unit address pair should be rendered
    pub fn accepts(&self, unit_pair: (u8, u8)) -> bool {
        match self.unit {
            None => true,
            Some(unit) => unit_pair.0 == unit || unit_pair.1 == unit,
        }
    }
}

/// Running totals for a capture session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Checksum-valid frames, rendered or filtered
    pub frames: u64,
    /// Frames suppressed by the address filter
    pub filtered: u64,
    /// Frames that matched no command
    pub unrecognized: u64,
    /// Frames dropped for a bad checksum
    pub checksum_errors: u64,
    /// Frames that outgrew the buffer
    pub overflows: u64,
    /// Idle windows that elapsed with no byte
    pub timeouts: u64,
}

/// Stateful decoder for one bus
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    accumulator: FrameAccumulator,
    filter: AddressFilter,
    frame_started: Duration,
    /// (destination, source) of the previous frame
    prev_addresses: Option<(u8, u8)>,
    stats: DecoderStats,
}

impl Decoder {
    /// Create a decoder with an idle accumulator
    pub fn new(filter: AddressFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Active address filter
    pub fn filter(&self) -> AddressFilter {
        self.filter
    }

    /// Totals so far
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Frame state, for inspecting a partial frame
    pub fn accumulator(&self) -> &FrameAccumulator {
        &self.accumulator
    }

    /// Feed one byte received at `elapsed` since capture start
    pub fn feed<S: TraceSink + ?Sized>(
        &mut self,
        byte: u8,
        elapsed: Duration,
        sink: &mut S,
    ) -> Result<FrameEvent, ProtocolError> {
        if !self.accumulator.in_frame() {
            self.frame_started = elapsed;
        }

        let event = self.accumulator.ingest(byte);
        match event {
            FrameEvent::Continuing | FrameEvent::BadLength | FrameEvent::Discarded => {}
            FrameEvent::Overflow => {
                self.stats.overflows += 1;
                sink.write(OVERFLOW_MARKER)?;
            }
            FrameEvent::ChecksumMismatch => {
                self.stats.checksum_errors += 1;
                sink.write(&render_bad_checksum(self.accumulator.bytes()))?;
            }
            FrameEvent::FrameComplete => self.complete_frame(sink)?,
        }
        Ok(event)
    }

    fn complete_frame<S: TraceSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), ProtocolError> {
        let Some(frame) = self.accumulator.frame() else {
            return Ok(());
        };
        self.stats.frames += 1;

        let addresses = (frame.destination(), frame.source());
        if self.prev_addresses != Some(addresses) {
            tracing::debug!(
                to = %AddressLabel(addresses.0),
                from = %AddressLabel(addresses.1),
                "conversation changed"
            );
            self.prev_addresses = Some(addresses);
        }

        if !self.filter.accepts(frame.unit_pair()) {
            self.stats.filtered += 1;
            return Ok(());
        }

        let decoded = match match_command(&frame) {
            Some(command) => {
                tracing::trace!(command = command.name(), "decoded frame");
                command.describe(frame.payload())
            }
            None => {
                self.stats.unrecognized += 1;
                UNRECOGNIZED_MARKER.to_string()
            }
        };

        sink.write(&render_frame(self.frame_started, frame.bytes(), &decoded))?;
        Ok(())
    }

    /// The bus has been idle for the read timeout
    ///
    /// Any partial frame is dropped without a diagnostic and a heartbeat
    /// separator is written.
    pub fn timeout<S: TraceSink + ?Sized>(
        &mut self,
        elapsed: Duration,
        sink: &mut S,
    ) -> Result<(), ProtocolError> {
        self.stats.timeouts += 1;
        if self.accumulator.reset() {
            tracing::debug!("dropped partial frame after idle timeout");
        }
        sink.write(&render_heartbeat(elapsed))?;
        Ok(())
    }

    /// Abandon any partial frame without writing anything
    pub fn reset(&mut self) -> bool {
        self.accumulator.reset()
    }
}
