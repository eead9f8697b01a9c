//! Frame accumulation
//!
//! Bytes arrive one at a time from the bus. The accumulator stores them in a
//! bounded buffer, keeps a running checksum and decides when a frame is
//! complete from the length byte at offset 4.

use super::checksum::{self, ChecksumStatus};
use super::{FRAME_OVERHEAD, LENGTH_OFFSET, MAX_FRAME_SIZE, PAYLOAD_OFFSET};

/// Outcome of ingesting one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// Byte stored, frame not finished
    Continuing,
    /// Buffer capacity exceeded; reported once per frame
    Overflow,
    /// Checksum over bytes `0..=5+L` was nonzero; frame will be skipped
    ChecksumMismatch,
    /// A checksum-valid frame is complete and readable via [`FrameAccumulator::frame`]
    FrameComplete,
    /// An overflowed frame reached the end implied by its length byte
    BadLength,
    /// A checksum-failed frame reached the end implied by its length byte
    Discarded,
}

/// Accumulator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Waiting for the first byte of a frame
    Idle,
    /// Collecting a frame
    Accumulating,
    /// Consuming the rest of a frame that will not be decoded
    Skipping(SkipReason),
}

/// Why a frame is being skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The frame outgrew the buffer
    Overflow,
    /// The checksum did not sum to zero
    Checksum,
}

/// A complete, checksum-valid frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Wrap raw frame bytes
    ///
    /// Returns `None` if `bytes` is shorter than the length byte implies.
    pub fn new(bytes: &'a [u8]) -> Option<Self> {
        let len = *bytes.get(LENGTH_OFFSET)? as usize;
        if bytes.len() < len + FRAME_OVERHEAD {
            return None;
        }
        Some(Self { bytes })
    }

    /// All bytes as seen on the wire
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Destination address (byte 0)
    pub fn destination(&self) -> u8 {
        self.bytes[0]
    }

    /// Unit address pair compared by the address filter (bytes 1 and 2)
    pub fn unit_pair(&self) -> (u8, u8) {
        (self.bytes[1], self.bytes[2])
    }

    /// Source address (byte 3)
    pub fn source(&self) -> u8 {
        self.bytes[3]
    }

    /// Declared payload length
    pub fn payload_len(&self) -> usize {
        self.bytes[LENGTH_OFFSET] as usize
    }

    /// Payload bytes
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + self.payload_len()]
    }

    /// Bytes from the length field onward, as compared by the command table
    pub fn command_bytes(&self) -> &'a [u8] {
        &self.bytes[LENGTH_OFFSET..]
    }
}

/// Byte-at-a-time frame state machine
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    buffer: Vec<u8>,
    /// Wire bytes seen for the current frame, stored or not
    received: usize,
    checksum: u8,
    phase: FramePhase,
    /// Overflow already reported for the current frame
    overflowed: bool,
}

impl FrameAccumulator {
    /// Create an idle accumulator
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_FRAME_SIZE),
            received: 0,
            checksum: 0,
            phase: FramePhase::Idle,
            overflowed: false,
        }
    }

    /// Current phase
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Running checksum of the current frame
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Wire bytes seen for the current frame
    pub fn received(&self) -> usize {
        self.received
    }

    /// Bytes stored for the current (or just finished) frame
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// The frame finished by the last [`FrameEvent::FrameComplete`]
    pub fn frame(&self) -> Option<Frame<'_>> {
        Frame::new(&self.buffer)
    }

    /// Total frame length, once the length byte has arrived
    pub fn expected_len(&self) -> Option<usize> {
        self.buffer
            .get(LENGTH_OFFSET)
            .map(|len| *len as usize + FRAME_OVERHEAD)
    }

    /// Whether a frame is partly collected
    pub fn in_frame(&self) -> bool {
        self.phase != FramePhase::Idle
    }

    /// Abandon any partial frame
    ///
    /// Returns `true` if a frame was in progress.
    pub fn reset(&mut self) -> bool {
        let was_in_frame = self.in_frame();
        self.clear();
        was_in_frame
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.received = 0;
        self.checksum = 0;
        self.phase = FramePhase::Idle;
        self.overflowed = false;
    }

    /// Consume one byte from the bus
    pub fn ingest(&mut self, byte: u8) -> FrameEvent {
        if self.phase == FramePhase::Idle {
            // Previous frame stays readable until the next one starts
            self.clear();
            self.phase = FramePhase::Accumulating;
        }

        self.received += 1;
        self.checksum = self.checksum.wrapping_add(byte);

        // A frame already skipping for its checksum can still outgrow the buffer
        let mut just_overflowed = false;
        if self.buffer.len() < MAX_FRAME_SIZE {
            self.buffer.push(byte);
        } else if !self.overflowed {
            self.overflowed = true;
            just_overflowed = true;
            if self.phase == FramePhase::Accumulating {
                self.phase = FramePhase::Skipping(SkipReason::Overflow);
            }
        }

        let Some(expected) = self.expected_len() else {
            return FrameEvent::Continuing;
        };

        match self.phase {
            FramePhase::Accumulating if self.received == expected - 1 => {
                if checksum::validate(self.checksum) == ChecksumStatus::Mismatch {
                    self.phase = FramePhase::Skipping(SkipReason::Checksum);
                    self.checksum = 0;
                    return FrameEvent::ChecksumMismatch;
                }
                FrameEvent::Continuing
            }
            FramePhase::Accumulating if self.received == expected => {
                // The trailer byte is outside the checksummed range
                self.phase = FramePhase::Idle;
                self.checksum = 0;
                self.received = 0;
                FrameEvent::FrameComplete
            }
            FramePhase::Skipping(reason) if self.received >= expected => {
                self.phase = FramePhase::Idle;
                self.checksum = 0;
                self.received = 0;
                match (just_overflowed, reason) {
                    (true, _) => FrameEvent::Overflow,
                    (false, SkipReason::Overflow) => FrameEvent::BadLength,
                    (false, SkipReason::Checksum) => FrameEvent::Discarded,
                }
            }
            _ if just_overflowed => FrameEvent::Overflow,
            _ => FrameEvent::Continuing,
        }
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
