//! Additive frame checksum
//!
//! Every byte of a frame up to and including the checksum byte is summed
//! with 8-bit wraparound; a valid frame sums to zero.

/// Result of validating an accumulated checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// Sum is zero
    Ok,
    /// Sum is nonzero
    Mismatch,
}

/// Wrapping sum of `bytes`
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Validate an accumulated sum
pub fn validate(sum: u8) -> ChecksumStatus {
    if sum == 0 {
        ChecksumStatus::Ok
    } else {
        ChecksumStatus::Mismatch
    }
}

/// The checksum byte that brings the sum of `bytes` to zero
pub fn checksum_byte_for(bytes: &[u8]) -> u8 {
    checksum(bytes).wrapping_neg()
}
