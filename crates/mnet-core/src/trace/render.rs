//! Trace line formatting
//!
//! The trace is a plain text stream consumed by people and log scrapers:
//! an elapsed-time column, the raw bytes in hex, then the decoded text.

use std::time::Duration;

/// Prefix of a checksum failure line
pub const BAD_CHECKSUM_MARKER: &str = "*** bad CRC *** ";

/// Emitted once when a frame outgrows the buffer
pub const OVERFLOW_MARKER: &str = "***too much data ";

/// Rendered in place of decoded text for an unrecognised command
pub const UNRECOGNIZED_MARKER: &str = "???";

/// `SSSSS.mmm  ` elapsed-time column
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    format!("{:5}.{:03}  ", millis / 1000, millis % 1000)
}

/// Two-digit uppercase hex, each byte followed by a space
pub fn format_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X} ", b)).collect()
}

/// Full line for a decoded frame
pub fn render_frame(elapsed: Duration, bytes: &[u8], decoded: &str) -> String {
    format!("{}{}{}\n", format_elapsed(elapsed), format_hex(bytes), decoded)
}

/// Diagnostic line for a frame whose checksum failed
pub fn render_bad_checksum(bytes: &[u8]) -> String {
    format!("{}{}\n", BAD_CHECKSUM_MARKER, format_hex(bytes))
}

/// Separator emitted when the bus has been idle for the read timeout
pub fn render_heartbeat(elapsed: Duration) -> String {
    format!("\n{}\n", format_elapsed(elapsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_elapsed_column() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "    0.000  ");
        assert_eq!(format_elapsed(Duration::from_millis(12_345)), "   12.345  ");
        assert_eq!(format_elapsed(Duration::from_millis(123_456_789)), "123456.789  ");
    }

    #[test]
    fn test_hex_column() {
        assert_eq!(format_hex(&[0x0A, 0xFB, 0x00]), "0A FB 00 ");
        assert_eq!(format_hex(&[]), "");
    }

    #[test]
    fn test_frame_line() {
        let line = render_frame(Duration::from_millis(1500), &[0xFB, 0x01], "get mode");
        assert_eq!(line, "    1.500  FB 01 get mode\n");
    }

    #[test]
    fn test_diagnostics() {
        assert_eq!(render_bad_checksum(&[0x01, 0x02]), "*** bad CRC *** 01 02 \n");
        assert_eq!(render_heartbeat(Duration::from_secs(10)), "\n   10.000  \n");
    }
}
