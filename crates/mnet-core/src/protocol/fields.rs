//! Payload field interpreters
//!
//! Decoders for the individual values carried in command payloads. Set and
//! get commands use separate mode code spaces, so they get separate types.

use std::fmt;

/// Marker rendered for a code outside the known set
pub const UNKNOWN_MARKER: &str = "???";

/// Marker rendered for an unknown power parameter
pub const UNKNOWN_POWER_MARKER: &str = "??";

/// Convert Celsius to Fahrenheit
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Temperature encoded as whole degrees in tenths (`byte * 10`) plus a
/// nibble pair in the following byte
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    celsius: f64,
}

impl Temperature {
    /// Decode the two bytes at `pos` in `payload`
    pub fn decode(payload: &[u8], pos: usize) -> Option<Self> {
        let whole = *payload.get(pos)?;
        let fraction = *payload.get(pos + 1)?;
        let celsius = f64::from(whole) * 10.0
            + f64::from(fraction >> 4)
            + f64::from(fraction & 0x0F) / 10.0;
        Some(Self { celsius })
    }

    /// Degrees Celsius
    pub fn celsius(&self) -> f64 {
        self.celsius
    }

    /// Degrees Fahrenheit
    pub fn fahrenheit(&self) -> f64 {
        celsius_to_fahrenheit(self.celsius)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} deg C, {:.1} deg F",
            self.celsius(),
            self.fahrenheit()
        )
    }
}

/// Fan speed code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeed {
    /// Code 4
    Low,
    /// Code 5
    Medium,
    /// Code 6
    High,
    /// Code 0x0B
    Auto,
}

impl FanSpeed {
    /// Decode a fan speed byte
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            4 => Some(FanSpeed::Low),
            5 => Some(FanSpeed::Medium),
            6 => Some(FanSpeed::High),
            0x0B => Some(FanSpeed::Auto),
            _ => None,
        }
    }

    /// Text shown in the trace
    pub fn label(&self) -> &'static str {
        match self {
            FanSpeed::Low => "low",
            FanSpeed::Medium => "medium",
            FanSpeed::High => "high",
            FanSpeed::Auto => "auto",
        }
    }
}

/// Power parameter of a power command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    /// Code 1
    On,
    /// Code 0
    Off,
}

impl Power {
    /// Decode a power parameter byte
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Power::On),
            0 => Some(Power::Off),
            _ => None,
        }
    }

    /// Text shown in the trace
    pub fn label(&self) -> &'static str {
        match self {
            Power::On => "on",
            Power::Off => "off",
        }
    }
}

/// Mode requested by a set-mode command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Code 7
    Heat,
    /// Code 8
    Cool,
    /// Code 32
    Auto,
}

impl SetMode {
    /// Decode the mode parameter of a set-mode request
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            7 => Some(SetMode::Heat),
            8 => Some(SetMode::Cool),
            32 => Some(SetMode::Auto),
            _ => None,
        }
    }

    /// Text shown in the trace
    pub fn label(&self) -> &'static str {
        match self {
            SetMode::Heat => "heat",
            SetMode::Cool => "cool",
            SetMode::Auto => "auto",
        }
    }
}

/// Mode reported by a get-mode acknowledgment
///
/// Units report "fan only" here but never "auto".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedMode {
    /// Code 7
    Heat,
    /// Code 8
    Cool,
    /// Code 0x0D
    FanOnly,
}

impl ReportedMode {
    /// Decode the mode byte of a get-mode acknowledgment
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            7 => Some(ReportedMode::Heat),
            8 => Some(ReportedMode::Cool),
            0x0D => Some(ReportedMode::FanOnly),
            _ => None,
        }
    }

    /// Text shown in the trace
    pub fn label(&self) -> &'static str {
        match self {
            ReportedMode::Heat => "heat",
            ReportedMode::Cool => "cool",
            ReportedMode::FanOnly => "fan only",
        }
    }
}

/// Run state reported by a status acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Code 0
    Stopped,
    /// Code 1
    Running,
}

impl RunState {
    /// Decode the run state byte of a status acknowledgment
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RunState::Stopped),
            1 => Some(RunState::Running),
            _ => None,
        }
    }

    /// Text shown in the trace
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Stopped => "stopped",
            RunState::Running => "running",
        }
    }
}

/// Render ` <temperature>` or the unknown marker
pub fn show_temperature(payload: &[u8], pos: usize) -> String {
    match Temperature::decode(payload, pos) {
        Some(temp) => format!(" {}", temp),
        None => UNKNOWN_MARKER.to_string(),
    }
}

/// Render ` <fan speed>`; unknown codes render ` ???`
pub fn show_fan_speed(payload: &[u8], pos: usize) -> String {
    let label = payload
        .get(pos)
        .and_then(|code| FanSpeed::from_code(*code))
        .map(|speed| speed.label())
        .unwrap_or(UNKNOWN_MARKER);
    format!(" {}", label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_formula() {
        let temp = Temperature::decode(&[0x0D, 0x01], 0).expect("two bytes present");
        assert!((temp.celsius() - 130.1).abs() < 1e-9);
        assert_eq!(temp.to_string(), "130.1 deg C, 266.2 deg F");
    }

    #[test]
    fn test_temperature_nibbles() {
        // 2 * 10 + 3 + 0.5
        let temp = Temperature::decode(&[0xFF, 0x02, 0x35], 1).expect("present");
        assert_eq!(temp.to_string(), "23.5 deg C, 74.3 deg F");
    }

    #[test]
    fn test_temperature_missing_byte() {
        assert!(Temperature::decode(&[0x0D], 0).is_none());
        assert_eq!(show_temperature(&[0x0D], 0), UNKNOWN_MARKER);
    }

    #[test]
    fn test_celsius_fahrenheit_conversion() {
        assert!((celsius_to_fahrenheit(0.0) - 32.0).abs() < 0.01);
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 0.01);
    }

    #[test]
    fn test_fan_speed_codes() {
        assert_eq!(FanSpeed::from_code(4), Some(FanSpeed::Low));
        assert_eq!(FanSpeed::from_code(0x0B), Some(FanSpeed::Auto));
        assert_eq!(FanSpeed::from_code(7), None);
        assert_eq!(show_fan_speed(&[0, 0, 5], 2), " medium");
        assert_eq!(show_fan_speed(&[0, 0, 9], 2), " ???");
    }

    #[test]
    fn test_mode_code_spaces_are_distinct() {
        assert_eq!(SetMode::from_code(32), Some(SetMode::Auto));
        assert_eq!(ReportedMode::from_code(32), None);
        assert_eq!(ReportedMode::from_code(0x0D), Some(ReportedMode::FanOnly));
        assert_eq!(SetMode::from_code(0x0D), None);
    }

    #[test]
    fn test_power_and_run_state() {
        assert_eq!(Power::from_code(1).map(|p| p.label()), Some("on"));
        assert_eq!(Power::from_code(0).map(|p| p.label()), Some("off"));
        assert_eq!(Power::from_code(2), None);
        assert_eq!(RunState::from_code(1), Some(RunState::Running));
        assert_eq!(RunState::from_code(3), None);
    }
}
