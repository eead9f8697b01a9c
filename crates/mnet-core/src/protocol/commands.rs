//! Protocol commands
//!
//! Commands are recognised by comparing the bytes from the length field
//! onward against a fixed table of mask/value patterns. The first matching
//! row wins, so row order matters.

use super::fields::{
    show_fan_speed, show_temperature, Power, ReportedMode, RunState, SetMode, UNKNOWN_MARKER,
    UNKNOWN_POWER_MARKER,
};
use super::Frame;

/// Commands observed between the CoolMaster gateway and indoor units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Power on or off request
    PowerOn,
    /// Acknowledgment of a power request
    PowerOnAck,
    /// Set operating mode
    SetMode,
    /// Acknowledgment of a set-mode request
    SetModeAck,
    /// Set target temperature
    SetTemp,
    /// Acknowledgment of a set-temperature request
    SetTempAck,
    /// Set fan speed
    SetFanSpeed,
    /// Acknowledgment of a set-fan-speed request
    SetFanSpeedAck,
    /// Query run state
    GetStatus,
    /// Run state reply
    GetStatusAck,
    /// Query operating mode
    GetMode,
    /// Operating mode reply
    GetModeAck,
    /// Query target temperature
    GetSetpoint,
    /// Target temperature reply
    GetSetpointAck,
    /// Query fan speed
    GetFanSpeed,
    /// Fan speed reply
    GetFanSpeedAck,
    /// Query room temperature
    GetCurrentTemp,
    /// Room temperature reply
    GetCurrentTempAck,
}

impl Command {
    /// Short identifier used in log events
    pub fn name(&self) -> &'static str {
        match self {
            Command::PowerOn => "poweron",
            Command::PowerOnAck => "poweron_ack",
            Command::SetMode => "setmode",
            Command::SetModeAck => "setmode_ack",
            Command::SetTemp => "settemp",
            Command::SetTempAck => "settemp_ack",
            Command::SetFanSpeed => "setfanspeed",
            Command::SetFanSpeedAck => "setfanspeed_ack",
            Command::GetStatus => "getstatus",
            Command::GetStatusAck => "getstatus_ack",
            Command::GetMode => "getmode",
            Command::GetModeAck => "getmode_ack",
            Command::GetSetpoint => "getsetpoint",
            Command::GetSetpointAck => "getsetpoint_ack",
            Command::GetFanSpeed => "getfanspeed",
            Command::GetFanSpeedAck => "getfanspeed_ack",
            Command::GetCurrentTemp => "getcurrenttemp",
            Command::GetCurrentTempAck => "getcurrenttemp_ack",
        }
    }

    /// Whether this is a unit's reply rather than a request
    pub fn is_ack(&self) -> bool {
        matches!(
            self,
            Command::PowerOnAck
                | Command::SetModeAck
                | Command::SetTempAck
                | Command::SetFanSpeedAck
                | Command::GetStatusAck
                | Command::GetModeAck
                | Command::GetSetpointAck
                | Command::GetFanSpeedAck
                | Command::GetCurrentTempAck
        )
    }

    /// Render the decoded meaning of `payload`
    ///
    /// Acknowledgments of set commands render a bare ` ok`; acknowledgments
    /// of get commands render the reported value.
    pub fn describe(&self, payload: &[u8]) -> String {
        let param = payload.get(2).copied();
        match self {
            Command::PowerOn => {
                let state = param
                    .and_then(Power::from_code)
                    .map(|p| p.label())
                    .unwrap_or(UNKNOWN_POWER_MARKER);
                format!("turn {}", state)
            }
            Command::PowerOnAck
            | Command::SetModeAck
            | Command::SetTempAck
            | Command::SetFanSpeedAck => " ok".to_string(),
            Command::SetMode => {
                let mode = param
                    .and_then(SetMode::from_code)
                    .map(|m| m.label())
                    .unwrap_or(UNKNOWN_MARKER);
                format!("set mode {}", mode)
            }
            Command::SetTemp => format!("set temp {}", show_temperature(payload, 2)),
            Command::SetFanSpeed => format!("set fan speed{}", show_fan_speed(payload, 2)),
            Command::GetStatus => "get status".to_string(),
            Command::GetStatusAck => match param.and_then(RunState::from_code) {
                Some(state) => format!(" {}", state.label()),
                None => UNKNOWN_MARKER.to_string(),
            },
            Command::GetMode => "get mode".to_string(),
            Command::GetModeAck => match param.and_then(ReportedMode::from_code) {
                Some(mode) => format!(" {}", mode.label()),
                None => UNKNOWN_MARKER.to_string(),
            },
            Command::GetSetpoint => "get setpoint temp".to_string(),
            Command::GetSetpointAck => show_temperature(payload, 2),
            Command::GetFanSpeed => "get fan speed".to_string(),
            Command::GetFanSpeedAck => show_fan_speed(payload, 2),
            Command::GetCurrentTemp => "get current temp".to_string(),
            Command::GetCurrentTempAck => show_temperature(payload, 3),
        }
    }
}

/// One row of the command table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPattern {
    /// Bits compared at each position
    pub mask: &'static [u8],
    /// Required value of each masked byte
    pub expected: &'static [u8],
    /// Command selected when every byte matches
    pub command: Command,
}

impl CommandPattern {
    const fn new(mask: &'static [u8], expected: &'static [u8], command: Command) -> Self {
        Self {
            mask,
            expected,
            command,
        }
    }

    /// Compare against frame bytes starting at the length field
    pub fn matches(&self, command_bytes: &[u8]) -> bool {
        if command_bytes.len() < self.expected.len() {
            return false;
        }
        self.mask
            .iter()
            .zip(self.expected)
            .zip(command_bytes)
            .all(|((mask, expected), byte)| byte & mask == *expected)
    }
}

const M3: &[u8] = &[0xFF, 0xFF, 0xFF];
const M4: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];

/// Command table in priority order
pub static COMMAND_TABLE: [CommandPattern; 18] = [
    CommandPattern::new(M3, &[5, 0x0D, 0x01], Command::PowerOn),
    CommandPattern::new(M4, &[3, 0x0D, 0x81, 0x00], Command::PowerOnAck),
    CommandPattern::new(M3, &[3, 0x0D, 0x02], Command::SetMode),
    CommandPattern::new(M4, &[3, 0x0D, 0x82, 0x00], Command::SetModeAck),
    CommandPattern::new(M3, &[5, 0x05, 0x01], Command::SetTemp),
    CommandPattern::new(M4, &[3, 0x05, 0x81, 0x00], Command::SetTempAck),
    CommandPattern::new(M3, &[3, 0x0D, 0x0E], Command::SetFanSpeed),
    CommandPattern::new(M4, &[3, 0x0D, 0x8E, 0x00], Command::SetFanSpeedAck),
    CommandPattern::new(M3, &[2, 0x2D, 0x01], Command::GetStatus),
    CommandPattern::new(M3, &[5, 0x2D, 0x81], Command::GetStatusAck),
    CommandPattern::new(M3, &[2, 0x2D, 0x02], Command::GetMode),
    CommandPattern::new(M3, &[3, 0x2D, 0x82], Command::GetModeAck),
    CommandPattern::new(M3, &[2, 0x25, 0x01], Command::GetSetpoint),
    CommandPattern::new(M3, &[5, 0x25, 0x81], Command::GetSetpointAck),
    CommandPattern::new(M3, &[2, 0x2D, 0x0E], Command::GetFanSpeed),
    CommandPattern::new(M3, &[3, 0x2D, 0x8E], Command::GetFanSpeedAck),
    CommandPattern::new(M4, &[3, 0x35, 0x03, 0x22], Command::GetCurrentTemp),
    CommandPattern::new(M4, &[5, 0x35, 0x83, 0x22], Command::GetCurrentTempAck),
];

/// First command whose pattern matches `frame`
pub fn match_command(frame: &Frame<'_>) -> Option<Command> {
    match_bytes(frame.command_bytes())
}

/// First command whose pattern matches bytes starting at the length field
pub fn match_bytes(command_bytes: &[u8]) -> Option<Command> {
    COMMAND_TABLE
        .iter()
        .find(|pattern| pattern.matches(command_bytes))
        .map(|pattern| pattern.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shape() {
        for pattern in &COMMAND_TABLE {
            assert_eq!(pattern.mask.len(), pattern.expected.len());
        }
    }

    #[test]
    fn test_match_poweron() {
        assert_eq!(match_bytes(&[5, 0x0D, 0x01, 0x01, 0, 0]), Some(Command::PowerOn));
    }

    #[test]
    fn test_short_input_never_matches() {
        assert_eq!(match_bytes(&[3, 0x0D, 0x81]), None);
        assert_eq!(match_bytes(&[]), None);
    }

    #[test]
    fn test_unknown_bytes() {
        assert_eq!(match_bytes(&[1, 0x77, 0x00, 0x00, 0x00]), None);
    }

    #[test]
    fn test_describe_set_commands() {
        assert_eq!(Command::PowerOn.describe(&[0x0D, 0x01, 0x00]), "turn off");
        assert_eq!(Command::PowerOn.describe(&[0x0D, 0x01, 0x09]), "turn ??");
        assert_eq!(Command::SetMode.describe(&[0x0D, 0x02, 32]), "set mode auto");
        assert_eq!(Command::SetMode.describe(&[0x0D, 0x02, 0x0D]), "set mode ???");
        assert_eq!(
            Command::SetFanSpeed.describe(&[0x0D, 0x0E, 6]),
            "set fan speed high"
        );
        assert_eq!(
            Command::SetTemp.describe(&[0x05, 0x01, 0x02, 0x35, 0x00]),
            "set temp  23.5 deg C, 74.3 deg F"
        );
        assert_eq!(Command::SetTempAck.describe(&[0x05, 0x81, 0x00]), " ok");
    }

    #[test]
    fn test_describe_get_acks() {
        assert_eq!(Command::GetStatusAck.describe(&[0x2D, 0x81, 1, 0, 0]), " running");
        assert_eq!(Command::GetStatusAck.describe(&[0x2D, 0x81, 4, 0, 0]), "???");
        assert_eq!(Command::GetModeAck.describe(&[0x2D, 0x82, 0x0D]), " fan only");
        assert_eq!(Command::GetModeAck.describe(&[0x2D, 0x82, 32]), "???");
        assert_eq!(Command::GetFanSpeedAck.describe(&[0x2D, 0x8E, 0x0B]), " auto");
        assert_eq!(
            Command::GetCurrentTempAck.describe(&[0x35, 0x83, 0x22, 0x0D, 0x01]),
            " 130.1 deg C, 266.2 deg F"
        );
    }

    #[test]
    fn test_ack_classification() {
        assert!(Command::GetModeAck.is_ack());
        assert!(!Command::GetMode.is_ack());
        assert_eq!(Command::GetCurrentTempAck.name(), "getcurrenttemp_ack");
    }
}
