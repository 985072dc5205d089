use std::fmt;
use std::str::FromStr;

/// Start-of-frame marker for frames sent to the reader.
pub const SOF_OUT: u8 = 0x80;
/// Start-of-frame marker for frames coming back from the reader.
pub const SOF_IN: u8 = 0x08;

pub const CMD_READ_ADVANCE: u8 = 0x64;
pub const CMD_READ_AUTO_POWER: u8 = 0x61;
pub const CMD_READ_FIRMWARE: u8 = 0x35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Inventory read with explicit power, timeout and record limit (64H).
    ReadAdvance,
    /// Single-shot read with reader-chosen power (61H).
    ReadAutoPower,
    /// Firmware version query (35H).
    ReadFirmware,
}

impl CommandKind {
    pub fn code(self) -> u8 {
        match self {
            CommandKind::ReadAdvance => CMD_READ_ADVANCE,
            CommandKind::ReadAutoPower => CMD_READ_AUTO_POWER,
            CommandKind::ReadFirmware => CMD_READ_FIRMWARE,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            CMD_READ_ADVANCE => Some(CommandKind::ReadAdvance),
            CMD_READ_AUTO_POWER => Some(CommandKind::ReadAutoPower),
            CMD_READ_FIRMWARE => Some(CommandKind::ReadFirmware),
            _ => None,
        }
    }

    /// Error codes the reader uses to report a successful completion.
    ///
    /// 64H only ever reports `0001`; the single-shot commands have been seen
    /// answering with `0000` as well, so both are accepted there.
    pub fn success_codes(self) -> &'static [ErrorCode] {
        match self {
            CommandKind::ReadAdvance => &[ErrorCode::SUCCESS],
            CommandKind::ReadAutoPower | CommandKind::ReadFirmware => {
                &[ErrorCode::SUCCESS, ErrorCode::ZERO]
            }
        }
    }

    pub fn is_success(self, code: ErrorCode) -> bool {
        self.success_codes().contains(&code)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandKind::ReadAdvance => "advance",
            CommandKind::ReadAutoPower => "auto-power",
            CommandKind::ReadFirmware => "firmware",
        })
    }
}

impl FromStr for CommandKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "advance" | "64" | "64h" => Ok(CommandKind::ReadAdvance),
            "auto-power" | "61" | "61h" => Ok(CommandKind::ReadAutoPower),
            "firmware" | "35" | "35h" => Ok(CommandKind::ReadFirmware),
            other => Err(format!(
                "unknown command '{other}', expected advance, auto-power or firmware"
            )),
        }
    }
}

/// Two-byte device status word, shown as four uppercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    pub const ZERO: ErrorCode = ErrorCode(0x0000);
    pub const SUCCESS: ErrorCode = ErrorCode(0x0001);

    pub fn from_be_bytes(b: [u8; 2]) -> Self {
        ErrorCode(u16::from_be_bytes(b))
    }

    /// Human readable meaning from the reader's error table.
    pub fn description(self) -> Option<&'static str> {
        Some(match self.0 {
            0x0001 => "success",
            0x0002 => "frame CRC error",
            0x0003 => "frame CMD error",
            0x0004 => "frame LEN error",
            0x0005 => "frame SOF error",
            0x0101 => "command operation failed",
            0x0102 => "operation timed out",
            0x2002 => "firmware model mismatch",
            0x4001 => "internal flash write failed",
            0x4002 => "internal flash read failed",
            0x4003 => "external flash write failed",
            0x4004 => "external flash read failed",
            0x4005 => "external flash init error",
            0x8001 => "update data checksum 1 error",
            0x8002 => "update data checksum 2 error",
            0x8003 => "update data checksum 1 and 2 error",
            0xFFFF => "other error",
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_formats_as_four_hex_digits() {
        assert_eq!(ErrorCode(0x0001).to_string(), "0001");
        assert_eq!(ErrorCode(0x2002).to_string(), "2002");
        assert_eq!(ErrorCode(0xabcd).to_string(), "ABCD");
    }

    #[test]
    fn success_set_differs_per_command() {
        assert!(CommandKind::ReadAdvance.is_success(ErrorCode::SUCCESS));
        assert!(!CommandKind::ReadAdvance.is_success(ErrorCode::ZERO));
        assert!(CommandKind::ReadAutoPower.is_success(ErrorCode::ZERO));
        assert!(CommandKind::ReadFirmware.is_success(ErrorCode::SUCCESS));
        assert!(!CommandKind::ReadFirmware.is_success(ErrorCode(0x0101)));
    }

    #[test]
    fn command_kind_parses_names_and_codes() {
        assert_eq!(
            "advance".parse::<CommandKind>(),
            Ok(CommandKind::ReadAdvance)
        );
        assert_eq!("61H".parse::<CommandKind>(), Ok(CommandKind::ReadAutoPower));
        assert_eq!(
            "Firmware".parse::<CommandKind>(),
            Ok(CommandKind::ReadFirmware)
        );
        assert!("inventory".parse::<CommandKind>().is_err());
        for kind in [
            CommandKind::ReadAdvance,
            CommandKind::ReadAutoPower,
            CommandKind::ReadFirmware,
        ] {
            assert_eq!(CommandKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn error_table_lookup() {
        assert_eq!(ErrorCode(0x0102).description(), Some("operation timed out"));
        assert_eq!(ErrorCode(0x1234).description(), None);
    }
}
