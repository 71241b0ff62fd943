use crate::decode::frame::StatusFrame;
use std::fmt::{self, Display, Formatter};

/// The riding mode reported by the scooter controller.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
    Eco,
    Sport,
    Race,
    /// A mode code which doesn't map to any known riding mode. The raw code is kept for
    /// diagnostics; it is never shown as a mode change.
    Unknown(u8),
}

impl Mode {
    /// Maps a raw mode code to a riding mode.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::Eco,
            0x02 => Self::Sport,
            0x03 => Self::Race,
            code => Self::Unknown(code),
        }
    }

    /// Validates the given notification payload and decodes the mode from it.
    ///
    /// Returns `None` if the payload is not a status frame.
    pub fn decode(value: &[u8]) -> Option<Self> {
        StatusFrame::parse(value).ok().map(|frame| decode(&frame))
    }

    /// Returns whether this is one of the riding modes which can be displayed.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Returns the display name of the mode, e.g. `"SPORT"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eco => "ECO",
            Self::Sport => "SPORT",
            Self::Race => "RACE",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decodes the riding mode from a status frame.
pub fn decode(frame: &StatusFrame) -> Mode {
    Mode::from_code(frame.mode_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_mode(code: u8) -> [u8; 7] {
        [0x00, 0x00, 0x00, 0x00, 0x00, code, 0x00]
    }

    #[test]
    fn decode_known() {
        for (code, mode) in [(0x01, Mode::Eco), (0x02, Mode::Sport), (0x03, Mode::Race)] {
            let bytes = frame_with_mode(code);
            let frame = StatusFrame::parse(&bytes).unwrap();
            assert_eq!(decode(&frame), mode);
        }
    }

    #[test]
    fn decode_unknown() {
        for code in (0x00..=0xff).filter(|code| !(0x01..=0x03).contains(code)) {
            let mode = Mode::from_code(code);
            assert_eq!(mode, Mode::Unknown(code));
            assert!(!mode.is_known());
        }
    }

    #[test]
    fn decode_unvalidated() {
        assert_eq!(Mode::decode(&frame_with_mode(0x02)), Some(Mode::Sport));
        assert_eq!(Mode::decode(&frame_with_mode(0x09)), Some(Mode::Unknown(0x09)));
        assert_eq!(Mode::decode(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01]), None);
        assert_eq!(Mode::decode(&[0x00, 0x00, 0x00]), None);
    }

    #[test]
    fn display() {
        assert_eq!(Mode::Eco.to_string(), "ECO");
        assert_eq!(Mode::Sport.to_string(), "SPORT");
        assert_eq!(Mode::Race.to_string(), "RACE");
        assert_eq!(Mode::Unknown(0x42).to_string(), "UNKNOWN");
    }
}
