use std::fmt::{self, Debug, Formatter};
use thiserror::Error;

/// Offset of the riding mode code within a status frame.
pub const MODE_OFFSET: usize = 5;
/// Offset of the gate byte, which distinguishes status frames from other notifications sharing the
/// same characteristic.
pub const GATE_OFFSET: usize = 6;
/// The gate byte value of a status frame.
pub const GATE_VALUE: u8 = 0x00;
/// Frames shorter than this can't hold both the mode code and the gate byte.
pub const MIN_FRAME_LENGTH: usize = GATE_OFFSET + 1;

/// The reason a notification was not accepted as a status frame.
///
/// Neither case is a fault: the characteristic carries other traffic too, which is simply dropped.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FrameError {
    #[error("Frame too short ({length} bytes, need at least {})", MIN_FRAME_LENGTH)]
    TooShort { length: usize },
    #[error("Gate byte is 0x{gate:02x}, not a status frame")]
    GateMismatch { gate: u8 },
}

/// A notification payload which has passed the gate check, borrowed from the event which carried
/// it.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct StatusFrame<'a> {
    bytes: &'a [u8],
}

impl<'a> StatusFrame<'a> {
    /// Checks whether the given notification payload is a status frame.
    ///
    /// Any bytes after the gate byte are ignored.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_FRAME_LENGTH {
            return Err(FrameError::TooShort {
                length: bytes.len(),
            });
        }
        match bytes[GATE_OFFSET] {
            GATE_VALUE => Ok(Self { bytes }),
            gate => Err(FrameError::GateMismatch { gate }),
        }
    }

    /// The raw riding mode code.
    pub fn mode_code(&self) -> u8 {
        self.bytes[MODE_OFFSET]
    }

    /// The whole payload, including any trailing bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl Debug for StatusFrame<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "StatusFrame({:02x?})", self.bytes)
    }
}

/// Returns whether the given notification payload is a well-formed status frame.
pub fn validate(frame: &[u8]) -> bool {
    StatusFrame::parse(frame).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_empty() {
        assert!(!validate(&[]));
    }

    #[test]
    fn validate_too_short() {
        for length in 0..MIN_FRAME_LENGTH {
            let frame = vec![0x00; length];
            assert!(!validate(&frame), "length {length} should be rejected");
        }
        assert_eq!(
            StatusFrame::parse(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01]),
            Err(FrameError::TooShort { length: 6 })
        );
    }

    #[test]
    fn validate_gate_mismatch() {
        for gate in 0x01..=0xff {
            assert!(!validate(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01, gate]));
        }
        assert_eq!(
            StatusFrame::parse(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x01]),
            Err(FrameError::GateMismatch { gate: 0x01 })
        );
    }

    #[test]
    fn validate_gate_open() {
        assert!(validate(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00]));
        assert!(validate(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x09, 0x00]));
    }

    #[test]
    fn trailing_bytes_ignored() {
        let bytes = [0x5a, 0xa5, 0x01, 0x02, 0x03, 0x03, 0x00, 0xff, 0xff, 0x10];
        let frame = StatusFrame::parse(&bytes).unwrap();
        assert_eq!(frame.mode_code(), 0x03);
        assert_eq!(frame.as_bytes().len(), 10);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            FrameError::GateMismatch { gate: 0x1f }.to_string(),
            "Gate byte is 0x1f, not a status frame"
        );
        assert_eq!(
            FrameError::TooShort { length: 3 }.to_string(),
            "Frame too short (3 bytes, need at least 7)"
        );
    }
}
