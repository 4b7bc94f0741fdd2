use crate::{LinkError, Result};
use core::fmt;

/// Baud rate the motion firmware listens on.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// A 2-byte actuator command: action code followed by its checksum.
///
/// The checksum is the bitwise complement of the action code, which lets the
/// microcontroller reject a corrupted byte. It does not correct anything.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ActuatorFrame {
    action: u8,
    checksum: u8,
}

impl ActuatorFrame {
    pub const LEN: usize = 2;

    pub fn new(action: u8) -> Self {
        Self {
            action,
            checksum: Self::checksum(action),
        }
    }

    /// Complement checksum. Applying it twice yields the original byte.
    pub const fn checksum(action: u8) -> u8 {
        action ^ 0xFF
    }

    pub fn action(&self) -> u8 {
        self.action
    }

    pub fn checksum_byte(&self) -> u8 {
        self.checksum
    }

    pub fn is_valid(&self) -> bool {
        self.checksum == Self::checksum(self.action)
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        [self.action, self.checksum]
    }

    /// Decode a received frame, verifying the checksum.
    pub fn from_bytes(bytes: [u8; 2]) -> Result<Self> {
        let frame = Self {
            action: bytes[0],
            checksum: bytes[1],
        };
        if !frame.is_valid() {
            return Err(LinkError::InvalidFrame("checksum mismatch"));
        }
        Ok(frame)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [action, checksum] => Self::from_bytes([*action, *checksum]),
            _ => Err(LinkError::InvalidFrame("frame must be exactly 2 bytes")),
        }
    }
}

impl fmt::Display for ActuatorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X}", self.action, self.checksum)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PortInfo {
    pub name: String,
    pub driver: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout_is_code_then_complement() {
        let frame = ActuatorFrame::new(0x01);
        assert_eq!(frame.to_bytes(), [0x01, 0xFE]);
        assert_eq!(ActuatorFrame::new(0x05).to_bytes(), [0x05, 0xFA]);
        assert_eq!(ActuatorFrame::new(0x00).to_bytes(), [0x00, 0xFF]);
        assert_eq!(ActuatorFrame::new(0xFF).to_bytes(), [0xFF, 0x00]);
    }

    #[test]
    fn checksum_is_an_involution_for_every_code() {
        for code in 0..=u8::MAX {
            let frame = ActuatorFrame::new(code);
            assert!(frame.is_valid());
            assert_eq!(ActuatorFrame::checksum(frame.checksum_byte()), code);
            assert_eq!(ActuatorFrame::checksum(ActuatorFrame::checksum(code)), code);
        }
    }

    #[test]
    fn decoding_rejects_corrupted_checksum() {
        assert!(ActuatorFrame::from_bytes([0x03, 0xFC]).is_ok());
        assert!(matches!(
            ActuatorFrame::from_bytes([0x03, 0xFD]),
            Err(LinkError::InvalidFrame(_))
        ));
        assert!(ActuatorFrame::from_slice(&[0x03]).is_err());
        assert!(ActuatorFrame::from_slice(&[0x03, 0xFC, 0x00]).is_err());
    }

    #[test]
    fn display_is_hex_pair() {
        assert_eq!(ActuatorFrame::new(0x04).to_string(), "04 FB");
    }
}
