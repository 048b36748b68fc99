// crates/zwave-rs/src/frame/transmission.rs
use core::fmt;

/// Outcome of a send attempt as reported by the controller firmware
/// in the asynchronous SendData callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransmissionState {
    /// The node acknowledged the frame.
    CompleteOk = 0x00,
    /// The frame was sent but the node did not acknowledge it.
    CompleteNoAck = 0x01,
    /// The transceiver could not send the frame.
    CompleteFail = 0x02,
    /// The network was busy.
    CompleteNotIdle = 0x03,
    /// No route to the node is known.
    CompleteNoRoute = 0x04,
}

impl TransmissionState {
    /// Decodes the status byte of a SendData callback. Unknown values yield `None`.
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::CompleteOk),
            0x01 => Some(Self::CompleteNoAck),
            0x02 => Some(Self::CompleteFail),
            0x03 => Some(Self::CompleteNotIdle),
            0x04 => Some(Self::CompleteNoRoute),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == Self::CompleteOk
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CompleteOk => "Transmission complete and ACK received",
            Self::CompleteNoAck => "Transmission complete, no ACK received",
            Self::CompleteFail => "Transmission failed",
            Self::CompleteNotIdle => "Transmission failed, network busy",
            Self::CompleteNoRoute => "Transmission complete, no return route",
        }
    }
}

impl fmt::Display for TransmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bytes() {
        for byte in 0x00..=0x04u8 {
            let state = TransmissionState::from_byte(byte).unwrap();
            assert_eq!(state as u8, byte);
        }
        assert!(TransmissionState::from_byte(0x00).unwrap().is_ok());
        assert!(!TransmissionState::from_byte(0x01).unwrap().is_ok());
        assert_eq!(TransmissionState::from_byte(0x05), None);
        assert_eq!(TransmissionState::from_byte(0xFF), None);
    }
}
