// crates/zwave-rs/src/frame/codec.rs
//! Start-delimited, XOR-checksummed frame encoding.
//!
//! Layout on the wire: `[start][header...][length][body...][checksum]`.
//! The checksum is `seed ^ b1 ^ b2 ^ ...` over every raw byte after the
//! start byte up to, but excluding, the checksum itself.

use crate::hal::ZWaveError;
use alloc::vec::Vec;
use core::fmt;
use log::trace;

/// Describes the framing rules of one serial protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Delimiter that opens every frame.
    pub start: u8,
    /// Opaque bytes between the start byte and the length byte.
    pub header_len: usize,
    /// Whether the length byte counts the trailing checksum byte.
    pub length_includes_checksum: bool,
    /// Initial value of the running XOR.
    pub checksum_seed: u8,
    /// Whether a start byte inside the body is sent doubled.
    pub escape_start: bool,
    /// `(computed, transmitted)`: a computed checksum equal to the first value is sent as the second.
    pub checksum_substitute: Option<(u8, u8)>,
}

impl FrameLayout {
    /// Z-Wave Serial API data frame: `SOF LEN TYPE FUNC DATA... CHK`, checksum is the
    /// complement (seed 0xFF) of the XOR over length and body.
    pub const ZWAVE: FrameLayout = FrameLayout {
        start: 0x01,
        header_len: 0,
        length_includes_checksum: true,
        checksum_seed: 0xFF,
        escape_start: false,
        checksum_substitute: None,
    };

    /// Nibe heat pump RS-485 frame: `5C ADDR(2) CMD LEN DATA... CHK`, plain XOR,
    /// 0x5C doubled inside data, a checksum of 0x5C sent as 0xC5.
    pub const NIBE: FrameLayout = FrameLayout {
        start: 0x5C,
        header_len: 3,
        length_includes_checksum: false,
        checksum_seed: 0x00,
        escape_start: true,
        checksum_substitute: Some((0x5C, 0xC5)),
    };

    /// Offset of the length byte within a frame.
    fn length_offset(&self) -> usize {
        1 + self.header_len
    }

    /// Smallest possible frame: start, header, length and checksum.
    pub fn min_frame_len(&self) -> usize {
        self.length_offset() + 2
    }

    /// Number of raw body bytes announced by a length byte.
    fn body_len(&self, length: u8) -> Result<usize, FrameError> {
        if self.length_includes_checksum {
            (length as usize)
                .checked_sub(1)
                .ok_or(FrameError::BadLength(length))
        } else {
            Ok(length as usize)
        }
    }

    /// Total frame size (start to checksum inclusive) announced by a length byte.
    pub fn frame_len(&self, length: u8) -> Result<usize, FrameError> {
        Ok(self.length_offset() + 1 + self.body_len(length)? + 1)
    }

    /// Computes the checksum that must be transmitted for `covered`
    /// (the raw bytes between start and checksum).
    pub fn checksum(&self, covered: &[u8]) -> u8 {
        let computed = covered
            .iter()
            .fold(self.checksum_seed, |acc, byte| acc ^ byte);
        match self.checksum_substitute {
            Some((from, to)) if computed == from => to,
            _ => computed,
        }
    }
}

/// Low-level reasons a byte sequence is not a valid frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Not enough bytes yet for the announced frame.
    Incomplete,
    /// First byte is not the layout's start delimiter.
    BadStart(u8),
    /// The length byte cannot describe a frame of this layout.
    BadLength(u8),
    /// The body does not fit in a single length byte.
    BodyTooLong,
    /// Checksum byte does not match the computed value.
    Checksum { expected: u8, actual: u8 },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete => write!(f, "Frame is incomplete"),
            Self::BadStart(b) => write!(f, "Unexpected start byte {b:#04x}"),
            Self::BadLength(l) => write!(f, "Invalid length byte {l:#04x}"),
            Self::BodyTooLong => write!(f, "Frame body exceeds 255 bytes"),
            Self::Checksum { expected, actual } => {
                write!(f, "Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}

/// A frame that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Opaque header bytes (empty for Z-Wave).
    pub header: Vec<u8>,
    /// Body with any escaping removed.
    pub body: Vec<u8>,
    /// Number of input bytes the frame occupied.
    pub consumed: usize,
}

/// Validates and decodes one frame from the start of `bytes`.
pub fn decode(layout: &FrameLayout, bytes: &[u8]) -> Result<DecodedFrame, FrameError> {
    let first = *bytes.first().ok_or(FrameError::Incomplete)?;
    if first != layout.start {
        return Err(FrameError::BadStart(first));
    }
    if bytes.len() < layout.min_frame_len() {
        return Err(FrameError::Incomplete);
    }

    let length_offset = layout.length_offset();
    let total = layout.frame_len(bytes[length_offset])?;
    if bytes.len() < total {
        return Err(FrameError::Incomplete);
    }

    let covered = &bytes[1..total - 1];
    let expected = layout.checksum(covered);
    let actual = bytes[total - 1];
    if expected != actual {
        trace!("Frame checksum failure: computed {expected:#04x}, received {actual:#04x}");
        return Err(FrameError::Checksum { expected, actual });
    }

    let raw_body = &bytes[length_offset + 1..total - 1];
    let body = if layout.escape_start {
        unescape(raw_body, layout.start)
    } else {
        raw_body.to_vec()
    };

    Ok(DecodedFrame {
        header: bytes[1..length_offset].to_vec(),
        body,
        consumed: total,
    })
}

/// Builds a complete frame around `header` and `body`.
pub fn encode(layout: &FrameLayout, header: &[u8], body: &[u8]) -> Result<Vec<u8>, FrameError> {
    if header.len() != layout.header_len {
        return Err(FrameError::BadLength(header.len() as u8));
    }

    let raw_body = if layout.escape_start {
        escape(body, layout.start)
    } else {
        body.to_vec()
    };
    let length = raw_body.len() + usize::from(layout.length_includes_checksum);
    let length = u8::try_from(length).map_err(|_| FrameError::BodyTooLong)?;

    let mut frame = Vec::with_capacity(layout.min_frame_len() + raw_body.len());
    frame.push(layout.start);
    frame.extend_from_slice(header);
    frame.push(length);
    frame.extend_from_slice(&raw_body);
    let checksum = layout.checksum(&frame[1..]);
    frame.push(checksum);
    Ok(frame)
}

/// Convenience wrapper returning the crate error type.
pub fn decode_frame(layout: &FrameLayout, bytes: &[u8]) -> Result<DecodedFrame, ZWaveError> {
    decode(layout, bytes).map_err(ZWaveError::from)
}

fn escape(body: &[u8], start: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    for &byte in body {
        out.push(byte);
        if byte == start {
            out.push(byte);
        }
    }
    out
}

fn unescape(raw: &[u8], start: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut iter = raw.iter().copied().peekable();
    while let Some(byte) = iter.next() {
        out.push(byte);
        if byte == start && iter.peek() == Some(&start) {
            iter.next();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Nibe reference telegram, checksum 0x45.
    const NIBE_OK: [u8; 86] = [
        0x5C, 0x00, 0x20, 0x68, 0x50, 0x01, 0xA8, 0x1F, 0x01, 0x00, 0xA8, 0x64, 0x00, 0xFD,
        0xA7, 0xD0, 0x03, 0x44, 0x9C, 0x1E, 0x00, 0x4F, 0x9C, 0xA0, 0x00, 0x50, 0x9C, 0x78,
        0x00, 0x51, 0x9C, 0x03, 0x01, 0x52, 0x9C, 0x1B, 0x01, 0x87, 0x9C, 0x14, 0x01, 0x4E,
        0x9C, 0xC6, 0x01, 0x47, 0x9C, 0x01, 0x01, 0x15, 0xB9, 0xB0, 0xFF, 0x3A, 0xB9, 0x4B,
        0x00, 0xC9, 0xAF, 0x00, 0x00, 0x48, 0x9C, 0x0D, 0x01, 0x4C, 0x9C, 0xE7, 0x00, 0x4B,
        0x9C, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0xFF, 0x00,
        0x00, 0x45,
    ];

    /// Same family, one 0x5C doubled in the data (length counts both).
    const NIBE_ESCAPED: [u8; 87] = [
        0x5C, 0x00, 0x20, 0x68, 0x51, 0x44, 0x9C, 0x25, 0x00, 0x48, 0x9C, 0xFC, 0x00, 0x4C,
        0x9C, 0xF1, 0x00, 0x4E, 0x9C, 0xC7, 0x01, 0x4D, 0x9C, 0x0B, 0x02, 0x4F, 0x9C, 0x25,
        0x00, 0x50, 0x9C, 0x33, 0x00, 0x51, 0x9C, 0x0B, 0x01, 0x52, 0x9C, 0x5C, 0x5C, 0x01,
        0x56, 0x9C, 0x31, 0x00, 0xC9, 0xAF, 0x00, 0x00, 0x01, 0xA8, 0x0C, 0x01, 0xFD, 0xA7,
        0x16, 0xFA, 0xFA, 0xA9, 0x07, 0x00, 0x98, 0xA9, 0x1B, 0x1B, 0xFF, 0xFF, 0x00, 0x00,
        0xA0, 0xA9, 0xCA, 0x02, 0xFF, 0xFF, 0x00, 0x00, 0x9C, 0xA9, 0x92, 0x12, 0xFF, 0xFF,
        0x00, 0x00, 0xBE,
    ];

    /// Same family, computed checksum 0x5C transmitted as 0xC5.
    const NIBE_SUBSTITUTED: [u8; 86] = [
        0x5C, 0x00, 0x20, 0x68, 0x50, 0x44, 0x9C, 0x26, 0x00, 0x48, 0x9C, 0xF6, 0x00, 0x4C,
        0x9C, 0xF1, 0x00, 0x4E, 0x9C, 0xD6, 0x01, 0x4D, 0x9C, 0x0C, 0x02, 0x4F, 0x9C, 0x45,
        0x00, 0x50, 0x9C, 0x3F, 0x00, 0x51, 0x9C, 0xF1, 0x00, 0x52, 0x9C, 0x04, 0x01, 0x56,
        0x9C, 0xD5, 0x00, 0xC9, 0xAF, 0x00, 0x00, 0x01, 0xA8, 0x0C, 0x01, 0xFD, 0xA7, 0x99,
        0xFA, 0xFA, 0xA9, 0x02, 0x00, 0x98, 0xA9, 0x1A, 0x1B, 0xFF, 0xFF, 0x00, 0x00, 0xA0,
        0xA9, 0xCA, 0x02, 0xFF, 0xFF, 0x00, 0x00, 0x9C, 0xA9, 0x92, 0x12, 0xFF, 0xFF, 0x00,
        0x00, 0xC5,
    ];

    #[test]
    fn test_nibe_reference_frame_is_valid() {
        let frame = decode(&FrameLayout::NIBE, &NIBE_OK).unwrap();
        assert_eq!(frame.header, vec![0x00, 0x20, 0x68]);
        assert_eq!(frame.body.len(), 0x50);
        assert_eq!(frame.body[0], 0x01);
        assert_eq!(frame.consumed, NIBE_OK.len());
    }

    #[test]
    fn test_nibe_reference_frame_with_flipped_checksum_is_rejected() {
        let mut corrupted = NIBE_OK;
        corrupted[85] = 0x44;
        assert_eq!(
            decode(&FrameLayout::NIBE, &corrupted),
            Err(FrameError::Checksum {
                expected: 0x45,
                actual: 0x44
            })
        );
        assert!(matches!(
            decode_frame(&FrameLayout::NIBE, &corrupted),
            Err(ZWaveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_nibe_escaped_start_byte_in_body() {
        let frame = decode(&FrameLayout::NIBE, &NIBE_ESCAPED).unwrap();
        // 0x51 raw bytes on the wire, one of them an escape.
        assert_eq!(frame.body.len(), 0x50);
        assert_eq!(frame.body[34], 0x5C);
        assert_eq!(frame.body[35], 0x01);
    }

    #[test]
    fn test_nibe_substituted_checksum() {
        let frame = decode(&FrameLayout::NIBE, &NIBE_SUBSTITUTED).unwrap();
        assert_eq!(frame.body.len(), 0x50);
    }

    #[test]
    fn test_nibe_encode_reproduces_reference() {
        let decoded = decode(&FrameLayout::NIBE, &NIBE_ESCAPED).unwrap();
        let encoded = encode(&FrameLayout::NIBE, &decoded.header, &decoded.body).unwrap();
        assert_eq!(encoded, NIBE_ESCAPED.to_vec());
    }

    #[test]
    fn test_zwave_known_frames() {
        // GetVersion request and SerialApiGetInitData request as sent by every host.
        assert_eq!(
            encode(&FrameLayout::ZWAVE, &[], &[0x00, 0x15]).unwrap(),
            vec![0x01, 0x03, 0x00, 0x15, 0xE9]
        );
        assert_eq!(
            encode(&FrameLayout::ZWAVE, &[], &[0x00, 0x02]).unwrap(),
            vec![0x01, 0x03, 0x00, 0x02, 0xFE]
        );
        let frame = decode(&FrameLayout::ZWAVE, &[0x01, 0x03, 0x00, 0x20, 0xDC]).unwrap();
        assert_eq!(frame.body, vec![0x00, 0x20]);
        assert!(frame.header.is_empty());
    }

    #[test]
    fn test_incomplete_and_malformed_input() {
        assert_eq!(decode(&FrameLayout::ZWAVE, &[]), Err(FrameError::Incomplete));
        assert_eq!(
            decode(&FrameLayout::ZWAVE, &[0x01, 0x05, 0x00]),
            Err(FrameError::Incomplete)
        );
        assert_eq!(
            decode(&FrameLayout::ZWAVE, &[0x06, 0x03, 0x00, 0x15, 0xE9]),
            Err(FrameError::BadStart(0x06))
        );
        assert_eq!(
            decode(&FrameLayout::ZWAVE, &[0x01, 0x00, 0xFF]),
            Err(FrameError::BadLength(0x00))
        );
    }

    #[test]
    fn test_body_too_long() {
        let body = vec![0u8; 255];
        assert_eq!(
            encode(&FrameLayout::ZWAVE, &[], &body),
            Err(FrameError::BodyTooLong)
        );
    }
}
