// crates/zwave-rs/src/frame/receiver.rs
use super::codec::{self, FrameError, FrameLayout};
use super::message::SerialMessage;
use crate::types::{ACK, CAN, NAK};
use alloc::vec::Vec;
use log::{trace, warn};

/// One unit recognised on the inbound byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Ack,
    Nak,
    Can,
    Frame(SerialMessage),
    /// A complete frame arrived but its checksum did not match. The host must NAK it.
    ChecksumError,
    /// A complete, checksum-valid frame that is not a Serial API message.
    Malformed,
    /// A byte outside any frame that is not a link control byte.
    Garbage(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Idle,
    /// SOF seen, waiting for the length byte.
    Length,
    /// Collecting the announced number of bytes.
    Body { remaining: usize },
}

/// Reassembles Serial API frames from arbitrary chunks of port data.
#[derive(Debug)]
pub struct FrameReceiver {
    state: RxState,
    buffer: Vec<u8>,
    started_at_us: u64,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    pub fn new() -> Self {
        Self {
            state: RxState::Idle,
            buffer: Vec::with_capacity(64),
            started_at_us: 0,
        }
    }

    /// True while a frame has started but not finished arriving.
    pub fn is_partial(&self) -> bool {
        self.state != RxState::Idle
    }

    /// Timestamp of the SOF of the frame currently being collected.
    pub fn started_at_us(&self) -> u64 {
        self.started_at_us
    }

    /// Drops a partially received frame.
    pub fn reset(&mut self) {
        if self.is_partial() {
            warn!("Discarding {} bytes of an incomplete frame", self.buffer.len());
        }
        self.state = RxState::Idle;
        self.buffer.clear();
    }

    /// Feeds received bytes and returns everything recognised in them, in order.
    pub fn feed(&mut self, bytes: &[u8], current_time_us: u64) -> Vec<Received> {
        let mut out = Vec::new();
        for &byte in bytes {
            if let Some(item) = self.push(byte, current_time_us) {
                out.push(item);
            }
        }
        out
    }

    fn push(&mut self, byte: u8, current_time_us: u64) -> Option<Received> {
        match self.state {
            RxState::Idle => match byte {
                ACK => Some(Received::Ack),
                NAK => Some(Received::Nak),
                CAN => Some(Received::Can),
                b if b == FrameLayout::ZWAVE.start => {
                    self.buffer.clear();
                    self.buffer.push(byte);
                    self.started_at_us = current_time_us;
                    self.state = RxState::Length;
                    None
                }
                other => {
                    trace!("Ignoring stray byte {other:#04x}");
                    Some(Received::Garbage(other))
                }
            },
            RxState::Length => {
                self.buffer.push(byte);
                match FrameLayout::ZWAVE.frame_len(byte) {
                    Ok(total) => {
                        self.state = RxState::Body {
                            remaining: total - self.buffer.len(),
                        };
                        None
                    }
                    Err(_) => {
                        self.state = RxState::Idle;
                        self.buffer.clear();
                        Some(Received::Malformed)
                    }
                }
            }
            RxState::Body { remaining } => {
                self.buffer.push(byte);
                if remaining > 1 {
                    self.state = RxState::Body {
                        remaining: remaining - 1,
                    };
                    return None;
                }
                self.state = RxState::Idle;
                let result = self.complete();
                self.buffer.clear();
                Some(result)
            }
        }
    }

    fn complete(&self) -> Received {
        match codec::decode(&FrameLayout::ZWAVE, &self.buffer) {
            Ok(frame) => match SerialMessage::from_body(&frame.body) {
                Ok(message) => Received::Frame(message),
                Err(_) => Received::Malformed,
            },
            Err(FrameError::Checksum { expected, actual }) => {
                warn!(
                    "Checksum error on inbound frame: expected {expected:#04x}, got {actual:#04x}"
                );
                Received::ChecksumError
            }
            Err(_) => Received::Malformed,
        }
    }
}
