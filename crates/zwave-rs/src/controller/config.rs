// crates/zwave-rs/src/controller/config.rs
use crate::types::TRANSMIT_OPTIONS_DEFAULT;

/// Timing and sizing knobs of the transaction dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How long to wait for the link-level ACK of a written frame.
    pub ack_timeout_us: u64,
    /// How long to wait for each later phase (response, callback, report).
    pub response_timeout_us: u64,
    /// Resends granted to a transaction before its node is declared DEAD.
    pub max_resends: u32,
    /// Maximum number of transactions waiting in the outgoing queue.
    pub queue_capacity: usize,
    /// Transmit options appended to every SendData frame.
    pub transmit_options: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            ack_timeout_us: 1_500_000,
            response_timeout_us: 5_000_000,
            max_resends: 3,
            queue_capacity: 256,
            transmit_options: TRANSMIT_OPTIONS_DEFAULT,
        }
    }
}
