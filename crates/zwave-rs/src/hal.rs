// crates/zwave-rs/src/hal.rs
use crate::frame::FrameError;
use crate::types::{InvalidMessageTypeError, NodeId, NodeIdError};
use core::fmt;

/// Defines a portable, descriptive Error type for the Z-Wave stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZWaveError {
    /// The provided buffer is too small for the operation.
    BufferTooShort,
    /// An underlying I/O error occurred on the serial link.
    IoError,
    /// The serial worker is gone (channel closed or thread stopped).
    Disconnected,
    /// A received frame failed checksum validation.
    ChecksumMismatch { expected: u8, actual: u8 },
    /// A received frame is fundamentally invalid (bad start byte, bad length, bad type).
    MalformedFrame,
    /// A value in the frame is not a valid node address.
    InvalidNodeId(u8),
    /// The target node is not known to the controller.
    NodeNotFound(NodeId),
    /// The target node has been marked FAILED for this session.
    NodeFailed(NodeId),
    /// The target node is DEAD; the failed transaction was dropped.
    NodeDead(NodeId),
    /// A low priority transaction for a sleeping node was dropped.
    NodeAsleep(NodeId),
    /// The controller firmware did not place the frame on its stack.
    StackRejected(u8),
    /// The transaction was resent the maximum number of times and still failed.
    RetriesExhausted(NodeId),
    /// No terminal frame arrived before the transaction deadline.
    TransactionTimeout(NodeId),
    /// The controller itself did not answer a request addressed to it.
    ControllerTimeout,
    /// Command class capabilities can only be written during the interview.
    RegistryLocked(NodeId),
    /// A node stage change violated the lifecycle ordering.
    InvalidStageTransition,
    /// The outgoing queue is at capacity.
    QueueFull,
}

impl fmt::Display for ZWaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooShort => write!(f, "Buffer is too short for the frame"),
            Self::IoError => write!(f, "An underlying I/O error occurred"),
            Self::Disconnected => write!(f, "The serial worker is not running"),
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "Frame checksum mismatch: expected {expected:#04x}, got {actual:#04x}"
            ),
            Self::MalformedFrame => write!(f, "Frame is not a valid serial frame"),
            Self::InvalidNodeId(v) => write!(f, "Invalid NodeId value: {v}"),
            Self::NodeNotFound(n) => write!(f, "Node {} is not known to the controller", n.0),
            Self::NodeFailed(n) => write!(f, "Node {} is marked as failed", n.0),
            Self::NodeDead(n) => write!(f, "Node {} is dead", n.0),
            Self::NodeAsleep(n) => write!(f, "Node {} is asleep", n.0),
            Self::StackRejected(v) => {
                write!(f, "Controller did not place the frame on its stack (code {v:#04x})")
            }
            Self::RetriesExhausted(n) => write!(f, "Node {}: maximum resend count reached", n.0),
            Self::TransactionTimeout(n) => write!(f, "Node {}: transaction timed out", n.0),
            Self::ControllerTimeout => write!(f, "The controller did not answer"),
            Self::RegistryLocked(n) => {
                write!(f, "Node {}: command classes can only change during the interview", n.0)
            }
            Self::InvalidStageTransition => write!(f, "Invalid node stage transition"),
            Self::QueueFull => write!(f, "The outgoing transaction queue is full"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ZWaveError {}

// --- From Implementations for Error Conversion ---

impl From<NodeIdError> for ZWaveError {
    fn from(err: NodeIdError) -> Self {
        match err {
            NodeIdError::InvalidRange(val) => ZWaveError::InvalidNodeId(val),
        }
    }
}

impl From<InvalidMessageTypeError> for ZWaveError {
    fn from(_: InvalidMessageTypeError) -> Self {
        ZWaveError::MalformedFrame
    }
}

impl From<FrameError> for ZWaveError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Incomplete => ZWaveError::BufferTooShort,
            FrameError::Checksum { expected, actual } => {
                ZWaveError::ChecksumMismatch { expected, actual }
            }
            FrameError::BadStart(_) | FrameError::BadLength(_) | FrameError::BodyTooLong => {
                ZWaveError::MalformedFrame
            }
        }
    }
}

/// Hardware Abstraction Layer (HAL) for the byte-oriented serial link to the controller.
///
/// This trait abstracts the physical port so the transaction engine stays
/// platform-agnostic (no_std). The link is half-duplex at the protocol level
/// but the port itself may deliver bytes in arbitrary chunks.
pub trait SerialInterface {
    /// Writes all bytes to the link.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ZWaveError>;

    /// Reads whatever bytes are available into `buffer`.
    ///
    /// Returns `Ok(0)` when the read timed out without data; this is not an error.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, ZWaveError>;
}
