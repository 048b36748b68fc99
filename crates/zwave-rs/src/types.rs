// crates/zwave-rs/src/types.rs
use core::convert::TryFrom;
use core::fmt;

// --- Link Control Bytes (Serial API, host <-> controller) ---

/// Start Of Frame: first byte of every data frame.
pub const SOF: u8 = 0x01;
/// Positive acknowledgement of a received data frame.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement (checksum or format error).
pub const NAK: u8 = 0x15;
/// Cancel: the frame collided with one sent by the other side.
pub const CAN: u8 = 0x18;

/// Highest node ID a Z-Wave network can address.
pub const MAX_NODE_ID: u8 = 232;

/// Size of the node bitmask returned by `SerialApiGetInitData` (232 nodes / 8).
pub const NODE_BITMASK_SIZE: usize = 29;

/// Default transmit options for SendData: ACK | AUTO_ROUTE | EXPLORE.
pub const TRANSMIT_OPTIONS_DEFAULT: u8 = 0x25;

/// Represents a Z-Wave Node ID, wrapping a `u8` to ensure type safety.
///
/// Valid Node IDs are in the range 1-232. The newtype prevents accidental
/// use of raw payload bytes where a node address is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u8);

/// Error type for invalid Node ID creation.
#[derive(Debug, PartialEq, Eq)]
pub enum NodeIdError {
    /// Node ID is outside the valid range (1-232).
    InvalidRange(u8),
}

impl fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIdError::InvalidRange(value) => {
                write!(f, "Invalid NodeId value: {}. Valid range is 1-232.", value)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NodeIdError {}

impl TryFrom<u8> for NodeId {
    type Error = NodeIdError;

    /// Creates a `NodeId` from a `u8`, returning an error if the value is not a valid
    /// Z-Wave node address.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=MAX_NODE_ID => Ok(NodeId(value)),
            _ => Err(NodeIdError::InvalidRange(value)),
        }
    }
}

impl From<NodeId> for u8 {
    fn from(node_id: NodeId) -> Self {
        node_id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- Serial API Identifiers ---

/// Frame type octet of a Serial API data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Unsolicited frame, or a host-initiated command.
    Request = 0x00,
    /// Synchronous answer to the last request.
    Response = 0x01,
}

/// Error type for invalid MessageType conversion.
#[derive(Debug, PartialEq, Eq)]
pub struct InvalidMessageTypeError(pub u8);

impl TryFrom<u8> for MessageType {
    type Error = InvalidMessageTypeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(MessageType::Request),
            0x01 => Ok(MessageType::Response),
            _ => Err(InvalidMessageTypeError(value)),
        }
    }
}

/// Serial API function identifiers (the "message class") this stack understands.
///
/// Unknown function ids are carried as `Other` so that the codec never
/// rejects a well-formed frame just because no handler exists for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageClass {
    SerialApiGetInitData,
    ApplicationCommandHandler,
    SendData,
    GetVersion,
    MemoryGetId,
    IdentifyNode,
    ApplicationUpdate,
    RequestNodeInfo,
    RemoveFailedNodeId,
    IsFailedNodeId,
    Other(u8),
}

impl MessageClass {
    /// The function id octet as sent on the wire.
    pub fn key(&self) -> u8 {
        match self {
            MessageClass::SerialApiGetInitData => 0x02,
            MessageClass::ApplicationCommandHandler => 0x04,
            MessageClass::SendData => 0x13,
            MessageClass::GetVersion => 0x15,
            MessageClass::MemoryGetId => 0x20,
            MessageClass::IdentifyNode => 0x41,
            MessageClass::ApplicationUpdate => 0x49,
            MessageClass::RequestNodeInfo => 0x60,
            MessageClass::RemoveFailedNodeId => 0x61,
            MessageClass::IsFailedNodeId => 0x62,
            MessageClass::Other(key) => *key,
        }
    }
}

impl From<u8> for MessageClass {
    fn from(value: u8) -> Self {
        match value {
            0x02 => MessageClass::SerialApiGetInitData,
            0x04 => MessageClass::ApplicationCommandHandler,
            0x13 => MessageClass::SendData,
            0x15 => MessageClass::GetVersion,
            0x20 => MessageClass::MemoryGetId,
            0x41 => MessageClass::IdentifyNode,
            0x49 => MessageClass::ApplicationUpdate,
            0x60 => MessageClass::RequestNodeInfo,
            0x61 => MessageClass::RemoveFailedNodeId,
            0x62 => MessageClass::IsFailedNodeId,
            other => MessageClass::Other(other),
        }
    }
}

/// Relative urgency of an outgoing transaction. Declared from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagePriority {
    High,
    Set,
    Get,
    Poll,
    Low,
}

impl MessagePriority {
    /// Numeric urgency, higher is sent first.
    pub fn urgency(&self) -> u8 {
        match self {
            MessagePriority::High => 4,
            MessagePriority::Set => 3,
            MessagePriority::Get => 2,
            MessagePriority::Poll => 1,
            MessagePriority::Low => 0,
        }
    }
}
