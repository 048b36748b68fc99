// crates/zwave-rs/src/frame/message.rs
use super::codec::{self, FrameLayout};
use crate::hal::ZWaveError;
use crate::types::{MessageClass, MessageType, NodeId};
use alloc::vec::Vec;
use core::fmt;

/// A trait for objects that can be serialized into and deserialized from a byte buffer.
pub trait Codec: Sized {
    /// Serializes the object as a complete frame into `buffer`.
    /// Returns the number of bytes written.
    fn serialize(&self, buffer: &mut [u8]) -> Result<usize, ZWaveError>;

    /// Deserializes an object from a complete frame at the start of `buffer`.
    fn deserialize(buffer: &[u8]) -> Result<Self, ZWaveError>;
}

/// One Serial API data frame, stripped of its framing.
///
/// The payload is everything after the function id and before the checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialMessage {
    pub message_type: MessageType,
    pub message_class: MessageClass,
    pub payload: Vec<u8>,
}

impl SerialMessage {
    pub fn new(message_type: MessageType, message_class: MessageClass, payload: Vec<u8>) -> Self {
        Self {
            message_type,
            message_class,
            payload,
        }
    }

    /// A host-initiated request.
    pub fn request(message_class: MessageClass, payload: Vec<u8>) -> Self {
        Self::new(MessageType::Request, message_class, payload)
    }

    /// Byte `index` of the payload, if present.
    pub fn payload_byte(&self, index: usize) -> Option<u8> {
        self.payload.get(index).copied()
    }

    /// Payload byte interpreted as a node address.
    pub fn payload_node(&self, index: usize) -> Result<NodeId, ZWaveError> {
        let raw = self.payload_byte(index).ok_or(ZWaveError::BufferTooShort)?;
        Ok(NodeId::try_from(raw)?)
    }

    /// Builds the complete frame, ready to be written to the port.
    pub fn to_frame(&self) -> Result<Vec<u8>, ZWaveError> {
        let mut body = Vec::with_capacity(self.payload.len() + 2);
        body.push(self.message_type as u8);
        body.push(self.message_class.key());
        body.extend_from_slice(&self.payload);
        Ok(codec::encode(&FrameLayout::ZWAVE, &[], &body)?)
    }

    /// Parses a decoded frame body (`TYPE FUNC DATA...`).
    pub fn from_body(body: &[u8]) -> Result<Self, ZWaveError> {
        if body.len() < 2 {
            return Err(ZWaveError::MalformedFrame);
        }
        Ok(Self {
            message_type: MessageType::try_from(body[0])?,
            message_class: MessageClass::from(body[1]),
            payload: body[2..].to_vec(),
        })
    }

    // --- Request builders ---

    /// `SendData`: `[node][len][command...][tx options][callback id]`.
    pub fn send_data(node_id: NodeId, command: &[u8], transmit_options: u8, callback_id: u8) -> Self {
        let mut payload = Vec::with_capacity(command.len() + 4);
        payload.push(node_id.0);
        payload.push(command.len() as u8);
        payload.extend_from_slice(command);
        payload.push(transmit_options);
        payload.push(callback_id);
        Self::request(MessageClass::SendData, payload)
    }

    pub fn identify_node(node_id: NodeId) -> Self {
        Self::request(MessageClass::IdentifyNode, alloc::vec![node_id.0])
    }

    pub fn request_node_info(node_id: NodeId) -> Self {
        Self::request(MessageClass::RequestNodeInfo, alloc::vec![node_id.0])
    }

    pub fn is_failed_node(node_id: NodeId) -> Self {
        Self::request(MessageClass::IsFailedNodeId, alloc::vec![node_id.0])
    }

    pub fn get_version() -> Self {
        Self::request(MessageClass::GetVersion, Vec::new())
    }

    pub fn memory_get_id() -> Self {
        Self::request(MessageClass::MemoryGetId, Vec::new())
    }

    pub fn serial_api_get_init_data() -> Self {
        Self::request(MessageClass::SerialApiGetInitData, Vec::new())
    }

    /// Callback id carried by this request, for classes that use one.
    pub fn callback_id(&self) -> Option<u8> {
        match self.message_class {
            MessageClass::SendData => self.payload.last().copied(),
            _ => None,
        }
    }

    /// Replaces the callback id carried by this request. Returns false if the class has none.
    pub fn set_callback_id(&mut self, callback_id: u8) -> bool {
        if self.message_class != MessageClass::SendData {
            return false;
        }
        match self.payload.last_mut() {
            Some(last) => {
                *last = callback_id;
                true
            }
            None => false,
        }
    }

    /// Target node of a request that addresses one node.
    pub fn target_node(&self) -> Option<NodeId> {
        match self.message_class {
            MessageClass::SendData
            | MessageClass::IdentifyNode
            | MessageClass::RequestNodeInfo
            | MessageClass::IsFailedNodeId => self.payload_node(0).ok(),
            _ => None,
        }
    }

    /// True for requests the controller relays over the radio to the node.
    /// Others are answered by the controller from its own memory.
    pub fn reaches_node(&self) -> bool {
        matches!(
            self.message_class,
            MessageClass::SendData | MessageClass::RequestNodeInfo
        )
    }
}

impl Codec for SerialMessage {
    fn serialize(&self, buffer: &mut [u8]) -> Result<usize, ZWaveError> {
        let frame = self.to_frame()?;
        if buffer.len() < frame.len() {
            return Err(ZWaveError::BufferTooShort);
        }
        buffer[..frame.len()].copy_from_slice(&frame);
        Ok(frame.len())
    }

    fn deserialize(buffer: &[u8]) -> Result<Self, ZWaveError> {
        let frame = codec::decode_frame(&FrameLayout::ZWAVE, buffer)?;
        Self::from_body(&frame.body)
    }
}

impl fmt::Display for SerialMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} ({} payload bytes)",
            self.message_type,
            self.message_class,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_send_data_layout() {
        let msg = SerialMessage::send_data(NodeId(5), &[0x20, 0x02], 0x25, 0x0A);
        assert_eq!(msg.payload, vec![0x05, 0x02, 0x20, 0x02, 0x25, 0x0A]);
        assert_eq!(msg.callback_id(), Some(0x0A));

        let frame = msg.to_frame().unwrap();
        assert_eq!(&frame[..4], &[0x01, 0x09, 0x00, 0x13]);
        assert_eq!(frame.len(), 11);
        assert_eq!(SerialMessage::deserialize(&frame).unwrap(), msg);
    }

    #[test]
    fn test_set_callback_id() {
        let mut msg = SerialMessage::send_data(NodeId(5), &[0x20, 0x02], 0x25, 0x01);
        assert!(msg.set_callback_id(0x33));
        assert_eq!(msg.callback_id(), Some(0x33));

        let mut version = SerialMessage::get_version();
        assert!(!version.set_callback_id(0x33));
        assert_eq!(version.callback_id(), None);
    }

    #[test]
    fn test_response_parsing() {
        // SendData response: the controller accepted the frame.
        let msg = SerialMessage::deserialize(&[0x01, 0x04, 0x01, 0x13, 0x01, 0xE8]).unwrap();
        assert_eq!(msg.message_type, MessageType::Response);
        assert_eq!(msg.message_class, MessageClass::SendData);
        assert_eq!(msg.payload_byte(0), Some(0x01));
        assert_eq!(msg.payload_byte(1), None);
    }

    #[test]
    fn test_serialize_into_short_buffer() {
        let msg = SerialMessage::get_version();
        let mut small = [0u8; 3];
        assert_eq!(msg.serialize(&mut small), Err(ZWaveError::BufferTooShort));
        let mut buffer = [0u8; 16];
        assert_eq!(msg.serialize(&mut buffer), Ok(5));
        assert_eq!(&buffer[..5], &[0x01, 0x03, 0x00, 0x15, 0xE9]);
    }

    #[test]
    fn test_body_without_function_id_is_malformed() {
        assert_eq!(
            SerialMessage::from_body(&[0x00]),
            Err(ZWaveError::MalformedFrame)
        );
        assert_eq!(
            SerialMessage::from_body(&[0x07, 0x13]),
            Err(ZWaveError::MalformedFrame)
        );
    }
}
