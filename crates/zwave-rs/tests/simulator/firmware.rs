// crates/zwave-rs/tests/simulator/firmware.rs
use std::collections::{BTreeMap, VecDeque};
use zwave_rs::frame::{FrameReceiver, Received, SerialMessage, TransmissionState};
use zwave_rs::types::{ACK, MessageClass, MessageType, NODE_BITMASK_SIZE};

/// A device on the simulated mesh.
#[derive(Debug, Clone)]
pub struct SimNode {
    pub listening: bool,
    pub frequently_listening: bool,
    /// Whether a SendData to this node currently reaches it.
    pub reachable: bool,
    /// Reported by IsFailedNodeId.
    pub failed: bool,
    pub device_class: [u8; 3],
    pub command_classes: Vec<u8>,
    /// Scripted callback statuses, used before falling back to `reachable`.
    pub statuses: VecDeque<TransmissionState>,
    /// Command (class first) the node sends back after a successful SendData of that class.
    pub reports: BTreeMap<u8, Vec<u8>>,
}

impl SimNode {
    pub fn mains(command_classes: &[u8]) -> Self {
        Self {
            listening: true,
            frequently_listening: false,
            reachable: true,
            failed: false,
            device_class: [0x04, 0x10, 0x01],
            command_classes: command_classes.to_vec(),
            statuses: VecDeque::new(),
            reports: BTreeMap::new(),
        }
    }

    /// A battery device. It starts asleep.
    pub fn battery(command_classes: &[u8]) -> Self {
        Self {
            listening: false,
            reachable: false,
            device_class: [0x04, 0x20, 0x01],
            ..Self::mains(command_classes)
        }
    }

    pub fn with_report(mut self, command_class: u8, report: &[u8]) -> Self {
        self.reports.insert(command_class, report.to_vec());
        self
    }
}

/// Emulates the controller stick on the other end of the serial line.
pub struct SimulatedFirmware {
    receiver: FrameReceiver,
    output: VecDeque<u8>,
    pub nodes: BTreeMap<u8, SimNode>,
    pub home_id: u32,
    pub own_node_id: u8,
    pub library_version: &'static str,
    /// Swallow every host frame without ACK or answer.
    pub mute: bool,
    /// Answer every SendData with a stack rejection.
    pub reject_send_data: bool,
    /// Send every SendData callback twice.
    pub duplicate_callbacks: bool,
    /// Every frame the host wrote, in order.
    pub received: Vec<SerialMessage>,
    pub host_acks: usize,
    pub host_naks: usize,
}

impl SimulatedFirmware {
    pub fn new() -> Self {
        Self {
            receiver: FrameReceiver::new(),
            output: VecDeque::new(),
            nodes: BTreeMap::new(),
            home_id: 0xC0FF_EE01,
            own_node_id: 1,
            library_version: "Z-Wave 4.05",
            mute: false,
            reject_send_data: false,
            duplicate_callbacks: false,
            received: Vec::new(),
            host_acks: 0,
            host_naks: 0,
        }
    }

    pub fn with_node(mut self, id: u8, node: SimNode) -> Self {
        self.nodes.insert(id, node);
        self
    }

    pub fn node_mut(&mut self, id: u8) -> &mut SimNode {
        self.nodes.get_mut(&id).expect("simulated node")
    }

    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }

    pub fn drain_output(&mut self, buffer: &mut [u8]) -> usize {
        let count = buffer.len().min(self.output.len());
        for (slot, byte) in buffer.iter_mut().zip(self.output.drain(..count)) {
            *slot = byte;
        }
        count
    }

    /// Frames the host wrote of the given class.
    pub fn sent(&self, class: MessageClass) -> Vec<&SerialMessage> {
        self.received
            .iter()
            .filter(|m| m.message_class == class)
            .collect()
    }

    /// Command bytes (class first) of every SendData addressed to `node`.
    pub fn commands_to(&self, node: u8) -> Vec<Vec<u8>> {
        self.sent(MessageClass::SendData)
            .into_iter()
            .filter(|m| m.payload[0] == node)
            .map(|m| m.payload[2..2 + m.payload[1] as usize].to_vec())
            .collect()
    }

    pub fn receive(&mut self, bytes: &[u8]) {
        for item in self.receiver.feed(bytes, 0) {
            match item {
                Received::Ack => self.host_acks += 1,
                Received::Nak => self.host_naks += 1,
                Received::Frame(message) => {
                    self.received.push(message.clone());
                    if !self.mute {
                        self.output.push_back(ACK);
                        self.respond(&message);
                    }
                }
                _ => {}
            }
        }
    }

    /// The node wakes up and announces it.
    pub fn wake_up(&mut self, node: u8) {
        self.node_mut(node).reachable = true;
        self.application_command(node, &[0x84, 0x07]);
    }

    /// An unsolicited report from a node.
    pub fn application_command(&mut self, node: u8, command: &[u8]) {
        let mut payload = vec![0x00, node, command.len() as u8];
        payload.extend_from_slice(command);
        self.push(MessageType::Request, MessageClass::ApplicationCommandHandler, payload);
    }

    fn push(&mut self, message_type: MessageType, class: MessageClass, payload: Vec<u8>) {
        let frame = SerialMessage::new(message_type, class, payload)
            .to_frame()
            .expect("encodable frame");
        self.output.extend(frame);
    }

    fn respond(&mut self, msg: &SerialMessage) {
        match msg.message_class {
            MessageClass::GetVersion => {
                let mut payload = self.library_version.as_bytes().to_vec();
                payload.extend_from_slice(&[0x00, 0x01]);
                self.push(MessageType::Response, MessageClass::GetVersion, payload);
            }
            MessageClass::MemoryGetId => {
                let mut payload = self.home_id.to_be_bytes().to_vec();
                payload.push(self.own_node_id);
                self.push(MessageType::Response, MessageClass::MemoryGetId, payload);
            }
            MessageClass::SerialApiGetInitData => {
                let mut bitmask = [0u8; NODE_BITMASK_SIZE];
                for id in self.nodes.keys().copied().chain([self.own_node_id]) {
                    let bit = id as usize - 1;
                    bitmask[bit / 8] |= 1 << (bit % 8);
                }
                let mut payload = vec![0x05, 0x08, NODE_BITMASK_SIZE as u8];
                payload.extend_from_slice(&bitmask);
                payload.extend_from_slice(&[0x05, 0x00]);
                self.push(MessageType::Response, MessageClass::SerialApiGetInitData, payload);
            }
            MessageClass::IdentifyNode => {
                let payload = match self.nodes.get(&msg.payload[0]) {
                    Some(node) => vec![
                        if node.listening { 0xD3 } else { 0x53 },
                        if node.frequently_listening { 0x5C } else { 0x1C },
                        0x00,
                        node.device_class[0],
                        node.device_class[1],
                        node.device_class[2],
                    ],
                    None => vec![0x00; 6],
                };
                self.push(MessageType::Response, MessageClass::IdentifyNode, payload);
            }
            MessageClass::IsFailedNodeId => {
                let failed = self.nodes.get(&msg.payload[0]).is_some_and(|n| n.failed);
                self.push(MessageType::Response, MessageClass::IsFailedNodeId, vec![failed as u8]);
            }
            MessageClass::RequestNodeInfo => {
                let id = msg.payload[0];
                self.push(MessageType::Response, MessageClass::RequestNodeInfo, vec![0x01]);
                let payload = match self.nodes.get(&id).filter(|n| n.reachable) {
                    Some(node) => {
                        let mut info = node.device_class.to_vec();
                        info.extend_from_slice(&node.command_classes);
                        let mut payload = vec![0x84, id, info.len() as u8];
                        payload.extend(info);
                        payload
                    }
                    None => vec![0x81, 0x00, 0x00],
                };
                self.push(MessageType::Request, MessageClass::ApplicationUpdate, payload);
            }
            MessageClass::SendData => self.send_data(msg),
            _ => {}
        }
    }

    fn send_data(&mut self, msg: &SerialMessage) {
        if self.reject_send_data {
            self.push(MessageType::Response, MessageClass::SendData, vec![0x00]);
            return;
        }
        self.push(MessageType::Response, MessageClass::SendData, vec![0x01]);

        let id = msg.payload[0];
        let length = msg.payload[1] as usize;
        let class = msg.payload[2];
        debug_assert!(length >= 1);
        let callback = *msg.payload.last().expect("callback id");
        let status = match self.nodes.get_mut(&id) {
            Some(node) => node.statuses.pop_front().unwrap_or(if node.reachable {
                TransmissionState::CompleteOk
            } else {
                TransmissionState::CompleteNoAck
            }),
            None => TransmissionState::CompleteNoAck,
        };
        let copies = if self.duplicate_callbacks { 2 } else { 1 };
        for _ in 0..copies {
            self.push(MessageType::Request, MessageClass::SendData, vec![callback, status as u8]);
        }

        if status.is_ok() {
            let report = self
                .nodes
                .get(&id)
                .and_then(|n| n.reports.get(&class))
                .cloned();
            if let Some(report) = report {
                self.application_command(id, &report);
            }
        }
    }
}
