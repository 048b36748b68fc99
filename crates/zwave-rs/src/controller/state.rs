// crates/zwave-rs/src/controller/state.rs
use super::events::ControllerEvent;
use crate::node::{NodeStage, ZWaveNode};
use crate::types::NodeId;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use log::info;

/// Facts about the controller stick itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerInfo {
    pub home_id: Option<u32>,
    pub own_node_id: Option<NodeId>,
    pub library_version: Option<String>,
    pub library_type: Option<u8>,
    pub serial_api_version: Option<u8>,
}

/// Link-level counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStatistics {
    pub frames_sent: u32,
    pub frames_received: u32,
    pub acks: u32,
    pub naks: u32,
    pub cans: u32,
    pub checksum_errors: u32,
    pub timeouts: u32,
}

/// The state message handlers operate on.
///
/// Handlers never touch the queues directly: side effects that need them
/// (events, wake-ups) are recorded here and applied by the dispatcher.
#[derive(Debug, Default)]
pub struct NetworkState {
    pub(crate) nodes: BTreeMap<NodeId, ZWaveNode>,
    pub(crate) info: ControllerInfo,
    pub(crate) events: Vec<ControllerEvent>,
    pub(crate) woken: Vec<NodeId>,
}

impl NetworkState {
    pub(crate) fn node(&self, id: NodeId) -> Option<&ZWaveNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut ZWaveNode> {
        self.nodes.get_mut(&id)
    }

    /// Creates the node if it is not known yet. Returns true when it was new.
    pub(crate) fn discover(&mut self, id: NodeId) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        info!("NODE {}: discovered", id);
        self.nodes.insert(id, ZWaveNode::new(id));
        self.events.push(ControllerEvent::NodeAdded { node: id });
        true
    }

    pub(crate) fn push_stage_change(&mut self, node: NodeId, from: NodeStage, to: NodeStage) {
        if from != to {
            self.events
                .push(ControllerEvent::NodeStageChanged { node, from, to });
        }
    }
}
