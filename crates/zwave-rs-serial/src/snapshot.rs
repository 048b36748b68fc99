// crates/zwave-rs-serial/src/snapshot.rs
//! Read-only views of the network, published by the serial worker after
//! every cycle and serialized (e.g. to JSON) by whoever displays them.

use serde::Serialize;
use zwave_rs::{EventHandler, NodeId, ZWaveController, ZWaveNode};

/// One node as seen by the controller.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub node_id: u8,
    pub stage: String,
    pub listening: bool,
    pub frequently_listening: bool,
    pub asleep: bool,
    pub dead: bool,
    pub failed: bool,
    pub resend_count: u32,
    pub receive_count: u32,
    /// `(manufacturer id, product type, product id)` once known.
    pub manufacturer: Option<(u16, u16, u16)>,
    pub command_classes: Vec<u8>,
    /// Transactions parked until the node wakes up.
    pub wake_up_pending: usize,
}

/// Link-level counters.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkCounters {
    pub frames_sent: u32,
    pub frames_received: u32,
    pub acks: u32,
    pub naks: u32,
    pub cans: u32,
    pub checksum_errors: u32,
    pub timeouts: u32,
}

/// The whole network at the end of one worker cycle.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkSnapshot {
    pub home_id: Option<u32>,
    pub controller_node_id: Option<u8>,
    pub library_version: Option<String>,
    pub nodes: Vec<NodeSnapshot>,
    pub queue_len: usize,
    pub in_flight: bool,
    pub link: LinkCounters,
}

impl NetworkSnapshot {
    pub fn from_controller<H: EventHandler>(controller: &ZWaveController<H>) -> Self {
        let info = controller.info();
        let stats = controller.statistics();
        Self {
            home_id: info.home_id,
            controller_node_id: info.own_node_id.map(|n| n.0),
            library_version: info.library_version.clone(),
            nodes: controller
                .nodes()
                .map(|node| NodeSnapshot::from_node(node, controller.wake_up_pending(node.id())))
                .collect(),
            queue_len: controller.queue_len(),
            in_flight: controller.in_flight().is_some(),
            link: LinkCounters {
                frames_sent: stats.frames_sent,
                frames_received: stats.frames_received,
                acks: stats.acks,
                naks: stats.naks,
                cans: stats.cans,
                checksum_errors: stats.checksum_errors,
                timeouts: stats.timeouts,
            },
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.node_id == id.0)
    }

    pub fn is_failed(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.failed)
    }
}

impl NodeSnapshot {
    fn from_node(node: &ZWaveNode, wake_up_pending: usize) -> Self {
        Self {
            node_id: node.id().0,
            stage: node.stage().to_string(),
            listening: node.is_listening(),
            frequently_listening: node.is_frequently_listening(),
            asleep: node.is_asleep(),
            dead: node.is_dead(),
            failed: node.is_failed(),
            resend_count: node.resend_count(),
            receive_count: node.receive_count(),
            manufacturer: node
                .manufacturer()
                .map(|m| (m.manufacturer_id, m.product_type, m.product_id)),
            command_classes: node.registry().iter().map(|c| c.id.0).collect(),
            wake_up_pending,
        }
    }
}
