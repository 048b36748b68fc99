// crates/zwave-rs/src/controller/events.rs
use super::transaction::TransactionId;
use crate::hal::ZWaveError;
use crate::node::{CommandClassId, NodeStage};
use crate::types::NodeId;
use alloc::vec::Vec;
use log::{error, info, trace};

/// Everything the controller reports upward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A node became known, through enumeration or inclusion.
    NodeAdded { node: NodeId },
    NodeStageChanged {
        node: NodeId,
        from: NodeStage,
        to: NodeStage,
    },
    /// A command class value reported by a node.
    ValueUpdate {
        node: NodeId,
        command_class: CommandClassId,
        command: u8,
        value: Vec<u8>,
    },
    TransactionComplete {
        id: TransactionId,
        node: Option<NodeId>,
    },
    TransactionFailed {
        id: TransactionId,
        node: Option<NodeId>,
        error: ZWaveError,
    },
    /// A transaction was parked until its sleeping node wakes up.
    TransactionDeferred { id: TransactionId, node: NodeId },
    /// A sleeping node announced it is awake; `flushed` deferred transactions were requeued.
    NodeAwake { node: NodeId, flushed: usize },
}

/// A trait that defines how controller events are delivered.
pub trait EventHandler {
    fn on_event(&mut self, event: &ControllerEvent);
}

/// An event handler that does nothing.
pub struct NoOpEventHandler;
impl EventHandler for NoOpEventHandler {
    fn on_event(&mut self, _event: &ControllerEvent) {}
}

/// An event handler that logs all events using the `log` facade.
pub struct LoggingEventHandler;
impl EventHandler for LoggingEventHandler {
    fn on_event(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::TransactionFailed { id, node, error } => {
                error!("[EVENT] Transaction {:?} for {:?} failed: {}", id, node, error);
            }
            ControllerEvent::ValueUpdate { .. } => trace!("[EVENT] {:?}", event),
            _ => info!("[EVENT] {:?}", event),
        }
    }
}

/// Collects events, mostly useful in tests.
impl EventHandler for Vec<ControllerEvent> {
    fn on_event(&mut self, event: &ControllerEvent) {
        self.push(event.clone());
    }
}
