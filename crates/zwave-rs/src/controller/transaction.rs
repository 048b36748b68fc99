// crates/zwave-rs/src/controller/transaction.rs
use crate::frame::SerialMessage;
use crate::node::CommandClassId;
use crate::types::{MessagePriority, NodeId};

/// Handle returned by `enqueue`, stable across resends and wake-up deferral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u32);

/// Where an in-flight transaction stands on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    /// Waiting in the outgoing queue or a wake-up entry.
    Queued,
    /// Written, waiting for the link ACK.
    AwaitingAck,
    /// ACKed, waiting for the synchronous response.
    AwaitingResponse,
    /// Accepted by the controller, waiting for the asynchronous completion.
    AwaitingCallback,
    /// Delivered, waiting for the node's report.
    AwaitingReport,
}

/// A serial message plus everything needed to deliver it and correlate the answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub(crate) id: TransactionId,
    pub(crate) message: SerialMessage,
    pub(crate) node: Option<NodeId>,
    pub(crate) priority: MessagePriority,
    pub(crate) expected_report: Option<CommandClassId>,
    pub(crate) callback_id: Option<u8>,
    pub(crate) attempts: u32,
    pub(crate) resends: u32,
    pub(crate) phase: TransactionPhase,
    pub(crate) deadline_us: u64,
    pub(crate) sequence: u64,
}

impl Transaction {
    /// Wraps a message. The target node is taken from the message when it addresses one.
    pub fn new(message: SerialMessage, priority: MessagePriority) -> Self {
        let node = message.target_node();
        Self {
            id: TransactionId(0),
            message,
            node,
            priority,
            expected_report: None,
            callback_id: None,
            attempts: 0,
            resends: 0,
            phase: TransactionPhase::Queued,
            deadline_us: 0,
            sequence: 0,
        }
    }

    /// The transaction only completes once the node reports this class back.
    pub fn expecting_report(mut self, command_class: CommandClassId) -> Self {
        self.expected_report = Some(command_class);
        self
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn message(&self) -> &SerialMessage {
        &self.message
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn priority(&self) -> MessagePriority {
        self.priority
    }

    pub fn expected_report(&self) -> Option<CommandClassId> {
        self.expected_report
    }

    /// Callback id of the most recent write.
    pub fn callback_id(&self) -> Option<u8> {
        self.callback_id
    }

    /// Number of times the frame has been written to the link.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of policy-driven resends so far.
    pub fn resends(&self) -> u32 {
        self.resends
    }

    pub fn phase(&self) -> TransactionPhase {
        self.phase
    }

    pub fn deadline_us(&self) -> u64 {
        self.deadline_us
    }
}
