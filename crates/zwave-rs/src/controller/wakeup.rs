// crates/zwave-rs/src/controller/wakeup.rs
//! Deferred delivery for sleeping battery devices.

use super::transaction::{Transaction, TransactionPhase};
use crate::types::NodeId;
use alloc::collections::{BTreeMap, VecDeque};
use log::debug;

/// Transactions waiting for one node to wake up, in submission order.
#[derive(Debug)]
pub struct WakeUpEntry {
    node: NodeId,
    transactions: VecDeque<Transaction>,
}

impl WakeUpEntry {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Drains the entry in original submission order.
    pub fn into_transactions(self) -> impl Iterator<Item = Transaction> {
        self.transactions.into_iter()
    }
}

/// All wake-up entries. An entry exists only while its node is asleep with work pending.
#[derive(Debug, Default)]
pub struct WakeUpQueue {
    entries: BTreeMap<NodeId, WakeUpEntry>,
}

impl WakeUpQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a transaction for `node`. Returns the number now waiting.
    pub fn defer(&mut self, node: NodeId, mut transaction: Transaction) -> usize {
        transaction.phase = TransactionPhase::Queued;
        let entry = self.entries.entry(node).or_insert_with(|| WakeUpEntry {
            node,
            transactions: VecDeque::new(),
        });
        entry.transactions.push_back(transaction);
        debug!("NODE {}: {} transaction(s) waiting for wake-up", node, entry.len());
        entry.len()
    }

    /// Removes and returns the entry for `node`.
    pub fn take(&mut self, node: NodeId) -> Option<WakeUpEntry> {
        self.entries.remove(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    /// Number of transactions waiting for `node`.
    pub fn pending(&self, node: NodeId) -> usize {
        self.entries.get(&node).map_or(0, WakeUpEntry::len)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().copied()
    }
}
