// crates/zwave-rs/src/controller/queue.rs
use super::transaction::{Transaction, TransactionPhase};
use crate::types::NodeId;
use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// Heap entry: higher urgency first, then lower sequence number (FIFO).
#[derive(Debug)]
struct Queued(Transaction);

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .priority
            .urgency()
            .cmp(&other.0.priority.urgency())
            .then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

/// Outgoing transactions, ordered priority-then-FIFO.
#[derive(Debug)]
pub struct TransactionQueue {
    heap: BinaryHeap<Queued>,
    next_sequence: u64,
    capacity: usize,
}

impl TransactionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Number of queued transactions addressed to `node`.
    pub fn len_for_node(&self, node: NodeId) -> usize {
        self.heap.iter().filter(|q| q.0.node == Some(node)).count()
    }

    /// Appends a transaction behind everything of the same priority.
    /// Hands the transaction back when the queue is full.
    pub fn push(&mut self, mut transaction: Transaction) -> Result<(), Transaction> {
        if self.is_full() {
            return Err(transaction);
        }
        transaction.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.requeue(transaction);
        Ok(())
    }

    /// Puts a transaction back at its original position within its priority class.
    /// Not subject to the capacity limit: the transaction was already admitted once.
    pub fn requeue(&mut self, mut transaction: Transaction) {
        transaction.phase = TransactionPhase::Queued;
        self.heap.push(Queued(transaction));
    }

    pub fn pop(&mut self) -> Option<Transaction> {
        self.heap.pop().map(|q| q.0)
    }

    /// Removes and returns every transaction addressed to `node`, in send order.
    pub fn remove_node(&mut self, node: NodeId) -> Vec<Transaction> {
        let mut removed = Vec::new();
        let mut kept = BinaryHeap::with_capacity(self.heap.len());
        while let Some(entry) = self.heap.pop() {
            if entry.0.node == Some(node) {
                removed.push(entry.0);
            } else {
                kept.push(entry);
            }
        }
        self.heap = kept;
        removed
    }
}
