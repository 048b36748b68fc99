// crates/zwave-rs/src/controller/retry.rs
//! What happens to a transaction whose delivery failed.

use super::events::ControllerEvent;
use super::state::NetworkState;
use super::transaction::Transaction;
use super::wakeup::WakeUpQueue;
use crate::frame::TransmissionState;
use crate::hal::ZWaveError;
use crate::node::NodeStage;
use crate::types::MessagePriority;
use log::{debug, error, info, warn};

#[derive(Debug)]
pub(crate) enum RetryDecision {
    /// Put the transaction back on the outgoing queue.
    Resend(Transaction),
    /// Parked in the node's wake-up entry.
    Deferred,
    /// Given up. The transaction is reported failed with the error.
    Dropped(Transaction, ZWaveError),
}

/// Decides the fate of a transaction that failed with `status`.
///
/// Controller requests are resent up to `max_resends` times regardless of
/// the node they mention.
/// DEAD and FAILED nodes get nothing more. Sleeping devices get the
/// transaction parked until they wake up, unless it is Low priority.
/// Listening devices get a resend, at most `max_resends` times; after
/// that the node is declared DEAD.
pub(crate) fn apply_retry_policy(
    state: &mut NetworkState,
    wake_up: &mut WakeUpQueue,
    mut tx: Transaction,
    status: TransmissionState,
    max_resends: u32,
) -> RetryDecision {
    // Requests the controller answers itself say nothing about the node.
    let node_id = match tx.node {
        Some(node_id) if tx.message.reaches_node() => node_id,
        _ => {
            if tx.resends < max_resends {
                tx.resends += 1;
                warn!("Controller request {:?} failed ({}), resending", tx.message.message_class, status);
                return RetryDecision::Resend(tx);
            }
            return RetryDecision::Dropped(tx, ZWaveError::ControllerTimeout);
        }
    };

    let Some(node) = state.node_mut(node_id) else {
        warn!("NODE {}: not found, dropping transaction {:?}", node_id, tx.id);
        return RetryDecision::Dropped(tx, ZWaveError::TransactionTimeout(node_id));
    };

    if node.is_failed() {
        return RetryDecision::Dropped(tx, ZWaveError::NodeFailed(node_id));
    }
    if node.is_dead() {
        debug!("NODE {}: is DEAD, not retrying", node_id);
        return RetryDecision::Dropped(tx, ZWaveError::NodeDead(node_id));
    }

    if node.is_sleeping_device() {
        if tx.priority == MessagePriority::Low {
            debug!("NODE {}: asleep, dropping low priority transaction", node_id);
            return RetryDecision::Dropped(tx, ZWaveError::NodeAsleep(node_id));
        }
        info!("NODE {}: is asleep, queueing for wake-up ({})", node_id, status);
        node.set_asleep(true);
        let id = tx.id;
        wake_up.defer(node_id, tx);
        state
            .events
            .push(ControllerEvent::TransactionDeferred { id, node: node_id });
        return RetryDecision::Deferred;
    }

    if tx.resends >= max_resends {
        error!(
            "NODE {}: maximum resend count ({}) reached, marking DEAD",
            node_id, max_resends
        );
        let from = node.stage();
        if node.set_dead() {
            state.push_stage_change(node_id, from, NodeStage::Dead);
        }
        return RetryDecision::Dropped(tx, ZWaveError::RetriesExhausted(node_id));
    }

    node.increment_resend_count();
    tx.resends += 1;
    error!(
        "NODE {}: Got an error while sending data ({}). Resending message.",
        node_id, status
    );
    RetryDecision::Resend(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::transaction::TransactionId;
    use crate::frame::SerialMessage;
    use crate::types::NodeId;

    fn setup(listening: bool) -> (NetworkState, WakeUpQueue) {
        let mut state = NetworkState::default();
        state.discover(NodeId(10));
        state
            .node_mut(NodeId(10))
            .unwrap()
            .set_listening_flags(listening, false);
        state.events.clear();
        (state, WakeUpQueue::new())
    }

    fn tx(priority: MessagePriority) -> Transaction {
        let mut t = Transaction::new(
            SerialMessage::send_data(NodeId(10), &[0x80, 0x02], 0x25, 1),
            priority,
        );
        t.id = TransactionId(42);
        t
    }

    #[test]
    fn test_listening_node_is_resent_then_dead() {
        let (mut state, mut wake_up) = setup(true);
        let mut current = tx(MessagePriority::Get);
        for expected in 1..=3 {
            match apply_retry_policy(&mut state, &mut wake_up, current, TransmissionState::CompleteNoAck, 3) {
                RetryDecision::Resend(t) => {
                    assert_eq!(t.resends, expected);
                    current = t;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(state.node(NodeId(10)).unwrap().resend_count(), 3);

        match apply_retry_policy(&mut state, &mut wake_up, current, TransmissionState::CompleteFail, 3) {
            RetryDecision::Dropped(_, ZWaveError::RetriesExhausted(NodeId(10))) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert!(state.node(NodeId(10)).unwrap().is_dead());

        // Once DEAD, failures are simply dropped.
        match apply_retry_policy(&mut state, &mut wake_up, tx(MessagePriority::High), TransmissionState::CompleteNoRoute, 3) {
            RetryDecision::Dropped(_, ZWaveError::NodeDead(NodeId(10))) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            state.events,
            alloc::vec![ControllerEvent::NodeStageChanged {
                node: NodeId(10),
                from: NodeStage::EmptyNode,
                to: NodeStage::Dead
            }]
        );
    }

    #[test]
    fn test_sleeping_node_defers() {
        let (mut state, mut wake_up) = setup(false);
        let decision = apply_retry_policy(
            &mut state,
            &mut wake_up,
            tx(MessagePriority::Set),
            TransmissionState::CompleteNoAck,
            3,
        );
        assert!(matches!(decision, RetryDecision::Deferred));
        assert_eq!(wake_up.pending(NodeId(10)), 1);
        let node = state.node(NodeId(10)).unwrap();
        assert!(node.is_asleep());
        assert_eq!(node.resend_count(), 0);
    }

    #[test]
    fn test_sleeping_node_drops_low_priority() {
        let (mut state, mut wake_up) = setup(false);
        let decision = apply_retry_policy(
            &mut state,
            &mut wake_up,
            tx(MessagePriority::Low),
            TransmissionState::CompleteNoAck,
            3,
        );
        assert!(matches!(
            decision,
            RetryDecision::Dropped(_, ZWaveError::NodeAsleep(NodeId(10)))
        ));
        assert!(!wake_up.contains(NodeId(10)));
    }

    #[test]
    fn test_controller_request_ignores_node_state() {
        let (mut state, mut wake_up) = setup(false);
        let mut current = Transaction::new(SerialMessage::is_failed_node(NodeId(10)), MessagePriority::High);
        match apply_retry_policy(&mut state, &mut wake_up, current, TransmissionState::CompleteNoAck, 1) {
            RetryDecision::Resend(t) => current = t,
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            apply_retry_policy(&mut state, &mut wake_up, current, TransmissionState::CompleteNoAck, 1),
            RetryDecision::Dropped(_, ZWaveError::ControllerTimeout)
        ));
        assert!(!wake_up.contains(NodeId(10)));
        let node = state.node(NodeId(10)).unwrap();
        assert!(!node.is_asleep());
        assert!(!node.is_dead());
        assert_eq!(node.resend_count(), 0);
    }

    #[test]
    fn test_unknown_node_times_out() {
        let mut state = NetworkState::default();
        let mut wake_up = WakeUpQueue::new();
        let decision = apply_retry_policy(
            &mut state,
            &mut wake_up,
            tx(MessagePriority::Get),
            TransmissionState::CompleteNoAck,
            3,
        );
        assert!(matches!(
            decision,
            RetryDecision::Dropped(_, ZWaveError::TransactionTimeout(NodeId(10)))
        ));
    }
}
