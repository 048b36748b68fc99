// crates/zwave-rs/src/controller/main.rs
use super::config::ControllerConfig;
use super::events::{ControllerEvent, EventHandler};
use super::handlers::{self, HandlerOutcome};
use super::queue::TransactionQueue;
use super::retry::{self, RetryDecision};
use super::state::{ControllerInfo, LinkStatistics, NetworkState};
use super::transaction::{Transaction, TransactionId, TransactionPhase};
use super::wakeup::WakeUpQueue;
use crate::frame::{FrameReceiver, Received, SerialMessage, TransmissionState};
use crate::hal::ZWaveError;
use crate::node::{CommandClassId, CommandClassInfo, NodeStage, ZWaveNode};
use crate::types::{ACK, MessageClass, MessagePriority, MessageType, NAK, NodeId};
use alloc::vec::Vec;
use core::mem;
use log::{debug, error, info, trace, warn};

/// What the caller must do after handing bytes or time to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerAction {
    /// Write these bytes to the serial port.
    Write(Vec<u8>),
    /// Nothing to write; call `tick()` again within this many microseconds.
    SetTimer(u64),
    /// Nothing pending.
    NoAction,
}

/// The transaction dispatcher.
///
/// Owns the node table, the outgoing queue and the wake-up entries, and is
/// driven purely by inbound bytes and the current time. Exactly one
/// transaction is on the wire at any moment.
pub struct ZWaveController<H: EventHandler> {
    config: ControllerConfig,
    state: NetworkState,
    queue: TransactionQueue,
    wake_up: WakeUpQueue,
    in_flight: Option<Transaction>,
    receiver: FrameReceiver,
    handler: H,
    stats: LinkStatistics,
    next_transaction_id: u32,
    next_callback_id: u8,
    outbox: Vec<u8>,
}

impl<H: EventHandler> ZWaveController<H> {
    pub fn new(config: ControllerConfig, handler: H) -> Self {
        info!(
            "Creating Z-Wave controller (ack timeout {} us, response timeout {} us, max resends {})",
            config.ack_timeout_us, config.response_timeout_us, config.max_resends
        );
        Self {
            queue: TransactionQueue::new(config.queue_capacity),
            config,
            state: NetworkState::default(),
            wake_up: WakeUpQueue::new(),
            in_flight: None,
            receiver: FrameReceiver::new(),
            handler,
            stats: LinkStatistics::default(),
            next_transaction_id: 1,
            next_callback_id: 1,
            outbox: Vec::new(),
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn info(&self) -> &ControllerInfo {
        &self.state.info
    }

    pub fn statistics(&self) -> LinkStatistics {
        self.stats
    }

    pub fn node(&self, id: NodeId) -> Option<&ZWaveNode> {
        self.state.node(id)
    }

    /// Mutable access for the interview logic running on the controller's thread.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ZWaveNode> {
        self.state.node_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ZWaveNode> {
        self.state.nodes.values()
    }

    /// Registers a node discovered outside the Serial API enumeration.
    /// Returns true when it was not known yet.
    pub fn add_node(&mut self, id: NodeId) -> bool {
        let added = self.state.discover(id);
        self.flush_events();
        added
    }

    /// Registry lookup by node and class.
    pub fn command_class(&self, node: NodeId, class: CommandClassId) -> Option<&CommandClassInfo> {
        self.state.node(node)?.command_class(class)
    }

    pub fn in_flight(&self) -> Option<&Transaction> {
        self.in_flight.as_ref()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_len_for(&self, node: NodeId) -> usize {
        self.queue.len_for_node(node)
    }

    pub fn wake_up_pending(&self, node: NodeId) -> usize {
        self.wake_up.pending(node)
    }

    pub fn has_wake_up_entry(&self, node: NodeId) -> bool {
        self.wake_up.contains(node)
    }

    /// Deadline of the in-flight transaction, if any.
    pub fn next_deadline_us(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|tx| tx.deadline_us)
    }

    // --- Producers ---

    /// Accepts a transaction for delivery in priority-then-FIFO order.
    ///
    /// Fails synchronously for FAILED nodes and when the queue is full. A
    /// radio transaction for a node that is known to be asleep goes straight
    /// to its wake-up entry.
    pub fn enqueue(&mut self, mut transaction: Transaction) -> Result<TransactionId, ZWaveError> {
        let id = TransactionId(self.next_transaction_id);
        self.next_transaction_id = self.next_transaction_id.wrapping_add(1).max(1);
        transaction.id = id;

        if let Some(node_id) = transaction.node {
            if let Some(node) = self.state.node(node_id) {
                if node.is_failed() {
                    warn!("NODE {}: is FAILED, rejecting transaction", node_id);
                    return Err(ZWaveError::NodeFailed(node_id));
                }
                if transaction.message.reaches_node() && node.is_sleeping_device() && node.is_asleep() {
                    self.wake_up.defer(node_id, transaction);
                    self.state
                        .events
                        .push(ControllerEvent::TransactionDeferred { id, node: node_id });
                    self.flush_events();
                    return Ok(id);
                }
            }
        }

        if self.queue.push(transaction).is_err() {
            warn!("Outgoing queue full, rejecting transaction {:?}", id);
            return Err(ZWaveError::QueueFull);
        }
        debug!("Queued transaction {:?} ({} waiting)", id, self.queue.len());
        Ok(id)
    }

    /// Wraps a command class command in SendData and enqueues it.
    ///
    /// With `expects_report`, the transaction stays open until the node
    /// reports the same command class back.
    pub fn enqueue_command(
        &mut self,
        node: NodeId,
        command_class: CommandClassId,
        command: &[u8],
        priority: MessagePriority,
        expects_report: bool,
    ) -> Result<TransactionId, ZWaveError> {
        let mut data = Vec::with_capacity(command.len() + 1);
        data.push(command_class.0);
        data.extend_from_slice(command);
        let message = SerialMessage::send_data(node, &data, self.config.transmit_options, 0);
        let mut transaction = Transaction::new(message, priority);
        if expects_report {
            transaction = transaction.expecting_report(command_class);
        }
        self.enqueue(transaction)
    }

    /// Moves a node to the next interview stage once the current step is done.
    pub fn advance_node_stage(&mut self, node_id: NodeId) -> Result<NodeStage, ZWaveError> {
        let node = self
            .state
            .node_mut(node_id)
            .ok_or(ZWaveError::NodeNotFound(node_id))?;
        let from = node.stage();
        let to = match from {
            NodeStage::Init => NodeStage::EmptyNode,
            NodeStage::Dead | NodeStage::Failed => return Err(ZWaveError::InvalidStageTransition),
            stage => stage.next().ok_or(ZWaveError::InvalidStageTransition)?,
        };
        node.set_stage(to)?;
        self.state.push_stage_change(node_id, from, to);
        self.flush_events();
        Ok(to)
    }

    // --- Driving the link ---

    /// Feeds bytes read from the port.
    pub fn process_bytes(&mut self, bytes: &[u8], current_time_us: u64) -> ControllerAction {
        self.ingest(bytes, current_time_us);
        self.finish_cycle(current_time_us)
    }

    /// Handles time-based events: the transaction watchdog and stalled partial frames.
    pub fn tick(&mut self, current_time_us: u64) -> ControllerAction {
        self.check_timeouts(current_time_us);
        self.finish_cycle(current_time_us)
    }

    /// Processes any received bytes, then timeouts, then sends the next frame if the line is free.
    pub fn run_cycle(&mut self, received: Option<&[u8]>, current_time_us: u64) -> ControllerAction {
        if let Some(bytes) = received {
            self.ingest(bytes, current_time_us);
        }
        self.check_timeouts(current_time_us);
        self.finish_cycle(current_time_us)
    }

    fn ingest(&mut self, bytes: &[u8], now: u64) {
        for item in self.receiver.feed(bytes, now) {
            match item {
                Received::Ack => {
                    self.stats.acks += 1;
                    self.on_ack(now);
                }
                Received::Nak => {
                    self.stats.naks += 1;
                    warn!("Controller sent NAK");
                }
                Received::Can => {
                    self.stats.cans += 1;
                    warn!("Controller sent CAN");
                }
                Received::ChecksumError => {
                    self.stats.checksum_errors += 1;
                    self.outbox.push(NAK);
                }
                Received::Malformed => {
                    warn!("Discarding malformed frame");
                    self.outbox.push(ACK);
                }
                Received::Garbage(_) => {}
                Received::Frame(message) => {
                    self.stats.frames_received += 1;
                    self.outbox.push(ACK);
                    self.handle_message(message, now);
                }
            }
        }
    }

    fn on_ack(&mut self, now: u64) {
        let Some(tx) = self.in_flight.as_mut() else {
            trace!("ACK with nothing in flight");
            return;
        };
        if tx.phase != TransactionPhase::AwaitingAck {
            return;
        }
        let expects_response = handlers::lookup(tx.message.message_class)
            .is_some_and(|h| h.handle_response.is_some());
        if expects_response {
            tx.phase = TransactionPhase::AwaitingResponse;
            tx.deadline_us = now + self.config.response_timeout_us;
        } else {
            self.complete_step(now);
        }
    }

    fn handle_message(&mut self, message: SerialMessage, now: u64) {
        trace!("Received {}", message);
        let Some(handler) = handlers::lookup(message.message_class) else {
            debug!("No handler for {:?}, ignoring", message.message_class);
            return;
        };

        let outcome = match message.message_type {
            MessageType::Response => {
                let Some(handle) = handler.handle_response else {
                    warn!("Unexpected {:?} response, ignoring", message.message_class);
                    return;
                };
                match self.in_flight.as_ref() {
                    Some(tx)
                        if tx.message.message_class == message.message_class
                            && matches!(
                                tx.phase,
                                TransactionPhase::AwaitingAck | TransactionPhase::AwaitingResponse
                            ) =>
                    {
                        handle(&mut self.state, tx, &message)
                    }
                    _ => {
                        warn!("Response {:?} matches no outstanding request, ignoring", message.message_class);
                        HandlerOutcome::Discarded
                    }
                }
            }
            MessageType::Request => {
                let Some(handle) = handler.handle_request else {
                    warn!("Unexpected {:?} request, ignoring", message.message_class);
                    return;
                };
                handle(&mut self.state, self.in_flight.as_ref(), &message)
            }
        };

        self.apply_outcome(outcome, now);
    }

    fn apply_outcome(&mut self, outcome: HandlerOutcome, now: u64) {
        match outcome {
            HandlerOutcome::Unrelated | HandlerOutcome::Discarded => {}
            HandlerOutcome::AwaitCallback => {
                if let Some(tx) = self.in_flight.as_mut() {
                    tx.phase = TransactionPhase::AwaitingCallback;
                    tx.deadline_us = now + self.config.response_timeout_us;
                }
            }
            HandlerOutcome::Completed => self.complete_step(now),
            HandlerOutcome::Rejected(code) => {
                if let Some(tx) = self.in_flight.take() {
                    self.fail(tx, ZWaveError::StackRejected(code));
                }
            }
            HandlerOutcome::TransmissionFailed(status) => {
                if let Some(tx) = self.in_flight.take() {
                    self.retry(tx, status);
                }
            }
            HandlerOutcome::Failed(error) => {
                if let Some(tx) = self.in_flight.take() {
                    self.fail(tx, error);
                }
            }
        }
    }

    /// The current step of the in-flight transaction succeeded.
    fn complete_step(&mut self, now: u64) {
        let Some(tx) = self.in_flight.as_mut() else {
            return;
        };
        if tx.expected_report.is_some() && tx.phase != TransactionPhase::AwaitingReport {
            tx.phase = TransactionPhase::AwaitingReport;
            tx.deadline_us = now + self.config.response_timeout_us;
            debug!("Transaction {:?} delivered, waiting for report", tx.id);
            return;
        }
        if let Some(tx) = self.in_flight.take() {
            debug!("Transaction {:?} complete after {} attempt(s)", tx.id, tx.attempts);
            self.state.events.push(ControllerEvent::TransactionComplete {
                id: tx.id,
                node: tx.node,
            });
        }
    }

    fn retry(&mut self, tx: Transaction, status: TransmissionState) {
        match retry::apply_retry_policy(
            &mut self.state,
            &mut self.wake_up,
            tx,
            status,
            self.config.max_resends,
        ) {
            RetryDecision::Resend(tx) => self.queue.requeue(tx),
            RetryDecision::Deferred => {}
            RetryDecision::Dropped(tx, error) => self.fail(tx, error),
        }
    }

    fn fail(&mut self, tx: Transaction, error: ZWaveError) {
        match error {
            ZWaveError::StackRejected(_) | ZWaveError::RetriesExhausted(_) | ZWaveError::NodeFailed(_) => {
                error!("Transaction {:?} failed: {}", tx.id, error)
            }
            _ => debug!("Transaction {:?} dropped: {}", tx.id, error),
        }
        self.state.events.push(ControllerEvent::TransactionFailed {
            id: tx.id,
            node: tx.node,
            error,
        });
    }

    fn check_timeouts(&mut self, now: u64) {
        if self.receiver.is_partial()
            && now.saturating_sub(self.receiver.started_at_us()) > self.config.ack_timeout_us
        {
            self.receiver.reset();
        }

        let expired = self
            .in_flight
            .as_ref()
            .is_some_and(|tx| now >= tx.deadline_us);
        if !expired {
            return;
        }
        if let Some(tx) = self.in_flight.take() {
            self.stats.timeouts += 1;
            warn!(
                "NODE {:?}: transaction {:?} timed out waiting in {:?}",
                tx.node.map(|n| n.0),
                tx.id,
                tx.phase
            );
            self.retry(tx, TransmissionState::CompleteNoAck);
        }
    }

    /// Delivers events, then writes the next frame if the line is free.
    fn finish_cycle(&mut self, now: u64) -> ControllerAction {
        self.flush_events();
        self.send_next(now);
        self.flush_events();

        if !self.outbox.is_empty() {
            return ControllerAction::Write(mem::take(&mut self.outbox));
        }
        match self.in_flight.as_ref() {
            Some(tx) => ControllerAction::SetTimer(tx.deadline_us.saturating_sub(now)),
            None => ControllerAction::NoAction,
        }
    }

    fn send_next(&mut self, now: u64) {
        if self.in_flight.is_some() {
            return;
        }
        while let Some(mut tx) = self.queue.pop() {
            if let Some(node_id) = tx.node {
                if self.state.node(node_id).is_some_and(ZWaveNode::is_failed) {
                    self.fail(tx, ZWaveError::NodeFailed(node_id));
                    continue;
                }
            }
            if tx.message.message_class == MessageClass::SendData {
                let callback_id = self.allocate_callback_id();
                tx.message.set_callback_id(callback_id);
                tx.callback_id = Some(callback_id);
            }
            match tx.message.to_frame() {
                Ok(frame) => {
                    debug!(
                        "Sending {} (transaction {:?}, attempt {}, callback {:?})",
                        tx.message,
                        tx.id,
                        tx.attempts + 1,
                        tx.callback_id
                    );
                    self.outbox.extend_from_slice(&frame);
                    self.stats.frames_sent += 1;
                    tx.attempts += 1;
                    tx.phase = TransactionPhase::AwaitingAck;
                    tx.deadline_us = now + self.config.ack_timeout_us;
                    self.in_flight = Some(tx);
                    return;
                }
                Err(e) => self.fail(tx, e),
            }
        }
    }

    /// Callback ids cycle through 1..=255; 0 means "no callback" to the firmware.
    fn allocate_callback_id(&mut self) -> u8 {
        let id = self.next_callback_id;
        self.next_callback_id = if id == u8::MAX { 1 } else { id + 1 };
        id
    }

    fn flush_wake_up(&mut self, node: NodeId) {
        let Some(entry) = self.wake_up.take(node) else {
            self.state
                .events
                .push(ControllerEvent::NodeAwake { node, flushed: 0 });
            return;
        };
        let flushed = entry.len();
        info!("NODE {}: awake, requeueing {} transaction(s)", node, flushed);
        for tx in entry.into_transactions() {
            if let Err(tx) = self.queue.push(tx) {
                self.fail(tx, ZWaveError::QueueFull);
            }
        }
        self.state
            .events
            .push(ControllerEvent::NodeAwake { node, flushed });
    }

    /// Fails everything still waiting for a node that became FAILED.
    fn purge_node(&mut self, node: NodeId) {
        let mut pending = self.queue.remove_node(node);
        if let Some(entry) = self.wake_up.take(node) {
            pending.extend(entry.into_transactions());
        }
        if !pending.is_empty() {
            warn!("NODE {}: dropping {} pending transaction(s)", node, pending.len());
        }
        for tx in pending {
            self.fail(tx, ZWaveError::NodeFailed(node));
        }
    }

    /// Applies recorded side effects and hands events to the handler, until none are left.
    fn flush_events(&mut self) {
        loop {
            for node in mem::take(&mut self.state.woken) {
                self.flush_wake_up(node);
            }
            let events = mem::take(&mut self.state.events);
            if events.is_empty() {
                break;
            }
            for event in &events {
                if let ControllerEvent::NodeStageChanged {
                    node,
                    to: NodeStage::Failed,
                    ..
                } = event
                {
                    self.purge_node(*node);
                }
                self.handler.on_event(event);
            }
        }
    }
}
