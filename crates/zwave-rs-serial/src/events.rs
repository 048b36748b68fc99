// crates/zwave-rs-serial/src/events.rs
use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{trace, warn};
use zwave_rs::{ControllerEvent, EventHandler};

/// Forwards controller events to another thread.
///
/// Never blocks the serial worker: when a bounded channel is full the event
/// is dropped.
pub struct ChannelEventHandler {
    sender: Sender<ControllerEvent>,
}

impl ChannelEventHandler {
    pub fn new(sender: Sender<ControllerEvent>) -> Self {
        Self { sender }
    }

    /// A handler plus the receiving end of an unbounded channel.
    pub fn unbounded() -> (Self, Receiver<ControllerEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::new(sender), receiver)
    }
}

impl EventHandler for ChannelEventHandler {
    fn on_event(&mut self, event: &ControllerEvent) {
        match self.sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => warn!("Event channel full, dropping {:?}", dropped),
            Err(TrySendError::Disconnected(_)) => trace!("No event listener"),
        }
    }
}
