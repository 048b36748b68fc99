// crates/zwave-rs-serial/src/driver.rs
use crate::snapshot::NetworkSnapshot;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use zwave_rs::{
    CommandClassId, ControllerAction, ControllerConfig, EventHandler, MessagePriority, NodeId,
    NodeStage, SerialInterface, SerialMessage, Transaction, TransactionId, ZWaveController,
    ZWaveError,
};

const READ_BUFFER_SIZE: usize = 256;
/// Consecutive failed reads after which the port is considered gone.
const MAX_READ_ERRORS: u32 = 10;
const MAX_READ_BACKOFF: Duration = Duration::from_millis(100);

/// Work handed from producer threads to the serial worker.
enum Request {
    Enqueue {
        transaction: Transaction,
        reply: Sender<Result<TransactionId, ZWaveError>>,
    },
    AddNode(NodeId),
    AdvanceStage {
        node: NodeId,
        reply: Sender<Result<NodeStage, ZWaveError>>,
    },
}

/// Thread-safe producer handle. Never touches node state directly.
#[derive(Clone)]
pub struct ControllerHandle {
    requests: Sender<Request>,
    snapshot: Arc<RwLock<NetworkSnapshot>>,
    transmit_options: u8,
}

impl ControllerHandle {
    /// Submits a transaction and waits until the worker has queued it.
    ///
    /// Transactions for nodes the last snapshot shows as FAILED are
    /// rejected without a round trip to the worker.
    pub fn enqueue(&self, transaction: Transaction) -> Result<TransactionId, ZWaveError> {
        if let Some(node) = transaction.node() {
            if self.snapshot().is_failed(node) {
                return Err(ZWaveError::NodeFailed(node));
            }
        }
        let (reply, response) = crossbeam_channel::bounded(1);
        self.requests
            .send(Request::Enqueue { transaction, reply })
            .map_err(|_| ZWaveError::Disconnected)?;
        response.recv().map_err(|_| ZWaveError::Disconnected)?
    }

    /// Wraps a command class command in SendData and submits it.
    pub fn enqueue_command(
        &self,
        node: NodeId,
        command_class: CommandClassId,
        command: &[u8],
        priority: MessagePriority,
        expects_report: bool,
    ) -> Result<TransactionId, ZWaveError> {
        let mut data = Vec::with_capacity(command.len() + 1);
        data.push(command_class.0);
        data.extend_from_slice(command);
        let message = SerialMessage::send_data(node, &data, self.transmit_options, 0);
        let mut transaction = Transaction::new(message, priority);
        if expects_report {
            transaction = transaction.expecting_report(command_class);
        }
        self.enqueue(transaction)
    }

    pub fn add_node(&self, node: NodeId) -> Result<(), ZWaveError> {
        self.requests
            .send(Request::AddNode(node))
            .map_err(|_| ZWaveError::Disconnected)
    }

    pub fn advance_node_stage(&self, node: NodeId) -> Result<NodeStage, ZWaveError> {
        let (reply, response) = crossbeam_channel::bounded(1);
        self.requests
            .send(Request::AdvanceStage { node, reply })
            .map_err(|_| ZWaveError::Disconnected)?;
        response.recv().map_err(|_| ZWaveError::Disconnected)?
    }

    /// The state published at the end of the worker's last cycle.
    pub fn snapshot(&self) -> NetworkSnapshot {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Owns the serial worker thread.
pub struct SerialDriver {
    handle: ControllerHandle,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SerialDriver {
    /// Starts the worker thread. The interface and the controller live on it
    /// exclusively from now on.
    pub fn spawn<I, H>(interface: I, config: ControllerConfig, handler: H) -> Result<Self, ZWaveError>
    where
        I: SerialInterface + Send + 'static,
        H: EventHandler + Send + 'static,
    {
        let (requests, inbox) = crossbeam_channel::unbounded();
        let snapshot = Arc::new(RwLock::new(NetworkSnapshot::default()));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = ControllerHandle {
            requests,
            snapshot: Arc::clone(&snapshot),
            transmit_options: config.transmit_options,
        };

        let controller = ZWaveController::new(config, handler);
        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name("zwave-serial".into())
            .spawn(move || run_worker(interface, controller, inbox, snapshot, worker_stop))
            .map_err(|e| {
                error!("Failed to spawn serial worker: {}", e);
                ZWaveError::IoError
            })?;

        Ok(Self {
            handle,
            stop,
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    /// Signals the worker to stop and waits for it.
    pub fn shutdown(&mut self) -> Result<(), ZWaveError> {
        self.stop.store(true, Ordering::Relaxed);
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| {
                error!("Serial worker panicked");
                ZWaveError::Disconnected
            }),
            None => Ok(()),
        }
    }
}

impl Drop for SerialDriver {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// The serial worker loop: serve producers, poll the port, run one
/// controller cycle, publish a snapshot.
///
/// Returns when asked to stop or when the port keeps failing. Handles then
/// see `Disconnected`.
fn run_worker<I, H>(
    mut interface: I,
    mut controller: ZWaveController<H>,
    inbox: Receiver<Request>,
    snapshot: Arc<RwLock<NetworkSnapshot>>,
    stop: Arc<AtomicBool>,
) where
    I: SerialInterface,
    H: EventHandler,
{
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut read_errors = 0u32;
    let start_time = Instant::now();
    info!("Serial worker started");

    while !stop.load(Ordering::Relaxed) {
        for request in inbox.try_iter() {
            serve(&mut controller, request);
        }

        let received = match interface.read_bytes(&mut buffer) {
            Ok(n) if n > 0 => {
                read_errors = 0;
                trace!("<< {}", hex::encode_upper(&buffer[..n]));
                Some(&buffer[..n])
            }
            Ok(_) => {
                read_errors = 0;
                None
            }
            Err(e) => {
                read_errors += 1;
                if read_errors >= MAX_READ_ERRORS {
                    error!("Read error: {} ({} in a row), giving up on the port", e, read_errors);
                    break;
                }
                let backoff = Duration::from_millis(1 << read_errors.min(7)).min(MAX_READ_BACKOFF);
                warn!("Read error: {} ({} in a row), retrying in {:?}", e, read_errors, backoff);
                thread::sleep(backoff);
                None
            }
        };
        let idle = received.is_none();

        let current_time_us = start_time.elapsed().as_micros() as u64;
        match controller.run_cycle(received, current_time_us) {
            ControllerAction::Write(bytes) => {
                trace!(">> {}", hex::encode_upper(&bytes));
                if let Err(e) = interface.write_bytes(&bytes) {
                    error!("Write error: {}", e);
                }
            }
            ControllerAction::SetTimer(_) | ControllerAction::NoAction => {
                if idle {
                    // Ports with a read timeout already paced us.
                    thread::sleep(Duration::from_micros(100));
                }
            }
        }

        let latest = NetworkSnapshot::from_controller(&controller);
        match snapshot.write() {
            Ok(mut guard) => *guard = latest,
            Err(poisoned) => *poisoned.into_inner() = latest,
        }
    }
    info!("Serial worker stopped");
}

fn serve<H: EventHandler>(controller: &mut ZWaveController<H>, request: Request) {
    match request {
        Request::Enqueue { transaction, reply } => {
            let result = controller.enqueue(transaction);
            debug!("Enqueue request: {:?}", result);
            let _ = reply.send(result);
        }
        Request::AddNode(node) => {
            controller.add_node(node);
        }
        Request::AdvanceStage { node, reply } => {
            let _ = reply.send(controller.advance_node_stage(node));
        }
    }
}
