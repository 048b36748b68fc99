// crates/zwave-rs/src/controller/mod.rs
mod config;
mod events;
mod handlers;
mod main;
mod queue;
mod retry;
mod state;
mod transaction;
mod wakeup;

pub use config::ControllerConfig;
pub use events::{ControllerEvent, EventHandler, LoggingEventHandler, NoOpEventHandler};
pub use handlers::HandlerOutcome;
pub use main::{ControllerAction, ZWaveController};
pub use queue::TransactionQueue;
pub use state::{ControllerInfo, LinkStatistics, NetworkState};
pub use transaction::{Transaction, TransactionId, TransactionPhase};
pub use wakeup::{WakeUpEntry, WakeUpQueue};
