#![cfg_attr(not(any(feature = "std", test)), no_std)]

// 'alloc' is used for dynamic allocation (frame bodies, queues, node tables)
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod hal;

// --- Serial Link ---
pub mod frame;

// --- Node Abstraction ---
pub mod node;

// --- Transaction Dispatcher ---
pub mod controller;

// --- Top-level Exports ---
pub use types::{MessageClass, MessagePriority, MessageType, NodeId};
pub use hal::{SerialInterface, ZWaveError};
pub use frame::{Codec, FrameLayout, SerialMessage, TransmissionState};
pub use node::{CommandClassId, CommandClassInfo, CommandClassRegistry, NodeStage, ZWaveNode};
pub use controller::{
    ControllerAction, ControllerConfig, ControllerEvent, EventHandler, LoggingEventHandler,
    NoOpEventHandler, Transaction, TransactionId, ZWaveController,
};
