// crates/zwave-rs-serial/src/lib.rs
//! Host driver for a Z-Wave controller stick on a serial port.
//!
//! A single worker thread owns the port and the [`ZWaveController`]; every
//! other thread talks to it through a cloneable [`ControllerHandle`] and
//! reads the state it publishes as a [`NetworkSnapshot`].
//!
//! [`ZWaveController`]: zwave_rs::ZWaveController

mod driver;
mod events;
mod port;
mod snapshot;

pub use driver::{ControllerHandle, SerialDriver};
pub use events::ChannelEventHandler;
pub use port::{SerialConfig, SerialPortInterface, available_ports};
pub use snapshot::{LinkCounters, NetworkSnapshot, NodeSnapshot};
