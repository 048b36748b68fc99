// crates/zwave-rs-serial/examples/controller_monitor.rs
//! Opens a controller stick, runs the startup queries and prints what the
//! controller reports.
//!
//! ```text
//! ZWAVE_PORT=/dev/ttyACM0 RUST_LOG=debug cargo run --example controller_monitor
//! ```

use log::{error, info};
use std::time::{Duration, Instant};
use zwave_rs::{MessagePriority, SerialMessage, Transaction};
use zwave_rs_serial::{
    ChannelEventHandler, SerialConfig, SerialDriver, SerialPortInterface, available_ports,
};

const RUN_TIME: Duration = Duration::from_secs(30);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Available ports: {:?}", available_ports());
    let mut config = SerialConfig::default();
    if let Ok(port) = std::env::var("ZWAVE_PORT") {
        config.port = port;
    }

    let interface = match SerialPortInterface::open(&config) {
        Ok(interface) => interface,
        Err(e) => {
            error!("Cannot open {}: {}", config.port, e);
            std::process::exit(1);
        }
    };

    let (handler, events) = ChannelEventHandler::unbounded();
    let mut driver = match SerialDriver::spawn(interface, config.controller, handler) {
        Ok(driver) => driver,
        Err(e) => {
            error!("Cannot start the serial worker: {}", e);
            std::process::exit(1);
        }
    };

    let handle = driver.handle();
    for message in [
        SerialMessage::get_version(),
        SerialMessage::memory_get_id(),
        SerialMessage::serial_api_get_init_data(),
    ] {
        if let Err(e) = handle.enqueue(Transaction::new(message, MessagePriority::High)) {
            error!("Enqueue failed: {}", e);
        }
    }

    let start = Instant::now();
    while start.elapsed() < RUN_TIME {
        match events.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => println!("{event:?}"),
            Err(_) => match serde_json::to_string_pretty(&handle.snapshot()) {
                Ok(json) => println!("{json}"),
                Err(e) => error!("Snapshot serialization failed: {}", e),
            },
        }
    }

    if let Err(e) = driver.shutdown() {
        error!("Shutdown failed: {}", e);
    }
}
