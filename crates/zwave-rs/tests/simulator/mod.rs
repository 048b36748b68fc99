// crates/zwave-rs/tests/simulator/mod.rs
pub mod firmware;
pub mod interface;

pub use firmware::{SimNode, SimulatedFirmware};
pub use interface::SimulatedPort;

use zwave_rs::hal::SerialInterface;
use zwave_rs::{ControllerAction, ControllerConfig, ControllerEvent, ZWaveController};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Drives a controller against the simulated stick on a virtual clock.
pub struct Harness {
    pub controller: ZWaveController<Vec<ControllerEvent>>,
    pub port: SimulatedPort,
    /// Current simulation time in microseconds.
    pub now_us: u64,
}

impl Harness {
    pub fn new(firmware: SimulatedFirmware) -> Self {
        Self::with_config(ControllerConfig::default(), firmware)
    }

    pub fn with_config(config: ControllerConfig, firmware: SimulatedFirmware) -> Self {
        init_logging();
        Self {
            controller: ZWaveController::new(config, Vec::new()),
            port: SimulatedPort::new(firmware),
            now_us: 0,
        }
    }

    pub fn firmware(&self) -> &SimulatedFirmware {
        &self.port.firmware
    }

    pub fn firmware_mut(&mut self) -> &mut SimulatedFirmware {
        &mut self.port.firmware
    }

    /// Runs the host loop until nothing is in flight and the line is quiet.
    /// Pending timers are fast-forwarded.
    pub fn settle(&mut self) {
        let mut buffer = [0u8; 256];
        for _ in 0..10_000 {
            let read = self.port.read_bytes(&mut buffer).unwrap();
            let received = if read > 0 { Some(&buffer[..read]) } else { None };
            let action = self.controller.run_cycle(received, self.now_us);
            let quiet = read == 0 && !self.port.firmware.has_output();
            match action {
                ControllerAction::Write(bytes) => self.port.write_bytes(&bytes).unwrap(),
                ControllerAction::SetTimer(remaining) if quiet => self.now_us += remaining.max(1),
                ControllerAction::SetTimer(_) => {}
                ControllerAction::NoAction if quiet => return,
                ControllerAction::NoAction => {}
            }
            self.now_us += 100;
        }
        panic!("link did not settle");
    }

    pub fn events(&self) -> &[ControllerEvent] {
        self.controller.handler()
    }

    pub fn take_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(self.controller.handler_mut())
    }
}
