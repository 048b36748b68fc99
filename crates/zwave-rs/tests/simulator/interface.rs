// crates/zwave-rs/tests/simulator/interface.rs
use super::firmware::SimulatedFirmware;
use zwave_rs::hal::{SerialInterface, ZWaveError};

/// An in-memory serial port wired to a simulated controller stick.
pub struct SimulatedPort {
    pub firmware: SimulatedFirmware,
    /// Largest number of bytes a single read returns, to exercise reassembly.
    pub max_read: usize,
}

impl SimulatedPort {
    pub fn new(firmware: SimulatedFirmware) -> Self {
        Self {
            firmware,
            max_read: 64,
        }
    }
}

impl SerialInterface for SimulatedPort {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ZWaveError> {
        self.firmware.receive(bytes);
        Ok(())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, ZWaveError> {
        let limit = buffer.len().min(self.max_read);
        Ok(self.firmware.drain_output(&mut buffer[..limit]))
    }
}
