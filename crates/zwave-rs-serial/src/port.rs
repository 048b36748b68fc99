// crates/zwave-rs-serial/src/port.rs
use log::{error, info, warn};
use std::io::{self, Read, Write};
use std::time::Duration;
use zwave_rs::{ControllerConfig, SerialInterface, ZWaveError};

/// Everything needed to open the port and run the controller on it.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub port: String,
    pub baud_rate: u32,
    /// How long a read blocks before returning zero bytes.
    pub read_timeout: Duration,
    pub controller: ControllerConfig,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".into(),
            baud_rate: 115_200,
            read_timeout: Duration::from_millis(50),
            controller: ControllerConfig::default(),
        }
    }
}

/// A `SerialInterface` backed by a real serial port (8N1, no flow control).
pub struct SerialPortInterface {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialPortInterface {
    pub fn open(config: &SerialConfig) -> Result<Self, ZWaveError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| {
                error!("Failed to open serial port {}: {}", config.port, e);
                ZWaveError::IoError
            })?;
        info!("Opened {} at {} baud", config.port, config.baud_rate);
        Ok(Self { port })
    }
}

impl SerialInterface for SerialPortInterface {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ZWaveError> {
        self.port
            .write_all(bytes)
            .and_then(|_| self.port.flush())
            .map_err(|e| {
                warn!("Serial write failed: {}", e);
                ZWaveError::IoError
            })
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, ZWaveError> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => {
                warn!("Serial read failed: {}", e);
                Err(ZWaveError::IoError)
            }
        }
    }
}

/// Names of the serial ports present on this machine.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            warn!("Could not enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}
