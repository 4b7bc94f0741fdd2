use crate::{ActuatorChannel, ActuatorFrame, LinkError, PortInfo, Result};
use serialport::{SerialPort, SerialPortType};
use std::io::{ErrorKind, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Open-time knobs for [`SerialLink`].
#[derive(Clone, Copy, Debug)]
pub struct SerialOptions {
    pub timeout: Duration,
    /// Pause after opening; most boards reset when the port opens.
    pub settle: Duration,
}

impl Default for SerialOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(500),
            settle: Duration::from_millis(200),
        }
    }
}

/// Actuator link over a USB/UART serial port (8N1).
pub struct SerialLink {
    path: String,
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    pub fn open_with(path: &str, baud_rate: u32, opts: SerialOptions) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(opts.timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => LinkError::PortNotFound(path.to_string()),
                _ => LinkError::Io(e.to_string()),
            })?;
        info!(port = path, baud_rate, "serial link connected");
        if !opts.settle.is_zero() {
            std::thread::sleep(opts.settle);
        }
        Ok(SerialLink {
            path: path.to_string(),
            port,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ActuatorChannel for SerialLink {
    fn open(address: &str, baud_rate: u32) -> Result<Self> {
        Self::open_with(address, baud_rate, SerialOptions::default())
    }

    fn list() -> Result<Vec<PortInfo>> {
        let mut out = Vec::new();
        for p in serialport::available_ports().map_err(|e| LinkError::Io(e.to_string()))? {
            let driver = match p.port_type {
                SerialPortType::UsbPort(_) => "usb-serial",
                SerialPortType::PciPort => "pci-serial",
                SerialPortType::BluetoothPort => "bluetooth-serial",
                SerialPortType::Unknown => "serial",
            };
            out.push(PortInfo {
                name: p.port_name,
                driver: driver.to_string(),
            });
        }
        Ok(out)
    }

    fn send(&mut self, frame: &ActuatorFrame) -> Result<()> {
        let bytes = frame.to_bytes();
        self.port.write_all(&bytes).map_err(map_io)?;
        self.port.flush().map_err(map_io)?;
        debug!(port = %self.path, frame = %frame, "frame sent");
        Ok(())
    }

    fn close(self) -> Result<()> {
        debug!(port = %self.path, "serial link closed");
        drop(self.port);
        Ok(())
    }
}

fn map_io(e: std::io::Error) -> LinkError {
    if e.kind() == ErrorKind::TimedOut {
        LinkError::Timeout
    } else {
        LinkError::Io(e.to_string())
    }
}
