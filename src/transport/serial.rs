//! Serial port device
//!
//! UART or USB modems. The port is cloned into a read half and a write
//! half; the read half times out so the reader can poll for shutdown.

use super::{Device, Link};
use crate::error::{ModemError, Result};
use std::time::Duration;

/// Modem behind a serial port
#[derive(Debug, Clone)]
pub struct SerialDevice {
    port_name: String,
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialDevice {
    /// Create a serial device for the specified port
    pub fn new(port_name: impl Into<String>, baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            read_timeout,
        }
    }

    /// Open the serial port
    fn open_port(&self) -> Result<Box<dyn serialport::SerialPort>> {
        serialport::new(&self.port_name, self.baud_rate)
            .timeout(self.read_timeout)
            .open()
            .map_err(|e| self.open_error(e))
    }

    fn open_error(&self, e: serialport::Error) -> ModemError {
        ModemError::DeviceOpen {
            device: self.port_name.clone(),
            source: std::io::Error::other(e.to_string()),
        }
    }
}

impl Device for SerialDevice {
    fn open(&mut self) -> Result<Link> {
        let reader = self.open_port()?;
        let writer = reader.try_clone().map_err(|e| self.open_error(e))?;

        Ok(Link {
            reader: Box::new(reader),
            writer: Box::new(writer),
            name: format!("{} @ {} baud", self.port_name, self.baud_rate),
        })
    }
}
