//! Unix domain socket device
//!
//! Connects to a socket exposed by the VMM (e.g. a QEMU `chardev socket`).

use super::{Device, Link};
use crate::error::{ModemError, Result};
use std::io;
use std::os::unix::net::UnixStream;
use std::time::Duration;

/// Modem behind a unix socket path
#[derive(Debug, Clone)]
pub struct UnixSocketDevice {
    path: String,
    read_timeout: Duration,
}

impl UnixSocketDevice {
    pub fn new(path: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            read_timeout,
        }
    }
}

impl Device for UnixSocketDevice {
    fn open(&mut self) -> Result<Link> {
        let stream = UnixStream::connect(&self.path).map_err(|e| ModemError::DeviceOpen {
            device: self.path.clone(),
            source: e,
        })?;

        Link::from_unix_stream(stream, self.path.clone(), self.read_timeout).map_err(|e| {
            ModemError::DeviceOpen {
                device: self.path.clone(),
                source: e,
            }
        })
    }
}

impl Link {
    /// Split a connected stream into a link whose read half times out
    pub fn from_unix_stream(
        stream: UnixStream,
        name: impl Into<String>,
        read_timeout: Duration,
    ) -> io::Result<Link> {
        stream.set_read_timeout(Some(read_timeout))?;
        let writer = stream.try_clone()?;

        Ok(Link {
            reader: Box::new(stream),
            writer: Box::new(writer),
            name: name.into(),
        })
    }
}
