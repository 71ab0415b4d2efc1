//! Character device / FIFO device
//!
//! Virtual modem ports (e.g. `/dev/hvc2` in the emulator) are plain files
//! opened read-write. Plain files have no read timeout, so the read half
//! waits with `poll(2)` and reports `TimedOut` when nothing arrived.

use super::{Device, Link};
use crate::error::{ModemError, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::time::Duration;

/// Modem behind a character device or FIFO
#[derive(Debug, Clone)]
pub struct FileDevice {
    path: String,
    read_timeout: Duration,
}

impl FileDevice {
    pub fn new(path: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            read_timeout,
        }
    }
}

impl Device for FileDevice {
    fn open(&mut self) -> Result<Link> {
        let map_err = |e: io::Error| ModemError::DeviceOpen {
            device: self.path.clone(),
            source: e,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(map_err)?;
        let writer = file.try_clone().map_err(map_err)?;

        Ok(Link {
            reader: Box::new(PollReader::new(file, self.read_timeout)),
            writer: Box::new(writer),
            name: self.path.clone(),
        })
    }
}

/// Read half that gives up after a timeout
pub struct PollReader {
    file: File,
    timeout_ms: libc::c_int,
}

impl PollReader {
    pub fn new(file: File, timeout: Duration) -> Self {
        let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
        Self { file, timeout_ms }
    }
}

impl Read for PollReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        // SAFETY: `pfd` is a valid pollfd for the duration of the call and
        // the fd stays open while `self.file` is alive.
        let ready = unsafe { libc::poll(&mut pfd, 1, self.timeout_ms) };
        match ready {
            -1 => Err(io::Error::last_os_error()),
            0 => Err(io::ErrorKind::TimedOut.into()),
            _ => self.file.read(buf),
        }
    }
}
