//! Transport abstraction for the modem link
//!
//! Separates I/O concerns from protocol logic:
//! - **Device**: how a duplex byte link to the modem is opened
//! - **Link**: the opened link, split into a read half and a write half
//!
//! The channel owns reconnection: it calls [`Device::open`] again whenever
//! the previous link was lost. Read halves must time out periodically
//! (`TimedOut` or `WouldBlock`) so the reader can notice shutdown.
//!
//! # Adding a new transport
//!
//! 1. Create `transport/my_device.rs`
//! 2. Implement the `Device` trait
//! 3. Add `pub mod my_device;` here and a `DeviceKind` arm in `from_config`

#[cfg(unix)]
pub mod file;
pub mod serial;
#[cfg(unix)]
pub mod unix;

#[cfg(unix)]
pub use file::FileDevice;
pub use serial::SerialDevice;
#[cfg(unix)]
pub use unix::UnixSocketDevice;

use std::io::{Read, Write};

use crate::config::{DeviceConfig, DeviceKind};
use crate::error::{ModemError, Result};

/// An opened duplex link to the modem
pub struct Link {
    /// Read half, owned by the reader worker
    pub reader: Box<dyn Read + Send>,
    /// Write half, owned by the request worker
    pub writer: Box<dyn Write + Send>,
    /// Human readable name for logs
    pub name: String,
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link").field("name", &self.name).finish()
    }
}

/// Something that can (re)open the modem link
///
/// Any `FnMut() -> Result<Link>` closure is a device, which is how tests
/// hand the channel an in-memory link.
pub trait Device: Send + 'static {
    /// Open a fresh link
    ///
    /// # Errors
    ///
    /// Returns `ModemError::DeviceOpen` if the device cannot be opened.
    fn open(&mut self) -> Result<Link>;
}

impl<F> Device for F
where
    F: FnMut() -> Result<Link> + Send + 'static,
{
    fn open(&mut self) -> Result<Link> {
        self()
    }
}

/// One of the built-in devices, chosen by config
#[derive(Debug)]
pub enum ConfiguredDevice {
    Serial(SerialDevice),
    #[cfg(unix)]
    File(FileDevice),
    #[cfg(unix)]
    Unix(UnixSocketDevice),
    /// Kind not available on this platform
    Unsupported { kind: DeviceKind, path: String },
}

impl Device for ConfiguredDevice {
    fn open(&mut self) -> Result<Link> {
        match self {
            Self::Serial(device) => device.open(),
            #[cfg(unix)]
            Self::File(device) => device.open(),
            #[cfg(unix)]
            Self::Unix(device) => device.open(),
            Self::Unsupported { kind, path } => Err(ModemError::DeviceOpen {
                device: path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    format!("{:?} devices are not supported on this platform", kind),
                ),
            }),
        }
    }
}

/// Build the device described by the config
pub fn from_config(config: &DeviceConfig) -> ConfiguredDevice {
    match config.kind {
        DeviceKind::Serial => ConfiguredDevice::Serial(SerialDevice::new(
            &config.path,
            config.baud_rate,
            config.read_timeout(),
        )),
        #[cfg(unix)]
        DeviceKind::File => {
            ConfiguredDevice::File(FileDevice::new(&config.path, config.read_timeout()))
        }
        #[cfg(unix)]
        DeviceKind::Unix => {
            ConfiguredDevice::Unix(UnixSocketDevice::new(&config.path, config.read_timeout()))
        }
        #[cfg(not(unix))]
        kind => ConfiguredDevice::Unsupported {
            kind,
            path: config.path.clone(),
        },
    }
}

/// True for read errors that only mean "nothing arrived before the timeout"
pub fn is_timeout(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;

    matches!(
        e.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_device() {
        let mut opened = 0;
        let mut device = move || -> Result<Link> {
            opened += 1;
            Err(ModemError::DeviceOpen {
                device: format!("attempt {}", opened),
                source: std::io::Error::other("no modem"),
            })
        };

        let err = Device::open(&mut device).unwrap_err();
        assert_eq!(err.to_string(), "Cannot open modem device: attempt 1");
        let err = Device::open(&mut device).unwrap_err();
        assert_eq!(err.to_string(), "Cannot open modem device: attempt 2");
    }

    #[test]
    fn test_is_timeout() {
        use std::io::{Error, ErrorKind};
        assert!(is_timeout(&Error::from(ErrorKind::TimedOut)));
        assert!(is_timeout(&Error::from(ErrorKind::WouldBlock)));
        assert!(!is_timeout(&Error::from(ErrorKind::BrokenPipe)));
    }

    #[test]
    fn test_from_config_builds_each_kind() {
        for kind in [DeviceKind::Serial, DeviceKind::File, DeviceKind::Unix] {
            let config = DeviceConfig {
                kind,
                path: "/nonexistent/modem".into(),
                ..DeviceConfig::default()
            };
            let mut device = from_config(&config);
            assert!(matches!(device.open(), Err(ModemError::DeviceOpen { .. })));
        }
    }
}
