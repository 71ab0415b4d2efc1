//! AT command channel of a software cellular modem emulator
//!
//! - [`at`]: wire token parser and typed responses
//! - [`channel`]: request/reply correlation and unsolicited fan-out over
//!   one modem link
//! - [`transport`]: how the link is opened (serial port, character device,
//!   unix socket)
//! - [`services`]: handlers built on the channel

pub mod at;
pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod services;
pub mod transport;

pub use channel::{Channel, ChannelOptions, Conversation, RequestPipe};
pub use error::{FatalError, ModemError, Result};
