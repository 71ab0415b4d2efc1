//! Typed payloads of structured replies
//!
//! Each payload type exposes `parse(&str) -> Option<Self>`; `None` means the
//! payload was recognized by tag but could not be decoded.

pub mod data;
pub mod error;
pub mod messaging;
pub mod network;
pub mod sim;
pub mod voice;

use crate::at::cursor::Cursor;

pub use data::{PdpContext, PdpContextList, PdpContextParams};
pub use error::CmeCode;
pub use messaging::{BroadcastConfig, IdRange, IncomingSms, MessageRef, ServiceCenter, StatusReport};
pub use network::{
    CdmaRoamingType, Cops, Ctec, ModemTechnology, NetworkTime, PhysicalChannelConfig, RegState,
    Registration, SignalStrength,
};
pub use sim::{
    CdmaSubscriptionSource, FacilityLock, PinRetries, SimAccess, SimAuth, SimIoResult, SimState,
    StkProfileState, StkTerminalResponse,
};
pub use voice::{Call, CallForward, CallForwardList, CallList, CallWaiting, Clip, Clir};

/// Lone integer flag, e.g. `+CFUN: 1` or `+CMUT: 0`
pub fn parse_flag(payload: &str) -> Option<bool> {
    let mut c = Cursor::new(payload);
    let value = c.int()?;
    c.finish()?;
    Some(value != 0)
}
