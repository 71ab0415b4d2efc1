//! SIM payloads: PIN state, restricted access, facility locks, SIM toolkit

use serde::Serialize;

use crate::at::cursor::Cursor;
use crate::at::hex;

/// `+CPIN:` SIM state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimState {
    Absent,
    NotReady,
    Ready,
    Pin,
    Puk,
}

impl SimState {
    pub fn parse(payload: &str) -> Option<Self> {
        Some(match payload {
            "READY" => Self::Ready,
            "SIM PIN" => Self::Pin,
            "SIM PUK" => Self::Puk,
            "SIM ABSENT" => Self::Absent,
            "NOT READY" => Self::NotReady,
            _ => return None,
        })
    }
}

/// `+CPINR: <code>,<remaining>,<max>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinRetries {
    pub remaining: i32,
    pub max: i32,
}

impl PinRetries {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let _code = c.until(',')?;
        let remaining = c.int()?;
        c.skip(',')?;
        let max = c.int()?;
        c.skip_if(',');
        c.finish()?;
        Some(Self { remaining, max })
    }
}

/// `+CRSM: <sw1>,<sw2>[,<response>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimIoResult {
    pub sw1: i32,
    pub sw2: i32,
    /// Hex encoded response data, as sent by the modem
    pub response: String,
}

impl SimIoResult {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let sw1 = c.int()?;
        c.skip(',')?;
        let sw2 = c.int()?;
        let response = if c.has_more() {
            c.skip(',')?;
            c.rest().to_string()
        } else {
            String::new()
        };
        Some(Self { sw1, sw2, response })
    }
}

/// `+CCSS:` CDMA subscription source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CdmaSubscriptionSource {
    RuimSim,
    Nv,
}

impl CdmaSubscriptionSource {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let source = c.int()?;
        c.finish()?;
        match source {
            0 => Some(Self::RuimSim),
            1 => Some(Self::Nv),
            _ => None,
        }
    }
}

/// `+CLCK: 0|1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FacilityLock {
    pub locked: bool,
}

impl FacilityLock {
    pub fn parse(payload: &str) -> Option<Self> {
        match payload.as_bytes().first()? {
            b'0' => Some(Self { locked: false }),
            b'1' => Some(Self { locked: true }),
            _ => None,
        }
    }
}

/// `+CSIM: <len>,<response>` where `len` is the response text length
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimAccess {
    pub response: String,
}

impl SimAccess {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let len = c.int()?;
        c.skip(',')?;
        let response = c.rest();
        (usize::try_from(len).ok()? == response.len()).then(|| Self {
            response: response.to_string(),
        })
    }
}

// =============================================================================
// SIM toolkit
// =============================================================================

/// `+CUSATD: <a>, <b>` STK profile download state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StkProfileState {
    pub a: i32,
    pub b: i32,
}

impl StkProfileState {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let a = c.int()?;
        c.skip(',')?;
        c.skip_if(' ');
        let b = c.int()?;
        c.finish()?;
        Some(Self { a, b })
    }
}

/// `+CUSATT: <value>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StkTerminalResponse {
    pub value: i32,
}

impl StkTerminalResponse {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let value = c.int()?;
        c.finish()?;
        Some(Self { value })
    }
}

// =============================================================================
// SIM authentication (^MBAU)
// =============================================================================

/// `^MBAU: <status>[,<kc>,<sres>][,<ck>,<ik>,<res/auts>]`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SimAuth {
    pub status: i32,
    pub kc: Vec<u8>,
    pub sres: Vec<u8>,
    pub ck: Vec<u8>,
    pub ik: Vec<u8>,
    pub res_auts: Vec<u8>,
}

impl SimAuth {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let mut auth = Self {
            status: c.int()?,
            ..Self::default()
        };

        match payload.matches(',').count() {
            0 => c.finish()?,
            2 => {
                c.skip(',')?;
                auth.kc = hex::decode(c.until(',')?)?;
                auth.sres = hex::decode(c.rest())?;
            }
            5 => {
                c.skip(',')?;
                auth.kc = hex::decode(c.until(',')?)?;
                auth.sres = hex::decode(c.until(',')?)?;
                auth.ck = hex::decode(c.until(',')?)?;
                auth.ik = hex::decode(c.until(',')?)?;
                auth.res_auts = hex::decode(c.rest())?;
            }
            _ => return None,
        }

        Some(auth)
    }
}
