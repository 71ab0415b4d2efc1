//! Call payloads: call list, forwarding, waiting, identification

use serde::Serialize;

use crate::at::cursor::{unquote, Cursor};

/// One `+CLCC:` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call {
    pub index: i32,
    pub is_mt: bool,
    pub state: i32,
    pub is_voice: bool,
    pub is_mpty: bool,
    pub number: String,
    /// Type of address
    pub toa: i32,
}

/// `+CLCC:` current calls (multi-line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallList {
    pub calls: Vec<Call>,
}

impl CallList {
    /// `+CLCC: <index>,<dir>,<state>,<mode>,<mpty>,<number>,<type>\r` per call
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let mut calls = Vec::new();

        while c.has_more() {
            c.skip_str("+CLCC:")?;
            c.skip_if(' ');
            let index = c.int()?;
            c.skip(',')?;
            let dir = c.int()?;
            c.skip(',')?;
            let state = c.int()?;
            c.skip(',')?;
            let mode = c.int()?;
            c.skip(',')?;
            let mpty = c.int()?;
            c.skip(',')?;
            let number = unquote(c.until(',')?).to_string();
            let toa = c.int()?;
            c.skip('\r')?;

            calls.push(Call {
                index,
                is_mt: dir != 0,
                state,
                is_voice: mode == 0,
                is_mpty: mpty != 0,
                number,
                toa,
            });
        }

        Some(Self { calls })
    }
}

/// One `+CCFCU:` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallForward {
    pub status: i32,
    pub service_class: i32,
    pub toa: i32,
    pub number: String,
    pub time_seconds: Option<i32>,
}

/// `+CCFCU:` call forwarding rules (multi-line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallForwardList {
    pub rules: Vec<CallForward>,
}

impl CallForwardList {
    /// `+CCFCU: <status>,<class>,<numtype>,<toa>,"<number>"[,<sub>,<satype>,<subaddr>,<time>]\r`
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let mut rules = Vec::new();

        while c.has_more() {
            c.skip_str("+CCFCU:")?;
            c.skip_if(' ');
            let status = c.int()?;
            c.skip(',')?;
            let service_class = c.int()?;
            c.skip(',')?;
            let _number_type = c.int()?;
            c.skip(',')?;
            let toa = c.int()?;
            c.skip(',')?;
            let number = c.quoted()?.to_string();

            let time_seconds = if c.skip_if(',') {
                c.until(',')?;
                c.until(',')?;
                c.until(',')?;
                let time = c.int()?;
                Some(time)
            } else {
                None
            };
            c.skip('\r')?;

            rules.push(CallForward {
                status,
                service_class,
                toa,
                number,
                time_seconds,
            });
        }

        Some(Self { rules })
    }
}

/// `+CCWA: <mode>,<class>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallWaiting {
    pub enable: bool,
    pub service_class: i32,
}

impl CallWaiting {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let mode = c.int()?;
        c.skip(',')?;
        let service_class = c.int()?;
        c.finish()?;
        Some(Self {
            enable: mode == 1,
            service_class,
        })
    }
}

/// Calling line identification provisioning status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClipStatus {
    NotProvisioned,
    Provisioned,
    Unknown,
}

/// `+CLIP: <enable>,<status>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Clip {
    pub enable: bool,
    pub status: ClipStatus,
}

impl Clip {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let enable = c.int()?;
        c.skip(',')?;
        let status = match c.int()? {
            0 => ClipStatus::NotProvisioned,
            1 => ClipStatus::Provisioned,
            2 => ClipStatus::Unknown,
            _ => return None,
        };
        c.finish()?;
        Some(Self {
            enable: enable != 0,
            status,
        })
    }
}

/// `+CLIR: <n>,<m>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Clir {
    pub n: i32,
    pub m: i32,
}

impl Clir {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let n = c.int()?;
        c.skip(',')?;
        let m = c.int()?;
        c.finish()?;
        Some(Self { n, m })
    }
}
