//! SMS payloads: service centre, broadcast config, send/write results,
//! incoming messages and status reports

use serde::Serialize;

use crate::at::cursor::{unquote, Cursor};
use crate::at::hex;

/// `+CSCA: <sca>,<tosca>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCenter {
    pub address: String,
    pub tosca: i32,
}

impl ServiceCenter {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let address = unquote(c.until(',')?).to_string();
        let tosca = c.int()?;
        c.finish()?;
        Some(Self { address, tosca })
    }
}

/// Inclusive id range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdRange {
    pub from: i32,
    pub to: i32,
}

/// `+CSCB: <mode>,"<ids>","<schemes>"` cell broadcast config
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastConfig {
    pub mode: i32,
    pub service_ids: Vec<IdRange>,
    pub code_schemes: Vec<IdRange>,
}

impl BroadcastConfig {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let mode = c.int()?;
        c.skip(',')?;
        let ids = c.quoted()?;
        c.skip(',')?;
        let schemes = c.quoted()?;
        c.finish()?;

        Some(Self {
            mode,
            service_ids: parse_ranges(ids)?,
            code_schemes: parse_ranges(schemes)?,
        })
    }
}

/// `a,b-c,d` into ranges; single values become one-element ranges
fn parse_ranges(text: &str) -> Option<Vec<IdRange>> {
    let mut c = Cursor::new(text);
    let mut ranges = Vec::new();

    while c.has_more() {
        let from = c.int()?;
        let to = if c.skip_if('-') { c.int()? } else { from };
        ranges.push(IdRange { from, to });
        if c.has_more() {
            c.skip(',')?;
        }
    }

    Some(ranges)
}

/// `+CMGS:` / `+CMGW:` message reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageRef {
    pub message_ref: i32,
}

impl MessageRef {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let message_ref = c.int()?;
        c.finish()?;
        Some(Self { message_ref })
    }
}

/// Outcome of the two-line `+CMT:` / `+CDS:` parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PduParse {
    /// Header and PDU decoded; `consumed` counts both lines
    Complete { header: i32, pdu: Vec<u8>, consumed: usize },
    /// The PDU line is not terminated yet
    Incomplete,
    /// Header or PDU cannot be decoded
    Invalid,
}

/// `<header>\r<hex pdu>\r`, input starting right after the `+CMT:`/`+CDS:` tag
pub fn parse_pdu_lines(text: &str) -> PduParse {
    let mut c = Cursor::new(text);
    c.skip_ws();
    if c.is_done() {
        return PduParse::Incomplete;
    }
    let Some(header) = c.int() else {
        return PduParse::Invalid;
    };
    if c.is_done() {
        return PduParse::Incomplete;
    }
    if c.skip('\r').is_none() {
        return PduParse::Invalid;
    }
    let Some(line) = c.until('\r') else {
        return PduParse::Incomplete;
    };

    match hex::decode(line) {
        Some(pdu) => PduParse::Complete {
            header,
            pdu,
            consumed: c.consumed(),
        },
        None => PduParse::Invalid,
    }
}

/// Incoming SMS (`+CMT:`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingSms {
    /// Header value reported before the PDU
    pub header: i32,
    pub pdu: Vec<u8>,
}

/// SMS status report (`+CDS:`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub pdu_size: i32,
    pub pdu: Vec<u8>,
}
