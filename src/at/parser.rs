//! Line parser
//!
//! Stateless recognizer for the next protocol token in a byte window. The
//! window may hold several tokens, with the last one cut anywhere; the caller
//! keeps whatever was not consumed and retries once more bytes arrive.

use std::sync::Arc;

use tracing::warn;

use super::payload::messaging::{parse_pdu_lines, IncomingSms, PduParse, StatusReport};
use super::registry::{self, TagSpec};
use super::response::Response;
use crate::constants::OK_TERMINATOR;
use crate::logging::escape;

const RING: &str = "RING\r";
const CMT: &str = "+CMT:";
const CDS: &str = "+CDS:";
const SMS_PROMPT: &str = "> \r";
const OK: &str = "OK\r";
const ERROR: &str = "ERROR\r";

/// Result of looking at the head of the input
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// A complete token; `consumed` is always > 0
    Parsed {
        consumed: usize,
        response: Arc<Response>,
    },
    /// Bare line separator to drop
    Skip(usize),
    /// Need more bytes
    Incomplete,
    /// The input cannot be framed; the stream has lost synchronization
    Desync,
}

impl ParseOutcome {
    fn parsed(consumed: usize, response: Response) -> Self {
        Self::Parsed {
            consumed,
            response: Arc::new(response),
        }
    }
}

/// Recognize the next token at the start of `input`
pub fn parse(input: &[u8]) -> ParseOutcome {
    match std::str::from_utf8(input) {
        Ok(text) => parse_str(text),
        Err(e) => {
            let valid = std::str::from_utf8(&input[..e.valid_up_to()]).unwrap_or_default();
            match parse_str(valid) {
                // a token cannot complete across a byte that is not UTF-8
                ParseOutcome::Incomplete if e.error_len().is_some() => ParseOutcome::Desync,
                outcome => outcome,
            }
        }
    }
}

fn parse_str(s: &str) -> ParseOutcome {
    if s.starts_with(['\r', '\n']) {
        return ParseOutcome::Skip(1);
    }

    if s.starts_with(RING) {
        return ParseOutcome::parsed(RING.len(), Response::Ring);
    }

    if let Some(rest) = s.strip_prefix(CMT) {
        return parse_pdu(rest, CMT.len(), |header, pdu| {
            Response::Cmt(IncomingSms { header, pdu })
        });
    }
    if let Some(rest) = s.strip_prefix(CDS) {
        return parse_pdu(rest, CDS.len(), |pdu_size, pdu| {
            Response::Cds(StatusReport { pdu_size, pdu })
        });
    }
    if is_proper_prefix(s, CMT) || is_proper_prefix(s, CDS) {
        return ParseOutcome::Incomplete;
    }

    if let Some(specs) = s.bytes().next().and_then(registry::table) {
        return parse_tagged(s, specs);
    }

    if s.starts_with(SMS_PROMPT) {
        return ParseOutcome::parsed(SMS_PROMPT.len(), Response::SmsPrompt);
    }
    if s.starts_with(OK) {
        return ParseOutcome::parsed(OK.len(), Response::Ok);
    }
    if s.starts_with(ERROR) {
        return ParseOutcome::parsed(ERROR.len(), Response::Error);
    }

    match s.find(OK_TERMINATOR) {
        Some(pos) => ParseOutcome::parsed(
            pos + OK_TERMINATOR.len(),
            Response::Text(s[..pos].to_string()),
        ),
        None => ParseOutcome::Incomplete,
    }
}

fn parse_pdu(rest: &str, tag_len: usize, wrap: fn(i32, Vec<u8>) -> Response) -> ParseOutcome {
    match parse_pdu_lines(rest) {
        PduParse::Complete {
            header,
            pdu,
            consumed,
        } => ParseOutcome::parsed(tag_len + consumed, wrap(header, pdu)),
        PduParse::Incomplete => ParseOutcome::Incomplete,
        PduParse::Invalid => {
            warn!(input = %escape(rest.as_bytes()), "Cannot parse SMS PDU");
            ParseOutcome::Desync
        }
    }
}

/// `s` starts with a sigil; match the text after it against `specs`
fn parse_tagged(s: &str, specs: &[TagSpec]) -> ParseOutcome {
    let body = &s[1..];
    let mut maybe_incomplete = false;

    for spec in specs {
        let tag = spec.tag.as_str();

        if is_proper_prefix(body, tag) {
            maybe_incomplete = true;
            continue;
        }
        let Some(after) = body.strip_prefix(tag) else {
            continue;
        };

        // offset of the payload within `s`
        let start = match after.as_bytes().first() {
            None => {
                maybe_incomplete = true;
                continue;
            }
            Some(b':') => 1 + tag.len() + 1,
            Some(b'\r') => 1 + tag.len(),
            Some(_) => continue,
        };

        return if spec.multiline {
            match s[start..].find(OK_TERMINATOR) {
                // keep the `+TAG:` prefix and the CR ending the last line
                Some(pos) => {
                    let end = start + pos;
                    ParseOutcome::parsed(end + OK_TERMINATOR.len(), (spec.parse)(&s[..=end]))
                }
                None => ParseOutcome::Incomplete,
            }
        } else {
            match s[start..].find('\r') {
                Some(pos) => {
                    let end = start + pos;
                    let payload = s[start..end].trim_start_matches(|c: char| c <= ' ');
                    ParseOutcome::parsed(end + 1, (spec.parse)(payload))
                }
                None => ParseOutcome::Incomplete,
            }
        };
    }

    if maybe_incomplete {
        ParseOutcome::Incomplete
    } else {
        warn!(input = %escape(s.as_bytes()), "Unrecognized response tag");
        ParseOutcome::Desync
    }
}

fn is_proper_prefix(s: &str, of: &str) -> bool {
    s.len() < of.len() && of.starts_with(s)
}
