//! Response model
//!
//! Every token the parser recognizes becomes one immutable [`Response`].
//! Responses are shared as `Arc<Response>` between the conversation waiting
//! for a reply and every subscriber of unsolicited traffic.

use serde::Serialize;
use tracing::warn;

use super::payload::*;
use super::Tag;
use crate::logging::escape;

/// A decoded modem response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum Response {
    // === Control tokens ===
    Ok,
    Error,
    Ring,
    /// `> ` prompt asking for the SMS PDU
    SmsPrompt,

    // === Structured replies ===
    CmeError(CmeCode),
    CmsError(String),
    Cpin(SimState),
    Cpinr(PinRetries),
    Crsm(SimIoResult),
    /// Radio power on
    Cfun(bool),
    Creg(Registration),
    Cgreg(Registration),
    Cereg(Registration),
    Ctec(Ctec),
    Cops(Cops),
    Wrmp(CdmaRoamingType),
    Ccss(CdmaSubscriptionSource),
    Csq(SignalStrength),
    Clcc(CallList),
    Ccfcu(CallForwardList),
    Ccwa(CallWaiting),
    Cgdcont(PdpContextList),
    Cgcontrdp(PdpContextParams),
    Cgfpccfg(PhysicalChannelConfig),
    Cusatd(StkProfileState),
    /// Proactive command, hex
    Cusatp(String),
    /// Envelope response, hex
    Cusate(String),
    Cusatt(StkTerminalResponse),
    Cusatend,
    Clck(FacilityLock),
    Csim(SimAccess),
    Cchc,
    Clip(Clip),
    Clir(Clir),
    /// Microphone muted
    Cmut(bool),
    /// Emergency callback mode
    Wsos(bool),
    Csca(ServiceCenter),
    Cscb(BroadcastConfig),
    Cmgs(MessageRef),
    Cmgw(MessageRef),
    Cmt(IncomingSms),
    Cds(StatusReport),
    Mbau(SimAuth),
    Ctzv(NetworkTime),

    // === Fallbacks ===
    /// Untagged reply terminated by `\rOK\r`, e.g. an IMEI
    Text(String),
    /// The tag was recognized but its payload did not decode
    ParseError { tag: Tag },
}

impl Response {
    /// Tag of a structured reply, or of the reply that failed to decode
    pub fn tag(&self) -> Option<Tag> {
        Some(match self {
            Self::Ok | Self::Error | Self::Ring | Self::SmsPrompt | Self::Text(_) => {
                return None
            }
            Self::ParseError { tag } => *tag,
            Self::CmeError(_) => Tag::CmeError,
            Self::CmsError(_) => Tag::CmsError,
            Self::Cpin(_) => Tag::Cpin,
            Self::Cpinr(_) => Tag::Cpinr,
            Self::Crsm(_) => Tag::Crsm,
            Self::Cfun(_) => Tag::Cfun,
            Self::Creg(_) => Tag::Creg,
            Self::Cgreg(_) => Tag::Cgreg,
            Self::Cereg(_) => Tag::Cereg,
            Self::Ctec(_) => Tag::Ctec,
            Self::Cops(_) => Tag::Cops,
            Self::Wrmp(_) => Tag::Wrmp,
            Self::Ccss(_) => Tag::Ccss,
            Self::Csq(_) => Tag::Csq,
            Self::Clcc(_) => Tag::Clcc,
            Self::Ccfcu(_) => Tag::Ccfcu,
            Self::Ccwa(_) => Tag::Ccwa,
            Self::Cgdcont(_) => Tag::Cgdcont,
            Self::Cgcontrdp(_) => Tag::Cgcontrdp,
            Self::Cgfpccfg(_) => Tag::Cgfpccfg,
            Self::Cusatd(_) => Tag::Cusatd,
            Self::Cusatp(_) => Tag::Cusatp,
            Self::Cusate(_) => Tag::Cusate,
            Self::Cusatt(_) => Tag::Cusatt,
            Self::Cusatend => Tag::Cusatend,
            Self::Clck(_) => Tag::Clck,
            Self::Csim(_) => Tag::Csim,
            Self::Cchc => Tag::Cchc,
            Self::Clip(_) => Tag::Clip,
            Self::Clir(_) => Tag::Clir,
            Self::Cmut(_) => Tag::Cmut,
            Self::Wsos(_) => Tag::Wsos,
            Self::Csca(_) => Tag::Csca,
            Self::Cscb(_) => Tag::Cscb,
            Self::Cmgs(_) => Tag::Cmgs,
            Self::Cmgw(_) => Tag::Cmgw,
            Self::Cmt(_) => Tag::Cmt,
            Self::Cds(_) => Tag::Cds,
            Self::Mbau(_) => Tag::Mbau,
            Self::Ctzv(_) => Tag::Ctzv,
        })
    }

    /// Name of the active variant, for logs
    pub fn what(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Ring => "RING",
            Self::SmsPrompt => "SmsPrompt",
            Self::Text(_) => "Text",
            Self::ParseError { .. } => "ParseError",
            other => other.tag().map_or("?", Tag::as_str),
        }
    }

    /// True for the `tag` reply and for a `tag` reply that failed to decode
    pub fn holds(&self, tag: Tag) -> bool {
        self.tag() == Some(tag)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// `ERROR` or an extended `+CME ERROR:` / `+CMS ERROR:` report
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::CmeError(_) | Self::CmsError(_))
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError { .. })
    }

    /// True for responses a request can end with: OK or any error report
    pub fn is_final(&self) -> bool {
        self.is_ok() || self.is_error()
    }

    /// List reply of `tag` with no entries
    ///
    /// A modem answers a list query with nothing to list by a bare `OK`.
    pub fn empty_list(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Clcc => Some(Self::Clcc(CallList { calls: Vec::new() })),
            Tag::Ccfcu => Some(Self::Ccfcu(CallForwardList { rules: Vec::new() })),
            Tag::Cgdcont => Some(Self::Cgdcont(PdpContextList {
                contexts: Vec::new(),
            })),
            _ => None,
        }
    }
}

/// Run a payload parser, mapping a rejected payload to `ParseError`
pub(crate) fn decode<T>(
    tag: Tag,
    payload: &str,
    parse: fn(&str) -> Option<T>,
    wrap: fn(T) -> Response,
) -> Response {
    match parse(payload) {
        Some(value) => wrap(value),
        None => {
            warn!(%tag, payload = %escape(payload.as_bytes()), "Cannot parse payload");
            Response::ParseError { tag }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holds_matches_tag_and_parse_error() {
        let csq = Response::Csq(SignalStrength::default());
        assert!(csq.holds(Tag::Csq));
        assert!(!csq.holds(Tag::Clcc));

        let broken = Response::ParseError { tag: Tag::Csq };
        assert!(broken.holds(Tag::Csq));
        assert!(broken.is_parse_error());
    }

    #[test]
    fn test_control_tokens_have_no_tag() {
        assert_eq!(Response::Ok.tag(), None);
        assert_eq!(Response::Text("x".into()).tag(), None);
        assert!(!Response::Ok.holds(Tag::Cpin));
    }

    #[test]
    fn test_empty_list_only_for_list_tags() {
        let calls = Response::empty_list(Tag::Clcc).unwrap();
        assert!(matches!(calls, Response::Clcc(ref list) if list.calls.is_empty()));
        assert!(Response::empty_list(Tag::Cgdcont).is_some_and(|r| r.holds(Tag::Cgdcont)));
        assert!(Response::empty_list(Tag::Csq).is_none());
        assert!(Response::empty_list(Tag::Cops).is_none());
    }

    #[test]
    fn test_what() {
        assert_eq!(Response::Ok.what(), "OK");
        assert_eq!(Response::Cpin(SimState::Ready).what(), "CPIN");
        assert_eq!(Response::CmeError(CmeCode::SimBusy).what(), "CME ERROR");
        assert_eq!(Response::ParseError { tag: Tag::Cfun }.what(), "ParseError");
    }

    #[test]
    fn test_error_classification() {
        assert!(Response::Error.is_error());
        assert!(Response::CmsError("500".into()).is_error());
        assert!(Response::Ok.is_final());
        assert!(!Response::Ring.is_final());
    }

    #[test]
    fn test_decode_rejected_payload() {
        let r = decode(Tag::Cpin, "BROKEN", SimState::parse, Response::Cpin);
        assert_eq!(r, Response::ParseError { tag: Tag::Cpin });

        let r = decode(Tag::Cpin, "READY", SimState::parse, Response::Cpin);
        assert_eq!(r, Response::Cpin(SimState::Ready));
    }

    #[test]
    fn test_serialize_json() {
        let json = serde_json::to_string(&Response::Cfun(true)).unwrap();
        assert_eq!(json, r#"{"kind":"Cfun","value":true}"#);

        let json = serde_json::to_string(&Response::ParseError { tag: Tag::Csq }).unwrap();
        assert_eq!(json, r#"{"kind":"ParseError","value":{"tag":"CSQ"}}"#);

        let json = serde_json::to_string(&Response::Ok).unwrap();
        assert_eq!(json, r#"{"kind":"Ok"}"#);
    }
}
