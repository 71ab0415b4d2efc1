//! Response type registry
//!
//! One ordered table per sigil. The parser scans a table linearly and takes
//! the first entry whose tag is followed by `:` or `\r`, so when one tag is a
//! prefix of another (`CPIN`/`CPINR`, `CUSATE`/`CUSATEND`) the delimiter check
//! is what keeps them apart. Two tags that could both match the same text
//! would be resolved by table order; no such pair exists today and the tests
//! below keep it that way.

use super::payload::*;
use super::response::{decode, Response};
use super::Tag;

/// How to recognize and decode one structured reply
#[derive(Debug, Clone, Copy)]
pub struct TagSpec {
    pub tag: Tag,
    /// Payload spans several `+TAG:` lines terminated by `\rOK\r`
    pub multiline: bool,
    pub parse: fn(&str) -> Response,
}

const fn single(tag: Tag, parse: fn(&str) -> Response) -> TagSpec {
    TagSpec {
        tag,
        multiline: false,
        parse,
    }
}

const fn multi(tag: Tag, parse: fn(&str) -> Response) -> TagSpec {
    TagSpec {
        tag,
        multiline: true,
        parse,
    }
}

static PLUS: &[TagSpec] = &[
    single(Tag::Cpin, |p| decode(Tag::Cpin, p, SimState::parse, Response::Cpin)),
    single(Tag::Cpinr, |p| decode(Tag::Cpinr, p, PinRetries::parse, Response::Cpinr)),
    single(Tag::Crsm, |p| decode(Tag::Crsm, p, SimIoResult::parse, Response::Crsm)),
    single(Tag::Cfun, |p| decode(Tag::Cfun, p, parse_flag, Response::Cfun)),
    single(Tag::Creg, |p| decode(Tag::Creg, p, Registration::parse, Response::Creg)),
    single(Tag::Cereg, |p| decode(Tag::Cereg, p, Registration::parse, Response::Cereg)),
    single(Tag::Cgreg, |p| decode(Tag::Cgreg, p, Registration::parse, Response::Cgreg)),
    single(Tag::Ctec, |p| decode(Tag::Ctec, p, Ctec::parse, Response::Ctec)),
    multi(Tag::Cops, |p| decode(Tag::Cops, p, Cops::parse, Response::Cops)),
    single(Tag::Wrmp, |p| decode(Tag::Wrmp, p, CdmaRoamingType::parse, Response::Wrmp)),
    single(Tag::Ccss, |p| {
        decode(Tag::Ccss, p, CdmaSubscriptionSource::parse, Response::Ccss)
    }),
    single(Tag::Csq, |p| decode(Tag::Csq, p, SignalStrength::parse, Response::Csq)),
    multi(Tag::Clcc, |p| decode(Tag::Clcc, p, CallList::parse, Response::Clcc)),
    multi(Tag::Ccfcu, |p| decode(Tag::Ccfcu, p, CallForwardList::parse, Response::Ccfcu)),
    single(Tag::Ccwa, |p| decode(Tag::Ccwa, p, CallWaiting::parse, Response::Ccwa)),
    single(Tag::Cusatd, |p| decode(Tag::Cusatd, p, StkProfileState::parse, Response::Cusatd)),
    single(Tag::Cusatp, |p| Response::Cusatp(p.to_string())),
    single(Tag::Cusate, |p| Response::Cusate(p.to_string())),
    single(Tag::Cusatt, |p| {
        decode(Tag::Cusatt, p, StkTerminalResponse::parse, Response::Cusatt)
    }),
    single(Tag::Cusatend, |_| Response::Cusatend),
    multi(Tag::Cgdcont, |p| decode(Tag::Cgdcont, p, PdpContextList::parse, Response::Cgdcont)),
    single(Tag::Cgcontrdp, |p| {
        decode(Tag::Cgcontrdp, p, PdpContextParams::parse, Response::Cgcontrdp)
    }),
    single(Tag::Clck, |p| decode(Tag::Clck, p, FacilityLock::parse, Response::Clck)),
    single(Tag::Csim, |p| decode(Tag::Csim, p, SimAccess::parse, Response::Csim)),
    single(Tag::Cchc, |_| Response::Cchc),
    single(Tag::Clip, |p| decode(Tag::Clip, p, Clip::parse, Response::Clip)),
    single(Tag::Clir, |p| decode(Tag::Clir, p, Clir::parse, Response::Clir)),
    single(Tag::Cmut, |p| decode(Tag::Cmut, p, parse_flag, Response::Cmut)),
    single(Tag::Wsos, |p| decode(Tag::Wsos, p, parse_flag, Response::Wsos)),
    single(Tag::Csca, |p| decode(Tag::Csca, p, ServiceCenter::parse, Response::Csca)),
    single(Tag::Cscb, |p| decode(Tag::Cscb, p, BroadcastConfig::parse, Response::Cscb)),
    single(Tag::Cmgs, |p| decode(Tag::Cmgs, p, MessageRef::parse, Response::Cmgs)),
    single(Tag::Cmgw, |p| decode(Tag::Cmgw, p, MessageRef::parse, Response::Cmgw)),
    single(Tag::CmeError, |p| decode(Tag::CmeError, p, CmeCode::parse, Response::CmeError)),
    single(Tag::CmsError, |p| Response::CmsError(p.to_string())),
];

static PERCENT: &[TagSpec] = &[
    single(Tag::Ctzv, |p| decode(Tag::Ctzv, p, NetworkTime::parse, Response::Ctzv)),
    single(Tag::Cgfpccfg, |p| {
        decode(Tag::Cgfpccfg, p, PhysicalChannelConfig::parse, Response::Cgfpccfg)
    }),
];

static CARET: &[TagSpec] = &[single(Tag::Mbau, |p| {
    decode(Tag::Mbau, p, SimAuth::parse, Response::Mbau)
})];

/// Table for a sigil byte, if it is one
pub fn table(sigil: u8) -> Option<&'static [TagSpec]> {
    match sigil {
        b'+' => Some(PLUS),
        b'%' => Some(PERCENT),
        b'^' => Some(CARET),
        _ => None,
    }
}

/// Every registered entry with its sigil
pub fn entries() -> impl Iterator<Item = (char, &'static TagSpec)> {
    PLUS.iter()
        .map(|spec| ('+', spec))
        .chain(PERCENT.iter().map(|spec| ('%', spec)))
        .chain(CARET.iter().map(|spec| ('^', spec)))
}

/// Registered entry for `tag`
pub fn lookup(tag: Tag) -> Option<&'static TagSpec> {
    entries().map(|(_, spec)| spec).find(|spec| spec.tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tags_are_unique() {
        let mut seen = HashSet::new();
        for (_, spec) in entries() {
            assert!(seen.insert(spec.tag), "duplicate tag {}", spec.tag);
        }
        assert_eq!(seen.len(), 38);
    }

    #[test]
    fn test_multiline_tags() {
        let multiline: Vec<Tag> = entries()
            .filter(|(_, spec)| spec.multiline)
            .map(|(_, spec)| spec.tag)
            .collect();
        assert_eq!(multiline, vec![Tag::Cops, Tag::Clcc, Tag::Ccfcu, Tag::Cgdcont]);
    }

    #[test]
    fn test_prefix_pairs_are_known() {
        // Every pair where one tag is a prefix of another within a table
        let mut pairs = Vec::new();
        for sigil in [b'+', b'%', b'^'] {
            let specs = table(sigil).unwrap();
            for a in specs {
                for b in specs {
                    let (a, b) = (a.tag.as_str(), b.tag.as_str());
                    if a != b && b.starts_with(a) {
                        pairs.push((a, b));
                    }
                }
            }
        }
        pairs.sort();
        assert_eq!(pairs, vec![("CPIN", "CPINR"), ("CUSATE", "CUSATEND")]);
    }

    #[test]
    fn test_parse_fn_produces_own_tag() {
        for (_, spec) in entries() {
            let response = (spec.parse)("garbage that does not decode");
            if response.tag().is_some() {
                assert!(response.holds(spec.tag), "{} produced {:?}", spec.tag, response);
            }
        }
    }

    #[test]
    fn test_lookup_by_tag() {
        assert!(lookup(Tag::Clcc).is_some_and(|spec| spec.multiline));
        assert!(lookup(Tag::Csq).is_some_and(|spec| !spec.multiline));
        // framed by the parser itself, not through a table
        assert!(lookup(Tag::Cmt).is_none());
    }

    #[test]
    fn test_unknown_sigil() {
        assert!(table(b'#').is_none());
    }
}
