//! Packet data payloads: PDP contexts and their dynamic parameters

use serde::Serialize;

use crate::at::cursor::Cursor;

/// One `+CGDCONT:` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdpContext {
    pub cid: i32,
    pub pdp_type: String,
    pub apn: String,
    pub address: String,
    pub d_comp: i32,
    pub h_comp: i32,
}

/// `+CGDCONT:` defined contexts (multi-line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdpContextList {
    pub contexts: Vec<PdpContext>,
}

impl PdpContextList {
    /// `+CGDCONT: <cid>,"<type>","<apn>",<addr>,<d_comp>,<h_comp>\r` per context
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let mut contexts = Vec::new();

        while c.has_more() {
            c.skip_str("+CGDCONT:")?;
            c.skip_if(' ');
            let cid = c.int()?;
            c.skip(',')?;
            let pdp_type = c.quoted()?.to_string();
            c.skip(',')?;
            let apn = c.quoted()?.to_string();
            c.skip(',')?;
            let address = c.until(',')?.to_string();
            let d_comp = c.int()?;
            c.skip(',')?;
            let h_comp = c.int()?;
            c.skip_if(' ');
            c.skip('\r')?;

            contexts.push(PdpContext {
                cid,
                pdp_type,
                apn,
                address,
                d_comp,
                h_comp,
            });
        }

        Some(Self { contexts })
    }
}

/// `+CGCONTRDP:` dynamic parameters of an active context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdpContextParams {
    pub cid: i32,
    pub bearer: i32,
    pub apn: String,
    pub local_address: String,
    /// Prefix length, 0 when the modem did not report one
    pub local_prefix_len: i32,
    pub gateway: String,
    pub dns: String,
}

impl PdpContextParams {
    /// `<cid>,<bearer>,"<apn>",<local>[/<prefix>],<gw>,<dns...>`
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let cid = c.int()?;
        c.skip(',')?;
        let bearer = c.int()?;
        c.skip(',')?;
        let apn = c.quoted()?.to_string();
        c.skip(',')?;
        let local = c.until(',')?;
        let gateway = c.until(',')?.to_string();
        let dns = c.rest().to_string();

        let (local_address, local_prefix_len) = split_prefix(local).unwrap_or((local, 0));

        Some(Self {
            cid,
            bearer,
            apn,
            local_address: local_address.to_string(),
            local_prefix_len,
            gateway,
            dns,
        })
    }
}

fn split_prefix(address: &str) -> Option<(&str, i32)> {
    let mut c = Cursor::new(address);
    let addr = c.until('/')?;
    let len = c.int()?;
    c.finish()?;
    Some((addr, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cgdcont_lines() {
        let payload = "+CGDCONT: 1,\"IPV6\",\"fast.t-mobile.com\",,0,0\r\
                       +CGDCONT: 2,\"IP\",\"ims\",10.0.0.1,0,0\r";
        let list = PdpContextList::parse(payload).unwrap();
        assert_eq!(list.contexts.len(), 2);
        assert_eq!(list.contexts[0].apn, "fast.t-mobile.com");
        assert!(list.contexts[0].address.is_empty());
        assert_eq!(list.contexts[1].address, "10.0.0.1");
    }

    #[test]
    fn test_cgcontrdp_with_prefix() {
        let p = PdpContextParams::parse("1,5,\"epc.tmobile.com\",10.0.2.15/24,10.0.2.2,10.0.2.3")
            .unwrap();
        assert_eq!(p.local_address, "10.0.2.15");
        assert_eq!(p.local_prefix_len, 24);
        assert_eq!(p.gateway, "10.0.2.2");
        assert_eq!(p.dns, "10.0.2.3");
    }

    #[test]
    fn test_cgcontrdp_without_prefix() {
        let p = PdpContextParams::parse("1,5,\"epc.tmobile.com\",10.0.2.15,10.0.2.2,10.0.2.3")
            .unwrap();
        assert_eq!(p.local_address, "10.0.2.15");
        assert_eq!(p.local_prefix_len, 0);
    }

    #[test]
    fn test_cgcontrdp_rejects_short() {
        assert!(PdpContextParams::parse("1,5").is_none());
    }
}
