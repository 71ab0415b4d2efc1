//! Command tags
//!
//! A tag is the command name that follows the sigil of a structured reply,
//! e.g. `CREG` in `+CREG: 2`. Tags identify responses for routing and name
//! the command whose payload failed to parse.

use serde::{Serialize, Serializer};
use std::fmt;

/// Identifying tag of a structured response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    CmeError,
    CmsError,
    Cpin,
    Cpinr,
    Crsm,
    Cfun,
    Creg,
    Cgreg,
    Cereg,
    Ctec,
    Cops,
    Wrmp,
    Ccss,
    Csq,
    Clcc,
    Ccfcu,
    Ccwa,
    Cgdcont,
    Cgcontrdp,
    Cgfpccfg,
    Cusatd,
    Cusatp,
    Cusate,
    Cusatt,
    Cusatend,
    Clck,
    Csim,
    Cchc,
    Clip,
    Clir,
    Cmut,
    Wsos,
    Csca,
    Cscb,
    Cmgs,
    Cmgw,
    Cmt,
    Cds,
    Mbau,
    Ctzv,
}

impl Tag {
    /// Tag text as it appears on the wire, without sigil
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CmeError => "CME ERROR",
            Self::CmsError => "CMS ERROR",
            Self::Cpin => "CPIN",
            Self::Cpinr => "CPINR",
            Self::Crsm => "CRSM",
            Self::Cfun => "CFUN",
            Self::Creg => "CREG",
            Self::Cgreg => "CGREG",
            Self::Cereg => "CEREG",
            Self::Ctec => "CTEC",
            Self::Cops => "COPS",
            Self::Wrmp => "WRMP",
            Self::Ccss => "CCSS",
            Self::Csq => "CSQ",
            Self::Clcc => "CLCC",
            Self::Ccfcu => "CCFCU",
            Self::Ccwa => "CCWA",
            Self::Cgdcont => "CGDCONT",
            Self::Cgcontrdp => "CGCONTRDP",
            Self::Cgfpccfg => "CGFPCCFG",
            Self::Cusatd => "CUSATD",
            Self::Cusatp => "CUSATP",
            Self::Cusate => "CUSATE",
            Self::Cusatt => "CUSATT",
            Self::Cusatend => "CUSATEND",
            Self::Clck => "CLCK",
            Self::Csim => "CSIM",
            Self::Cchc => "CCHC",
            Self::Clip => "CLIP",
            Self::Clir => "CLIR",
            Self::Cmut => "CMUT",
            Self::Wsos => "WSOS",
            Self::Csca => "CSCA",
            Self::Cscb => "CSCB",
            Self::Cmgs => "CMGS",
            Self::Cmgw => "CMGW",
            Self::Cmt => "CMT",
            Self::Cds => "CDS",
            Self::Mbau => "MBAU",
            Self::Ctzv => "CTZV",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
