//! Extended error reports: `+CME ERROR:` and `+CMS ERROR:`

use serde::Serialize;

/// Mobile equipment error, from the numeric `+CME ERROR:` code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CmeCode {
    OperationNotAllowed,
    OperationNotSupported,
    SimNotInserted,
    SimPinRequired,
    SimPukRequired,
    SimBusy,
    IncorrectPassword,
    MemoryFull,
    InvalidIndex,
    NotFound,
    InvalidCharacters,
    NoNetworkService,
    EmergencyCallsOnly,
    IncorrectParameters,
    NetworkNotAttached,
    FixedDialingOnly,
    /// Any code without a dedicated variant, verbatim
    Other(String),
}

impl CmeCode {
    /// Never fails: unknown codes are kept as `Other`
    pub fn parse(payload: &str) -> Option<Self> {
        Some(match payload {
            "3" => Self::OperationNotAllowed,
            "4" => Self::OperationNotSupported,
            "10" => Self::SimNotInserted,
            "11" => Self::SimPinRequired,
            "12" => Self::SimPukRequired,
            "14" => Self::SimBusy,
            "16" => Self::IncorrectPassword,
            "20" => Self::MemoryFull,
            "21" => Self::InvalidIndex,
            "22" => Self::NotFound,
            "27" => Self::InvalidCharacters,
            "30" => Self::NoNetworkService,
            "32" => Self::EmergencyCallsOnly,
            "50" => Self::IncorrectParameters,
            "53" => Self::NetworkNotAttached,
            "56" => Self::FixedDialingOnly,
            other => Self::Other(other.to_string()),
        })
    }
}
