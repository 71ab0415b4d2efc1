//! Network payloads: registration, operator, signal strength, time zone

use serde::Serialize;

use crate::at::cursor::{unquote, Cursor};

/// Value of a signal strength field the modem did not report
pub const UNKNOWN: i32 = i32::MAX;

// =============================================================================
// Registration (+CREG / +CGREG / +CEREG)
// =============================================================================

/// 3GPP registration status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegState {
    NotRegistered,
    Home,
    Searching,
    Denied,
    Unknown,
    Roaming,
}

impl RegState {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::NotRegistered,
            1 => Self::Home,
            2 => Self::Searching,
            3 => Self::Denied,
            4 => Self::Unknown,
            5 => Self::Roaming,
            _ => return None,
        })
    }

    pub fn is_registered(self) -> bool {
        matches!(self, Self::Home | Self::Roaming)
    }
}

/// Registration report, shared by the CS, GPRS and EPS variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub state: RegState,
    /// Location/tracking area code
    pub area_code: Option<i32>,
    pub cell_id: Option<i32>,
    /// Access technology
    pub network_type: Option<i32>,
}

impl Registration {
    /// Accepts `<stat>`, `<n>,<stat>`, `<stat>,"<lac>","<ci>",<act>` and
    /// `<n>,<stat>,"<lac>","<ci>",<act>`
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let commas = payload.matches(',').count();

        if commas == 1 || commas == 4 {
            let _unsol_mode = c.int()?;
            c.skip(',')?;
        }
        let state = RegState::from_code(c.int()?)?;

        let mut registration = Self {
            state,
            area_code: None,
            cell_id: None,
            network_type: None,
        };

        match commas {
            0 | 1 => {}
            3 | 4 => {
                c.skip(',')?;
                let area_code = c.quoted()?;
                c.skip(',')?;
                let cell_id = c.quoted()?;
                c.skip(',')?;
                registration.network_type = Some(c.int()?);
                registration.area_code = Cursor::new(area_code).hex_int();
                registration.cell_id = Cursor::new(cell_id).hex_int();
            }
            _ => return None,
        }

        c.finish()?;
        Some(registration)
    }
}

// =============================================================================
// Radio technology (+CTEC)
// =============================================================================

/// Modem technology family, by bit position in the CTEC bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModemTechnology {
    Gsm,
    Wcdma,
    Cdma,
    Evdo,
    Tdscdma,
    Lte,
    Nr,
}

impl ModemTechnology {
    const ALL: [Self; 7] = [
        Self::Gsm,
        Self::Wcdma,
        Self::Cdma,
        Self::Evdo,
        Self::Tdscdma,
        Self::Lte,
        Self::Nr,
    ];

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Lowest technology whose bit is set in `mask`
    pub fn from_bitmask(mask: i32) -> Option<Self> {
        Self::ALL
            .iter()
            .enumerate()
            .find(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, tech)| *tech)
    }
}

/// `+CTEC:` reply
///
/// One of: `current,preferred_mask` / a list of supported values /
/// `current` / `DONE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ctec {
    pub values: Vec<String>,
}

impl Ctec {
    pub fn parse(payload: &str) -> Option<Self> {
        Some(Self {
            values: payload.split(',').map(str::to_string).collect(),
        })
    }

    pub fn is_done(&self) -> bool {
        self.values.len() == 1 && self.values[0] == "DONE"
    }

    pub fn current_technology(&self) -> Option<ModemTechnology> {
        if self.values.is_empty() || self.values.len() > 2 || self.is_done() {
            return None;
        }
        let mask: i32 = self.values[0].parse().ok()?;
        ModemTechnology::from_bitmask(mask)
    }
}

// =============================================================================
// Operator (+COPS)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionMode {
    Automatic,
    Manual,
    Deregister,
    SetFormat,
    ManualAutomatic,
}

impl SelectionMode {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Automatic,
            1 => Self::Manual,
            2 => Self::Deregister,
            3 => Self::SetFormat,
            4 => Self::ManualAutomatic,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperatorState {
    Unknown,
    Available,
    Current,
    Forbidden,
}

impl OperatorState {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Unknown,
            1 => Self::Available,
            2 => Self::Current,
            3 => Self::Forbidden,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorInfo {
    pub state: OperatorState,
    pub long_name: String,
    pub short_name: String,
    pub numeric: String,
}

impl OperatorInfo {
    pub fn mcc(&self) -> &str {
        self.numeric.get(..3).unwrap_or(&self.numeric)
    }

    pub fn mnc(&self) -> &str {
        self.numeric.get(3..).unwrap_or("")
    }
}

/// `+COPS:` reply (multi-line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cops {
    pub operators: Vec<OperatorInfo>,
    pub numeric: String,
    pub selection_mode: SelectionMode,
}

impl Cops {
    /// Payload still carries the `+COPS:` prefix of every line.
    ///
    /// ```text
    /// +COPS: 0,0,long\r+COPS: 0,1,short\r+COPS: 0,2,numeric\r
    /// +COPS: (stat,long,short,numeric),(...)\r
    /// +COPS: mode,2,numeric\r
    /// +COPS: mode,0,0\r
    /// ```
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        c.skip_str("+COPS:")?;
        c.skip_ws();

        let mut cops = Self {
            operators: Vec::new(),
            numeric: String::new(),
            selection_mode: SelectionMode::Automatic,
        };

        if c.peek() == Some('(') {
            loop {
                c.skip('(')?;
                let state = OperatorState::from_code(c.int()?)?;
                c.skip(',')?;
                let long_name = unquote(c.until(',')?).to_string();
                let short_name = unquote(c.until(',')?).to_string();
                let numeric = unquote(c.until(')')?).to_string();
                cops.operators.push(OperatorInfo {
                    state,
                    long_name,
                    short_name,
                    numeric,
                });
                if !c.skip_if(',') {
                    break;
                }
            }
            return Some(cops);
        }

        let mode = SelectionMode::from_code(c.int()?)?;
        c.skip(',')?;
        let format = c.int()?;
        c.skip(',')?;
        let first = unquote(c.until('\r')?).to_string();
        cops.selection_mode = mode;

        match format {
            2 if c.is_done() => {
                cops.numeric = first;
                Some(cops)
            }
            0 if first == "0" && c.is_done() => Some(cops),
            0 => {
                c.skip_str("+COPS:")?;
                c.skip_ws().skip_str("0,1,")?;
                let short_name = unquote(c.until('\r')?).to_string();
                c.skip_str("+COPS:")?;
                c.skip_ws().skip_str("0,2,")?;
                let numeric = unquote(c.until('\r')?).to_string();
                c.finish()?;
                cops.operators.push(OperatorInfo {
                    state: OperatorState::Current,
                    long_name: first,
                    short_name,
                    numeric,
                });
                Some(cops)
            }
            _ => None,
        }
    }
}

// =============================================================================
// CDMA roaming preference (+WRMP)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CdmaRoamingType {
    HomeNetwork,
    AffiliatedRoam,
    AnyRoam,
}

impl CdmaRoamingType {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let code = c.int()?;
        c.finish()?;
        Some(match code {
            0 => Self::HomeNetwork,
            1 => Self::AffiliatedRoam,
            2 => Self::AnyRoam,
            _ => return None,
        })
    }
}

// =============================================================================
// Signal strength (+CSQ)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GsmSignal {
    pub signal_strength: i32,
    pub bit_error_rate: i32,
    pub timing_advance: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CdmaSignal {
    pub dbm: i32,
    pub ecio: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvdoSignal {
    pub dbm: i32,
    pub ecio: i32,
    pub signal_noise_ratio: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LteSignal {
    pub signal_strength: i32,
    pub rsrp: i32,
    pub rsrq: i32,
    pub rssnr: i32,
    pub cqi: i32,
    pub timing_advance: i32,
    pub cqi_table_index: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TdscdmaSignal {
    pub signal_strength: i32,
    pub bit_error_rate: i32,
    pub rscp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WcdmaSignal {
    pub signal_strength: i32,
    pub bit_error_rate: i32,
    pub rscp: i32,
    pub ecno: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NrSignal {
    pub ss_rsrp: i32,
    pub ss_rsrq: i32,
    pub ss_sinr: i32,
    pub csi_rsrp: i32,
    pub csi_rsrq: i32,
    pub csi_sinr: i32,
    pub csi_cqi_table_index: i32,
    pub timing_advance: i32,
}

/// `+CSQ:` reply, per radio technology
///
/// Fields the modem does not report hold [`UNKNOWN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalStrength {
    pub gsm: GsmSignal,
    pub cdma: CdmaSignal,
    pub evdo: EvdoSignal,
    pub lte: LteSignal,
    pub tdscdma: TdscdmaSignal,
    pub wcdma: WcdmaSignal,
    pub nr: NrSignal,
}

impl Default for SignalStrength {
    fn default() -> Self {
        Self {
            gsm: GsmSignal {
                signal_strength: UNKNOWN,
                bit_error_rate: UNKNOWN,
                timing_advance: UNKNOWN,
            },
            cdma: CdmaSignal {
                dbm: UNKNOWN,
                ecio: UNKNOWN,
            },
            evdo: EvdoSignal {
                dbm: UNKNOWN,
                ecio: UNKNOWN,
                signal_noise_ratio: UNKNOWN,
            },
            lte: LteSignal {
                signal_strength: UNKNOWN,
                rsrp: UNKNOWN,
                rsrq: UNKNOWN,
                rssnr: UNKNOWN,
                cqi: UNKNOWN,
                timing_advance: UNKNOWN,
                cqi_table_index: UNKNOWN,
            },
            tdscdma: TdscdmaSignal {
                signal_strength: UNKNOWN,
                bit_error_rate: UNKNOWN,
                rscp: UNKNOWN,
            },
            wcdma: WcdmaSignal {
                signal_strength: UNKNOWN,
                bit_error_rate: UNKNOWN,
                rscp: UNKNOWN,
                ecno: UNKNOWN,
            },
            nr: NrSignal {
                ss_rsrp: UNKNOWN,
                ss_rsrq: UNKNOWN,
                ss_sinr: UNKNOWN,
                csi_rsrp: UNKNOWN,
                csi_rsrq: UNKNOWN,
                csi_sinr: UNKNOWN,
                csi_cqi_table_index: UNKNOWN,
                timing_advance: UNKNOWN,
            },
        }
    }
}

impl SignalStrength {
    const MAX_VALUES: usize = 22;

    /// 12, 13, 14 or 22 comma separated integers
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let mut v = Vec::with_capacity(Self::MAX_VALUES);
        v.push(c.int()?);
        while c.has_more() && v.len() < Self::MAX_VALUES {
            c.skip(',')?;
            v.push(c.int()?);
        }
        c.finish()?;

        let mut s = Self::default();
        if v.len() == 22 {
            s.wcdma.signal_strength = v[14];
            if v[14] != UNKNOWN {
                s.wcdma.rscp = 42;
                s.wcdma.ecno = 19;
            }
            s.wcdma.bit_error_rate = v[15];
            s.nr.ss_rsrp = v[16];
            s.nr.ss_rsrq = v[17];
            s.nr.ss_sinr = v[18];
            s.nr.csi_rsrp = v[19];
            s.nr.csi_rsrq = v[20];
            s.nr.csi_sinr = v[21];
        }
        if v.len() >= 14 {
            s.tdscdma.rscp = v[13];
        }
        if v.len() >= 13 {
            s.lte.timing_advance = v[12];
        }
        match v.len() {
            12 | 13 | 14 | 22 => {
                s.gsm.signal_strength = v[0];
                s.gsm.bit_error_rate = v[1];
                s.cdma.dbm = v[2];
                s.cdma.ecio = v[3];
                s.evdo.dbm = v[4];
                s.evdo.ecio = v[5];
                s.evdo.signal_noise_ratio = v[6];
                s.lte.signal_strength = v[7];
                s.lte.rsrp = v[8];
                s.lte.rsrq = v[9];
                s.lte.rssnr = v[10];
                s.lte.cqi = v[11];
                Some(s)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Network time (%CTZV)
// =============================================================================

/// `%CTZV:` network time and zone, e.g. `24/11/05:17:01:32-32:0:America!Los_Angeles`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkTime {
    pub tz_name: String,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Offset from UTC in quarters of an hour
    pub tz_offset_15m: i8,
    pub daylight_saving: bool,
}

impl NetworkTime {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        c.skip_ws();
        let yy = c.int()?;
        c.skip('/')?;
        let month = c.int()?;
        c.skip('/')?;
        let day = c.int()?;
        c.skip(':')?;
        let hour = c.int()?;
        c.skip(':')?;
        let minute = c.int()?;
        c.skip(':')?;
        let second = c.int()?;
        let sign = c.char()?;
        let offset = c.int()?;
        c.skip(':')?;
        let daylight = c.char()?;
        c.skip(':')?;

        let tz_offset_15m = match sign {
            '+' => offset,
            '-' => offset.checked_neg()?,
            _ => return None,
        };

        Some(Self {
            tz_name: c.rest().to_string(),
            year: u16::try_from(yy.checked_add(2000)?).ok()?,
            month: u8::try_from(month).ok()?,
            day: u8::try_from(day).ok()?,
            hour: u8::try_from(hour).ok()?,
            minute: u8::try_from(minute).ok()?,
            second: u8::try_from(second).ok()?,
            tz_offset_15m: i8::try_from(tz_offset_15m).ok()?,
            daylight_saving: daylight != '0',
        })
    }

    /// NITZ string as reported to the telephony stack
    pub fn nitz_string(&self) -> String {
        format!(
            "{:02}/{:02}/{:02}:{:02}:{:02}:{:02}{:+}:{}:{}",
            self.year % 100,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.tz_offset_15m,
            u8::from(self.daylight_saving),
            self.tz_name
        )
    }

    /// Local time as a calendar value, if the fields form a valid date
    pub fn local_datetime(&self) -> Option<chrono::NaiveDateTime> {
        chrono::NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }
}

// =============================================================================
// Physical channel config (%CGFPCCFG)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellConnectionStatus {
    None,
    PrimaryServing,
    SecondaryServing,
}

/// `%CGFPCCFG: <status>,<bandwidth>,<tech>,<freq>,<cid>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhysicalChannelConfig {
    pub status: CellConnectionStatus,
    pub bandwidth: i32,
    pub technology: ModemTechnology,
    pub frequency: i32,
    pub context_id: i32,
}

impl PhysicalChannelConfig {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut c = Cursor::new(payload);
        let status = c.int()?;
        c.skip(',')?;
        let bandwidth = c.int()?;
        c.skip(',')?;
        let technology = ModemTechnology::from_index(c.int()?)?;
        c.skip(',')?;
        let frequency = c.int()?;
        c.skip(',')?;
        let context_id = c.int()?;
        c.finish()?;

        let status = match status {
            0 => CellConnectionStatus::None,
            1 => CellConnectionStatus::PrimaryServing,
            2 => CellConnectionStatus::SecondaryServing,
            _ => return None,
        };

        Some(Self {
            status,
            bandwidth,
            technology,
            frequency,
            context_id,
        })
    }
}
