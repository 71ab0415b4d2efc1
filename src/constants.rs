//! Application-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency.

// =============================================================================
// Wire format
// =============================================================================

/// Line terminator appended to every outbound request
pub const LINE_TERMINATOR: u8 = b'\r';

/// Terminator of multi-line and free-text replies
pub const OK_TERMINATOR: &str = "\rOK\r";

// =============================================================================
// Timing - Conversation
// =============================================================================

/// Default time a request waits for its reply (milliseconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3000;

// =============================================================================
// Timing - Reconnection
// =============================================================================

/// Delay between device open attempts (milliseconds)
pub const RECONNECT_DELAY_MS: u64 = 2000;

/// Device open attempts before the channel gives up
pub const MAX_OPEN_ATTEMPTS: u32 = 5;

/// Read timeout used to poll the reader stop flag (milliseconds)
pub const READ_POLL_TIMEOUT_MS: u64 = 50;

// =============================================================================
// Buffers
// =============================================================================

/// Reader chunk size
pub const READ_CHUNK_SIZE: usize = 1024;

/// Longest excerpt of unparsable input kept in a desync report
pub const DESYNC_EXCERPT_LEN: usize = 64;

// =============================================================================
// Serial
// =============================================================================

/// Default baud rate for serial modems
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Consecutive zero-byte reads before assuming the link is gone
pub const ZERO_READ_DISCONNECT_THRESHOLD: u32 = 10;

// =============================================================================
// Device selection
// =============================================================================

/// Default modem device path (QEMU virtual modem port)
pub const DEFAULT_DEVICE_PATH: &str = "/dev/hvc2";

/// Environment variable overriding the configured device path
pub const DEVICE_ENV_VAR: &str = "AT_MODEM_DEVICE";

// =============================================================================
// Initialization
// =============================================================================

/// Commands run every time the link is (re)opened
///
/// Echo off, verbose result codes, numeric CME errors, registration change
/// notifications with location, call waiting, hex character set and PDU SMS.
pub const DEFAULT_INIT_SEQUENCE: &[&str] = &[
    "ATE0Q0V1",
    "AT+CMEE=1",
    "AT+CREG=2",
    "AT+CGREG=2",
    "AT+CEREG=2",
    "AT+CCWA=1",
    "AT+CMOD=0",
    "AT+CMUT=0",
    "AT+CSSN=0,1",
    "AT+COLP=0",
    "AT+CSCS=\"HEX\"",
    "AT+CUSD=1",
    "AT+CGEREP=1,0",
    "AT+CMGF=0",
    "AT+CFUN?",
];
