//! Logging helpers
//!
//! - `init_tracing` - install the process-wide subscriber
//! - `escape` - render wire bytes with line terminators visible
//! - `traffic` - trace one chunk of modem traffic

use std::fmt::Write as _;

/// Direction of modem traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,  // Modem -> Host
    Out, // Host -> Modem
}

impl Direction {
    fn arrow(self) -> &'static str {
        match self {
            Self::In => "<<",
            Self::Out => ">>",
        }
    }
}

/// Initialize tracing for channel debug output
///
/// Call early in main() before any logging occurs.
/// `verbose` forces debug-level output; otherwise `level` is used as the
/// filter directive (e.g. `"info"` or `"at_modem=debug"`).
pub fn init_tracing(verbose: bool, level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { level };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(tracing_subscriber::EnvFilter::new(level))
        .try_init();
}

/// Printable form of wire bytes: `\r`, `\n` and other control or non-ASCII
/// bytes are escaped
pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\r' => out.push_str("\\r"),
            b'\n' => out.push_str("\\n"),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out
}

/// Trace a chunk of traffic at debug level
pub fn traffic(direction: Direction, bytes: &[u8]) {
    tracing::debug!("{} {}", direction.arrow(), escape(bytes));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_terminators() {
        assert_eq!(escape(b"+CSQ: 1\rOK\r"), "+CSQ: 1\\rOK\\r");
        assert_eq!(escape(b"a\nb"), "a\\nb");
    }

    #[test]
    fn test_escape_binary() {
        assert_eq!(escape(&[0x00, 0xff, b'A']), "\\x00\\xffA");
        assert_eq!(escape(b"\\"), "\\\\");
    }

    #[test]
    fn test_direction_arrow() {
        assert_eq!(Direction::In.arrow(), "<<");
        assert_eq!(Direction::Out.arrow(), ">>");
    }
}
