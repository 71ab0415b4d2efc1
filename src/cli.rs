//! Command-line interface definition using clap
//!
//! Provides structured argument parsing with automatic help generation.

use std::path::PathBuf;

use at_modem::config::{Config, DeviceKind};
use clap::{Parser, Subcommand, ValueEnum};

// =============================================================================
// CLI Definition
// =============================================================================

/// AT channel of a virtual cellular modem
#[derive(Parser, Debug, Default)]
#[command(name = "modem-emu")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output (shows AT traffic)
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (default: modem.toml next to the executable)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Modem device path (overrides config and AT_MODEM_DEVICE)
    #[arg(long, value_name = "PATH")]
    pub device: Option<String>,

    /// How the device is opened (overrides config)
    #[arg(long, value_enum, value_name = "KIND")]
    pub kind: Option<KindArg>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the channel until SIGINT/SIGTERM, logging unsolicited traffic (default)
    Run,

    /// Send one AT command and print the reply
    Send {
        /// Command line without the trailing CR, e.g. AT+CSQ
        command: String,

        /// Print responses as JSON
        #[arg(long)]
        json: bool,

        /// Reply timeout (default: channel.request_timeout_ms)
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Query registration, radio power and signal strength
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Device kind as given on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Serial,
    File,
    Unix,
}

impl From<KindArg> for DeviceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Serial => DeviceKind::Serial,
            KindArg::File => DeviceKind::File,
            KindArg::Unix => DeviceKind::Unix,
        }
    }
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply(&self, config: &mut Config) {
        config.override_device_path(self.device.clone());
        if let Some(kind) = self.kind {
            config.device.kind = kind.into();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["modem-emu"]);
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_verbose() {
        let cli = Cli::parse_from(["modem-emu", "-v"]);
        assert!(cli.verbose);

        let cli = Cli::parse_from(["modem-emu", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_send() {
        let cli = Cli::parse_from(["modem-emu", "send", "AT+CSQ", "--json", "--timeout-ms", "500"]);
        assert_eq!(
            cli.command,
            Some(Command::Send {
                command: "AT+CSQ".into(),
                json: true,
                timeout_ms: Some(500),
            })
        );
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["modem-emu", "status"]);
        assert_eq!(cli.command, Some(Command::Status { json: false }));
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["modem-emu", "--kind", "tcp"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["modem-emu", "--device", "/tmp/modem.sock", "--kind", "unix"]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.device.path, "/tmp/modem.sock");
        assert_eq!(config.device.kind, DeviceKind::Unix);
    }
}
