//! Configuration management
//!
//! Config file is `modem.toml`, either given on the command line or stored
//! next to the executable. Every section is optional.

use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DEVICE_PATH, DEFAULT_INIT_SEQUENCE, DEFAULT_REQUEST_TIMEOUT_MS,
    DEVICE_ENV_VAR, MAX_OPEN_ATTEMPTS, READ_POLL_TIMEOUT_MS, RECONNECT_DELAY_MS,
};
use crate::error::{ModemError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Config file name looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "modem.toml";

// =============================================================================
// Application Configuration
// =============================================================================

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub channel: ChannelConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Device Configuration
// =============================================================================

/// How the modem device is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// UART or USB serial port, configured with a baud rate
    Serial,
    /// Character device or FIFO opened read-write (e.g. a virtio console)
    #[default]
    File,
    /// Unix domain socket (e.g. a QEMU chardev socket)
    Unix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub kind: DeviceKind,
    /// Device path; overridden by the `AT_MODEM_DEVICE` environment variable
    pub path: String,
    /// Only used when kind = serial
    pub baud_rate: u32,
    /// Read timeout used to poll for shutdown (milliseconds)
    pub read_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            kind: DeviceKind::File,
            path: DEFAULT_DEVICE_PATH.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: READ_POLL_TIMEOUT_MS,
        }
    }
}

impl DeviceConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

// =============================================================================
// Channel Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Time a request waits for its reply (milliseconds)
    pub request_timeout_ms: u64,
    /// Device open attempts before giving up
    pub open_attempts: u32,
    /// Delay between open attempts (milliseconds)
    pub reconnect_delay_ms: u64,
    /// Commands run on every (re)opened link; each must be answered OK
    pub init_sequence: Vec<String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            open_attempts: MAX_OPEN_ATTEMPTS,
            reconnect_delay_ms: RECONNECT_DELAY_MS,
            init_sequence: DEFAULT_INIT_SEQUENCE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChannelConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when not running verbose
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl Config {
    /// Check values that would make the channel unusable
    pub fn validate(&self) -> Result<()> {
        if self.device.path.is_empty() {
            return Err(ModemError::ConfigValidation {
                field: "device.path",
                reason: "must not be empty".into(),
            });
        }
        if self.device.kind == DeviceKind::Serial && self.device.baud_rate == 0 {
            return Err(ModemError::ConfigValidation {
                field: "device.baud_rate",
                reason: "must be positive".into(),
            });
        }
        if self.device.read_timeout_ms == 0 {
            return Err(ModemError::ConfigValidation {
                field: "device.read_timeout_ms",
                reason: "must be positive".into(),
            });
        }
        if self.channel.request_timeout_ms == 0 {
            return Err(ModemError::ConfigValidation {
                field: "channel.request_timeout_ms",
                reason: "must be positive".into(),
            });
        }
        if self.channel.open_attempts == 0 {
            return Err(ModemError::ConfigValidation {
                field: "channel.open_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if let Some(i) = self.channel.init_sequence.iter().position(|c| c.trim().is_empty()) {
            return Err(ModemError::ConfigValidation {
                field: "channel.init_sequence",
                reason: format!("command {} is empty", i),
            });
        }
        Ok(())
    }

    /// Replace the device path if `path` is set and not empty
    pub fn override_device_path(&mut self, path: Option<String>) {
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            self.device.path = path;
        }
    }

    /// Apply the `AT_MODEM_DEVICE` environment variable
    pub fn apply_env(&mut self) {
        self.override_device_path(std::env::var(DEVICE_ENV_VAR).ok());
    }
}

/// Default config location: next to the executable
pub fn default_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(CONFIG_FILE_NAME))
}

/// Read, parse and validate a config file
pub fn load(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| ModemError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ModemError::ConfigValidation {
        field: "config",
        reason: format!("invalid {}: {}", path.display(), e),
    })?;

    config.validate()?;
    Ok(config)
}

/// Load config from `path` (or the default location), falling back to
/// defaults when the file is missing or invalid
pub fn load_or_default(path: Option<&Path>) -> Config {
    let path = match path.map(Path::to_path_buf).or_else(default_path) {
        Some(p) => p,
        None => {
            warn!("Failed to determine config path, using defaults");
            return Config::default();
        }
    };

    if !path.exists() {
        return Config::default();
    }

    match load(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}, using defaults", e);
            Config::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Default values tests
    // =========================================================================

    #[test]
    fn test_default_device_config_values() {
        let config = DeviceConfig::default();

        assert_eq!(config.kind, DeviceKind::File);
        assert_eq!(config.path, DEFAULT_DEVICE_PATH);
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.read_timeout(), Duration::from_millis(READ_POLL_TIMEOUT_MS));
    }

    #[test]
    fn test_default_channel_config_values() {
        let config = ChannelConfig::default();

        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.open_attempts, MAX_OPEN_ATTEMPTS);
        assert_eq!(config.init_sequence.len(), DEFAULT_INIT_SEQUENCE.len());
        assert_eq!(config.init_sequence[0], "ATE0Q0V1");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    // =========================================================================
    // Device kind serialization tests
    // =========================================================================

    #[test]
    fn test_device_kind_toml_deserialization() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            kind: DeviceKind,
        }

        let serial: Wrapper = toml::from_str("kind = \"serial\"").unwrap();
        let file: Wrapper = toml::from_str("kind = \"file\"").unwrap();
        let unix: Wrapper = toml::from_str("kind = \"unix\"").unwrap();

        assert_eq!(serial.kind, DeviceKind::Serial);
        assert_eq!(file.kind, DeviceKind::File);
        assert_eq!(unix.kind, DeviceKind::Unix);
        assert!(toml::from_str::<Wrapper>("kind = \"tcp\"").is_err());
    }

    // =========================================================================
    // Partial files and validation
    // =========================================================================

    #[test]
    fn test_config_partial_sections() {
        let partial_toml = r#"
[device]
kind = "unix"
path = "/tmp/modem.sock"

[channel]
request_timeout_ms = 500
init_sequence = ["ATE0", "AT+CMEE=1"]
"#;

        let config: Config = toml::from_str(partial_toml).unwrap();

        assert_eq!(config.device.kind, DeviceKind::Unix);
        assert_eq!(config.device.path, "/tmp/modem.sock");
        assert_eq!(config.channel.request_timeout_ms, 500);
        assert_eq!(config.channel.init_sequence, vec!["ATE0", "AT+CMEE=1"]);
        // Rest should be defaults
        assert_eq!(config.device.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.channel.open_attempts, MAX_OPEN_ATTEMPTS);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_empty_file() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.device.path, DEFAULT_DEVICE_PATH);
        assert_eq!(config.channel.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.channel.request_timeout_ms = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ModemError::ConfigValidation {
                field: "channel.request_timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_empty_init_command() {
        let mut config = Config::default();
        config.channel.init_sequence.push("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_override_device_path() {
        let mut config = Config::default();

        config.override_device_path(None);
        assert_eq!(config.device.path, DEFAULT_DEVICE_PATH);

        config.override_device_path(Some(String::new()));
        assert_eq!(config.device.path, DEFAULT_DEVICE_PATH);

        config.override_device_path(Some("/dev/ttyUSB2".into()));
        assert_eq!(config.device.path, "/dev/ttyUSB2");
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = load(Path::new("/nonexistent/modem.toml")).unwrap_err();
        assert!(matches!(err, ModemError::ConfigRead { .. }));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = load_or_default(Some(Path::new("/nonexistent/modem.toml")));
        assert_eq!(config.device.path, DEFAULT_DEVICE_PATH);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let path = std::env::temp_dir().join(format!("at-modem-config-{}.toml", std::process::id()));
        fs::write(&path, "[channel]\nopen_attempts = \"many\"\n").unwrap();

        let result = load(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(
            result,
            Err(ModemError::ConfigValidation { field: "config", .. })
        ));
    }
}
