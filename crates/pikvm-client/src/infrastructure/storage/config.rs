//! TOML-based configuration for the `pikvm` command-line client.
//!
//! Reads and writes [`AppConfig`] at the platform-appropriate location:
//! - Windows:  `%APPDATA%\PiKVMRemote\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/pikvm-remote/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/PiKVMRemote/config.toml`
//!
//! ```toml
//! [device]
//! host = "pikvm.local"
//! username = "admin"
//! password = "admin"
//!
//! [typing]
//! wpm = 90.0
//! error_rate = 0.02
//! ```
//!
//! Every section and field is optional.  Absent fields take the values of
//! the `default_*` helpers below, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pikvm_core::TypingParameters;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How to reach and authenticate against the PiKVM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Host name or IP address, optionally with `:port`.
    #[serde(default = "default_host")]
    pub host: String,
    /// `"https"` for real devices; `"http"` for plain-text test setups.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    /// Reject self-signed certificates.  PiKVM ships with one, hence `false`.
    #[serde(default)]
    pub verify_tls: bool,
    /// kvmd keymap used by `/api/hid/print`.
    #[serde(default = "default_keymap")]
    pub keymap: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Defaults for the human typing simulator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypingConfig {
    #[serde(default = "default_wpm")]
    pub wpm: f64,
    #[serde(default = "default_error_rate")]
    pub error_rate: f64,
    #[serde(default = "default_max_typo_length")]
    pub max_typo_length: u32,
    /// Pause before the first keystroke so the operator can focus the target.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
    /// Fixed seed for reproducible runs.  Absent means entropy-seeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"pikvm_client=debug"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "pikvm.local".to_string()
}
fn default_scheme() -> String {
    "https".to_string()
}
fn default_username() -> String {
    "admin".to_string()
}
fn default_password() -> String {
    "admin".to_string()
}
fn default_keymap() -> String {
    "en-us".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_wpm() -> f64 {
    TypingParameters::default().wpm
}
fn default_error_rate() -> f64 {
    TypingParameters::default().error_rate
}
fn default_max_typo_length() -> u32 {
    TypingParameters::default().max_typo_length
}
fn default_start_delay_ms() -> u64 {
    2000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            scheme: default_scheme(),
            username: default_username(),
            password: default_password(),
            verify_tls: false,
            keymap: default_keymap(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            wpm: default_wpm(),
            error_rate: default_error_rate(),
            max_typo_length: default_max_typo_length(),
            start_delay_ms: default_start_delay_ms(),
            seed: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DeviceConfig {
    /// Base URL of the kvmd HTTP API, e.g. `https://pikvm.local`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// URL of the kvmd WebSocket endpoint.  `https` maps to `wss`, anything
    /// else to plain `ws`.
    pub fn ws_url(&self) -> String {
        let scheme = if self.scheme.eq_ignore_ascii_case("https") {
            "wss"
        } else {
            "ws"
        };
        format!("{scheme}://{}/api/ws", self.host)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl TypingConfig {
    /// The simulator parameters described by this section (not yet validated).
    pub fn parameters(&self) -> TypingParameters {
        TypingParameters::new(self.wpm, self.error_rate, self.max_typo_length)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the configuration.
///
/// With an explicit `path` the file must exist.  Without one, the default
/// location is tried and [`AppConfig::default()`] is returned when there is
/// no file there (or no platform config directory at all).
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = path {
        return load_config_from(path);
    }

    let path = match config_file_path() {
        Ok(path) => path,
        Err(ConfigError::NoPlatformConfigDir) => {
            debug!("no platform config directory; using defaults");
            return Ok(AppConfig::default());
        }
        Err(e) => return Err(e),
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no config file at {}; using defaults", path.display());
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

/// Loads the configuration from `path`, which must exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("PiKVMRemote"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("pikvm-remote"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("PiKVMRemote")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
