//! TOML-based configuration for the dealer.
//!
//! Reads and writes `DealerConfig` at the platform-appropriate location:
//! - Windows:  `%APPDATA%\LanBlackjack\dealer.toml`
//! - Linux:    `~/.config/lanblackjack/dealer.toml`
//! - macOS:    `~/Library/Application Support/LanBlackjack/dealer.toml`
//!
//! Every field carries a `#[serde(default = "...")]` so a missing or
//! partial file still yields a working configuration; a first run without
//! any file at all gets `DealerConfig::default()`.
//!
//! ```toml
//! [dealer]
//! identity = "TexasHoldem"
//! log_level = "info"
//!
//! [network]
//! discovery_port = 13122
//! service_port = 0
//! bind_address = "0.0.0.0"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

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

/// Top-level dealer configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealerConfig {
    #[serde(default)]
    pub dealer: DealerSection,
    #[serde(default)]
    pub network: NetworkSection,
}

/// Identity and behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealerSection {
    /// Identity token carried in every offer; players only connect to a
    /// dealer whose identity matches their own configuration.
    #[serde(default = "default_identity")]
    pub identity: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Network port and bind-address settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    /// UDP port offers are broadcast to.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    /// TCP port for game sessions. 0 asks the OS for any free port; the
    /// broadcaster always announces the resolved port.
    #[serde(default = "default_service_port")]
    pub service_port: u16,
    /// IP address to bind the listener to. `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_identity() -> String {
    "TexasHoldem".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_discovery_port() -> u16 {
    13122
}
fn default_service_port() -> u16 {
    0
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

impl Default for DealerConfig {
    fn default() -> Self {
        Self {
            dealer: DealerSection::default(),
            network: NetworkSection::default(),
        }
    }
}

impl Default for DealerSection {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            discovery_port: default_discovery_port(),
            service_port: default_service_port(),
            bind_address: default_bind_address(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory
/// cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory
/// cannot be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("dealer.toml"))
}

/// Loads `DealerConfig` from disk, returning `DealerConfig::default()` if
/// the file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<DealerConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: DealerConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DealerConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk, creating the config directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &DealerConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("LanBlackjack"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("lanblackjack"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("LanBlackjack")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
