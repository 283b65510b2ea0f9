//! TOML-based configuration for the player.
//!
//! Same layout rules as the dealer's config: every field carries a serde
//! default, a missing file yields `PlayerConfig::default()`, and the file
//! lives at the platform-appropriate location (`player.toml` under the
//! `LanBlackjack` config directory).
//!
//! ```toml
//! [player]
//! identity = "TexasHoldem"
//! log_level = "info"
//!
//! [network]
//! discovery_port = 13122
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

/// Top-level player configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    #[serde(default)]
    pub player: PlayerSection,
    #[serde(default)]
    pub network: NetworkSection,
}

/// Identity and behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSection {
    /// The dealer identity this player accepts offers from, echoed back
    /// in the session request.
    #[serde(default = "default_identity")]
    pub identity: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    /// UDP port to listen on for dealer offers.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
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

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            player: PlayerSection::default(),
            network: NetworkSection::default(),
        }
    }
}

impl Default for PlayerSection {
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
    Ok(config_dir()?.join("player.toml"))
}

/// Loads `PlayerConfig` from disk, returning `PlayerConfig::default()` if
/// the file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<PlayerConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: PlayerConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PlayerConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk, creating the config directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &PlayerConfig) -> Result<(), ConfigError> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_dealer_defaults() {
        let cfg = PlayerConfig::default();
        assert_eq!(cfg.player.identity, "TexasHoldem");
        assert_eq!(cfg.network.discovery_port, 13122);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut cfg = PlayerConfig::default();
        cfg.player.identity = "HighRoller".to_string();
        cfg.network.discovery_port = 20000;

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: PlayerConfig = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let cfg: PlayerConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, PlayerConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let toml_str = r#"
[player]
identity = "Lurker"
"#;
        let cfg: PlayerConfig = toml::from_str(toml_str).expect("deserialize partial");
        assert_eq!(cfg.player.identity, "Lurker");
        assert_eq!(cfg.player.log_level, "info");
        assert_eq!(cfg.network.discovery_port, 13122);
    }

    #[test]
    fn test_config_file_path_ends_with_player_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("player.toml"));
        }
    }
}
