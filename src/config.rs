//! Configuration for termctl.
//!
//! Loaded from `~/.termctl/config.toml`:
//!
//! ```toml
//! # auto, native, ansi or memory
//! backend = "auto"
//!
//! # Log filter when RUST_LOG is not set
//! log_level = "info"
//!
//! [scroll]
//! fill_char = " "
//! fill_attributes = "FOREGROUND_RED | FOREGROUND_INTENSITY"
//! refresh_snapshot = true
//! ```
//!
//! `fill_attributes` uses the bitflags text format: flag names joined by `|`,
//! or a hex value such as `0x0C`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendKind;
use crate::core::{FillCell, SessionOptions, SnapshotPolicy, StyleAttribute};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[source] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid fill attributes {0:?}")]
    Attributes(String),
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend selection
    pub backend: BackendKind,
    /// Log filter used when RUST_LOG is unset
    pub log_level: String,
    /// Scroll settings
    pub scroll: ScrollConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            log_level: "info".to_string(),
            scroll: ScrollConfig::default(),
        }
    }
}

/// What `scroll_up` fills vacated rows with, and which snapshot it uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub fill_char: char,
    pub fill_attributes: String,
    pub refresh_snapshot: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            fill_char: ' ',
            fill_attributes: "FOREGROUND_RED | FOREGROUND_INTENSITY".to_string(),
            refresh_snapshot: true,
        }
    }
}

impl Config {
    /// Load `~/.termctl/config.toml`, or defaults when there is no file
    pub fn load() -> Result<Self, ConfigError> {
        match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Read and validate a config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.session_options()?;
        Ok(config)
    }

    /// Session tunables derived from the `[scroll]` table
    pub fn session_options(&self) -> Result<SessionOptions, ConfigError> {
        let attributes: StyleAttribute =
            bitflags::parser::from_str(self.scroll.fill_attributes.trim())
                .map_err(|_| ConfigError::Attributes(self.scroll.fill_attributes.clone()))?;

        Ok(SessionOptions {
            scroll_fill: FillCell {
                ch: self.scroll.fill_char,
                attributes,
            },
            scroll_snapshot: if self.scroll.refresh_snapshot {
                SnapshotPolicy::Refresh
            } else {
                SnapshotPolicy::LastFetched
            },
        })
    }

    /// Directory holding config and log files
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".termctl"))
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        let dir = Self::config_dir()?;
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        Some(dir.join("config.toml"))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_legacy_fill() {
        let options = Config::default().session_options().unwrap();
        assert_eq!(options.scroll_fill, FillCell::default());
        assert_eq!(options.scroll_snapshot, SnapshotPolicy::Refresh);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_full_document() {
        let config = Config::from_toml(
            r#"
            backend = "memory"
            log_level = "debug"

            [scroll]
            fill_char = "."
            fill_attributes = "BACKGROUND_BLUE | FOREGROUND_INTENSITY"
            refresh_snapshot = false
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.log_level, "debug");

        let options = config.session_options().unwrap();
        assert_eq!(options.scroll_fill.ch, '.');
        assert_eq!(
            options.scroll_fill.attributes,
            StyleAttribute::BACKGROUND_BLUE | StyleAttribute::FOREGROUND_INTENSITY
        );
        assert_eq!(options.scroll_snapshot, SnapshotPolicy::LastFetched);
    }

    #[test]
    fn test_hex_attributes() {
        let config = Config::from_toml("[scroll]\nfill_attributes = \"0x1E\"").unwrap();
        let options = config.session_options().unwrap();
        assert_eq!(options.scroll_fill.attributes.bits(), 0x1E);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_toml("[scroll]\nfill_attributes = \"PURPLE\""),
            Err(ConfigError::Attributes(_))
        ));
        assert!(matches!(
            Config::from_toml("backend = \"curses\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("termctl-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Io(_))));

        fs::write(&path, "backend = \"ansi\"\n[scroll]\nfill_char = \"#\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend, BackendKind::Ansi);
        assert_eq!(config.scroll.fill_char, '#');

        fs::write(&path, "[scroll]\nfill_attributes = \"PURPLE\"\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Attributes(_))
        ));

        fs::remove_dir_all(&dir).unwrap();
    }
}
