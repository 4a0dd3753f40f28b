//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`:
//!
//! ```yaml
//! forste_lopenummer: 100
//! log_format: json
//! pretty: true
//! ```
//!
//! Every key is optional. Unknown keys are rejected so a typo does not
//! silently fall back to a default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use okonomi_oppdrag::FORSTE_LOPENUMMER;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Settings for the `okonomi` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OkonomiConfig {
    /// First sequence number of a fagsystem without any line.
    pub forste_lopenummer: u64,
    /// Log output format.
    pub log_format: LogFormat,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OkonomiConfig {
    fn default() -> Self {
        Self {
            forste_lopenummer: FORSTE_LOPENUMMER,
            log_format: LogFormat::Text,
            pretty: false,
        }
    }
}

/// Where loaded settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigKilde {
    /// No `--config` given.
    Standard,
    /// `--config` named a file that does not exist; defaults apply.
    IkkeFunnet(PathBuf),
    /// Read from this file.
    Fil(PathBuf),
}

impl ConfigKilde {
    /// Report the source. Called once logging is up, since loading
    /// happens before the subscriber exists.
    pub fn logg(&self) {
        match self {
            ConfigKilde::Standard => tracing::debug!("no config file given, using defaults"),
            ConfigKilde::IkkeFunnet(path) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
            }
            ConfigKilde::Fil(path) => tracing::debug!(path = %path.display(), "config loaded"),
        }
    }
}

impl OkonomiConfig {
    /// Load from `path`, or defaults when no path is given or the file
    /// does not exist.
    pub fn load(path: Option<&Path>) -> Result<(Self, ConfigKilde)> {
        let Some(path) = path else {
            return Ok((Self::default(), ConfigKilde::Standard));
        };
        if !path.exists() {
            let kilde = ConfigKilde::IkkeFunnet(path.to_path_buf());
            return Ok((Self::default(), kilde));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok((config, ConfigKilde::Fil(path.to_path_buf())))
    }

    /// Parse YAML. An empty document gives the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = OkonomiConfig::default();
        assert_eq!(config.forste_lopenummer, 100);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(!config.pretty);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = OkonomiConfig::from_yaml("log_format: json\n").unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.forste_lopenummer, 100);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(OkonomiConfig::from_yaml("  \n").unwrap(), OkonomiConfig::default());
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(OkonomiConfig::from_yaml("forste_lopnummer: 5\n").is_err());
    }

    #[test]
    fn no_path_gives_defaults() {
        let (config, kilde) = OkonomiConfig::load(None).unwrap();
        assert_eq!(config, OkonomiConfig::default());
        assert_eq!(kilde, ConfigKilde::Standard);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finnes-ikke.yaml");
        let (config, kilde) = OkonomiConfig::load(Some(&path)).unwrap();
        assert_eq!(config, OkonomiConfig::default());
        assert_eq!(kilde, ConfigKilde::IkkeFunnet(path));
    }

    #[test]
    fn loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("okonomi.yaml");
        std::fs::write(&path, "forste_lopenummer: 1\npretty: true\n").unwrap();
        let (config, kilde) = OkonomiConfig::load(Some(&path)).unwrap();
        assert_eq!(config.forste_lopenummer, 1);
        assert!(config.pretty);
        assert_eq!(kilde, ConfigKilde::Fil(path));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("okonomi.yaml");
        std::fs::write(&path, "pretty: kanskje\n").unwrap();
        let err = OkonomiConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("okonomi.yaml"));
    }
}
