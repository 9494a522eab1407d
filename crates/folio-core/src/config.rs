use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::color::{self, ColorValue};
use crate::knowledge::KnowledgeBase;

pub const APP_DIR: &str = "folio";
pub const DEFAULT_COLOR: &str = color::DEFAULT_HEX;
pub const DEFAULT_RESPONSE_DELAY_MS: u64 = 1000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub response_delay_ms: Option<u64>,
    pub default_color: Option<String>,
    pub knowledge_base: Option<PathBuf>,
    pub persist_preferences: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            response_delay_ms: Some(DEFAULT_RESPONSE_DELAY_MS),
            default_color: Some(DEFAULT_COLOR.to_string()),
            knowledge_base: None,
            persist_preferences: Some(true),
        }
    }

    /// Load `<config_dir>/folio/config.json`.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Read the config at `path`. On first run the defaults are written out
    /// so there is a file to edit; failing to write them is only logged.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::new();
            match config.save_to(path) {
                Ok(()) => info!(path = %path.display(), "wrote default config"),
                Err(e) => warn!(path = %path.display(), error = %e, "could not write default config"),
            }
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms.unwrap_or(DEFAULT_RESPONSE_DELAY_MS))
    }

    /// Configured default message color; an invalid value falls back to the
    /// built-in default.
    pub fn default_color(&self) -> ColorValue {
        self.default_color
            .as_deref()
            .and_then(color::parse_stored)
            .unwrap_or_default()
    }

    pub fn persist_preferences(&self) -> bool {
        self.persist_preferences.unwrap_or(true)
    }

    /// Knowledge base from the configured path, or the embedded table.
    pub fn knowledge_base(&self) -> Result<KnowledgeBase> {
        let kb = match &self.knowledge_base {
            Some(path) => KnowledgeBase::load(path)?,
            None => KnowledgeBase::embedded()?,
        };
        Ok(kb)
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.json"))
    }

    /// `<config_dir>/folio`, holding config, preferences and the log file.
    pub fn app_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join(APP_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.response_delay(), Duration::from_millis(1000));
        assert_eq!(config.default_color().hex(), DEFAULT_COLOR);
        assert!(config.persist_preferences());
        assert!(config.knowledge_base().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"response_delay_ms": 250}"#).unwrap();
        assert_eq!(config.response_delay(), Duration::from_millis(250));
        assert_eq!(config.default_color().hex(), DEFAULT_COLOR);
        assert!(config.persist_preferences());
    }

    #[test]
    fn test_invalid_default_color_falls_back() {
        let config = Config {
            default_color: Some("not a color".to_string()),
            ..Config::new()
        };
        assert_eq!(config.default_color().hex(), DEFAULT_COLOR);
    }

    #[test]
    fn test_named_default_color() {
        let config = Config {
            default_color: Some("teal".to_string()),
            ..Config::new()
        };
        assert_eq!(config.default_color().hex(), "#008080");
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::new());
        assert!(path.exists());

        let written: Config = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, Config::new());
    }

    #[test]
    fn test_saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            response_delay_ms: Some(10),
            default_color: Some("navy".to_string()),
            persist_preferences: Some(false),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.response_delay(), Duration::from_millis(10));
        assert!(!loaded.persist_preferences());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_custom_knowledge_base_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        fs::write(&path, r#"{"entries":[],"default":"nothing here"}"#).unwrap();
        let config = Config {
            knowledge_base: Some(path),
            ..Config::new()
        };
        assert_eq!(config.knowledge_base().unwrap().lookup("hi"), "nothing here");
    }
}
