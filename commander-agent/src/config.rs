//! YAML configuration: the four model blocks and the round limit.

use commander_error::{Error, Result};
use commander_model::TeamConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "config.yml";
pub const CONFIG_ENV: &str = "COMMANDER_CONFIG";
pub const DEFAULT_MAX_ROUNDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub models: TeamConfig,
    pub max_rounds: usize,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    models: TeamConfig,
    #[serde(default)]
    max_rounds: i64,
}

impl Config {
    /// Load and validate the file at `path`. Relative paths resolve against
    /// the current working directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = resolve(path.as_ref())?;
        let text = std::fs::read_to_string(&path).map_err(|e| {
            Error::from(e)
                .with_operation("config::load")
                .with_context("path", path.display().to_string())
        })?;

        let config = Self::from_yaml(&text)
            .map_err(|e| e.with_context("path", path.display().to_string()))?;
        info!(path = %path.display(), max_rounds = config.max_rounds, "configuration loaded");
        Ok(config)
    }

    /// Parse and validate YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_yml::from_str(text).map_err(|e| {
            Error::config_invalid(format!("failed to parse config file: {}", e))
                .with_operation("config::parse")
                .set_source(e)
        })?;

        raw.models.validate()?;

        let max_rounds = if raw.max_rounds <= 0 {
            DEFAULT_MAX_ROUNDS
        } else {
            raw.max_rounds as usize
        };

        Ok(Self {
            models: raw.models,
            max_rounds,
        })
    }
}

fn resolve(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| {
        Error::from(e).with_operation("config::resolve")
    })?;
    Ok(cwd.join(path))
}
