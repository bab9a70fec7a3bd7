// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, read once at startup from a TOML file.
//!
//! The file location is `$CASD_CONFIG` when set, otherwise
//! `$XDG_CONFIG_HOME/casd/config.toml`, otherwise
//! `~/.config/casd/config.toml`. The directory holding the file doubles as
//! the config root watched for restart trigger files.

use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub windsx: WindsxConfig,
    pub dsxpi: DsxPiConfig,
    #[serde(default)]
    pub plugins: HashMap<String, PluginConfig>,
}

/// The vendor installation this server mediates.
#[derive(Debug, Clone, Deserialize)]
pub struct WindsxConfig {
    /// Vendor installation root; the comm server executable lives here.
    pub root: PathBuf,
    pub acs_data_db_path: PathBuf,
    pub log_db_path: PathBuf,
    pub cs_host: String,
    pub cs_port: u16,
    pub workstation_number: i64,
    pub location_group: i64,
}

/// The hardware-reset board.
#[derive(Debug, Clone, Deserialize)]
pub struct DsxPiConfig {
    pub host: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Resolve the config file path from the environment.
    pub fn locate() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("CASD_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg).join("casd").join("config.toml"));
        }
        let home = std::env::var("HOME").map_err(|_| ConfigError::NoConfigDir)?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("casd")
            .join("config.toml"))
    }
}

/// State directory for the daemon log, `$CASD_STATE_DIR` >
/// `$XDG_STATE_HOME/casd` > `~/.local/state/casd`.
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("CASD_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("casd"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoConfigDir)?;
    Ok(PathBuf::from(home).join(".local/state/casd"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
