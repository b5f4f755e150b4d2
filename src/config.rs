//! User settings (TOML)
//!
//! Lives next to the profiles directory. Environment variables override the
//! file at startup; command-line flags override both.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};

use crate::constants::{config, env};
use crate::persistence::ProfileStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Remap stale adapter ids when loading a snapshot
    #[serde(default = "default_match_adapter_ids")]
    pub match_adapter_ids: bool,

    /// Overrides the default profiles directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_match_adapter_ids() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            match_adapter_ids: default_match_adapter_ids(),
            profiles_dir: None,
        }
    }
}

impl Settings {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from the default location with environment overrides applied
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::path())?;
        settings.apply_overrides(|name| std::env::var(name).ok());
        Ok(settings)
    }

    /// Load settings from `path`, writing defaults there if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "settings file not found, creating default");
            let settings = Self::default();
            if let Err(e) = settings.save_to(path) {
                // Read-only config dirs still get a working default
                warn!(error = %e, "failed to write default settings");
            }
            return Ok(settings);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from {}", path.display()))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        info!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup(env::LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(dir) = lookup(env::PROFILES_DIR).filter(|dir| !dir.trim().is_empty()) {
            self.profiles_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = lookup(env::NO_ID_MATCH) {
            match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.match_adapter_ids = false,
                "0" | "false" | "no" | "off" | "" => {}
                other => warn!(var = env::NO_ID_MATCH, value = other, "ignoring unrecognised value"),
            }
        }
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.profiles_dir
            .clone()
            .unwrap_or_else(ProfileStore::default_dir)
    }

    pub fn profile_store(&self) -> ProfileStore {
        ProfileStore::new(self.profiles_dir())
    }

    /// Unknown names fall back to info
    pub fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}
