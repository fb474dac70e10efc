//! Local client settings.
//!
//! Connection profiles live in the external directory service; only the
//! gateway address and a few client-side knobs are kept here, as TOML under
//! the user config directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_SCROLLBACK_LINES: usize = 10_000;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    /// Base URL of the gateway (http or https); the socket scheme is derived
    /// from it.
    pub gateway_url: String,
    /// Where downloads are written. Defaults to the platform downloads
    /// directory.
    pub downloads_dir: Option<PathBuf>,
    pub terminal_scrollback_lines: usize,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8080".to_string(),
            downloads_dir: None,
            terminal_scrollback_lines: DEFAULT_SCROLLBACK_LINES,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Effective downloads directory: the configured one, the platform one,
    /// or the current directory as a last resort.
    pub fn effective_downloads_dir(&self) -> PathBuf {
        self.downloads_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub struct SettingsManager {
    path: PathBuf,
    pub settings: Settings,
}

impl SettingsManager {
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(path)
    }

    /// Load from an explicit path (also used by tests).
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {e}")))?
        } else {
            Settings::default()
        };
        Ok(Self { path, settings })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::ConfigError(format!("Failed to create config directory: {e}"))
            })?;
        }
        let toml = toml::to_string_pretty(&self.settings)
            .map_err(|e| AppError::ConfigError(format!("Failed to serialize config: {e}")))?;
        fs::write(&self.path, toml)
            .map_err(|e| AppError::ConfigError(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::ConfigError("No config directory available".to_string()))?;
        Ok(config_dir.join("shellmux").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SettingsManager::load_from(dir.path().join("config.toml")).unwrap();
        assert_eq!(manager.settings.gateway_url, "http://127.0.0.1:8080");
        assert_eq!(
            manager.settings.terminal_scrollback_lines,
            DEFAULT_SCROLLBACK_LINES
        );
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut manager = SettingsManager::load_from(&path).unwrap();
        manager.settings.gateway_url = "https://gw.example.com".to_string();
        manager.settings.log_level = "debug".to_string();
        manager.save().unwrap();

        let reloaded = SettingsManager::load_from(&path).unwrap();
        assert_eq!(reloaded.settings.gateway_url, "https://gw.example.com");
        assert_eq!(reloaded.settings.log_level, "debug");
    }
}
