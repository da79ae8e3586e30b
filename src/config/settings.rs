//! Tool settings stored as JSON under the user's config directory

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use crate::constants::config::{ACTIVE_DIR_ENV, APP_DIR, FILENAME, LOG_LEVEL_ENV};
use crate::constants::discovery::{DEFAULT_SEARCH_PATHS, SERVICE_FILES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directories probed for sing-box configuration files
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<PathBuf>,
    /// systemd units inspected for an explicit `-C`/`-D` directory
    #[serde(default = "default_service_files")]
    pub service_files: Vec<PathBuf>,
    /// Directory chosen with `use`, preferred over discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_search_paths() -> Vec<PathBuf> {
    DEFAULT_SEARCH_PATHS.iter().map(PathBuf::from).collect()
}

fn default_service_files() -> Vec<PathBuf> {
    SERVICE_FILES.iter().map(PathBuf::from).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_paths: default_search_paths(),
            service_files: default_service_files(),
            active_dir: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Load settings from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::path())?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Settings file not found, creating defaults");
            let settings = Settings::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings JSON from {}", path.display()))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write settings to {}", path.display()))?;
        info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
    }

    /// Directory forced through the environment, bypassing discovery
    pub fn active_dir_override() -> Option<PathBuf> {
        env::var_os(ACTIVE_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    pub fn trace_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(FILENAME);

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILENAME);
        fs::write(&path, r#"{"search_paths": ["/srv/sing-box"]}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.search_paths, vec![PathBuf::from("/srv/sing-box")]);
        assert_eq!(settings.service_files, default_service_files());
        assert_eq!(settings.active_dir, None);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILENAME);
        fs::write(&path, "{ not json").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings JSON"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILENAME);
        let settings = Settings {
            search_paths: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            service_files: Vec::new(),
            active_dir: Some(PathBuf::from("/a")),
            log_level: "debug".to_string(),
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_trace_level_parsing() {
        let mut settings = Settings::default();
        settings.log_level = "DEBUG".to_string();
        assert_eq!(settings.trace_level(), Level::DEBUG);
        settings.log_level = "nonsense".to_string();
        assert_eq!(settings.trace_level(), Level::INFO);
    }
}
