//! Runtime configuration persistence
//!
//! Stores preferences in `~/.config/cvlog/config.yaml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout::SIDEBAR_WIDTH;

/// CVLog configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvLogConfig {
    /// Width of the window list on the left edge, in points
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: f32,

    /// Autosaved layout, relative to the config dir; `null` disables autosave
    #[serde(default = "default_settings_file")]
    pub settings_file: Option<PathBuf>,

    /// Seconds a change waits before the settings file is rewritten
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: f32,

    /// Directory for "Save Layout As..." and "Load Preset" (default: working directory)
    #[serde(default)]
    pub layouts_dir: Option<PathBuf>,
}

fn default_sidebar_width() -> f32 {
    SIDEBAR_WIDTH
}

fn default_settings_file() -> Option<PathBuf> {
    Some(PathBuf::from("cvlog.ini"))
}

fn default_autosave_interval() -> f32 {
    5.0
}

impl Default for CvLogConfig {
    fn default() -> Self {
        Self {
            sidebar_width: default_sidebar_width(),
            settings_file: default_settings_file(),
            autosave_interval_secs: default_autosave_interval(),
            layouts_dir: None,
        }
    }
}

impl CvLogConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from `path`; missing or broken files give defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            crate::config_paths::ensure_dir(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Absolute location of the autosaved settings file, if enabled
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings_file
            .as_deref()
            .map(crate::config_paths::resolve)
    }
}
