//! Configuration paths for cvlog
//!
//! Config, autosaved settings and logs live under:
//! - Unix/macOS: `~/.config/cvlog/`
//! - Windows: `%APPDATA%\cvlog\`

use std::{
    env, fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "cvlog";

/// Base config directory
///
/// Unix/macOS:
///   - If XDG_CONFIG_HOME is set: `$XDG_CONFIG_HOME/cvlog`
///   - Else: `~/.config/cvlog`
///
/// Windows:
///   - `%APPDATA%\cvlog`
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// `~/.config/cvlog/config.yaml`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// `~/.config/cvlog/logs/`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

/// Resolve a relative file name against the config dir
///
/// Absolute paths are returned unchanged; without a config dir the name is
/// taken relative to the working directory.
pub fn resolve(name: &Path) -> PathBuf {
    if name.is_absolute() {
        return name.to_path_buf();
    }
    match config_dir() {
        Some(dir) => dir.join(name),
        None => name.to_path_buf(),
    }
}

pub fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Ensure the base config dir exists, returning it
pub fn ensure_config_dir() -> Result<PathBuf, String> {
    let dir = config_dir().ok_or_else(|| "No config directory available".to_string())?;
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Ensure logs dir exists, returning it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let config = ensure_config_dir()?;
    let logs = config.join("logs");
    ensure_dir(&logs)?;
    Ok(logs)
}
