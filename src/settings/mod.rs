//! Layout settings: an INI-like stream of `[Type][Name]` sections
//!
//! ```text
//! [CvLogData][Plot1]
//! Visible=1
//!
//! [Window][Plot1]
//! Pos=412,96
//! Size=320,262
//! ```
//!
//! Each section type is owned by a [`SettingsHandler`]. Unknown types are
//! skipped so files written by newer versions still load.

mod geometry;
mod visibility;

pub use geometry::WindowGeometryHandler;
pub use visibility::VisibilityHandler;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};

use crate::window::WindowManager;

/// Reader/writer of one section type
pub trait SettingsHandler: Send {
    /// Text between the first pair of brackets of a section header
    fn type_name(&self) -> &'static str;

    /// Reset state before a stream is loaded
    fn clear_all(&mut self, _windows: &mut WindowManager) {}

    /// A section of this type named `name` starts
    fn read_open(&mut self, windows: &mut WindowManager, name: &str);

    /// A `key=value` line inside the section `name`
    fn read_line(&mut self, windows: &mut WindowManager, name: &str, line: &str);

    /// Every section of the stream has been read
    fn apply_all(&mut self, _windows: &mut WindowManager) {}

    /// Append all sections of this type
    fn write_all(&self, windows: &WindowManager, out: &mut String);
}

/// Split `[Type][Name]` into its parts
pub fn parse_section_header(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('[')?;
    let (type_name, rest) = rest.split_once(']')?;
    let name = rest.strip_prefix('[')?.strip_suffix(']')?;
    Some((type_name, name))
}

/// Split `Key=a,b` values into two floats
pub(crate) fn parse_pair(value: &str) -> Result<(f32, f32), String> {
    let (a, b) = value
        .split_once(',')
        .ok_or_else(|| format!("Expected two comma-separated numbers: {:?}", value))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f32>()
            .map_err(|e| format!("Invalid number {:?}: {}", s, e))
    };
    Ok((parse(a)?, parse(b)?))
}

struct Autosave {
    path: PathBuf,
    interval: Duration,
    dirty_since: Option<Instant>,
}

/// Registered handlers plus optional periodic autosave
pub struct SettingsStore {
    handlers: Vec<Box<dyn SettingsHandler>>,
    autosave: Option<Autosave>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore {
    /// Store with no handlers; see [`SettingsStore::install_defaults`]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            autosave: None,
        }
    }

    /// Register the visibility and window geometry handlers (idempotent)
    pub fn install_defaults(&mut self) {
        self.register(Box::new(VisibilityHandler));
        self.register(Box::new(WindowGeometryHandler::default()));
    }

    /// Add a handler, replacing any handler of the same type
    pub fn register(&mut self, handler: Box<dyn SettingsHandler>) {
        match self
            .handlers
            .iter_mut()
            .find(|h| h.type_name() == handler.type_name())
        {
            Some(existing) => *existing = handler,
            None => self.handlers.push(handler),
        }
    }

    pub fn has_handler(&self, type_name: &str) -> bool {
        self.handlers.iter().any(|h| h.type_name() == type_name)
    }

    pub fn load_str(&mut self, windows: &mut WindowManager, text: &str) {
        for handler in &mut self.handlers {
            handler.clear_all(windows);
        }

        let mut section: Option<(usize, String)> = None;
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            if let Some((type_name, name)) = parse_section_header(line) {
                section = self
                    .handlers
                    .iter()
                    .position(|h| h.type_name() == type_name)
                    .map(|index| (index, name.to_string()));
                match &section {
                    Some((index, name)) => self.handlers[*index].read_open(windows, name),
                    None => tracing::debug!("Skipping settings section [{}][{}]", type_name, name),
                }
                continue;
            }
            if let Some((index, name)) = &section {
                self.handlers[*index].read_line(windows, name, line);
            }
        }

        for handler in &mut self.handlers {
            handler.apply_all(windows);
        }
    }

    pub fn save_string(&self, windows: &WindowManager) -> String {
        let mut out = String::new();
        for handler in &self.handlers {
            handler.write_all(windows, &mut out);
        }
        out
    }

    pub fn load_file(&mut self, windows: &mut WindowManager, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout {}", path.display()))?;
        self.load_str(windows, &text);
        tracing::info!("Loaded layout from {}", path.display());
        Ok(())
    }

    pub fn save_file(&self, windows: &WindowManager, path: &Path) -> Result<()> {
        fs::write(path, self.save_string(windows))
            .with_context(|| format!("Failed to write layout {}", path.display()))?;
        tracing::info!("Saved layout to {}", path.display());
        Ok(())
    }

    /// Persist settings to `path` once they have been dirty for `interval`
    pub fn enable_autosave(&mut self, path: PathBuf, interval: Duration) {
        self.autosave = Some(Autosave {
            path,
            interval,
            dirty_since: None,
        });
    }

    pub fn autosave_path(&self) -> Option<&Path> {
        self.autosave.as_ref().map(|a| a.path.as_path())
    }

    pub fn mark_dirty(&mut self, now: Instant) {
        if let Some(autosave) = &mut self.autosave {
            autosave.dirty_since.get_or_insert(now);
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave
            .as_ref()
            .is_some_and(|a| a.dirty_since.is_some())
    }

    /// Save to the autosave file if the dirty interval elapsed
    ///
    /// Failures are logged; the next change retries.
    pub fn autosave_if_due(&mut self, windows: &WindowManager, now: Instant) {
        let Some(autosave) = &self.autosave else {
            return;
        };
        let due = autosave
            .dirty_since
            .is_some_and(|since| now.duration_since(since) >= autosave.interval);
        if due {
            self.flush(windows);
        }
    }

    /// Save to the autosave file now, if one is configured
    pub fn flush(&mut self, windows: &WindowManager) {
        let Some(path) = self.autosave.as_ref().map(|a| a.path.clone()) else {
            return;
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!("Failed to create settings directory {}: {}", parent.display(), e);
            }
        }
        match self.save_file(windows, &path) {
            Ok(()) => {
                if let Some(autosave) = &mut self.autosave {
                    autosave.dirty_since = None;
                }
            }
            Err(e) => tracing::warn!("Autosave failed: {:#}", e),
        }
    }
}
