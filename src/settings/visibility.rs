//! `[CvLogData]` sections: per-window visibility

use super::SettingsHandler;
use crate::window::WindowManager;

pub const TYPE_NAME: &str = "CvLogData";

/// Persists the visible flag of every known window
#[derive(Debug, Default)]
pub struct VisibilityHandler;

impl SettingsHandler for VisibilityHandler {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn read_open(&mut self, windows: &mut WindowManager, name: &str) {
        windows.find_or_create_data(name);
    }

    fn read_line(&mut self, windows: &mut WindowManager, name: &str, line: &str) {
        let Some(value) = line.strip_prefix("Visible=") else {
            return;
        };
        match value.trim().parse::<i32>() {
            Ok(visible) => windows.find_or_create_data(name).set_visible(visible != 0),
            Err(e) => tracing::warn!("Invalid Visible value for {:?}: {}", name, e),
        }
    }

    fn write_all(&self, windows: &WindowManager, out: &mut String) {
        for data in windows.windows() {
            out.push_str(&format!(
                "[{}][{}]\nVisible={}\n\n",
                TYPE_NAME,
                data.name(),
                u8::from(data.is_visible())
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SIDEBAR_WIDTH;
    use crate::window::WindowIndex;
    use std::sync::Arc;

    #[test]
    fn test_read_visible_values() {
        let mut windows = WindowManager::new(Arc::new(WindowIndex::new()), SIDEBAR_WIDTH);
        let mut handler = VisibilityHandler;
        handler.read_open(&mut windows, "A");
        handler.read_line(&mut windows, "A", "Visible=0");
        assert!(!windows.window("A").unwrap().is_visible());

        handler.read_line(&mut windows, "A", "Visible=7");
        assert!(windows.window("A").unwrap().is_visible());

        // Garbage leaves the flag alone
        handler.read_line(&mut windows, "A", "Visible=yes");
        handler.read_line(&mut windows, "A", "Collapsed=1");
        assert!(windows.window("A").unwrap().is_visible());
    }
}
