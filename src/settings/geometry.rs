//! `[Window]` sections: position and size of windows seen on screen
//!
//! Loaded geometry becomes the window's saved geometry and an `Always`
//! layout command, so both existing and later-created panels pick it up.

use std::collections::HashMap;

use egui::{pos2, Rect, Vec2};

use super::{parse_pair, SettingsHandler};
use crate::window::{LayoutCommand, WindowManager};

pub const TYPE_NAME: &str = "Window";

#[derive(Debug, Default, Clone, Copy)]
struct PendingGeometry {
    pos: Option<(f32, f32)>,
    size: Option<(f32, f32)>,
}

#[derive(Debug, Default)]
pub struct WindowGeometryHandler {
    pending: HashMap<String, PendingGeometry>,
}

impl SettingsHandler for WindowGeometryHandler {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn clear_all(&mut self, windows: &mut WindowManager) {
        self.pending.clear();
        let names: Vec<String> = windows.windows().iter().map(|w| w.name().to_string()).collect();
        for name in names {
            if let Some(data) = windows.window_mut(&name) {
                data.saved_geometry = None;
            }
        }
    }

    fn read_open(&mut self, windows: &mut WindowManager, name: &str) {
        windows.find_or_create_data(name);
        self.pending.entry(name.to_string()).or_default();
    }

    fn read_line(&mut self, _windows: &mut WindowManager, name: &str, line: &str) {
        let Some((key, value)) = line.split_once('=') else {
            return;
        };
        let parsed = match parse_pair(value) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("Ignoring {} for window {:?}: {}", key, name, e);
                return;
            }
        };
        let entry = self.pending.entry(name.to_string()).or_default();
        match key.trim() {
            "Pos" => entry.pos = Some(parsed),
            "Size" => entry.size = Some(parsed),
            _ => {}
        }
    }

    fn apply_all(&mut self, windows: &mut WindowManager) {
        for (name, pending) in self.pending.drain() {
            let (Some((x, y)), Some((w, h))) = (pending.pos, pending.size) else {
                continue;
            };
            if w <= 0.0 || h <= 0.0 {
                continue;
            }
            let rect = Rect::from_min_size(pos2(x, y), Vec2::new(w, h));
            let data = windows.find_or_create_data(&name);
            data.saved_geometry = Some(rect);
            data.layout_command = Some(LayoutCommand::always(rect));
        }
    }

    fn write_all(&self, windows: &WindowManager, out: &mut String) {
        for data in windows.windows() {
            let Some(rect) = data.last_rect else {
                continue;
            };
            out.push_str(&format!(
                "[{}][{}]\nPos={},{}\nSize={},{}\n\n",
                TYPE_NAME,
                data.name(),
                rect.min.x.round(),
                rect.min.y.round(),
                rect.width().round(),
                rect.height().round()
            ));
        }
    }
}
