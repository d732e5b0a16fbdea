//! Value list panel: latest value per key, one `name = value` line each

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{Panel, PanelType};
use crate::util::lock;
use crate::window::WindowShared;

/// Producer handle of a value list panel
#[derive(Debug, Default)]
pub struct ValueFeed {
    pending: Mutex<Vec<(String, String)>>,
}

impl ValueFeed {
    pub fn add_value(&self, name: &str, value: &str) {
        lock(&self.pending).push((name.to_string(), value.to_string()));
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    fn take(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *lock(&self.pending))
    }
}

pub struct ValueListPanel {
    window: Arc<WindowShared>,
    feed: Arc<ValueFeed>,
    values: BTreeMap<String, String>,
}

impl ValueListPanel {
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Lines as rendered, sorted by name
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.values
            .iter()
            .map(|(name, value)| format!("{} = {}", name, value))
    }
}

impl Panel for ValueListPanel {
    fn window(&self) -> &WindowShared {
        &self.window
    }

    fn clear(&mut self) {
        self.feed.take();
        self.values.clear();
    }

    fn begin_frame_window<'open>(&self, window: egui::Window<'open>) -> egui::Window<'open> {
        window.hscroll(true)
    }

    fn sync(&mut self, _ctx: &egui::Context) {
        for (name, value) in self.feed.take() {
            self.values.insert(name, value);
        }
    }

    fn render(&mut self, ui: &mut egui::Ui) {
        for line in self.lines() {
            ui.label(line);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl PanelType for ValueListPanel {
    type Feed = ValueFeed;

    fn create(window: Arc<WindowShared>) -> Self {
        Self {
            window,
            feed: Arc::new(ValueFeed::default()),
            values: BTreeMap::new(),
        }
    }

    fn feed(&self) -> Arc<ValueFeed> {
        Arc::clone(&self.feed)
    }
}
