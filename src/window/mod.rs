//! Window metadata: the per-name record behind every panel
//!
//! Each panel name owns exactly one metadata record. The record is split in
//! two halves:
//!
//! - [`WindowShared`] is reference counted and reachable from producer
//!   threads through the [`WindowIndex`]. It only carries immutable identity,
//!   the atomic visibility flag and the producer-side feed of the panel.
//! - [`WindowData`] lives inside the [`WindowManager`] and is only touched on
//!   the render thread (category, help, preferred size, layout commands,
//!   hooks and the panel instance).

pub mod category;
pub mod registry;

pub use category::{Category, CategoryIndex, CategoryState};
pub use registry::{WindowIndex, WindowManager};

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use egui::{Pos2, Rect, Vec2};

use crate::panel::Panel;

/// Category assigned to windows nobody categorized
pub const DEFAULT_CATEGORY: &str = "Default";

/// Help text shown until the application provides one
pub const DEFAULT_HELP: &str = "No help specified";

/// Preferred content size of a fresh window
pub const DEFAULT_CONTENT_SIZE: Vec2 = Vec2::new(320.0, 240.0);

/// Stable identifier of a panel, derived from its name with the egui hasher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(egui::Id);

impl PanelId {
    pub fn from_name(name: &str) -> Self {
        Self(egui::Id::new(name))
    }

    /// Raw 64-bit hash value
    pub fn value(self) -> u64 {
        self.0.value()
    }

    /// Id used for the egui window of this panel
    pub fn window_id(self) -> egui::Id {
        egui::Id::new("cvlog_window").with(self.0)
    }
}

/// Shared visibility flag of a window
///
/// The flag is allocated once per window and never moves, so producers may
/// keep a clone forever and poll it without any locking.
#[derive(Debug, Clone)]
pub struct VisibilityFlag(Arc<AtomicBool>);

impl VisibilityFlag {
    pub fn new(visible: bool) -> Self {
        Self(Arc::new(AtomicBool::new(visible)))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, visible: bool) {
        self.0.store(visible, Ordering::Relaxed);
    }

    /// True when both handles point at the same window's flag
    pub fn same_flag(&self, other: &VisibilityFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Producer-visible half of a window's metadata
pub struct WindowShared {
    name: String,
    id: PanelId,
    visible: VisibilityFlag,
    feed: OnceLock<Arc<dyn Any + Send + Sync>>,
}

impl WindowShared {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: PanelId::from_name(name),
            visible: VisibilityFlag::new(true),
            feed: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn visibility(&self) -> &VisibilityFlag {
        &self.visible
    }

    /// Producer feed of the bound panel, if it is of type `F`
    pub fn feed<F: Send + Sync + 'static>(&self) -> Option<Arc<F>> {
        let feed = Arc::clone(self.feed.get()?);
        feed.downcast::<F>().ok()
    }

    pub fn has_panel(&self) -> bool {
        self.feed.get().is_some()
    }

    /// Publish the feed of a freshly bound panel; a window is bound once
    pub(crate) fn bind_feed(&self, feed: Arc<dyn Any + Send + Sync>) -> bool {
        self.feed.set(feed).is_ok()
    }
}

impl std::fmt::Debug for WindowShared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowShared")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("visible", &self.is_visible())
            .field("has_panel", &self.has_panel())
            .finish()
    }
}

/// When a layout command takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutCondition {
    /// Only if the window has no geometry yet (saved layouts win)
    FirstUseEver,
    /// Unconditionally on the next frame
    Always,
}

/// Deferred position/size change applied on the next frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCommand {
    pub pos: Pos2,
    /// Outer window size, frame included
    pub size: Vec2,
    pub condition: LayoutCondition,
    /// Bring the window to the front when applying
    pub focus: bool,
}

impl LayoutCommand {
    pub fn first_use(pos: Pos2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            condition: LayoutCondition::FirstUseEver,
            focus: false,
        }
    }

    pub fn always(rect: Rect) -> Self {
        Self {
            pos: rect.min,
            size: rect.size(),
            condition: LayoutCondition::Always,
            focus: false,
        }
    }

    pub fn with_focus(mut self) -> Self {
        self.focus = true;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.pos, self.size)
    }
}

/// Hook drawn inside a window before its panel body
pub type PreRenderHook = Box<dyn FnMut(&mut egui::Ui) + Send>;

/// Render-thread half of a window's metadata
pub struct WindowData {
    shared: Arc<WindowShared>,
    pub(crate) category: String,
    preferred_content_size: Vec2,
    help: String,
    /// Whether the window sat in a dock area last frame
    pub docked: bool,
    pub layout_command: Option<LayoutCommand>,
    /// Geometry restored from a settings stream
    pub saved_geometry: Option<Rect>,
    /// Window rectangle on screen last frame
    pub last_rect: Option<Rect>,
    /// Title bar, margins and stroke egui drew around the content, once measured
    pub(crate) chrome: Option<Vec2>,
    pub(crate) pre_render_hooks: Vec<(String, PreRenderHook)>,
    pub(crate) panel: Option<Box<dyn Panel>>,
}

impl WindowData {
    pub(crate) fn new(shared: Arc<WindowShared>) -> Self {
        Self {
            shared,
            category: DEFAULT_CATEGORY.to_string(),
            preferred_content_size: DEFAULT_CONTENT_SIZE,
            help: DEFAULT_HELP.to_string(),
            docked: false,
            layout_command: None,
            saved_geometry: None,
            last_rect: None,
            chrome: None,
            pre_render_hooks: Vec::new(),
            panel: None,
        }
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn id(&self) -> PanelId {
        self.shared.id()
    }

    pub fn shared(&self) -> &Arc<WindowShared> {
        &self.shared
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn set_help(&mut self, help: &str) {
        self.help = help.to_string();
    }

    pub fn is_visible(&self) -> bool {
        self.shared.is_visible()
    }

    pub fn set_visible(&self, visible: bool) {
        self.shared.visibility().set(visible);
    }

    pub fn visibility(&self) -> &VisibilityFlag {
        self.shared.visibility()
    }

    /// True once a concrete panel is bound to this name
    pub fn has_panel(&self) -> bool {
        self.panel.is_some()
    }

    pub fn panel(&self) -> Option<&dyn Panel> {
        self.panel.as_deref()
    }

    pub fn preferred_content_size(&self) -> Vec2 {
        self.preferred_content_size
    }

    pub fn set_preferred_content_size(&mut self, size: Vec2) {
        self.preferred_content_size = size;
    }

    /// Frame size measured on screen, if a layout command was applied already
    pub fn measured_chrome(&self) -> Option<Vec2> {
        self.chrome
    }

    /// Measured frame size, or `estimate` before the window was laid out
    pub fn window_chrome(&self, estimate: Vec2) -> Vec2 {
        self.chrome.unwrap_or(estimate)
    }

    /// Preferred size of the whole window, frame included
    pub fn preferred_window_size(&self, chrome: Vec2) -> Vec2 {
        self.preferred_content_size + chrome
    }

    pub fn set_preferred_window_size(&mut self, size: Vec2, chrome: Vec2) {
        self.preferred_content_size = (size - chrome).max(Vec2::ZERO);
    }

    /// Names of the pre-render hooks in execution order
    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.pre_render_hooks.iter().map(|(name, _)| name.as_str())
    }

    /// Install, replace (keeping its slot) or remove a pre-render hook
    pub fn set_pre_render_hook(&mut self, name: &str, hook: Option<PreRenderHook>) {
        let existing = self.pre_render_hooks.iter().position(|(n, _)| n == name);
        match (existing, hook) {
            (Some(index), Some(hook)) => self.pre_render_hooks[index].1 = hook,
            (None, Some(hook)) => self.pre_render_hooks.push((name.to_string(), hook)),
            (Some(index), None) => {
                self.pre_render_hooks.remove(index);
            }
            (None, None) => {}
        }
    }
}

impl std::fmt::Debug for WindowData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowData")
            .field("name", &self.name())
            .field("category", &self.category)
            .field("preferred_content_size", &self.preferred_content_size)
            .field("visible", &self.is_visible())
            .field("docked", &self.docked)
            .field("layout_command", &self.layout_command)
            .field("hooks", &self.pre_render_hooks.len())
            .field("has_panel", &self.has_panel())
            .finish()
    }
}

/// Property update for [`WindowManager::set_window_properties`]
///
/// Unset fields, an empty category and non-positive sizes leave the current
/// value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowProperties {
    pub category: Option<String>,
    pub help: Option<String>,
    pub preferred_width: Option<f32>,
    pub preferred_height: Option<f32>,
}

impl WindowProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn preferred_size(mut self, width: f32, height: f32) -> Self {
        self.preferred_width = Some(width);
        self.preferred_height = Some(height);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(name: &str) -> WindowData {
        WindowData::new(Arc::new(WindowShared::new(name)))
    }

    #[test]
    fn test_defaults() {
        let window = data("A");
        assert_eq!(window.category(), DEFAULT_CATEGORY);
        assert_eq!(window.help(), DEFAULT_HELP);
        assert_eq!(window.preferred_content_size(), Vec2::new(320.0, 240.0));
        assert!(window.is_visible());
        assert!(!window.docked);
        assert!(!window.has_panel());
        assert_eq!(window.id(), PanelId::from_name("A"));
    }

    #[test]
    fn test_panel_id_is_name_hash() {
        assert_eq!(PanelId::from_name("Plot1"), PanelId::from_name("Plot1"));
        assert_ne!(PanelId::from_name("Plot1"), PanelId::from_name("Plot2"));
        assert_ne!(PanelId::from_name("Plot1").window_id(), egui::Id::new("Plot1"));
    }

    #[test]
    fn test_window_size_includes_chrome() {
        let mut window = data("A");
        let chrome = Vec2::new(14.0, 34.0);
        assert_eq!(window.preferred_window_size(chrome), Vec2::new(334.0, 274.0));

        window.set_preferred_window_size(Vec2::new(400.0, 320.0), chrome);
        assert_eq!(window.preferred_content_size(), Vec2::new(386.0, 286.0));

        window.set_preferred_window_size(Vec2::new(10.0, 10.0), chrome);
        assert_eq!(window.preferred_content_size(), Vec2::ZERO);
    }

    #[test]
    fn test_measured_chrome_replaces_estimate() {
        let mut window = data("A");
        let estimate = Vec2::new(12.0, 30.0);
        assert_eq!(window.window_chrome(estimate), estimate);

        window.chrome = Some(Vec2::new(14.0, 36.0));
        assert_eq!(window.window_chrome(estimate), Vec2::new(14.0, 36.0));
    }

    #[test]
    fn test_visibility_flag_is_shared() {
        let window = data("A");
        let flag = window.visibility().clone();
        window.set_visible(false);
        assert!(!flag.get());
        assert!(flag.same_flag(window.visibility()));
        assert!(!flag.same_flag(&VisibilityFlag::new(false)));
    }

    #[test]
    fn test_hooks_keep_insertion_order() {
        let mut window = data("A");
        window.set_pre_render_hook("b", Some(Box::new(|_: &mut egui::Ui| {})));
        window.set_pre_render_hook("a", Some(Box::new(|_: &mut egui::Ui| {})));
        window.set_pre_render_hook("c", Some(Box::new(|_: &mut egui::Ui| {})));
        assert_eq!(window.hook_names().collect::<Vec<_>>(), ["b", "a", "c"]);

        // Replacing keeps the slot
        window.set_pre_render_hook("b", Some(Box::new(|_: &mut egui::Ui| {})));
        assert_eq!(window.hook_names().collect::<Vec<_>>(), ["b", "a", "c"]);

        window.set_pre_render_hook("a", None);
        window.set_pre_render_hook("missing", None);
        assert_eq!(window.hook_names().collect::<Vec<_>>(), ["b", "c"]);
    }

    #[test]
    fn test_feed_downcast() {
        let shared = WindowShared::new("A");
        assert!(shared.feed::<String>().is_none());
        assert!(shared.bind_feed(Arc::new(String::from("feed"))));
        assert!(!shared.bind_feed(Arc::new(5u32)));

        assert_eq!(shared.feed::<String>().as_deref().map(String::as_str), Some("feed"));
        assert!(shared.feed::<u32>().is_none());
    }

    #[test]
    fn test_properties_builder() {
        let props = WindowProperties::new()
            .category("Images")
            .help("help")
            .preferred_size(640.0, 480.0);
        assert_eq!(props.category.as_deref(), Some("Images"));
        assert_eq!(props.help.as_deref(), Some("help"));
        assert_eq!(props.preferred_width, Some(640.0));
        assert_eq!(props.preferred_height, Some(480.0));
    }
}
