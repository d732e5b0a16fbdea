//! Window registry
//!
//! [`WindowIndex`] is the only part producers touch: a mutex-guarded map from
//! [`PanelId`] to the shared half of each window. Entries are never removed.
//!
//! [`WindowManager`] owns everything else and lives on the render thread.
//! Tasks queued by producers receive `&mut WindowManager`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use egui::{Rect, Vec2};

use super::{
    CategoryIndex, CategoryState, LayoutCommand, LayoutCondition, PanelId, PreRenderHook,
    WindowData, WindowProperties, WindowShared,
};
use crate::layout::{self, TilePlan, TileRequest};
use crate::panel::{Panel, PanelType};
use crate::util::lock;

/// Application contribution to the sidebar menu bar
pub type MenuCallback = Box<dyn FnMut(&mut egui::Ui) + Send>;

/// Thread-safe id -> window lookup used by producers
#[derive(Debug, Default)]
pub struct WindowIndex {
    by_id: Mutex<HashMap<PanelId, Arc<WindowShared>>>,
}

impl WindowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a window by name; `None` if it was never registered
    pub fn find(&self, name: &str) -> Option<Arc<WindowShared>> {
        let shared = lock(&self.by_id).get(&PanelId::from_name(name)).cloned()?;
        if shared.name() != name {
            tracing::error!(
                "Window name hash collision: {:?} and {:?}",
                name,
                shared.name()
            );
            debug_assert!(false, "window name hash collision: {name:?} vs {:?}", shared.name());
            return None;
        }
        Some(shared)
    }

    pub fn len(&self) -> usize {
        lock(&self.by_id).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared half registered for `name`, registering a fresh one if needed
    pub(crate) fn find_or_insert(&self, name: &str) -> Arc<WindowShared> {
        let mut by_id = lock(&self.by_id);
        let shared = by_id
            .entry(PanelId::from_name(name))
            .or_insert_with(|| Arc::new(WindowShared::new(name)));
        Arc::clone(shared)
    }
}

/// Render-thread owner of all window metadata
pub struct WindowManager {
    index: Arc<WindowIndex>,
    windows: Vec<WindowData>,
    slots: HashMap<PanelId, usize>,
    categories: CategoryIndex,
    menu_callbacks: Vec<(String, MenuCallback)>,
    viewport: Rect,
    title_bar_height: f32,
    chrome_estimate: Vec2,
    sidebar_width: f32,
    settings_dirty: bool,
}

impl WindowManager {
    pub fn new(index: Arc<WindowIndex>, sidebar_width: f32) -> Self {
        Self {
            index,
            windows: Vec::new(),
            slots: HashMap::new(),
            categories: CategoryIndex::new(),
            menu_callbacks: Vec::new(),
            viewport: Rect::from_min_size(egui::Pos2::ZERO, Vec2::new(1280.0, 720.0)),
            title_bar_height: layout::title_bar_height(&egui::Style::default()),
            chrome_estimate: layout::window_chrome(&egui::Style::default()),
            sidebar_width,
            settings_dirty: false,
        }
    }

    /// Record this frame's viewport and the window frame sizes of `style`
    pub fn set_frame_geometry(&mut self, viewport: Rect, style: &egui::Style) {
        self.viewport = viewport;
        self.title_bar_height = layout::title_bar_height(style);
        self.chrome_estimate = layout::window_chrome(style);
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Viewport minus the sidebar
    pub fn workspace(&self) -> Rect {
        layout::workspace_rect(self.viewport, self.sidebar_width)
    }

    pub fn title_bar_height(&self) -> f32 {
        self.title_bar_height
    }

    /// Frame size assumed for windows that were not laid out yet
    pub fn chrome_estimate(&self) -> Vec2 {
        self.chrome_estimate
    }

    pub fn sidebar_width(&self) -> f32 {
        self.sidebar_width
    }

    pub fn set_sidebar_width(&mut self, width: f32) {
        self.sidebar_width = width;
    }

    pub fn index(&self) -> &Arc<WindowIndex> {
        &self.index
    }

    /// Windows in creation order
    pub fn windows(&self) -> &[WindowData] {
        &self.windows
    }

    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    pub fn window(&self, name: &str) -> Option<&WindowData> {
        self.slot(name).map(|slot| &self.windows[slot])
    }

    pub fn window_mut(&mut self, name: &str) -> Option<&mut WindowData> {
        self.slot(name).map(|slot| &mut self.windows[slot])
    }

    pub fn window_at(&self, slot: usize) -> Option<&WindowData> {
        self.windows.get(slot)
    }

    fn slot(&self, name: &str) -> Option<usize> {
        let slot = *self.slots.get(&PanelId::from_name(name))?;
        (self.windows[slot].name() == name).then_some(slot)
    }

    fn find_or_create_slot(&mut self, name: &str) -> usize {
        let id = PanelId::from_name(name);
        if let Some(&slot) = self.slots.get(&id) {
            let existing = self.windows[slot].name();
            if existing != name {
                tracing::error!("Window name hash collision: {:?} and {:?}", name, existing);
                debug_assert!(false, "window name hash collision: {name:?} vs {existing:?}");
            }
            return slot;
        }

        // a panel bound from inside a frame may have registered the shared half already
        let shared = self.index.find_or_insert(name);
        let data = WindowData::new(shared);
        let slot = self.windows.len();
        self.categories.insert(data.category(), slot);
        self.windows.push(data);
        self.slots.insert(id, slot);
        tracing::debug!("Registered window {:?}", name);
        slot
    }

    /// Metadata for `name`, created with defaults on first use
    pub fn find_or_create_data(&mut self, name: &str) -> &mut WindowData {
        let slot = self.find_or_create_slot(name);
        &mut self.windows[slot]
    }

    /// Bind a concrete panel to `name` and schedule its first placement
    ///
    /// Returns `None` when the name is already bound to a panel.
    pub fn add_window<T: PanelType>(&mut self, name: &str, panel: T) -> Option<Arc<T::Feed>> {
        let workspace = self.workspace();
        let chrome_estimate = self.chrome_estimate;
        let data = self.find_or_create_data(name);
        if data.panel.is_some() {
            tracing::warn!("Window {:?} already has a panel", name);
            return None;
        }

        let feed = panel.feed();
        data.shared().bind_feed(feed.clone());
        data.panel = Some(Box::new(panel));

        let command = match data.saved_geometry {
            Some(rect) => LayoutCommand::always(rect),
            None => {
                let size = data.preferred_window_size(data.window_chrome(chrome_estimate));
                let pos = layout::initial_position(size, workspace, &mut rand::rng());
                LayoutCommand::first_use(pos, size)
            }
        };
        data.layout_command = Some(command);
        tracing::debug!("Created {} panel {:?}", std::any::type_name::<T>(), name);
        Some(feed)
    }

    /// Feed of the `T` panel named `name`, creating the panel if needed
    ///
    /// Returns `None` when the name is bound to a panel of another type.
    pub fn find_or_create_window<T: PanelType>(&mut self, name: &str) -> Option<Arc<T::Feed>> {
        let data = self.find_or_create_data(name);
        if data.panel.is_none() {
            let panel = T::create(Arc::clone(data.shared()));
            return self.add_window(name, panel);
        }

        let feed = data.shared().feed::<T::Feed>();
        if feed.is_none() {
            tracing::warn!(
                "Window {:?} exists with a different panel type than {}",
                name,
                std::any::type_name::<T>()
            );
        }
        feed
    }

    /// Render half of the `T` panel named `name`
    pub fn panel<T: PanelType>(&self, name: &str) -> Option<&T> {
        self.window(name)?.panel.as_ref()?.as_any().downcast_ref::<T>()
    }

    pub fn panel_mut<T: PanelType>(&mut self, name: &str) -> Option<&mut T> {
        self.window_mut(name)?
            .panel
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Move a window to another category, creating the category on first use
    pub fn set_category(&mut self, name: &str, category: &str) {
        let slot = self.find_or_create_slot(name);
        let data = &mut self.windows[slot];
        if data.category == category {
            return;
        }
        self.categories.reassign(slot, &data.category, category);
        data.category = category.to_string();
    }

    /// Apply a property update; unset values keep their current setting
    pub fn set_window_properties(&mut self, name: &str, properties: &WindowProperties) {
        if let Some(category) = properties.category.as_deref().filter(|c| !c.is_empty()) {
            self.set_category(name, category);
        }

        let data = self.find_or_create_data(name);
        if let Some(help) = &properties.help {
            data.set_help(help);
        }
        let mut size = data.preferred_content_size();
        if let Some(width) = properties.preferred_width.filter(|w| *w > 0.0) {
            size.x = width;
        }
        if let Some(height) = properties.preferred_height.filter(|h| *h > 0.0) {
            size.y = height;
        }
        data.set_preferred_content_size(size);
    }

    /// Install, replace or (with `None`) remove a pre-render hook of a window
    pub fn set_pre_render_hook(&mut self, window: &str, hook_name: &str, hook: Option<PreRenderHook>) {
        self.find_or_create_data(window)
            .set_pre_render_hook(hook_name, hook);
    }

    /// Add a menu to the sidebar menu bar; an existing menu of that name is replaced in place
    pub fn add_menu_bar_callback(&mut self, name: &str, callback: MenuCallback) {
        match self.menu_callbacks.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = callback,
            None => self.menu_callbacks.push((name.to_string(), callback)),
        }
    }

    pub fn menu_names(&self) -> impl Iterator<Item = &str> {
        self.menu_callbacks.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn menu_callbacks_mut(&mut self) -> &mut [(String, MenuCallback)] {
        &mut self.menu_callbacks
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) {
        if let Some(data) = self.window(name) {
            if data.is_visible() != visible {
                data.set_visible(visible);
                self.settings_dirty = true;
            }
        }
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        for data in &self.windows {
            data.set_visible(visible);
        }
        self.settings_dirty = true;
    }

    pub fn set_category_visible(&mut self, category: &str, visible: bool) {
        if let Some(category) = self.categories.get(category) {
            for &slot in &category.windows {
                self.windows[slot].set_visible(visible);
            }
            self.settings_dirty = true;
        }
    }

    /// Aggregate visibility of a category's windows
    pub fn category_state(&self, category: &str) -> Option<CategoryState> {
        let category = self.categories.get(category)?;
        let visible = category
            .windows
            .iter()
            .filter(|&&slot| self.windows[slot].is_visible())
            .count();
        Some(CategoryState::from_counts(visible, category.windows.len()))
    }

    /// Clear the content of every panel
    pub fn clear_all(&mut self) {
        for panel in self.windows.iter_mut().filter_map(|w| w.panel.as_mut()) {
            panel.clear();
        }
    }

    pub fn clear_window(&mut self, name: &str) {
        match self.window_mut(name).and_then(|w| w.panel.as_mut()) {
            Some(panel) => panel.clear(),
            None => tracing::debug!("Nothing to clear in window {:?}", name),
        }
    }

    /// Tile every visible, undocked panel into the workspace
    ///
    /// Emits an `Always` layout command (with focus) for each placed window.
    pub fn tile_and_scale_visible_windows(&mut self) -> TilePlan {
        let chrome_estimate = self.chrome_estimate;
        let candidates: Vec<usize> = self
            .windows
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_visible() && !w.docked && w.has_panel())
            .map(|(slot, _)| slot)
            .collect();
        let requests: Vec<TileRequest> = candidates
            .iter()
            .map(|&slot| {
                let data = &self.windows[slot];
                TileRequest {
                    name: data.name().to_string(),
                    content_size: data.preferred_content_size(),
                    window_size: data.preferred_window_size(data.window_chrome(chrome_estimate)),
                }
            })
            .collect();

        let plan = layout::tile_and_scale(&requests, self.workspace());
        if !plan.fits {
            tracing::warn!(
                "Tiling {} windows overflows the viewport even at scale {:.3}",
                requests.len(),
                plan.scale
            );
        }
        for &(request, rect) in &plan.placements {
            self.windows[candidates[request]].layout_command =
                Some(LayoutCommand::always(rect).with_focus());
        }
        plan
    }

    pub fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Whether persisted state changed since the last call
    pub fn take_settings_dirty(&mut self) -> bool {
        std::mem::take(&mut self.settings_dirty)
    }

    /// Draw every visible panel in its own egui window
    ///
    /// Layout commands describe the outer window rectangle. The frame egui
    /// draws around the content is measured the first time a command is
    /// applied; an `Always` command placed with the estimate is repeated once
    /// with the measured frame.
    pub(crate) fn render_windows(&mut self, ctx: &egui::Context) {
        let title_bar_height = self.title_bar_height;
        let chrome_estimate = self.chrome_estimate;
        let mut dirty = false;

        for data in &mut self.windows {
            if !data.is_visible() {
                continue;
            }
            let WindowData {
                shared,
                help,
                docked,
                layout_command,
                last_rect,
                chrome,
                preferred_content_size,
                pre_render_hooks,
                panel,
                ..
            } = data;
            let Some(panel) = panel.as_mut() else {
                continue;
            };

            panel.sync(ctx);

            let mut window = egui::Window::new(shared.name()).id(shared.id().window_id());
            let frame = chrome.unwrap_or(chrome_estimate);
            let command = layout_command.take();
            if let Some(command) = command {
                window = apply_layout(window, command, frame);
            }

            let mut open = true;
            let window = panel.begin_frame_window(window).open(&mut open);
            let shown = window.show(ctx, |ui| {
                for (_, hook) in pre_render_hooks.iter_mut() {
                    hook(ui);
                }
                panel.render(ui);
            });

            if let Some(shown) = shown {
                let rect = shown.response.rect;
                let expanded = shown.inner.is_some();

                let measured = command
                    .filter(|c| expanded && c.condition == LayoutCondition::Always)
                    .and_then(|c| {
                        let content = content_size(c.size, frame);
                        (content.x > 0.0 && content.y > 0.0).then(|| rect.size() - content)
                    });
                if let (Some(measured), Some(command)) = (measured, command) {
                    if chrome.is_none() && (measured - frame).length() > 0.5 {
                        *layout_command = Some(command);
                    }
                    *chrome = Some(measured.max(Vec2::ZERO));
                }

                if *last_rect != Some(rect) {
                    dirty = true;
                }
                *last_rect = Some(rect);
                // egui windows never dock
                *docked = false;
                if expanded {
                    *preferred_content_size =
                        content_size(rect.size(), chrome.unwrap_or(chrome_estimate));
                }
                if command.is_some_and(|c| c.focus) {
                    ctx.move_to_top(shown.response.layer_id);
                }

                let title_rect =
                    Rect::from_min_size(rect.min, Vec2::new(rect.width(), title_bar_height));
                if ctx.pointer_hover_pos().is_some_and(|pos| title_rect.contains(pos)) {
                    shown.response.on_hover_ui(|ui| {
                        ui.strong(shared.name());
                        ui.label(help.as_str());
                    });
                }
            }

            if !open {
                shared.visibility().set(false);
                dirty = true;
            }
        }

        self.settings_dirty |= dirty;
    }
}

/// Content size of a window whose outer size is `window_size`
fn content_size(window_size: Vec2, chrome: Vec2) -> Vec2 {
    (window_size - chrome).max(Vec2::ZERO)
}

fn apply_layout(window: egui::Window<'_>, command: LayoutCommand, chrome: Vec2) -> egui::Window<'_> {
    let content = content_size(command.size, chrome);
    match command.condition {
        LayoutCondition::FirstUseEver => window.default_pos(command.pos).default_size(content),
        LayoutCondition::Always => window.current_pos(command.pos).fixed_size(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{ImagePanel, PlotPanel, ValueListPanel};
    use crate::window::DEFAULT_CATEGORY;

    fn manager() -> WindowManager {
        WindowManager::new(Arc::new(WindowIndex::new()), layout::SIDEBAR_WIDTH)
    }

    #[test]
    fn test_find_or_create_data_is_unique_per_name() {
        let mut windows = manager();
        windows.find_or_create_data("A").set_help("first");
        windows.find_or_create_data("A");
        windows.find_or_create_data("B");

        assert_eq!(windows.windows().len(), 2);
        assert_eq!(windows.window("A").map(WindowData::help), Some("first"));
        assert_eq!(windows.index().len(), 2);
        assert_eq!(
            windows.window("A").map(WindowData::id),
            Some(PanelId::from_name("A"))
        );
    }

    #[test]
    fn test_registry_adopts_shared_half_from_index() {
        let mut windows = manager();
        let shared = windows.index().find_or_insert("Early");
        let data = windows.find_or_create_data("Early");
        assert!(Arc::ptr_eq(data.shared(), &shared));
        assert_eq!(windows.index().len(), 1);
    }

    #[test]
    fn test_index_shares_visibility_with_data() {
        let mut windows = manager();
        windows.find_or_create_data("A");
        let shared = windows.index().find("A").unwrap();
        windows.set_visible("A", false);
        assert!(!shared.is_visible());
        assert!(windows.index().find("B").is_none());
    }

    #[test]
    fn test_new_windows_join_default_category() {
        let mut windows = manager();
        windows.find_or_create_data("A");
        assert_eq!(windows.window("A").map(WindowData::category), Some(DEFAULT_CATEGORY));
        assert_eq!(windows.categories().count_memberships(0), 1);
    }

    #[test]
    fn test_set_category_moves_window() {
        let mut windows = manager();
        windows.find_or_create_data("A");
        windows.set_category("A", "Images");
        windows.set_category("A", "Plots");

        assert_eq!(windows.window("A").map(WindowData::category), Some("Plots"));
        assert_eq!(windows.categories().count_memberships(0), 1);
        let names: Vec<_> = windows.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Default", "Images", "Plots"]);
    }

    #[test]
    fn test_properties_ignore_unset_values() {
        let mut windows = manager();
        windows.set_window_properties(
            "A",
            &WindowProperties::new()
                .category("Images")
                .help("help")
                .preferred_size(640.0, 480.0),
        );
        windows.set_window_properties(
            "A",
            &WindowProperties {
                category: Some(String::new()),
                help: None,
                preferred_width: Some(-1.0),
                preferred_height: Some(500.0),
            },
        );

        let data = windows.window("A").unwrap();
        assert_eq!(data.category(), "Images");
        assert_eq!(data.help(), "help");
        assert_eq!(data.preferred_content_size(), Vec2::new(640.0, 500.0));
    }

    #[test]
    fn test_find_or_create_window_creates_once() {
        let mut windows = manager();
        let first = windows.find_or_create_window::<PlotPanel>("P").unwrap();
        let second = windows.find_or_create_window::<PlotPanel>("P").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(windows.panel::<PlotPanel>("P").is_some());

        let shared = windows.index().find("P").unwrap();
        assert!(shared.feed::<crate::panel::PlotFeed>().is_some());
    }

    #[test]
    fn test_find_or_create_window_type_mismatch() {
        let mut windows = manager();
        windows.find_or_create_window::<ValueListPanel>("V").unwrap();
        assert!(windows.find_or_create_window::<ImagePanel>("V").is_none());
        assert!(windows.panel::<ImagePanel>("V").is_none());
        assert!(windows.panel::<ValueListPanel>("V").is_some());
    }

    #[test]
    fn test_new_panel_gets_random_first_use_placement() {
        let mut windows = manager();
        windows.find_or_create_window::<ImagePanel>("I").unwrap();
        let command = windows.window("I").and_then(|w| w.layout_command).unwrap();
        assert_eq!(command.condition, LayoutCondition::FirstUseEver);
        assert!(windows.workspace().contains(command.pos));
    }

    #[test]
    fn test_saved_geometry_wins_over_random_placement() {
        let mut windows = manager();
        let saved = Rect::from_min_size(egui::pos2(300.0, 40.0), Vec2::new(200.0, 150.0));
        windows.find_or_create_data("I").saved_geometry = Some(saved);
        windows.find_or_create_window::<ImagePanel>("I").unwrap();
        let command = windows.window("I").and_then(|w| w.layout_command).unwrap();
        assert_eq!(command, LayoutCommand::always(saved));
    }

    #[test]
    fn test_category_visibility() {
        let mut windows = manager();
        windows.set_category("A", "Plots");
        windows.set_category("B", "Plots");
        assert_eq!(windows.category_state("Plots"), Some(CategoryState::Visible));

        windows.set_visible("A", false);
        assert_eq!(windows.category_state("Plots"), Some(CategoryState::Mixed));

        windows.set_category_visible("Plots", false);
        assert_eq!(windows.category_state("Plots"), Some(CategoryState::Hidden));
        assert!(windows.take_settings_dirty());
        assert!(!windows.take_settings_dirty());
        assert_eq!(windows.category_state("Missing"), None);
    }

    #[test]
    fn test_menu_callbacks_keep_insertion_order() {
        let mut windows = manager();
        windows.add_menu_bar_callback("View", Box::new(|_: &mut egui::Ui| {}));
        windows.add_menu_bar_callback("Debug", Box::new(|_: &mut egui::Ui| {}));
        windows.add_menu_bar_callback("View", Box::new(|_: &mut egui::Ui| {}));
        assert_eq!(windows.menu_names().collect::<Vec<_>>(), ["View", "Debug"]);
    }

    #[test]
    fn test_tiling_skips_hidden_docked_and_unbound_windows() {
        let mut windows = manager();
        for name in ["a", "b", "hidden", "docked"] {
            windows.find_or_create_window::<ValueListPanel>(name).unwrap();
            windows.window_mut(name).unwrap().layout_command = None;
        }
        windows.find_or_create_data("unbound");
        windows.set_visible("hidden", false);
        windows.window_mut("docked").unwrap().docked = true;

        let plan = windows.tile_and_scale_visible_windows();
        assert_eq!(plan.placements.len(), 2);
        for name in ["a", "b"] {
            let command = windows.window(name).and_then(|w| w.layout_command).unwrap();
            assert_eq!(command.condition, LayoutCondition::Always);
            assert!(command.focus);
        }
        for name in ["hidden", "docked", "unbound"] {
            assert!(windows.window(name).and_then(|w| w.layout_command).is_none());
        }
    }
}
