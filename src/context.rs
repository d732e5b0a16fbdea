//! The CVLog context: task queue, producer index and render-thread state
//!
//! Producer threads only touch the [`TaskQueue`] and the [`WindowIndex`].
//! Everything else sits behind a mutex that the render thread takes once per
//! frame. Per-frame callbacks run outside that mutex and may call back into
//! the context freely. Tasks, pre-render hooks and menu callbacks run inside
//! it; the frame is marked as held by the render thread so that calls made
//! from there never wait on the mutex: `find_or_create_window` binds the
//! panel at once and registers it on the next frame, file actions run when
//! the frame ends and `with_windows` returns `None`.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::bitmap::Bitmap;
use crate::config::CvLogConfig;
use crate::layout;
use crate::panel::{ImagePanel, PanelType, PlotPanel, ValueListPanel};
use crate::settings::SettingsStore;
use crate::sidebar::{self, Sidebar, SidebarAction};
use crate::tasks::{PerFrameCallback, TaskQueue};
use crate::util::lock;
use crate::window::registry::MenuCallback;
use crate::window::{PreRenderHook, VisibilityFlag, WindowIndex, WindowManager, WindowProperties};

struct RenderState {
    windows: WindowManager,
    settings: SettingsStore,
    sidebar: Sidebar,
}

/// Work deferred to the end of the frame being drawn
type FrameEndTask = Box<dyn FnOnce(&mut RenderState) + Send>;

/// Render state locked by the frame driver, marked with the drawing thread
struct FrameState<'a> {
    state: MutexGuard<'a, RenderState>,
    owner: &'a Mutex<Option<ThreadId>>,
}

impl Deref for FrameState<'_> {
    type Target = RenderState;

    fn deref(&self) -> &RenderState {
        &self.state
    }
}

impl DerefMut for FrameState<'_> {
    fn deref_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }
}

impl Drop for FrameState<'_> {
    fn drop(&mut self) {
        *lock(self.owner) = None;
    }
}

pub struct CvLog {
    tasks: TaskQueue,
    index: Arc<WindowIndex>,
    state: Mutex<RenderState>,
    /// Thread holding `state` while it draws a frame
    frame_owner: Mutex<Option<ThreadId>>,
    frame_end: Mutex<Vec<FrameEndTask>>,
    layouts_dir: Mutex<Option<PathBuf>>,
}

impl Default for CvLog {
    fn default() -> Self {
        Self::new()
    }
}

impl CvLog {
    /// Context with the default settings handlers and no autosave
    pub fn new() -> Self {
        let index = Arc::new(WindowIndex::new());
        let mut settings = SettingsStore::new();
        settings.install_defaults();
        Self {
            tasks: TaskQueue::new(),
            state: Mutex::new(RenderState {
                windows: WindowManager::new(Arc::clone(&index), layout::SIDEBAR_WIDTH),
                settings,
                sidebar: Sidebar::new(layout::SIDEBAR_WIDTH, None),
            }),
            index,
            frame_owner: Mutex::new(None),
            frame_end: Mutex::new(Vec::new()),
            layouts_dir: Mutex::new(None),
        }
    }

    /// Process-wide context used by the free functions in [`crate::api`]
    pub fn global() -> &'static CvLog {
        static GLOBAL: OnceLock<CvLog> = OnceLock::new();
        GLOBAL.get_or_init(CvLog::new)
    }

    fn state(&self) -> MutexGuard<'_, RenderState> {
        lock(&self.state)
    }

    fn frame_state(&self) -> FrameState<'_> {
        let state = lock(&self.state);
        *lock(&self.frame_owner) = Some(thread::current().id());
        FrameState {
            state,
            owner: &self.frame_owner,
        }
    }

    /// True when called back from a task, hook or menu callback of a frame
    /// this thread is drawing
    pub fn in_frame(&self) -> bool {
        *lock(&self.frame_owner) == Some(thread::current().id())
    }

    fn at_frame_end(&self, task: impl FnOnce(&mut RenderState) + Send + 'static) {
        lock(&self.frame_end).push(Box::new(task));
    }

    /// Apply sidebar, layouts and autosave settings, then load the settings file
    ///
    /// A missing settings file is not an error; an unreadable one is logged.
    pub fn configure(&self, config: &CvLogConfig) {
        let mut state = self.state();
        let RenderState {
            windows,
            settings,
            sidebar,
        } = &mut *state;

        windows.set_sidebar_width(config.sidebar_width);
        sidebar.set_width(config.sidebar_width);
        sidebar.set_layouts_dir(config.layouts_dir.clone());
        *lock(&self.layouts_dir) = config.layouts_dir.clone();

        let Some(path) = config.settings_path() else {
            tracing::debug!("Settings autosave disabled");
            return;
        };
        if path.exists() {
            if let Err(e) = settings.load_file(windows, &path) {
                tracing::error!("{:#}", e);
            }
        }
        let interval = Duration::try_from_secs_f32(config.autosave_interval_secs.max(0.0))
            .unwrap_or(Duration::MAX);
        settings.enable_autosave(path, interval);
    }

    /// Drive one frame: tasks, per-frame callbacks, sidebar, panels, autosave
    ///
    /// Returns the error of a failed sidebar file action; the rest of the
    /// frame is still drawn.
    pub fn render(&self, ctx: &egui::Context) -> Result<()> {
        #[allow(deprecated)]
        let viewport = ctx.screen_rect();

        let frame = self.tasks.take_frame();
        {
            let mut state = self.frame_state();
            state.windows.set_frame_geometry(viewport, &ctx.style());
            if !frame.one_shot.is_empty() {
                tracing::trace!("Running {} queued tasks", frame.one_shot.len());
            }
            for task in frame.one_shot {
                task(&mut state.windows);
            }
        }

        for callback in &frame.per_frame {
            callback(ctx);
        }

        let mut state = self.frame_state();
        let actions = {
            let RenderState {
                windows, sidebar, ..
            } = &mut *state;
            sidebar.show(ctx, windows)
        };

        let mut result = Ok(());
        for action in actions {
            if let Err(e) = apply_action(&mut *state, action) {
                tracing::error!("{:#}", e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        state.windows.render_windows(ctx);

        let deferred = std::mem::take(&mut *lock(&self.frame_end));
        for task in deferred {
            task(&mut *state);
        }

        let RenderState {
            windows, settings, ..
        } = &mut *state;
        let now = Instant::now();
        if windows.take_settings_dirty() {
            settings.mark_dirty(now);
        }
        settings.autosave_if_due(windows, now);

        result
    }

    /// Apply a sidebar gesture as if it was clicked this frame
    ///
    /// From inside a frame the action runs when the frame ends and failures
    /// are logged.
    pub fn apply_sidebar_action(&self, action: SidebarAction) -> Result<()> {
        if self.in_frame() {
            self.at_frame_end(move |state| {
                if let Err(e) = apply_action(state, action) {
                    tracing::error!("{:#}", e);
                }
            });
            return Ok(());
        }
        apply_action(&mut self.state(), action)
    }

    /// Queue a closure for the next frame
    pub fn run_once(&self, task: impl FnOnce(&mut WindowManager) + Send + 'static) {
        self.tasks.push(Box::new(task));
    }

    /// Install (`Some`) or remove (`None`) a callback run every frame
    pub fn set_per_frame_callback(&self, name: &str, callback: Option<PerFrameCallback>) {
        self.tasks.set_per_frame(name, callback);
    }

    pub fn clear_all(&self) {
        self.run_once(|windows| windows.clear_all());
    }

    pub fn clear_window(&self, name: &str) {
        let name = name.to_string();
        self.run_once(move |windows| windows.clear_window(&name));
    }

    pub fn set_window_properties(&self, name: &str, properties: WindowProperties) {
        let name = name.to_string();
        self.run_once(move |windows| windows.set_window_properties(&name, &properties));
    }

    /// Add, replace or (with `None`) remove a hook drawn above a panel body
    pub fn set_window_pre_render_callback(
        &self,
        window: &str,
        hook_name: &str,
        hook: Option<PreRenderHook>,
    ) {
        let window = window.to_string();
        let hook_name = hook_name.to_string();
        self.run_once(move |windows| windows.set_pre_render_hook(&window, &hook_name, hook));
    }

    pub fn add_menu_bar_callback(&self, name: &str, callback: MenuCallback) {
        let name = name.to_string();
        self.run_once(move |windows| windows.add_menu_bar_callback(&name, callback));
    }

    pub fn tile_and_scale_visible_windows(&self) {
        self.run_once(|windows| {
            windows.tile_and_scale_visible_windows();
        });
    }

    /// Visibility of `name`; false for windows never referenced
    pub fn window_is_visible(&self, name: &str) -> bool {
        self.index.find(name).is_some_and(|shared| shared.is_visible())
    }

    /// Lock-free handle on the visibility of a known window
    pub fn window_visibility(&self, name: &str) -> Option<VisibilityFlag> {
        self.index
            .find(name)
            .map(|shared| shared.visibility().clone())
    }

    /// Feed of an existing `T` panel, without creating anything
    pub fn find_window<T: PanelType>(&self, name: &str) -> Option<Arc<T::Feed>> {
        self.index.find(name)?.feed::<T::Feed>()
    }

    /// Feed of the `T` panel named `name`, creating it now if needed
    pub fn find_or_create_window<T: PanelType>(&self, name: &str) -> Option<Arc<T::Feed>> {
        if let Some(feed) = self.find_window::<T>(name) {
            return Some(feed);
        }
        if self.in_frame() {
            return self.create_window_in_frame::<T>(name);
        }
        self.state().windows.find_or_create_window::<T>(name)
    }

    /// Bind a new panel right away; the registry adopts it on the next frame
    fn create_window_in_frame<T: PanelType>(&self, name: &str) -> Option<Arc<T::Feed>> {
        let shared = self.index.find_or_insert(name);
        if shared.has_panel() {
            let feed = shared.feed::<T::Feed>();
            if feed.is_none() {
                tracing::warn!(
                    "Window {:?} exists with a different panel type than {}",
                    name,
                    std::any::type_name::<T>()
                );
            }
            return feed;
        }

        let panel = T::create(Arc::clone(&shared));
        let feed = panel.feed();
        shared.bind_feed(feed.clone());
        let name = name.to_string();
        self.run_once(move |windows| {
            windows.add_window(&name, panel);
        });
        Some(feed)
    }

    pub fn update_image(&self, window: &str, bitmap: Bitmap) {
        if let Some(feed) = self.find_window::<ImagePanel>(window) {
            feed.update_image(bitmap);
            return;
        }
        let window = window.to_string();
        self.run_once(move |windows| {
            if let Some(feed) = windows.find_or_create_window::<ImagePanel>(&window) {
                feed.update_image(bitmap);
            }
        });
    }

    /// Append a sample to `group` of plot `window`; `style` is `#RRGGBBAA`
    pub fn add_plot_value(&self, window: &str, group: &str, y: f64, x: f64, style: Option<&str>) {
        if let Some(feed) = self.find_window::<PlotPanel>(window) {
            feed.add_plot_value(group, y, x, style);
            return;
        }
        let window = window.to_string();
        let group = group.to_string();
        let style = style.map(str::to_string);
        self.run_once(move |windows| {
            if let Some(feed) = windows.find_or_create_window::<PlotPanel>(&window) {
                feed.add_plot_value(&group, y, x, style.as_deref());
            }
        });
    }

    pub fn add_value(&self, window: &str, name: &str, value: impl ToString) {
        let value = value.to_string();
        if let Some(feed) = self.find_window::<ValueListPanel>(window) {
            feed.add_value(name, &value);
            return;
        }
        let window = window.to_string();
        let name = name.to_string();
        self.run_once(move |windows| {
            if let Some(feed) = windows.find_or_create_window::<ValueListPanel>(&window) {
                feed.add_value(&name, &value);
            }
        });
    }

    /// Run `f` with exclusive access to the window registry
    ///
    /// Returns `None` without running `f` when called from inside a frame
    /// (a task, hook or menu callback); use [`CvLog::run_once`] there.
    pub fn with_windows<R>(&self, f: impl FnOnce(&mut WindowManager) -> R) -> Option<R> {
        if self.in_frame() {
            tracing::error!("with_windows called while drawing a frame; use run_once");
            return None;
        }
        Some(f(&mut self.state().windows))
    }

    /// Write the layout to `path`
    ///
    /// From inside a frame the file is written when the frame ends and
    /// failures are logged.
    pub fn save_layout(&self, path: &Path) -> Result<()> {
        if self.in_frame() {
            let path = path.to_path_buf();
            self.at_frame_end(move |state| {
                if let Err(e) = state.settings.save_file(&state.windows, &path) {
                    tracing::error!("{:#}", e);
                }
            });
            return Ok(());
        }
        let state = self.state();
        state.settings.save_file(&state.windows, path)
    }

    /// Apply the layout stored in `path`; deferred like [`CvLog::save_layout`]
    pub fn load_layout(&self, path: &Path) -> Result<()> {
        if self.in_frame() {
            let path = path.to_path_buf();
            self.at_frame_end(move |state| {
                if let Err(e) = load_into(state, &path) {
                    tracing::error!("{:#}", e);
                }
            });
            return Ok(());
        }
        load_into(&mut self.state(), path)
    }

    /// Where "Save Layout As..." writes a layout named `name`
    pub fn layout_path(&self, name: &str) -> PathBuf {
        sidebar::layout_file(lock(&self.layouts_dir).as_deref(), name)
    }

    /// Write the autosave file now, if one is configured
    pub fn save_settings(&self) {
        if self.in_frame() {
            self.at_frame_end(|state| state.settings.flush(&state.windows));
            return;
        }
        let mut state = self.state();
        let RenderState {
            windows, settings, ..
        } = &mut *state;
        settings.flush(windows);
    }

    /// One-shot tasks waiting for the next frame
    pub fn pending_tasks(&self) -> usize {
        self.tasks.pending_len()
    }
}

fn load_into(state: &mut RenderState, path: &Path) -> Result<()> {
    let RenderState {
        windows, settings, ..
    } = state;
    settings.load_file(windows, path)?;
    windows.mark_settings_dirty();
    Ok(())
}

fn apply_action(state: &mut RenderState, action: SidebarAction) -> Result<()> {
    let RenderState {
        windows,
        settings,
        sidebar,
    } = state;

    match action {
        SidebarAction::ShowAll => windows.set_all_visible(true),
        SidebarAction::HideAll => windows.set_all_visible(false),
        SidebarAction::TileWindows => {
            windows.tile_and_scale_visible_windows();
        }
        SidebarAction::ClearAll => windows.clear_all(),
        SidebarAction::OpenSaveDialog => sidebar.open_save_dialog(),
        SidebarAction::CancelSave => sidebar.close_save_dialog(),
        SidebarAction::SaveLayout(name) => {
            let path = sidebar.layout_path(&name);
            match settings.save_file(windows, &path) {
                Ok(()) => sidebar.close_save_dialog(),
                Err(e) => {
                    sidebar.set_save_error(format!("{:#}", e));
                    return Err(e);
                }
            }
        }
        SidebarAction::LoadPreset(path) => {
            settings.load_file(windows, &path)?;
            windows.mark_settings_dirty();
        }
        SidebarAction::SetVisible(name, visible) => windows.set_visible(&name, visible),
        SidebarAction::SetCategoryVisible(category, visible) => {
            windows.set_category_visible(&category, visible)
        }
    }
    Ok(())
}
