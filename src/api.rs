//! Free functions forwarding to [`CvLog::global`]
//!
//! These are callable from any thread without passing a context around.
//! `render` must only be called from the thread that owns the egui context.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::bitmap::Bitmap;
use crate::config::CvLogConfig;
use crate::context::CvLog;
use crate::panel::PanelType;
use crate::tasks::PerFrameCallback;
use crate::window::registry::MenuCallback;
use crate::window::{PreRenderHook, VisibilityFlag, WindowManager, WindowProperties};

/// Configure the global context and load its settings file
pub fn init(config: &CvLogConfig) {
    CvLog::global().configure(config);
}

pub fn render(ctx: &egui::Context) -> Result<()> {
    CvLog::global().render(ctx)
}

pub fn clear_all() {
    CvLog::global().clear_all();
}

pub fn clear_window(name: &str) {
    CvLog::global().clear_window(name);
}

pub fn set_window_properties(name: &str, properties: WindowProperties) {
    CvLog::global().set_window_properties(name, properties);
}

pub fn set_window_pre_render_callback(window: &str, hook_name: &str, hook: Option<PreRenderHook>) {
    CvLog::global().set_window_pre_render_callback(window, hook_name, hook);
}

pub fn set_per_frame_callback(name: &str, callback: Option<PerFrameCallback>) {
    CvLog::global().set_per_frame_callback(name, callback);
}

pub fn add_menu_bar_callback(name: &str, callback: MenuCallback) {
    CvLog::global().add_menu_bar_callback(name, callback);
}

pub fn run_once(task: impl FnOnce(&mut WindowManager) + Send + 'static) {
    CvLog::global().run_once(task);
}

pub fn tile_and_scale_visible_windows() {
    CvLog::global().tile_and_scale_visible_windows();
}

pub fn window_is_visible(name: &str) -> bool {
    CvLog::global().window_is_visible(name)
}

pub fn window_visibility(name: &str) -> Option<VisibilityFlag> {
    CvLog::global().window_visibility(name)
}

pub fn find_window<T: PanelType>(name: &str) -> Option<Arc<T::Feed>> {
    CvLog::global().find_window::<T>(name)
}

pub fn find_or_create_window<T: PanelType>(name: &str) -> Option<Arc<T::Feed>> {
    CvLog::global().find_or_create_window::<T>(name)
}

pub fn update_image(window: &str, bitmap: Bitmap) {
    CvLog::global().update_image(window, bitmap);
}

pub fn add_plot_value(window: &str, group: &str, y: f64, x: f64, style: Option<&str>) {
    CvLog::global().add_plot_value(window, group, y, x, style);
}

pub fn add_value(window: &str, name: &str, value: impl ToString) {
    CvLog::global().add_value(window, name, value);
}

pub fn save_layout(path: &Path) -> Result<()> {
    CvLog::global().save_layout(path)
}

pub fn load_layout(path: &Path) -> Result<()> {
    CvLog::global().load_layout(path)
}

pub fn save_settings() {
    CvLog::global().save_settings();
}

/// Visibility of a window in the global context, cached after the first hit
///
/// The first evaluation that finds the window stores its [`VisibilityFlag`]
/// in a static owned by this call site; later evaluations read the atomic
/// without any lookup. Unknown windows read as hidden and are looked up
/// again next time. Each call site is bound to the first name it resolves.
///
/// ```no_run
/// if cvlog::fast_visibility_check!("VGAImage") {
///     // build and publish the image
/// }
/// ```
#[macro_export]
macro_rules! fast_visibility_check {
    ($name:expr) => {{
        static FLAG: ::std::sync::OnceLock<$crate::VisibilityFlag> = ::std::sync::OnceLock::new();
        match FLAG.get() {
            Some(flag) => flag.get(),
            None => match $crate::api::window_visibility($name) {
                Some(flag) => FLAG.get_or_init(|| flag).get(),
                None => false,
            },
        }
    }};
}
