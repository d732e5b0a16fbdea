//! CVLog - thread-safe visual logging into egui panels
//!
//! Worker threads publish images, plot samples and key/value text by panel
//! name; the render thread drains them once per frame into floating windows
//! with a category sidebar, layout presets and per-panel hooks.

pub mod api;
pub mod bitmap;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod context;
pub mod layout;
pub mod panel;
pub mod settings;
pub mod sidebar;
pub mod tasks;
pub mod tracing;
pub mod util;
pub mod viewer;
pub mod window;

// Re-export commonly used types
pub use api::{
    add_menu_bar_callback, add_plot_value, add_value, clear_all, clear_window, find_or_create_window,
    find_window, init, load_layout, render, run_once, save_layout, save_settings,
    set_per_frame_callback, set_window_pre_render_callback, set_window_properties,
    tile_and_scale_visible_windows, update_image, window_is_visible, window_visibility,
};
pub use bitmap::{Bitmap, PixelData, PixelFormat};
pub use config::CvLogConfig;
pub use context::CvLog;
pub use panel::{ImagePanel, Panel, PanelType, PlotPanel, ValueListPanel};
pub use window::{VisibilityFlag, WindowManager, WindowProperties};
