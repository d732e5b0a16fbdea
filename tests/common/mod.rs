//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use cvlog::{Bitmap, CvLog, CvLogConfig, PixelFormat};

/// Viewport every headless frame is rendered into
pub fn screen_rect() -> egui::Rect {
    egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1280.0, 720.0))
}

pub fn raw_input() -> egui::RawInput {
    egui::RawInput {
        screen_rect: Some(screen_rect()),
        ..Default::default()
    }
}

/// Run one headless egui frame driving `log`
pub fn render_frame(log: &CvLog, ctx: &egui::Context) -> anyhow::Result<()> {
    let mut result = Ok(());
    let _ = ctx.run(raw_input(), |ctx| {
        result = log.render(ctx);
    });
    result
}

/// Render `count` frames, failing on the first frame error
pub fn render_frames(log: &CvLog, ctx: &egui::Context, count: usize) {
    for _ in 0..count {
        render_frame(log, ctx).unwrap();
    }
}

/// Context that never touches the user's config dir
pub fn isolated_log(layouts_dir: &std::path::Path) -> CvLog {
    let log = CvLog::new();
    log.configure(&CvLogConfig {
        settings_file: None,
        layouts_dir: Some(layouts_dir.to_path_buf()),
        ..CvLogConfig::default()
    });
    log
}

pub fn gray(width: usize, height: usize) -> Bitmap {
    let pixels: Vec<u8> = (0..width * height).map(|i| (i % 256) as u8).collect();
    Bitmap::from_u8(width, height, PixelFormat::Gray8, pixels).unwrap()
}
