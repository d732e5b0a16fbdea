//! Native viewer: an eframe window driving [`CvLog::render`] every frame

use anyhow::{anyhow, Result};

use crate::context::CvLog;

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            title: "CVLog".to_string(),
            width: 1600.0,
            height: 900.0,
        }
    }
}

/// eframe application rendering one [`CvLog`] context
pub struct CvLogApp {
    log: &'static CvLog,
}

impl CvLogApp {
    pub fn new(log: &'static CvLog) -> Self {
        Self { log }
    }
}

impl eframe::App for CvLogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Err(e) = self.log.render(ctx) {
            tracing::error!("Frame action failed: {:#}", e);
        }
        // producers publish without waking the UI
        ctx.request_repaint();
    }
}

/// Open the viewer on the global context and block until it is closed
///
/// Must be called from the main thread. Settings are flushed on exit.
pub fn run(options: ViewerOptions) -> Result<()> {
    let log = CvLog::global();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(options.title.as_str())
            .with_inner_size([options.width, options.height]),
        ..Default::default()
    };

    tracing::info!(
        "Opening viewer {}x{}",
        options.width as u32,
        options.height as u32
    );
    let result = eframe::run_native(
        &options.title,
        native_options,
        Box::new(move |_cc| Ok(Box::new(CvLogApp::new(log)))),
    );
    log.save_settings();
    result.map_err(|e| anyhow!("Viewer failed: {}", e))
}
