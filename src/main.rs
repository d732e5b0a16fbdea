//! cvlog-demo: worker threads publishing into the CVLog viewer

use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;

use cvlog::cli::CliArgs;
use cvlog::viewer::{self, ViewerOptions};
use cvlog::{Bitmap, CvLogConfig, PixelFormat, WindowProperties};

const LINE_1_STYLE: &str = "#00ff00ff";

fn main() -> Result<()> {
    let args = CliArgs::parse();
    cvlog::tracing::init();

    cvlog::init(&CvLogConfig::load());
    if let Some(layout) = &args.layout {
        cvlog::load_layout(layout)?;
    }
    if let Some(path) = &args.image {
        publish_file(path)?;
    }

    install_app_menu();
    install_frame_counter();

    spawn_worker("vga-image", vga_image_worker)?;
    spawn_worker("small-image", small_image_worker)?;
    for worker in 0..args.workers {
        spawn_worker(&format!("plot-{}", worker), move || plot_worker(worker))?;
    }

    viewer::run(ViewerOptions {
        title: "CVLog demo".to_string(),
        width: args.width,
        height: args.height,
    })
}

fn spawn_worker(name: &str, work: impl FnOnce() + Send + 'static) -> Result<()> {
    // detached: workers run until the process exits
    thread::Builder::new()
        .name(name.to_string())
        .spawn(work)
        .with_context(|| format!("Failed to spawn worker {}", name))?;
    Ok(())
}

fn publish_file(path: &Path) -> Result<()> {
    let img = image::open(path).with_context(|| format!("Failed to open image {}", path.display()))?;
    cvlog::set_window_properties(
        "File",
        WindowProperties::new()
            .category("Images")
            .help(path.display().to_string())
            .preferred_size(img.width() as f32, img.height() as f32),
    );
    cvlog::update_image("File", Bitmap::from(&img));
    tracing::info!("Published {} as panel \"File\"", path.display());
    Ok(())
}

fn install_app_menu() {
    cvlog::add_menu_bar_callback(
        "AppMenu",
        Box::new(|ui: &mut egui::Ui| {
            ui.menu_button("MyApp", |ui| {
                if ui.button("MyAction").clicked() {
                    tracing::info!("MyAction clicked");
                    ui.close();
                }
                if ui.button("Clear All").clicked() {
                    cvlog::clear_all();
                    ui.close();
                }
            });
        }),
    );
}

fn install_frame_counter() {
    let frames = Arc::new(AtomicI32::new(0));
    cvlog::set_per_frame_callback(
        "FrameCounter",
        Some(Arc::new(move |ctx: &egui::Context| {
            let frame = frames.fetch_add(1, Ordering::Relaxed) + 1;
            egui::Window::new("Per-frame callback")
                .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
                .show(ctx, |ui| {
                    ui.label(format!("Frames drawn: {}", frame));
                });
        })),
    );
}

fn vga_image_worker() {
    const WIDTH: usize = 640;
    const HEIGHT: usize = 480;

    cvlog::set_window_properties(
        "VGAImage",
        WindowProperties::new()
            .category("Images")
            .help("Image that is VGA")
            .preferred_size(WIDTH as f32, HEIGHT as f32),
    );

    for i in 0u64.. {
        if cvlog::fast_visibility_check!("VGAImage") {
            let step = i.wrapping_mul(i);
            let pixels: Vec<u8> = (0..HEIGHT)
                .flat_map(|r| (0..WIDTH).map(move |c| ((c as u64 + r as u64 + step) % 255) as u8))
                .collect();
            match Bitmap::from_u8(WIDTH, HEIGHT, PixelFormat::Gray8, pixels) {
                Ok(bitmap) => cvlog::update_image("VGAImage", bitmap),
                Err(e) => tracing::error!("VGA frame rejected: {}", e),
            }
        }
        cvlog::add_value("ValueList", "Thread1 Index", i);
        thread::sleep(Duration::from_millis(50));
    }
}

fn small_image_worker() {
    const NAME: &str = "SmallImage with a very long name that won't fit";
    const WIDTH: usize = 320;
    const HEIGHT: usize = 240;

    cvlog::set_window_properties(
        NAME,
        WindowProperties::new()
            .category("Images")
            .help("Image that is small with an offset")
            .preferred_size(320.0, 270.0),
    );

    let offset = Arc::new(AtomicI32::new(0));
    let slider_offset = Arc::clone(&offset);
    cvlog::set_window_pre_render_callback(
        NAME,
        "ModifyOffset",
        Some(Box::new(move |ui: &mut egui::Ui| {
            let mut value = slider_offset.load(Ordering::Relaxed);
            if ui
                .add(egui::Slider::new(&mut value, 0..=320).text("Adjust offset"))
                .changed()
            {
                slider_offset.store(value, Ordering::Relaxed);
            }
        })),
    );
    cvlog::add_value("ValueList", "Thread2 Status", "Started");

    for i in 0u64.. {
        if cvlog::window_is_visible(NAME) {
            let shift = offset.load(Ordering::Relaxed) as usize + i as usize;
            let pixels: Vec<u8> = (0..HEIGHT)
                .flat_map(|r| {
                    (0..WIDTH).flat_map(move |c| {
                        [((c + shift) % 255) as u8, (r % 255) as u8, ((c + r) % 255) as u8]
                    })
                })
                .collect();
            match Bitmap::from_u8(WIDTH, HEIGHT, PixelFormat::Bgr8, pixels) {
                Ok(bitmap) => cvlog::update_image(NAME, bitmap),
                Err(e) => tracing::error!("Small frame rejected: {}", e),
            }
        }

        let x = i as f64;
        let y = (x * x + 1.0).ln();
        cvlog::add_plot_value("Plot1", "Line 1", y, x, None);
        cvlog::add_plot_value("Plot1", "Line 2", y + 1.0, x, None);
        cvlog::add_value("ValueList", "Thread2 Index", i);
        thread::sleep(Duration::from_millis(40));
    }
}

fn plot_worker(worker: usize) {
    let window = format!("PlotN - {}", worker);
    cvlog::set_window_properties(&window, WindowProperties::new().category("Plots"));

    for i in 0u64.. {
        let x = i as f64;
        let y = (x + 1.0 + worker as f64).ln();
        cvlog::add_plot_value(&window, "Line 1", y, x, Some(LINE_1_STYLE));
        cvlog::add_plot_value(&window, "Line 2", y / 2.0, x, None);
        thread::sleep(Duration::from_millis(50));
    }
}
