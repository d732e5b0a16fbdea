//! Command-line argument parsing for the demo viewer

use clap::Parser;
use std::path::PathBuf;

/// Visual logging demo: worker threads publishing images, plots and values
#[derive(Parser, Debug)]
#[command(name = "cvlog-demo", version, about = "CVLog visual logging demo")]
pub struct CliArgs {
    /// Viewer width in points
    #[arg(long, default_value_t = 1600.0)]
    pub width: f32,

    /// Viewer height in points
    #[arg(long, default_value_t = 900.0)]
    pub height: f32,

    /// Layout preset (*.ini) loaded at start
    #[arg(long, value_name = "FILE")]
    pub layout: Option<PathBuf>,

    /// Image file published as the panel "File"
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Number of plot workers
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub workers: usize,
}
