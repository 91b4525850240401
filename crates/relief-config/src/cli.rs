//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Headless hillshade renderer.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "relief", about = "Render shaded relief from elevation tiles")]
pub struct CliArgs {
    /// Frame width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Frame height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Camera zoom level.
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Map rotation in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub bearing: Option<f64>,

    /// PNG file the final frame is written to.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.demo.width = w;
        }
        if let Some(h) = args.height {
            self.demo.height = h;
        }
        if let Some(zoom) = args.zoom {
            self.demo.zoom = zoom;
        }
        if let Some(bearing) = args.bearing {
            self.demo.bearing = bearing;
        }
        if let Some(ref output) = args.output {
            self.demo.output = output.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
