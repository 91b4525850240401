//! Headless hillshade demo: shades synthetic elevation tiles with wgpu and
//! writes the final frame to a PNG.

mod terrain;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use relief_config::{CliArgs, Config, default_config_dir};
use relief_geo::TransformState;
use relief_hillshade::{
    DemError, HillshadeError, HillshadeRenderer, RasterDemSource, RenderHillshadeLayer,
};
use relief_render::{GfxError, Size, StaticData, WgpuBackend};
use relief_style::Transitionable;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Gfx(#[from] GfxError),
    #[error(transparent)]
    Hillshade(#[from] HillshadeError),
    #[error("failed to synthesise DEM: {0}")]
    Dem(#[from] DemError),
    #[error("frame readback returned {actual} bytes for {width}x{height}")]
    Readback {
        actual: usize,
        width: u32,
        height: u32,
    },
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".relief"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    relief_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Demo failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), DemoError> {
    let demo = &config.demo;
    let size = Size::new(demo.width, demo.height);
    let mut backend = WgpuBackend::new_blocking(size, config.render.depth_buffer)?;
    let static_data = StaticData::new(&mut backend)?;

    let mut source = RasterDemSource::new(demo.max_zoom);
    for id in terrain::demo_tiles() {
        source.add_tile(id, terrain::terrarium_tile(&id, demo.dem_dim)?);
    }
    info!("Synthesised {} DEM tiles of {}px", source.len(), demo.dem_dim);

    let mut transform = TransformState::new(demo.width, demo.height);
    transform.center = demo.center;
    transform.zoom = demo.zoom;
    transform.bearing = demo.bearing.to_radians();
    transform.tile_size = f64::from(config.render.tile_size);

    // The layer starts flat and eases into the configured paint over the
    // rendered frames.
    let target = config.hillshade.paint();
    let mut initial = target.clone();
    initial.exaggeration = Transitionable::constant(0.0);

    let transition = config.hillshade.transition();
    let mut renderer = HillshadeRenderer::new(source, transition);
    renderer.add_layer(RenderHillshadeLayer::new("hillshade", initial));

    let start = Instant::now();
    renderer.set_paint("hillshade", target, start);

    let span = transition.duration.unwrap_or_default() + transition.delay.unwrap_or_default();
    let frames = demo.frames.max(1);
    for frame in 0..frames {
        let now = start + frame_offset(span, frame, frames);
        backend.begin_frame(config.render.clear_color);
        renderer.update(&mut backend, &transform, now)?;
        renderer.render_frame(&mut backend, &static_data, &transform)?;
        info!(
            "Frame {}/{}: {} draws so far, transition running: {}",
            frame + 1,
            frames,
            backend.draws_submitted(),
            renderer.needs_repaint()
        );
    }
    if renderer.needs_repaint() {
        warn!("Last frame rendered before the paint transition finished");
    }

    let pixels = backend.read_frame_rgba()?;
    let frame_size = backend.frame_size();
    let actual = pixels.len();
    let image = image::RgbaImage::from_raw(frame_size.width, frame_size.height, pixels).ok_or(
        DemoError::Readback {
            actual,
            width: frame_size.width,
            height: frame_size.height,
        },
    )?;
    image.save(&demo.output)?;
    info!(
        "Wrote {} ({} pipelines compiled)",
        demo.output.display(),
        backend.pipeline_count()
    );
    Ok(())
}

/// Simulated time of a frame: frames are spread evenly so that the last one
/// lands at the end of `span`.
fn frame_offset(span: Duration, frame: u32, frames: u32) -> Duration {
    if frames <= 1 {
        return span;
    }
    span.mul_f64(f64::from(frame) / f64::from(frames - 1))
}
