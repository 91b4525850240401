//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use relief_geo::LatLng;
use relief_style::{
    Color, HillshadePaintProperties, IlluminationAnchor, TransitionOptions, Transitionable,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Render target settings.
    pub render: RenderConfig,
    /// Default hillshade paint and transition timing.
    pub hillshade: HillshadeConfig,
    /// Headless demo scene.
    pub demo: DemoConfig,
    pub debug: DebugConfig,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Size of one zoom-0 tile in pixels.
    pub tile_size: u32,
    /// Attach a depth buffer to the frame so layers keep their sublayer order.
    pub depth_buffer: bool,
    /// Frame clear color, premultiplied.
    pub clear_color: Color,
}

/// Paint a hillshade layer starts with, before any style changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HillshadeConfig {
    /// Shading intensity in `[0, 1]`.
    pub exaggeration: f32,
    /// Light direction in degrees clockwise from the anchor's up.
    pub illumination_direction: f32,
    pub illumination_anchor: IlluminationAnchor,
    pub highlight_color: Color,
    pub shadow_color: Color,
    pub accent_color: Color,
    /// How long paint changes ease in.
    pub transition_duration_ms: u64,
    /// Wait before a paint change starts easing.
    pub transition_delay_ms: u64,
}

/// The scene the headless demo renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    pub zoom: f64,
    /// Map rotation in degrees.
    pub bearing: f64,
    pub center: LatLng,
    /// Edge length of every synthetic DEM tile, in pixels.
    pub dem_dim: u32,
    /// Highest zoom the synthetic source claims data for.
    pub max_zoom: u8,
    /// Frames to render before the last one is written out.
    pub frames: u32,
    /// Where the final frame is written as PNG.
    pub output: PathBuf,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter, e.g. `"debug"` or `"info,relief_hillshade=trace"`.
    pub log_level: String,
}

// --- Default implementations ---

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_size: 512,
            depth_buffer: true,
            clear_color: Color::from_rgb8(0xf2, 0xf0, 0xe8),
        }
    }
}

impl Default for HillshadeConfig {
    fn default() -> Self {
        Self {
            exaggeration: 0.5,
            illumination_direction: 335.0,
            illumination_anchor: IlluminationAnchor::Viewport,
            highlight_color: Color::WHITE,
            shadow_color: Color::BLACK,
            accent_color: Color::BLACK,
            transition_duration_ms: 300,
            transition_delay_ms: 0,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            zoom: 1.5,
            bearing: 0.0,
            center: LatLng::new(45.0, -90.0),
            dem_dim: 256,
            max_zoom: 15,
            frames: 4,
            output: PathBuf::from("hillshade.png"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl HillshadeConfig {
    /// The configured values as constant paint properties.
    pub fn paint(&self) -> HillshadePaintProperties {
        HillshadePaintProperties {
            exaggeration: Transitionable::constant(self.exaggeration),
            illumination_direction: Transitionable::constant(self.illumination_direction),
            illumination_anchor: Transitionable::constant(self.illumination_anchor),
            highlight_color: Transitionable::constant(self.highlight_color),
            shadow_color: Transitionable::constant(self.shadow_color),
            accent_color: Transitionable::constant(self.accent_color),
        }
    }

    pub fn transition(&self) -> TransitionOptions {
        TransitionOptions::new(
            Duration::from_millis(self.transition_duration_ms),
            Duration::from_millis(self.transition_delay_ms),
        )
    }
}

/// Platform config directory for the renderer, if the platform has one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("relief"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(ConfigError::WriteError)
    }

    /// Re-read the file: `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}
