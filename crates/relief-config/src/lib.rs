//! Settings for the hillshade renderer, persisted as `config.ron`.
//!
//! Missing sections and fields fall back to their defaults, unknown ones are
//! ignored, and command-line flags override whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DemoConfig, HillshadeConfig, RenderConfig, default_config_dir,
};
pub use error::ConfigError;
