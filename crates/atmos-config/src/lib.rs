//! Configuration for the weather globe.
//!
//! Settings persist to disk as a RON file, every section falls back to its
//! defaults when missing, and command-line flags override what was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, Config, DebugConfig, GlobeConfig, SceneConfig, TextureConfig, WindowConfig,
    default_config_dir, default_log_dir,
};
pub use error::ConfigError;
