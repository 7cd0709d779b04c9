//! `atmos`: interactive 3D weather globe.

use atmos_config::{CliArgs, Config, default_config_dir, default_log_dir};
use clap::Parser;
use tracing::{error, info, warn};

fn main() {
    let args = CliArgs::parse();

    // A broken config file should not keep the globe from starting.
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let (mut config, load_error) = match Config::load_or_create(&config_dir) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_cli_overrides(&args);

    atmos_log::init_logging(
        Some(&default_log_dir()),
        cfg!(debug_assertions),
        Some(&config),
    );
    if let Some(e) = load_error {
        warn!("Using default configuration: {e}");
    }
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(2);
    }

    info!(
        "Window: {}x{} | Config: {}",
        config.window.width,
        config.window.height,
        config_dir.display()
    );
    match (&config.scene.location, &config.scene.weather) {
        (Some(location), weather) => info!(%location, ?weather, "Focusing location"),
        (None, _) => info!("No location, globe will auto-rotate"),
    }

    if let Err(e) = atmos_app::window::run(config) {
        error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
