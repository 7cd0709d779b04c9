//! Command-line flags for the globe viewer.

use std::path::PathBuf;

use atmos_geo::GeoPoint;
use clap::Parser;

use crate::Config;

/// Weather globe command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "atmos", about = "Interactive 3D weather globe")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Window title.
    #[arg(long)]
    pub title: Option<String>,

    /// Latitude of the focused location (requires --lon).
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude of the focused location (requires --lat).
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Weather condition (clear, clouds, fog, drizzle, rain, thunderstorm, snow).
    #[arg(long)]
    pub weather: Option<String>,

    /// Sunrise in milliseconds since the Unix epoch.
    #[arg(long)]
    pub sunrise: Option<i64>,

    /// Sunset in milliseconds since the Unix epoch.
    #[arg(long)]
    pub sunset: Option<i64>,

    /// Preview texture URL or path.
    #[arg(long)]
    pub preview_url: Option<String>,

    /// Full-resolution texture URL or path.
    #[arg(long)]
    pub full_url: Option<String>,

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
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref title) = args.title {
            self.window.title = title.clone();
        }
        if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
            self.scene.location = Some(GeoPoint::new(lat, lon));
        }
        if let Some(ref weather) = args.weather {
            self.scene.weather = Some(weather.clone());
        }
        if args.sunrise.is_some() {
            self.scene.sunrise_ms = args.sunrise;
        }
        if args.sunset.is_some() {
            self.scene.sunset_ms = args.sunset;
        }
        if let Some(ref url) = args.preview_url {
            self.textures.preview_url = url.clone();
        }
        if let Some(ref url) = args.full_url {
            self.textures.full_url = url.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
