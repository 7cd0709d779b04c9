//! Configuration sections with defaults and RON persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use atmos_geo::{GeoPoint, GlobeDimensions};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Globe size and rotation.
    pub globe: GlobeConfig,
    /// Earth imagery sources and loading policy.
    pub textures: TextureConfig,
    /// Camera projection and animation.
    pub camera: CameraConfig,
    /// What the globe shows at startup.
    pub scene: SceneConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Globe geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobeConfig {
    /// Sphere radius when `responsive` is off.
    pub radius: f32,
    /// Minimum orbit distance when `responsive` is off.
    pub orbit_min: f32,
    /// Maximum orbit distance when `responsive` is off.
    pub orbit_max: f32,
    /// Camera offset above a focused location when `responsive` is off.
    pub zoom_distance: f32,
    /// Derive the four values above from the window width instead.
    pub responsive: bool,
    /// Idle spin about the polar axis, radians per second.
    pub auto_rotate_speed: f32,
    /// Latitude/longitude subdivisions of the sphere mesh.
    pub segments: u32,
}

/// Progressive earth imagery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextureConfig {
    /// Low resolution image shown first.
    pub preview_url: String,
    /// Full resolution image swapped in when ready.
    pub full_url: String,
    /// Appended as `v=<version>` to both URLs. Empty disables it.
    pub cache_version: String,
    /// Per-attempt timeout.
    pub timeout_ms: u64,
    /// Retries after the first failed attempt, per resolution.
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

/// Camera settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Starting camera position.
    pub initial_position: [f32; 3],
    /// Focus transition progress per second.
    pub animation_speed: f32,
    /// Orbit inertia damping factor.
    pub orbit_damping: f32,
    /// Radians of orbit per pixel of drag.
    pub rotate_speed: f32,
    /// Zoom sensitivity per scroll line.
    pub zoom_speed: f32,
}

/// Initial inputs normally supplied by the surrounding application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Location to focus on at startup.
    pub location: Option<GeoPoint>,
    /// Weather condition at that location (`clear`, `rain`, `snow`, ...).
    pub weather: Option<String>,
    /// Sunrise, milliseconds since the Unix epoch.
    pub sunrise_ms: Option<i64>,
    /// Sunset, milliseconds since the Unix epoch.
    pub sunset_ms: Option<i64>,
    /// Suppress user orbit control.
    pub controls_locked: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter directive (e.g., "debug", "info,atmos_assets=trace").
    pub log_level: String,
    /// Also write JSON logs to the log directory in debug builds.
    pub json_log: bool,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Atmos Weather Globe".to_string(),
        }
    }
}

impl Default for GlobeConfig {
    fn default() -> Self {
        let d = GlobeDimensions::default();
        Self {
            radius: d.radius,
            orbit_min: d.orbit_min,
            orbit_max: d.orbit_max,
            zoom_distance: d.zoom_distance,
            responsive: true,
            auto_rotate_speed: 0.1,
            segments: 128,
        }
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            preview_url: "assets/textures/land_ocean_ice_2048.png".to_string(),
            full_url: "assets/textures/land_ocean_ice_8192.png".to_string(),
            cache_version: "1".to_string(),
            timeout_ms: 10_000,
            max_retries: 2,
            retry_backoff_ms: 1000,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            initial_position: [0.0, 0.0, 5.0],
            animation_speed: 0.8,
            orbit_damping: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 0.5,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info,wgpu=warn,naga=warn".to_string(),
            json_log: true,
        }
    }
}

impl GlobeConfig {
    /// Dimensions to use for a window `logical_width` pixels wide.
    pub fn dimensions(&self, logical_width: f64) -> GlobeDimensions {
        if self.responsive {
            GlobeDimensions::for_viewport_width(logical_width)
        } else {
            GlobeDimensions {
                radius: self.radius,
                orbit_min: self.orbit_min,
                orbit_max: self.orbit_max,
                zoom_distance: self.zoom_distance,
            }
        }
    }
}

impl TextureConfig {
    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff unit between attempts.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Platform config directory, `<config_dir>/atmos`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("atmos"))
        .unwrap_or_else(|| PathBuf::from(".atmos"))
}

/// Platform log directory, `<data_local_dir>/atmos/logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("atmos").join("logs"))
        .unwrap_or_else(|| PathBuf::from(".atmos/logs"))
}

// --- Load / Save / Validate ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
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

    /// Reject values that would produce a broken scene.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let globe = &self.globe;
        if !(globe.radius > 0.0) {
            return Err(invalid("globe.radius", "must be positive"));
        }
        if !(globe.orbit_min < globe.orbit_max) {
            return Err(invalid("globe.orbit_min", "must be below globe.orbit_max"));
        }
        if globe.segments < 3 {
            return Err(invalid("globe.segments", "needs at least 3"));
        }
        if self.textures.timeout_ms == 0 {
            return Err(invalid("textures.timeout_ms", "must be non-zero"));
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(invalid("camera.fov_degrees", "must be in (0, 180)"));
        }
        if let Some(loc) = self.scene.location
            && (!(-90.0..=90.0).contains(&loc.lat) || !(-180.0..=180.0).contains(&loc.lon))
        {
            return Err(invalid("scene.location", format!("{loc} is off the globe")));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"), "window width missing");
        assert!(ron_str.contains("timeout_ms: 10000"), "texture timeout missing");
        assert!(ron_str.contains("max_retries: 2"), "retry budget missing");
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (width: 800), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.textures, TextureConfig::default());
        assert_eq!(config.globe, GlobeConfig::default());
    }

    #[test]
    fn test_scene_location_parses() {
        let ron_str = "(scene: (location: Some((lat: 51.5, lon: -0.12)), weather: Some(\"rain\")))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.scene.location, Some(GeoPoint::new(51.5, -0.12)));
        assert_eq!(config.scene.weather.as_deref(), Some("rain"));
        assert!(!config.scene.controls_locked);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.textures.max_retries = 5;
        config.scene.location = Some(GeoPoint::new(-33.87, 151.21));

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists(), "defaults written");
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_orbit() {
        let mut config = Config::default();
        config.globe.orbit_min = 6.0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { field: "globe.orbit_min", .. }),
            "got {err}"
        );
    }

    #[test]
    fn test_validate_rejects_off_globe_location() {
        let mut config = Config::default();
        config.scene.location = Some(GeoPoint::new(95.0, 0.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_dimensions_when_not_responsive() {
        let globe = GlobeConfig {
            responsive: false,
            radius: 2.0,
            ..GlobeConfig::default()
        };
        assert_eq!(globe.dimensions(3000.0).radius, 2.0);

        let responsive = GlobeConfig::default();
        assert_eq!(responsive.dimensions(1280.0).radius, 1.5);
    }
}
