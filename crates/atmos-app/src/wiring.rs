//! Translation from loaded configuration and raw input into scene values.

use std::path::PathBuf;
use std::sync::Arc;

use atmos_assets::{AssetFetcher, Fetcher, LoadRequest, with_cache_buster};
use atmos_config::Config;
use atmos_scene::{SceneInputs, SceneSettings, WeatherCondition};
use glam::Vec3;
use winit::event::MouseScrollDelta;

/// Pixels of touchpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

pub fn scene_settings(config: &Config, logical_width: f64) -> SceneSettings {
    SceneSettings {
        dimensions: config.globe.dimensions(logical_width),
        auto_rotate_speed: config.globe.auto_rotate_speed,
        camera_position: Vec3::from_array(config.camera.initial_position),
        animation_speed: config.camera.animation_speed,
        orbit_damping: config.camera.orbit_damping,
        rotate_speed: config.camera.rotate_speed,
        zoom_speed: config.camera.zoom_speed,
        ..SceneSettings::default()
    }
}

/// The configured location is both the camera focus and where the weather is.
pub fn scene_inputs(config: &Config) -> SceneInputs {
    let scene = &config.scene;
    SceneInputs {
        focus: scene.location,
        weather_location: scene.location,
        weather: scene.weather.as_deref().map(WeatherCondition::parse),
        sunrise_ms: scene.sunrise_ms,
        sunset_ms: scene.sunset_ms,
        controls_locked: scene.controls_locked,
    }
}

pub fn load_request(config: &Config) -> LoadRequest {
    let textures = &config.textures;
    LoadRequest {
        timeout: textures.timeout(),
        max_retries: textures.max_retries,
        retry_backoff: textures.retry_backoff(),
        ..LoadRequest::new(
            with_cache_buster(&textures.preview_url, &textures.cache_version),
            with_cache_buster(&textures.full_url, &textures.cache_version),
        )
    }
}

/// Relative texture paths resolve against the working directory.
pub fn texture_fetcher(config: &Config) -> Arc<dyn Fetcher> {
    let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Arc::new(AssetFetcher::new(root, config.textures.timeout()))
}

/// Window title with the imagery status appended while there is one.
pub fn window_title(base: &str, status: Option<&str>) -> String {
    match status {
        Some(status) => format!("{base} - {status}"),
        None => base.to_string(),
    }
}

/// Scroll in wheel lines, positive toward the globe.
pub fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
    }
}

/// Left-button drag state for orbiting.
#[derive(Clone, Copy, Debug, Default)]
pub struct DragTracker {
    pressed: bool,
    last: Option<(f64, f64)>,
}

impl DragTracker {
    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
        if !pressed {
            self.last = None;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.pressed
    }

    /// Record a cursor position, returning the drag delta in pixels when the
    /// button is held and a previous position is known.
    pub fn moved(&mut self, x: f64, y: f64) -> Option<(f32, f32)> {
        let previous = self.last.replace((x, y));
        if !self.pressed {
            return None;
        }
        previous.map(|(px, py)| ((x - px) as f32, (y - py) as f32))
    }

    pub fn cursor_left(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atmos_geo::GeoPoint;
    use std::time::Duration;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_settings_follow_config() {
        let mut config = Config::default();
        config.globe.responsive = false;
        config.globe.radius = 2.0;
        config.camera.initial_position = [1.0, 2.0, 3.0];
        config.camera.zoom_speed = 0.9;
        let settings = scene_settings(&config, 1280.0);
        assert_eq!(settings.dimensions.radius, 2.0);
        assert_eq!(settings.camera_position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(settings.zoom_speed, 0.9);
        assert_eq!(settings.star_seed, SceneSettings::default().star_seed);
    }

    #[test]
    fn test_responsive_settings_use_viewport_width() {
        let config = Config::default();
        let narrow = scene_settings(&config, 320.0);
        let wide = scene_settings(&config, 1920.0);
        assert!(
            narrow.dimensions.radius < wide.dimensions.radius,
            "narrow {} vs wide {}",
            narrow.dimensions.radius,
            wide.dimensions.radius
        );
    }

    #[test]
    fn test_inputs_from_config() {
        let mut config = Config::default();
        config.scene.location = Some(GeoPoint::new(48.85, 2.35));
        config.scene.weather = Some("Thunderstorm".to_string());
        config.scene.sunrise_ms = Some(1);
        config.scene.controls_locked = true;
        let inputs = scene_inputs(&config);
        assert_eq!(inputs.focus, config.scene.location);
        assert_eq!(inputs.weather_location, config.scene.location);
        assert_eq!(inputs.weather, Some(WeatherCondition::Thunderstorm));
        assert_eq!(inputs.sunrise_ms, Some(1));
        assert_eq!(inputs.sunset_ms, None);
        assert!(inputs.controls_locked);
    }

    #[test]
    fn test_unknown_weather_has_no_effect_condition() {
        let mut config = Config::default();
        config.scene.weather = Some("volcanic ash".to_string());
        assert_eq!(scene_inputs(&config).weather, Some(WeatherCondition::Other));
    }

    #[test]
    fn test_load_request_is_cache_busted() {
        let mut config = Config::default();
        config.textures.preview_url = "earth_small.png".to_string();
        config.textures.full_url = "https://example.com/earth.png?q=1".to_string();
        config.textures.cache_version = "7".to_string();
        config.textures.timeout_ms = 500;
        config.textures.max_retries = 4;
        let request = load_request(&config);
        assert_eq!(request.preview_url, "earth_small.png?v=7");
        assert_eq!(request.full_url, "https://example.com/earth.png?q=1&v=7");
        assert_eq!(request.timeout, Duration::from_millis(500));
        assert_eq!(request.max_retries, 4);
    }

    #[test]
    fn test_title_shows_status_only_when_present() {
        assert_eq!(window_title("Globe", None), "Globe");
        assert_eq!(
            window_title("Globe", Some("Procedural fallback active")),
            "Globe - Procedural fallback active"
        );
    }

    #[test]
    fn test_scroll_lines() {
        assert_eq!(scroll_lines(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -80.0));
        assert_eq!(scroll_lines(pixels), -2.0);
    }

    #[test]
    fn test_drag_only_while_pressed() {
        let mut drag = DragTracker::default();
        assert_eq!(drag.moved(10.0, 10.0), None, "hovering is not a drag");
        drag.set_pressed(true);
        assert_eq!(drag.moved(15.0, 7.0), Some((5.0, -3.0)));
        drag.set_pressed(false);
        assert_eq!(drag.moved(30.0, 30.0), None);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drag_restarts_after_cursor_leaves() {
        let mut drag = DragTracker::default();
        drag.set_pressed(true);
        drag.moved(0.0, 0.0);
        drag.cursor_left();
        assert_eq!(drag.moved(100.0, 100.0), None, "re-entry must not jump");
        assert_eq!(drag.moved(101.0, 100.0), Some((1.0, 0.0)));
    }
}
