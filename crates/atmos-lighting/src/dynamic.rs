//! Ambient and directional intensities that ease toward weather-dependent
//! targets instead of jumping when the weather or time of day changes.

use atmos_animation::lerp;

/// Per-tick lerp factor toward the target.
pub const LIGHTING_EASE: f32 = 0.08;

/// How strongly the current weather darkens the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeatherDimming {
    #[default]
    None,
    /// Rain or drizzle.
    Rain,
    Snow,
    Thunderstorm,
}

impl WeatherDimming {
    fn factor(self) -> f32 {
        match self {
            WeatherDimming::None => 1.0,
            WeatherDimming::Rain => 0.75,
            WeatherDimming::Snow => 0.85,
            WeatherDimming::Thunderstorm => 0.5,
        }
    }
}

/// Intensities the scene should settle at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingTarget {
    pub ambient: f32,
    pub directional: f32,
    pub stars_opacity: f32,
}

/// Derive the lighting target from day/night `progress` and the weather.
pub fn lighting_target(progress: f32, is_night: bool, weather: WeatherDimming) -> LightingTarget {
    let dimmer = weather.factor();
    let storm = weather == WeatherDimming::Thunderstorm;
    let directional_dimmer = if storm { 0.6 } else { dimmer };

    let stars_opacity = match (is_night, weather) {
        (true, WeatherDimming::Thunderstorm) => 0.2,
        (true, _) => 1.0,
        (false, WeatherDimming::Thunderstorm | WeatherDimming::Rain) => 0.1,
        (false, _) => 0.3,
    };

    LightingTarget {
        ambient: (0.2 + progress * 0.4) * dimmer,
        directional: (0.3 + progress * 1.2) * directional_dimmer,
        stars_opacity,
    }
}

/// Current light intensities, eased toward a [`LightingTarget`].
#[derive(Clone, Debug, Default)]
pub struct DynamicLighting {
    ambient: f32,
    directional: f32,
    target: Option<LightingTarget>,
    initialized: bool,
}

impl DynamicLighting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_target(&mut self, target: LightingTarget) {
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<LightingTarget> {
        self.target
    }

    pub fn ambient(&self) -> f32 {
        self.ambient
    }

    pub fn directional(&self) -> f32 {
        self.directional
    }

    /// Advance one tick. The first tick after a target exists snaps to it.
    pub fn tick(&mut self) {
        let Some(target) = self.target else {
            return;
        };
        if !self.initialized {
            self.ambient = target.ambient;
            self.directional = target.directional;
            self.initialized = true;
            return;
        }
        self.ambient = lerp(self.ambient, target.ambient, LIGHTING_EASE);
        self.directional = lerp(self.directional, target.directional, LIGHTING_EASE);
    }
}
