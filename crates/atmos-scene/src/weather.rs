//! Weather vocabulary and the effect configuration each condition implies.

use std::fmt;

use atmos_lighting::WeatherDimming;
use atmos_particles::IntensityTier;

/// Conditions the scene reacts to. Anything unrecognised is [`Other`] and
/// has no visual effect.
///
/// [`Other`]: WeatherCondition::Other
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Fog,
    Drizzle,
    Rain,
    Thunderstorm,
    Snow,
    Other,
}

/// Rain mount parameters for a condition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeatherEffectConfig {
    pub particle_count: usize,
    pub tier: IntensityTier,
    /// Multiplied with the effect opacity for the streak alpha.
    pub opacity_factor: f32,
    pub active: bool,
}

impl WeatherEffectConfig {
    const NONE: Self = Self {
        particle_count: 0,
        tier: IntensityTier::Light,
        opacity_factor: 0.0,
        active: false,
    };
}

impl WeatherCondition {
    /// Case-insensitive. `mist` and `haze` read as fog.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear" => WeatherCondition::Clear,
            "clouds" => WeatherCondition::Clouds,
            "fog" | "mist" | "haze" => WeatherCondition::Fog,
            "drizzle" => WeatherCondition::Drizzle,
            "rain" => WeatherCondition::Rain,
            "thunderstorm" => WeatherCondition::Thunderstorm,
            "snow" => WeatherCondition::Snow,
            _ => WeatherCondition::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::Clouds => "clouds",
            WeatherCondition::Fog => "fog",
            WeatherCondition::Drizzle => "drizzle",
            WeatherCondition::Rain => "rain",
            WeatherCondition::Thunderstorm => "thunderstorm",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Other => "other",
        }
    }

    pub fn rain_config(self) -> WeatherEffectConfig {
        let (particle_count, tier, opacity_factor) = match self {
            WeatherCondition::Thunderstorm => (1200, IntensityTier::Heavy, 0.6),
            WeatherCondition::Rain => (800, IntensityTier::Moderate, 0.45),
            WeatherCondition::Drizzle => (400, IntensityTier::Light, 0.3),
            _ => return WeatherEffectConfig::NONE,
        };
        WeatherEffectConfig {
            particle_count,
            tier,
            opacity_factor,
            active: true,
        }
    }

    /// Peak snow opacity before the effect fade is applied.
    pub fn snow_opacity_target(self) -> f32 {
        if self == WeatherCondition::Snow { 0.9 } else { 0.0 }
    }

    pub fn is_thunderstorm(self) -> bool {
        self == WeatherCondition::Thunderstorm
    }

    pub fn dimming(self) -> WeatherDimming {
        match self {
            WeatherCondition::Thunderstorm => WeatherDimming::Thunderstorm,
            WeatherCondition::Rain | WeatherCondition::Drizzle => WeatherDimming::Rain,
            WeatherCondition::Snow => WeatherDimming::Snow,
            _ => WeatherDimming::None,
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(WeatherCondition::parse("Rain"), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::parse(" THUNDERSTORM "), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::parse("Mist"), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::parse("haze"), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::parse("tornado"), WeatherCondition::Other);
    }

    #[test]
    fn test_rain_configs() {
        let storm = WeatherCondition::Thunderstorm.rain_config();
        assert_eq!((storm.particle_count, storm.tier), (1200, IntensityTier::Heavy));
        assert!(storm.active);
        let drizzle = WeatherCondition::Drizzle.rain_config();
        assert_eq!((drizzle.particle_count, drizzle.opacity_factor), (400, 0.3));
        assert!(!WeatherCondition::Snow.rain_config().active);
        assert!(!WeatherCondition::Other.rain_config().active);
    }

    #[test]
    fn test_snow_target_only_for_snow() {
        assert_eq!(WeatherCondition::Snow.snow_opacity_target(), 0.9);
        assert_eq!(WeatherCondition::Rain.snow_opacity_target(), 0.0);
    }

    #[test]
    fn test_dimming_mapping() {
        assert_eq!(WeatherCondition::Drizzle.dimming(), WeatherDimming::Rain);
        assert_eq!(WeatherCondition::Fog.dimming(), WeatherDimming::None);
        assert_eq!(WeatherCondition::Thunderstorm.to_string(), "thunderstorm");
    }
}
