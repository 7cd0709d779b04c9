//! Fixed per-tier tuning for precipitation.

use std::fmt;

/// Precipitation strength.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IntensityTier {
    Light,
    #[default]
    Moderate,
    Heavy,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RainSettings {
    /// Base fall per 60 Hz frame.
    pub speed: f32,
    /// Streak length.
    pub length: f32,
    /// Edge of the spawn cube.
    pub spread: f32,
    /// Maximum horizontal drift.
    pub angle: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnowSettings {
    pub speed: f32,
    /// Point size in world units.
    pub size: f32,
    pub spread: f32,
}

impl IntensityTier {
    pub fn rain(self) -> RainSettings {
        match self {
            IntensityTier::Light => RainSettings { speed: 0.02, length: 0.15, spread: 10.0, angle: 0.08 },
            IntensityTier::Moderate => RainSettings { speed: 0.04, length: 0.2, spread: 9.0, angle: 0.12 },
            IntensityTier::Heavy => RainSettings { speed: 0.06, length: 0.3, spread: 8.0, angle: 0.15 },
        }
    }

    pub fn snow(self) -> SnowSettings {
        match self {
            IntensityTier::Light => SnowSettings { speed: 0.004, size: 0.025, spread: 15.0 },
            IntensityTier::Moderate => SnowSettings { speed: 0.007, size: 0.035, spread: 13.0 },
            IntensityTier::Heavy => SnowSettings { speed: 0.012, size: 0.045, spread: 12.0 },
        }
    }

    /// Base seed for rain particle streams.
    pub fn rain_seed(self) -> u32 {
        match self {
            IntensityTier::Light => 11,
            IntensityTier::Moderate => 17,
            IntensityTier::Heavy => 29,
        }
    }

    /// Base seed for the snow stream.
    pub fn snow_seed(self) -> u32 {
        match self {
            IntensityTier::Light => 13,
            IntensityTier::Moderate => 19,
            IntensityTier::Heavy => 31,
        }
    }
}

impl fmt::Display for IntensityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntensityTier::Light => "light",
            IntensityTier::Moderate => "moderate",
            IntensityTier::Heavy => "heavy",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heavier_rain_is_faster_and_denser() {
        let light = IntensityTier::Light.rain();
        let heavy = IntensityTier::Heavy.rain();
        assert!(heavy.speed > light.speed);
        assert!(heavy.length > light.length);
        assert!(heavy.spread < light.spread, "heavy rain packs into a tighter box");
    }

    #[test]
    fn test_tiers_have_distinct_seeds() {
        let tiers = [IntensityTier::Light, IntensityTier::Moderate, IntensityTier::Heavy];
        for a in tiers {
            for b in tiers {
                if a != b {
                    assert_ne!(a.rain_seed(), b.rain_seed());
                    assert_ne!(a.snow_seed(), b.snow_seed());
                }
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(IntensityTier::Heavy.to_string(), "heavy");
        assert_eq!(IntensityTier::default(), IntensityTier::Moderate);
    }
}
