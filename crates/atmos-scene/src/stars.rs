//! Background starfield whose density follows the lighting's star opacity.
//!
//! One catalog of [`MAX_STARS`] is generated up front; a configuration only
//! chooses how many of them to draw and how large.

use std::f32::consts::TAU;

use atmos_animation::SeededRng;
use glam::Vec3;

pub const MAX_STARS: usize = 6000;
const SHELL_RADIUS: f32 = 100.0;
const SHELL_DEPTH: f32 = 50.0;
const FADE_BELOW: f32 = 0.45;

/// How the starfield is drawn for a given star opacity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarfieldConfig {
    pub count: usize,
    /// Size multiplier.
    pub factor: f32,
    /// Soft-edged sprites when the sky is bright.
    pub fade: bool,
}

impl StarfieldConfig {
    pub fn from_opacity(stars_opacity: f32) -> Self {
        let s = stars_opacity.clamp(0.0, 1.0);
        Self {
            count: ((2500.0 + s * 3500.0).floor() as usize).min(MAX_STARS),
            factor: 2.8 + s * 2.2,
            fade: s < FADE_BELOW,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub position: Vec3,
    /// Relative size in `[0.5, 1]`, scaled by the config factor.
    pub size: f32,
}

#[derive(Clone, Debug)]
pub struct Starfield {
    stars: Vec<Star>,
    config: StarfieldConfig,
}

impl Starfield {
    pub fn new(seed: u32) -> Self {
        let mut rng = SeededRng::new(seed);
        let stars = (0..MAX_STARS)
            .map(|_| {
                let theta = rng.next_f32() * TAU;
                let cos_phi = 1.0 - 2.0 * rng.next_f32();
                let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
                let r = SHELL_RADIUS + rng.next_f32() * SHELL_DEPTH;
                let direction = Vec3::new(sin_phi * theta.cos(), cos_phi, sin_phi * theta.sin());
                Star {
                    position: direction * r,
                    size: 0.5 + rng.next_f32() * 0.5,
                }
            })
            .collect();
        Self {
            stars,
            config: StarfieldConfig::from_opacity(0.3),
        }
    }

    pub fn set_opacity(&mut self, stars_opacity: f32) {
        self.config = StarfieldConfig::from_opacity(stars_opacity);
    }

    pub fn config(&self) -> StarfieldConfig {
        self.config
    }

    /// Stars to draw under the current configuration.
    pub fn visible(&self) -> &[Star] {
        &self.stars[..self.config.count.min(self.stars.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_formula() {
        let night = StarfieldConfig::from_opacity(1.0);
        assert_eq!(night.count, 6000);
        assert!((night.factor - 5.0).abs() < 1e-6);
        assert!(!night.fade);

        let day = StarfieldConfig::from_opacity(0.3);
        assert_eq!(day.count, 3550);
        assert!(day.fade);
    }

    #[test]
    fn test_stars_on_shell() {
        let field = Starfield::new(7);
        for star in &field.stars {
            let r = star.position.length();
            assert!((SHELL_RADIUS - 1e-3..=SHELL_RADIUS + SHELL_DEPTH + 1e-3).contains(&r));
        }
    }

    #[test]
    fn test_visible_follows_opacity() {
        let mut field = Starfield::new(7);
        field.set_opacity(0.1);
        let dim = field.visible().len();
        field.set_opacity(1.0);
        assert!(field.visible().len() > dim);
        assert_eq!(Starfield::new(7).stars, field.stars, "catalog is seeded");
    }
}
