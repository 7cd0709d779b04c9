//! Lightning as a renewal process.
//!
//! A countdown runs faster as storm power rises. On expiry a flash fires with
//! a random peak strength, and the next gap is drawn from a band that narrows
//! with power. Between flashes the strength decays exponentially, driving both
//! a point light and a translucent full-screen overlay.

use atmos_animation::SeededRng;
use glam::Vec3;

/// World-space position of the flash light.
pub const LIGHTNING_POSITION: Vec3 = Vec3::new(0.0, 5.0, 3.0);
/// Flash light colour, `#d6f0ff`.
pub const LIGHTNING_COLOR: u32 = 0xd6f0ff;
/// Flash overlay colour, `#e6f7ff`.
pub const OVERLAY_COLOR: u32 = 0xe6f7ff;
pub const LIGHTNING_RANGE: f32 = 20.0;

/// Per-second rate of the exponential fade. The curve is exponential, not
/// linear: strength after `t` seconds is `peak * exp(-6t)`.
const DECAY_RATE: f32 = 6.0;
const CUTOFF: f32 = 1e-3;
const MIN_POWER: f32 = 0.05;

/// Flash timer and decaying strength.
#[derive(Clone, Debug)]
pub struct LightningFlash {
    rng: SeededRng,
    timer: f32,
    strength: f32,
    power: f32,
    flashes: u32,
}

impl LightningFlash {
    pub fn new(seed: u32) -> Self {
        let mut rng = SeededRng::new(seed);
        let timer = rng.range(1.5, 4.0);
        Self {
            rng,
            timer,
            strength: 0.0,
            power: 0.0,
            flashes: 0,
        }
    }

    /// Storm power in `[0, 1]`. Zero stops new flashes; a running flash
    /// still decays out.
    pub fn set_power(&mut self, power: f32) {
        self.power = power.clamp(0.0, 1.0);
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    /// Seconds until the next flash may fire.
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Number of flashes fired so far.
    pub fn flash_count(&self) -> u32 {
        self.flashes
    }

    /// Current point-light intensity.
    pub fn intensity(&self) -> f32 {
        self.strength * self.power
    }

    /// Overlay opacity, capped relative to storm power.
    pub fn overlay_opacity(&self) -> f32 {
        (self.intensity() / 8.0).min(0.45 * self.power)
    }

    /// Advance by `dt` seconds. Returns true when a new flash fired.
    pub fn update(&mut self, dt: f32) -> bool {
        let dt = dt.max(0.0);
        self.timer -= dt * (0.6 + self.power * 1.4);

        let fired = self.timer <= 0.0 && self.power > MIN_POWER;
        if fired {
            self.strength = self.rng.range(4.0, 7.0);
            self.timer = self.rng.range(2.5, 5.0) / (0.4 + self.power);
            self.flashes += 1;
            tracing::trace!(strength = self.strength, next = self.timer, "lightning flash");
        } else {
            self.strength *= (-DECAY_RATE * dt).exp();
            if self.strength < CUTOFF {
                self.strength = 0.0;
            }
        }
        fired
    }
}
