//! Rain and snow fields.
//!
//! Both are fixed-size: every array is allocated once at construction and
//! particles recycle in place when they fall out of the spawn box. A
//! [`LevelOfDetail`] trims how many of them are simulated and drawn.
//! Randomness comes only from [`atmos_animation::SeededRng`], so a field
//! built with the same tier and count always replays identically.

mod lod;
mod rain;
mod snow;
mod tier;

pub use lod::LevelOfDetail;
pub use rain::{RAIN_COLOR, RainField};
pub use snow::{SNOW_PARTICLE_COUNT, SnowField};
pub use tier::{IntensityTier, RainSettings, SnowSettings};

/// Frame-rate independent step: 1.0 at 60 Hz. A zero delta counts as one frame.
#[inline]
pub(crate) fn frame_multiplier(dt: f32) -> f32 {
    if dt > 0.0 { dt * 60.0 } else { 1.0 }
}
