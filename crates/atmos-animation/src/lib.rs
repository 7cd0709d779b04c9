//! Frame-driven animation primitives: damped scalar approach, easing curves,
//! and the seeded generator that keeps procedural effects reproducible.

mod easing;
mod rng;
mod smoothed;

pub use easing::EasingFunction;
pub use rng::SeededRng;
pub use smoothed::SmoothedValue;

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
