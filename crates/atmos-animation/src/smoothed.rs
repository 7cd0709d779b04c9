//! Exponentially damped scalar.
//!
//! Every tick the value covers a fixed fraction (`damping`) of the remaining
//! distance to its target and lands exactly on the target once the gap is
//! within `precision`. The target may change at any tick; the current value
//! simply becomes the new starting point.

/// A scalar that approaches its target by `next = prev + (target - prev) * damping`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothedValue {
    value: f32,
    target: f32,
    damping: f32,
    precision: f32,
}

impl SmoothedValue {
    /// Default fraction of the gap closed per tick.
    pub const DEFAULT_DAMPING: f32 = 0.15;
    /// Default snapping threshold.
    pub const DEFAULT_PRECISION: f32 = 0.001;

    /// Create a value at rest at `initial`. `damping` is clamped into `(0, 1]`
    /// and `precision` to be non-negative.
    pub fn new(initial: f32, damping: f32, precision: f32) -> Self {
        Self {
            value: initial,
            target: initial,
            damping: damping.clamp(f32::EPSILON, 1.0),
            precision: precision.max(0.0),
        }
    }

    /// Create a value with the default damping and precision.
    pub fn with_defaults(initial: f32) -> Self {
        Self::new(initial, Self::DEFAULT_DAMPING, Self::DEFAULT_PRECISION)
    }

    /// Current value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Current target.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Retarget. Takes effect from the next tick.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump to `value` and stop there.
    pub fn snap_to(&mut self, value: f32) {
        self.value = value;
        self.target = value;
    }

    /// True once the value sits exactly on the target.
    pub fn is_settled(&self) -> bool {
        self.value == self.target
    }

    /// Advance one tick and return the new value.
    pub fn tick(&mut self) -> f32 {
        let delta = self.target - self.value;
        if delta.abs() <= self.precision {
            self.value = self.target;
        } else {
            self.value += delta * self.damping;
        }
        self.value
    }
}

impl Default for SmoothedValue {
    fn default() -> Self {
        Self::with_defaults(0.0)
    }
}
