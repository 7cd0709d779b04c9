//! Distance-driven particle budget.

const SMOOTHING: f32 = 0.08;
const FAR_DISTANCE: f32 = 120.0;
const MIN_FRACTION: f32 = 0.3;

/// Smoothed fraction of a fixed particle buffer that is simulated and drawn.
#[derive(Clone, Debug)]
pub struct LevelOfDetail {
    capacity: usize,
    fraction: f32,
    active: usize,
}

impl LevelOfDetail {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            fraction: 1.0,
            active: capacity,
        }
    }

    /// Target fraction for a camera `distance` from the focus. Without a
    /// focus every particle is kept.
    pub fn target_fraction(distance: Option<f32>) -> f32 {
        match distance {
            Some(d) => (1.0 - d / FAR_DISTANCE).clamp(MIN_FRACTION, 1.0),
            None => 1.0,
        }
    }

    /// Ease toward the target and return the new active count, at least one.
    pub fn update(&mut self, distance: Option<f32>) -> usize {
        let target = Self::target_fraction(distance);
        self.fraction += (target - self.fraction) * SMOOTHING;
        let wanted = (self.capacity as f32 * self.fraction).floor() as usize;
        self.active = wanted.min(self.capacity).max(1);
        self.active
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_clamps() {
        assert_eq!(LevelOfDetail::target_fraction(None), 1.0);
        assert_eq!(LevelOfDetail::target_fraction(Some(0.0)), 1.0);
        assert_eq!(LevelOfDetail::target_fraction(Some(60.0)), 0.5);
        assert_eq!(LevelOfDetail::target_fraction(Some(1000.0)), 0.3);
    }

    #[test]
    fn test_approaches_target_smoothly() {
        let mut lod = LevelOfDetail::new(1000);
        let first = lod.update(Some(1000.0));
        assert!(first < 1000 && first > 900, "one step only moves 8%: {first}");
        for _ in 0..200 {
            lod.update(Some(1000.0));
        }
        assert!((lod.fraction() - 0.3).abs() < 1e-3);
        assert!((299..=300).contains(&lod.active()), "got {}", lod.active());
    }

    #[test]
    fn test_never_below_one() {
        let mut lod = LevelOfDetail::new(2);
        for _ in 0..200 {
            lod.update(Some(1000.0));
        }
        assert_eq!(lod.active(), 1, "floor(2 * 0.3) is 0, clamped to 1");
    }
}
