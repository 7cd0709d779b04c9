//! Falling rain streaks.
//!
//! Each particle is a head/tail segment in field-local space. Every particle
//! owns its own LCG stream, seeded from the tier base and its index, so a
//! respawn draws from that particle's stream alone and trajectories do not
//! depend on how many other particles are active.

use atmos_animation::SeededRng;
use glam::Vec3;

use crate::frame_multiplier;
use crate::lod::LevelOfDetail;
use crate::tier::{IntensityTier, RainSettings};

/// Streak colour, `#9dc4ff`.
pub const RAIN_COLOR: u32 = 0x9dc4ff;

const SEED_STRIDE: u32 = 7919;

#[derive(Clone, Debug)]
pub struct RainField {
    tier: IntensityTier,
    settings: RainSettings,
    /// Two vertices per particle: head then tail.
    segments: Vec<[f32; 3]>,
    velocities: Vec<f32>,
    drifts: Vec<f32>,
    rngs: Vec<SeededRng>,
    lod: LevelOfDetail,
    origin: Vec3,
}

impl RainField {
    pub fn new(count: usize, tier: IntensityTier) -> Self {
        let settings = tier.rain();
        let base = tier.rain_seed();
        let mut field = Self {
            tier,
            settings,
            segments: Vec::with_capacity(count * 2),
            velocities: Vec::with_capacity(count),
            drifts: Vec::with_capacity(count),
            rngs: Vec::with_capacity(count),
            lod: LevelOfDetail::new(count),
            origin: Vec3::ZERO,
        };

        for i in 0..count {
            let seed = base
                .wrapping_add((i as u32).wrapping_mul(SEED_STRIDE))
                .wrapping_add(1);
            let mut rng = SeededRng::new(seed);
            let spread = settings.spread;
            let x = (rng.next_f32() - 0.5) * spread;
            let y = rng.next_f32() * spread - spread / 2.0;
            let z = (rng.next_f32() - 0.5) * spread;
            field.segments.push([x, y, z]);
            field.segments.push([x, y - settings.length, z]);
            field.velocities.push(settings.speed * (0.7 + rng.next_f32() * 0.6));
            field.drifts.push(settings.angle * (rng.next_f32() - 0.5));
            field.rngs.push(rng);
        }
        tracing::debug!(count, tier = %tier, "rain field created");
        field
    }

    pub fn tier(&self) -> IntensityTier {
        self.tier
    }

    pub fn settings(&self) -> &RainSettings {
        &self.settings
    }

    pub fn capacity(&self) -> usize {
        self.velocities.len()
    }

    pub fn active_count(&self) -> usize {
        self.lod.active().min(self.capacity())
    }

    /// Where the field is centred in world space.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Floor below which a head respawns at the ceiling.
    pub fn floor(&self) -> f32 {
        -self.settings.spread / 2.0
    }

    /// Head/tail vertex pairs for the active particles, field-local.
    pub fn segments(&self) -> &[[f32; 3]] {
        &self.segments[..self.active_count() * 2]
    }

    /// Advance by `dt` seconds. The field centres on `focus` when one is set,
    /// otherwise on the camera, and thins out as the camera pulls away.
    pub fn update(&mut self, dt: f32, camera: Vec3, focus: Option<Vec3>) {
        if self.capacity() == 0 {
            return;
        }
        self.origin = focus.unwrap_or(camera);
        let distance = focus.map(|f| camera.distance(f));
        let active = self.lod.update(distance);

        let m = frame_multiplier(dt);
        let floor = self.floor();
        let settings = self.settings;

        for i in 0..active {
            let fall = self.velocities[i] * m;
            let drift = self.drifts[i] * 0.3 * m;
            let (head, tail) = pair_mut(&mut self.segments, i);
            head[0] += drift;
            tail[0] += drift;
            head[1] -= fall;
            tail[1] -= fall;
            head[2] += drift * 0.2;
            tail[2] += drift * 0.2;

            if head[1] < floor {
                let rng = &mut self.rngs[i];
                let x = (rng.next_f32() - 0.5) * settings.spread;
                let z = (rng.next_f32() - 0.5) * settings.spread;
                self.velocities[i] = settings.speed * (0.7 + rng.next_f32() * 0.6);
                self.drifts[i] = settings.angle * (rng.next_f32() - 0.5);
                let top = settings.spread / 2.0;
                *head = [x, top, z];
                *tail = [x, top - settings.length, z];
            }
        }
    }
}

fn pair_mut(segments: &mut [[f32; 3]], i: usize) -> (&mut [f32; 3], &mut [f32; 3]) {
    let (head, tail) = segments[i * 2..i * 2 + 2].split_at_mut(1);
    (&mut head[0], &mut tail[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_initial_layout_within_box() {
        let field = RainField::new(500, IntensityTier::Moderate);
        let half = field.settings().spread / 2.0;
        for pair in field.segments().chunks(2) {
            let (head, tail) = (pair[0], pair[1]);
            assert!(head[0].abs() <= half && head[2].abs() <= half);
            assert!(head[1] >= -half && head[1] <= half);
            assert!((head[1] - tail[1] - 0.2).abs() < 1e-5, "tail trails by the streak length");
        }
    }

    #[test]
    fn test_all_heads_recycled_above_floor() {
        let mut field = RainField::new(800, IntensityTier::Heavy);
        let max_step = field.settings().speed * 1.3;
        for _ in 0..600 {
            field.update(DT, Vec3::new(0.0, 0.0, 5.0), None);
            let floor = field.floor();
            let below = field
                .segments()
                .chunks(2)
                .filter(|pair| pair[0][1] < floor)
                .count();
            assert_eq!(below, 0, "every head under the floor respawns in the same frame");
            assert!(
                field.segments().chunks(2).all(|p| p[0][1] >= floor - max_step),
                "nothing escapes by more than one frame of fall"
            );
        }
    }

    #[test]
    fn test_same_tier_replays_identically() {
        let mut a = RainField::new(300, IntensityTier::Light);
        let mut b = RainField::new(300, IntensityTier::Light);
        for _ in 0..400 {
            a.update(DT, Vec3::Z * 5.0, None);
            b.update(DT, Vec3::Z * 5.0, None);
        }
        assert_eq!(a.segments(), b.segments());
    }

    #[test]
    fn test_tiers_differ() {
        let light = RainField::new(10, IntensityTier::Light);
        let heavy = RainField::new(10, IntensityTier::Heavy);
        assert_ne!(light.segments(), heavy.segments());
    }

    #[test]
    fn test_fall_scales_with_delta() {
        let mut slow = RainField::new(1, IntensityTier::Moderate);
        let mut fast = RainField::new(1, IntensityTier::Moderate);
        let y0 = slow.segments()[0][1];
        slow.update(DT, Vec3::ZERO, None);
        fast.update(DT * 2.0, Vec3::ZERO, None);
        let d_slow = y0 - slow.segments()[0][1];
        let d_fast = y0 - fast.segments()[0][1];
        if d_slow > 0.0 && d_fast > 0.0 {
            assert!((d_fast - 2.0 * d_slow).abs() < 1e-5, "two 60 Hz frames in one step");
        }
    }

    #[test]
    fn test_zero_delta_counts_as_one_frame() {
        let mut a = RainField::new(50, IntensityTier::Moderate);
        let mut b = RainField::new(50, IntensityTier::Moderate);
        a.update(0.0, Vec3::ZERO, None);
        b.update(DT, Vec3::ZERO, None);
        assert_eq!(a.segments(), b.segments());
    }

    #[test]
    fn test_distant_focus_thins_field() {
        let mut field = RainField::new(1000, IntensityTier::Moderate);
        let focus = Vec3::new(0.0, 1.0, 0.0);
        for _ in 0..300 {
            field.update(DT, Vec3::new(0.0, 200.0, 0.0), Some(focus));
        }
        assert!(field.active_count() <= 301, "far camera keeps ~30%");
        assert_eq!(field.segments().len(), field.active_count() * 2);
        assert_eq!(field.origin(), focus, "field follows the focus");
    }

    #[test]
    fn test_origin_follows_camera_without_focus() {
        let mut field = RainField::new(10, IntensityTier::Light);
        let camera = Vec3::new(1.0, 2.0, 3.0);
        field.update(DT, camera, None);
        assert_eq!(field.origin(), camera);
        assert_eq!(field.active_count(), 10);
    }

    #[test]
    fn test_empty_field_is_inert() {
        let mut field = RainField::new(0, IntensityTier::Light);
        field.update(DT, Vec3::ZERO, None);
        assert!(field.segments().is_empty());
    }
}
