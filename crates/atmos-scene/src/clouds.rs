//! Dark storm-cloud puffs hovering over a surface anchor.

use std::f32::consts::TAU;

use atmos_animation::SeededRng;
use atmos_geo::{GeoPoint, surface_orientation};
use atmos_lighting::srgb_hex;
use glam::{Mat4, Quat, Vec3};

use crate::instance::{MeshInstance, MeshKind};

pub const PUFF_COUNT: usize = 6;
const PUFF_RADIUS: f32 = 0.45;
const ALTITUDE: f32 = 1.08;
const SPIN_RATE: f32 = 0.18;
const CLOUD_COLOR: u32 = 0x1a1d24;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Puff {
    /// Offset in the cluster frame (Y is the local surface normal).
    pub offset: Vec3,
    pub scale: f32,
}

#[derive(Clone, Debug)]
pub struct StormClouds {
    location: GeoPoint,
    center: Vec3,
    orientation: Quat,
    puffs: [Puff; PUFF_COUNT],
    spin: f32,
    opacity: f32,
}

/// Deterministic layout seed for a location.
pub fn cloud_seed(location: GeoPoint) -> u32 {
    let lat = ((location.lat + 90.0) * 1000.0).floor() as i64;
    let lon = ((location.lon + 180.0) * 1000.0).floor() as i64;
    (lat * 17 + lon) as u32
}

impl StormClouds {
    pub fn new(location: GeoPoint, radius: f32) -> Self {
        let base = location.to_surface(1.0).normalize_or_zero();
        let mut rng = SeededRng::new(cloud_seed(location));
        let puffs = std::array::from_fn(|i| {
            let angle = i as f32 / PUFF_COUNT as f32 * TAU;
            let radial = 0.35 + rng.next_f32() * 0.18;
            let height = (rng.next_f32() - 0.5) * 0.18;
            let scale = 0.45 + rng.next_f32() * 0.25;
            Puff {
                offset: Vec3::new(angle.cos() * radial, height, angle.sin() * radial * 0.85),
                scale,
            }
        });
        Self {
            location,
            center: base * radius * ALTITUDE,
            orientation: surface_orientation(base),
            puffs,
            spin: 0.0,
            opacity: 0.0,
        }
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    /// Globe-local cluster centre.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn puffs(&self) -> &[Puff; PUFF_COUNT] {
        &self.puffs
    }

    pub fn spin(&self) -> f32 {
        self.spin
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Rotate about the local up axis and track the effect fade.
    pub fn update(&mut self, dt: f32, effect_opacity: f32) {
        self.spin = (self.spin + dt * SPIN_RATE) % TAU;
        self.opacity = (effect_opacity * 0.85).min(0.8);
    }

    pub fn instances(&self, globe: Mat4, out: &mut Vec<MeshInstance>) {
        let frame = globe
            * Mat4::from_rotation_translation(
                self.orientation * Quat::from_rotation_y(self.spin),
                self.center,
            );
        let color = srgb_hex(CLOUD_COLOR);
        out.extend(self.puffs.iter().map(|puff| MeshInstance {
            mesh: MeshKind::Sphere,
            model: frame
                * Mat4::from_scale_rotation_translation(
                    Vec3::splat(puff.scale * PUFF_RADIUS),
                    Quat::IDENTITY,
                    puff.offset,
                ),
            color,
            opacity: self.opacity,
            emissive: 0.0,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_deterministic_per_location() {
        let a = StormClouds::new(GeoPoint::new(51.5, -0.12), 1.0);
        let b = StormClouds::new(GeoPoint::new(51.5, -0.12), 1.0);
        let c = StormClouds::new(GeoPoint::new(-33.9, 151.2), 1.0);
        assert_eq!(a.puffs(), b.puffs());
        assert_ne!(a.puffs(), c.puffs());
    }

    #[test]
    fn test_puff_ranges() {
        let clouds = StormClouds::new(GeoPoint::new(35.0, 139.0), 1.0);
        for puff in clouds.puffs() {
            let radial = Vec3::new(puff.offset.x, 0.0, puff.offset.z / 0.85).length();
            assert!((0.35 - 1e-5..=0.53 + 1e-5).contains(&radial), "radial {radial}");
            assert!(puff.offset.y.abs() <= 0.09 + 1e-6);
            assert!((0.45..=0.7).contains(&puff.scale));
        }
    }

    #[test]
    fn test_cluster_floats_above_surface() {
        let clouds = StormClouds::new(GeoPoint::new(10.0, 10.0), 1.5);
        assert!((clouds.center().length() - 1.62).abs() < 1e-4);
    }

    #[test]
    fn test_seed_formula() {
        assert_eq!(cloud_seed(GeoPoint::new(0.0, 0.0)), 90_000 * 17 + 180_000);
    }

    #[test]
    fn test_opacity_capped_and_spinning() {
        let mut clouds = StormClouds::new(GeoPoint::new(0.0, 0.0), 1.0);
        clouds.update(1.0, 1.0);
        assert!((clouds.opacity() - 0.8).abs() < 1e-6);
        assert!((clouds.spin() - 0.18).abs() < 1e-6);
        clouds.update(0.0, 0.5);
        assert!((clouds.opacity() - 0.425).abs() < 1e-6);

        let mut parts = Vec::new();
        clouds.instances(Mat4::IDENTITY, &mut parts);
        assert_eq!(parts.len(), PUFF_COUNT);
        assert!(parts.iter().all(|p| p.opacity == clouds.opacity()));
    }
}
