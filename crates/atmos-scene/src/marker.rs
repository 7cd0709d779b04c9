//! Pulsing pin with an expanding surface ripple at the focused location.

use std::f32::consts::PI;

use atmos_animation::lerp;
use atmos_geo::{GeoPoint, surface_orientation};
use atmos_lighting::{PointLight, srgb_hex};
use glam::{Mat4, Quat, Vec3};

use crate::instance::{MeshInstance, MeshKind};

const PULSE_RATE: f32 = 2.2;
const PULSE_AMPLITUDE: f32 = 0.12;
const RIPPLE_PERIOD: f32 = 2.2;

const HEAD_COLOR: u32 = 0xff6b6b;
const STEM_COLOR: u32 = 0xf87171;
const HALO_COLOR: u32 = 0xffd4d4;

pub const MARKER_LIGHT_INTENSITY: f32 = 1.2;
pub const MARKER_LIGHT_RANGE: f32 = 0.8;

#[derive(Clone, Debug)]
pub struct LocationMarker {
    location: GeoPoint,
    /// Globe-local anchor.
    anchor: Vec3,
    orientation: Quat,
    pulse: f32,
    ripple_phase: f32,
}

impl LocationMarker {
    pub fn new(location: GeoPoint, radius: f32) -> Self {
        let anchor = location.to_surface(radius);
        Self {
            location,
            anchor,
            orientation: surface_orientation(anchor),
            pulse: 1.0,
            ripple_phase: 0.0,
        }
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Current pin scale.
    pub fn pulse(&self) -> f32 {
        self.pulse
    }

    /// Ripple progress in `[0, 1)`.
    pub fn ripple_phase(&self) -> f32 {
        self.ripple_phase
    }

    pub fn ripple_scale(&self) -> f32 {
        0.4 + self.ripple_phase * 1.2
    }

    pub fn ripple_opacity(&self) -> f32 {
        lerp(0.4, 0.0, self.ripple_phase)
    }

    /// Drive the animation from total scene time in seconds.
    pub fn update(&mut self, elapsed: f32) {
        self.pulse = 1.0 + (elapsed * PULSE_RATE).sin() * PULSE_AMPLITUDE;
        self.ripple_phase = elapsed.rem_euclid(RIPPLE_PERIOD) / RIPPLE_PERIOD;
    }

    fn frame(&self, globe: Mat4) -> Mat4 {
        globe
            * Mat4::from_rotation_translation(self.orientation, self.anchor)
            * Mat4::from_scale(Vec3::splat(self.pulse))
    }

    /// Append the pin parts in world space.
    pub fn instances(&self, globe: Mat4, out: &mut Vec<MeshInstance>) {
        let frame = self.frame(globe);
        let head = srgb_hex(HEAD_COLOR);

        out.push(MeshInstance {
            mesh: MeshKind::Sphere,
            model: frame * Mat4::from_scale_rotation_translation(
                Vec3::splat(0.045),
                Quat::IDENTITY,
                Vec3::new(0.0, 0.08, 0.0),
            ),
            color: head,
            opacity: 1.0,
            emissive: 0.6,
        });
        out.push(MeshInstance {
            mesh: MeshKind::Cone,
            model: frame * Mat4::from_scale_rotation_translation(
                Vec3::new(0.035, 0.18, 0.035),
                Quat::from_rotation_x(PI),
                Vec3::new(0.0, -0.02, 0.0),
            ),
            color: srgb_hex(STEM_COLOR),
            opacity: 1.0,
            emissive: 0.4,
        });
        out.push(MeshInstance {
            mesh: MeshKind::Ring,
            model: frame * Mat4::from_scale_rotation_translation(
                Vec3::splat(0.11),
                Quat::IDENTITY,
                Vec3::new(0.0, 0.11, 0.0),
            ),
            color: srgb_hex(HALO_COLOR),
            opacity: 0.35,
            emissive: 1.0,
        });
        out.push(MeshInstance {
            mesh: MeshKind::Ring,
            model: frame * Mat4::from_scale_rotation_translation(
                Vec3::splat(0.12 * self.ripple_scale()),
                Quat::IDENTITY,
                Vec3::new(0.0, -0.001, 0.0),
            ),
            color: head,
            opacity: self.ripple_opacity(),
            emissive: 1.0,
        });
    }

    /// Local glow just above the pin.
    pub fn light(&self, globe: Mat4) -> PointLight {
        let local = Mat4::from_rotation_translation(self.orientation, self.anchor);
        PointLight {
            position: (globe * local).transform_point3(Vec3::new(0.0, 0.2, 0.0)),
            color: srgb_hex(HEAD_COLOR),
            intensity: MARKER_LIGHT_INTENSITY,
            range: MARKER_LIGHT_RANGE,
        }
    }
}
