//! GPU-side light layout shared by the globe, marker, and cloud shaders.
//!
//! Bound at `@group(0) @binding(1)` next to the camera uniform. All fields
//! are `vec4`-aligned so the struct is valid under both std140 and std430.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Point lights the shaders loop over: marker glow and lightning.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Decode `0xRRGGBB` into linear RGB.
pub fn srgb_hex(hex: u32) -> Vec3 {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(16), channel(8), channel(0))
}

/// CPU-side point light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    /// Linear RGB.
    pub color: Vec3,
    pub intensity: f32,
    /// Distance at which the contribution reaches zero.
    pub range: f32,
}

impl PointLight {
    pub fn to_gpu(&self) -> PointLightGpu {
        PointLightGpu {
            position_range: self.position.extend(self.range).to_array(),
            color_intensity: self.color.extend(self.intensity).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct PointLightGpu {
    /// xyz = world position, w = range.
    pub position_range: [f32; 4],
    /// xyz = linear colour, w = intensity.
    pub color_intensity: [f32; 4],
}

static_assertions::assert_eq_size!(PointLightGpu, [u8; 32]);

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightingUniform {
    /// xyz = ambient colour, w = intensity.
    pub ambient: [f32; 4],
    /// xyz = direction the sunlight travels, w = intensity.
    pub sun_direction: [f32; 4],
    /// xyz = sun colour, w unused.
    pub sun_color: [f32; 4],
    /// x = active point light count.
    pub counts: [u32; 4],
    pub points: [PointLightGpu; MAX_POINT_LIGHTS],
}

static_assertions::assert_eq_size!(LightingUniform, [u8; 64 + 32 * MAX_POINT_LIGHTS]);

impl LightingUniform {
    /// Sun placed at `(10, 10, 5)` shining on the origin.
    pub const SUN_POSITION: Vec3 = Vec3::new(10.0, 10.0, 5.0);

    /// Pack the current intensities. Lights beyond [`MAX_POINT_LIGHTS`]
    /// are dropped.
    pub fn new(ambient: f32, directional: f32, point_lights: &[PointLight]) -> Self {
        let mut points = [PointLightGpu::default(); MAX_POINT_LIGHTS];
        let mut count = 0;
        for (slot, light) in points
            .iter_mut()
            .zip(point_lights.iter().filter(|l| l.intensity > 0.0))
        {
            *slot = light.to_gpu();
            count += 1;
        }
        let direction = -Self::SUN_POSITION.normalize();
        Self {
            ambient: Vec3::ONE.extend(ambient).to_array(),
            sun_direction: direction.extend(directional).to_array(),
            sun_color: [1.0, 1.0, 1.0, 0.0],
            counts: [count, 0, 0, 0],
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_hex_endpoints() {
        assert_eq!(srgb_hex(0x000000), Vec3::ZERO);
        assert!((srgb_hex(0xffffff) - Vec3::ONE).length() < 1e-6);
        let mid = srgb_hex(0x808080);
        assert!((mid.x - 0.2159).abs() < 1e-3, "sRGB 128 is ~0.216 linear, got {}", mid.x);
    }

    #[test]
    fn test_srgb_hex_channel_order() {
        let c = srgb_hex(0xff0000);
        assert_eq!((c.y, c.z), (0.0, 0.0));
        assert!((c.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_skips_dark_lights() {
        let lit = PointLight { position: Vec3::X, color: Vec3::ONE, intensity: 1.2, range: 0.8 };
        let dark = PointLight { intensity: 0.0, ..lit };
        let u = LightingUniform::new(0.4, 1.0, &[dark, lit]);
        assert_eq!(u.counts[0], 1);
        assert_eq!(u.points[0].color_intensity[3], 1.2);
        assert_eq!(u.points[0].position_range[3], 0.8);
        assert_eq!(u.ambient[3], 0.4);
        assert_eq!(u.sun_direction[3], 1.0);
    }

    #[test]
    fn test_uniform_caps_light_count() {
        let light = PointLight { position: Vec3::ZERO, color: Vec3::ONE, intensity: 1.0, range: 1.0 };
        let u = LightingUniform::new(0.0, 0.0, &[light; 7]);
        assert_eq!(u.counts[0] as usize, MAX_POINT_LIGHTS);
    }

    #[test]
    fn test_sun_direction_points_at_origin() {
        let u = LightingUniform::new(0.0, 1.0, &[]);
        let d = Vec3::new(u.sun_direction[0], u.sun_direction[1], u.sun_direction[2]);
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert!(d.dot(LightingUniform::SUN_POSITION) < 0.0);
    }
}
