//! Plain-old-data layouts shared between the CPU and the WGSL shaders.
//!
//! Every field is a `vec4` or `mat4x4` so the Rust and WGSL layouts agree
//! without padding rules coming into play.

use atmos_camera::{CameraPose, Projection};
use atmos_scene::MeshInstance;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// `@group(0) @binding(0)` in every scene shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = eye position.
    pub position: [f32; 4],
    /// xyz = world-space screen right, for billboards.
    pub right: [f32; 4],
    /// xyz = world-space screen up, for billboards.
    pub up: [f32; 4],
}

static_assertions::assert_eq_size!(CameraUniform, [u8; 112]);

impl CameraUniform {
    pub fn new(pose: &CameraPose, projection: &Projection) -> Self {
        let view = pose.view_matrix();
        // Rows of the view rotation are the camera axes in world space.
        let inverse = view.inverse();
        let right = inverse.transform_vector3(Vec3::X).normalize_or_zero();
        let up = inverse.transform_vector3(Vec3::Y).normalize_or_zero();
        Self {
            view_proj: (projection.matrix() * view).to_cols_array_2d(),
            position: pose.position.extend(1.0).to_array(),
            right: right.extend(0.0).to_array(),
            up: up.extend(0.0).to_array(),
        }
    }
}

/// Per-draw globe parameters, `@group(2) @binding(0)` of the globe shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobeUniform {
    pub model: [[f32; 4]; 4],
    /// rgb = colour used while no earth texture is bound, a = 1 when a
    /// texture is bound.
    pub fallback: [f32; 4],
}

static_assertions::assert_eq_size!(GlobeUniform, [u8; 80]);

impl GlobeUniform {
    pub fn new(model: Mat4, fallback_color: Vec3, textured: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            fallback: fallback_color
                .extend(if textured { 1.0 } else { 0.0 })
                .to_array(),
        }
    }
}

/// Per-instance vertex data for marker and cloud meshes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    /// rgb = linear colour, a = opacity.
    pub color: [f32; 4],
    /// x = emissive mix.
    pub params: [f32; 4],
}

static_assertions::assert_eq_size!(InstanceRaw, [u8; 96]);

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn new(model: Mat4, color: Vec3, opacity: f32, emissive: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: color.extend(opacity).to_array(),
            params: [emissive, 0.0, 0.0, 0.0],
        }
    }
}

impl From<&MeshInstance> for InstanceRaw {
    fn from(instance: &MeshInstance) -> Self {
        Self::new(
            instance.model,
            instance.color,
            instance.opacity,
            instance.emissive,
        )
    }
}

/// Per-draw parameters for rain lines and point sprites.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct EffectUniform {
    pub model: [[f32; 4]; 4],
    /// rgb = linear colour, a = opacity.
    pub color: [f32; 4],
    /// x = world size multiplier, y = 1 for soft sprite edges.
    pub params: [f32; 4],
}

static_assertions::assert_eq_size!(EffectUniform, [u8; 96]);

impl EffectUniform {
    pub fn new(model: Mat4, color: Vec3, opacity: f32, size: f32, soft: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: color.extend(opacity).to_array(),
            params: [size, if soft { 1.0 } else { 0.0 }, 0.0, 0.0],
        }
    }

    pub fn hidden() -> Self {
        Self::new(Mat4::IDENTITY, Vec3::ZERO, 0.0, 0.0, false)
    }

    pub fn opacity(&self) -> f32 {
        self.color[3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_axes_are_orthonormal() {
        let pose = CameraPose::new(Vec3::new(1.0, 2.0, 4.0), Vec3::ZERO);
        let u = CameraUniform::new(&pose, &Projection::default());
        let right = Vec3::from_slice(&u.right[..3]);
        let up = Vec3::from_slice(&u.up[..3]);
        let forward = (pose.look_at - pose.position).normalize();
        assert!((right.length() - 1.0).abs() < 1e-5);
        assert!((up.length() - 1.0).abs() < 1e-5);
        assert!(right.dot(up).abs() < 1e-5, "right and up must be perpendicular");
        assert!(right.dot(forward).abs() < 1e-5 && up.dot(forward).abs() < 1e-5);
        assert!(up.y > 0.0, "screen up should point roughly to world up");
    }

    #[test]
    fn test_camera_projects_look_at_to_screen_center() {
        let pose = CameraPose::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let u = CameraUniform::new(&pose, &Projection::default());
        let clip = Mat4::from_cols_array_2d(&u.view_proj) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(
            (0.0..=1.0).contains(&ndc.z),
            "reverse-Z depth must stay in [0, 1], got {}",
            ndc.z
        );
    }

    #[test]
    fn test_globe_fallback_flag() {
        let u = GlobeUniform::new(Mat4::IDENTITY, Vec3::new(0.1, 0.2, 0.3), false);
        assert_eq!(u.fallback, [0.1, 0.2, 0.3, 0.0]);
        let u = GlobeUniform::new(Mat4::IDENTITY, Vec3::ZERO, true);
        assert_eq!(u.fallback[3], 1.0);
    }

    #[test]
    fn test_instance_from_mesh_instance() {
        let instance = MeshInstance {
            mesh: atmos_scene::MeshKind::Ring,
            model: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            color: Vec3::new(0.5, 0.25, 1.0),
            opacity: 0.4,
            emissive: 0.7,
        };
        let raw = InstanceRaw::from(&instance);
        assert_eq!(raw.color, [0.5, 0.25, 1.0, 0.4]);
        assert_eq!(raw.params[0], 0.7);
        assert_eq!(raw.model[3][..3], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_instance_layout_locations_follow_mesh_vertex() {
        let layout = InstanceRaw::layout();
        assert_eq!(layout.array_stride, 96);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![3, 4, 5, 6, 7, 8]);
    }
}
