//! Unit meshes: the globe sphere and the marker and cloud primitives.
//!
//! Everything is generated once at startup and scaled by model matrices.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

static_assertions::assert_eq_size!(MeshVertex, [u8; 32]);

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }
}

/// CPU-side indexed triangle list.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Radius-1 sphere with equirectangular UVs.
///
/// Column `u` sits at longitude `u * 360° - 180°`, matching the surface
/// mapping used to place markers, so the texture seam falls on the
/// antimeridian. Row 0 is the north pole and `v` grows southwards.
pub fn uv_sphere(width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut mesh = MeshData::default();

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let (sin_phi, cos_phi) = (v * PI).sin_cos();
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let p = Vec3::new(-cos_theta * sin_phi, cos_phi, sin_theta * sin_phi);
            mesh.vertices.push(MeshVertex::new(p, p, [u, v]));
        }
    }

    let row = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            // The pole rows collapse to a point; skip their degenerate halves.
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

/// Cone with a radius-1 base at `y = -0.5` and its apex at `y = +0.5`.
pub fn cone(radial_segments: u32) -> MeshData {
    let segments = radial_segments.max(3);
    let mut mesh = MeshData::default();

    // Side: an apex row and a base row, one vertex per column so normals
    // follow the slope.
    for (row, radius, y) in [(0.0, 0.0, 0.5), (1.0, 1.0, -0.5)] {
        for ix in 0..=segments {
            let u = ix as f32 / segments as f32;
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let position = Vec3::new(radius * sin_theta, y, radius * cos_theta);
            let normal = Vec3::new(sin_theta, 1.0, cos_theta).normalize();
            mesh.vertices.push(MeshVertex::new(position, normal, [u, row]));
        }
    }
    let row = segments + 1;
    for ix in 0..segments {
        // Apex vertices coincide, so each column is a single triangle.
        mesh.indices.extend_from_slice(&[row + ix, row + ix + 1, ix + 1]);
    }

    // Base cap.
    let center = mesh.vertices.len() as u32;
    mesh.vertices.push(MeshVertex::new(
        Vec3::new(0.0, -0.5, 0.0),
        Vec3::NEG_Y,
        [0.5, 0.5],
    ));
    let rim = mesh.vertices.len() as u32;
    for ix in 0..=segments {
        let (sin_theta, cos_theta) = (ix as f32 / segments as f32 * TAU).sin_cos();
        mesh.vertices.push(MeshVertex::new(
            Vec3::new(sin_theta, -0.5, cos_theta),
            Vec3::NEG_Y,
            [0.5 + 0.5 * sin_theta, 0.5 + 0.5 * cos_theta],
        ));
    }
    for ix in 0..segments {
        mesh.indices
            .extend_from_slice(&[rim + ix + 1, rim + ix, center]);
    }
    mesh
}

/// Flat annulus in the XZ plane facing +Y, outer radius 1.
pub fn ring(inner_radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let inner_radius = inner_radius.clamp(0.0, 1.0);
    let mut mesh = MeshData::default();

    for ix in 0..=segments {
        let u = ix as f32 / segments as f32;
        let (sin_theta, cos_theta) = (u * TAU).sin_cos();
        for (radius, v) in [(inner_radius, 0.0), (1.0, 1.0)] {
            mesh.vertices.push(MeshVertex::new(
                Vec3::new(radius * cos_theta, 0.0, radius * sin_theta),
                Vec3::Y,
                [u, v],
            ));
        }
    }
    for ix in 0..segments {
        let inner = ix * 2;
        let outer = inner + 1;
        let next_inner = inner + 2;
        let next_outer = inner + 3;
        mesh.indices
            .extend_from_slice(&[inner, next_outer, outer, inner, next_inner, next_outer]);
    }
    mesh
}

/// A mesh resident on the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }
}
