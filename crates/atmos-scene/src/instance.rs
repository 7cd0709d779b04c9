//! Flat draw records for the small meshes the scene places on the globe.

use glam::{Mat4, Vec3};

/// Unit meshes the renderer keeps resident.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    /// Radius 1.
    Sphere,
    /// Base radius 1 at y = -0.5, apex at y = +0.5.
    Cone,
    /// Flat annulus in the XZ plane, outer radius 1.
    Ring,
}

/// One mesh placed in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshInstance {
    pub mesh: MeshKind,
    pub model: Mat4,
    /// Linear RGB.
    pub color: Vec3,
    pub opacity: f32,
    /// Self-illumination added on top of lighting; 1.0 ignores lighting entirely.
    pub emissive: f32,
}
