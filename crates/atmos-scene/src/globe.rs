//! The textured globe, its atmosphere shell, and the imagery status label.

use std::sync::Arc;

use atmos_assets::{Fetcher, LoadRequest, LoadStatus, ProgressiveTexture, TextureAllocator};
use glam::{Mat4, Quat};

/// Solid colour drawn until imagery arrives, `#1e3a8a`.
pub const FALLBACK_COLOR: u32 = 0x1e3a8a;
/// Atmosphere shell colour, `#4a9eff`.
pub const ATMOSPHERE_COLOR: u32 = 0x4a9eff;
pub const ATMOSPHERE_OPACITY: f32 = 0.1;
/// Shell radius relative to the globe.
pub const ATMOSPHERE_SCALE: f32 = 1.01;

/// Text for the small imagery status affordance. `None` once everything is
/// loaded.
pub fn status_label(status: LoadStatus, has_texture: bool) -> Option<&'static str> {
    match status {
        LoadStatus::LoadingPreview | LoadStatus::LoadingFull => Some("Satellite imagery streaming"),
        LoadStatus::Error if has_texture => Some("Preview imagery (full resolution unavailable)"),
        LoadStatus::Error => Some("Procedural fallback active"),
        LoadStatus::Ready => None,
    }
}

/// Globe surface state: radius, spin, and the streamed texture.
pub struct GlobeSurface<T> {
    radius: f32,
    rotation: f32,
    texture: Option<ProgressiveTexture<T>>,
}

impl<T> GlobeSurface<T> {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            rotation: 0.0,
            texture: None,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    /// Spin about +Y in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn rotate(&mut self, radians: f32) {
        self.rotation = (self.rotation + radians) % std::f32::consts::TAU;
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.rotation)
    }

    /// Globe-local to world transform (rotation only; the globe sits at the origin).
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.orientation())
    }

    /// Begin streaming imagery, replacing any earlier load.
    pub fn load<A>(&mut self, request: LoadRequest, fetcher: Arc<dyn Fetcher>, allocator: &mut A)
    where
        A: TextureAllocator<Texture = T>,
    {
        match self.texture.as_mut() {
            Some(texture) => texture.restart(request, fetcher, allocator),
            None => self.texture = Some(ProgressiveTexture::start(request, fetcher, &*allocator)),
        }
    }

    /// Pick up finished loader work. Returns true if what is drawn changed.
    pub fn poll<A>(&mut self, allocator: &mut A) -> bool
    where
        A: TextureAllocator<Texture = T>,
    {
        self.texture
            .as_mut()
            .is_some_and(|texture| texture.poll(allocator))
    }

    /// Stop loading and release the texture.
    pub fn unmount<A>(&mut self, allocator: &mut A)
    where
        A: TextureAllocator<Texture = T>,
    {
        if let Some(mut texture) = self.texture.take() {
            texture.unmount(allocator);
        }
    }

    /// The texture to sample, or `None` to draw [`FALLBACK_COLOR`].
    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref().and_then(|t| t.texture())
    }

    pub fn status(&self) -> LoadStatus {
        self.texture
            .as_ref()
            .map_or(LoadStatus::Error, |t| t.status())
    }

    pub fn is_high_quality(&self) -> bool {
        self.texture.as_ref().is_some_and(|t| t.is_high_quality())
    }

    pub fn status_label(&self) -> Option<&'static str> {
        status_label(self.status(), self.texture().is_some())
    }
}
