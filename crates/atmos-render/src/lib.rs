//! wgpu rendering for the weather globe: device setup, meshes, pipelines,
//! the progressive earth texture allocator, and the scene renderer.

pub mod depth;
pub mod frame;
pub mod gpu;
pub mod mesh;
pub mod pipelines;
pub mod renderer;
pub mod shaders;
pub mod texture;
pub mod uniforms;

pub use depth::DepthBuffer;
pub use frame::{FrameEncoder, SPACE_BLACK};
pub use gpu::{
    RenderContext, RenderContextError, SurfaceError, device_capabilities,
    init_render_context_blocking,
};
pub use mesh::{GpuMesh, MeshData, MeshVertex, cone, ring, uv_sphere};
pub use renderer::{DynamicBuffer, GlobeRenderer, MeshBatch};
pub use texture::{GlobeTexture, GpuTextureAllocator, TextureError, texture_bind_group_layout};
pub use uniforms::{CameraUniform, EffectUniform, GlobeUniform, InstanceRaw};

/// Headless device for GPU tests. `None` when no adapter is available.
#[cfg(test)]
pub(crate) mod test_support {
    pub(crate) fn create_test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });

            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok()?;

            adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()
        })
    }
}
