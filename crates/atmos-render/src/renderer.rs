//! Draws a [`SceneState`] with wgpu.
//!
//! [`GlobeRenderer::prepare`] copies everything the scene produced this tick
//! into GPU buffers; [`GlobeRenderer::draw`] then records the draws in a
//! fixed order: stars, globe, atmosphere, marker and clouds, rain, snow, and
//! finally the lightning flash overlay.

use std::ops::Range;

use atmos_camera::Projection;
use atmos_lighting::{OVERLAY_COLOR, srgb_hex};
use atmos_particles::RAIN_COLOR;
use atmos_scene::{
    ATMOSPHERE_COLOR, ATMOSPHERE_OPACITY, ATMOSPHERE_SCALE, FALLBACK_COLOR, MeshInstance,
    MeshKind, SceneState, Star,
};
use glam::{Mat4, Vec3};

use crate::depth::DepthBuffer;
use crate::mesh::{GpuMesh, cone, ring, uv_sphere};
use crate::pipelines::{
    EffectPipelines, FrameBindings, GlobePipeline, InstancedPipeline, OverlayPipeline,
    UniformBinding,
};
use crate::texture::{GlobeTexture, GpuTextureAllocator, TextureError};
use crate::uniforms::{CameraUniform, EffectUniform, GlobeUniform, InstanceRaw};

/// Star sprite size in world units per unit of config factor.
const STAR_SIZE_SCALE: f32 = 0.12;
/// Inner radius of the unit ring mesh.
const RING_INNER_RADIUS: f32 = 0.8;
const SMALL_MESH_SEGMENTS: u32 = 32;

/// A vertex buffer that grows to fit whatever is written into it.
pub struct DynamicBuffer {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl DynamicBuffer {
    const MIN_CAPACITY: u64 = 256;

    pub fn new(device: &wgpu::Device, label: &'static str) -> Self {
        Self {
            label,
            buffer: Self::allocate(device, label, Self::MIN_CAPACITY),
            capacity: Self::MIN_CAPACITY,
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let needed = bytes.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two().max(Self::MIN_CAPACITY);
            log::debug!("Growing '{}' to {} bytes", self.label, self.capacity);
            self.buffer = Self::allocate(device, self.label, self.capacity);
        }
        queue.write_buffer(&self.buffer, 0, bytes);
    }

    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..)
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

/// A run of instances sharing one mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshBatch {
    pub mesh: MeshKind,
    pub instances: Range<u32>,
}

fn mesh_order(kind: MeshKind) -> u8 {
    match kind {
        MeshKind::Sphere => 0,
        MeshKind::Cone => 1,
        MeshKind::Ring => 2,
    }
}

/// Group `instances` by mesh, appending their GPU form to `raw` and one
/// batch per mesh to `batches`. Order within a mesh is preserved.
pub fn batch_instances(
    instances: &mut [MeshInstance],
    raw: &mut Vec<InstanceRaw>,
    batches: &mut Vec<MeshBatch>,
) {
    instances.sort_by_key(|i| mesh_order(i.mesh));
    for chunk in instances.chunk_by(|a, b| a.mesh == b.mesh) {
        let start = raw.len() as u32;
        raw.extend(chunk.iter().map(InstanceRaw::from));
        batches.push(MeshBatch {
            mesh: chunk[0].mesh,
            instances: start..raw.len() as u32,
        });
    }
}

/// Sprite instances for the visible stars: xyz centre, w relative size.
pub fn star_sprites(stars: &[Star]) -> Vec<[f32; 4]> {
    stars
        .iter()
        .map(|s| s.position.extend(s.size).to_array())
        .collect()
}

/// Sprite instances for snowflakes, all the same relative size.
pub fn snow_sprites(positions: &[[f32; 3]]) -> Vec<[f32; 4]> {
    positions.iter().map(|&[x, y, z]| [x, y, z, 1.0]).collect()
}

pub struct GlobeRenderer {
    frame: FrameBindings,
    depth: DepthBuffer,
    projection: Projection,

    globe_pipeline: GlobePipeline,
    globe_uniform: UniformBinding,
    fallback_texture: GlobeTexture,

    instanced: InstancedPipeline,
    effects: EffectPipelines,
    overlay: OverlayPipeline,
    overlay_uniform: UniformBinding,
    rain_uniform: UniformBinding,
    snow_uniform: UniformBinding,
    star_uniform: UniformBinding,

    sphere: GpuMesh,
    cone: GpuMesh,
    ring: GpuMesh,

    instance_buffer: DynamicBuffer,
    rain_buffer: DynamicBuffer,
    snow_buffer: DynamicBuffer,
    star_buffer: DynamicBuffer,

    // Per-frame results of `prepare`.
    scratch_instances: Vec<MeshInstance>,
    scratch_raw: Vec<InstanceRaw>,
    batches: Vec<MeshBatch>,
    rain_vertices: u32,
    snow_count: u32,
    star_count: u32,
    overlay_visible: bool,
}

impl GlobeRenderer {
    pub fn new(
        device: &wgpu::Device,
        allocator: &mut GpuTextureAllocator,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sphere_segments: u32,
    ) -> Result<Self, TextureError> {
        let frame = FrameBindings::new(device);
        let globe_pipeline =
            GlobePipeline::new(device, &frame.layout, allocator.bind_group_layout(), format);
        let instanced = InstancedPipeline::new(device, &frame.layout, format);
        let effects = EffectPipelines::new(device, &frame.layout, format);
        let overlay = OverlayPipeline::new(device, format);

        let globe_uniform = UniformBinding::new(
            device,
            &globe_pipeline.globe_layout,
            "globe-uniform",
            &GlobeUniform::new(Mat4::IDENTITY, srgb_hex(FALLBACK_COLOR), false),
        );
        let hidden = EffectUniform::hidden();
        let effect_uniform = |label| {
            UniformBinding::new(device, &effects.effect_layout, label, &hidden)
        };
        let rain_uniform = effect_uniform("rain-uniform");
        let snow_uniform = effect_uniform("snow-uniform");
        let star_uniform = effect_uniform("star-uniform");
        let overlay_uniform =
            UniformBinding::new(device, &overlay.layout, "overlay-uniform", &[0.0f32; 4]);

        let lon_segments = sphere_segments.max(8);
        let sphere = GpuMesh::upload(device, "sphere", &uv_sphere(lon_segments, lon_segments / 2));
        let cone = GpuMesh::upload(device, "cone", &cone(SMALL_MESH_SEGMENTS));
        let ring = GpuMesh::upload(
            device,
            "ring",
            &ring(RING_INNER_RADIUS, SMALL_MESH_SEGMENTS),
        );

        let fallback_texture = allocator.create_solid([255, 255, 255, 255])?;
        let mut projection = Projection::default();
        projection.set_aspect_ratio(width.max(1) as f32, height.max(1) as f32);

        Ok(Self {
            depth: DepthBuffer::new(device, width, height),
            projection,
            frame,
            globe_pipeline,
            globe_uniform,
            fallback_texture,
            instanced,
            overlay_uniform,
            rain_uniform,
            snow_uniform,
            star_uniform,
            effects,
            overlay,
            sphere,
            cone,
            ring,
            instance_buffer: DynamicBuffer::new(device, "instance-buffer"),
            rain_buffer: DynamicBuffer::new(device, "rain-buffer"),
            snow_buffer: DynamicBuffer::new(device, "snow-buffer"),
            star_buffer: DynamicBuffer::new(device, "star-buffer"),
            scratch_instances: Vec::new(),
            scratch_raw: Vec::new(),
            batches: Vec::new(),
            rain_vertices: 0,
            snow_count: 0,
            star_count: 0,
            overlay_visible: false,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
        self.projection
            .set_aspect_ratio(width.max(1) as f32, height.max(1) as f32);
    }

    pub fn set_fov_degrees(&mut self, degrees: f32) {
        self.projection.fov_y = degrees.clamp(1.0, 179.0).to_radians();
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Release the fallback texture through the allocator that made it.
    pub fn destroy(self, allocator: &mut GpuTextureAllocator) {
        use atmos_assets::TextureAllocator;
        allocator.release(self.fallback_texture);
    }

    /// Upload this tick's scene state.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneState<GlobeTexture>,
    ) {
        let pose = scene.camera().pose();
        self.frame.write(
            queue,
            &CameraUniform::new(pose, &self.projection),
            &scene.lighting_uniform(),
        );

        let globe_matrix = scene.globe_matrix();
        let radius = scene.globe().radius();
        self.globe_uniform.write(
            queue,
            &GlobeUniform::new(
                globe_matrix * Mat4::from_scale(Vec3::splat(radius)),
                srgb_hex(FALLBACK_COLOR),
                scene.globe().texture().is_some(),
            ),
        );

        // The atmosphere always occupies slot 0.
        self.scratch_raw.clear();
        self.batches.clear();
        self.scratch_raw.push(InstanceRaw::new(
            globe_matrix * Mat4::from_scale(Vec3::splat(radius * ATMOSPHERE_SCALE)),
            srgb_hex(ATMOSPHERE_COLOR),
            ATMOSPHERE_OPACITY,
            1.0,
        ));
        self.scratch_instances.clear();
        scene.mesh_instances(&mut self.scratch_instances);
        batch_instances(
            &mut self.scratch_instances,
            &mut self.scratch_raw,
            &mut self.batches,
        );
        self.instance_buffer
            .write(device, queue, bytemuck::cast_slice(&self.scratch_raw));

        self.rain_vertices = 0;
        if let Some(rain) = scene.rain().filter(|_| scene.rain_opacity() > 0.0) {
            let segments = rain.segments();
            self.rain_buffer
                .write(device, queue, bytemuck::cast_slice(segments));
            self.rain_vertices = segments.len() as u32;
            self.rain_uniform.write(
                queue,
                &EffectUniform::new(
                    globe_matrix * Mat4::from_translation(rain.origin()),
                    srgb_hex(RAIN_COLOR),
                    scene.rain_opacity(),
                    1.0,
                    false,
                ),
            );
        }

        self.snow_count = 0;
        if let Some(snow) = scene.snow().filter(|_| scene.snow_opacity() > 0.0) {
            let sprites = snow_sprites(snow.positions());
            self.snow_buffer
                .write(device, queue, bytemuck::cast_slice(&sprites));
            self.snow_count = sprites.len() as u32;
            self.snow_uniform.write(
                queue,
                &EffectUniform::new(
                    globe_matrix,
                    Vec3::ONE,
                    scene.snow_opacity(),
                    snow.settings().size,
                    true,
                ),
            );
        }

        // The catalog never changes, so only a new visible count needs an upload.
        let stars = scene.stars();
        let visible = stars.visible();
        if visible.len() as u32 != self.star_count {
            self.star_buffer
                .write(device, queue, bytemuck::cast_slice(&star_sprites(visible)));
            self.star_count = visible.len() as u32;
        }
        let config = stars.config();
        self.star_uniform.write(
            queue,
            &EffectUniform::new(
                Mat4::IDENTITY,
                Vec3::ONE,
                1.0,
                config.factor * STAR_SIZE_SCALE,
                config.fade,
            ),
        );

        let flash = scene.flash_overlay_opacity();
        self.overlay_visible = flash > 0.0;
        if self.overlay_visible {
            self.overlay_uniform
                .write(queue, &srgb_hex(OVERLAY_COLOR).extend(flash).to_array());
        }
    }

    /// Record the scene into `pass`. Call after [`prepare`](Self::prepare).
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, scene: &SceneState<GlobeTexture>) {
        pass.set_bind_group(0, &self.frame.bind_group, &[]);

        if self.star_count > 0 {
            pass.set_pipeline(&self.effects.sprites);
            pass.set_bind_group(1, &self.star_uniform.bind_group, &[]);
            pass.set_vertex_buffer(0, self.star_buffer.slice());
            pass.draw(0..6, 0..self.star_count);
        }

        let earth = scene
            .globe()
            .texture()
            .unwrap_or(&self.fallback_texture);
        pass.set_pipeline(&self.globe_pipeline.pipeline);
        pass.set_bind_group(1, &earth.bind_group, &[]);
        pass.set_bind_group(2, &self.globe_uniform.bind_group, &[]);
        self.sphere.bind(pass);
        pass.draw_indexed(0..self.sphere.index_count, 0, 0..1);

        pass.set_vertex_buffer(1, self.instance_buffer.slice());
        pass.set_pipeline(&self.instanced.inside);
        self.sphere.bind(pass);
        pass.draw_indexed(0..self.sphere.index_count, 0, 0..1);

        if !self.batches.is_empty() {
            pass.set_pipeline(&self.instanced.two_sided);
            for batch in &self.batches {
                let mesh = match batch.mesh {
                    MeshKind::Sphere => &self.sphere,
                    MeshKind::Cone => &self.cone,
                    MeshKind::Ring => &self.ring,
                };
                mesh.bind(pass);
                pass.draw_indexed(0..mesh.index_count, 0, batch.instances.clone());
            }
        }

        if self.rain_vertices > 0 {
            pass.set_pipeline(&self.effects.rain);
            pass.set_bind_group(1, &self.rain_uniform.bind_group, &[]);
            pass.set_vertex_buffer(0, self.rain_buffer.slice());
            pass.draw(0..self.rain_vertices, 0..1);
        }

        if self.snow_count > 0 {
            pass.set_pipeline(&self.effects.sprites);
            pass.set_bind_group(1, &self.snow_uniform.bind_group, &[]);
            pass.set_vertex_buffer(0, self.snow_buffer.slice());
            pass.draw(0..6, 0..self.snow_count);
        }

        if self.overlay_visible {
            pass.set_pipeline(&self.overlay.pipeline);
            pass.set_bind_group(0, &self.overlay_uniform.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::SPACE_BLACK;
    use crate::test_support::create_test_device;
    use atmos_scene::{SceneInputs, SceneSettings, WeatherCondition};

    fn instance(mesh: MeshKind, opacity: f32) -> MeshInstance {
        MeshInstance {
            mesh,
            model: Mat4::IDENTITY,
            color: Vec3::ONE,
            opacity,
            emissive: 0.0,
        }
    }

    #[test]
    fn test_batches_group_by_mesh_after_existing_slots() {
        let mut instances = vec![
            instance(MeshKind::Ring, 0.1),
            instance(MeshKind::Sphere, 0.2),
            instance(MeshKind::Ring, 0.3),
            instance(MeshKind::Cone, 0.4),
            instance(MeshKind::Sphere, 0.5),
        ];
        let mut raw = vec![InstanceRaw::new(Mat4::IDENTITY, Vec3::ZERO, 1.0, 1.0)];
        let mut batches = Vec::new();
        batch_instances(&mut instances, &mut raw, &mut batches);

        assert_eq!(raw.len(), 6);
        assert_eq!(
            batches,
            vec![
                MeshBatch { mesh: MeshKind::Sphere, instances: 1..3 },
                MeshBatch { mesh: MeshKind::Cone, instances: 3..4 },
                MeshBatch { mesh: MeshKind::Ring, instances: 4..6 },
            ]
        );
        assert_eq!(raw[1].color[3], 0.2, "order within a mesh is kept");
        assert_eq!(raw[2].color[3], 0.5);
    }

    #[test]
    fn test_batching_nothing_adds_nothing() {
        let mut raw = Vec::new();
        let mut batches = Vec::new();
        batch_instances(&mut [], &mut raw, &mut batches);
        assert!(raw.is_empty() && batches.is_empty());
    }

    #[test]
    fn test_sprite_packing() {
        let stars = [Star {
            position: Vec3::new(1.0, 2.0, 3.0),
            size: 0.75,
        }];
        assert_eq!(star_sprites(&stars), vec![[1.0, 2.0, 3.0, 0.75]]);
        assert_eq!(snow_sprites(&[[4.0, 5.0, 6.0]]), vec![[4.0, 5.0, 6.0, 1.0]]);
    }

    #[test]
    fn test_dynamic_buffer_grows_to_power_of_two() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut buffer = DynamicBuffer::new(&device, "test-buffer");
        assert_eq!(buffer.capacity(), 256);
        buffer.write(&device, &queue, &[0u8; 1000]);
        assert_eq!(buffer.capacity(), 1024);
        buffer.write(&device, &queue, &[0u8; 16]);
        assert_eq!(buffer.capacity(), 1024, "never shrinks");
    }

    #[test]
    fn test_stormy_scene_renders_offscreen() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let mut allocator = GpuTextureAllocator::new(&device, &queue);
        let mut renderer = match GlobeRenderer::new(&device, &mut allocator, format, 64, 64, 32) {
            Ok(r) => r,
            Err(e) => panic!("renderer creation failed: {e}"),
        };

        let mut scene: SceneState<GlobeTexture> = SceneState::new(SceneSettings::default());
        scene.set_inputs(SceneInputs {
            focus: Some(atmos_geo::GeoPoint::new(51.5, -0.1)),
            weather: Some(WeatherCondition::Thunderstorm),
            ..SceneInputs::default()
        });
        for _ in 0..120 {
            scene.update(1.0 / 60.0, 0);
        }
        renderer.prepare(&device, &queue, &scene);
        assert!(renderer.rain_vertices > 0, "thunderstorm rain should be drawn");
        assert!(renderer.star_count > 0);
        assert!(!renderer.batches.is_empty(), "marker and clouds should be drawn");

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen"),
            size: wgpu::Extent3d {
                width: 64,
                height: 64,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("offscreen-encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("offscreen-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SPACE_BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &renderer.depth().view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            renderer.draw(&mut pass, &scene);
        }
        queue.submit(std::iter::once(encoder.finish()));

        scene.unmount(&mut allocator);
        renderer.destroy(&mut allocator);
        assert_eq!(allocator.live_textures(), 0);
    }
}
