//! Render pipelines for the globe scene and the per-frame bindings they share.

use std::num::NonZeroU64;

use atmos_lighting::LightingUniform;
use wgpu::util::DeviceExt;

use crate::depth::DepthBuffer;
use crate::mesh::MeshVertex;
use crate::shaders::{
    EFFECTS_SHADER, GLOBE_SHADER, INSTANCED_SHADER, OVERLAY_SHADER, create_module, scene_shader,
};
use crate::uniforms::{CameraUniform, EffectUniform, GlobeUniform, InstanceRaw};

/// How a blended draw combines with what is already on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    Opaque,
    Alpha,
    Additive,
}

impl Blend {
    pub fn state(self) -> Option<wgpu::BlendState> {
        match self {
            Blend::Opaque => None,
            Blend::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            Blend::Additive => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            }),
        }
    }
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

/// A uniform buffer with its own single-entry bind group.
pub struct UniformBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    pub fn new<T: bytemuck::Pod>(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        initial: &T,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    pub fn write<T: bytemuck::Pod>(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }
}

/// `@group(0)`: camera and lighting, rewritten once per frame.
pub struct FrameBindings {
    pub layout: wgpu::BindGroupLayout,
    pub camera_buffer: wgpu::Buffer,
    pub lighting_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl FrameBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bgl"),
            entries: &[
                uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX_FRAGMENT,
                    std::mem::size_of::<CameraUniform>(),
                ),
                uniform_entry(
                    1,
                    wgpu::ShaderStages::FRAGMENT,
                    std::mem::size_of::<LightingUniform>(),
                ),
            ],
        });
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera-uniform"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lighting-uniform"),
            size: std::mem::size_of::<LightingUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bg"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
            ],
        });
        Self {
            layout,
            camera_buffer,
            lighting_buffer,
            bind_group,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, camera: &CameraUniform, lighting: &LightingUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
        queue.write_buffer(&self.lighting_buffer, 0, bytemuck::bytes_of(lighting));
    }
}

struct PipelineParams<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    module: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    depth: wgpu::DepthStencilState,
    blend: Blend,
    format: wgpu::TextureFormat,
}

fn build_pipeline(device: &wgpu::Device, p: PipelineParams<'_>) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(p.label),
        layout: Some(p.layout),
        vertex: wgpu::VertexState {
            module: p.module,
            entry_point: Some(p.vs),
            buffers: p.buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: p.topology,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: p.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(p.depth),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: p.module,
            entry_point: Some(p.fs),
            targets: &[Some(wgpu::ColorTargetState {
                format: p.format,
                blend: p.blend.state(),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

/// Opaque, textured earth sphere.
pub struct GlobePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub globe_layout: wgpu::BindGroupLayout,
}

impl GlobePipeline {
    pub fn new(
        device: &wgpu::Device,
        frame_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> Self {
        let globe_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-uniform-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                std::mem::size_of::<GlobeUniform>(),
            )],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe-pipeline-layout"),
            bind_group_layouts: &[frame_layout, texture_layout, &globe_layout],
            immediate_size: 0,
        });
        let module = create_module(device, "globe-shader", &scene_shader(GLOBE_SHADER));
        let pipeline = build_pipeline(
            device,
            PipelineParams {
                label: "globe-pipeline",
                layout: &layout,
                module: &module,
                vs: "vs_main",
                fs: "fs_main",
                buffers: &[MeshVertex::layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                depth: DepthBuffer::write_state(),
                blend: Blend::Opaque,
                format,
            },
        );
        Self {
            pipeline,
            globe_layout,
        }
    }
}

/// Instanced meshes. The atmosphere shell draws its inside faces only, the
/// marker and cloud parts draw both sides so flat rings stay visible.
pub struct InstancedPipeline {
    pub two_sided: wgpu::RenderPipeline,
    pub inside: wgpu::RenderPipeline,
}

impl InstancedPipeline {
    pub fn new(
        device: &wgpu::Device,
        frame_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("instanced-pipeline-layout"),
            bind_group_layouts: &[frame_layout],
            immediate_size: 0,
        });
        let module = create_module(device, "instanced-shader", &scene_shader(INSTANCED_SHADER));
        let buffers = [MeshVertex::layout(), InstanceRaw::layout()];
        let variant = |label, cull_mode| {
            build_pipeline(
                device,
                PipelineParams {
                    label,
                    layout: &layout,
                    module: &module,
                    vs: "vs_main",
                    fs: "fs_main",
                    buffers: &buffers,
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode,
                    depth: DepthBuffer::test_only_state(),
                    blend: Blend::Alpha,
                    format,
                },
            )
        };
        Self {
            two_sided: variant("instanced-pipeline", None),
            inside: variant("atmosphere-pipeline", Some(wgpu::Face::Front)),
        }
    }
}

/// Rain lines and point sprites.
pub struct EffectPipelines {
    pub effect_layout: wgpu::BindGroupLayout,
    pub rain: wgpu::RenderPipeline,
    pub sprites: wgpu::RenderPipeline,
}

impl EffectPipelines {
    /// Rain vertices: one `[f32; 3]` per line end.
    const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
    /// Sprite instances: xyz centre, w relative size.
    const SPRITE_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
        wgpu::vertex_attr_array![0 => Float32x4];

    pub fn new(
        device: &wgpu::Device,
        frame_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> Self {
        let effect_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("effect-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                std::mem::size_of::<EffectUniform>(),
            )],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("effect-pipeline-layout"),
            bind_group_layouts: &[frame_layout, &effect_layout],
            immediate_size: 0,
        });
        let module = create_module(device, "effects-shader", &scene_shader(EFFECTS_SHADER));

        let rain = build_pipeline(
            device,
            PipelineParams {
                label: "rain-pipeline",
                layout: &layout,
                module: &module,
                vs: "vs_line",
                fs: "fs_line",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &Self::LINE_ATTRIBUTES,
                }],
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                depth: DepthBuffer::test_only_state(),
                blend: Blend::Alpha,
                format,
            },
        );
        let sprites = build_pipeline(
            device,
            PipelineParams {
                label: "sprite-pipeline",
                layout: &layout,
                module: &module,
                vs: "vs_sprite",
                fs: "fs_sprite",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &Self::SPRITE_ATTRIBUTES,
                }],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                depth: DepthBuffer::test_only_state(),
                blend: Blend::Additive,
                format,
            },
        );
        Self {
            effect_layout,
            rain,
            sprites,
        }
    }
}

/// Full-screen flash tint, drawn last and ignoring depth.
pub struct OverlayPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub layout: wgpu::BindGroupLayout,
}

impl OverlayPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::FRAGMENT,
                std::mem::size_of::<[f32; 4]>(),
            )],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay-pipeline-layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });
        let module = create_module(device, "overlay-shader", OVERLAY_SHADER);
        let pipeline = build_pipeline(
            device,
            PipelineParams {
                label: "overlay-pipeline",
                layout: &pipeline_layout,
                module: &module,
                vs: "vs_main",
                fs: "fs_main",
                buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                depth: DepthBuffer::ignore_state(),
                blend: Blend::Alpha,
                format,
            },
        );
        Self { pipeline, layout }
    }
}
