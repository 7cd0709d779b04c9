//! WGSL sources for the globe scene.
//!
//! Scene shaders share [`SCENE_COMMON`], which declares the camera and
//! lighting bindings at `@group(0)` and the lighting model. Use
//! [`scene_shader`] to prepend it.

/// Camera and lighting bindings plus the shading function. Mirrors
/// `CameraUniform` and `atmos_lighting::LightingUniform`.
pub const SCENE_COMMON: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    right: vec4<f32>,
    up: vec4<f32>,
};

struct PointLight {
    position_range: vec4<f32>,
    color_intensity: vec4<f32>,
};

struct Lighting {
    ambient: vec4<f32>,
    sun_direction: vec4<f32>,
    sun_color: vec4<f32>,
    counts: vec4<u32>,
    points: array<PointLight, 4>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> lighting: Lighting;

fn shade(world_pos: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {
    let n = normalize(normal);
    var light = lighting.ambient.rgb * lighting.ambient.w;
    let sun = max(dot(n, -lighting.sun_direction.xyz), 0.0);
    light += lighting.sun_color.rgb * lighting.sun_direction.w * sun;

    let count = min(lighting.counts.x, 4u);
    for (var i = 0u; i < count; i = i + 1u) {
        let p = lighting.points[i];
        let to_light = p.position_range.xyz - world_pos;
        let d = length(to_light);
        let falloff = clamp(1.0 - d / max(p.position_range.w, 1e-4), 0.0, 1.0);
        let diffuse = max(dot(n, to_light / max(d, 1e-4)), 0.0);
        light += p.color_intensity.rgb * p.color_intensity.w * diffuse * falloff * falloff;
    }
    return light;
}
"#;

/// Earth sphere: texture (or fallback colour) lit by the scene lights.
pub const GLOBE_SHADER: &str = r#"
@group(1) @binding(0) var earth: texture_2d<f32>;
@group(1) @binding(1) var earth_sampler: sampler;

struct Globe {
    model: mat4x4<f32>,
    fallback: vec4<f32>,
};

@group(2) @binding(0) var<uniform> globe: Globe;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = globe.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (globe.model * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(earth, earth_sampler, in.uv).rgb;
    let base = select(globe.fallback.rgb, texel, globe.fallback.w > 0.5);
    return vec4<f32>(base * shade(in.world_pos, in.normal), 1.0);
}
"#;

/// Marker parts, cloud puffs, and the atmosphere shell.
pub const INSTANCED_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
    @location(8) params: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) emissive: f32,
};

@vertex
fn vs_main(in: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(instance.model_0, instance.model_1, instance.model_2, instance.model_3);
    let world = model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (model * vec4<f32>(in.normal, 0.0)).xyz;
    out.color = instance.color;
    out.emissive = instance.params.x;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let lit = in.color.rgb * shade(in.world_pos, in.normal);
    let rgb = mix(lit, in.color.rgb, clamp(in.emissive, 0.0, 1.0));
    return vec4<f32>(rgb, in.color.a);
}
"#;

/// Rain streaks (line list) and camera-facing sprites for snow and stars.
pub const EFFECTS_SHADER: &str = r#"
struct Effect {
    model: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(1) @binding(0) var<uniform> effect: Effect;

@vertex
fn vs_line(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return camera.view_proj * effect.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_line() -> @location(0) vec4<f32> {
    return effect.color;
}

struct SpriteOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) corner: vec2<f32>,
};

@vertex
fn vs_sprite(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) center_size: vec4<f32>,
) -> SpriteOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vertex_index % 6u];
    let center = (effect.model * vec4<f32>(center_size.xyz, 1.0)).xyz;
    let half_size = 0.5 * center_size.w * effect.params.x;
    let offset = (camera.right.xyz * corner.x + camera.up.xyz * corner.y) * half_size;

    var out: SpriteOutput;
    out.clip_position = camera.view_proj * vec4<f32>(center + offset, 1.0);
    out.corner = corner;
    return out;
}

@fragment
fn fs_sprite(in: SpriteOutput) -> @location(0) vec4<f32> {
    let r = length(in.corner);
    if (r > 1.0) {
        discard;
    }
    let soft = 1.0 - smoothstep(0.0, 1.0, r);
    let hard = 1.0 - smoothstep(0.8, 1.0, r);
    let edge = select(hard, soft, effect.params.y > 0.5);
    return vec4<f32>(effect.color.rgb, effect.color.a * edge);
}
"#;

/// Full-screen tint for the lightning flash.
pub const OVERLAY_SHADER: &str = r#"
@group(0) @binding(0) var<uniform> tint: vec4<f32>;

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> @builtin(position) vec4<f32> {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    return vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return tint;
}
"#;

/// `body` with the shared scene declarations in front.
pub fn scene_shader(body: &str) -> String {
    format!("{SCENE_COMMON}\n{body}")
}

pub fn create_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    log::debug!("Compiling shader '{label}'");
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_shaders_share_bindings() {
        for body in [GLOBE_SHADER, INSTANCED_SHADER, EFFECTS_SHADER] {
            let source = scene_shader(body);
            assert!(source.contains("@group(0) @binding(0) var<uniform> camera"));
            assert!(source.contains("@group(0) @binding(1) var<uniform> lighting"));
            assert_eq!(
                source.matches("struct Camera").count(),
                1,
                "bodies must not redeclare the common structs"
            );
        }
    }

    #[test]
    fn test_overlay_is_standalone() {
        assert!(!OVERLAY_SHADER.contains("camera"));
    }
}
