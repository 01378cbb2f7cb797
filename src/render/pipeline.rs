use super::context::{GpuContext, DEPTH_FORMAT};
use crate::geometry::Vertex;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::num::NonZeroU64;

const SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
    ambient: vec4<f32>,
    light_dir: vec4<f32>,
    point_light: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

const PI: f32 = 3.14159265;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let world = u.model * vec4<f32>(input.position, 1.0);
    output.clip_position = u.view_proj * world;
    output.world_position = world.xyz;
    output.normal = (u.model * vec4<f32>(input.normal, 0.0)).xyz;
    return output;
}

@fragment
fn fs_main(input: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = normalize(input.normal);
    if (!front) {
        n = -n;
    }

    var irradiance = u.ambient.rgb;
    irradiance += vec3<f32>(max(dot(n, normalize(u.light_dir.xyz)), 0.0) * u.light_dir.w);

    let to_point = u.point_light.xyz - input.world_position;
    let dist_sq = max(dot(to_point, to_point), 0.0001);
    irradiance += vec3<f32>(max(dot(n, normalize(to_point)), 0.0) * u.point_light.w / dist_sq);

    return vec4<f32>(u.color.rgb * irradiance / PI, u.color.a);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub ambient: [f32; 4],
    /// Direction toward the light in `xyz`, intensity in `w`.
    pub light_dir: [f32; 4],
    /// Position in `xyz`, intensity in `w`.
    pub point_light: [f32; 4],
}

/// Scene lights. Intensities follow physically based units, so the shader divides
/// the Lambert term by pi.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub directional: Vec3,
    pub directional_intensity: f32,
    pub point_position: Vec3,
    pub point_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 3.0,
            directional: Vec3::new(1.0, 1.0, 0.0),
            directional_intensity: 1.0,
            point_position: Vec3::new(0.0, 3.0, 0.0),
            point_intensity: 1.0,
        }
    }
}

impl Lighting {
    pub fn apply(&self, uniforms: &mut Uniforms) {
        uniforms.ambient = [self.ambient, self.ambient, self.ambient, 0.0];
        uniforms.light_dir = self.directional.normalize_or_zero().extend(self.directional_intensity).to_array();
        uniforms.point_light = self.point_position.extend(self.point_intensity).to_array();
    }
}

pub struct RenderPipelines {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl RenderPipelines {
    pub fn new(context: &GpuContext) -> Self {
        let device = &context.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Chart Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<Uniforms>() as u64),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Chart Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Chart Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: context.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    pub fn create_dynamic_bind_group(&self, device: &wgpu::Device, buffer: &wgpu::Buffer) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Dynamic Uniform Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<Uniforms>() as u64),
                }),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_shader_layout() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 192);
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
    }

    #[test]
    fn lighting_packs_direction_and_intensity() {
        let mut uniforms = Uniforms::zeroed();
        Lighting::default().apply(&mut uniforms);
        let [x, y, z, w] = uniforms.light_dir;
        assert!((x - y).abs() < 1e-6 && z == 0.0);
        assert!(((x * x + y * y) - 1.0).abs() < 1e-5);
        assert_eq!(w, 1.0);
        assert_eq!(uniforms.point_light, [0.0, 3.0, 0.0, 1.0]);
        assert_eq!(uniforms.ambient[0], 3.0);
    }
}
