use super::camera::Camera;
use super::context::GpuContext;
use super::mesh::{GpuMesh, GpuMeshArena};
use super::pipeline::{Lighting, RenderPipelines, Uniforms};
use crate::geometry::Slots;
use glam::Mat4;

const MAX_INSTANCES: usize = 64;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 1.0,
    b: 1.0,
    a: 1.0,
};

pub struct ChartRenderer {
    pipelines: RenderPipelines,
    meshes: Slots<GpuMesh>,
    colors: Vec<[f32; 4]>,
    pub lighting: Lighting,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    uniform_alignment: u32,
}

impl ChartRenderer {
    /// `colors` holds one linear RGBA color per section slot.
    pub fn new(context: &GpuContext, colors: Vec<[f32; 4]>) -> Self {
        let pipelines = RenderPipelines::new(context);

        let uniform_alignment = context.device.limits().min_uniform_buffer_offset_alignment;
        let aligned_size = Self::align_to(std::mem::size_of::<Uniforms>() as u32, uniform_alignment);
        let buffer_size = (aligned_size as usize * MAX_INSTANCES) as u64;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dynamic Uniform Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = pipelines.create_dynamic_bind_group(&context.device, &uniform_buffer);

        if colors.len() > MAX_INSTANCES {
            log::warn!("only the first {MAX_INSTANCES} of {} sections will be drawn", colors.len());
        }

        Self {
            pipelines,
            meshes: Slots::new(),
            colors,
            lighting: Lighting::default(),
            uniform_buffer,
            bind_group,
            uniform_alignment,
        }
    }

    fn align_to(size: u32, alignment: u32) -> u32 {
        (size + alignment - 1) & !(alignment - 1)
    }

    fn aligned_uniform_size(&self) -> u32 {
        Self::align_to(std::mem::size_of::<Uniforms>() as u32, self.uniform_alignment)
    }

    pub fn mesh_target<'a>(&'a mut self, device: &'a wgpu::Device) -> GpuMeshArena<'a> {
        GpuMeshArena::new(device, &mut self.meshes)
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.live()
    }

    pub fn clear(&mut self) {
        for mesh in self.meshes.drain() {
            mesh.destroy();
        }
    }

    pub fn render(&self, context: &GpuContext, view: &wgpu::TextureView, camera: &Camera, model: Mat4) {
        let view_proj = camera.view_projection();
        let aligned_size = self.aligned_uniform_size() as usize;

        let mut uniform_data = vec![0u8; aligned_size * MAX_INSTANCES];

        struct DrawCall<'m> {
            mesh: &'m GpuMesh,
            offset: u32,
        }
        let mut draw_calls: Vec<DrawCall> = Vec::new();

        for (instance_idx, (slot, mesh)) in self.meshes.iter().enumerate() {
            if instance_idx >= MAX_INSTANCES {
                break;
            }

            let color = self.colors.get(slot).copied().unwrap_or([0.5, 0.5, 0.5, 1.0]);
            let mut uniforms = Uniforms {
                view_proj: view_proj.to_cols_array_2d(),
                model: model.to_cols_array_2d(),
                color,
                ambient: [0.0; 4],
                light_dir: [0.0; 4],
                point_light: [0.0; 4],
            };
            self.lighting.apply(&mut uniforms);

            let offset = instance_idx * aligned_size;
            let bytes = bytemuck::bytes_of(&uniforms);
            uniform_data[offset..offset + bytes.len()].copy_from_slice(bytes);

            draw_calls.push(DrawCall {
                mesh,
                offset: offset as u32,
            });
        }

        context.queue.write_buffer(&self.uniform_buffer, 0, &uniform_data);

        let mut encoder = context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Chart Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Chart Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &context.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipelines.pipeline);

            for call in &draw_calls {
                render_pass.set_bind_group(0, &self.bind_group, &[call.offset]);
                render_pass.set_vertex_buffer(0, call.mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(call.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..call.mesh.index_count, 0, 0..1);
            }
        }

        context.queue.submit(std::iter::once(encoder.finish()));
    }
}
