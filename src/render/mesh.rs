use crate::geometry::{MeshData, MeshHandle, MeshTarget, Slots, Vertex};

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn from_data(device: &wgpu::Device, data: &MeshData) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Slice Vertex Buffer"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Slice Index Buffer"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }

    /// Frees the GPU memory now instead of waiting for the last reference to drop.
    pub fn destroy(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// GPU mesh store: uploads installed meshes and destroys released ones.
pub struct GpuMeshArena<'a> {
    device: &'a wgpu::Device,
    slots: &'a mut Slots<GpuMesh>,
}

impl<'a> GpuMeshArena<'a> {
    pub fn new(device: &'a wgpu::Device, slots: &'a mut Slots<GpuMesh>) -> Self {
        Self { device, slots }
    }
}

impl MeshTarget for GpuMeshArena<'_> {
    fn install(&mut self, slot: usize, mesh: MeshData) -> MeshHandle {
        let gpu = GpuMesh::from_data(self.device, &mesh);
        let (handle, displaced) = self.slots.insert(slot, gpu);
        if let Some(old) = displaced {
            old.destroy();
        }
        handle
    }

    fn release(&mut self, handle: MeshHandle) -> bool {
        match self.slots.remove(handle) {
            Some(mesh) => {
                mesh.destroy();
                true
            }
            None => false,
        }
    }
}
