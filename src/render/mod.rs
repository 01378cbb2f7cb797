//! WebGPU rendering
//!
//! GPU context, orthographic camera with presentation controls, the lit slice
//! pipeline, and the GPU side of the section mesh store.

pub mod camera;
pub mod context;
pub mod mesh;
pub mod pipeline;
pub mod renderer;

pub use camera::{Camera, PresentationControls, Viewport};
pub use context::{GpuContext, RenderError, RenderResult};
pub use mesh::{GpuMesh, GpuMeshArena};
pub use pipeline::{Lighting, RenderPipelines, Uniforms};
pub use renderer::ChartRenderer;
