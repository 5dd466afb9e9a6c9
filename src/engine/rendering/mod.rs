pub mod context;
pub mod glow_gpu;
pub mod gpu;
pub mod headless;
pub mod shader;

pub use context::{ ActiveShader, RenderContext };
pub use glow_gpu::GlowGpu;
pub use gpu::{ Gpu, MeshBuffers, Present, TextureImage, UniformValue, VertexLayout, Viewport };
pub use headless::{ GpuCall, HeadlessGpu, HeadlessSurface };
pub use shader::{ ShaderProgram, ShaderSource };
