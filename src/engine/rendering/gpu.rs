use std::fmt::Debug;

use cgmath::Matrix4;

use crate::engine::components::mesh::Vertex;
use crate::engine::error::{ GpuError, ShaderError };
use crate::engine::rendering::shader::ShaderSource;

/// A value that can be pushed into a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4(Matrix4<f32>),
}

/// Attribute slots resolved from the shader the meshes will be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub position: u32,
    pub normal: u32,
    pub tex_coord: u32,
}

/// Decoded pixels ready for upload. `channels` is 1, 3 or 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

/// The VAO/VBO/EBO triple backing one mesh.
pub struct MeshBuffers<G: Gpu> {
    pub vao: G::VertexArray,
    pub vbo: G::Buffer,
    pub ebo: G::Buffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            (self.width as f32) / (self.height as f32)
        }
    }
}

/// Every GPU call the scene layer issues goes through this trait.
///
/// Handles are plain values; the backend owns the actual context. Bound state
/// (current program, active texture unit, bound VAO) is global to the backend,
/// exactly as it is for an OpenGL context.
pub trait Gpu: Sized {
    type Program: Copy + Debug + PartialEq;
    type Texture: Copy + Debug + PartialEq;
    type VertexArray: Copy + Debug + PartialEq;
    type Buffer: Copy + Debug + PartialEq;
    type UniformLocation: Clone + Debug;

    fn create_program(&mut self, source: &ShaderSource) -> Result<Self::Program, ShaderError>;
    fn delete_program(&mut self, program: Self::Program);
    fn use_program(&mut self, program: Option<Self::Program>);

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str
    ) -> Option<Self::UniformLocation>;
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn set_uniform(&mut self, location: &Self::UniformLocation, value: UniformValue);

    fn upload_mesh(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
        layout: &VertexLayout
    ) -> Result<MeshBuffers<Self>, GpuError>;
    fn delete_mesh(&mut self, buffers: &MeshBuffers<Self>);

    fn upload_texture(&mut self, image: &TextureImage) -> Result<Self::Texture, GpuError>;
    fn delete_texture(&mut self, texture: Self::Texture);

    fn active_texture_unit(&mut self, unit: u32);
    fn bind_texture(&mut self, texture: Option<Self::Texture>);
    fn bind_vertex_array(&mut self, vao: Option<Self::VertexArray>);
    fn draw_triangles(&mut self, index_count: usize);

    fn set_viewport(&mut self, viewport: Viewport);
    fn enable_depth_test(&mut self);
    fn clear(&mut self, color: [f32; 4]);
}

/// The display swap at the end of a frame.
pub trait Present {
    type Error: std::error::Error + Send + Sync + 'static;

    fn present(&mut self) -> Result<(), Self::Error>;
}
