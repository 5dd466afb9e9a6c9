use std::rc::Rc;

use crate::engine::components::texture::{ MeshTexture, TextureKind };
use crate::engine::error::MeshError;
use crate::engine::rendering::{ ActiveShader, Gpu, MeshBuffers, VertexLayout };

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self { position, normal, tex_coords }
    }
}

struct Geometry<G: Gpu> {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    buffers: MeshBuffers<G>,
}

/// One indexed triangle list plus the textures sampled while drawing it.
///
/// Geometry is fixed at construction. Cloning a mesh shares the geometry and
/// the GPU buffers; they are released by the last `destroy`.
pub struct Mesh<G: Gpu> {
    geometry: Rc<Geometry<G>>,
    textures: Vec<MeshTexture<G>>,
}

impl<G: Gpu> Clone for Mesh<G> {
    fn clone(&self) -> Self {
        Self {
            geometry: Rc::clone(&self.geometry),
            textures: self.textures.clone(),
        }
    }
}

impl<G: Gpu> Mesh<G> {
    pub fn new(
        gpu: &mut G,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<MeshTexture<G>>,
        layout: &VertexLayout
    ) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::IncompleteTriangle(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| (i as usize) >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }

        let buffers = gpu.upload_mesh(&vertices, &indices, layout)?;

        Ok(Self {
            geometry: Rc::new(Geometry { vertices, indices, buffers }),
            textures,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.geometry.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.geometry.indices
    }

    pub fn textures(&self) -> &[MeshTexture<G>] {
        &self.textures
    }

    pub fn triangle_count(&self) -> usize {
        self.geometry.indices.len() / 3
    }

    pub fn vertex_array(&self) -> G::VertexArray {
        self.geometry.buffers.vao
    }

    /// Binds texture i to unit i under the sampler name `<prefix><ordinal>`,
    /// ordinals counting from 1 per texture kind, then issues one draw.
    ///
    /// Leaves unit 0 active and no vertex array bound.
    pub fn draw(&self, shader: &mut ActiveShader<'_, G>) {
        let mut ordinals = [0u32; TextureKind::COUNT];

        for (unit, texture) in self.textures.iter().enumerate() {
            let unit = unit as u32;
            shader.gpu().active_texture_unit(unit);

            let kind = texture.kind();
            ordinals[kind.index()] += 1;
            let sampler = format!("{}{}", kind.uniform_prefix(), ordinals[kind.index()]);
            shader.set_i32(&sampler, unit as i32);

            shader.gpu().bind_texture(texture.handle());
        }

        let gpu = shader.gpu();
        gpu.bind_vertex_array(Some(self.geometry.buffers.vao));
        gpu.draw_triangles(self.geometry.indices.len());
        gpu.bind_vertex_array(None);

        gpu.active_texture_unit(0);
    }

    /// Releases the GPU buffers unless another mesh still shares them.
    pub fn destroy(self, gpu: &mut G) {
        if let Ok(geometry) = Rc::try_unwrap(self.geometry) {
            gpu.delete_mesh(&geometry.buffers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::texture::Texture;
    use crate::engine::rendering::headless::{ GpuCall, HeadlessGpu };
    use crate::engine::rendering::{ RenderContext, ShaderProgram, ShaderSource, UniformValue };

    fn triangle() -> (Vec<Vertex>, Vec<u32>) {
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0])
        ];
        (vertices, vec![0, 1, 2])
    }

    fn shader(gpu: &mut HeadlessGpu) -> ShaderProgram<HeadlessGpu> {
        let source = ShaderSource {
            vertex: "void main() {}".into(),
            fragment: "void main() {}".into(),
        };
        ShaderProgram::from_source(gpu, &source, "test").unwrap()
    }

    fn layout() -> VertexLayout {
        VertexLayout { position: 0, normal: 1, tex_coord: 2 }
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 8 * std::mem::size_of::<f32>());
    }

    #[test]
    fn rejects_partial_triangles() {
        let mut gpu = HeadlessGpu::new();
        let (vertices, _) = triangle();
        let err = Mesh::new(&mut gpu, vertices, vec![0, 1], Vec::new(), &layout()).err().unwrap();
        assert!(matches!(err, MeshError::IncompleteTriangle(2)));
        assert_eq!(gpu.mesh_uploads(), 0);
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let mut gpu = HeadlessGpu::new();
        let (vertices, _) = triangle();
        let err = Mesh::new(&mut gpu, vertices, vec![0, 1, 3], Vec::new(), &layout()).err().unwrap();
        assert!(matches!(err, MeshError::IndexOutOfRange { index: 3, vertex_count: 3 }));
    }

    #[test]
    fn draw_binds_textures_to_sequential_units() {
        let mut gpu = HeadlessGpu::new();
        let mut shader = shader(&mut gpu);
        let (vertices, indices) = triangle();
        let textures = vec![
            MeshTexture::new(TextureKind::Diffuse, Rc::new(Texture::new(Some(100), "a.png"))),
            MeshTexture::new(TextureKind::Specular, Rc::new(Texture::new(Some(101), "b.png"))),
            MeshTexture::new(TextureKind::Diffuse, Rc::new(Texture::new(Some(102), "c.png")))
        ];
        let mesh = Mesh::new(&mut gpu, vertices, indices, textures, &layout()).unwrap();
        gpu.clear_calls();

        let mut ctx = RenderContext::new(&mut gpu);
        let mut active = ctx.bind(&mut shader);
        mesh.draw(&mut active);
        active.unbind();

        let vao = mesh.vertex_array();
        let expected = vec![
            GpuCall::UseProgram(Some(1)),
            GpuCall::ActiveTexture(0),
            GpuCall::SetUniform { name: "texture_diffuse1".into(), value: UniformValue::Int(0) },
            GpuCall::BindTexture(Some(100)),
            GpuCall::ActiveTexture(1),
            GpuCall::SetUniform { name: "texture_specular1".into(), value: UniformValue::Int(1) },
            GpuCall::BindTexture(Some(101)),
            GpuCall::ActiveTexture(2),
            GpuCall::SetUniform { name: "texture_diffuse2".into(), value: UniformValue::Int(2) },
            GpuCall::BindTexture(Some(102)),
            GpuCall::BindVertexArray(Some(vao)),
            GpuCall::DrawTriangles(3),
            GpuCall::BindVertexArray(None),
            GpuCall::ActiveTexture(0),
            GpuCall::UseProgram(None)
        ];
        assert_eq!(gpu.calls(), expected.as_slice());
    }

    #[test]
    fn unloaded_texture_binds_zero_handle() {
        let mut gpu = HeadlessGpu::new();
        let mut shader = shader(&mut gpu);
        let (vertices, indices) = triangle();
        let textures = vec![MeshTexture::new(TextureKind::Diffuse, Rc::new(Texture::new(None, "missing.png")))];
        let mesh = Mesh::new(&mut gpu, vertices, indices, textures, &layout()).unwrap();

        let mut ctx = RenderContext::new(&mut gpu);
        let mut active = ctx.bind(&mut shader);
        mesh.draw(&mut active);

        assert!(gpu.calls().contains(&GpuCall::BindTexture(None)));
        assert_eq!(gpu.draw_calls(), 1);
    }

    #[test]
    fn shared_geometry_is_released_by_last_owner() {
        let mut gpu = HeadlessGpu::new();
        let (vertices, indices) = triangle();
        let mesh = Mesh::new(&mut gpu, vertices, indices, Vec::new(), &layout()).unwrap();
        let copy = mesh.clone();

        mesh.destroy(&mut gpu);
        assert_eq!(gpu.live_meshes(), 1);
        copy.destroy(&mut gpu);
        assert_eq!(gpu.live_meshes(), 0);
    }
}
