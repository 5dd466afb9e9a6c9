//! A `Gpu` backend that records calls instead of issuing them.
//!
//! Handles are sequential integers starting at 1. Every uniform resolves
//! unless it was declared missing, and the three standard vertex attributes
//! resolve to slots 0, 1 and 2. Used by the test-suite and for validating a
//! frame without a display.

use std::cell::Cell;
use std::collections::{ HashMap, HashSet };
use std::convert::Infallible;

use crate::engine::components::mesh::Vertex;
use crate::engine::error::{ GpuError, ShaderError };
use crate::engine::rendering::gpu::{
    Gpu,
    MeshBuffers,
    Present,
    TextureImage,
    UniformValue,
    VertexLayout,
    Viewport,
};
use crate::engine::rendering::shader::{
    ShaderSource,
    NORMAL_ATTRIBUTE,
    POSITION_ATTRIBUTE,
    TEX_COORD_ATTRIBUTE,
};

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateProgram(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    SetUniform {
        name: String,
        value: UniformValue,
    },
    UploadMesh {
        vao: u32,
        vertices: usize,
        indices: usize,
        layout: VertexLayout,
    },
    DeleteMesh(u32),
    UploadTexture {
        texture: u32,
        width: u32,
        height: u32,
        channels: u8,
    },
    DeleteTexture(u32),
    ActiveTexture(u32),
    BindTexture(Option<u32>),
    BindVertexArray(Option<u32>),
    DrawTriangles(usize),
    Viewport(Viewport),
    EnableDepthTest,
    Clear([f32; 4]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessUniform {
    pub program: u32,
    pub name: String,
}

#[derive(Debug)]
pub struct HeadlessGpu {
    calls: Vec<GpuCall>,
    next_handle: u32,
    attributes: HashMap<String, u32>,
    missing_uniforms: HashSet<String>,
    compile_error: Option<String>,
    uniform_lookups: Cell<usize>,
    live_textures: HashSet<u32>,
    live_meshes: HashSet<u32>,
}

impl Default for HeadlessGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessGpu {
    pub fn new() -> Self {
        let attributes = [POSITION_ATTRIBUTE, NORMAL_ATTRIBUTE, TEX_COORD_ATTRIBUTE]
            .iter()
            .enumerate()
            .map(|(slot, name)| (name.to_string(), slot as u32))
            .collect();

        Self {
            calls: Vec::new(),
            next_handle: 1,
            attributes,
            missing_uniforms: HashSet::new(),
            compile_error: None,
            uniform_lookups: Cell::new(0),
            live_textures: HashSet::new(),
            live_meshes: HashSet::new(),
        }
    }

    pub fn with_missing_uniform(mut self, name: &str) -> Self {
        self.missing_uniforms.insert(name.to_string());
        self
    }

    pub fn with_missing_attribute(mut self, name: &str) -> Self {
        self.attributes.remove(name);
        self
    }

    /// Every subsequent `create_program` fails with this compile log.
    pub fn with_compile_error(mut self, log: &str) -> Self {
        self.compile_error = Some(log.to_string());
        self
    }

    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn uniform_lookups(&self) -> usize {
        self.uniform_lookups.get()
    }

    pub fn texture_uploads(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GpuCall::UploadTexture { .. }))
            .count()
    }

    pub fn mesh_uploads(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GpuCall::UploadMesh { .. }))
            .count()
    }

    pub fn draw_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GpuCall::DrawTriangles(_)))
            .count()
    }

    /// Values pushed to the named uniform, in call order.
    pub fn uniform_values(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::SetUniform { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    pub fn live_meshes(&self) -> usize {
        self.live_meshes.len()
    }

    fn allocate(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl Gpu for HeadlessGpu {
    type Program = u32;
    type Texture = u32;
    type VertexArray = u32;
    type Buffer = u32;
    type UniformLocation = HeadlessUniform;

    fn create_program(&mut self, _source: &ShaderSource) -> Result<u32, ShaderError> {
        if let Some(log) = &self.compile_error {
            return Err(ShaderError::Compile {
                stage: "vertex",
                log: log.clone(),
            });
        }
        let program = self.allocate();
        self.calls.push(GpuCall::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&mut self, program: u32) {
        self.calls.push(GpuCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<u32>) {
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<HeadlessUniform> {
        self.uniform_lookups.set(self.uniform_lookups.get() + 1);
        if self.missing_uniforms.contains(name) {
            return None;
        }
        Some(HeadlessUniform {
            program,
            name: name.to_string(),
        })
    }

    fn attrib_location(&self, _program: u32, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    fn set_uniform(&mut self, location: &HeadlessUniform, value: UniformValue) {
        self.calls.push(GpuCall::SetUniform {
            name: location.name.clone(),
            value,
        });
    }

    fn upload_mesh(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
        layout: &VertexLayout
    ) -> Result<MeshBuffers<Self>, GpuError> {
        let vao = self.allocate();
        let vbo = self.allocate();
        let ebo = self.allocate();
        self.live_meshes.insert(vao);
        self.calls.push(GpuCall::UploadMesh {
            vao,
            vertices: vertices.len(),
            indices: indices.len(),
            layout: *layout,
        });
        Ok(MeshBuffers { vao, vbo, ebo })
    }

    fn delete_mesh(&mut self, buffers: &MeshBuffers<Self>) {
        self.live_meshes.remove(&buffers.vao);
        self.calls.push(GpuCall::DeleteMesh(buffers.vao));
    }

    fn upload_texture(&mut self, image: &TextureImage) -> Result<u32, GpuError> {
        if !matches!(image.channels, 1 | 3 | 4) {
            return Err(GpuError::UnsupportedChannels(image.channels));
        }
        let texture = self.allocate();
        self.live_textures.insert(texture);
        self.calls.push(GpuCall::UploadTexture {
            texture,
            width: image.width,
            height: image.height,
            channels: image.channels,
        });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: u32) {
        self.live_textures.remove(&texture);
        self.calls.push(GpuCall::DeleteTexture(texture));
    }

    fn active_texture_unit(&mut self, unit: u32) {
        self.calls.push(GpuCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: Option<u32>) {
        self.calls.push(GpuCall::BindTexture(texture));
    }

    fn bind_vertex_array(&mut self, vao: Option<u32>) {
        self.calls.push(GpuCall::BindVertexArray(vao));
    }

    fn draw_triangles(&mut self, index_count: usize) {
        self.calls.push(GpuCall::DrawTriangles(index_count));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(GpuCall::Viewport(viewport));
    }

    fn enable_depth_test(&mut self) {
        self.calls.push(GpuCall::EnableDepthTest);
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(GpuCall::Clear(color));
    }
}

/// Counts presented frames.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    presented: usize,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl Present for HeadlessSurface {
    type Error = Infallible;

    fn present(&mut self) -> Result<(), Infallible> {
        self.presented += 1;
        Ok(())
    }
}
