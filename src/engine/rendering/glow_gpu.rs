use std::mem::{ offset_of, size_of };

use glow::HasContext;

use crate::engine::components::mesh::Vertex;
use crate::engine::error::{ GpuError, ShaderError };
use crate::engine::rendering::gpu::{
    Gpu,
    MeshBuffers,
    TextureImage,
    UniformValue,
    VertexLayout,
    Viewport,
};
use crate::engine::rendering::shader::ShaderSource;

/// The OpenGL backend. All calls go to the context that was current when
/// the `glow::Context` was loaded.
pub struct GlowGpu {
    gl: glow::Context,
}

impl GlowGpu {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn compile_shader(
        &self,
        shader_type: u32,
        stage: &'static str,
        source: &str
    ) -> Result<glow::Shader, ShaderError> {
        unsafe {
            let shader = self.gl.create_shader(shader_type).map_err(ShaderError::Create)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(ShaderError::Compile { stage, log });
            }
            Ok(shader)
        }
    }
}

fn allocation(what: &'static str) -> impl FnOnce(String) -> GpuError {
    move |message| GpuError::Allocation { what, message }
}

impl Gpu for GlowGpu {
    type Program = glow::Program;
    type Texture = glow::Texture;
    type VertexArray = glow::VertexArray;
    type Buffer = glow::Buffer;
    type UniformLocation = glow::UniformLocation;

    fn create_program(&mut self, source: &ShaderSource) -> Result<glow::Program, ShaderError> {
        let vs = self.compile_shader(glow::VERTEX_SHADER, "vertex", &source.vertex)?;
        let fs = match self.compile_shader(glow::FRAGMENT_SHADER, "fragment", &source.fragment) {
            Ok(fs) => fs,
            Err(e) => {
                unsafe {
                    self.gl.delete_shader(vs);
                }
                return Err(e);
            }
        };

        unsafe {
            let program = self.gl.create_program().map_err(ShaderError::Create)?;
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);

            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);
            self.gl.delete_shader(vs);
            self.gl.delete_shader(fs);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(ShaderError::Link(log));
            }
            Ok(program)
        }
    }

    fn delete_program(&mut self, program: glow::Program) {
        unsafe {
            self.gl.delete_program(program);
        }
    }

    fn use_program(&mut self, program: Option<glow::Program>) {
        unsafe {
            self.gl.use_program(program);
        }
    }

    fn uniform_location(&self, program: glow::Program, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn attrib_location(&self, program: glow::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn set_uniform(&mut self, location: &glow::UniformLocation, value: UniformValue) {
        let location = Some(location);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::Mat4(matrix) => {
                    let columns: &[f32; 16] = matrix.as_ref();
                    self.gl.uniform_matrix_4_f32_slice(location, false, columns);
                }
            }
        }
    }

    fn upload_mesh(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
        layout: &VertexLayout
    ) -> Result<MeshBuffers<Self>, GpuError> {
        let gl = &self.gl;
        unsafe {
            let vao = gl.create_vertex_array().map_err(allocation("vertex array"))?;
            let vbo = gl.create_buffer().map_err(allocation("vertex buffer"))?;
            let ebo = gl.create_buffer().map_err(allocation("index buffer"))?;

            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STATIC_DRAW
            );

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW
            );

            let stride = size_of::<Vertex>() as i32;
            let setup_attrib = |loc: u32, size: i32, offset: usize| {
                gl.enable_vertex_attrib_array(loc);
                gl.vertex_attrib_pointer_f32(loc, size, glow::FLOAT, false, stride, offset as i32);
            };
            setup_attrib(layout.position, 3, offset_of!(Vertex, position));
            setup_attrib(layout.normal, 3, offset_of!(Vertex, normal));
            setup_attrib(layout.tex_coord, 2, offset_of!(Vertex, tex_coords));

            gl.bind_vertex_array(None);

            Ok(MeshBuffers { vao, vbo, ebo })
        }
    }

    fn delete_mesh(&mut self, buffers: &MeshBuffers<Self>) {
        unsafe {
            self.gl.delete_vertex_array(buffers.vao);
            self.gl.delete_buffer(buffers.vbo);
            self.gl.delete_buffer(buffers.ebo);
        }
    }

    fn upload_texture(&mut self, image: &TextureImage) -> Result<glow::Texture, GpuError> {
        let format = match image.channels {
            1 => glow::RED,
            3 => glow::RGB,
            4 => glow::RGBA,
            other => {
                return Err(GpuError::UnsupportedChannels(other));
            }
        };

        let gl = &self.gl;
        unsafe {
            let texture = gl.create_texture().map_err(allocation("texture"))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));

            // Rows of 1 and 3 channel images are not 4-byte aligned.
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                image.width as i32,
                image.height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(&image.pixels))
            );
            gl.generate_mipmap(glow::TEXTURE_2D);

            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);

            gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(texture)
        }
    }

    fn delete_texture(&mut self, texture: glow::Texture) {
        unsafe {
            self.gl.delete_texture(texture);
        }
    }

    fn active_texture_unit(&mut self, unit: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
        }
    }

    fn bind_texture(&mut self, texture: Option<glow::Texture>) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, texture);
        }
    }

    fn bind_vertex_array(&mut self, vao: Option<glow::VertexArray>) {
        unsafe {
            self.gl.bind_vertex_array(vao);
        }
    }

    fn draw_triangles(&mut self, index_count: usize) {
        unsafe {
            self.gl.draw_elements(glow::TRIANGLES, index_count as i32, glow::UNSIGNED_INT, 0);
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe {
            self.gl.viewport(0, 0, viewport.width as i32, viewport.height as i32);
        }
    }

    fn enable_depth_test(&mut self) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.depth_func(glow::LESS);
        }
    }

    fn clear(&mut self, [r, g, b, a]: [f32; 4]) {
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }
}
