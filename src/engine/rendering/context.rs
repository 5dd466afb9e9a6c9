use cgmath::Matrix4;

use crate::engine::rendering::gpu::{ Gpu, UniformValue, Viewport };
use crate::engine::rendering::shader::ShaderProgram;

/// Frame-scoped access to the GPU.
///
/// Binding a shader borrows the context mutably, so at most one program can be
/// active at a time and everything that draws has to go through the returned
/// `ActiveShader`.
pub struct RenderContext<'g, G: Gpu> {
    gpu: &'g mut G,
}

impl<'g, G: Gpu> RenderContext<'g, G> {
    pub fn new(gpu: &'g mut G) -> Self {
        Self { gpu }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.gpu.set_viewport(viewport);
    }

    pub fn clear(&mut self, color: [f32; 4]) {
        self.gpu.clear(color);
    }

    pub fn bind<'a>(&'a mut self, shader: &'a mut ShaderProgram<G>) -> ActiveShader<'a, G> {
        self.gpu.use_program(Some(shader.program()));
        ActiveShader {
            gpu: &mut *self.gpu,
            shader,
        }
    }
}

/// The currently bound program together with the GPU it is bound on.
pub struct ActiveShader<'a, G: Gpu> {
    gpu: &'a mut G,
    shader: &'a mut ShaderProgram<G>,
}

impl<'a, G: Gpu> ActiveShader<'a, G> {
    /// Pushes `value` into the named uniform. A name that does not resolve is
    /// skipped; the draw carries on.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if let Some(location) = self.shader.uniform_location(&*self.gpu, name) {
            self.gpu.set_uniform(&location, value);
        }
    }

    pub fn set_i32(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    pub fn set_f32(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    pub fn set_vec3(&mut self, name: &str, value: [f32; 3]) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    pub fn set_vec4(&mut self, name: &str, value: [f32; 4]) {
        self.set_uniform(name, UniformValue::Vec4(value));
    }

    pub fn set_mat4(&mut self, name: &str, value: &Matrix4<f32>) {
        self.set_uniform(name, UniformValue::Mat4(*value));
    }

    pub fn gpu(&mut self) -> &mut G {
        &mut *self.gpu
    }

    pub fn shader(&self) -> &ShaderProgram<G> {
        &*self.shader
    }

    pub fn unbind(self) {
        self.gpu.use_program(None);
    }
}
