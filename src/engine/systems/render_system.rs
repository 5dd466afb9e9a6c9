use crate::engine::components::camera::CameraState;
use crate::engine::components::scene::Scene;
use crate::engine::rendering::{ Gpu, Present, RenderContext, ShaderProgram, Viewport };

/// What one call to `render_frame` drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub objects: usize,
    pub meshes: usize,
}

#[derive(Debug)]
pub struct RenderSystem;

impl RenderSystem {
    /// One-time pipeline state: depth testing with `LESS`.
    pub fn init<G: Gpu>(gpu: &mut G) {
        gpu.enable_depth_test();
    }

    /// Clears, draws every object of `scene` in order with `shader`, and
    /// presents. An empty scene still clears and presents.
    pub fn render_frame<G: Gpu, P: Present>(
        gpu: &mut G,
        surface: &mut P,
        shader: &mut ShaderProgram<G>,
        scene: &Scene<G>,
        camera: &CameraState,
        viewport: Viewport
    ) -> Result<FrameStats, P::Error> {
        let mut stats = FrameStats::default();

        {
            let mut ctx = RenderContext::new(gpu);
            ctx.set_viewport(viewport);
            ctx.clear(scene.clear_color());

            let mut active = ctx.bind(shader);
            active.set_mat4("projection", &camera.projection(viewport.aspect_ratio()));
            active.set_mat4("view", &camera.view_matrix());

            for object in scene.objects() {
                object.draw(&mut active);
                stats.objects += 1;
                stats.meshes += object.mesh_count();
            }

            active.unbind();
        }

        surface.present()?;
        Ok(stats)
    }
}
