use std::ffi::CString;
use std::num::NonZeroU32;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{ anyhow, Context as _ };
use glutin::config::{ ConfigTemplateBuilder, GlConfig };
use glutin::context::{
    ContextApi,
    ContextAttributesBuilder,
    GlProfile,
    PossiblyCurrentContext,
    Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{ Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface };
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ DeviceEvent, DeviceId, WindowEvent };
use winit::event_loop::{ ActiveEventLoop, EventLoop };
use winit::keyboard::PhysicalKey;
use winit::window::{ Window, WindowId };

use crate::engine::components::camera::CameraState;
use crate::engine::components::scene::Scene;
use crate::engine::config::{ ViewerConfig, WindowConfig };
use crate::engine::rendering::{ GlowGpu, Present, ShaderProgram, VertexLayout, Viewport };
use crate::engine::systems::input_system::{ apply_cursor_grab, CursorRequest, InputSystem };
use crate::engine::systems::render_system::RenderSystem;

const REQUIRED_UNIFORMS: [&str; 3] = ["model", "view", "projection"];

/// How the viewer ended. Maps onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// No window, GL context or event loop could be created.
    ContextFailure,
    /// Shader, required uniforms or scene construction failed.
    SetupFailure,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::ContextFailure => 1,
            ExitStatus::SetupFailure => 2,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Builds the scene once the GL context is current.
pub type SceneBuilder = Box<
    dyn FnOnce(&mut GlowGpu, &VertexLayout, &ViewerConfig) -> anyhow::Result<Scene<GlowGpu>>
>;

/// Window surface plus the context it is current on.
pub struct WindowPresenter {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
}

impl WindowPresenter {
    pub fn resize(&self, size: PhysicalSize<u32>) {
        self.surface.resize(&self.context, non_zero(size.width), non_zero(size.height));
    }
}

impl Present for WindowPresenter {
    type Error = glutin::error::Error;

    fn present(&mut self) -> Result<(), glutin::error::Error> {
        self.surface.swap_buffers(&self.context)
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

/// Opens a window with a current OpenGL 3.3 core context, following the
/// glutin-winit bring-up: window, display + config, context, surface.
pub fn create_gl_window(
    event_loop: &ActiveEventLoop,
    config: &WindowConfig
) -> anyhow::Result<(Window, WindowPresenter, glow::Context)> {
    let attributes = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(config.width, config.height));
    let window = event_loop.create_window(attributes).context("failed to create window")?;

    let (_, gl_config) = DisplayBuilder::new()
        .build(event_loop, ConfigTemplateBuilder::new().with_depth_size(24), |configs| {
            configs
                .reduce(|best, next| if next.num_samples() > best.num_samples() { next } else { best })
                .expect("glutin never offers an empty config list")
        })
        .map_err(|e| anyhow!("failed to pick a GL config: {}", e))?;

    let raw_handle = window.window_handle().context("window has no native handle")?.as_raw();
    let display = gl_config.display();
    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
        .with_profile(GlProfile::Core)
        .build(Some(raw_handle));
    let not_current = unsafe {
        display.create_context(&gl_config, &context_attributes).context("failed to create GL context")?
    };

    let size = window.inner_size();
    let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        raw_handle,
        non_zero(size.width),
        non_zero(size.height)
    );
    let surface = unsafe {
        display
            .create_window_surface(&gl_config, &surface_attributes)
            .context("failed to create window surface")?
    };
    let context = not_current.make_current(&surface).context("failed to make GL context current")?;

    if config.vsync {
        if let Err(e) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
            log::warn!("Could not enable vsync: {}", e);
        }
    }

    let gl = unsafe {
        glow::Context::from_loader_function(|symbol| match CString::new(symbol) {
            Ok(symbol) => display.get_proc_address(&symbol) as *const _,
            Err(_) => std::ptr::null(),
        })
    };

    log::info!("Created {}x{} window '{}'", size.width, size.height, config.title);
    Ok((window, WindowPresenter { surface, context }, gl))
}

struct Viewer {
    window: Window,
    surface: WindowPresenter,
    gpu: GlowGpu,
    shader: ShaderProgram<GlowGpu>,
    scene: Scene<GlowGpu>,
}

impl Viewer {
    fn destroy(self) {
        let Viewer { mut gpu, shader, scene, .. } = self;
        scene.destroy(&mut gpu);
        shader.destroy(&mut gpu);
    }
}

struct App {
    config: ViewerConfig,
    builder: Option<SceneBuilder>,
    viewer: Option<Viewer>,
    input: InputSystem,
    camera: CameraState,
    last_frame: Option<Instant>,
    status: ExitStatus,
}

impl App {
    fn new(config: ViewerConfig, builder: SceneBuilder) -> Self {
        let camera = CameraState::from(&config.camera);
        Self {
            config,
            builder: Some(builder),
            viewer: None,
            input: InputSystem::new(),
            camera,
            last_frame: None,
            status: ExitStatus::Success,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, status: ExitStatus, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.status = status;
        event_loop.exit();
    }

    fn setup(&mut self, gpu: &mut GlowGpu) -> anyhow::Result<(ShaderProgram<GlowGpu>, Scene<GlowGpu>)> {
        let mut shader = ShaderProgram::from_file(gpu, &self.config.shader).with_context(||
            format!("failed to build shader {}", self.config.shader.display())
        )?;
        shader.require_uniforms(gpu, &REQUIRED_UNIFORMS)?;
        let layout = shader.vertex_layout(gpu)?;

        let builder = self.builder.take().ok_or_else(|| anyhow!("scene was already built"))?;
        let scene = builder(gpu, &layout, &self.config)?;
        log::info!("Scene ready: {} objects, {} meshes", scene.objects().len(), scene.mesh_count());
        Ok((shader, scene))
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = self.last_frame.map_or(0.0, |last| (now - last).as_secs_f32());
        self.last_frame = Some(now);

        self.camera = self.camera.update(&self.input.take_frame(), dt);

        let size = viewer.window.inner_size();
        let viewport = Viewport::new(size.width, size.height);
        let result = RenderSystem::render_frame(
            &mut viewer.gpu,
            &mut viewer.surface,
            &mut viewer.shader,
            &viewer.scene,
            &self.camera,
            viewport
        );

        if let Err(e) = result {
            self.fail(event_loop, ExitStatus::ContextFailure, anyhow!("failed to present frame: {}", e));
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() || self.builder.is_none() {
            return;
        }

        let (window, surface, gl) = match create_gl_window(event_loop, &self.config.window) {
            Ok(created) => created,
            Err(e) => {
                return self.fail(event_loop, ExitStatus::ContextFailure, e);
            }
        };

        let mut gpu = GlowGpu::new(gl);
        let (shader, scene) = match self.setup(&mut gpu) {
            Ok(ready) => ready,
            Err(e) => {
                return self.fail(event_loop, ExitStatus::SetupFailure, e);
            }
        };

        RenderSystem::init(&mut gpu);
        apply_cursor_grab(&window, self.input.cursor_grabbed());
        window.request_redraw();

        self.viewer = Some(Viewer { window, surface, gpu, shader, scene });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            WindowEvent::Resized(size) => {
                if let Some(viewer) = &self.viewer {
                    viewer.surface.resize(size);
                    viewer.window.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let request = self.input.receive_key(code, event.state);
                    if let (Some(request), Some(viewer)) = (request, &self.viewer) {
                        apply_cursor_grab(&viewer.window, request == CursorRequest::Grab);
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => self.input.receive_scroll(delta),

            WindowEvent::Focused(false) => self.input.focus_lost(),

            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.receive_mouse_motion(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = self.viewer.take() {
            viewer.destroy();
            log::info!("Released GPU resources");
        }
    }
}

/// Runs the viewer until the window is closed.
pub fn run(config: ViewerConfig, builder: SceneBuilder) -> ExitStatus {
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {}", e);
            return ExitStatus::ContextFailure;
        }
    };

    let mut app = App::new(config, builder);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {}", e);
        return ExitStatus::ContextFailure;
    }
    app.status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_failure_kind() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::ContextFailure.code(), 1);
        assert_eq!(ExitStatus::SetupFailure.code(), 2);
    }
}
