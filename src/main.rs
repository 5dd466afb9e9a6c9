//! Scene viewer: loads the configured models and flies a camera through them.
//!
//! Usage: `scene-viewer [config.json]`
//!
//! Controls: WASD move, Q/E raise and lower the eye height, mouse looks,
//! wheel zooms, Tab toggles the cursor lock, Escape releases it.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;

use scene_viewer::engine::app::{ self, ExitStatus };
use scene_viewer::engine::config::ViewerConfig;
use scene_viewer::engine::logging::init_logging;
use scene_viewer::engine::rendering::{ GlowGpu, VertexLayout };
use scene_viewer::engine::systems::build_cube_grid;
use scene_viewer::engine::Scene;

fn main() -> ExitCode {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    let config = match ViewerConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(None);
            log::error!("{}", e);
            return ExitStatus::SetupFailure.into();
        }
    };
    init_logging(Some(&config));

    app::run(config, Box::new(build_scene)).into()
}

fn build_scene(
    gpu: &mut GlowGpu,
    layout: &VertexLayout,
    config: &ViewerConfig
) -> anyhow::Result<Scene<GlowGpu>> {
    let mut scene = Scene::new(config.clear_color);

    for object in &config.objects {
        match scene.load_object(gpu, object, layout) {
            Some(loaded) => log::info!("Loaded {} ({} meshes)", loaded.name(), loaded.mesh_count()),
            None => log::warn!("Skipped {}", object.path.display()),
        }
    }

    if let Some(grid) = &config.grid {
        let objects = build_cube_grid(gpu, grid, layout, scene.textures_mut()).context(
            "failed to build cube grid"
        )?;
        for object in objects {
            scene.add(object);
        }
    }

    Ok(scene)
}
