//! Cube grid demo: one textured cube parsed and uploaded once, drawn as a
//! grid of translated instances.
//!
//! Usage: `cube_grid [config.json]`. Only the `grid`, `window`, `shader`,
//! `camera` and `clear_color` settings are used; the grid defaults apply when
//! the config has none.

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
    let grid = config.grid.clone().unwrap_or_default();
    let mut scene = Scene::new(config.clear_color);

    let objects = build_cube_grid(gpu, &grid, layout, scene.textures_mut()).with_context(||
        format!("failed to build grid from {}", grid.model.display())
    )?;
    for object in objects {
        scene.add(object);
    }

    Ok(scene)
}
