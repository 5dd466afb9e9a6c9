use cgmath::Vector3;

use crate::engine::components::mesh::Mesh;
use crate::engine::components::scene_object::SceneObject;
use crate::engine::components::texture::{ MeshTexture, TextureCache, TextureKind };
use crate::engine::config::GridConfig;
use crate::engine::error::GridError;
use crate::engine::loaders::obj_parser::load_obj_file;
use crate::engine::rendering::{ Gpu, VertexLayout };

/// Instance positions, row by row. Columns are centred on x = 0 and rows
/// recede along -z starting one spacing in front of the origin.
pub fn grid_positions(grid: &GridConfig) -> Vec<Vector3<f32>> {
    let x_offset = ((grid.columns.max(1) - 1) as f32) * grid.spacing * 0.5;

    (0..grid.rows)
        .flat_map(|row| {
            (0..grid.columns).map(move |column| {
                Vector3::new(
                    (column as f32) * grid.spacing - x_offset,
                    0.0,
                    -((row + 1) as f32) * grid.spacing
                )
            })
        })
        .collect()
}

/// Parses the grid model once, uploads it once, and returns one translated
/// instance per grid cell. All instances share the mesh and texture.
pub fn build_cube_grid<G: Gpu>(
    gpu: &mut G,
    grid: &GridConfig,
    layout: &VertexLayout,
    textures: &mut TextureCache<G>
) -> Result<Vec<SceneObject<G>>, GridError> {
    let parsed = load_obj_file(&grid.model)?;

    let mesh_textures = grid.texture
        .iter()
        .map(|path| MeshTexture::new(TextureKind::Diffuse, textures.load(gpu, path)))
        .collect();
    let mesh = Mesh::new(gpu, parsed.vertices, parsed.indices, mesh_textures, layout)?;

    let name = grid.model.display().to_string();
    let prototype = SceneObject::from_meshes(&name, vec![mesh]);

    let objects: Vec<SceneObject<G>> = grid_positions(grid)
        .into_iter()
        .map(|position| {
            let mut object = prototype.instance();
            object.translate(position);
            object
        })
        .collect();

    log::info!("Built {}x{} grid of {}", grid.rows, grid.columns, name);
    Ok(objects)
}
