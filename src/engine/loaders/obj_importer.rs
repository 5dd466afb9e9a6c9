use std::path::Path;

use crate::engine::components::texture::TextureKind;
use crate::engine::error::ModelError;
use crate::engine::loaders::importer::{
    flip_v,
    generate_smooth_normals,
    ImportedMaterial,
    ImportedMesh,
    ImportedNode,
    ImportedScene,
    ModelImporter,
};

/// Wavefront OBJ through `tobj`. Faces are triangulated and attributes
/// re-indexed to a single index stream. Every OBJ object or group becomes a
/// child node of the root.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjImporter;

impl ModelImporter for ObjImporter {
    fn import(&self, path: &Path, flip_uvs: bool) -> Result<ImportedScene, ModelError> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, materials) = tobj::load_obj(path, &options).map_err(|e| ModelError::Import {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let materials = materials.unwrap_or_else(|e| {
            log::warn!("No materials for {}: {}", path.display(), e);
            Vec::new()
        });

        let mut scene = ImportedScene::with_root(
            path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        scene.materials = materials.iter().map(convert_material).collect();

        for (index, model) in models.into_iter().enumerate() {
            let mesh = convert_mesh(model.name.clone(), model.mesh, flip_uvs);
            scene.meshes.push(mesh);
            scene.add_child(ImportedScene::ROOT, ImportedNode::new(model.name, vec![index]));
        }

        log::info!(
            "Imported {}: {} meshes, {} materials",
            path.display(),
            scene.meshes.len(),
            scene.materials.len()
        );
        Ok(scene)
    }
}

fn convert_mesh(name: String, mesh: tobj::Mesh, flip_uvs: bool) -> ImportedMesh {
    let positions: Vec<[f32; 3]> = mesh.positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    } else {
        generate_smooth_normals(&positions, &mesh.indices)
    };

    let tex_coords = if !mesh.texcoords.is_empty() && mesh.texcoords.len() / 2 == positions.len() {
        let mut uvs: Vec<[f32; 2]> = mesh.texcoords
            .chunks_exact(2)
            .map(|t| [t[0], t[1]])
            .collect();
        if flip_uvs {
            flip_v(&mut uvs);
        }
        Some(uvs)
    } else {
        None
    };

    ImportedMesh {
        name,
        positions,
        normals,
        tex_coords,
        indices: mesh.indices,
        material: mesh.material_id,
    }
}

fn convert_material(material: &tobj::Material) -> ImportedMaterial {
    let mut textures = Vec::new();
    let mut push = |kind, path: Option<&String>| {
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            textures.push((kind, path.clone()));
        }
    };

    push(TextureKind::Diffuse, material.diffuse_texture.as_ref());
    push(TextureKind::Specular, material.specular_texture.as_ref());
    push(TextureKind::Normal, material.normal_texture.as_ref());
    push(
        TextureKind::Height,
        material.unknown_param.get("map_disp").or_else(|| material.unknown_param.get("disp"))
    );

    ImportedMaterial {
        name: material.name.clone(),
        textures,
    }
}
