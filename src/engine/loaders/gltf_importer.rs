use std::collections::HashSet;
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

/// glTF 2.0 (`.gltf` / `.glb`). Each triangle primitive becomes one mesh and
/// the node hierarchy of the default scene is kept. Node transforms are not
/// applied. Only textures referenced by URI are picked up.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfImporter;

impl ModelImporter for GltfImporter {
    fn import(&self, path: &Path, flip_uvs: bool) -> Result<ImportedScene, ModelError> {
        let import_error = |message: String| ModelError::Import {
            path: path.to_path_buf(),
            message,
        };

        let gltf::Gltf { document, blob } =
            gltf::Gltf::open(path).map_err(|e| import_error(e.to_string()))?;
        let buffers =
            gltf::import_buffers(&document, path.parent(), blob).map_err(|e| import_error(e.to_string()))?;

        let mut scene = ImportedScene::with_root(
            path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        scene.materials = document.materials().map(convert_material).collect();

        // glTF mesh index -> indices of the primitives it was split into
        let mut primitives_of = Vec::with_capacity(document.meshes().len());
        for mesh in document.meshes() {
            let mut indices = Vec::new();
            for primitive in mesh.primitives() {
                match convert_primitive(&mesh, &primitive, &buffers, flip_uvs) {
                    Some(imported) => {
                        indices.push(scene.meshes.len());
                        scene.meshes.push(imported);
                    }
                    None => {
                        log::warn!(
                            "Skipping primitive {} of mesh '{}' in {}",
                            primitive.index(),
                            mesh.name().unwrap_or_default(),
                            path.display()
                        );
                    }
                }
            }
            primitives_of.push(indices);
        }

        let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next()) {
            Some(default_scene) => default_scene.nodes().collect(),
            None => Vec::new(),
        };

        // (node, parent in `scene.nodes`); children pushed reversed to keep order
        let mut visited = HashSet::new();
        let mut stack: Vec<(gltf::Node, usize)> = roots
            .into_iter()
            .rev()
            .map(|node| (node, ImportedScene::ROOT))
            .collect();

        while let Some((node, parent)) = stack.pop() {
            if !visited.insert(node.index()) {
                let message = format!("node {} is reached more than once in the node graph", node.index());
                return Err(import_error(message));
            }

            let meshes = node
                .mesh()
                .and_then(|mesh| primitives_of.get(mesh.index()).cloned())
                .unwrap_or_default();
            let index = scene.add_child(parent, ImportedNode::new(node.name().unwrap_or_default(), meshes));

            let children: Vec<gltf::Node> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, index)));
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

fn convert_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    flip_uvs: bool
) -> Option<ImportedMesh> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        return None;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let normals = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => generate_smooth_normals(&positions, &indices),
    };

    let tex_coords = reader.read_tex_coords(0).map(|uvs| {
        let mut uvs: Vec<[f32; 2]> = uvs.into_f32().collect();
        if flip_uvs {
            flip_v(&mut uvs);
        }
        uvs
    });

    Some(ImportedMesh {
        name: mesh.name().unwrap_or_default().to_string(),
        positions,
        normals,
        tex_coords,
        indices,
        material: primitive.material().index(),
    })
}

fn texture_uri(texture: gltf::Texture) -> Option<String> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
        gltf::image::Source::View { .. } => None,
    }
}

fn convert_material(material: gltf::Material) -> ImportedMaterial {
    let pbr = material.pbr_metallic_roughness();
    let mut textures = Vec::new();

    if let Some(uri) = pbr.base_color_texture().and_then(|info| texture_uri(info.texture())) {
        textures.push((TextureKind::Diffuse, uri));
    }
    if let Some(uri) = pbr.metallic_roughness_texture().and_then(|info| texture_uri(info.texture())) {
        textures.push((TextureKind::Specular, uri));
    }
    if let Some(uri) = material.normal_texture().and_then(|info| texture_uri(info.texture())) {
        textures.push((TextureKind::Normal, uri));
    }

    ImportedMaterial {
        name: material.name().unwrap_or_default().to_string(),
        textures,
    }
}
