use std::path::Path;

use cgmath::{ InnerSpace, Vector3, Zero };

use crate::engine::components::mesh::Vertex;
use crate::engine::components::texture::TextureKind;
use crate::engine::error::ModelError;
use crate::engine::loaders::gltf_importer::GltfImporter;
use crate::engine::loaders::obj_importer::ObjImporter;

/// Geometry of one triangulated mesh as it came out of a model file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

impl ImportedMesh {
    /// Interleaves the attribute streams. Vertices without texture
    /// coordinates get (0, 0).
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let normal = self.normals.get(i).copied().unwrap_or([0.0; 3]);
                let tex_coords = self.tex_coords
                    .as_ref()
                    .and_then(|uvs| uvs.get(i).copied())
                    .unwrap_or([0.0; 2]);
                Vertex::new(position, normal, tex_coords)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMaterial {
    pub name: String,
    /// Texture file references in declaration order, relative to the model
    /// file's directory unless absolute.
    pub textures: Vec<(TextureKind, String)>,
}

impl ImportedMaterial {
    pub fn textures_of(&self, kind: TextureKind) -> impl Iterator<Item = &str> {
        self.textures
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, path)| path.as_str())
    }
}

/// One node of the model hierarchy. `children` index into
/// `ImportedScene::nodes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedNode {
    pub name: String,
    pub meshes: Vec<usize>,
    pub children: Vec<usize>,
}

impl ImportedNode {
    pub fn new(name: impl Into<String>, meshes: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            meshes,
            children: Vec::new(),
        }
    }
}

/// Nodes are stored flat; `nodes[ROOT]` is the root once any node exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedScene {
    pub nodes: Vec<ImportedNode>,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
}

impl ImportedScene {
    pub const ROOT: usize = 0;

    /// A scene holding only its root node.
    pub fn with_root(name: impl Into<String>) -> Self {
        Self {
            nodes: vec![ImportedNode::new(name, Vec::new())],
            ..Default::default()
        }
    }

    pub fn root(&self) -> Option<&ImportedNode> {
        self.nodes.get(Self::ROOT)
    }

    /// Appends `node` as the last child of `parent` and returns its index.
    pub fn add_child(&mut self, parent: usize, node: ImportedNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(index);
        }
        index
    }

    /// Mesh indices in depth-first pre-order: a node's own meshes, then each
    /// child subtree in order. A node reached a second time, or a child index
    /// with no node behind it, is skipped.
    pub fn mesh_order(&self) -> Vec<usize> {
        let mut order = Vec::new();
        if self.nodes.is_empty() {
            return order;
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![Self::ROOT];

        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                log::warn!("Skipping missing node {}", index);
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                log::warn!("Skipping node {} reached twice", index);
                continue;
            }
            order.extend_from_slice(&node.meshes);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    pub fn material(&self, mesh: &ImportedMesh) -> Option<&ImportedMaterial> {
        mesh.material.and_then(|index| self.materials.get(index))
    }
}

pub trait ModelImporter {
    fn import(&self, path: &Path, flip_uvs: bool) -> Result<ImportedScene, ModelError>;
}

/// Picks an importer from the file extension.
pub fn importer_for_path(path: &Path) -> Result<Box<dyn ModelImporter>, ModelError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("obj") => Ok(Box::new(ObjImporter)),
        Some("gltf") | Some("glb") => Ok(Box::new(GltfImporter)),
        _ => Err(ModelError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Per-vertex normals averaged from the area-weighted normals of every face
/// touching the vertex. Vertices on no face, or only on degenerate faces,
/// get a zero normal.
pub fn generate_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vector3::<f32>::zero(); positions.len()];

    for face in indices.chunks_exact(3) {
        let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let p0 = Vector3::from(positions[a]);
        let p1 = Vector3::from(positions[b]);
        let p2 = Vector3::from(positions[c]);
        let normal = (p1 - p0).cross(p2 - p0);

        accumulated[a] += normal;
        accumulated[b] += normal;
        accumulated[c] += normal;
    }

    accumulated
        .into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 { n.normalize().into() } else { [0.0; 3] }
        })
        .collect()
}

pub fn flip_v(tex_coords: &mut [[f32; 2]]) {
    for uv in tex_coords {
        uv[1] = 1.0 - uv[1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_order_is_depth_first_pre_order() {
        // root[0] -> a[1] -> a1[2], then b[3, 4]
        let mut scene = ImportedScene::with_root("root");
        scene.nodes[ImportedScene::ROOT].meshes = vec![0];
        let a = scene.add_child(ImportedScene::ROOT, ImportedNode::new("a", vec![1]));
        scene.add_child(ImportedScene::ROOT, ImportedNode::new("b", vec![3, 4]));
        scene.add_child(a, ImportedNode::new("a1", vec![2]));

        assert_eq!(scene.mesh_order(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn mesh_order_skips_repeated_and_missing_nodes() {
        let mut scene = ImportedScene::with_root("root");
        let a = scene.add_child(ImportedScene::ROOT, ImportedNode::new("a", vec![7]));
        scene.nodes[a].children.extend([ImportedScene::ROOT, a, 42]);

        assert_eq!(scene.mesh_order(), vec![7]);
        assert!(ImportedScene::default().mesh_order().is_empty());
    }

    #[test]
    fn smooth_normals_of_flat_quad_point_up() {
        let positions = [
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
        ];
        let normals = generate_smooth_normals(&positions, &[0, 1, 2, 0, 2, 3]);
        for n in normals {
            assert!((n[1] - 1.0).abs() < 1e-6, "{:?}", n);
        }
    }

    #[test]
    fn unused_vertex_gets_zero_normal() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]];
        let normals = generate_smooth_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals[3], [0.0; 3]);
        assert!((normals[0][2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn flip_v_mirrors_vertically() {
        let mut uvs = [[0.25, 0.0], [0.5, 0.75]];
        flip_v(&mut uvs);
        assert_eq!(uvs, [[0.25, 1.0], [0.5, 0.25]]);
    }

    #[test]
    fn vertices_default_missing_tex_coords() {
        let mesh = ImportedMesh {
            positions: vec![[1.0, 2.0, 3.0]],
            normals: vec![[0.0, 1.0, 0.0]],
            indices: vec![],
            ..Default::default()
        };
        assert_eq!(mesh.vertices(), vec![Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0])]);
    }

    #[test]
    fn importer_is_chosen_by_extension() {
        assert!(importer_for_path(Path::new("models/street.OBJ")).is_ok());
        assert!(importer_for_path(Path::new("models/guy.gltf")).is_ok());
        let err = importer_for_path(Path::new("models/mesh.fbx")).err().unwrap();
        assert!(matches!(err, ModelError::UnsupportedFormat(_)));
    }
}
