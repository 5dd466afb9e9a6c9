use std::path::Path;

use cgmath::{ InnerSpace, Matrix4, Rad, SquareMatrix, Vector3, Zero };

use crate::engine::components::mesh::Mesh;
use crate::engine::components::texture::{ MeshTexture, TextureCache, TextureKind };
use crate::engine::loaders::importer::{ ImportedMesh, ImportedScene, ModelImporter };
use crate::engine::rendering::{ ActiveShader, Gpu, VertexLayout };

const TEXTURE_KINDS: [TextureKind; TextureKind::COUNT] = [
    TextureKind::Diffuse,
    TextureKind::Specular,
    TextureKind::Normal,
    TextureKind::Height,
];

/// A drawable model: an ordered list of meshes under one model matrix.
///
/// Transform calls post-multiply onto the current matrix, so they compound:
/// `translate(a)` followed by `translate(b)` leaves `M * T(a) * T(b)`.
/// Use `reset_transform` to start over from identity.
pub struct SceneObject<G: Gpu> {
    name: String,
    meshes: Vec<Mesh<G>>,
    position: Vector3<f32>,
    scale: Vector3<f32>,
    rotation_axis: Vector3<f32>,
    rotation_angle: Rad<f32>,
    model: Matrix4<f32>,
}

impl<G: Gpu> SceneObject<G> {
    /// Imports `path` and uploads every mesh reachable from the root node,
    /// depth-first. A file that fails to import yields an object with no
    /// meshes; a mesh that fails to upload is left out.
    pub fn load(
        gpu: &mut G,
        importer: &dyn ModelImporter,
        path: &Path,
        flip_uvs: bool,
        layout: &VertexLayout,
        textures: &mut TextureCache<G>
    ) -> Self {
        let name = path.display().to_string();
        let scene = match importer.import(path, flip_uvs) {
            Ok(scene) => scene,
            Err(e) => {
                log::error!("Failed to load model {}: {}", name, e);
                return Self::from_meshes(&name, Vec::new());
            }
        };

        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let mut meshes = Vec::new();

        for index in scene.mesh_order() {
            let Some(imported) = scene.meshes.get(index) else {
                log::warn!("Node in {} refers to missing mesh {}", name, index);
                continue;
            };
            let mesh_textures = load_mesh_textures(gpu, &scene, imported, directory, textures);

            match Mesh::new(gpu, imported.vertices(), imported.indices.clone(), mesh_textures, layout) {
                Ok(mesh) => meshes.push(mesh),
                Err(e) => log::warn!("Skipping mesh '{}' in {}: {}", imported.name, name, e),
            }
        }

        log::info!("Loaded model {} with {} meshes", name, meshes.len());
        Self::from_meshes(&name, meshes)
    }

    pub fn from_meshes(name: &str, meshes: Vec<Mesh<G>>) -> Self {
        let mut object = Self {
            name: name.to_string(),
            meshes,
            position: Vector3::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            rotation_axis: Vector3::unit_y(),
            rotation_angle: Rad(0.0),
            model: Matrix4::identity(),
        };
        object.translate(object.position);
        object.set_scale(object.scale);
        object
    }

    /// A second object drawing the same meshes under its own transform.
    pub fn instance(&self) -> Self {
        Self::from_meshes(&self.name, self.meshes.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[Mesh<G>] {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    pub fn rotation(&self) -> (Vector3<f32>, Rad<f32>) {
        (self.rotation_axis, self.rotation_angle)
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.model
    }

    pub fn translate(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.model = self.model * Matrix4::from_translation(position);
    }

    /// Adds `offset` to the stored position and post-multiplies a translation
    /// by the resulting (accumulated) position.
    pub fn add_to_position(&mut self, offset: Vector3<f32>) {
        self.position += offset;
        self.model = self.model * Matrix4::from_translation(self.position);
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
        self.model = self.model * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
    }

    pub fn set_rotation(&mut self, axis: Vector3<f32>, angle: impl Into<Rad<f32>>) {
        let angle = angle.into();
        if axis.magnitude2() == 0.0 {
            log::warn!("Ignoring rotation of {} around a zero axis", self.name);
            return;
        }
        self.rotation_axis = axis;
        self.rotation_angle = angle;
        self.model = self.model * Matrix4::from_axis_angle(axis.normalize(), angle);
    }

    pub fn reset_transform(&mut self) {
        self.position = Vector3::zero();
        self.scale = Vector3::new(1.0, 1.0, 1.0);
        self.rotation_axis = Vector3::unit_y();
        self.rotation_angle = Rad(0.0);
        self.model = Matrix4::identity();
    }

    pub fn draw(&self, shader: &mut ActiveShader<'_, G>) {
        shader.set_mat4("model", &self.model);
        for mesh in &self.meshes {
            mesh.draw(shader);
        }
    }

    pub fn destroy(self, gpu: &mut G) {
        for mesh in self.meshes {
            mesh.destroy(gpu);
        }
    }
}

/// Diffuse, specular, normal and height maps of the mesh's material, in that
/// order, resolved against the model's directory.
fn load_mesh_textures<G: Gpu>(
    gpu: &mut G,
    scene: &ImportedScene,
    mesh: &ImportedMesh,
    directory: &Path,
    cache: &mut TextureCache<G>
) -> Vec<MeshTexture<G>> {
    let Some(material) = scene.material(mesh) else {
        return Vec::new();
    };

    let mut textures = Vec::new();
    for kind in TEXTURE_KINDS {
        for file in material.textures_of(kind) {
            textures.push(MeshTexture::new(kind, cache.load(gpu, &directory.join(file))));
        }
    }
    textures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ModelError;
    use crate::engine::loaders::importer::{ ImportedMaterial, ImportedNode };
    use crate::engine::rendering::headless::HeadlessGpu;
    use cgmath::{ Deg, Vector4 };

    struct FixedImporter(ImportedScene);

    impl ModelImporter for FixedImporter {
        fn import(&self, _path: &Path, _flip_uvs: bool) -> Result<ImportedScene, ModelError> {
            Ok(self.0.clone())
        }
    }

    struct FailingImporter;

    impl ModelImporter for FailingImporter {
        fn import(&self, path: &Path, _flip_uvs: bool) -> Result<ImportedScene, ModelError> {
            Err(ModelError::Import {
                path: path.to_path_buf(),
                message: "corrupt".into(),
            })
        }
    }

    fn layout() -> VertexLayout {
        VertexLayout { position: 0, normal: 1, tex_coord: 2 }
    }

    fn triangle(name: &str, vertex_count: usize) -> ImportedMesh {
        ImportedMesh {
            name: name.into(),
            positions: vec![[0.0; 3]; vertex_count],
            normals: vec![[0.0, 0.0, 1.0]; vertex_count],
            tex_coords: None,
            indices: vec![0, 1, 2],
            material: None,
        }
    }

    fn node(meshes: Vec<usize>, children: Vec<usize>) -> ImportedNode {
        ImportedNode { name: String::new(), meshes, children }
    }

    fn assert_matrix_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn fresh_object_has_identity_model() {
        let object = SceneObject::<HeadlessGpu>::from_meshes("empty", Vec::new());
        assert_eq!(object.model_matrix(), Matrix4::identity());
        assert_eq!(object.scale(), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn translations_compound() {
        let mut object = SceneObject::<HeadlessGpu>::from_meshes("cube", Vec::new());
        object.translate(Vector3::new(1.0, 0.0, 0.0));
        object.translate(Vector3::new(0.0, 2.0, 0.0));

        assert_eq!(object.position(), Vector3::new(0.0, 2.0, 0.0));
        assert_matrix_eq(object.model_matrix(), Matrix4::from_translation(Vector3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn set_scale_is_not_idempotent() {
        let mut object = SceneObject::<HeadlessGpu>::from_meshes("cube", Vec::new());
        object.set_scale(Vector3::new(2.0, 2.0, 2.0));
        object.set_scale(Vector3::new(2.0, 2.0, 2.0));
        assert_matrix_eq(object.model_matrix(), Matrix4::from_scale(4.0));
    }

    #[test]
    fn add_to_position_applies_accumulated_position() {
        let mut object = SceneObject::<HeadlessGpu>::from_meshes("cube", Vec::new());
        object.add_to_position(Vector3::new(1.0, 0.0, 0.0));
        object.add_to_position(Vector3::new(1.0, 0.0, 0.0));

        assert_eq!(object.position(), Vector3::new(2.0, 0.0, 0.0));
        assert_matrix_eq(object.model_matrix(), Matrix4::from_translation(Vector3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn rotation_is_applied_after_translation() {
        let mut object = SceneObject::<HeadlessGpu>::from_meshes("cube", Vec::new());
        object.translate(Vector3::new(0.0, 0.0, -5.0));
        object.set_rotation(Vector3::unit_y(), Deg(90.0));

        // Local +X ends up along -Z, offset by the translation.
        let p = object.model_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 0.0).abs() < 1e-5);
        assert!((p.z - -6.0).abs() < 1e-5);

        object.reset_transform();
        assert_eq!(object.model_matrix(), Matrix4::identity());
    }

    #[test]
    fn meshes_follow_depth_first_node_order() {
        let scene = ImportedScene {
            nodes: vec![
                node(vec![], vec![1, 3]),
                node(vec![2], vec![2]),
                node(vec![0], vec![]),
                node(vec![1], vec![])
            ],
            meshes: vec![triangle("c", 3), triangle("b", 4), triangle("a", 5)],
            materials: Vec::new(),
        };
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let object = SceneObject::load(
            &mut gpu,
            &FixedImporter(scene),
            Path::new("model.obj"),
            false,
            &layout(),
            &mut cache
        );

        let vertex_counts: Vec<usize> = object
            .meshes()
            .iter()
            .map(|m| m.vertices().len())
            .collect();
        assert_eq!(vertex_counts, vec![5, 3, 4]);
    }

    #[test]
    fn invalid_mesh_is_skipped() {
        let mut broken = triangle("broken", 3);
        broken.indices = vec![0, 1, 7];
        let scene = ImportedScene {
            nodes: vec![node(vec![0, 1], vec![])],
            meshes: vec![broken, triangle("ok", 3)],
            materials: Vec::new(),
        };
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let object = SceneObject::load(
            &mut gpu,
            &FixedImporter(scene),
            Path::new("model.obj"),
            false,
            &layout(),
            &mut cache
        );

        assert_eq!(object.mesh_count(), 1);
        assert_eq!(gpu.mesh_uploads(), 1);
    }

    #[test]
    fn failed_import_yields_empty_object() {
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let object = SceneObject::load(
            &mut gpu,
            &FailingImporter,
            Path::new("broken.obj"),
            false,
            &layout(),
            &mut cache
        );
        assert_eq!(object.mesh_count(), 0);
        assert_eq!(object.model_matrix(), Matrix4::identity());
    }

    #[test]
    fn material_textures_are_ordered_by_kind() {
        let mut mesh = triangle("textured", 3);
        mesh.material = Some(0);
        let scene = ImportedScene {
            nodes: vec![node(vec![0], vec![])],
            meshes: vec![mesh],
            materials: vec![ImportedMaterial {
                name: "mat".into(),
                textures: vec![
                    (TextureKind::Normal, "n.png".into()),
                    (TextureKind::Diffuse, "d.png".into())
                ],
            }],
        };
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let object = SceneObject::load(
            &mut gpu,
            &FixedImporter(scene),
            Path::new("models/crate/crate.obj"),
            false,
            &layout(),
            &mut cache
        );

        let textures = object.meshes()[0].textures();
        assert_eq!(textures[0].kind(), TextureKind::Diffuse);
        assert_eq!(Path::new(textures[0].path()), Path::new("models/crate/d.png"));
        assert_eq!(textures[1].kind(), TextureKind::Normal);
    }

    #[test]
    fn one_image_used_as_two_kinds_keeps_both() {
        let mut mesh = triangle("textured", 3);
        mesh.material = Some(0);
        let scene = ImportedScene {
            nodes: vec![node(vec![0], vec![])],
            meshes: vec![mesh],
            materials: vec![ImportedMaterial {
                name: "mat".into(),
                textures: vec![
                    (TextureKind::Diffuse, "shared.png".into()),
                    (TextureKind::Specular, "shared.png".into())
                ],
            }],
        };
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let object = SceneObject::load(
            &mut gpu,
            &FixedImporter(scene),
            Path::new("models/crate/crate.obj"),
            false,
            &layout(),
            &mut cache
        );

        let textures = object.meshes()[0].textures();
        assert_eq!(textures.len(), 2);
        assert_eq!(textures[0].kind(), TextureKind::Diffuse);
        assert_eq!(textures[1].kind(), TextureKind::Specular);
        assert_eq!(textures[0].path(), textures[1].path());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn instances_share_geometry() {
        let scene = ImportedScene {
            nodes: vec![node(vec![0], vec![])],
            meshes: vec![triangle("tri", 3)],
            materials: Vec::new(),
        };
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let original = SceneObject::load(
            &mut gpu,
            &FixedImporter(scene),
            Path::new("model.obj"),
            false,
            &layout(),
            &mut cache
        );
        let mut copy = original.instance();
        copy.translate(Vector3::new(3.0, 0.0, 0.0));

        assert_eq!(gpu.mesh_uploads(), 1);
        assert_eq!(copy.meshes()[0].vertex_array(), original.meshes()[0].vertex_array());
        assert_eq!(original.model_matrix(), Matrix4::identity());

        original.destroy(&mut gpu);
        assert_eq!(gpu.live_meshes(), 1);
        copy.destroy(&mut gpu);
        assert_eq!(gpu.live_meshes(), 0);
    }
}
