use cgmath::{ Deg, Vector3 };

use crate::engine::components::scene_object::SceneObject;
use crate::engine::components::texture::TextureCache;
use crate::engine::config::ObjectConfig;
use crate::engine::loaders::importer::importer_for_path;
use crate::engine::rendering::{ Gpu, VertexLayout };

/// The objects drawn each frame, in draw order, plus the texture cache they
/// share.
pub struct Scene<G: Gpu> {
    objects: Vec<SceneObject<G>>,
    textures: TextureCache<G>,
    clear_color: [f32; 4],
}

impl<G: Gpu> Scene<G> {
    pub fn new(clear_color: [f32; 4]) -> Self {
        Self {
            objects: Vec::new(),
            textures: TextureCache::new(),
            clear_color,
        }
    }

    pub fn add(&mut self, object: SceneObject<G>) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Loads the configured model with the importer matching its extension
    /// and applies its position, scale and rotation. Returns `None` when no
    /// importer handles the file type.
    pub fn load_object(
        &mut self,
        gpu: &mut G,
        config: &ObjectConfig,
        layout: &VertexLayout
    ) -> Option<&mut SceneObject<G>> {
        let importer = match importer_for_path(&config.path) {
            Ok(importer) => importer,
            Err(e) => {
                log::error!("{}", e);
                return None;
            }
        };

        let mut object = SceneObject::load(
            gpu,
            importer.as_ref(),
            &config.path,
            config.flip_uvs,
            layout,
            &mut self.textures
        );

        if let Some([x, y, z]) = config.position {
            object.translate(Vector3::new(x, y, z));
        }
        if let Some([x, y, z]) = config.scale {
            object.set_scale(Vector3::new(x, y, z));
        }
        if let Some(rotation) = config.rotation {
            let [x, y, z] = rotation.axis;
            object.set_rotation(Vector3::new(x, y, z), Deg(rotation.degrees));
        }

        let index = self.add(object);
        self.objects.get_mut(index)
    }

    pub fn objects(&self) -> &[SceneObject<G>] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [SceneObject<G>] {
        &mut self.objects
    }

    pub fn textures(&self) -> &TextureCache<G> {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureCache<G> {
        &mut self.textures
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn mesh_count(&self) -> usize {
        self.objects
            .iter()
            .map(|object| object.mesh_count())
            .sum()
    }

    pub fn destroy(self, gpu: &mut G) {
        for object in self.objects {
            object.destroy(gpu);
        }
        self.textures.destroy(gpu);
    }
}
