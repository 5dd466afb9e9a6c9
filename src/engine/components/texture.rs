use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use image::{ DynamicImage, GenericImageView };
use serde::{ Deserialize, Serialize };

use crate::engine::rendering::{ Gpu, TextureImage };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            TextureKind::Diffuse => 0,
            TextureKind::Specular => 1,
            TextureKind::Normal => 2,
            TextureKind::Height => 3,
        }
    }

    /// Sampler name prefix; the draw appends a 1-based ordinal.
    pub fn uniform_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }
}

/// One uploaded image file. Shared between every mesh that samples it, under
/// whatever kind each mesh's material gives it.
pub struct Texture<G: Gpu> {
    handle: Option<G::Texture>,
    path: String,
}

impl<G: Gpu> Texture<G> {
    pub fn new(handle: Option<G::Texture>, path: &str) -> Self {
        Self {
            handle,
            path: path.to_string(),
        }
    }

    /// `None` when the image could not be loaded; drawing then binds texture 0.
    pub fn handle(&self) -> Option<G::Texture> {
        self.handle
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }
}

/// A mesh's use of a shared texture: the image plus the sampler kind it is
/// bound as.
pub struct MeshTexture<G: Gpu> {
    kind: TextureKind,
    texture: Rc<Texture<G>>,
}

impl<G: Gpu> Clone for MeshTexture<G> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            texture: Rc::clone(&self.texture),
        }
    }
}

impl<G: Gpu> MeshTexture<G> {
    pub fn new(kind: TextureKind, texture: Rc<Texture<G>>) -> Self {
        Self { kind, texture }
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn texture(&self) -> &Rc<Texture<G>> {
        &self.texture
    }

    pub fn handle(&self) -> Option<G::Texture> {
        self.texture.handle()
    }

    pub fn path(&self) -> &str {
        self.texture.path()
    }
}

/// Decodes an image file. Luma, RGB and RGBA 8-bit images keep their channel
/// count; anything else is converted to RGBA.
pub fn load_image(path: &Path) -> Option<TextureImage> {
    let img = match image::open(path) {
        Ok(img) => img,
        Err(e) => {
            log::error!("Texture failed to load at path {}: {}", path.display(), e);
            return None;
        }
    };

    let (width, height) = img.dimensions();
    let (channels, pixels) = match img {
        DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
        other => (4, other.to_rgba8().into_raw()),
    };

    Some(TextureImage {
        width,
        height,
        channels,
        pixels,
    })
}

/// Textures uploaded so far, keyed by file path.
///
/// A path is loaded and uploaded at most once; later requests share the same
/// texture whatever kind they use it as. Paths that failed to load are remembered too
/// and keep resolving to the zero texture.
pub struct TextureCache<G: Gpu> {
    loaded: HashMap<String, Rc<Texture<G>>>,
}

impl<G: Gpu> Default for TextureCache<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Gpu> TextureCache<G> {
    pub fn new() -> Self {
        Self {
            loaded: HashMap::new(),
        }
    }

    pub fn load(&mut self, gpu: &mut G, path: &Path) -> Rc<Texture<G>> {
        let key = path.to_string_lossy().into_owned();
        if let Some(texture) = self.loaded.get(&key) {
            log::debug!("Reusing texture {}", key);
            return Rc::clone(texture);
        }

        let handle = load_image(path).and_then(|image| {
            match gpu.upload_texture(&image) {
                Ok(handle) => {
                    log::info!(
                        "Texture loaded successfully: {} ({}x{}, {} channels)",
                        key,
                        image.width,
                        image.height,
                        image.channels
                    );
                    Some(handle)
                }
                Err(e) => {
                    log::error!("Texture upload failed for {}: {}", key, e);
                    None
                }
            }
        });

        let texture = Rc::new(Texture::new(handle, &key));
        self.loaded.insert(key, Rc::clone(&texture));
        texture
    }

    pub fn get(&self, path: &Path) -> Option<Rc<Texture<G>>> {
        self.loaded.get(path.to_string_lossy().as_ref()).cloned()
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn destroy(self, gpu: &mut G) {
        for texture in self.loaded.into_values() {
            if let Some(handle) = texture.handle {
                gpu.delete_texture(handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rendering::headless::HeadlessGpu;

    fn write_png(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("scene-viewer-{}-{}", std::process::id(), name));
        image::RgbImage::from_pixel(2, 2, image::Rgb([200, 10, 10])).save(&path).unwrap();
        path
    }

    #[test]
    fn uniform_prefixes_follow_kind() {
        assert_eq!(TextureKind::Diffuse.uniform_prefix(), "texture_diffuse");
        assert_eq!(TextureKind::Specular.uniform_prefix(), "texture_specular");
        assert_eq!(TextureKind::Normal.uniform_prefix(), "texture_normal");
        assert_eq!(TextureKind::Height.uniform_prefix(), "texture_height");
    }

    #[test]
    fn load_image_keeps_rgb_channels() {
        let path = write_png("rgb.png");
        let image = load_image(&path).unwrap();
        assert_eq!((image.width, image.height, image.channels), (2, 2, 3));
        assert_eq!(image.pixels.len(), 12);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn same_path_uploads_once() {
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let path = write_png("cached.png");

        let first = cache.load(&mut gpu, &path);
        let second = cache.load(&mut gpu, &path);

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(gpu.texture_uploads(), 1);
        assert_eq!(cache.len(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn one_file_can_serve_as_different_kinds() {
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let path = write_png("shared-kind.png");

        let diffuse = MeshTexture::new(TextureKind::Diffuse, cache.load(&mut gpu, &path));
        let specular = MeshTexture::new(TextureKind::Specular, cache.load(&mut gpu, &path));

        assert_eq!(gpu.texture_uploads(), 1);
        assert_eq!(diffuse.handle(), specular.handle());
        assert_eq!(diffuse.kind(), TextureKind::Diffuse);
        assert_eq!(specular.kind(), TextureKind::Specular);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_cached_as_unloaded() {
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let path = Path::new("does/not/exist.png");

        let texture = cache.load(&mut gpu, path);
        assert!(!texture.is_loaded());
        assert_eq!(gpu.texture_uploads(), 0);
        assert!(cache.get(path).is_some());
    }

    #[test]
    fn destroy_releases_uploaded_textures() {
        let mut gpu = HeadlessGpu::new();
        let mut cache = TextureCache::new();
        let path = write_png("destroy.png");
        cache.load(&mut gpu, &path);
        assert_eq!(gpu.live_textures(), 1);

        cache.destroy(&mut gpu);
        assert_eq!(gpu.live_textures(), 0);
        let _ = std::fs::remove_file(path);
    }
}
