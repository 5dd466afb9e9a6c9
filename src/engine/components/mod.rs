pub mod camera;
pub mod mesh;
pub mod scene;
pub mod scene_object;
pub mod texture;

pub use camera::{ CameraEvent, CameraSettings, CameraState, FrameInput, MovementKeys };
pub use mesh::{ Mesh, Vertex };
pub use scene::Scene;
pub use scene_object::SceneObject;
pub use texture::{ load_image, MeshTexture, Texture, TextureCache, TextureKind };
