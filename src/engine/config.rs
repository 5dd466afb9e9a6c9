use std::path::{ Path, PathBuf };

use serde::{ Deserialize, Serialize };

use crate::engine::error::ConfigError;

pub const DEFAULT_MODEL: &str = "assets/models/cube/cube.obj";
pub const DEFAULT_SHADER: &str = "assets/shaders/texture.shader";

/// Viewer configuration file. Every field may be omitted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub shader: PathBuf,
    pub clear_color: [f32; 4],
    /// `env_logger` filter string; falls back to `RUST_LOG`, then
    /// `logging::DEFAULT_FILTER`.
    pub log_filter: Option<String>,
    pub camera: CameraConfig,
    pub objects: Vec<ObjectConfig>,
    pub grid: Option<GridConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shader: PathBuf::from(DEFAULT_SHADER),
            clear_color: [0.05, 0.05, 0.05, 1.0],
            log_filter: None,
            camera: CameraConfig::default(),
            objects: vec![ObjectConfig::new(DEFAULT_MODEL)],
            grid: None,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Built-in defaults when `path` is `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "3D Scene Viewer".to_string(),
            width: 1920,
            height: 1080,
            vsync: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub height: f32,
    pub speed: f32,
    pub sensitivity: f32,
    pub height_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            height: 1.0,
            speed: 5.0,
            sensitivity: 0.05,
            height_step: 0.05,
        }
    }
}

/// Rotation of an object around `axis`, in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RotationConfig {
    pub axis: [f32; 3],
    pub degrees: f32,
}

/// One model to load. Transform fields are applied in the order position,
/// scale, rotation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObjectConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub flip_uvs: bool,
    #[serde(default)]
    pub position: Option<[f32; 3]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
    #[serde(default)]
    pub rotation: Option<RotationConfig>,
}

impl ObjectConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flip_uvs: false,
            position: None,
            scale: None,
            rotation: None,
        }
    }
}

/// Layout of the cube-grid demo: `rows` x `columns` instances of `model`,
/// `spacing` units apart on the XZ plane.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    pub model: PathBuf,
    pub texture: Option<PathBuf>,
    pub rows: u32,
    pub columns: u32,
    pub spacing: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/models/cube/cube.obj"),
            texture: Some(PathBuf::from("assets/textures/crate.png")),
            rows: 10,
            columns: 10,
            spacing: 2.0,
        }
    }
}
