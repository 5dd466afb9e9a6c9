use std::collections::HashMap;
use std::path::{ Path, PathBuf };

use crate::engine::error::ShaderError;
use crate::engine::rendering::gpu::{ Gpu, VertexLayout };

pub const POSITION_ATTRIBUTE: &str = "position";
pub const NORMAL_ATTRIBUTE: &str = "normal";
pub const TEX_COORD_ATTRIBUTE: &str = "texCoord";

const SECTION_MARKER: &str = "#shader";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Vertex,
    Fragment,
}

/// Vertex and fragment stages read from a single `.shader` file.
///
/// A line starting with `#shader vertex` or `#shader fragment` opens a
/// section; everything up to the next marker belongs to it. Lines before the
/// first marker, or inside an unknown section, are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn from_file(path: &Path) -> Result<Self, ShaderError> {
        let text = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ShaderError> {
        let mut vertex = String::new();
        let mut fragment = String::new();
        let mut current: Option<Section> = None;

        for line in text.lines() {
            if let Some(marker) = line.trim_start().strip_prefix(SECTION_MARKER) {
                current = if marker.contains("vertex") {
                    Some(Section::Vertex)
                } else if marker.contains("fragment") {
                    Some(Section::Fragment)
                } else {
                    log::warn!("Ignoring unknown shader section '{}' in {}", marker.trim(), path.display());
                    None
                };
                continue;
            }

            let target = match current {
                Some(Section::Vertex) => &mut vertex,
                Some(Section::Fragment) => &mut fragment,
                None => {
                    continue;
                }
            };
            target.push_str(line);
            target.push('\n');
        }

        let missing = |section| ShaderError::MissingSection {
            path: PathBuf::from(path),
            section,
        };
        if vertex.trim().is_empty() {
            return Err(missing("vertex"));
        }
        if fragment.trim().is_empty() {
            return Err(missing("fragment"));
        }

        Ok(Self { vertex, fragment })
    }
}

/// A linked program plus its lazily filled uniform location cache.
///
/// The cache remembers misses too, so an absent uniform is looked up and
/// reported once for the lifetime of the program.
pub struct ShaderProgram<G: Gpu> {
    program: G::Program,
    label: String,
    uniform_cache: HashMap<String, Option<G::UniformLocation>>,
}

impl<G: Gpu> ShaderProgram<G> {
    pub fn from_file(gpu: &mut G, path: &Path) -> Result<Self, ShaderError> {
        let source = ShaderSource::from_file(path)?;
        Self::from_source(gpu, &source, &path.display().to_string())
    }

    pub fn from_source(gpu: &mut G, source: &ShaderSource, label: &str) -> Result<Self, ShaderError> {
        let program = gpu.create_program(source)?;
        log::info!("Created shader program '{}'", label);
        Ok(Self {
            program,
            label: label.to_string(),
            uniform_cache: HashMap::new(),
        })
    }

    pub fn program(&self) -> G::Program {
        self.program
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn uniform_location(&mut self, gpu: &G, name: &str) -> Option<G::UniformLocation> {
        if let Some(cached) = self.uniform_cache.get(name) {
            return cached.clone();
        }

        let location = gpu.uniform_location(self.program, name);
        if location.is_none() {
            log::warn!("Uniform '{}' doesn't exist in shader '{}'", name, self.label);
        }
        self.uniform_cache.insert(name.to_string(), location.clone());
        location
    }

    pub fn cached_uniform_count(&self) -> usize {
        self.uniform_cache.len()
    }

    pub fn attrib_location(&self, gpu: &G, name: &str) -> Result<u32, ShaderError> {
        gpu.attrib_location(self.program, name).ok_or_else(||
            ShaderError::MissingAttribute(name.to_string())
        )
    }

    /// Resolves the `position`, `normal` and `texCoord` inputs meshes upload into.
    pub fn vertex_layout(&self, gpu: &G) -> Result<VertexLayout, ShaderError> {
        Ok(VertexLayout {
            position: self.attrib_location(gpu, POSITION_ATTRIBUTE)?,
            normal: self.attrib_location(gpu, NORMAL_ATTRIBUTE)?,
            tex_coord: self.attrib_location(gpu, TEX_COORD_ATTRIBUTE)?,
        })
    }

    pub fn require_uniforms(&mut self, gpu: &G, names: &[&str]) -> Result<(), ShaderError> {
        for name in names {
            if self.uniform_location(gpu, name).is_none() {
                return Err(ShaderError::MissingUniform(name.to_string()));
            }
        }
        Ok(())
    }

    pub fn destroy(self, gpu: &mut G) {
        gpu.delete_program(self.program);
    }
}
