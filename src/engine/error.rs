use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader file {} has no {section} section", path.display())]
    MissingSection {
        path: PathBuf,
        section: &'static str,
    },
    #[error("{stage} shader compile error: {log}")]
    Compile {
        stage: &'static str,
        log: String,
    },
    #[error("shader program link error: {0}")]
    Link(String),
    #[error("failed to create shader object: {0}")]
    Create(String),
    #[error("vertex attribute '{0}' is not active in the shader program")]
    MissingAttribute(String),
    #[error("uniform '{0}' is not active in the shader program")]
    MissingUniform(String),
}

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to allocate {what}: {message}")]
    Allocation {
        what: &'static str,
        message: String,
    },
    #[error("texture image has unsupported channel count {0}")]
    UnsupportedChannels(u8),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no importer for model file {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("failed to import {}: {message}", path.display())]
    Import {
        path: PathBuf,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("index count {0} is not a multiple of 3")]
    IncompleteTriangle(usize),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        vertex_count: usize,
    },
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

#[derive(Debug, Error)]
pub enum ObjParseError {
    #[error("failed to read OBJ file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Syntax {
        line: usize,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error(transparent)]
    Parse(#[from] ObjParseError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}
