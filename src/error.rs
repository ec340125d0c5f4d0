//! Error types shared across the scene
//!
//! Library code returns [`SceneError`]; the binary wraps it in `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to load model '{path}': {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model '{0}' contains no meshes")]
    EmptyModel(String),

    #[error("failed to read config '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scene config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid scene config: {0}")]
    InvalidConfig(String),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("GPU initialisation failed: {0}")]
    Gpu(String),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("shader '{0}' has not been loaded")]
    MissingShader(String),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

pub type Result<T> = std::result::Result<T, SceneError>;
