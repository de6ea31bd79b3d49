//! File loaders: Wavefront OBJ/MTL models and RON scene descriptions

pub mod config;
pub mod obj;

pub use config::{
    load_scene_config, save_scene_config, scene_config_from_str, CameraConfig, ConfigError,
    ModelConfig, ProjectionConfig, SceneConfig,
};
pub use obj::{load_mtl, load_obj, load_obj_from_str, parse_mtl, ObjModel};

use std::io;
use std::path::PathBuf;

/// Errors while reading a model or material library
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl LoadError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        LoadError::Parse {
            line,
            message: message.into(),
        }
    }
}
