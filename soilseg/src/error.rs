use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading, configuring or persisting a pipeline pass.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Image '{path}' decoded to an empty {width}x{height} buffer")]
    EmptyImage {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("Invalid pipeline configuration: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: i64,
        reason: &'static str,
    },

    #[error("Failed to load configuration '{path}': {source}")]
    ConfigLoad {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("Failed to write image '{path}': {source}")]
    ImageSave {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
