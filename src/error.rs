// src/error.rs
//! Ошибки построения и загрузки поверхностной сети

use thiserror::Error;

use crate::feature::FeatureKind;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Попытка положить в контейнер объект чужого типа.
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: FeatureKind,
        found: FeatureKind,
    },

    /// Сохранённая сеть построена по другой карте высот.
    #[error("checksum mismatch: network was built from {saved}, raster is {actual}")]
    ChecksumMismatch { saved: String, actual: String },

    #[error("malformed feature id: {0}")]
    MalformedId(String),

    #[error("unknown feature id: {0}")]
    UnknownId(String),
}

pub type Result<T> = std::result::Result<T, SurfaceError>;
