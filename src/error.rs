use std::path::PathBuf;
use thiserror::Error;

use crate::parser::FilenameError;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of {url} failed with status {status}")]
    Download { url: String, status: u16 },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Integrity(String),

    #[error("Checksum mismatch: expected md5 {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Unrecognized image filename '{name}': {source}")]
    Filename {
        name: String,
        #[source]
        source: FilenameError,
    },

    #[error("Source image not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("Split would leave an empty partition: {0}")]
    EmptySplit(String),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
