//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Please upload an image first")]
    NoSourceImage,

    #[error("Invalid target size: {0}")]
    InvalidTarget(String),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("Invalid scale: {0}")]
    InvalidScale(f64),

    #[error("Invalid quality: {0} (expected a value in (0, 1])")]
    InvalidQuality(f64),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No scale/quality combination met the target after {attempts} attempts (smallest output: {smallest_bytes} bytes)")]
    SearchExhausted { attempts: usize, smallest_bytes: u64 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
