//! Data models and structures
//!
//! Defines the source image, resize requests and results, target sizes and
//! the environment-backed configuration.

use crate::{Error, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Smallest target size the search accepts, in kilobytes.
pub const MIN_TARGET_KB: f64 = 10.0;

/// Quality used for a manual resize when none is given.
pub const DEFAULT_QUALITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
        }
    }

    /// File extension for downloads; `jpeg` is shortened to `jpg`.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            other => other.name(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A decoded upload. Never mutated after decode; replaced wholesale by the
/// next upload.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: Arc<DynamicImage>,
    byte_size: u64,
    detected_format: Option<OutputFormat>,
}

impl SourceImage {
    pub fn new(image: DynamicImage, byte_size: u64, detected_format: Option<OutputFormat>) -> Self {
        Self {
            image: Arc::new(image),
            byte_size,
            detected_format,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn detected_format(&self) -> Option<OutputFormat> {
        self.detected_format
    }

    pub(crate) fn shared_image(&self) -> Arc<DynamicImage> {
        Arc::clone(&self.image)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeRequest {
    /// Target width in pixels; `None` or zero means "derive".
    pub width: Option<u32>,
    /// Target height in pixels; `None` or zero means "derive".
    pub height: Option<u32>,
    /// Uniform multiplier, used only when neither width nor height is given.
    pub scale: f64,
    pub format: OutputFormat,
    /// Encode quality in (0, 1]. Ignored by lossless formats.
    pub quality: f64,
}

impl ResizeRequest {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            width: None,
            height: None,
            scale: 1.0,
            format,
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    pub fn validate_quality(&self) -> Result<()> {
        if self.quality.is_finite() && self.quality > 0.0 && self.quality <= 1.0 {
            Ok(())
        } else {
            Err(Error::InvalidQuality(self.quality))
        }
    }
}

/// Output of a single resize/compress. Ephemeral: every invocation produces
/// a fresh one.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: f64,
}

impl ResizeResult {
    /// Exact encoded length in bytes.
    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Maximum output size accepted by the best-settings search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    bytes: u64,
}

impl TargetSize {
    /// Parse a target given in kilobytes (1 KB = 1024 bytes), rejecting
    /// anything under [`MIN_TARGET_KB`].
    pub fn from_kb(kb: f64) -> Result<Self> {
        if !kb.is_finite() || kb < MIN_TARGET_KB {
            return Err(Error::InvalidTarget(format!(
                "{} KB is not a valid target size (at least {} KB)",
                kb, MIN_TARGET_KB
            )));
        }
        Ok(Self {
            bytes: (kb * 1024.0).floor() as u64,
        })
    }

    /// Raw byte target with no usability floor; must be positive.
    pub fn from_bytes(bytes: u64) -> Result<Self> {
        if bytes == 0 {
            return Err(Error::InvalidTarget("target size must be positive".to_string()));
        }
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub default_format: OutputFormat,
    pub default_quality: f64,
    pub default_scale_percent: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            default_format: OutputFormat::Jpeg,
            default_quality: DEFAULT_QUALITY,
            default_scale_percent: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let output_dir = lookup("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let default_format = match lookup("DEFAULT_FORMAT") {
            Some(value) => value
                .parse()
                .map_err(|e| Error::Config(format!("DEFAULT_FORMAT: {}", e)))?,
            None => defaults.default_format,
        };

        let default_quality = match lookup("DEFAULT_QUALITY") {
            Some(value) => {
                let quality: f64 = value.trim().parse().map_err(|_| {
                    Error::Config(format!("DEFAULT_QUALITY is not a number: {}", value))
                })?;
                if !(quality > 0.0 && quality <= 1.0) {
                    return Err(Error::Config(format!(
                        "DEFAULT_QUALITY must be in (0, 1], got {}",
                        quality
                    )));
                }
                quality
            }
            None => defaults.default_quality,
        };

        let default_scale_percent = match lookup("DEFAULT_SCALE_PERCENT") {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(percent) if percent > 0 => percent,
                _ => {
                    return Err(Error::Config(format!(
                        "DEFAULT_SCALE_PERCENT must be a positive integer, got {}",
                        value
                    )))
                }
            },
            None => defaults.default_scale_percent,
        };

        Ok(Self {
            output_dir,
            default_format,
            default_quality,
            default_scale_percent,
        })
    }
}
