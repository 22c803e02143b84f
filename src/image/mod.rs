//! Image resizing and encoding
//!
//! Resamples a decoded source to the requested dimensions and encodes it as
//! PNG, JPEG or WebP at a given quality.

pub mod decode;
pub mod dimensions;
pub mod mock;
pub mod processor;

pub use decode::{begin_decode, detect_format, PendingDecode};
pub use dimensions::resolve_dimensions;
pub use mock::MockImageProcessor;
pub use processor::ImageProcessor;

use crate::models::{ResizeRequest, ResizeResult, SourceImage};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ResizeService: Send + Sync {
    /// Resize `source` per `request` and encode the result.
    ///
    /// Fails with `InvalidDimensions` when the resolved size is empty and with
    /// `InvalidQuality`/`UnsupportedFormat` when the encode cannot be done.
    async fn resize(&self, source: &SourceImage, request: &ResizeRequest) -> Result<ResizeResult>;
}
