use super::{resolve_dimensions, ResizeService};
use crate::models::{ResizeRequest, ResizeResult, SourceImage};
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

type SizeModel = dyn Fn(u32, u32, f64) -> usize + Send + Sync;
type RejectModel = dyn Fn(u32, u32, f64) -> bool + Send + Sync;

/// One recorded call to [`MockImageProcessor::resize`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeCall {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub quality: f64,
}

/// Deterministic stand-in for [`super::ImageProcessor`]: resolves dimensions
/// the same way but returns a zero-filled payload whose length comes from a
/// size model instead of a real encoder.
#[derive(Clone)]
pub struct MockImageProcessor {
    calls: Arc<Mutex<Vec<ResizeCall>>>,
    size_model: Arc<SizeModel>,
    reject_model: Arc<RejectModel>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            // roughly one byte per pixel at full quality
            size_model: Arc::new(|w: u32, h: u32, q: f64| {
                (w as f64 * h as f64 * q).round() as usize
            }),
            reject_model: Arc::new(|_: u32, _: u32, _: f64| false),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_size_model<F>(mut self, model: F) -> Self
    where
        F: Fn(u32, u32, f64) -> usize + Send + Sync + 'static,
    {
        self.size_model = Arc::new(model);
        self
    }

    /// Reject outputs matching `model` with `UnsupportedFormat`, as an encoder
    /// does for frames it cannot represent.
    pub fn with_unsupported_when<F>(mut self, model: F) -> Self
    where
        F: Fn(u32, u32, f64) -> bool + Send + Sync + 'static,
    {
        self.reject_model = Arc::new(model);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<ResizeCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResizeService for MockImageProcessor {
    async fn resize(&self, source: &SourceImage, request: &ResizeRequest) -> Result<ResizeResult> {
        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Image(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }

        request.validate_quality()?;
        let (width, height) = resolve_dimensions(source.width(), source.height(), request)?;

        self.calls.lock().unwrap().push(ResizeCall {
            width,
            height,
            scale: request.scale,
            quality: request.quality,
        });

        if (self.reject_model)(width, height, request.quality) {
            return Err(crate::Error::UnsupportedFormat(format!(
                "{}: cannot encode {}x{}",
                request.format, width, height
            )));
        }

        let len = (self.size_model)(width, height, request.quality);

        Ok(ResizeResult {
            bytes: vec![0; len],
            width,
            height,
            format: request.format,
            quality: request.quality,
        })
    }
}
