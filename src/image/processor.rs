use super::{resolve_dimensions, ResizeService};
use crate::models::{OutputFormat, ResizeRequest, ResizeResult, SourceImage};
use crate::{Error, Result};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError};
use std::sync::Arc;

/// Resizes with Lanczos3 resampling and encodes in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Map a (0, 1] quality onto the encoders' 1..=100 scale.
    fn percent_quality(quality: f64) -> u8 {
        (quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Encoder rejections (oversized frames, limits, bad parameters) mean the
    /// format cannot represent this output; everything else stays an image error.
    fn encode_error(format: OutputFormat, err: ImageError) -> Error {
        match err {
            ImageError::Encoding(_)
            | ImageError::Limits(_)
            | ImageError::Parameter(_)
            | ImageError::Unsupported(_) => {
                Error::UnsupportedFormat(format!("{}: {}", format, err))
            }
            other => Error::Image(other),
        }
    }

    fn encode(image: &DynamicImage, format: OutputFormat, quality: f64) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = image.to_rgb8();
                let (w, h) = rgb.dimensions();
                let encoder =
                    JpegEncoder::new_with_quality(&mut buf, Self::percent_quality(quality));
                encoder
                    .write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                    .map_err(|e| Self::encode_error(format, e))?;
            }
            OutputFormat::Png => {
                let rgba = image.to_rgba8();
                let (w, h) = rgba.dimensions();
                PngEncoder::new(&mut buf)
                    .write_image(rgba.as_raw(), w, h, ExtendedColorType::Rgba8)
                    .map_err(|e| Self::encode_error(format, e))?;
            }
            OutputFormat::Webp => {
                let rgba = image.to_rgba8();
                let (w, h) = rgba.dimensions();
                let encoded = webp::Encoder::from_rgba(rgba.as_raw(), w, h)
                    .encode_simple(false, Self::percent_quality(quality) as f32)
                    .map_err(|e| {
                        Error::UnsupportedFormat(format!("webp: {:?} for {}x{}", e, w, h))
                    })?;
                buf.extend_from_slice(&encoded);
            }
        }
        Ok(buf)
    }

    fn resize_sync(
        image: Arc<DynamicImage>,
        width: u32,
        height: u32,
        format: OutputFormat,
        quality: f64,
    ) -> Result<ResizeResult> {
        let resized = if image.width() == width && image.height() == height {
            None
        } else {
            Some(image.resize_exact(width, height, FilterType::Lanczos3))
        };
        let bytes = Self::encode(resized.as_ref().unwrap_or(&*image), format, quality)?;

        Ok(ResizeResult {
            bytes,
            width,
            height,
            format,
            quality,
        })
    }
}

#[async_trait]
impl ResizeService for ImageProcessor {
    async fn resize(&self, source: &SourceImage, request: &ResizeRequest) -> Result<ResizeResult> {
        request.validate_quality()?;
        let (width, height) = resolve_dimensions(source.width(), source.height(), request)?;

        let image = source.shared_image();
        let format = request.format;
        let quality = request.quality;

        let result = tokio::task::spawn_blocking(move || {
            Self::resize_sync(image, width, height, format, quality)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Image processing task join error: {}", e)))??;

        tracing::debug!(
            "Encoded {}x{} {} at quality {:.2}: {} bytes",
            width,
            height,
            format,
            quality,
            result.byte_len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::detect_format;

    fn gradient_source(width: u32, height: u32) -> SourceImage {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        SourceImage::new(DynamicImage::ImageRgb8(img), 0, None)
    }

    #[tokio::test]
    async fn test_width_only_request() {
        let source = gradient_source(200, 100);
        let request = ResizeRequest::new(OutputFormat::Jpeg)
            .with_width(100)
            .with_quality(0.8);

        let result = ImageProcessor::new().resize(&source, &request).await.unwrap();

        assert_eq!((result.width, result.height), (100, 50));
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
        assert_eq!(detect_format(&result.bytes), Some(OutputFormat::Jpeg));
    }

    #[tokio::test]
    async fn test_scale_request() {
        let source = gradient_source(200, 100);
        let request = ResizeRequest::new(OutputFormat::Png).with_scale(0.5);

        let result = ImageProcessor::new().resize(&source, &request).await.unwrap();

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
        assert_eq!(result.byte_len(), result.bytes.len() as u64);
    }

    #[tokio::test]
    async fn test_explicit_dimensions_ignore_aspect() {
        let source = gradient_source(200, 100);
        let request = ResizeRequest::new(OutputFormat::Png)
            .with_width(30)
            .with_height(90);

        let result = ImageProcessor::new().resize(&source, &request).await.unwrap();

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (30, 90));
    }

    #[tokio::test]
    async fn test_webp_output() {
        let source = gradient_source(64, 32);
        let request = ResizeRequest::new(OutputFormat::Webp).with_quality(0.6);

        let result = ImageProcessor::new().resize(&source, &request).await.unwrap();

        assert_eq!(detect_format(&result.bytes), Some(OutputFormat::Webp));
        assert_eq!((result.width, result.height), (64, 32));
    }

    #[tokio::test]
    async fn test_resize_is_deterministic() {
        let source = gradient_source(120, 80);
        let processor = ImageProcessor::new();

        for format in [OutputFormat::Jpeg, OutputFormat::Png] {
            let request = ResizeRequest::new(format).with_scale(0.7).with_quality(0.6);
            let first = processor.resize(&source, &request).await.unwrap();
            let second = processor.resize(&source, &request).await.unwrap();
            assert_eq!(first.bytes, second.bytes);
        }
    }

    #[tokio::test]
    async fn test_lower_jpeg_quality_is_smaller() {
        let source = gradient_source(160, 120);
        let processor = ImageProcessor::new();

        let high = processor
            .resize(&source, &ResizeRequest::new(OutputFormat::Jpeg).with_quality(0.9))
            .await
            .unwrap();
        let low = processor
            .resize(&source, &ResizeRequest::new(OutputFormat::Jpeg).with_quality(0.4))
            .await
            .unwrap();

        assert!(low.byte_len() < high.byte_len());
    }

    #[tokio::test]
    async fn test_invalid_quality_rejected() {
        let source = gradient_source(10, 10);
        let request = ResizeRequest::new(OutputFormat::Jpeg).with_quality(0.0);

        let result = ImageProcessor::new().resize(&source, &request).await;
        assert!(matches!(result, Err(Error::InvalidQuality(_))));
    }

    #[tokio::test]
    async fn test_degenerate_dimensions_rejected() {
        let source = gradient_source(400, 1);
        let request = ResizeRequest::new(OutputFormat::Png).with_width(1);

        let result = ImageProcessor::new().resize(&source, &request).await;
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[tokio::test]
    async fn test_oversized_webp_is_unsupported() {
        // libwebp caps each side at 16383 px
        let source = SourceImage::new(DynamicImage::new_rgb8(16_400, 1), 0, None);
        let request = ResizeRequest::new(OutputFormat::Webp).with_quality(0.8);

        let result = ImageProcessor::new().resize(&source, &request).await;
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_oversized_jpeg_is_unsupported() {
        let source = SourceImage::new(DynamicImage::new_rgb8(70_000, 1), 0, None);
        let request = ResizeRequest::new(OutputFormat::Jpeg).with_quality(0.8);

        let result = ImageProcessor::new().resize(&source, &request).await;
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_io_errors_are_not_reported_as_unsupported() {
        let err = ImageProcessor::encode_error(
            OutputFormat::Png,
            ImageError::IoError(std::io::Error::other("disk")),
        );
        assert!(matches!(err, Error::Image(_)));
    }

    #[test]
    fn test_percent_quality_mapping() {
        assert_eq!(ImageProcessor::percent_quality(0.8), 80);
        assert_eq!(ImageProcessor::percent_quality(1.0), 100);
        assert_eq!(ImageProcessor::percent_quality(0.001), 1);
    }
}
