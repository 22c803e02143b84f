//! Best-settings search
//!
//! Walks a fixed (scale, quality) grid from the largest scale and highest
//! quality downward and accepts the first pair whose encoded output fits the
//! target size. Quality is exhausted before scale is reduced, so the search
//! keeps dimensions whenever any tested quality fits.

use crate::image::ResizeService;
use crate::models::{OutputFormat, ResizeRequest, ResizeResult, SourceImage, TargetSize};
use crate::{Error, Result};
use tracing::{debug, info, warn};

/// Scale steps, largest first. Indexed by integer step to avoid float drift.
pub const SCALE_STEPS: [f64; 7] = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4];

/// Quality steps, highest first.
pub const QUALITY_STEPS: [f64; 6] = [0.9, 0.8, 0.7, 0.6, 0.5, 0.4];

/// Worst-case number of encodes for one search.
pub const MAX_ATTEMPTS: usize = SCALE_STEPS.len() * QUALITY_STEPS.len();

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub scale: f64,
    pub quality: f64,
    /// Achieved output size, which may be well under the target.
    pub bytes: u64,
    pub target: TargetSize,
    /// Number of encodes performed, including the accepted one.
    pub attempts: usize,
    pub result: ResizeResult,
}

/// Grid points in visiting order as `(scale, quality)`.
pub fn grid() -> impl Iterator<Item = (f64, f64)> {
    (0..SCALE_STEPS.len()).flat_map(|s| {
        (0..QUALITY_STEPS.len()).map(move |q| (SCALE_STEPS[s], QUALITY_STEPS[q]))
    })
}

/// Find the first grid point whose output is at most `target` bytes.
///
/// Grid points are tried strictly one after another. A grid point the
/// encoder cannot produce counts as not fitting. Returns `SearchExhausted`
/// when no grid point fits; the caller never sees a partial or stale result.
pub async fn search(
    service: &dyn ResizeService,
    source: &SourceImage,
    target: TargetSize,
    format: OutputFormat,
) -> Result<SearchOutcome> {
    info!(
        "Searching for settings under {} bytes ({} format, source {}x{})",
        target.bytes(),
        format,
        source.width(),
        source.height()
    );

    let mut attempts = 0;
    let mut smallest: Option<u64> = None;

    for (scale, quality) in grid() {
        attempts += 1;
        let request = ResizeRequest::new(format)
            .with_scale(scale)
            .with_quality(quality);

        let result = match service.resize(source, &request).await {
            Ok(result) => result,
            Err(e @ (Error::UnsupportedFormat(_) | Error::InvalidDimensions { .. })) => {
                debug!(
                    "Attempt {}/{}: scale {:.1}, quality {:.1} cannot be encoded: {}",
                    attempts, MAX_ATTEMPTS, scale, quality, e
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        let bytes = result.byte_len();
        debug!(
            "Attempt {}/{}: scale {:.1}, quality {:.1} -> {} bytes",
            attempts, MAX_ATTEMPTS, scale, quality, bytes
        );

        if bytes <= target.bytes() {
            info!(
                "Accepted scale {:.0}% quality {:.0}% at {} bytes after {} attempts",
                scale * 100.0,
                quality * 100.0,
                bytes,
                attempts
            );
            return Ok(SearchOutcome {
                scale,
                quality,
                bytes,
                target,
                attempts,
                result,
            });
        }

        smallest = Some(smallest.map_or(bytes, |s| s.min(bytes)));
    }

    let smallest_bytes = smallest.unwrap_or(0);
    warn!(
        "No combination met the {} byte target; smallest output was {} bytes",
        target.bytes(),
        smallest_bytes
    );
    Err(Error::SearchExhausted {
        attempts,
        smallest_bytes,
    })
}
