//! Two-phase decode of an uploaded file.
//!
//! [`begin_decode`] hands the bytes to a blocking worker and returns at once;
//! [`PendingDecode::finish`] waits for the decoded [`SourceImage`]. Nothing may
//! resize or search until `finish` has returned.

use crate::models::{OutputFormat, SourceImage};
use crate::{Error, Result};
use tokio::task::JoinHandle;

/// Sniff the container format from magic bytes.
pub fn detect_format(bytes: &[u8]) -> Option<OutputFormat> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some(OutputFormat::Jpeg),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some(OutputFormat::Png),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => {
            Some(OutputFormat::Webp)
        }
        _ => {
            tracing::debug!(
                "Unrecognized image signature (first 4 bytes: {:02X?})",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}

pub struct PendingDecode {
    handle: JoinHandle<Result<SourceImage>>,
}

impl PendingDecode {
    /// Wait for the decode to complete.
    pub async fn finish(self) -> Result<SourceImage> {
        self.handle
            .await
            .map_err(|e| Error::Invariant(format!("Decode task join error: {}", e)))?
    }
}

pub fn begin_decode(bytes: Vec<u8>) -> PendingDecode {
    let handle = tokio::task::spawn_blocking(move || decode_sync(&bytes));
    PendingDecode { handle }
}

fn decode_sync(bytes: &[u8]) -> Result<SourceImage> {
    if bytes.is_empty() {
        return Err(Error::Decode("empty input".to_string()));
    }

    let image = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::Decode(format!(
            "decoded image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let detected = detect_format(bytes);
    tracing::debug!(
        "Decoded {}x{} image ({} bytes, format {:?})",
        image.width(),
        image.height(),
        bytes.len(),
        detected
    );

    Ok(SourceImage::new(image, bytes.len() as u64, detected))
}
