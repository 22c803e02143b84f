//! Upload session state
//!
//! Holds the current source image, the user's resize settings and the most
//! recent result, and runs the resize and auto-predict operations against
//! them.

use crate::image::{begin_decode, PendingDecode, ResizeService};
use crate::models::{
    OutputFormat, ResizeRequest, ResizeResult, SourceImage, TargetSize, DEFAULT_QUALITY,
};
use crate::search::{self, SearchOutcome};
use crate::{Error, Result};
use tracing::{info, warn};

/// User-adjustable settings applied to every manual resize.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Used only when neither width nor height is set.
    pub scale_percent: u32,
    pub format: OutputFormat,
    pub quality: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            scale_percent: 100,
            format: OutputFormat::Jpeg,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl Settings {
    pub fn to_request(&self) -> ResizeRequest {
        ResizeRequest {
            width: self.width,
            height: self.height,
            scale: self.scale_percent as f64 / 100.0,
            format: self.format,
            quality: self.quality,
        }
    }
}

pub struct Session {
    resizer: Box<dyn ResizeService>,
    settings: Settings,
    source: Option<SourceImage>,
    result: Option<ResizeResult>,
}

impl Session {
    pub fn new(resizer: Box<dyn ResizeService>, settings: Settings) -> Self {
        Self {
            resizer,
            settings,
            source: None,
            result: None,
        }
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn result(&self) -> Option<&ResizeResult> {
        self.result.as_ref()
    }

    /// Start decoding an upload. The session is untouched until
    /// [`Session::complete_upload`] is called with the returned handle.
    pub fn begin_upload(&self, bytes: Vec<u8>) -> PendingDecode {
        begin_decode(bytes)
    }

    /// Install the decoded upload, replacing any previous source and
    /// discarding the previous result. A failed decode leaves the session
    /// with no source.
    pub async fn complete_upload(&mut self, pending: PendingDecode) -> Result<&SourceImage> {
        self.result = None;
        self.source = None;

        let source = pending.finish().await?;
        info!(
            "Loaded source image {}x{} ({} bytes)",
            source.width(),
            source.height(),
            source.byte_size()
        );
        Ok(self.source.insert(source))
    }

    /// Decode and install an upload in one step.
    pub async fn upload(&mut self, bytes: Vec<u8>) -> Result<&SourceImage> {
        let pending = self.begin_upload(bytes);
        self.complete_upload(pending).await
    }

    /// Resize the current source with the current settings.
    pub async fn resize(&mut self) -> Result<&ResizeResult> {
        let request = self.settings.to_request();
        self.resize_with(&request).await
    }

    /// Resize the current source with an explicit request.
    pub async fn resize_with(&mut self, request: &ResizeRequest) -> Result<&ResizeResult> {
        let source = self.source.as_ref().ok_or(Error::NoSourceImage)?;

        match self.resizer.resize(source, request).await {
            Ok(result) => {
                info!(
                    "Resized to {}x{} {} ({} bytes, quality {:.0}%)",
                    result.width,
                    result.height,
                    result.format,
                    result.byte_len(),
                    result.quality * 100.0
                );
                Ok(self.result.insert(result))
            }
            Err(e) => {
                self.result = None;
                Err(e)
            }
        }
    }

    /// Run the best-settings search for `target_kb` kilobytes using the
    /// currently selected format.
    ///
    /// On success the accepted output becomes the session result. When no
    /// grid point fits, the result is cleared and `SearchExhausted` returned.
    pub async fn auto_predict(&mut self, target_kb: f64) -> Result<SearchOutcome> {
        let source = self.source.as_ref().ok_or(Error::NoSourceImage)?;
        let target = TargetSize::from_kb(target_kb)?;

        match search::search(&*self.resizer, source, target, self.settings.format).await {
            Ok(outcome) => {
                self.result = Some(outcome.result.clone());
                Ok(outcome)
            }
            Err(e) => {
                warn!("Auto-predict failed: {}", e);
                self.result = None;
                Err(e)
            }
        }
    }
}
