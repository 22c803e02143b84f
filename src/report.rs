//! Human-readable summaries of a resize or search run.

use crate::models::{OutputFormat, ResizeResult, SourceImage};
use crate::search::SearchOutcome;
use crate::Result;
use serde::Serialize;
use std::path::PathBuf;

const DOWNLOAD_STEM: &str = "optimized-image";

/// File name offered for the encoded output, e.g. `optimized-image.jpg`.
pub fn download_file_name(format: OutputFormat) -> String {
    format!("{}.{}", DOWNLOAD_STEM, format.extension())
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputSummary {
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
    pub format: OutputFormat,
    pub mime_type: &'static str,
    pub quality: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionSummary {
    pub scale: f64,
    pub quality: f64,
    pub target_bytes: u64,
    pub attempts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub source: SourceSummary,
    pub output: OutputSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionSummary>,
    pub output_path: PathBuf,
}

impl Report {
    pub fn new(source: &SourceImage, result: &ResizeResult, output_path: PathBuf) -> Self {
        Self {
            source: SourceSummary {
                width: source.width(),
                height: source.height(),
                bytes: source.byte_size(),
                format: source.detected_format(),
            },
            output: OutputSummary {
                width: result.width,
                height: result.height,
                bytes: result.byte_len(),
                format: result.format,
                mime_type: result.format.mime_type(),
                quality: result.quality,
            },
            prediction: None,
            output_path,
        }
    }

    pub fn with_prediction(mut self, outcome: &SearchOutcome) -> Self {
        self.prediction = Some(PredictionSummary {
            scale: outcome.scale,
            quality: outcome.quality,
            target_bytes: outcome.target.bytes(),
            attempts: outcome.attempts,
        });
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "Dimensions: {} × {} | Size: {} | Quality: {:.0}%",
            self.output.width,
            self.output.height,
            format_file_size(self.output.bytes),
            self.output.quality * 100.0
        );
        if let Some(prediction) = &self.prediction {
            line.push_str(&format!(
                " | Auto-Predicted: {:.2} KB (target {:.2} KB) | Scale: {:.0}%",
                self.output.bytes as f64 / 1024.0,
                prediction.target_bytes as f64 / 1024.0,
                prediction.scale * 100.0
            ));
        }
        line
    }
}
