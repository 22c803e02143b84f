//! Application orchestration for a single resize or auto-predict run.

use crate::image::{ImageProcessor, ResizeService};
use crate::models::Config;
use crate::report::{download_file_name, Report};
use crate::session::{Session, Settings};
use crate::{Error, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use uuid::Uuid;

/// What to do with the uploaded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// One resize with the session settings.
    Resize,
    /// Search for the best settings under a target size in kilobytes.
    AutoPredict { target_kb: f64 },
}

/// Loads an input file into a session, runs it and writes the output.
pub struct App {
    session: Session,
    output_dir: PathBuf,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub resizer: Box<dyn ResizeService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, settings: Settings, output_dir: PathBuf) -> Self {
        Self {
            session: Session::new(services.resizer, settings),
            output_dir,
        }
    }

    /// Construct an app writing into a fresh `<OUTPUT_DIR>/<date>_<uuid>` directory.
    ///
    /// The directory is created only once there is output to write.
    pub fn new(config: &Config, settings: Settings) -> Result<Self> {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let run_id = Uuid::new_v4();
        let output_dir = config.output_dir.join(format!("{}_{}", date, run_id));

        Ok(Self::with_services(
            AppServices {
                resizer: Box::new(ImageProcessor::new()),
            },
            settings,
            output_dir,
        ))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn run(&mut self, input: &Path, mode: Mode) -> Result<Report> {
        info!("Reading {}", input.display());
        let bytes = tokio::fs::read(input).await?;

        let pending = self.session.begin_upload(bytes);
        self.session.complete_upload(pending).await.map_err(|e| {
            error!("Failed to decode {}: {}", input.display(), e);
            e
        })?;

        let outcome = match mode {
            Mode::Resize => {
                self.session.resize().await?;
                None
            }
            Mode::AutoPredict { target_kb } => Some(self.session.auto_predict(target_kb).await?),
        };

        let (source, result) = match (self.session.source(), self.session.result()) {
            (Some(source), Some(result)) => (source, result),
            _ => {
                return Err(Error::Invariant(
                    "session has no result after a successful run".to_string(),
                ))
            }
        };

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output_path = self.output_dir.join(download_file_name(result.format));
        tokio::fs::write(&output_path, &result.bytes).await?;
        info!("Saved output at: {}", output_path.display());

        let mut report = Report::new(source, result, output_path);
        if let Some(outcome) = &outcome {
            report = report.with_prediction(outcome);
        }
        info!("{}", report.summary_line());

        Ok(report)
    }
}
