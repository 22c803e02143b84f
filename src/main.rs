use anyhow::Result;
use clap::Parser;
use image_shrink::app::{App, Mode};
use image_shrink::models::{Config, OutputFormat};
use image_shrink::session::Settings;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "image-shrink")]
#[command(about = "Resize and compress an image, optionally to a target file size")]
struct CliArgs {
    /// Image file to process.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Target width in pixels. Height follows the aspect ratio if omitted.
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels. Width follows the aspect ratio if omitted.
    #[arg(long)]
    height: Option<u32>,

    /// Scale percentage, used only when neither width nor height is given.
    #[arg(long, value_parser = parse_scale_arg)]
    scale: Option<u32>,

    /// Output format: png, jpeg (jpg) or webp.
    #[arg(long, value_parser = parse_format_arg)]
    format: Option<OutputFormat>,

    /// Encode quality in (0, 1].
    #[arg(long, value_parser = parse_quality_arg)]
    quality: Option<f64>,

    /// Search for the best scale/quality under this size in KB (at least 10).
    #[arg(long, value_name = "KB")]
    target_kb: Option<f64>,

    /// Root directory for run output (overrides OUTPUT_DIR).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print a JSON report to stdout.
    #[arg(long)]
    json: bool,
}

fn parse_format_arg(input: &str) -> std::result::Result<OutputFormat, String> {
    input
        .parse()
        .map_err(|_| format!("Invalid format '{}'. Expected one of: png, jpeg, jpg, webp", input))
}

fn parse_quality_arg(input: &str) -> std::result::Result<f64, String> {
    match input.parse::<f64>() {
        Ok(q) if q > 0.0 && q <= 1.0 => Ok(q),
        _ => Err(format!("Invalid quality '{}'. Expected a number in (0, 1]", input)),
    }
}

fn parse_scale_arg(input: &str) -> std::result::Result<u32, String> {
    match input.parse::<u32>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(format!("Invalid scale '{}'. Expected a positive percentage", input)),
    }
}

impl CliArgs {
    fn settings(&self, config: &Config) -> Settings {
        Settings {
            width: self.width,
            height: self.height,
            scale_percent: self.scale.unwrap_or(config.default_scale_percent),
            format: self.format.unwrap_or(config.default_format),
            quality: self.quality.unwrap_or(config.default_quality),
        }
    }

    fn mode(&self) -> Mode {
        match self.target_kb {
            Some(target_kb) => Mode::AutoPredict { target_kb },
            None => Mode::Resize,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_shrink=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }

    info!("Starting image-shrink");

    let mut app = match App::new(&config, args.settings(&config)) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    match app.run(&args.input, args.mode()).await {
        Ok(report) => {
            if args.json {
                println!("{}", report.to_json()?);
            }
            info!("Done");
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
