use anyhow::{bail, Context, Result};
use bg_remover::pipeline::{
    BackgroundFill, ExportArtifact, LogProgress, OutputSettings, PipelineController,
    DEFAULT_FILENAME, DEFAULT_QUALITY, DEFAULT_SCALE_PERCENT,
};
use bg_remover::{segmentation, PipelineError};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to process (JPG, JPEG or PNG)
    input: PathBuf,

    /// Path to the segmentation model (U2Net ONNX file)
    #[arg(short, long)]
    model: PathBuf,

    /// Background fill: Transparent or White
    #[arg(short, long, default_value_t = BackgroundFill::Transparent)]
    background: BackgroundFill,

    /// Output size in percent (10-100, step 10)
    #[arg(short, long, default_value_t = DEFAULT_SCALE_PERCENT,
          value_parser = clap::value_parser!(u8).range(10..=100))]
    scale: u8,

    /// Output quality (10-100, step 5); higher means larger files
    #[arg(short, long, default_value_t = DEFAULT_QUALITY,
          value_parser = clap::value_parser!(u8).range(10..=100))]
    quality: u8,

    /// Download filename; ".png" is appended when missing
    #[arg(short, long, default_value = DEFAULT_FILENAME)]
    filename: String,

    /// Directory to write the result into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Background remover starting");

    let settings = OutputSettings::new(args.background, args.scale, args.quality, &args.filename)
        .context("Invalid output settings")?;
    tracing::info!(
        "Output: {} background, {}% size, quality {}",
        settings.background,
        settings.scale_percent,
        settings.quality
    );

    tracing::info!("Loading segmentation model from {}", args.model.display());
    let remover = segmentation::create_default_remover(&args.model)
        .context("Failed to load segmentation model")?;

    let mut controller = PipelineController::new(remover);

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let upload_name = args
        .input
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    let artifact = match run(&mut controller, &bytes, upload_name, &settings) {
        Ok(artifact) => artifact,
        Err(err) => {
            report(&err);
            bail!("background removal failed");
        }
    };
    tracing::info!("{}", artifact.summary());

    // only the file name part of the download name is honoured
    let filename = Path::new(&artifact.filename)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILENAME));
    let path = args.output_dir.join(filename);
    std::fs::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Saved {} ({})", path.display(), ExportArtifact::MIME);

    Ok(())
}

fn run(
    controller: &mut PipelineController,
    bytes: &[u8],
    upload_name: &str,
    settings: &OutputSettings,
) -> Result<ExportArtifact, PipelineError> {
    let ingest = controller.ingest(bytes, upload_name)?;
    tracing::info!("Original image: {}x{}", ingest.source.0, ingest.source.1);
    if ingest.downscaled() {
        tracing::info!(
            "Resized to {}x{} for processing",
            ingest.working.0,
            ingest.working.1
        );
    }

    let mut progress = LogProgress::new(Duration::from_secs(1));
    controller.segment(&mut progress)?;
    tracing::info!("Background removed successfully!");

    controller.render_export(settings)?.ok_or_else(|| {
        PipelineError::Processing("no segmentation available to export".to_string())
    })
}

/// Show the user-facing message for a failure; keep the detail in the logs
fn report(err: &PipelineError) {
    match err.user_message() {
        Some(message) => tracing::error!("{}", message),
        None => tracing::warn!("Background removal cancelled."),
    }
    if let PipelineError::Processing(_) = err {
        tracing::debug!("{:?}", err);
    }
}
