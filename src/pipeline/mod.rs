//! Session pipeline: ingest an upload, bound it for the model, segment it
//! once, then render exports from the cached segmentation as often as the
//! output settings change.

mod config;
mod controller;
mod memory;
mod progress;
mod settings;
mod types;

pub use config::PipelineConfig;
pub use controller::PipelineController;
pub use memory::{available_memory_mb, low_memory_warning};
pub use progress::{CancellationToken, LogProgress, NoProgress, ProgressObserver};
pub use settings::{
    coerce_png_filename, BackgroundFill, OutputSettings, DEFAULT_FILENAME, DEFAULT_QUALITY,
    DEFAULT_SCALE_PERCENT,
};
pub use types::{
    ExportArtifact, IngestReport, PipelineState, SegmentReport, SegmentedImage, SourceImage,
    WorkingImage,
};
