use super::config::PipelineConfig;
use super::memory;
use super::progress::{CancellationToken, ProgressObserver};
use super::settings::{coerce_png_filename, BackgroundFill, OutputSettings};
use super::types::{
    ExportArtifact, IngestReport, PipelineState, SegmentReport, SegmentedImage, SourceImage,
    WorkingImage,
};
use crate::error::{PipelineError, Result};
use crate::imaging;
use crate::segmentation::BackgroundRemover;
use image::{DynamicImage, RgbaImage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

type SharedRemover = Arc<Mutex<Box<dyn BackgroundRemover>>>;

/// Per-session pipeline: upload -> downscale -> segment -> export.
///
/// Holds the cached intermediates for the current upload so that changing
/// output settings never re-runs the model. One controller per session;
/// nothing is shared between sessions except the remover handed in.
pub struct PipelineController {
    config: PipelineConfig,
    remover: SharedRemover,
    cancel: CancellationToken,
    state: PipelineState,
    upload_name: Option<String>,
    source: Option<SourceImage>,
    working: Option<WorkingImage>,
    segmented: Option<SegmentedImage>,
}

impl PipelineController {
    pub fn new(remover: Box<dyn BackgroundRemover>) -> Self {
        Self::with_config(remover, PipelineConfig::default())
    }

    pub fn with_config(remover: Box<dyn BackgroundRemover>, config: PipelineConfig) -> Self {
        Self {
            config,
            remover: Arc::new(Mutex::new(remover)),
            cancel: CancellationToken::new(),
            state: PipelineState::Empty,
            upload_name: None,
            source: None,
            working: None,
            segmented: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle for requesting cancellation from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn upload_name(&self) -> Option<&str> {
        self.upload_name.as_deref()
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn working(&self) -> Option<&WorkingImage> {
        self.working.as_ref()
    }

    pub fn segmented(&self) -> Option<&SegmentedImage> {
        self.segmented.as_ref()
    }

    /// Decode a new upload and prepare its working copy.
    ///
    /// A successful ingest discards everything cached for the previous
    /// upload. A failed one leaves the session exactly as it was.
    pub fn ingest(&mut self, bytes: &[u8], filename: &str) -> Result<IngestReport> {
        let _span = tracing::debug_span!("ingest", filename).entered();

        if !imaging::is_supported_upload(filename) {
            return Err(PipelineError::Decode(format!(
                "'{}' is not a supported upload, expected one of: {}",
                filename,
                imaging::SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let decoded = imaging::decode(bytes)?;

        self.reset();
        self.upload_name = Some(filename.to_string());
        self.source = Some(SourceImage::new(decoded));
        self.transition(PipelineState::Ingested);

        let working = self.prepare()?;
        let report = IngestReport {
            source: self.source.as_ref().map(SourceImage::dimensions).unwrap_or_default(),
            working: working.dimensions(),
        };
        self.working = Some(working);
        self.transition(PipelineState::Prepared);

        tracing::info!(
            "Ingested {} ({}x{}, working copy {}x{})",
            filename,
            report.source.0,
            report.source.1,
            report.working.0,
            report.working.1
        );

        Ok(report)
    }

    /// Run the background remover on the working image and cache the result.
    ///
    /// The model runs on a worker thread while this call waits in ticks,
    /// polling the cancellation token. A cancelled wait returns immediately
    /// and the worker's eventual result is dropped. Model calls that take
    /// longer than `config.timeout` are reported as timeouts and not cached.
    ///
    /// Whatever the outcome, a previously cached segmentation is only
    /// replaced on success.
    pub fn segment(&mut self, observer: &mut dyn ProgressObserver) -> Result<SegmentReport> {
        let _span = tracing::debug_span!("segment").entered();

        let source_dims = self
            .source
            .as_ref()
            .map(SourceImage::dimensions)
            .ok_or_else(|| PipelineError::Processing("no image has been uploaded".to_string()))?;

        self.cancel.reset();

        let memory_warning = memory::low_memory_warning(
            memory::available_memory_mb(),
            self.config.low_memory_threshold_mb,
        );
        if let Some(message) = &memory_warning {
            observer.warning(message);
        }

        let working = match self.working.take() {
            Some(working) => working,
            None => self.prepare()?,
        };
        let dimensions = working.dimensions();

        let estimate = self
            .config
            .estimate_duration(source_dims.0, source_dims.1);
        observer.started(estimate);

        let start = Instant::now();
        let outcome = self.wait_for_remover(working, start, observer);
        observer.finished(start.elapsed());

        let (segmented, elapsed) = match outcome {
            Ok(finished) => finished,
            Err(PipelineError::Cancelled) => {
                tracing::warn!("Background removal cancelled");
                return Err(PipelineError::Cancelled);
            }
            Err(err) => {
                tracing::error!("Background removal failed: {}", err);
                return Err(err);
            }
        };

        // measured from when the model call itself started, not from the
        // wait for an earlier abandoned call to release the remover
        if elapsed > self.config.timeout {
            tracing::error!(
                "Background removal finished after {:.1}s, over the {}s limit",
                elapsed.as_secs_f64(),
                self.config.timeout.as_secs()
            );
            return Err(PipelineError::Timeout { elapsed });
        }

        if segmented.dimensions() != dimensions {
            return Err(PipelineError::Model(format!(
                "remover returned {}x{} for a {}x{} input",
                segmented.width(),
                segmented.height(),
                dimensions.0,
                dimensions.1
            )));
        }

        tracing::info!(
            "Background removed in {:.2}s ({}x{})",
            elapsed.as_secs_f64(),
            dimensions.0,
            dimensions.1
        );

        self.segmented = Some(SegmentedImage::new(segmented));
        self.transition(PipelineState::Segmented);

        Ok(SegmentReport {
            elapsed,
            estimate,
            dimensions,
            memory_warning,
        })
    }

    /// Apply output settings to the cached segmentation and encode it.
    ///
    /// Returns `Ok(None)` when nothing has been segmented yet. Pure with
    /// respect to the cache: the same settings always give the same bytes.
    pub fn render_export(&mut self, settings: &OutputSettings) -> Result<Option<ExportArtifact>> {
        let _span = tracing::debug_span!("render_export").entered();

        settings.validate()?;

        let Some(segmented) = &self.segmented else {
            return Ok(None);
        };

        let scaled = imaging::scale_by(segmented.image(), settings.scale_factor());
        let (width, height) = scaled.dimensions();

        let output = match settings.background {
            BackgroundFill::White => {
                DynamicImage::ImageRgb8(imaging::composite_over(&scaled, imaging::WHITE))
            }
            BackgroundFill::Transparent => DynamicImage::ImageRgba8(scaled),
        };

        let bytes = imaging::encode_png(&output, settings.quality)?;
        let artifact = ExportArtifact {
            bytes,
            width,
            height,
            filename: coerce_png_filename(&settings.filename),
        };

        tracing::debug!(
            "Exported {} with {} background at {}% / quality {}",
            artifact.filename,
            settings.background,
            settings.scale_percent,
            settings.quality
        );

        self.transition(PipelineState::Exported);
        Ok(Some(artifact))
    }

    fn prepare(&self) -> Result<WorkingImage> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| PipelineError::Processing("no image has been uploaded".to_string()))?;
        Ok(WorkingImage::new(imaging::fit_within(
            source.image(),
            self.config.max_working_dimension,
        )))
    }

    /// Returns the cut-out together with how long the model call took
    fn wait_for_remover(
        &self,
        working: WorkingImage,
        start: Instant,
        observer: &mut dyn ProgressObserver,
    ) -> Result<(RgbaImage, Duration)> {
        let (tx, rx) = mpsc::channel();
        let remover = Arc::clone(&self.remover);
        let abandoned = Arc::new(AtomicBool::new(false));
        let worker_abandoned = Arc::clone(&abandoned);

        thread::Builder::new()
            .name("bg-remover".to_string())
            .spawn(move || {
                let mut remover = remover.lock().unwrap_or_else(PoisonError::into_inner);
                if worker_abandoned.load(Ordering::SeqCst) {
                    tracing::debug!("Skipping abandoned background removal");
                    return;
                }
                let (width, height) = working.dimensions();
                tracing::debug!("Running {} on {}x{}", remover.name(), width, height);
                let call_start = Instant::now();
                let outcome = remover.remove_background(working.image());
                // the receiver is gone if the wait was cancelled
                let _ = tx.send((outcome, call_start.elapsed()));
            })
            .map_err(|e| PipelineError::Processing(format!("failed to start worker: {e}")))?;

        let abandon = || -> Result<(RgbaImage, Duration)> {
            abandoned.store(true, Ordering::SeqCst);
            Err(PipelineError::Cancelled)
        };

        loop {
            match rx.recv_timeout(self.config.tick_interval) {
                Ok((outcome, call_elapsed)) => {
                    if self.cancel.is_cancelled() {
                        return abandon();
                    }
                    return outcome
                        .map(|segmented| (segmented, call_elapsed))
                        .map_err(|e| PipelineError::Model(format!("{e:#}")));
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.cancel.is_cancelled() {
                        return abandon();
                    }
                    observer.tick(start.elapsed());
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(PipelineError::Processing(
                        "background remover exited without a result".to_string(),
                    ));
                }
            }
        }
    }

    fn reset(&mut self) {
        self.cancel.reset();
        self.upload_name = None;
        self.source = None;
        self.working = None;
        self.segmented = None;
        self.transition(PipelineState::Empty);
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            tracing::debug!("Pipeline {} -> {}", self.state, next);
        }
        self.state = next;
    }
}
