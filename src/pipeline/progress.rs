use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Session-scoped cancellation flag.
///
/// Clones share the same flag, so a UI thread can hold one while the
/// controller polls another. Cancelling only abandons the wait; the model
/// call that is already running finishes on its own and is discarded.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Receives segmentation progress.
///
/// The model offers no progress feedback, so observers only learn the
/// advisory estimate and how long the call has been running. There is no
/// percentage to report.
pub trait ProgressObserver {
    /// Called once before the model call, with a size-based estimate
    fn started(&mut self, _estimate: Duration) {}

    /// Called on every wait tick while the model call is running
    fn tick(&mut self, _elapsed: Duration) {}

    /// Called once when the wait ends, whatever the outcome
    fn finished(&mut self, _elapsed: Duration) {}

    /// Advisory messages, such as a low memory warning
    fn warning(&mut self, _message: &str) {}
}

/// Observer that ignores everything
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Observer that reports through `tracing`, at most once per `every`
#[derive(Debug)]
pub struct LogProgress {
    every: Duration,
    last_logged: Duration,
    estimate: Duration,
}

impl LogProgress {
    pub fn new(every: Duration) -> Self {
        Self {
            every,
            last_logged: Duration::ZERO,
            estimate: Duration::ZERO,
        }
    }
}

impl ProgressObserver for LogProgress {
    fn started(&mut self, estimate: Duration) {
        self.estimate = estimate;
        self.last_logged = Duration::ZERO;
        tracing::info!(
            "Removing background (usually takes up to {}s)...",
            estimate.as_secs()
        );
    }

    fn tick(&mut self, elapsed: Duration) {
        if elapsed.saturating_sub(self.last_logged) < self.every {
            return;
        }
        self.last_logged = elapsed;
        if elapsed > self.estimate {
            tracing::info!(
                "Still removing background, {:.0}s elapsed (longer than the {}s estimate)",
                elapsed.as_secs_f64(),
                self.estimate.as_secs()
            );
        } else {
            tracing::info!(
                "Still removing background, {:.0}s elapsed",
                elapsed.as_secs_f64()
            );
        }
    }

    fn finished(&mut self, elapsed: Duration) {
        tracing::debug!("Segmentation wait ended after {:.2}s", elapsed.as_secs_f64());
    }

    fn warning(&mut self, message: &str) {
        tracing::warn!("{}", message);
    }
}
