//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressObserver`] for monitoring an extraction
//! run, [`ProgressEvent`] for per-frame progress snapshots, and
//! [`CancellationToken`] for cooperative cancellation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesplit::{
//!     ExtractionPipeline, FramesplitError, PipelineOptions, ProgressEvent,
//!     ProgressObserver,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressObserver for PrintProgress {
//!     fn on_progress(&self, event: &ProgressEvent) {
//!         if let Some(percent) = event.percent {
//!             println!("{percent:.1}% complete");
//!         }
//!     }
//! }
//!
//! let options = PipelineOptions::new().with_progress(Arc::new(PrintProgress));
//! let pipeline = ExtractionPipeline::new(options);
//! pipeline.run("input.mp4", "extracted_frames")?;
//! # Ok::<(), FramesplitError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of extraction progress.
///
/// Delivered to [`ProgressObserver::on_progress`] at least once per submitted
/// frame. Progress is measured against frames *submitted* to the worker pool,
/// not frames already persisted — completion of in-flight writes is only
/// synchronized at the end of the run.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Frames submitted to the worker pool so far.
    pub frames_submitted: u64,
    /// Total frames expected, if the container reported a usable count.
    ///
    /// The hint comes from container metadata and may be approximate.
    pub total_hint: Option<u64>,
    /// Completion percentage (0.0 – 100.0), clamped to 100.
    ///
    /// `None` when the total is unknown — progress is indeterminate and
    /// observers should render a spinner rather than a percentage.
    pub percent: Option<f32>,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub eta: Option<Duration>,
}

/// Trait for receiving progress updates during an extraction run.
///
/// Implementations must be [`Send`] and [`Sync`]. The pipeline invokes
/// `on_progress` only from its own submission thread, never from persistence
/// workers; sinks that feed a UI should forward events through their own
/// event-loop channel rather than mutating UI state here.
///
/// Observers are **infallible** — they observe but cannot halt the run. Use
/// [`CancellationToken`] to request a stop.
pub trait ProgressObserver: Send + Sync {
    /// Called at least once per submitted frame.
    ///
    /// Must be cheap and idempotent; the pipeline makes no guarantee about
    /// call frequency beyond the per-frame lower bound.
    fn on_progress(&self, event: &ProgressEvent);
}

/// A no-op observer that discards all progress notifications.
///
/// This is the default when no observer is configured.
pub(crate) struct NoOpProgress;

impl ProgressObserver for NoOpProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to request
/// cancellation. The submission loop checks
/// [`is_cancelled`](CancellationToken::is_cancelled) before reading each
/// frame; already-submitted jobs are drained, not abandoned.
///
/// # Example
///
/// ```
/// use framesplit::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// // From another thread (or a signal handler, etc.):
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal helper that tracks submission counts and emits observer events.
pub(crate) struct ProgressTracker {
    observer: Arc<dyn ProgressObserver>,
    total_hint: u64,
    submitted: u64,
    started: Instant,
}

impl ProgressTracker {
    /// Create a tracker. `total_hint` of 0 means the total is unknown.
    pub(crate) fn new(observer: Arc<dyn ProgressObserver>, total_hint: u64) -> Self {
        Self {
            observer,
            total_hint,
            submitted: 0,
            started: Instant::now(),
        }
    }

    /// Record one submitted frame and fire the observer.
    pub(crate) fn advance(&mut self) {
        self.submitted += 1;
        self.report();
    }

    fn report(&self) {
        let elapsed = self.started.elapsed();

        let total_hint = (self.total_hint > 0).then_some(self.total_hint);

        let percent = total_hint
            .map(|total| (self.submitted as f32 / total as f32) * 100.0)
            .map(|percent| percent.min(100.0));

        let eta = match total_hint {
            Some(total) if self.submitted > 0 => {
                let remaining = total.saturating_sub(self.submitted);
                let per_frame = elapsed / self.submitted as u32;
                Some(per_frame * remaining as u32)
            }
            _ => None,
        };

        let event = ProgressEvent {
            frames_submitted: self.submitted,
            total_hint,
            percent,
            elapsed,
            eta,
        };

        self.observer.on_progress(&event);
    }
}
