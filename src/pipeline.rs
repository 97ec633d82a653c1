//! The extraction pipeline.
//!
//! [`ExtractionPipeline`] orchestrates one run per video: a single
//! sequential decode-and-submit loop feeding a bounded [`WorkerPool`] of
//! persistence workers, with per-frame progress reporting and a final
//! metrics record. Configuration is carried by [`PipelineOptions`], a
//! builder that threads the observer, cancellation token, and worker
//! settings through without polluting every signature.
//!
//! A run moves through `Idle → Running → (Completed | Failed)`:
//! a fatal open error fails the run before any work; per-frame write errors
//! are aggregated and fail the run at the end without aborting sibling jobs;
//! cancellation drains already-submitted jobs and then fails the run.
//!
//! # Example
//!
//! ```no_run
//! use framesplit::{ExtractionPipeline, FramesplitError, PipelineOptions};
//!
//! let pipeline = ExtractionPipeline::new(PipelineOptions::new().with_max_workers(8));
//! let record = pipeline.run("input.mp4", "extracted_frames")?;
//! println!("{} frames at {:.2} fps", record.frame_count, record.fps);
//! # Ok::<(), FramesplitError>(())
//! ```

use std::ffi::OsString;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::{
    error::FramesplitError,
    frame::PixelFormat,
    metrics::{MetricsCollector, MetricsRecord},
    persist::{FramePersister, ImagePersister},
    pool::{Job, WorkerPool},
    progress::{CancellationToken, NoOpProgress, ProgressObserver, ProgressTracker},
    source::{FrameSource, VideoSource},
};

/// Name of the per-run metrics file.
pub const METADATA_FILE: &str = "metadata.json";

/// Default number of persistence workers.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Configuration for an [`ExtractionPipeline`].
///
/// All fields have working defaults — a default-constructed options value
/// extracts PNG frames with 4 workers and no progress reporting.
#[derive(Clone)]
pub struct PipelineOptions {
    pub(crate) max_workers: usize,
    pub(crate) queue_depth: Option<usize>,
    pub(crate) extension: String,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) observer: Arc<dyn ProgressObserver>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) persister: Arc<dyn FramePersister>,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("max_workers", &self.max_workers)
            .field("queue_depth", &self.queue_depth)
            .field("extension", &self.extension)
            .field("pixel_format", &self.pixel_format)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOptions {
    /// Create options with default settings.
    ///
    /// Defaults: 4 workers, queue depth 2 × workers, PNG output, RGB8
    /// frames, no progress observer, no cancellation.
    pub fn new() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            queue_depth: None,
            extension: "png".to_string(),
            pixel_format: PixelFormat::Rgb8,
            observer: Arc::new(NoOpProgress),
            cancellation: None,
            persister: Arc::new(ImagePersister::new()),
        }
    }

    /// Set the number of persistence workers. Clamped to a minimum of 1;
    /// a value of 1 gives the sequential variant.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Set the job queue depth.
    ///
    /// Bounds peak memory at roughly `max_workers + queue_depth` resident
    /// frame buffers. Defaults to 2 × `max_workers`.
    #[must_use]
    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = Some(queue_depth.max(1));
        self
    }

    /// Set the output image extension (e.g. `png`, `jpg`, `bmp`).
    ///
    /// A leading dot is stripped; the encoder is chosen from the extension.
    #[must_use]
    pub fn with_image_format(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Set the pixel format frames are decoded to.
    #[must_use]
    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    /// Attach a progress observer, invoked at least once per submitted frame.
    #[must_use]
    pub fn with_progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the submission loop stops, submitted
    /// jobs are drained, and the run returns
    /// [`FramesplitError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Replace the frame persister.
    ///
    /// Defaults to [`ImagePersister`]. Mostly useful for custom encoders
    /// and for failure injection in tests.
    #[must_use]
    pub fn with_persister(mut self, persister: Arc<dyn FramePersister>) -> Self {
        self.persister = persister;
        self
    }

    fn queue_depth(&self) -> usize {
        self.queue_depth.unwrap_or(self.max_workers * 2)
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// Orchestrates frame extraction for one video at a time.
///
/// The pipeline itself is stateless between runs; every [`run`] opens a
/// fresh source, worker pool, and metrics collector. Videos are processed
/// one pipeline run at a time — batch callers invoke `run` sequentially per
/// file.
///
/// [`run`]: ExtractionPipeline::run
pub struct ExtractionPipeline {
    options: PipelineOptions,
}

impl ExtractionPipeline {
    /// Create a pipeline with the given options.
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Extract every frame of `video_path` into
    /// `output_dir/<video_basename>/`.
    ///
    /// Frames land as `frame_0000.<ext>`, `frame_0001.<ext>`, ... with
    /// strictly increasing, gap-free indices in decode order. On success a
    /// `metadata.json` with the run's [`MetricsRecord`] is written next to
    /// the frames and the record is returned.
    ///
    /// Two inputs sharing a basename (`clip.mp4`, `clip.avi`) map to the
    /// same output directory and the later run overwrites the earlier
    /// frames; disambiguation is left to the caller.
    ///
    /// # Errors
    ///
    /// - [`FramesplitError::FileOpen`] / [`FramesplitError::NoVideoStream`]
    ///   — fatal open failures; nothing is written.
    /// - [`FramesplitError::JobsFailed`] — one or more frames could not be
    ///   persisted; surviving frames stay on disk, `metadata.json` is not
    ///   written.
    /// - [`FramesplitError::EmptyVideo`] — the container advertised frames
    ///   but none decoded.
    /// - [`FramesplitError::Cancelled`] — the token fired; submitted jobs
    ///   were drained first.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video_path: P,
        output_dir: Q,
    ) -> Result<MetricsRecord, FramesplitError> {
        let video_path = video_path.as_ref();

        let source = VideoSource::open(video_path, self.options.pixel_format)?;

        let input_bytes = fs::metadata(video_path)
            .map(|metadata| metadata.len())
            .unwrap_or(0);

        let basename = video_path
            .file_stem()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("video"));
        let video_dir = output_dir.as_ref().join(basename);

        self.run_with_source(source, &video_dir, input_bytes)
    }

    /// Run the pipeline over an already-open source.
    ///
    /// This is the seam `run` is built on: frames are written directly into
    /// `video_dir` (no basename subdirectory is added), and `input_bytes`
    /// feeds the compression-ratio metric (0 = unknown). Useful for custom
    /// [`FrameSource`] implementations.
    pub fn run_with_source<S: FrameSource>(
        &self,
        mut source: S,
        video_dir: &Path,
        input_bytes: u64,
    ) -> Result<MetricsRecord, FramesplitError> {
        fs::create_dir_all(video_dir)?;

        let collector = MetricsCollector::begin();
        let total_hint = source.total_hint();
        let extension = self.options.extension.as_str();

        let pool = WorkerPool::new(
            self.options.max_workers,
            self.options.queue_depth(),
            self.options.persister.clone(),
        );
        let mut tracker = ProgressTracker::new(self.options.observer.clone(), total_hint);

        log::debug!(
            "Starting extraction into {} ({} worker(s), ~{} frame(s) expected)",
            video_dir.display(),
            self.options.max_workers,
            total_hint,
        );

        // Sequential decode-and-submit loop. Indices are assigned here, in
        // strict decode order, never reused or skipped.
        let mut submitted: u64 = 0;
        loop {
            if self.options.is_cancelled() {
                log::info!(
                    "Cancellation requested after {submitted} frame(s); draining workers",
                );
                source.close();
                let report = pool.drain();
                if !report.failures.is_empty() {
                    log::warn!(
                        "{} frame(s) failed before cancellation",
                        report.failures.len(),
                    );
                }
                return Err(FramesplitError::Cancelled);
            }

            let Some(frame) = source.next_frame() else {
                break;
            };

            let path = video_dir.join(format!("frame_{submitted:04}.{extension}"));
            pool.submit(Job::new(submitted, frame, path))?;
            submitted += 1;
            tracker.advance();
        }
        source.close();

        // Completion synchronization: every submitted job must resolve
        // before metrics read the output directory.
        let report = pool.drain();

        if submitted == 0 && total_hint > 0 {
            return Err(FramesplitError::EmptyVideo {
                expected: total_hint,
            });
        }

        if !report.failures.is_empty() {
            return Err(FramesplitError::JobsFailed {
                failures: report.failures,
            });
        }

        let record = collector.finalize(submitted, video_dir, extension, input_bytes);

        let payload = serde_json::to_string_pretty(&record.to_json())?;
        fs::write(video_dir.join(METADATA_FILE), payload)?;

        log::info!(
            "Extracted {} frame(s) to {} in {:.2}s ({:.2} fps)",
            record.frame_count,
            video_dir.display(),
            record.total_time.as_secs_f64(),
            record.fps,
        );

        Ok(record)
    }
}
