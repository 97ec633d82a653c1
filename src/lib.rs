//! # framesplit
//!
//! Split video files into sequential still-image frames, with parallel
//! persistence, progress reporting, and run metrics.
//!
//! `framesplit` decodes a video sequentially (FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate) and fans the
//! decoded frames out to a bounded pool of worker threads that encode and
//! write them with the [`image`](https://crates.io/crates/image) crate. Each
//! run produces `frame_0000.png`, `frame_0001.png`, ... plus a
//! `metadata.json` describing timing, throughput, disk usage, and resource
//! utilization.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framesplit::{ExtractionPipeline, PipelineOptions};
//!
//! let pipeline = ExtractionPipeline::new(PipelineOptions::new());
//! let record = pipeline.run("input.mp4", "extracted_frames").unwrap();
//! println!("{} frames in {:.2}s", record.frame_count, record.total_time.as_secs_f64());
//! ```
//!
//! ### Tuning the pool
//!
//! ```no_run
//! use framesplit::{ExtractionPipeline, PipelineOptions, PixelFormat};
//!
//! let options = PipelineOptions::new()
//!     .with_max_workers(8)
//!     .with_image_format("jpg")
//!     .with_pixel_format(PixelFormat::Gray8);
//! let pipeline = ExtractionPipeline::new(options);
//! pipeline.run("input.mp4", "extracted_frames").unwrap();
//! ```
//!
//! ### Progress and cancellation
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesplit::{
//!     CancellationToken, ExtractionPipeline, PipelineOptions, ProgressEvent,
//!     ProgressObserver,
//! };
//!
//! struct PrintProgress;
//! impl ProgressObserver for PrintProgress {
//!     fn on_progress(&self, event: &ProgressEvent) {
//!         if let Some(percent) = event.percent {
//!             println!("{percent:.1}%");
//!         }
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = PipelineOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_cancellation(token.clone());
//! let pipeline = ExtractionPipeline::new(options);
//! // token.cancel() from another thread stops the run after the current frame.
//! pipeline.run("input.mp4", "extracted_frames").unwrap();
//! ```
//!
//! ## Design
//!
//! - **One decoder, N writers** — video decoding is inherently sequential;
//!   only frame persistence parallelizes. Pool size 1 is the sequential
//!   variant of the same pipeline.
//! - **Backpressure** — the job queue is bounded, so peak memory is capped
//!   at roughly `max_workers + queue_depth` resident frames regardless of
//!   video length.
//! - **Partial failure** — a frame that fails to write does not abort
//!   sibling jobs; the run fails at the end with the full failure list and
//!   surviving frames stay on disk.
//! - **Honest metrics** — output bytes are summed from the files actually
//!   on disk, not from a write counter.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod error;
pub mod frame;
pub mod metrics;
pub mod persist;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod source;

pub use error::{FrameFailure, FramesplitError};
pub use frame::{PixelFormat, RawFrame};
pub use metrics::{MetricsCollector, MetricsRecord};
pub use persist::{FramePersister, ImagePersister};
pub use pipeline::{DEFAULT_MAX_WORKERS, ExtractionPipeline, METADATA_FILE, PipelineOptions};
pub use pool::{DrainReport, Job, WorkerPool};
pub use progress::{CancellationToken, ProgressEvent, ProgressObserver};
pub use source::{FrameSource, VideoSource};
