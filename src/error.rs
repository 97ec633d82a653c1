//! Error types for the `framesplit` crate.
//!
//! This module defines [`FramesplitError`], the unified error type returned by
//! all fallible operations in the crate, and [`FrameFailure`], the per-frame
//! failure record aggregated by the worker pool. Errors carry enough context
//! (paths, frame indices, upstream messages) to diagnose a failed run without
//! extra logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// Record of a single frame-persistence job that failed.
///
/// Collected by the worker pool and surfaced through
/// [`FramesplitError::JobsFailed`]. Frames that succeeded remain on disk; the
/// failure list describes exactly which indices are missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFailure {
    /// Index of the frame whose persistence failed.
    pub index: u64,
    /// Destination path the frame was being written to.
    pub path: PathBuf,
    /// Upstream reason the write failed.
    pub reason: String,
}

/// The unified error type for all `framesplit` operations.
///
/// Every public method that can fail returns `Result<T, FramesplitError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramesplitError {
    /// The video file could not be opened.
    ///
    /// Fatal for the run — a missing, unreadable, or unparsable input is not
    /// transient, so there is no retry.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file parses as a media container but has no video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// One or more persistence jobs failed during the run.
    ///
    /// Successful frames are preserved on disk (no rollback); the failure
    /// list identifies the missing indices. `metadata.json` is not written
    /// for a failed run.
    #[error("{} frame(s) failed to persist", failures.len())]
    JobsFailed {
        /// Per-frame failure records, sorted by frame index.
        failures: Vec<FrameFailure>,
    },

    /// The container reported a non-zero frame count but decoding yielded
    /// zero frames.
    #[error("Video reported {expected} frame(s) but none could be decoded")]
    EmptyVideo {
        /// The frame count the container claimed.
        expected: u64,
    },

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    ///
    /// Already-submitted jobs are drained before this is returned, so no
    /// half-written frame files are left behind.
    #[error("Extraction cancelled")]
    Cancelled,

    /// A job was submitted to a worker pool whose workers have exited.
    #[error("Worker pool is closed")]
    PoolClosed,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image encoding error: {0}")]
    Image(#[from] ImageError),

    /// An error serializing the metrics record to JSON.
    #[error("Metadata serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
}

impl From<FfmpegError> for FramesplitError {
    fn from(error: FfmpegError) -> Self {
        FramesplitError::Ffmpeg(error.to_string())
    }
}
