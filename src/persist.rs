//! Frame persistence.
//!
//! [`FramePersister`] abstracts the write side of the pipeline: serialize one
//! raw frame buffer to a destination path. Persisters are stateless functions
//! of their arguments and are invoked concurrently from worker threads —
//! every job targets a unique path, so no two calls ever touch the same file.
//!
//! [`ImagePersister`] is the standard implementation, encoding frames with
//! the `image` crate in whatever format the path extension names.

use std::fs;
use std::path::Path;

use crate::{error::FramesplitError, frame::RawFrame};

/// Serializes a raw frame buffer to disk.
///
/// Implementations must be safe to invoke concurrently across different
/// paths with no shared mutable state, and must create or overwrite the
/// destination file atomically enough that a successful return means the
/// full frame is on disk.
pub trait FramePersister: Send + Sync {
    /// Write `frame` to `path`, creating intermediate directories if absent.
    ///
    /// Returns the number of bytes written.
    fn persist(&self, frame: &RawFrame, path: &Path) -> Result<u64, FramesplitError>;
}

/// Persists frames as image files via the `image` crate.
///
/// The output format is inferred from the destination path's extension
/// (`png`, `jpg`, `bmp`, `tiff`, ...). Encoding reads the frame buffer in
/// place — no intermediate copy is made.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePersister;

impl ImagePersister {
    /// Create a new persister.
    pub fn new() -> Self {
        Self
    }
}

impl FramePersister for ImagePersister {
    fn persist(&self, frame: &RawFrame, path: &Path) -> Result<u64, FramesplitError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        image::save_buffer(
            path,
            frame.data(),
            frame.width(),
            frame.height(),
            frame.pixel_format().to_color_type(),
        )?;

        Ok(fs::metadata(path)?.len())
    }
}
