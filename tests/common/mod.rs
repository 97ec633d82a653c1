//! Shared test doubles: synthetic frame sources and fault-injecting
//! persisters.

// Not every test binary exercises every double.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use framesplit::{
    FramePersister, FrameSource, FramesplitError, ImagePersister, PixelFormat, RawFrame,
};

pub const FRAME_WIDTH: u32 = 4;
pub const FRAME_HEIGHT: u32 = 4;

/// Deterministic in-memory frame source.
///
/// Produces `frames` 4x4 grayscale frames whose pixel values equal the frame
/// position, so output files are deterministic and distinguishable.
pub struct SyntheticSource {
    frames: u64,
    hint: u64,
    produced: Arc<AtomicU64>,
    closed: bool,
}

impl SyntheticSource {
    pub fn new(frames: u64, hint: u64) -> Self {
        Self {
            frames,
            hint,
            produced: Arc::new(AtomicU64::new(0)),
            closed: false,
        }
    }

    /// Shared counter of frames actually read from this source.
    pub fn produced_counter(&self) -> Arc<AtomicU64> {
        self.produced.clone()
    }
}

impl FrameSource for SyntheticSource {
    fn total_hint(&self) -> u64 {
        self.hint
    }

    fn next_frame(&mut self) -> Option<RawFrame> {
        if self.closed {
            return None;
        }
        let position = self.produced.load(Ordering::Acquire);
        if position >= self.frames {
            return None;
        }
        self.produced.fetch_add(1, Ordering::Release);

        let pixel = (position % 256) as u8;
        let data = vec![pixel; (FRAME_WIDTH * FRAME_HEIGHT) as usize];
        Some(RawFrame::new(
            FRAME_WIDTH,
            FRAME_HEIGHT,
            PixelFormat::Gray8,
            data,
        ))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Persister that fails for one specific destination file name and defers to
/// [`ImagePersister`] for everything else.
pub struct FailingPersister {
    fail_file_name: String,
    inner: ImagePersister,
}

impl FailingPersister {
    pub fn new(fail_file_name: &str) -> Self {
        Self {
            fail_file_name: fail_file_name.to_string(),
            inner: ImagePersister::new(),
        }
    }
}

impl FramePersister for FailingPersister {
    fn persist(&self, frame: &RawFrame, path: &Path) -> Result<u64, FramesplitError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name == self.fail_file_name {
            return Err(FramesplitError::Io(std::io::Error::other(
                "simulated write error",
            )));
        }
        self.inner.persist(frame, path)
    }
}

/// Persister that counts invocations and writes nothing.
#[derive(Default)]
pub struct CountingPersister {
    pub persisted: AtomicU64,
}

impl FramePersister for CountingPersister {
    fn persist(&self, _frame: &RawFrame, _path: &Path) -> Result<u64, FramesplitError> {
        self.persisted.fetch_add(1, Ordering::Release);
        Ok(1)
    }
}
