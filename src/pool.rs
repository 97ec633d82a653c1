//! Bounded pool of frame-persistence workers.
//!
//! [`WorkerPool`] runs a fixed number of worker threads over a bounded job
//! channel. [`submit`](WorkerPool::submit) blocks the caller once the queue
//! is full — backpressure that caps resident frame buffers at roughly
//! `max_workers + queue_depth`. [`drain`](WorkerPool::drain) closes the
//! queue, joins every worker, and reports completion counts and failures.
//!
//! Jobs may complete out of submission order; destination paths are unique
//! per frame index, so concurrent writes never race on a file.

use std::path::PathBuf;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::{
    error::{FrameFailure, FramesplitError},
    frame::RawFrame,
    persist::FramePersister,
};

/// One unit of persistence work: a frame and its destination path.
///
/// Immutable once submitted; exactly one worker ever processes a given job.
#[derive(Debug)]
pub struct Job {
    index: u64,
    frame: RawFrame,
    path: PathBuf,
}

impl Job {
    /// Pair a frame with its destination.
    pub fn new(index: u64, frame: RawFrame, path: PathBuf) -> Self {
        Self { index, frame, path }
    }

    /// Frame index assigned by the pipeline.
    pub fn index(&self) -> u64 {
        self.index
    }
}

/// Outcome of draining a [`WorkerPool`].
#[derive(Debug)]
pub struct DrainReport {
    /// Jobs that resolved (successfully or not).
    pub completed: u64,
    /// Failure records, sorted by frame index. Empty on a clean run.
    pub failures: Vec<FrameFailure>,
}

/// Fixed-capacity pool of persistence workers.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use framesplit::{ImagePersister, Job, PixelFormat, RawFrame, WorkerPool};
///
/// let pool = WorkerPool::new(4, 8, Arc::new(ImagePersister::new()));
/// let frame = RawFrame::new(2, 2, PixelFormat::Gray8, vec![0; 4]);
/// pool.submit(Job::new(0, frame, "frames/frame_0000.png".into()))?;
/// let report = pool.drain();
/// assert!(report.failures.is_empty());
/// # Ok::<(), framesplit::FramesplitError>(())
/// ```
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    completed: Arc<AtomicU64>,
    failures: Arc<Mutex<Vec<FrameFailure>>>,
}

impl WorkerPool {
    /// Spawn `max_workers` worker threads over a queue of `queue_depth` jobs.
    ///
    /// Both values are clamped to a minimum of 1. A pool of size 1 is the
    /// sequential degenerate case — same orchestration, no parallelism.
    pub fn new(
        max_workers: usize,
        queue_depth: usize,
        persister: Arc<dyn FramePersister>,
    ) -> Self {
        let max_workers = max_workers.max(1);
        let (sender, receiver) = crossbeam_channel::bounded::<Job>(queue_depth.max(1));

        let completed = Arc::new(AtomicU64::new(0));
        let failures = Arc::new(Mutex::new(Vec::new()));

        let workers = (0..max_workers)
            .map(|_| {
                let receiver = receiver.clone();
                let persister = persister.clone();
                let completed = completed.clone();
                let failures = failures.clone();
                std::thread::spawn(move || {
                    run_worker(&receiver, persister.as_ref(), &completed, &failures);
                })
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
            completed,
            failures,
        }
    }

    /// Submit a job for persistence.
    ///
    /// Non-blocking while the queue has capacity; blocks the caller once it
    /// is full, until a worker frees a slot.
    ///
    /// # Errors
    ///
    /// Returns [`FramesplitError::PoolClosed`] if the pool has already been
    /// drained.
    pub fn submit(&self, job: Job) -> Result<(), FramesplitError> {
        let sender = self.sender.as_ref().ok_or(FramesplitError::PoolClosed)?;
        sender.send(job).map_err(|_| FramesplitError::PoolClosed)
    }

    /// Jobs that have resolved so far.
    ///
    /// Monotonically increasing; only guaranteed to equal the submitted
    /// count after [`drain`](WorkerPool::drain).
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Block until every submitted job (queued, running, or completed) has
    /// resolved, then report the outcome.
    pub fn drain(mut self) -> DrainReport {
        self.shutdown();

        let mut failures = match self.failures.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        failures.sort_by_key(|failure| failure.index);

        DrainReport {
            completed: self.completed.load(Ordering::Acquire),
            failures,
        }
    }

    /// Close the job channel and join every worker.
    fn shutdown(&mut self) {
        // Dropping the sender closes the channel; workers exit once the
        // queue is empty.
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("A persistence worker panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // A pool abandoned without drain() still waits for in-flight jobs,
        // so no write is ever orphaned mid-run.
        self.shutdown();
    }
}

fn run_worker(
    receiver: &Receiver<Job>,
    persister: &dyn FramePersister,
    completed: &AtomicU64,
    failures: &Mutex<Vec<FrameFailure>>,
) {
    for job in receiver.iter() {
        match persister.persist(&job.frame, &job.path) {
            Ok(bytes) => {
                log::trace!("Wrote frame {} ({bytes} bytes)", job.index);
            }
            Err(error) => {
                log::warn!("Failed to write frame {}: {error}", job.index);
                let failure = FrameFailure {
                    index: job.index,
                    path: job.path,
                    reason: error.to_string(),
                };
                match failures.lock() {
                    Ok(mut guard) => guard.push(failure),
                    Err(poisoned) => poisoned.into_inner().push(failure),
                }
            }
        }
        completed.fetch_add(1, Ordering::Release);
    }
}
