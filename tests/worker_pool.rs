//! Worker pool behaviour: completion accounting, failure aggregation, and
//! backpressure under a saturated queue.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use framesplit::{
    FramePersister, FramesplitError, Job, PixelFormat, RawFrame, WorkerPool,
};

use common::CountingPersister;

fn tiny_frame(position: u64) -> RawFrame {
    RawFrame::new(1, 1, PixelFormat::Gray8, vec![(position % 256) as u8])
}

#[test]
fn all_jobs_resolve() {
    let persister = Arc::new(CountingPersister::default());
    let pool = WorkerPool::new(4, 8, persister.clone());

    for index in 0..100 {
        pool.submit(Job::new(index, tiny_frame(index), format!("frame_{index:04}.png").into()))
            .expect("submit should succeed");
    }

    let report = pool.drain();
    assert_eq!(report.completed, 100);
    assert!(report.failures.is_empty());
    assert_eq!(persister.persisted.load(Ordering::Acquire), 100);
}

#[test]
fn single_worker_pool_resolves_everything() {
    let persister = Arc::new(CountingPersister::default());
    let pool = WorkerPool::new(1, 1, persister.clone());

    for index in 0..20 {
        pool.submit(Job::new(index, tiny_frame(index), format!("frame_{index:04}.png").into()))
            .expect("submit should succeed");
    }

    let report = pool.drain();
    assert_eq!(report.completed, 20);
    assert_eq!(persister.persisted.load(Ordering::Acquire), 20);
}

/// Fails every job whose frame carries an odd pixel value.
struct OddFailPersister;

impl FramePersister for OddFailPersister {
    fn persist(&self, frame: &RawFrame, _path: &Path) -> Result<u64, FramesplitError> {
        if frame.data()[0] % 2 == 1 {
            return Err(FramesplitError::Io(std::io::Error::other("odd frame")));
        }
        Ok(1)
    }
}

#[test]
fn failures_are_aggregated_and_sorted() {
    let pool = WorkerPool::new(3, 4, Arc::new(OddFailPersister));

    for index in 0..10 {
        pool.submit(Job::new(index, tiny_frame(index), format!("frame_{index:04}.png").into()))
            .expect("submit should succeed");
    }

    let report = pool.drain();
    assert_eq!(report.completed, 10, "failed jobs still count as resolved");

    let failed_indices: Vec<u64> = report.failures.iter().map(|failure| failure.index).collect();
    assert_eq!(failed_indices, vec![1, 3, 5, 7, 9]);
    for failure in &report.failures {
        assert!(failure.reason.contains("odd frame"));
        assert_eq!(
            failure.path.file_name().unwrap().to_string_lossy(),
            format!("frame_{:04}.png", failure.index),
        );
    }
}

/// Persister slow enough to saturate a depth-1 queue.
struct SlowPersister;

impl FramePersister for SlowPersister {
    fn persist(&self, _frame: &RawFrame, _path: &Path) -> Result<u64, FramesplitError> {
        std::thread::sleep(Duration::from_millis(5));
        Ok(1)
    }
}

#[test]
fn saturated_queue_still_resolves_every_job() {
    // Queue depth 1 with 2 slow workers forces submit() to block repeatedly;
    // every job must still resolve exactly once.
    let pool = WorkerPool::new(2, 1, Arc::new(SlowPersister));

    for index in 0..24 {
        pool.submit(Job::new(index, tiny_frame(index), format!("frame_{index:04}.png").into()))
            .expect("submit should succeed");
    }

    let report = pool.drain();
    assert_eq!(report.completed, 24);
    assert!(report.failures.is_empty());
}

#[test]
fn completed_is_monotone_during_run() {
    let pool = WorkerPool::new(2, 4, Arc::new(CountingPersister::default()));

    let mut last = 0;
    for index in 0..50 {
        pool.submit(Job::new(index, tiny_frame(index), format!("frame_{index:04}.png").into()))
            .expect("submit should succeed");
        let now = pool.completed();
        assert!(now >= last);
        last = now;
    }

    let report = pool.drain();
    assert_eq!(report.completed, 50);
}
