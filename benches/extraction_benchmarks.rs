//! Benchmarks for the persistence worker pool.
//!
//! Run with: cargo bench
//!
//! Uses synthetic frames so no video fixtures are required. The interesting
//! comparison is pool size 1 (sequential) against larger pools — on
//! multi-core hardware the larger pool should never be slower for the same
//! frame count.

use std::sync::Arc;

use criterion::{BatchSize, Criterion};
use framesplit::{ImagePersister, Job, PixelFormat, RawFrame, WorkerPool};

const FRAME_COUNT: u64 = 64;
const FRAME_SIZE: u32 = 64;

fn synthetic_frame(position: u64) -> RawFrame {
    let pixel = (position % 256) as u8;
    RawFrame::new(
        FRAME_SIZE,
        FRAME_SIZE,
        PixelFormat::Gray8,
        vec![pixel; (FRAME_SIZE * FRAME_SIZE) as usize],
    )
}

fn benchmark_pool_sizes(criterion: &mut Criterion) {
    for workers in [1_usize, 2, 4, 8] {
        let name = format!("persist {FRAME_COUNT} frames ({workers} worker(s))");
        criterion.bench_function(&name, |bencher| {
            bencher.iter_batched(
                || tempfile::TempDir::new().unwrap(),
                |scratch| {
                    let pool =
                        WorkerPool::new(workers, workers * 2, Arc::new(ImagePersister::new()));
                    for index in 0..FRAME_COUNT {
                        let path = scratch.path().join(format!("frame_{index:04}.png"));
                        pool.submit(Job::new(index, synthetic_frame(index), path))
                            .unwrap();
                    }
                    let report = pool.drain();
                    assert!(report.failures.is_empty());
                },
                BatchSize::SmallInput,
            );
        });
    }
}

fn benchmark_queue_depths(criterion: &mut Criterion) {
    for depth in [1_usize, 8, 32] {
        let name = format!("persist {FRAME_COUNT} frames (4 workers, queue depth {depth})");
        criterion.bench_function(&name, |bencher| {
            bencher.iter_batched(
                || tempfile::TempDir::new().unwrap(),
                |scratch| {
                    let pool = WorkerPool::new(4, depth, Arc::new(ImagePersister::new()));
                    for index in 0..FRAME_COUNT {
                        let path = scratch.path().join(format!("frame_{index:04}.png"));
                        pool.submit(Job::new(index, synthetic_frame(index), path))
                            .unwrap();
                    }
                    pool.drain();
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion::criterion_group!(benches, benchmark_pool_sizes, benchmark_queue_depths);
criterion::criterion_main!(benches);
