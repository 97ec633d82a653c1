//! Run metrics collection.
//!
//! [`MetricsCollector`] tracks wall-clock timing for one pipeline run and
//! produces a single immutable [`MetricsRecord`] at the end: frame counts,
//! throughput, disk-size accounting of the produced frames versus the source
//! video, and point-in-time CPU/memory utilization samples.
//!
//! Output-byte accounting walks the output directory rather than summing a
//! per-write counter, so the record reflects what is actually on disk even
//! after partial failures.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use sysinfo::System;

/// Immutable metrics snapshot for one completed pipeline run.
///
/// Produced exactly once per run, after every submitted job has resolved.
/// Serialized to `metadata.json` in the run's output directory via
/// [`to_json`](MetricsRecord::to_json).
#[derive(Debug, Clone)]
#[must_use]
pub struct MetricsRecord {
    /// Number of frames extracted and persisted.
    pub frame_count: u64,
    /// Wall-clock duration of the run, decode start to drain end.
    pub total_time: Duration,
    /// Total size of the frame files on disk, in bytes.
    pub total_output_bytes: u64,
    /// Size of the source video file, in bytes (0 when unknown).
    pub input_bytes: u64,
    /// Output bytes divided by input bytes.
    ///
    /// The frames are raw still images and the source is compressed video,
    /// so this value is expected to exceed 1 for typical inputs — the field
    /// keeps the literal output/input formula. `None` when the input size
    /// is zero or unknown.
    pub compression_ratio: Option<f64>,
    /// Average wall-clock time per frame.
    pub avg_frame_time: Duration,
    /// Frames per second achieved by the run; 0 for a zero-duration run.
    pub fps: f64,
    /// System CPU utilization percentage, sampled once at finalization.
    /// Approximate — not an average over the run.
    pub cpu_utilization: f32,
    /// System memory utilization percentage, sampled once at finalization.
    /// Approximate — not an average over the run.
    pub memory_utilization: f32,
}

impl MetricsRecord {
    /// Build the `metadata.json` payload.
    pub fn to_json(&self) -> Value {
        json!({
            "frame_count": self.frame_count,
            "total_time": self.total_time.as_secs_f64(),
            "total_output_bytes": self.total_output_bytes,
            "input_bytes": self.input_bytes,
            "compression_ratio": self.compression_ratio,
            "avg_frame_time": self.avg_frame_time.as_secs_f64(),
            "fps": self.fps,
            "cpu_utilization": self.cpu_utilization,
            "memory_utilization": self.memory_utilization,
        })
    }
}

/// Accumulates timing for one run and produces the final [`MetricsRecord`].
pub struct MetricsCollector {
    started: Instant,
}

impl MetricsCollector {
    /// Start the run clock.
    pub fn begin() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Wall-clock time elapsed since [`begin`](MetricsCollector::begin).
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Produce the metrics record for a completed run.
    ///
    /// `video_dir` is scanned for files matching the frame-name pattern
    /// (`frame_*.{extension}`) and their sizes are summed — a scan failure
    /// degrades to zero bytes with a warning rather than failing the run.
    pub fn finalize(
        &self,
        frame_count: u64,
        video_dir: &Path,
        extension: &str,
        input_bytes: u64,
    ) -> MetricsRecord {
        let total_time = self.started.elapsed();

        let total_output_bytes = frame_bytes_on_disk(video_dir, extension);

        let compression_ratio = if input_bytes > 0 {
            Some(total_output_bytes as f64 / input_bytes as f64)
        } else {
            None
        };

        let avg_frame_time = if frame_count > 0 {
            total_time / frame_count as u32
        } else {
            Duration::ZERO
        };

        let fps = if total_time > Duration::ZERO {
            frame_count as f64 / total_time.as_secs_f64()
        } else {
            0.0
        };

        let (cpu_utilization, memory_utilization) = sample_utilization();

        MetricsRecord {
            frame_count,
            total_time,
            total_output_bytes,
            input_bytes,
            compression_ratio,
            avg_frame_time,
            fps,
            cpu_utilization,
            memory_utilization,
        }
    }
}

/// Sum the sizes of frame files actually present in `video_dir`.
pub(crate) fn frame_bytes_on_disk(video_dir: &Path, extension: &str) -> u64 {
    let entries = match fs::read_dir(video_dir) {
        Ok(entries) => entries,
        Err(error) => {
            log::warn!(
                "Could not scan output directory {}: {error}",
                video_dir.display(),
            );
            return 0;
        }
    };

    let suffix = format!(".{extension}");
    entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with("frame_") && name.ends_with(&suffix)
        })
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// One-shot CPU and memory utilization sample.
///
/// CPU usage needs two refreshes a short interval apart to have anything to
/// measure against, so this blocks for `sysinfo`'s minimum update interval.
fn sample_utilization() -> (f32, f32) {
    let mut system = System::new();

    system.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_cpu_usage();
    let cpu_utilization = system.global_cpu_usage();

    system.refresh_memory();
    let total = system.total_memory();
    let memory_utilization = if total > 0 {
        (system.used_memory() as f64 / total as f64 * 100.0) as f32
    } else {
        0.0
    };

    (cpu_utilization, memory_utilization)
}
