use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use framesplit::{
    ExtractionPipeline, FramesplitError, MetricsRecord, PipelineOptions, ProgressEvent,
    ProgressObserver,
};
use indicatif::{ProgressBar, ProgressStyle};

/// File extensions treated as video input.
const VIDEO_EXTENSIONS: &[&str] = &["avi", "mp4", "mkv", "mov", "webm", "m4v"];

const CLI_AFTER_HELP: &str = "Examples:\n  framesplit videos/ extracted_frames/\n  framesplit videos/ extracted_frames/ --max-workers 8 --ext jpg --progress";

#[derive(Debug, Parser)]
#[command(
    name = "framesplit",
    version,
    about = "Decompose video files into individual frames",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Directory containing input video files.
    input_dir: PathBuf,

    /// Output directory; each video gets its own subdirectory.
    output_dir: PathBuf,

    /// Maximum number of persistence worker threads.
    #[arg(long, default_value_t = 4)]
    max_workers: usize,

    /// Output image extension (png, jpg, jpeg, bmp, tiff).
    #[arg(long, default_value = "png")]
    ext: String,

    /// Show a progress bar per video.
    #[arg(long)]
    progress: bool,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,
}

/// Forwards pipeline progress to an indicatif bar.
///
/// Progress arrives on the pipeline's submission thread; the bar is its own
/// synchronization point, so no state is shared with the UI beyond it.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for BarProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        if let Some(total) = event.total_hint {
            self.bar.set_length(total);
        }
        self.bar.set_position(event.frames_submitted);
    }
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| VIDEO_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn collect_videos(input_dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if !input_dir.is_dir() {
        return Err(format!("input is not a directory: {}", input_dir.display()).into());
    }

    let mut videos: Vec<PathBuf> = fs::read_dir(input_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_video(path))
        .collect();
    videos.sort();
    Ok(videos)
}

fn print_summary(video_path: &Path, record: &MetricsRecord) {
    let megabytes = record.total_output_bytes as f64 / (1024.0 * 1024.0);

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "Decomposed {} into {} frame(s).",
            video_path.display(),
            record.frame_count,
        )
        .green(),
    );
    println!("  Total Time Taken: {:.2}s", record.total_time.as_secs_f64());
    println!("  Decomposed Disk Space: {megabytes:.2} MB");
    match record.compression_ratio {
        Some(ratio) => println!("  Compression Ratio: {ratio:.2}"),
        None => println!("  Compression Ratio: n/a (unknown input size)"),
    }
    println!(
        "  Average Frame Decomposition Time: {:.6}s",
        record.avg_frame_time.as_secs_f64(),
    );
    println!("  Frames per Second (FPS): {:.2}", record.fps);
    println!("  CPU Utilization: {:.2}%", record.cpu_utilization);
    println!("  Memory Utilization: {:.2}%", record.memory_utilization);
    println!();
}

fn print_failure(video_path: &Path, error: &FramesplitError) {
    eprintln!(
        "{} {}",
        "failure:".red().bold(),
        format!("Decomposition failed for {}: {error}", video_path.display()).red(),
    );
    if let FramesplitError::JobsFailed { failures } = error {
        for failure in failures {
            eprintln!("  frame {}: {}", failure.index, failure.reason);
        }
    }
    eprintln!();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if cli.max_workers == 0 {
        return Err("--max-workers must be greater than 0".into());
    }

    let videos = collect_videos(&cli.input_dir)?;
    if videos.is_empty() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("no video files found in {}", cli.input_dir.display()).yellow(),
        );
        return Ok(());
    }

    let mut failed = 0_usize;

    // One pipeline run per file, sequentially — a failure does not halt the
    // rest of the batch.
    for video_path in &videos {
        let mut options = PipelineOptions::new()
            .with_max_workers(cli.max_workers)
            .with_image_format(&cli.ext);

        let bar = if cli.progress {
            let bar = Arc::new(BarProgress::new()?);
            options = options.with_progress(bar.clone());
            Some(bar)
        } else {
            None
        };

        let pipeline = ExtractionPipeline::new(options);
        let result = pipeline.run(video_path, &cli.output_dir);

        if let Some(bar) = bar {
            bar.finish();
        }

        match result {
            Ok(record) => print_summary(video_path, &record),
            Err(error) => {
                failed += 1;
                print_failure(video_path, &error);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} video(s) failed", videos.len()).into());
    }
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::is_video;
    use std::path::Path;

    #[test]
    fn video_extension_detection() {
        assert!(is_video(Path::new("clip.mp4")));
        assert!(is_video(Path::new("CLIP.AVI")));
        assert!(is_video(Path::new("movie.mkv")));
        assert!(!is_video(Path::new("notes.txt")));
        assert!(!is_video(Path::new("no_extension")));
    }
}
