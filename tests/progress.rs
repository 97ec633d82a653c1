//! Progress and cancellation semantics.

mod common;

use std::sync::{Arc, Mutex};

use framesplit::{
    CancellationToken, ExtractionPipeline, PipelineOptions, ProgressEvent, ProgressObserver,
};
use tempfile::TempDir;

use common::SyntheticSource;

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn cancellation_token_cancel() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancellation_token_default_trait() {
    let token = CancellationToken::default();
    assert!(!token.is_cancelled());
}

// ── ProgressEvent delivery ─────────────────────────────────────────

struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

impl ProgressObserver for RecordingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn run_recorded(frames: u64, hint: u64) -> Vec<ProgressEvent> {
    let scratch = TempDir::new().unwrap();
    let recorder = Arc::new(RecordingProgress::new());
    let options = PipelineOptions::new()
        .with_max_workers(2)
        .with_progress(recorder.clone());

    ExtractionPipeline::new(options)
        .run_with_source(SyntheticSource::new(frames, hint), scratch.path(), 0)
        .expect("run should complete");

    let events = recorder.events.lock().unwrap();
    events.clone()
}

#[test]
fn one_event_per_submitted_frame() {
    let events = run_recorded(10, 10);
    assert_eq!(events.len(), 10);

    for (position, event) in events.iter().enumerate() {
        assert_eq!(event.frames_submitted, position as u64 + 1);
    }
}

#[test]
fn percent_is_monotonic_and_reaches_100() {
    let events = run_recorded(10, 10);

    for window in events.windows(2) {
        let earlier = window[0].percent.expect("percent should be known");
        let later = window[1].percent.expect("percent should be known");
        assert!(later >= earlier, "percent should be non-decreasing");
    }

    let last = events.last().unwrap();
    assert_eq!(last.percent, Some(100.0));
    assert_eq!(last.total_hint, Some(10));
}

#[test]
fn percent_is_clamped_when_hint_undershoots() {
    // The container hint is approximate; when the stream outruns it, the
    // percentage pins at 100 instead of overshooting.
    let events = run_recorded(12, 10);

    let last = events.last().unwrap();
    assert_eq!(last.frames_submitted, 12);
    assert_eq!(last.percent, Some(100.0));
}

#[test]
fn unknown_total_reports_indeterminate_progress() {
    let events = run_recorded(5, 0);
    assert_eq!(events.len(), 5);

    for event in &events {
        assert!(event.percent.is_none());
        assert!(event.total_hint.is_none());
        assert!(event.eta.is_none());
    }
}

#[test]
fn eta_is_reported_when_total_is_known() {
    let events = run_recorded(10, 10);
    for event in &events {
        assert!(event.eta.is_some());
    }
    // Nothing remains at the end.
    assert_eq!(events.last().unwrap().eta, Some(std::time::Duration::ZERO));
}

#[test]
fn elapsed_is_monotonic() {
    let events = run_recorded(8, 8);
    for window in events.windows(2) {
        assert!(window[1].elapsed >= window[0].elapsed);
    }
}
