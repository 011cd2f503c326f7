//! Machine-readable progress reporting.
//!
//! Progress goes to stderr as one JSON object per line so a supervising
//! process can stream it, leaving stdout for the final result object.

use serde::Serialize;

/// One progress tick.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub stage: String,
    pub current: usize,
    pub total: usize,
    pub percent: f64,
}

impl ProgressEvent {
    pub fn new(stage: &str, current: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            (current as f64 / total as f64 * 1000.0).round() / 10.0
        };
        Self {
            stage: stage.to_string(),
            current,
            total,
            percent,
        }
    }
}

/// Sink for progress ticks. The pipeline reports through this and never
/// writes to the terminal itself.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// JSON-lines reporter on stderr.
pub struct StderrReporter;

impl ProgressReporter for StderrReporter {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            eprintln!("{}", line);
        }
    }
}

/// Discards progress. Useful for library callers and tests.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _event: &ProgressEvent) {}
}
