//! Progress callbacks for batch runs.

use crate::pipeline::{BatchSummary, RowOutcome};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Progress callback for row-by-row processing.
///
/// Called from worker threads when the batch runs in parallel, so rows may
/// complete out of order.
pub trait RowProgress: Send + Sync {
    /// Called before a row is validated and fetched.
    fn on_row_start(&self, index: usize, total: usize, symbol: &str);

    /// Called when a row has its outcome.
    fn on_row_complete(&self, index: usize, total: usize, outcome: &RowOutcome);

    /// Called once after every row is done.
    fn on_batch_complete(&self, summary: &BatchSummary);
}

/// Prints a running `[done/total]` line per row to stderr.
#[derive(Debug, Default)]
pub struct StderrProgress {
    done: AtomicUsize,
}

impl StderrProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RowProgress for StderrProgress {
    fn on_row_start(&self, _index: usize, _total: usize, _symbol: &str) {}

    fn on_row_complete(&self, index: usize, total: usize, outcome: &RowOutcome) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let status = match outcome {
            RowOutcome::Resolved { anchor, clipped } => {
                if *clipped {
                    format!("ok {} (clipped)", anchor.date)
                } else {
                    format!("ok {}", anchor.date)
                }
            }
            RowOutcome::InvalidSymbol(e) | RowOutcome::InvalidDate(e) => format!("FAILED: {e}"),
            RowOutcome::Unavailable { reason, .. } => format!("FAILED: {reason}"),
        };
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "  [{done}/{total}] row {}: {status}", index + 1);
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(
            err,
            "Done: {} succeeded, {} failed ({} clipped)",
            summary.succeeded,
            summary.failed(),
            summary.clipped
        );
    }
}

/// Counts callbacks. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct CountingProgress {
    pub started: AtomicUsize,
    pub completed: AtomicUsize,
    pub batches: AtomicUsize,
}

impl RowProgress for CountingProgress {
    fn on_row_start(&self, _index: usize, _total: usize, _symbol: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_row_complete(&self, _index: usize, _total: usize, _outcome: &RowOutcome) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_complete(&self, _summary: &BatchSummary) {
        self.batches.fetch_add(1, Ordering::SeqCst);
    }
}
