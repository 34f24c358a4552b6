//! Cooperative progress reporting.
//!
//! Long-running operations publish through a [`ProgressSink`] at fixed
//! suspension points (after each stat, each category flatten, each
//! workbook open, each index re-stat). There is no preemption: the
//! sink is called inline and must return quickly. Pause and cancel are
//! plain flags polled at the same points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receiver for progress events. Implementations must be cheap; the
/// scanning code calls them on its own thread between items.
pub trait ProgressSink {
    /// A new phase with an optional known item count.
    fn begin(&self, _label: &str, _total: Option<u64>) {}

    /// One item finished; `detail` names it.
    fn advance(&self, _detail: &str) {}

    /// The current phase completed.
    fn finish(&self) {}
}

/// Sink that discards everything. Library callers that do not care
/// about progress pass this.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Shared pause/cancel control polled between items. Pausing never
/// interrupts an item mid-flight; the PDF pass in particular finishes
/// the current file before honoring the flag.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    paused: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Block while paused, waking periodically; returns false when the
    /// run was cancelled while waiting.
    pub fn wait_if_paused(&self) -> bool {
        while self.paused.load(Ordering::SeqCst) {
            if self.is_cancelled() {
                return false;
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        !self.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_control_cancel_wins_over_pause() {
        let control = RunControl::new();
        control.pause();
        control.cancel();
        assert!(!control.wait_if_paused());
    }

    #[test]
    fn run_control_defaults_to_running() {
        let control = RunControl::new();
        assert!(!control.is_cancelled());
        assert!(control.wait_if_paused());
    }
}
