//! Progress reporting trait for long-running runs.
//!
//! Decouples the runner from any rendering backend. The CLI supplies an
//! `indicatif` bar; tests and library callers use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from the batch runner.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected rows (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` rows.
    fn inc(&self, delta: u64);

    /// Update the message shown alongside the indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Silently ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
