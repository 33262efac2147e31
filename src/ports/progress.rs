//! Advisory progress reporting.

/// Progress updates are advisory data: implementations must never let a
/// failed update propagate into the pipeline. The worker's implementation
/// fires the write into a task and swallows errors.
pub trait ProgressSink: Send + Sync {
    fn report(&self, pct: u8);
}

/// Discards all reports.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _pct: u8) {}
}
