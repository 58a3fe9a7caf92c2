//! Chunk completion reporting.

/// Receives the running count of finished chunks.
///
/// Workers call [`chunk_completed`](ProgressReporter::chunk_completed) from
/// their own threads, so calls may overlap and arrive out of order.
pub trait ProgressReporter: Sync {
    /// Called once per call, before any worker starts, with the chunk count.
    fn start(&self, _total_chunks: usize) {}

    /// Called once per finished chunk with the new completed count.
    fn chunk_completed(&self, completed: usize, total_chunks: usize);
}

/// Reporter that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn chunk_completed(&self, _completed: usize, _total_chunks: usize) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(usize) + Sync,
{
    fn chunk_completed(&self, completed: usize, _total_chunks: usize) {
        self(completed)
    }
}
