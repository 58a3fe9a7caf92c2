//! Chunked fan-out/fan-in over a runtime [`Domain`].
//!
//! Every call plans its chunks, starts one scoped thread per chunk and joins
//! all of them before returning. Workers check the abort flag before each
//! element; the first failure (element error, panic or spawn error) wins and
//! is returned once every worker has finished.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::affinity::{AffinityHint, NoAffinity, RoundRobinCores};
use crate::chunk::{self, Chunk};
use crate::config::ThreadConfig;
use crate::domain::Domain;
use crate::error::ForEachError;
use crate::failure::ErrorAggregator;
use crate::progress::{NoProgress, ProgressReporter};
use crate::visitor::Visitor;

/// State every worker of one call shares by reference.
pub(crate) struct Shared<'s, E> {
    pub aggregator: ErrorAggregator<E>,
    pub completed: AtomicUsize,
    pub total_chunks: usize,
    pub progress: &'s dyn ProgressReporter,
    pub affinity: &'s dyn AffinityHint,
}

impl<'s, E> Shared<'s, E> {
    pub fn new(
        total_chunks: usize,
        progress: &'s dyn ProgressReporter,
        affinity: &'s dyn AffinityHint,
    ) -> Self {
        Self {
            aggregator: ErrorAggregator::new(),
            completed: AtomicUsize::new(0),
            total_chunks,
            progress,
            affinity,
        }
    }

    /// Count one finished chunk and tell the reporter.
    pub fn finish_chunk(&self) {
        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        self.progress.chunk_completed(done, self.total_chunks);
    }

    /// Offer a join-level outcome for `worker` to the aggregator.
    pub fn absorb_join(&self, worker: usize, joined: thread::Result<()>) {
        if let Err(payload) = joined {
            let failure = ForEachError::from_panic(worker, payload);
            tracing::warn!(worker, error = %DisplayFailure(&failure), "worker panicked");
            self.aggregator.offer(failure);
        }
    }

    pub fn absorb_spawn_error(&self, worker: usize, source: std::io::Error) {
        tracing::warn!(worker, error = %source, "failed to spawn worker");
        self.aggregator.offer(ForEachError::Spawn { worker, source });
    }
}

/// Display adapter that does not need `E: Display`.
struct DisplayFailure<'a, E>(&'a ForEachError<E>);

impl<E> std::fmt::Display for DisplayFailure<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            ForEachError::Element { index, worker, .. } => {
                write!(f, "element {} failed on worker {}", index, worker)
            }
            ForEachError::WorkerPanicked { message, .. } => f.write_str(message),
            ForEachError::Spawn { source, .. } => write!(f, "{}", source),
        }
    }
}

pub(crate) fn worker_name(worker: usize) -> String {
    format!("parfor-worker-{}", worker)
}

/// Parallel for-each builder over a runtime domain.
///
/// ```
/// use parfor_core::{ForEach, Visitor};
///
/// let mut out = vec![0usize; 100];
/// ForEach::new(
///     out.as_mut_slice(),
///     Visitor::indexed(|slot: &mut usize, index| {
///         *slot = index * 2;
///         Ok::<(), String>(())
///     }),
/// )
/// .threads(4)
/// .run()
/// .unwrap();
/// assert_eq!(out[99], 198);
/// ```
pub struct ForEach<'f, D: Domain, E> {
    domain: D,
    visitor: Visitor<'f, D::Item, E>,
    threads: usize,
    progress: Box<dyn ProgressReporter + 'f>,
    affinity: Box<dyn AffinityHint + 'f>,
}

impl<'f, D, E> ForEach<'f, D, E>
where
    D: Domain,
    E: Send,
{
    /// New call over `domain` with the build-time default worker count.
    pub fn new(domain: D, visitor: Visitor<'f, D::Item, E>) -> Self {
        Self {
            domain,
            visitor,
            threads: ThreadConfig::default().threads,
            progress: Box::new(NoProgress),
            affinity: Box::new(NoAffinity),
        }
    }

    /// Take the worker count and pinning choice from a resolved config.
    pub fn config(mut self, cfg: &ThreadConfig) -> Self {
        self.threads = cfg.clamp(cfg.threads);
        if cfg.pin_workers {
            self.affinity = Box::new(RoundRobinCores::new());
        }
        self
    }

    /// Request `threads` workers (0 counts as 1). Never exceeds the domain length.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn progress<P: ProgressReporter + 'f>(mut self, progress: P) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn affinity<A: AffinityHint + 'f>(mut self, affinity: A) -> Self {
        self.affinity = Box::new(affinity);
        self
    }

    /// Run to completion. Returns the first captured failure, if any.
    pub fn run(self) -> Result<(), ForEachError<E>> {
        let ForEach {
            domain,
            visitor,
            threads,
            progress,
            affinity,
        } = self;

        let len = domain.length();
        if len == 0 {
            tracing::debug!("empty domain, nothing to run");
            return Ok(());
        }

        let chunks = chunk::plan(len, threads);
        tracing::debug!(
            len,
            requested = threads,
            workers = chunks.len(),
            random_access = D::RANDOM_ACCESS,
            shape = visitor.shape(),
            "parallel for-each"
        );
        let parts = chunk::split(domain, &chunks);

        let shared = Shared::new(chunks.len(), progress.as_ref(), affinity.as_ref());
        progress.start(chunks.len());

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(parts.len());
            for (chunk, part) in parts {
                let shared = &shared;
                let visitor = &visitor;
                let spawned = thread::Builder::new()
                    .name(worker_name(chunk.worker))
                    .spawn_scoped(scope, move || run_chunk(chunk, part, visitor, shared));
                match spawned {
                    Ok(handle) => handles.push((chunk.worker, handle)),
                    Err(e) => shared.absorb_spawn_error(chunk.worker, e),
                }
            }
            for (worker, handle) in handles {
                shared.absorb_join(worker, handle.join());
            }
        });

        let result = shared.aggregator.into_result();
        if result.is_err() {
            tracing::debug!("parallel for-each finished with a failure");
        }
        result
    }
}

/// Body of one worker: walk the chunk, stop on abort or on the first error.
fn run_chunk<D, E>(
    chunk: Chunk,
    part: D,
    visitor: &Visitor<'_, D::Item, E>,
    shared: &Shared<'_, E>,
) where
    D: Domain,
{
    shared.affinity.pin_current(chunk.worker);
    tracing::trace!(
        worker = chunk.worker,
        start = chunk.start,
        len = chunk.len,
        "worker started"
    );

    for (offset, item) in part.into_elements().enumerate() {
        if shared.aggregator.is_aborting() {
            tracing::trace!(
                worker = chunk.worker,
                processed = offset,
                "abort observed, stopping early"
            );
            break;
        }
        let index = chunk.start + offset;
        if let Err(error) = visitor.call(item, index, chunk.worker) {
            shared.aggregator.offer(ForEachError::Element {
                index,
                worker: chunk.worker,
                error,
            });
            break;
        }
    }

    shared.finish_chunk();
}

/// Run `visitor` over `domain` using the worker count and pinning from `cfg`.
pub fn parallel_for_each<'f, D, E>(
    domain: D,
    visitor: Visitor<'f, D::Item, E>,
    cfg: &ThreadConfig,
) -> Result<(), ForEachError<E>>
where
    D: Domain,
    E: Send,
{
    ForEach::new(domain, visitor).config(cfg).run()
}
