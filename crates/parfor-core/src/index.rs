//! Parallel loop over an index range fixed at compile time.
//!
//! `IndexRange<I, START, END, STEP, THREADS>` computes its length, worker count
//! and per-worker spans as associated constants, using the same split as the
//! runtime chunker. Each span runs on its own scoped thread; the abort flag is
//! checked once before a span starts rather than before every index.

use std::marker::PhantomData;
use std::thread;

use crate::affinity::{AffinityHint, NoAffinity};
use crate::chunk::{self, Span};
use crate::engine::{worker_name, Shared};
use crate::error::ForEachError;
use crate::progress::{NoProgress, ProgressReporter};
use crate::visitor::IndexVisitor;

/// Integer type handed to an index callback.
///
/// Range bounds are `usize` const parameters, so only unsigned types apply.
pub trait StepIndex: Copy + Send + Sync + 'static {
    /// Largest value representable, widened
    const MAX: u128;

    /// Convert an index already checked against [`StepIndex::MAX`].
    fn from_usize(value: usize) -> Self;
}

macro_rules! impl_step_index {
    ($($t:ty),* $(,)?) => {
        $(
            impl StepIndex for $t {
                const MAX: u128 = <$t>::MAX as u128;

                #[inline(always)]
                fn from_usize(value: usize) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_step_index!(u8, u16, u32, u64, usize);

/// Compile-time index range `[START, END)` with stride `STEP`, split across
/// `THREADS` workers.
///
/// Invalid parameters fail the build when the range is used.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use parfor_core::{IndexRange, IndexVisitor};
///
/// let hits = AtomicUsize::new(0);
/// IndexRange::<u32, 0, 100, 10, 4>::for_each(IndexVisitor::index(|_i: u32| {
///     hits.fetch_add(1, Ordering::Relaxed);
///     Ok::<(), ()>(())
/// }))
/// .unwrap();
/// assert_eq!(hits.load(Ordering::Relaxed), 10);
/// ```
pub struct IndexRange<
    I,
    const START: usize,
    const END: usize,
    const STEP: usize,
    const THREADS: usize,
> {
    _index: PhantomData<I>,
}

impl<I, const START: usize, const END: usize, const STEP: usize, const THREADS: usize>
    IndexRange<I, START, END, STEP, THREADS>
where
    I: StepIndex,
{
    const CHECK: () = {
        assert!(STEP > 0, "index range step must be non-zero");
        assert!(THREADS > 0, "index range needs at least one thread");
        assert!(START <= END, "index range start exceeds end");
        assert!(
            END == 0 || (END - 1) as u128 <= I::MAX,
            "index range does not fit the index type"
        );
    };

    /// Number of indices visited
    pub const LEN: usize = if START >= END {
        0
    } else {
        (END - START - 1) / STEP + 1
    };

    /// Workers actually started
    pub const WORKERS: usize = chunk::worker_count(Self::LEN, THREADS);

    /// Position span per worker; entries at or past `WORKERS` are empty.
    pub const SPANS: [Span; THREADS] = {
        let mut spans = [Span::EMPTY; THREADS];
        let mut w = 0;
        while w < Self::WORKERS {
            spans[w] = chunk::span(Self::LEN, Self::WORKERS, w);
            w += 1;
        }
        spans
    };

    /// Index value at position `pos` of the range
    #[inline(always)]
    pub const fn index_at(pos: usize) -> usize {
        START + pos * STEP
    }

    /// Run `visitor` for every index in the range.
    pub fn for_each<E: Send>(visitor: IndexVisitor<'_, I, E>) -> Result<(), ForEachError<E>> {
        Self::run_with(visitor, &NoProgress, &NoAffinity)
    }

    /// Like [`for_each`](Self::for_each), with a progress reporter and affinity hint.
    pub fn run_with<E: Send>(
        visitor: IndexVisitor<'_, I, E>,
        progress: &dyn ProgressReporter,
        affinity: &dyn AffinityHint,
    ) -> Result<(), ForEachError<E>> {
        #[allow(clippy::let_unit_value)]
        let () = Self::CHECK;

        if Self::LEN == 0 {
            tracing::debug!(start = START, end = END, "empty index range, nothing to run");
            return Ok(());
        }
        tracing::debug!(
            start = START,
            end = END,
            step = STEP,
            len = Self::LEN,
            workers = Self::WORKERS,
            "parallel for-index"
        );

        let shared = Shared::new(Self::WORKERS, progress, affinity);
        progress.start(Self::WORKERS);

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(Self::WORKERS);
            for worker in 0..Self::WORKERS {
                let shared = &shared;
                let visitor = &visitor;
                let spawned = thread::Builder::new()
                    .name(worker_name(worker))
                    .spawn_scoped(scope, move || Self::run_span(worker, visitor, shared));
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(e) => shared.absorb_spawn_error(worker, e),
                }
            }
            for (worker, handle) in handles {
                shared.absorb_join(worker, handle.join());
            }
        });

        shared.aggregator.into_result()
    }

    fn run_span<E>(worker: usize, visitor: &IndexVisitor<'_, I, E>, shared: &Shared<'_, E>) {
        shared.affinity.pin_current(worker);
        if shared.aggregator.is_aborting() {
            tracing::trace!(worker, "abort observed before span start");
            shared.finish_chunk();
            return;
        }

        // Walk positions, not index values: the index one stride past the
        // last may not fit in usize.
        let span = Self::SPANS[worker];
        for pos in span.offset..span.offset + span.count {
            let index = Self::index_at(pos);
            if let Err(error) = visitor.call(I::from_usize(index), worker) {
                shared.aggregator.offer(ForEachError::Element { index, worker, error });
                break;
            }
        }

        shared.finish_chunk();
    }
}

/// Run `visitor` over the compile-time range `[START, END)` stepping by `STEP`
/// on `THREADS` workers.
pub fn parallel_for_index<
    I,
    E,
    const START: usize,
    const END: usize,
    const STEP: usize,
    const THREADS: usize,
>(
    visitor: IndexVisitor<'_, I, E>,
) -> Result<(), ForEachError<E>>
where
    I: StepIndex,
    E: Send,
{
    IndexRange::<I, START, END, STEP, THREADS>::for_each(visitor)
}
