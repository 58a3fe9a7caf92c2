//! Chunk partitioning for a domain of known length.
//!
//! A domain of `len` elements split across `threads` workers yields
//! `min(threads, len)` chunks. Every chunk but the last holds `len / workers`
//! elements; the last one absorbs the remainder. The arithmetic lives in
//! `const fn`s so the compile-time index variant can build its table in const
//! context with exactly the same rule.

use crate::domain::Domain;

/// One contiguous, non-overlapping slice of the domain owned by a single worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Worker index, `0..workers`
    pub worker: usize,
    /// Logical index of the chunk's first element
    pub start: usize,
    /// Number of elements (never zero)
    pub len: usize,
}

impl Chunk {
    /// Logical index one past the chunk's last element
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Offset/count pair, usable in const context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub count: usize,
}

impl Span {
    pub const EMPTY: Span = Span { offset: 0, count: 0 };
}

/// Number of workers actually used for `len` elements.
pub const fn worker_count(len: usize, threads: usize) -> usize {
    let threads = if threads == 0 { 1 } else { threads };
    if len < threads {
        len
    } else {
        threads
    }
}

/// Span of `worker` when `len` elements are split across `workers` workers.
///
/// Returns [`Span::EMPTY`] for `worker >= workers`.
pub const fn span(len: usize, workers: usize, worker: usize) -> Span {
    if workers == 0 || worker >= workers {
        return Span::EMPTY;
    }
    let base = len / workers;
    let offset = worker * base;
    let count = if worker == workers - 1 { len - offset } else { base };
    Span { offset, count }
}

/// Compute the chunk plan for `len` elements and `threads` requested workers.
///
/// Empty for `len == 0`. A request of zero threads counts as one.
pub fn plan(len: usize, threads: usize) -> Vec<Chunk> {
    let workers = worker_count(len, threads);
    (0..workers)
        .map(|worker| {
            let s = span(len, workers, worker);
            Chunk {
                worker,
                start: s.offset,
                len: s.count,
            }
        })
        .collect()
}

/// Cut `domain` into the parts described by `chunks`, in order.
///
/// `chunks` must come from [`plan`] over `domain.length()`. Random-access
/// domains split in O(1) per chunk; forward-only domains walk each boundary.
pub fn split<D: Domain>(domain: D, chunks: &[Chunk]) -> Vec<(Chunk, D)> {
    let mut parts = Vec::with_capacity(chunks.len());
    let mut rest = domain;
    for (i, chunk) in chunks.iter().enumerate() {
        if i + 1 == chunks.len() {
            parts.push((*chunk, rest));
            break;
        }
        let (head, tail) = rest.split_front(chunk.len);
        parts.push((*chunk, head));
        rest = tail;
    }
    parts
}
