//! Core library for parfor: chunked parallel for-each with cooperative abort
//! and first-error-wins aggregation.
//!
//! Two entry points share one protocol:
//! - [`ForEach`] / [`parallel_for_each`] over a runtime [`Domain`] (slices,
//!   index ranges, or any cloneable iterator via [`forward`]);
//! - [`IndexRange`] / [`parallel_for_index`] over a range fixed at compile time.

pub mod affinity;
pub mod chunk;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod failure;
pub mod index;
pub mod progress;
pub mod visitor;

// Re-export main API
pub use affinity::{AffinityHint, NoAffinity, RoundRobinCores};
pub use chunk::{plan, Chunk, Span};
pub use config::{ThreadConfig, DEFAULT_THREADS, MAX_THREADS, MIN_THREADS};
pub use domain::{forward, Domain, Forward};
pub use engine::{parallel_for_each, ForEach};
pub use error::{ConfigError, ForEachError};
pub use failure::{AbortSignal, ErrorAggregator, FailureState};
pub use index::{parallel_for_index, IndexRange, StepIndex};
pub use progress::{NoProgress, ProgressReporter};
pub use visitor::{IndexVisitor, Visitor};
