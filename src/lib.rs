//! parfor: split a slice, iterator or index range across a fixed set of
//! worker threads, stop cooperatively on the first failure and return it.
//!
//! The engine lives in `parfor-core` and is re-exported here; this crate adds
//! terminal progress reporting behind the `progress-bar` feature.

pub use parfor_core::*;

#[cfg(feature = "progress-bar")]
pub mod bar;

#[cfg(feature = "progress-bar")]
pub use bar::BarProgress;
