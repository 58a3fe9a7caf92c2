//! Cooperative abort and first-error-wins aggregation.
//!
//! One [`ErrorAggregator`] lives for the duration of a parallel call. It starts
//! [`FailureState::Idle`]; the first offered failure is stored, the abort flag
//! is raised and the state becomes [`FailureState::Aborting`] for good. Later
//! offers are dropped.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::ForEachError;

/// Shared flag asking workers to stop between elements.
#[derive(Debug, Default)]
pub struct AbortSignal {
    raised: AtomicBool,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Raise the flag. There is no way to lower it.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureState {
    /// No failure captured yet
    Idle,
    /// A failure was captured and workers are asked to stop
    Aborting,
}

/// Write-once capture slot for the first failure of a call.
#[derive(Debug)]
pub struct ErrorAggregator<E> {
    slot: Mutex<Option<ForEachError<E>>>,
    abort: AbortSignal,
}

impl<E> Default for ErrorAggregator<E> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
            abort: AbortSignal::new(),
        }
    }
}

impl<E> ErrorAggregator<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The abort flag tied to this aggregator
    pub fn signal(&self) -> &AbortSignal {
        &self.abort
    }

    #[inline]
    pub fn is_aborting(&self) -> bool {
        self.abort.is_raised()
    }

    pub fn state(&self) -> FailureState {
        if self.is_aborting() {
            FailureState::Aborting
        } else {
            FailureState::Idle
        }
    }

    /// Offer a failure. Returns `true` if it was captured, `false` if an
    /// earlier failure already holds the slot.
    pub fn offer(&self, failure: ForEachError<E>) -> bool {
        if self.abort.is_raised() {
            tracing::trace!(worker = failure.worker(), "failure discarded, already aborting");
            return false;
        }
        let mut slot = self.slot.lock();
        if slot.is_some() {
            tracing::trace!(worker = failure.worker(), "failure discarded, slot taken");
            return false;
        }
        tracing::debug!(worker = failure.worker(), "captured first failure, aborting");
        *slot = Some(failure);
        self.abort.raise();
        true
    }

    /// Take the captured failure, if any. Call only after every worker joined.
    pub fn into_result(self) -> Result<(), ForEachError<E>> {
        match self.slot.into_inner() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}
