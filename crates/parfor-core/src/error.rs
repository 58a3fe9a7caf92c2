//! Error types for parallel iteration and configuration.

use std::any::Any;

use thiserror::Error;

/// The single failure retained by one parallel call.
///
/// Only the first failure observed across all workers is kept; any others are
/// discarded. Wrap the callback yourself if every failure matters.
#[derive(Debug, Error)]
pub enum ForEachError<E> {
    /// The callback returned `Err` for one element
    #[error("element {index} failed on worker {worker}: {error}")]
    Element { index: usize, worker: usize, error: E },

    /// A worker thread panicked instead of returning
    #[error("worker {worker} terminated abnormally: {message}")]
    WorkerPanicked { worker: usize, message: String },

    /// The OS refused to start a worker thread
    #[error("failed to spawn worker {worker}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
}

impl<E> ForEachError<E> {
    /// Worker on which the failure happened.
    pub fn worker(&self) -> usize {
        match self {
            ForEachError::Element { worker, .. }
            | ForEachError::WorkerPanicked { worker, .. }
            | ForEachError::Spawn { worker, .. } => *worker,
        }
    }

    /// The callback's own error, if this is an element failure.
    pub fn element_error(&self) -> Option<&E> {
        match self {
            ForEachError::Element { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Consume into the callback's own error, if this is an element failure.
    pub fn into_element_error(self) -> Option<E> {
        match self {
            ForEachError::Element { error, .. } => Some(error),
            _ => None,
        }
    }

    pub(crate) fn from_panic(worker: usize, payload: Box<dyn Any + Send>) -> Self {
        ForEachError::WorkerPanicked {
            worker,
            message: panic_message(payload.as_ref()),
        }
    }
}

/// Render a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Invalid thread bounds in a [`crate::ThreadConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("min_threads must be at least 1")]
    ZeroMinimum,

    #[error("min_threads ({min}) exceeds max_threads ({max})")]
    InvertedBounds { min: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_error_display() {
        let err: ForEachError<String> = ForEachError::Element {
            index: 1024,
            worker: 2,
            error: "bad value".to_string(),
        };
        assert_eq!(err.to_string(), "element 1024 failed on worker 2: bad value");
        assert_eq!(err.worker(), 2);
        assert_eq!(err.element_error().map(String::as_str), Some("bad value"));
    }

    #[test]
    fn test_panic_message_variants() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(owned.as_ref()), "owned boom");
        let other: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_from_panic_keeps_worker() {
        let err: ForEachError<()> = ForEachError::from_panic(3, Box::new("oops"));
        assert!(matches!(
            err,
            ForEachError::WorkerPanicked { worker: 3, ref message } if message == "oops"
        ));
        assert!(err.into_element_error().is_none());
    }
}
