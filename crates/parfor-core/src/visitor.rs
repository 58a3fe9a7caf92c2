//! Supported callback shapes.
//!
//! The engine accepts a closed set of callback signatures. The caller picks one
//! by constructing the matching variant; the worker dispatches on it for each
//! element. Every shape returns `Result<(), E>` so a failure travels back
//! through the join instead of unwinding.

/// Per-element callback for [`crate::ForEach`].
pub enum Visitor<'f, T, E> {
    /// `f(element)`
    Element(Box<dyn Fn(T) -> Result<(), E> + Sync + 'f>),
    /// `f(element, logical_index)`
    Indexed(Box<dyn Fn(T, usize) -> Result<(), E> + Sync + 'f>),
    /// `f(element, logical_index, worker_index)`
    WithWorker(Box<dyn Fn(T, usize, usize) -> Result<(), E> + Sync + 'f>),
}

impl<'f, T, E> Visitor<'f, T, E> {
    pub fn element<F>(f: F) -> Self
    where
        F: Fn(T) -> Result<(), E> + Sync + 'f,
    {
        Visitor::Element(Box::new(f))
    }

    pub fn indexed<F>(f: F) -> Self
    where
        F: Fn(T, usize) -> Result<(), E> + Sync + 'f,
    {
        Visitor::Indexed(Box::new(f))
    }

    pub fn with_worker<F>(f: F) -> Self
    where
        F: Fn(T, usize, usize) -> Result<(), E> + Sync + 'f,
    {
        Visitor::WithWorker(Box::new(f))
    }

    /// Invoke with whatever arguments this shape takes.
    #[inline]
    pub fn call(&self, item: T, index: usize, worker: usize) -> Result<(), E> {
        match self {
            Visitor::Element(f) => f(item),
            Visitor::Indexed(f) => f(item, index),
            Visitor::WithWorker(f) => f(item, index, worker),
        }
    }

    /// Short name of the shape, for logs.
    pub fn shape(&self) -> &'static str {
        match self {
            Visitor::Element(_) => "element",
            Visitor::Indexed(_) => "indexed",
            Visitor::WithWorker(_) => "with_worker",
        }
    }
}

/// Per-index callback for [`crate::IndexRange`].
pub enum IndexVisitor<'f, I, E> {
    /// `f(index)`
    Index(Box<dyn Fn(I) -> Result<(), E> + Sync + 'f>),
    /// `f(index, worker_index)`
    WithWorker(Box<dyn Fn(I, usize) -> Result<(), E> + Sync + 'f>),
}

impl<'f, I, E> IndexVisitor<'f, I, E> {
    pub fn index<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<(), E> + Sync + 'f,
    {
        IndexVisitor::Index(Box::new(f))
    }

    pub fn with_worker<F>(f: F) -> Self
    where
        F: Fn(I, usize) -> Result<(), E> + Sync + 'f,
    {
        IndexVisitor::WithWorker(Box::new(f))
    }

    #[inline]
    pub fn call(&self, index: I, worker: usize) -> Result<(), E> {
        match self {
            IndexVisitor::Index(f) => f(index),
            IndexVisitor::WithWorker(f) => f(index, worker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_shapes_receive_expected_arguments() {
        let seen = AtomicUsize::new(0);

        let element: Visitor<'_, usize, ()> = Visitor::element(|item| {
            seen.fetch_add(item, Ordering::Relaxed);
            Ok(())
        });
        element.call(1, 100, 1000).unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 1);

        let indexed: Visitor<'_, usize, ()> = Visitor::indexed(|item, index| {
            seen.fetch_add(item + index, Ordering::Relaxed);
            Ok(())
        });
        indexed.call(1, 100, 1000).unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 102);

        let with_worker: Visitor<'_, usize, ()> = Visitor::with_worker(|item, index, worker| {
            seen.fetch_add(item + index + worker, Ordering::Relaxed);
            Ok(())
        });
        with_worker.call(1, 100, 1000).unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 1203);
        assert_eq!(with_worker.shape(), "with_worker");
    }

    #[test]
    fn test_error_is_passed_through() {
        let visitor: Visitor<'_, u8, String> =
            Visitor::element(|item| if item == 3 { Err("three".to_string()) } else { Ok(()) });
        assert!(visitor.call(1, 0, 0).is_ok());
        assert_eq!(visitor.call(3, 0, 0), Err("three".to_string()));
    }

    #[test]
    fn test_index_visitor_with_worker() {
        let visitor: IndexVisitor<'_, u32, ()> =
            IndexVisitor::with_worker(|index, worker| {
                if index == 7 && worker == 2 {
                    Err(())
                } else {
                    Ok(())
                }
            });
        assert!(visitor.call(7, 1).is_ok());
        assert!(visitor.call(7, 2).is_err());
    }
}
