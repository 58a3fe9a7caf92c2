//! Iteration domains.
//!
//! A [`Domain`] knows its length and can split off a prefix so the chunker can
//! hand each worker its own part. Slices and index ranges are random access
//! (O(1) length and split); [`Forward`] wraps any cloneable iterator and pays a
//! linear walk for both.

use std::ops::Range;

/// A sequence the engine can partition across workers.
pub trait Domain: Send + Sized {
    /// Element handed to the callback
    type Item;
    /// Iterator over one part's elements, in domain order
    type Elements: Iterator<Item = Self::Item>;

    /// Whether boundaries are computed by position arithmetic
    const RANDOM_ACCESS: bool;

    /// Number of elements
    fn length(&self) -> usize;

    /// Split into the first `len` elements and the rest.
    fn split_front(self, len: usize) -> (Self, Self);

    /// Consume this part into its elements.
    fn into_elements(self) -> Self::Elements;
}

impl<'a, T: Sync> Domain for &'a [T] {
    type Item = &'a T;
    type Elements = std::slice::Iter<'a, T>;

    const RANDOM_ACCESS: bool = true;

    fn length(&self) -> usize {
        self.len()
    }

    fn split_front(self, len: usize) -> (Self, Self) {
        self.split_at(len)
    }

    fn into_elements(self) -> Self::Elements {
        self.iter()
    }
}

impl<'a, T: Send> Domain for &'a mut [T] {
    type Item = &'a mut T;
    type Elements = std::slice::IterMut<'a, T>;

    const RANDOM_ACCESS: bool = true;

    fn length(&self) -> usize {
        self.len()
    }

    fn split_front(self, len: usize) -> (Self, Self) {
        self.split_at_mut(len)
    }

    fn into_elements(self) -> Self::Elements {
        self.iter_mut()
    }
}

impl Domain for Range<usize> {
    type Item = usize;
    type Elements = Range<usize>;

    const RANDOM_ACCESS: bool = true;

    fn length(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    fn split_front(self, len: usize) -> (Self, Self) {
        let mid = self.start + len.min(self.length());
        (self.start..mid, mid..self.end)
    }

    fn into_elements(self) -> Self::Elements {
        self
    }
}

/// Forward-only domain over a cloneable iterator.
///
/// The length is counted once on construction by walking a clone of the
/// iterator. Splitting walks the cursor forward past the head.
#[derive(Clone, Debug)]
pub struct Forward<I> {
    iter: I,
    len: usize,
}

impl<I> Forward<I>
where
    I: Iterator + Clone,
{
    /// Wrap `iter`, counting its elements.
    pub fn new(iter: I) -> Self {
        let len = iter.clone().count();
        Self { iter, len }
    }
}

/// Shorthand for [`Forward::new`] on anything iterable.
pub fn forward<C>(items: C) -> Forward<C::IntoIter>
where
    C: IntoIterator,
    C::IntoIter: Clone,
{
    Forward::new(items.into_iter())
}

impl<I> Domain for Forward<I>
where
    I: Iterator + Clone + Send,
{
    type Item = I::Item;
    type Elements = std::iter::Take<I>;

    const RANDOM_ACCESS: bool = false;

    fn length(&self) -> usize {
        self.len
    }

    fn split_front(mut self, len: usize) -> (Self, Self) {
        let len = len.min(self.len);
        let head = Forward {
            iter: self.iter.clone(),
            len,
        };
        if len > 0 {
            self.iter.nth(len - 1);
        }
        let tail = Forward {
            iter: self.iter,
            len: self.len - len,
        };
        (head, tail)
    }

    fn into_elements(self) -> Self::Elements {
        self.iter.take(self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::LinkedList;

    #[test]
    fn test_range_split() {
        let (head, tail) = (10usize..20).split_front(4);
        assert_eq!(head, 10..14);
        assert_eq!(tail, 14..20);
        assert_eq!(tail.length(), 6);
    }

    #[test]
    fn test_forward_counts_and_splits() {
        let list: LinkedList<u32> = (0..7).collect();
        let domain = forward(&list);
        assert_eq!(domain.length(), 7);

        let (head, tail) = domain.split_front(3);
        assert_eq!(head.length(), 3);
        assert_eq!(tail.length(), 4);
        assert_eq!(head.into_elements().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(tail.into_elements().copied().collect::<Vec<_>>(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_mut_slice_parts_are_disjoint() {
        let mut data = [0u8; 6];
        let (head, tail) = (&mut data[..]).split_front(2);
        for item in head.into_elements() {
            *item = 1;
        }
        for item in tail.into_elements() {
            *item = 2;
        }
        assert_eq!(data, [1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_random_access_flags() {
        assert!(<&[u8] as Domain>::RANDOM_ACCESS);
        assert!(!<Forward<std::vec::IntoIter<u8>> as Domain>::RANDOM_ACCESS);
    }
}
