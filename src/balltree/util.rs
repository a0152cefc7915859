//! Small helpers shared by construction and querying.

use std::cmp::Ordering;

use crate::r#type::BallFloat;

/// Total order on floats for sorting and selection. NaN compares equal to everything.
#[inline]
pub(crate) fn cmp_float<N: BallFloat>(a: N, b: N) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// A wrapper around an item and its key for use in a priority queue.
///
/// `BinaryHeap<Keyed<..>>` pops the largest key first; wrap in [`std::cmp::Reverse`] to pop the
/// smallest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Keyed<N: BallFloat, T> {
    pub(crate) key: N,
    pub(crate) item: T,
}

impl<N: BallFloat, T> Keyed<N, T> {
    #[inline]
    pub(crate) fn new(key: N, item: T) -> Self {
        Self { key, item }
    }
}

impl<N: BallFloat, T> PartialEq for Keyed<N, T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N: BallFloat, T> Eq for Keyed<N, T> {}

impl<N: BallFloat, T> Ord for Keyed<N, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_float(self.key, other.key)
    }
}

impl<N: BallFloat, T> PartialOrd for Keyed<N, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
