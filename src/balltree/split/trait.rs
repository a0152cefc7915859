use rand::rngs::StdRng;

use crate::balltree::policy::AxisSelection;
use crate::geometry::Point;
use crate::r#type::BallFloat;

pub struct SplitParams {
    /// Depth of the range being split. The root range has depth 0.
    pub(crate) depth: usize,
    pub(crate) axis_selection: AxisSelection,
    pub(crate) rng: StdRng,
}

/// A strategy for dividing a range of items into two non-empty halves.
pub trait Split<N: BallFloat, const D: usize> {
    /// Reorder `ids` (indices into `positions`) so that `ids[..mid]` forms the left half and
    /// `ids[mid..]` the right half, and return `mid`.
    ///
    /// `ids` holds at least two items; `mid` must lie in `1..ids.len()`.
    fn split(params: &mut SplitParams, positions: &[Point<N, D>], ids: &mut [u32]) -> usize;
}
