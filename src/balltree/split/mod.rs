//! Split strategies for top-down construction of static ball trees.

mod axis;
mod kd;
mod r#trait;
mod volume;

use bytemuck::Pod;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::balltree::index::{finalize_preorder, StaticBallTree, StaticNode};
use crate::balltree::policy::ConstructionPolicy;
use crate::geometry::Point;
use crate::r#type::BallFloat;

pub use kd::KdSplit;
pub use r#trait::{Split, SplitParams};
pub use volume::VolumeSplit;

/// Build a static tree by recursively splitting the items with `S`.
///
/// Nodes are emitted in pre-order from an explicit stack of ranges; sizes and internal spheres
/// are filled in afterwards from the children.
pub(crate) fn build_top_down<N: BallFloat, const D: usize, P: Pod, S: Split<N, D>>(
    positions: &[Point<N, D>],
    payloads: &[P],
    policy: &ConstructionPolicy,
) -> StaticBallTree<N, D, P> {
    debug_assert_eq!(positions.len(), payloads.len());
    let num_items = positions.len();
    if num_items == 0 {
        return StaticBallTree::new_unchecked(vec![]);
    }

    let mut params = SplitParams {
        depth: 0,
        axis_selection: policy.axis_selection(),
        rng: StdRng::seed_from_u64(policy.seed()),
    };
    let mut ids: Vec<u32> = (0..num_items as u32).collect();
    let mut nodes = Vec::with_capacity(2 * num_items - 1);
    let mut parents = Vec::with_capacity(2 * num_items - 1);

    // (begin, end, depth, parent)
    let mut stack = vec![(0, num_items, 0, u32::MAX)];
    while let Some((begin, end, depth, parent)) = stack.pop() {
        let index = nodes.len() as u32;
        parents.push(parent);

        if end - begin == 1 {
            let id = ids[begin] as usize;
            nodes.push(StaticNode::leaf(positions[id], payloads[id]));
            continue;
        }

        // sphere and size are filled in by `finalize_preorder`
        nodes.push(StaticNode::new(Point::origin(), N::zero(), 1, P::zeroed()));
        params.depth = depth;
        let mid = begin + S::split(&mut params, positions, &mut ids[begin..end]);
        debug_assert!(begin < mid && mid < end);

        stack.push((mid, end, depth + 1, index));
        stack.push((begin, mid, depth + 1, index));
    }

    finalize_preorder(&mut nodes, &parents, true);
    StaticBallTree::new_unchecked(nodes)
}
