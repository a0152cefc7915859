use std::collections::BinaryHeap;

use bytemuck::Pod;
use tinyvec::TinyVec;

use crate::balltree::region::{Overlap, QueryRegion};
use crate::balltree::traversal::Node;
use crate::balltree::util::{cmp_float, Keyed};
use crate::geometry::{Point, Rect, Sphere};
use crate::node_id::NodeId;
use crate::r#type::BallFloat;

/// A single result of a nearest-neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<N: BallFloat> {
    /// The leaf holding the item.
    pub node: NodeId,
    /// Squared Euclidean distance from the query point to the item.
    pub distance_squared: N,
}

/// Reusable traversal buffers for queries.
///
/// Every query method has a `_with` variant taking one of these, so that repeated queries do
/// not allocate. Stacks stay inline for shallow trees and spill to the heap otherwise; size
/// them up front with [`QueryScratch::with_max_depth`] to avoid growth mid-query.
#[derive(Debug, Clone, Default)]
pub struct QueryScratch<N: BallFloat> {
    pub(crate) stack: TinyVec<[NodeId; 32]>,
    pub(crate) bounded: TinyVec<[(NodeId, N); 32]>,
    pub(crate) heap: BinaryHeap<Keyed<N, NodeId>>,
}

impl<N: BallFloat> QueryScratch<N> {
    /// Create empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create buffers large enough for any query on a tree of depth `max_depth`.
    pub fn with_max_depth(max_depth: usize) -> Self {
        let mut scratch = Self::default();
        scratch.stack.reserve(max_depth + 1);
        scratch.bounded.reserve(2 * max_depth + 1);
        scratch
    }
}

/// A trait for searching and accessing data out of a ball tree.
///
/// Both the [`DynamicBallTree`][crate::balltree::DynamicBallTree] and the
/// [`StaticBallTree`][crate::balltree::StaticBallTree] implement the few required accessors;
/// every query is provided on top of them with one iterative traversal.
pub trait BallTreeIndex<N: BallFloat, const D: usize>: Sized {
    /// The per-item payload stored in each leaf.
    type Payload: Pod;

    /// The number of items (leaves) in this tree.
    fn num_items(&self) -> usize;

    /// The root node, or `None` if the tree is empty.
    fn root_id(&self) -> Option<NodeId>;

    /// The bounding sphere of `node`. Leaves have radius zero and are centered on their item.
    fn sphere(&self, node: NodeId) -> Sphere<N, D>;

    /// The two children of `node`, or `None` if it is a leaf.
    fn children(&self, node: NodeId) -> Option<(NodeId, NodeId)>;

    /// The payload of the leaf `node`.
    fn payload(&self, node: NodeId) -> &Self::Payload;

    /// Returns `true` if this tree holds no items.
    fn is_empty(&self) -> bool {
        self.num_items() == 0
    }

    /// Returns `true` if `node` is a leaf.
    fn is_leaf(&self, node: NodeId) -> bool {
        self.children(node).is_none()
    }

    /// The position of the leaf `node`.
    fn position(&self, node: NodeId) -> Point<N, D> {
        *self.sphere(node).center()
    }

    /// The number of leaves below (and including) `node`.
    fn leaf_count(&self, node: NodeId) -> usize {
        let mut stack = vec![node];
        let mut count = 0;
        while let Some(node) = stack.pop() {
            match self.children(node) {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => count += 1,
            }
        }
        count
    }

    /// The summed volume proxy of every node's bounding sphere.
    ///
    /// Lower is better: tighter spheres prune more during queries.
    fn volume(&self) -> N {
        let Some(root) = self.root_id() else {
            return N::zero();
        };
        let mut stack = vec![root];
        let mut total = N::zero();
        while let Some(node) = stack.pop() {
            total = total + self.sphere(node).volume();
            if let Some((left, right)) = self.children(node) {
                stack.push(right);
                stack.push(left);
            }
        }
        total
    }

    /// Access the root node of the tree for manual traversal.
    fn root(&self) -> Option<Node<'_, N, D, Self>> {
        self.root_id().map(|id| Node::new(self, id))
    }

    /// Find the item closest to `point`.
    ///
    /// Returns `None` only if the tree is empty.
    fn nearest(&self, point: &Point<N, D>) -> Option<Neighbor<N>> {
        self.nearest_with(point, &mut QueryScratch::new())
    }

    /// Find the item closest to `point`, reusing `scratch` for the traversal stack.
    fn nearest_with(
        &self,
        point: &Point<N, D>,
        scratch: &mut QueryScratch<N>,
    ) -> Option<Neighbor<N>> {
        let root = self.root_id()?;
        let stack = &mut scratch.bounded;
        stack.clear();

        let mut best: Option<Neighbor<N>> = None;
        // distance (not squared) of the current best, compared against lower bounds
        let mut acceptance = N::infinity();
        let mut next = Some(root);

        loop {
            let node = match next.take() {
                Some(node) => node,
                None => match stack.pop() {
                    Some((node, bound)) => {
                        if bound > acceptance {
                            continue;
                        }
                        node
                    }
                    None => break,
                },
            };

            match self.children(node) {
                None => {
                    let distance_squared = point.distance_squared(self.sphere(node).center());
                    if best.map_or(true, |b| distance_squared < b.distance_squared) {
                        best = Some(Neighbor {
                            node,
                            distance_squared,
                        });
                        acceptance = distance_squared.sqrt();
                    }
                }
                Some((left, right)) => {
                    let ((near, near_bound), (far, far_bound)) =
                        order_children(self, point, left, right);
                    if far_bound <= acceptance {
                        stack.push((far, far_bound));
                    }
                    if near_bound <= acceptance {
                        next = Some(near);
                    }
                }
            }
        }

        best
    }

    /// Find the `k` items closest to `point`, sorted by ascending distance.
    ///
    /// Returns `min(k, num_items)` results.
    fn nearest_k(&self, point: &Point<N, D>, k: usize) -> Vec<Neighbor<N>> {
        self.nearest_k_with(point, k, &mut QueryScratch::new())
    }

    /// Find the `k` items closest to `point`, reusing `scratch` for the traversal stack and
    /// the candidate heap.
    fn nearest_k_with(
        &self,
        point: &Point<N, D>,
        k: usize,
        scratch: &mut QueryScratch<N>,
    ) -> Vec<Neighbor<N>> {
        let stack = &mut scratch.bounded;
        let heap = &mut scratch.heap;
        stack.clear();
        heap.clear();

        let root = match self.root_id() {
            Some(root) if k > 0 => root,
            _ => return vec![],
        };

        // distance (not squared) of the k-th best candidate once the heap is full
        let mut acceptance = N::infinity();
        let mut next = Some(root);

        loop {
            let node = match next.take() {
                Some(node) => node,
                None => match stack.pop() {
                    Some((node, bound)) => {
                        if bound > acceptance {
                            continue;
                        }
                        node
                    }
                    None => break,
                },
            };

            match self.children(node) {
                None => {
                    let distance_squared = point.distance_squared(self.sphere(node).center());
                    if heap.len() < k {
                        heap.push(Keyed::new(distance_squared, node));
                    } else if heap.peek().is_some_and(|worst| distance_squared < worst.key) {
                        heap.pop();
                        heap.push(Keyed::new(distance_squared, node));
                    }
                    if heap.len() == k {
                        if let Some(worst) = heap.peek() {
                            acceptance = worst.key.sqrt();
                        }
                    }
                }
                Some((left, right)) => {
                    let ((near, near_bound), (far, far_bound)) =
                        order_children(self, point, left, right);
                    if far_bound <= acceptance {
                        stack.push((far, far_bound));
                    }
                    if near_bound <= acceptance {
                        next = Some(near);
                    }
                }
            }
        }

        let mut results: Vec<Neighbor<N>> = heap
            .drain()
            .map(|entry| Neighbor {
                node: entry.item,
                distance_squared: entry.key,
            })
            .collect();
        results.sort_by(|a, b| cmp_float(a.distance_squared, b.distance_squared));
        results
    }

    /// Visit every item inside `region` in pre-order.
    ///
    /// Internal nodes whose sphere lies entirely inside the region are handed to
    /// `on_contained`. If it returns `true`, the leaves below the node are enumerated through
    /// `on_leaf`; if it returns `false`, the whole subtree counts as reported and is skipped
    /// (use [`BallTreeIndex::leaf_count`] to account for it). Every other leaf inside the region
    /// goes to `on_leaf`.
    fn visit_region<R, C, L>(
        &self,
        region: &R,
        scratch: &mut QueryScratch<N>,
        mut on_contained: C,
        mut on_leaf: L,
    ) where
        R: QueryRegion<N, D>,
        C: FnMut(NodeId) -> bool,
        L: FnMut(NodeId),
    {
        let stack = &mut scratch.stack;
        stack.clear();
        let Some(root) = self.root_id() else {
            return;
        };

        let mut next = Some(root);
        while let Some(node) = next.take().or_else(|| stack.pop()) {
            let sphere = self.sphere(node);
            let Some((left, right)) = self.children(node) else {
                if region.contains_point(sphere.center()) {
                    on_leaf(node);
                }
                continue;
            };

            match region.classify(&sphere) {
                Overlap::Disjoint => {}
                Overlap::Partial => {
                    stack.push(right);
                    next = Some(left);
                }
                Overlap::Contained => {
                    if on_contained(node) {
                        // enumerate the subtree on top of the pending entries
                        let base = stack.len();
                        stack.push(node);
                        while stack.len() > base {
                            let Some(inner) = stack.pop() else {
                                break;
                            };
                            match self.children(inner) {
                                Some((l, r)) => {
                                    stack.push(r);
                                    stack.push(l);
                                }
                                None => on_leaf(inner),
                            }
                        }
                    }
                }
            }
        }
    }

    /// Visit every item inside `rect`. See [`BallTreeIndex::visit_region`].
    fn visit_rect<C, L>(&self, rect: &Rect<N, D>, on_contained: C, on_leaf: L)
    where
        C: FnMut(NodeId) -> bool,
        L: FnMut(NodeId),
    {
        self.visit_region(rect, &mut QueryScratch::new(), on_contained, on_leaf)
    }

    /// Visit every item inside `sphere`. See [`BallTreeIndex::visit_region`].
    fn visit_sphere<C, L>(&self, sphere: &Sphere<N, D>, on_contained: C, on_leaf: L)
    where
        C: FnMut(NodeId) -> bool,
        L: FnMut(NodeId),
    {
        self.visit_region(sphere, &mut QueryScratch::new(), on_contained, on_leaf)
    }

    /// Count the items inside `region`, counting fully contained subtrees without visiting
    /// their leaves.
    fn count_region<R: QueryRegion<N, D>>(&self, region: &R, scratch: &mut QueryScratch<N>) -> usize {
        let mut contained = 0;
        let mut leaves = 0;
        self.visit_region(
            region,
            scratch,
            |node| {
                contained += self.leaf_count(node);
                false
            },
            |_| leaves += 1,
        );
        contained + leaves
    }

    /// Count the items inside `rect`.
    fn count_rect(&self, rect: &Rect<N, D>) -> usize {
        self.count_region(rect, &mut QueryScratch::new())
    }

    /// Count the items inside `sphere`.
    fn count_sphere(&self, sphere: &Sphere<N, D>) -> usize {
        self.count_region(sphere, &mut QueryScratch::new())
    }

    /// Search the tree for items inside `rect`.
    ///
    /// Returns the leaf ids of the found items.
    fn search_rect(&self, rect: &Rect<N, D>) -> Vec<NodeId> {
        let mut result = vec![];
        self.visit_rect(rect, |_| true, |node| result.push(node));
        result
    }

    /// Search the tree for items inside `sphere`.
    ///
    /// Returns the leaf ids of the found items.
    fn search_sphere(&self, sphere: &Sphere<N, D>) -> Vec<NodeId> {
        let mut result = vec![];
        self.visit_sphere(sphere, |_| true, |node| result.push(node));
        result
    }
}

/// Lower bound on the distance from `point` to anything inside `node`. Negative when `point`
/// lies inside the node's sphere.
#[inline]
fn lower_bound<N: BallFloat, const D: usize, T: BallTreeIndex<N, D>>(
    tree: &T,
    point: &Point<N, D>,
    node: NodeId,
) -> N {
    let sphere = tree.sphere(node);
    let distance = point.distance(sphere.center());
    distance - sphere.radius() - (distance + sphere.radius()) * N::TOLERANCE
}

/// Order two children by their lower bound, nearer first.
#[inline]
fn order_children<N: BallFloat, const D: usize, T: BallTreeIndex<N, D>>(
    tree: &T,
    point: &Point<N, D>,
    left: NodeId,
    right: NodeId,
) -> ((NodeId, N), (NodeId, N)) {
    let left_bound = lower_bound(tree, point, left);
    let right_bound = lower_bound(tree, point, right);
    if left_bound <= right_bound {
        ((left, left_bound), (right, right_bound))
    } else {
        ((right, right_bound), (left, left_bound))
    }
}
