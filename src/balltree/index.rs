use std::borrow::Cow;

use bytemuck::Pod;

use crate::balltree::r#trait::{BallTreeIndex, QueryScratch};
use crate::error::{KdSearchError, Result};
use crate::geometry::{Point, Sphere};
use crate::node_id::NodeId;
use crate::r#type::BallFloat;

/// One node of a [`StaticBallTree`].
///
/// Nodes are stored in pre-order. A node with `subtree_size == 1` is a leaf; otherwise its left
/// child is the next node and its right child follows the left child's subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticNode<N: BallFloat, const D: usize, P: Pod> {
    center: Point<N, D>,
    radius: N,
    subtree_size: u32,
    payload: P,
}

impl<N: BallFloat, const D: usize, P: Pod> StaticNode<N, D, P> {
    /// Create a node from its parts.
    pub fn new(center: Point<N, D>, radius: N, subtree_size: u32, payload: P) -> Self {
        Self {
            center,
            radius,
            subtree_size,
            payload,
        }
    }

    pub(crate) fn leaf(position: Point<N, D>, payload: P) -> Self {
        Self::new(position, N::zero(), 1, payload)
    }

    /// The center of this node's bounding sphere.
    pub fn center(&self) -> &Point<N, D> {
        &self.center
    }

    /// The radius of this node's bounding sphere.
    pub fn radius(&self) -> N {
        self.radius
    }

    /// The bounding sphere of this node.
    pub fn sphere(&self) -> Sphere<N, D> {
        Sphere::new(self.center, self.radius)
    }

    /// The number of nodes in this node's subtree, itself included.
    pub fn subtree_size(&self) -> u32 {
        self.subtree_size
    }

    /// The payload. Internal nodes hold a zeroed payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn is_leaf(&self) -> bool {
        self.subtree_size == 1
    }

    fn set_sphere(&mut self, sphere: Sphere<N, D>) {
        self.center = *sphere.center();
        self.radius = sphere.radius();
    }
}

/// Summary of a static tree, computed once when the tree is built or validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeInfo {
    num_items: usize,
    num_nodes: usize,
    max_depth: usize,
}

impl TreeInfo {
    /// Validate the pre-order layout of `nodes` and compute its summary.
    pub fn try_new<N: BallFloat, const D: usize, P: Pod>(
        nodes: &[StaticNode<N, D, P>],
    ) -> Result<Self> {
        let num_nodes = nodes.len();
        if num_nodes == 0 {
            return Ok(Self::default());
        }
        if num_nodes % 2 == 0 {
            return Err(KdSearchError::General(format!(
                "A tree must have an odd number of nodes, got {num_nodes}."
            )));
        }

        let root_size = nodes[0].subtree_size as usize;
        if root_size != num_nodes {
            return Err(KdSearchError::Length {
                expected: num_nodes,
                actual: root_size,
            });
        }

        for (i, node) in nodes.iter().enumerate() {
            let size = node.subtree_size as usize;
            if size == 0 || size % 2 == 0 || i + size > num_nodes {
                return Err(KdSearchError::General(format!(
                    "Invalid subtree size {size} at node {i}."
                )));
            }
            if size == 1 {
                continue;
            }
            // `i + size <= num_nodes` and `size >= 3` keep both children in bounds
            let left = i + 1;
            let left_size = nodes[left].subtree_size as usize;
            let right = left + left_size;
            if right >= i + size {
                return Err(KdSearchError::General(format!(
                    "Left child of node {i} overruns its parent."
                )));
            }
            let right_size = nodes[right].subtree_size as usize;
            if 1 + left_size + right_size != size {
                return Err(KdSearchError::Length {
                    expected: size,
                    actual: 1 + left_size + right_size,
                });
            }
        }

        Ok(Self::new_unchecked(nodes))
    }

    /// Compute the summary of a layout already known to be valid.
    pub(crate) fn new_unchecked<N: BallFloat, const D: usize, P: Pod>(
        nodes: &[StaticNode<N, D, P>],
    ) -> Self {
        let num_nodes = nodes.len();
        let mut depths = vec![0usize; num_nodes];
        let mut max_depth = 0;
        for i in 0..num_nodes {
            let depth = depths[i];
            max_depth = max_depth.max(depth);
            if !nodes[i].is_leaf() {
                let left = i + 1;
                let right = left + nodes[left].subtree_size as usize;
                depths[left] = depth + 1;
                depths[right] = depth + 1;
            }
        }
        Self {
            num_items: (num_nodes + 1) / 2,
            num_nodes,
            max_depth,
        }
    }

    /// The number of items (leaves).
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The number of nodes, `2 * num_items - 1` for a non-empty tree.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// The depth of the deepest leaf. The root has depth 0.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Fill subtree sizes (and optionally internal spheres) of a pre-order node array.
///
/// `parents[i]` is the parent of node `i` (ignored for the root). Every size must start at 1.
/// Children always come after their parent, so one backward pass sees each node complete.
pub(crate) fn finalize_preorder<N: BallFloat, const D: usize, P: Pod>(
    nodes: &mut [StaticNode<N, D, P>],
    parents: &[u32],
    refit: bool,
) {
    debug_assert_eq!(nodes.len(), parents.len());
    for i in (0..nodes.len()).rev() {
        if refit && !nodes[i].is_leaf() {
            let left = i + 1;
            let right = left + nodes[left].subtree_size as usize;
            let sphere = nodes[left].sphere().bounding_sphere(&nodes[right].sphere());
            nodes[i].set_sphere(sphere);
        }
        if i > 0 {
            let parent = parents[i] as usize;
            nodes[parent].subtree_size += nodes[i].subtree_size;
        }
    }
}

#[inline]
fn children_of<N: BallFloat, const D: usize, P: Pod>(
    nodes: &[StaticNode<N, D, P>],
    node: NodeId,
) -> Option<(NodeId, NodeId)> {
    let i = node.get();
    if nodes[i].is_leaf() {
        return None;
    }
    let left = i + 1;
    let right = left + nodes[left].subtree_size as usize;
    Some((NodeId::new(left), NodeId::new(right)))
}

/// An owned, immutable ball tree stored as a pre-order array of nodes.
///
/// Usually this will be created from scratch via
/// [`StaticBallTreeBuilder`][crate::balltree::StaticBallTreeBuilder].
#[derive(Debug, Clone, PartialEq)]
pub struct StaticBallTree<N: BallFloat, const D: usize, P: Pod> {
    pub(crate) nodes: Vec<StaticNode<N, D, P>>,
    pub(crate) info: TreeInfo,
}

impl<N: BallFloat, const D: usize, P: Pod> StaticBallTree<N, D, P> {
    /// Take ownership of a node array after validating its layout.
    pub fn try_new(nodes: Vec<StaticNode<N, D, P>>) -> Result<Self> {
        let info = TreeInfo::try_new(&nodes)?;
        Ok(Self { nodes, info })
    }

    pub(crate) fn new_unchecked(nodes: Vec<StaticNode<N, D, P>>) -> Self {
        let info = TreeInfo::new_unchecked(&nodes);
        Self { nodes, info }
    }

    pub fn info(&self) -> &TreeInfo {
        &self.info
    }

    /// The nodes in pre-order.
    pub fn nodes(&self) -> &[StaticNode<N, D, P>] {
        &self.nodes
    }

    pub fn into_inner(self) -> Vec<StaticNode<N, D, P>> {
        self.nodes
    }

    pub fn as_tree_ref(&self) -> StaticBallTreeRef<'_, N, D, P> {
        StaticBallTreeRef {
            nodes: &self.nodes,
            info: Cow::Borrowed(&self.info),
        }
    }

    /// Query buffers sized for this tree, so that no query needs to grow them.
    pub fn scratch(&self) -> QueryScratch<N> {
        QueryScratch::with_max_depth(self.info.max_depth)
    }
}

impl<N: BallFloat, const D: usize, P: Pod> AsRef<[StaticNode<N, D, P>]>
    for StaticBallTree<N, D, P>
{
    fn as_ref(&self) -> &[StaticNode<N, D, P>] {
        &self.nodes
    }
}

/// A reference on an external pre-order node array.
///
/// Usually this will be created from a [`StaticBallTree`] via its
/// [`as_tree_ref`][StaticBallTree::as_tree_ref] method, but it can also be created from any
/// existing slice of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticBallTreeRef<'a, N: BallFloat, const D: usize, P: Pod> {
    pub(crate) nodes: &'a [StaticNode<N, D, P>],
    pub(crate) info: Cow<'a, TreeInfo>,
}

impl<'a, N: BallFloat, const D: usize, P: Pod> StaticBallTreeRef<'a, N, D, P> {
    pub fn try_new<T: AsRef<[StaticNode<N, D, P>]>>(data: &'a T) -> Result<Self> {
        let nodes = data.as_ref();
        let info = TreeInfo::try_new(nodes)?;
        Ok(Self {
            nodes,
            info: Cow::Owned(info),
        })
    }

    pub fn info(&self) -> &TreeInfo {
        &self.info
    }

    pub fn nodes(&self) -> &'a [StaticNode<N, D, P>] {
        self.nodes
    }

    pub fn scratch(&self) -> QueryScratch<N> {
        QueryScratch::with_max_depth(self.info.max_depth)
    }
}

impl<N: BallFloat, const D: usize, P: Pod> BallTreeIndex<N, D> for StaticBallTree<N, D, P> {
    type Payload = P;

    fn num_items(&self) -> usize {
        self.info.num_items
    }

    fn root_id(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId::new(0))
    }

    fn sphere(&self, node: NodeId) -> Sphere<N, D> {
        self.nodes[node.get()].sphere()
    }

    fn children(&self, node: NodeId) -> Option<(NodeId, NodeId)> {
        children_of(&self.nodes, node)
    }

    fn payload(&self, node: NodeId) -> &P {
        &self.nodes[node.get()].payload
    }

    fn leaf_count(&self, node: NodeId) -> usize {
        (self.nodes[node.get()].subtree_size as usize + 1) / 2
    }
}

impl<N: BallFloat, const D: usize, P: Pod> BallTreeIndex<N, D> for StaticBallTreeRef<'_, N, D, P> {
    type Payload = P;

    fn num_items(&self) -> usize {
        self.info.num_items
    }

    fn root_id(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId::new(0))
    }

    fn sphere(&self, node: NodeId) -> Sphere<N, D> {
        self.nodes[node.get()].sphere()
    }

    fn children(&self, node: NodeId) -> Option<(NodeId, NodeId)> {
        children_of(self.nodes, node)
    }

    fn payload(&self, node: NodeId) -> &P {
        &self.nodes[node.get()].payload
    }

    fn leaf_count(&self, node: NodeId) -> usize {
        (self.nodes[node.get()].subtree_size as usize + 1) / 2
    }
}
