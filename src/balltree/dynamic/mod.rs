//! A ball tree that supports insertion and removal of single items.

mod insert;
mod refine;
mod remove;

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bytemuck::Pod;

use crate::balltree::policy::InsertFavor;
use crate::balltree::r#trait::BallTreeIndex;
use crate::balltree::util::Keyed;
use crate::geometry::{Point, Sphere};
use crate::node_id::NodeId;
use crate::r#type::BallFloat;

/// Slot 0 holds the pseudo-root, whose left link is the real root.
pub(crate) const PSEUDO_ROOT: NodeId = NodeId::new(0);

/// The role of an arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A freed slot, unreachable from the root.
    Null,
    /// A node with two children.
    Internal,
    /// A node holding one item.
    Leaf,
}

/// One arena slot of a [`DynamicBallTree`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynNode<N: BallFloat, const D: usize, P: Pod> {
    sphere: Sphere<N, D>,
    parent: NodeId,
    left: NodeId,
    right: NodeId,
    kind: NodeKind,
    payload: P,
}

impl<N: BallFloat, const D: usize, P: Pod> DynNode<N, D, P> {
    fn leaf(position: Point<N, D>, payload: P) -> Self {
        Self {
            sphere: Sphere::from_point(position),
            parent: NodeId::NULL,
            left: NodeId::NULL,
            right: NodeId::NULL,
            kind: NodeKind::Leaf,
            payload,
        }
    }

    fn null() -> Self {
        Self {
            sphere: Sphere::from_point(Point::origin()),
            parent: NodeId::NULL,
            left: NodeId::NULL,
            right: NodeId::NULL,
            kind: NodeKind::Null,
            payload: P::zeroed(),
        }
    }

    /// The bounding sphere of this node's subtree.
    pub fn sphere(&self) -> &Sphere<N, D> {
        &self.sphere
    }

    /// The parent link. The root's parent is the pseudo-root.
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// The left child, or [`NodeId::NULL`] for leaves.
    pub fn left(&self) -> NodeId {
        self.left
    }

    /// The right child, or [`NodeId::NULL`] for leaves.
    pub fn right(&self) -> NodeId {
        self.right
    }

    /// The role of this slot.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The item's payload. Zeroed for internal nodes.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    #[inline]
    fn has_children(&self) -> bool {
        !self.left.is_null()
    }
}

/// A ball tree stored in an arena of slots, maintained incrementally.
///
/// Inserting places each item next to the sibling that grows the tree's volume the least;
/// removing splices a subtree out. Both keep every bounding sphere up to date, so the tree can
/// be queried through [`BallTreeIndex`] at any time. For a tighter tree, run
/// [`bottom_up_refine`][DynamicBallTree::bottom_up_refine] after a batch of insertions.
///
/// Node ids stay valid until the node is removed or [`compact`][DynamicBallTree::compact] is
/// called.
#[derive(Debug, Clone)]
pub struct DynamicBallTree<N: BallFloat, const D: usize, P: Pod> {
    pub(crate) nodes: Vec<DynNode<N, D, P>>,
    num_items: usize,
    favor: InsertFavor,
    /// Reused by the best-first sibling search.
    queue: BinaryHeap<Reverse<Keyed<N, (NodeId, N)>>>,
}

impl<N: BallFloat, const D: usize, P: Pod> Default for DynamicBallTree<N, D, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: BallFloat, const D: usize, P: Pod> DynamicBallTree<N, D, P> {
    /// Create an empty tree using the rough insertion heuristic.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty tree with room for `num_items` items.
    pub fn with_capacity(num_items: usize) -> Self {
        let mut nodes = Vec::with_capacity(2 * num_items);
        nodes.push(Self::pseudo_root());
        Self {
            nodes,
            num_items: 0,
            favor: InsertFavor::default(),
            queue: BinaryHeap::new(),
        }
    }

    /// Set the insertion heuristic used by [`insert`][DynamicBallTree::insert].
    pub fn with_favor(mut self, favor: InsertFavor) -> Self {
        self.favor = favor;
        self
    }

    /// The insertion heuristic used by [`insert`][DynamicBallTree::insert].
    pub fn favor(&self) -> InsertFavor {
        self.favor
    }

    fn pseudo_root() -> DynNode<N, D, P> {
        DynNode {
            kind: NodeKind::Leaf,
            ..DynNode::null()
        }
    }

    /// The number of arena slots, including the pseudo-root and freed slots.
    pub fn num_slots(&self) -> usize {
        self.nodes.len()
    }

    /// Access an arena slot.
    ///
    /// ## Panics
    ///
    /// - If `id` is out of range.
    pub fn slot(&self, id: NodeId) -> &DynNode<N, D, P> {
        &self.nodes[id.get()]
    }

    /// The role of the slot `id`.
    ///
    /// ## Panics
    ///
    /// - If `id` is out of range.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.get()].kind
    }

    /// Reserve room for `additional` more items.
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(2 * additional);
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        self.queue.shrink_to_fit();
    }

    /// Remove every item, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = Self::pseudo_root();
        self.num_items = 0;
    }

    #[inline]
    fn node(&self, id: NodeId) -> &DynNode<N, D, P> {
        &self.nodes[id.get()]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut DynNode<N, D, P> {
        &mut self.nodes[id.get()]
    }

    fn push_node(&mut self, node: DynNode<N, D, P>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Store `node` in a recycled slot if one is available.
    fn alloc_node(&mut self, node: DynNode<N, D, P>, spare: &mut Vec<NodeId>) -> NodeId {
        match spare.pop() {
            Some(id) => {
                *self.node_mut(id) = node;
                id
            }
            None => self.push_node(node),
        }
    }

    fn set_root(&mut self, root: NodeId) {
        let pseudo = self.node_mut(PSEUDO_ROOT);
        pseudo.left = root;
        pseudo.kind = if root.is_null() {
            NodeKind::Leaf
        } else {
            NodeKind::Internal
        };
        if !root.is_null() {
            self.node_mut(root).parent = PSEUDO_ROOT;
        }
    }

    /// Point `parent`'s link to `old` at `new` instead.
    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if parent == PSEUDO_ROOT {
            self.set_root(new);
            return;
        }
        let parent_node = self.node_mut(parent);
        if parent_node.left == old {
            parent_node.left = new;
        } else {
            debug_assert_eq!(parent_node.right, old);
            parent_node.right = new;
        }
        if !new.is_null() {
            self.node_mut(new).parent = parent;
        }
    }

    /// Recompute the spheres of `node` and all of its ancestors from their children.
    fn refit_from(&mut self, mut node: NodeId) {
        while !node.is_null() && node != PSEUDO_ROOT {
            let current = self.node(node);
            let sphere = self
                .node(current.left)
                .sphere
                .bounding_sphere(&self.node(current.right).sphere);
            let parent = current.parent;
            self.node_mut(node).sphere = sphere;
            node = parent;
        }
    }

    /// Call `f` on every reachable node, parents before children.
    pub fn for_each_preorder(&self, mut f: impl FnMut(NodeId, &DynNode<N, D, P>)) {
        let mut stack = vec![];
        if let Some(root) = self.root_id() {
            stack.push(root);
        }
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            f(id, node);
            if node.has_children() {
                stack.push(node.right);
                stack.push(node.left);
            }
        }
    }

    /// Call `f` on every reachable node, each one between its left and right subtrees.
    pub fn for_each_inorder(&self, mut f: impl FnMut(NodeId, &DynNode<N, D, P>)) {
        let mut stack = vec![];
        let mut cursor = self.node(PSEUDO_ROOT).left;
        loop {
            while !cursor.is_null() {
                stack.push(cursor);
                cursor = self.node(cursor).left;
            }
            let Some(id) = stack.pop() else {
                break;
            };
            let node = self.node(id);
            f(id, node);
            cursor = node.right;
        }
    }

    /// Rebuild the arena without freed slots, in pre-order.
    ///
    /// Returns the mapping from old to new ids: `remap[old.get()]` is the node's new id, or
    /// [`NodeId::NULL`] for freed slots. Every id obtained before this call is invalidated.
    pub fn compact(&mut self) -> Vec<NodeId> {
        let mut remap = vec![NodeId::NULL; self.nodes.len()];
        remap[0] = PSEUDO_ROOT;
        let mut order = vec![PSEUDO_ROOT];
        self.for_each_preorder(|id, _| {
            remap[id.get()] = NodeId::new(order.len());
            order.push(id);
        });

        let relink = |id: NodeId| {
            if id.is_null() {
                NodeId::NULL
            } else {
                remap[id.get()]
            }
        };
        let nodes: Vec<DynNode<N, D, P>> = order
            .iter()
            .map(|old| {
                let node = self.node(*old);
                DynNode {
                    parent: relink(node.parent),
                    left: relink(node.left),
                    right: relink(node.right),
                    ..*node
                }
            })
            .collect();

        log::trace!(
            "compacted dynamic ball tree from {} to {} slots",
            self.nodes.len(),
            nodes.len()
        );
        self.nodes = nodes;
        remap
    }
}

impl<N: BallFloat, const D: usize, P: Pod> BallTreeIndex<N, D> for DynamicBallTree<N, D, P> {
    type Payload = P;

    fn num_items(&self) -> usize {
        self.num_items
    }

    fn root_id(&self) -> Option<NodeId> {
        let root = self.node(PSEUDO_ROOT).left;
        (!root.is_null()).then_some(root)
    }

    fn sphere(&self, node: NodeId) -> Sphere<N, D> {
        self.node(node).sphere
    }

    fn children(&self, node: NodeId) -> Option<(NodeId, NodeId)> {
        let node = self.node(node);
        node.has_children().then_some((node.left, node.right))
    }

    fn payload(&self, node: NodeId) -> &P {
        &self.node(node).payload
    }
}

#[cfg(test)]
impl<N: BallFloat, const D: usize, P: Pod> DynamicBallTree<N, D, P> {
    /// Panic if any structural invariant is broken.
    pub(crate) fn check_invariants(&self) {
        let pseudo = self.node(PSEUDO_ROOT);
        assert!(pseudo.parent.is_null());
        assert!(pseudo.right.is_null());
        match self.root_id() {
            Some(root) => {
                assert_eq!(pseudo.kind, NodeKind::Internal);
                assert_eq!(self.node(root).parent, PSEUDO_ROOT);
            }
            None => assert_eq!(pseudo.kind, NodeKind::Leaf),
        }

        let mut reachable = vec![false; self.nodes.len()];
        reachable[0] = true;
        let mut leaves = 0;
        self.for_each_preorder(|id, node| {
            assert!(!reachable[id.get()], "node {id} reached twice");
            reachable[id.get()] = true;
            assert_eq!(node.left.is_null(), node.right.is_null());
            if node.has_children() {
                assert_eq!(node.kind, NodeKind::Internal);
                for child in [node.left, node.right] {
                    let child_node = self.node(child);
                    assert_eq!(child_node.parent, id);
                    let slack = node.sphere.radius() * N::from(1e-6).unwrap() + N::epsilon();
                    let reach = node.sphere.center().distance(child_node.sphere.center())
                        + child_node.sphere.radius();
                    assert!(reach <= node.sphere.radius() + slack);
                }
            } else {
                assert_eq!(node.kind, NodeKind::Leaf);
                leaves += 1;
            }
        });
        assert_eq!(leaves, self.num_items);
        for (i, node) in self.nodes.iter().enumerate() {
            if !reachable[i] {
                assert_eq!(node.kind, NodeKind::Null, "slot {i} unreachable but not freed");
            }
        }
    }
}
