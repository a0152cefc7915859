//! Utilities to traverse the ball tree structure.

use std::marker::PhantomData;

use crate::balltree::r#trait::BallTreeIndex;
use crate::geometry::{Point, Sphere};
use crate::node_id::NodeId;
use crate::r#type::BallFloat;

/// A node in a ball tree.
#[derive(Debug)]
pub struct Node<'a, N: BallFloat, const D: usize, T: BallTreeIndex<N, D>> {
    /// The tree that this node is a reference onto
    tree: &'a T,

    /// The node's handle in `tree`.
    id: NodeId,

    phantom: PhantomData<N>,
}

// Manual impls so that `T` itself does not need to be `Clone`.
impl<N: BallFloat, const D: usize, T: BallTreeIndex<N, D>> Clone for Node<'_, N, D, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: BallFloat, const D: usize, T: BallTreeIndex<N, D>> Copy for Node<'_, N, D, T> {}

impl<'a, N: BallFloat, const D: usize, T: BallTreeIndex<N, D>> Node<'a, N, D, T> {
    pub(crate) fn new(tree: &'a T, id: NodeId) -> Self {
        Self {
            tree,
            id,
            phantom: PhantomData,
        }
    }

    /// The handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The bounding sphere of this node.
    pub fn sphere(&self) -> Sphere<N, D> {
        self.tree.sphere(self.id)
    }

    /// The center of this node's bounding sphere. For leaves this is the item's position.
    pub fn center(&self) -> Point<N, D> {
        *self.sphere().center()
    }

    /// The radius of this node's bounding sphere. Zero for leaves.
    pub fn radius(&self) -> N {
        self.sphere().radius()
    }

    /// Returns `true` if this is a leaf node without children.
    pub fn is_leaf(&self) -> bool {
        self.tree.is_leaf(self.id)
    }

    /// Returns `true` if this is an intermediate node with children.
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }

    /// The two children of this node, or `None` for leaves.
    pub fn children(&self) -> Option<(Node<'a, N, D, T>, Node<'a, N, D, T>)> {
        self.tree
            .children(self.id)
            .map(|(left, right)| (Node::new(self.tree, left), Node::new(self.tree, right)))
    }

    /// The payload of this node. Only meaningful for leaves.
    pub fn payload(&self) -> &'a T::Payload {
        self.tree.payload(self.id)
    }

    /// The number of leaves in this node's subtree.
    pub fn leaf_count(&self) -> usize {
        self.tree.leaf_count(self.id)
    }

    /// Returns an iterator over every leaf below this node, left to right.
    pub fn leaves(&self) -> Leaves<'a, N, D, T> {
        Leaves {
            tree: self.tree,
            stack: vec![self.id],
            phantom: PhantomData,
        }
    }
}

/// Iterator over the leaves of a subtree, created by [`Node::leaves`].
pub struct Leaves<'a, N: BallFloat, const D: usize, T: BallTreeIndex<N, D>> {
    tree: &'a T,
    stack: Vec<NodeId>,
    phantom: PhantomData<N>,
}

impl<'a, N: BallFloat, const D: usize, T: BallTreeIndex<N, D>> Iterator for Leaves<'a, N, D, T> {
    type Item = Node<'a, N, D, T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            match self.tree.children(id) {
                Some((left, right)) => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
                None => return Some(Node::new(self.tree, id)),
            }
        }
        None
    }
}
