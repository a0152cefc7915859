use bytemuck::Pod;

use crate::balltree::dynamic::{DynNode, DynamicBallTree, NodeKind, PSEUDO_ROOT};
use crate::error::{KdSearchError, Result};
use crate::node_id::NodeId;
use crate::r#type::BallFloat;

impl<N: BallFloat, const D: usize, P: Pod> DynamicBallTree<N, D, P> {
    /// Remove `node` and its whole subtree. Returns the number of items removed.
    ///
    /// The sibling of `node` takes the place of their parent. Removing the root empties the
    /// tree.
    ///
    /// ## Errors
    ///
    /// - If `node` is the pseudo-root, out of range, or already freed. The tree is left
    ///   unchanged.
    pub fn remove(&mut self, node: NodeId) -> Result<usize> {
        if node.is_null()
            || node == PSEUDO_ROOT
            || node.get() >= self.nodes.len()
            || self.kind(node) == NodeKind::Null
        {
            return Err(KdSearchError::InvalidNode(node));
        }

        if let Some(parent) = self.unlink(node) {
            *self.node_mut(parent) = DynNode::null();
        }
        let removed = self.free_subtree(node);
        self.num_items -= removed;
        Ok(removed)
    }

    /// Detach `node` from the tree, keeping its subtree intact.
    ///
    /// Returns the spliced-out parent, which the caller must free or reuse.
    pub(super) fn unlink(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent;
        self.node_mut(node).parent = NodeId::NULL;
        if parent == PSEUDO_ROOT {
            self.set_root(NodeId::NULL);
            return None;
        }

        let parent_node = self.node(parent);
        let sibling = if parent_node.left == node {
            parent_node.right
        } else {
            parent_node.left
        };
        let grandparent = parent_node.parent;
        self.replace_child(grandparent, parent, sibling);
        if grandparent != PSEUDO_ROOT {
            self.refit_from(grandparent);
        }
        Some(parent)
    }

    /// Mark every slot of the detached subtree `node` as freed. Returns its number of leaves.
    fn free_subtree(&mut self, node: NodeId) -> usize {
        let mut stack = vec![node];
        let mut leaves = 0;
        while let Some(id) = stack.pop() {
            let current = self.node(id);
            if current.has_children() {
                stack.push(current.left);
                stack.push(current.right);
            } else {
                leaves += 1;
            }
            *self.node_mut(id) = DynNode::null();
        }
        leaves
    }
}

#[cfg(test)]
mod test {
    use crate::balltree::r#trait::BallTreeIndex;
    use crate::balltree::{DynamicBallTree, NodeKind};
    use crate::error::KdSearchError;
    use crate::geometry::Point;
    use crate::node_id::NodeId;

    fn line(n: usize) -> (DynamicBallTree<f64, 2, u32>, Vec<NodeId>) {
        let mut tree = DynamicBallTree::new();
        let ids = (0..n)
            .map(|i| tree.insert(Point::new([i as f64, 0.]), i as u32))
            .collect();
        (tree, ids)
    }

    #[test]
    fn removing_a_leaf_promotes_its_sibling() {
        let (mut tree, ids) = line(3);
        assert_eq!(tree.remove(ids[1]).unwrap(), 1);
        tree.check_invariants();
        assert_eq!(tree.num_items(), 2);
        assert_eq!(tree.kind(ids[1]), NodeKind::Null);
        let nearest = tree.nearest(&Point::new([1.2, 0.])).unwrap();
        assert_eq!(*tree.payload(nearest.node), 2);
    }

    #[test]
    fn removing_the_root_empties_the_tree() {
        let (mut tree, _) = line(5);
        let root = tree.root_id().unwrap();
        assert_eq!(tree.remove(root).unwrap(), 5);
        tree.check_invariants();
        assert!(tree.is_empty());
        assert!(tree.root_id().is_none());

        tree.insert(Point::new([3., 3.]), 7);
        tree.check_invariants();
        assert_eq!(tree.num_items(), 1);
    }

    #[test]
    fn invalid_removals_leave_the_tree_unchanged() {
        let (mut tree, ids) = line(4);
        let before = tree.clone();
        assert_eq!(
            tree.remove(NodeId::new(0)),
            Err(KdSearchError::InvalidNode(NodeId::new(0)))
        );
        assert!(tree.remove(NodeId::new(10_000)).is_err());
        assert!(tree.remove(NodeId::NULL).is_err());

        tree.remove(ids[2]).unwrap();
        assert!(matches!(
            tree.remove(ids[2]),
            Err(KdSearchError::InvalidNode(_))
        ));
        assert_eq!(before.num_items(), 4);
        assert_eq!(tree.num_items(), 3);
    }
}
