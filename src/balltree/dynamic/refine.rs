use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bytemuck::Pod;

use crate::balltree::dynamic::{DynNode, DynamicBallTree, NodeKind, PSEUDO_ROOT};
use crate::balltree::policy::InsertFavor;
use crate::balltree::r#trait::BallTreeIndex;
use crate::balltree::util::Keyed;
use crate::node_id::NodeId;
use crate::r#type::BallFloat;

impl<N: BallFloat, const D: usize, P: Pod> DynamicBallTree<N, D, P> {
    /// Rebuild the tree's hierarchy by repeatedly merging the two closest clusters.
    ///
    /// Every leaf starts as its own cluster. The pair whose enclosing sphere is smallest is
    /// merged under a new parent, which replaces both in the working tree; `favor` picks the
    /// heuristic used to place it there. Leaves keep their ids and payloads, internal node ids
    /// change. The arena does not grow.
    pub fn bottom_up_refine(&mut self, favor: InsertFavor) {
        if self.num_items < 3 {
            return;
        }

        let mut leaves = Vec::with_capacity(self.num_items);
        self.for_each_preorder(|id, node| {
            if !node.has_children() {
                leaves.push(id);
            }
        });

        // Clusters are the nodes flagged `Leaf`; the `Internal` nodes above them only index
        // the clusters for the pair search.
        let mut pairs = BinaryHeap::with_capacity(leaves.len());
        for leaf in leaves {
            if let Some(entry) = self.closest_cluster(leaf) {
                pairs.push(Reverse(entry));
            }
        }

        let mut spare = Vec::new();
        let mut clusters = self.num_items;
        let mut stale = 0usize;
        while clusters > 1 {
            let Some(Reverse(entry)) = pairs.pop() else {
                break;
            };
            let (a, b) = entry.item;
            if !self.is_cluster(a) {
                stale += 1;
                continue;
            }
            if !self.is_cluster(b) {
                stale += 1;
                if let Some(entry) = self.closest_cluster(a) {
                    pairs.push(Reverse(entry));
                }
                continue;
            }

            if let Some(parent) = self.unlink(a) {
                spare.push(parent);
            }
            if let Some(parent) = self.unlink(b) {
                spare.push(parent);
            }
            let sphere = self.node(a).sphere.bounding_sphere(&self.node(b).sphere);
            let merged = self.alloc_node(
                DynNode {
                    sphere,
                    parent: NodeId::NULL,
                    left: a,
                    right: b,
                    kind: NodeKind::Leaf,
                    payload: P::zeroed(),
                },
                &mut spare,
            );
            self.node_mut(a).parent = merged;
            self.node_mut(b).parent = merged;
            self.attach(merged, favor, &mut spare);
            clusters -= 1;
            log::trace!("merged {a} and {b} into {merged}, diameter {:?}", entry.key);

            if clusters > 1 {
                if let Some(entry) = self.closest_cluster(merged) {
                    pairs.push(Reverse(entry));
                }
            }
        }
        debug_assert!(spare.is_empty());

        self.restore_kinds();
        log::debug!(
            "refined dynamic ball tree of {} items: {} stale pairs skipped, volume {:?}",
            self.num_items,
            stale,
            self.volume()
        );
    }

    /// Returns `true` if `node` is a cluster root still present in the working tree.
    fn is_cluster(&self, node: NodeId) -> bool {
        let current = self.node(node);
        if current.kind != NodeKind::Leaf || current.parent.is_null() {
            return false;
        }
        current.parent == PSEUDO_ROOT || self.kind(current.parent) == NodeKind::Internal
    }

    /// Find the cluster whose union with `cluster` has the smallest diameter.
    ///
    /// A subtree with sphere `S` cannot pair `cluster` (sphere `A`) into anything smaller than
    /// `max(2 r_A, |c_A - c_S| - r_S + r_A)`; that bound prunes the search.
    fn closest_cluster(&self, cluster: NodeId) -> Option<Keyed<N, (NodeId, NodeId)>> {
        let root = self.root_id()?;
        let query = self.node(cluster).sphere;
        let floor = query.diameter();
        let lower_bound = |node: NodeId| {
            let sphere = &self.node(node).sphere;
            let reach = query.center().distance(sphere.center()) - sphere.radius() + query.radius();
            reach.max(floor)
        };

        let mut best: Option<Keyed<N, (NodeId, NodeId)>> = None;
        let mut stack = vec![(root, lower_bound(root))];
        while let Some((node, bound)) = stack.pop() {
            if best.as_ref().is_some_and(|best| bound >= best.key) {
                continue;
            }
            let current = self.node(node);
            if current.kind != NodeKind::Internal {
                if node != cluster {
                    let diameter = query.bounding_sphere(&current.sphere).diameter();
                    if best.as_ref().map_or(true, |best| diameter < best.key) {
                        best = Some(Keyed::new(diameter, (cluster, node)));
                    }
                }
                continue;
            }

            let left = (current.left, lower_bound(current.left));
            let right = (current.right, lower_bound(current.right));
            // pop the more promising child first
            if left.1 <= right.1 {
                stack.push(right);
                stack.push(left);
            } else {
                stack.push(left);
                stack.push(right);
            }
        }
        best
    }

    /// Re-derive every reachable node's kind from its links.
    fn restore_kinds(&mut self) {
        let mut stack: Vec<NodeId> = self.root_id().into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.node_mut(id);
            if node.has_children() {
                node.kind = NodeKind::Internal;
                stack.push(node.left);
                stack.push(node.right);
            } else {
                node.kind = NodeKind::Leaf;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::balltree::r#trait::BallTreeIndex;
    use crate::balltree::{DynamicBallTree, InsertFavor};
    use crate::geometry::Point;

    #[test]
    fn pairs_closest_items_first() {
        let mut tree = DynamicBallTree::<f64, 1, u32>::new();
        // inserted in an order that makes the greedy tree pair far items
        let xs = [0., 10., 1., 11., 20., 21.5];
        let ids: Vec<_> = xs
            .iter()
            .enumerate()
            .map(|(i, x)| tree.insert(Point::new([*x]), i as u32))
            .collect();
        let slots = tree.num_slots();

        tree.bottom_up_refine(InsertFavor::Fine);
        tree.check_invariants();
        assert_eq!(tree.num_items(), 6);
        assert_eq!(tree.num_slots(), slots);

        let sibling = |leaf| {
            let parent = tree.slot(leaf).parent();
            let (left, right) = tree.children(parent).unwrap();
            if left == leaf {
                right
            } else {
                left
            }
        };
        assert_eq!(sibling(ids[0]), ids[2]);
        assert_eq!(sibling(ids[1]), ids[3]);
        assert_eq!(sibling(ids[4]), ids[5]);
    }

    #[test]
    fn small_trees_are_left_alone() {
        let mut tree = DynamicBallTree::<f64, 2, u8>::new();
        tree.bottom_up_refine(InsertFavor::Rough);
        assert!(tree.is_empty());

        tree.insert(Point::new([0., 0.]), 0);
        tree.insert(Point::new([1., 1.]), 1);
        tree.bottom_up_refine(InsertFavor::Rough);
        tree.check_invariants();
        assert_eq!(tree.num_items(), 2);
    }
}
