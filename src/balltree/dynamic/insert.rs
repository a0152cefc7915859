use std::cmp::Reverse;
use std::mem::take;

use bytemuck::Pod;

use crate::balltree::dynamic::{DynNode, DynamicBallTree, NodeKind, PSEUDO_ROOT};
use crate::balltree::policy::InsertFavor;
use crate::balltree::r#trait::BallTreeIndex;
use crate::balltree::util::Keyed;
use crate::geometry::{Point, Sphere};
use crate::node_id::NodeId;
use crate::r#type::BallFloat;

impl<N: BallFloat, const D: usize, P: Pod> DynamicBallTree<N, D, P> {
    /// Insert an item with the tree's insertion heuristic. Returns the new leaf's id.
    ///
    /// ## Panics
    ///
    /// - If the arena would grow past `u32::MAX - 1` slots.
    pub fn insert(&mut self, position: Point<N, D>, payload: P) -> NodeId {
        self.insert_with_favor(position, payload, self.favor)
    }

    /// Insert an item with an explicit insertion heuristic. Returns the new leaf's id.
    pub fn insert_with_favor(
        &mut self,
        position: Point<N, D>,
        payload: P,
        favor: InsertFavor,
    ) -> NodeId {
        let leaf = self.push_node(DynNode::leaf(position, payload));
        self.attach(leaf, favor, &mut Vec::new());
        self.num_items += 1;
        leaf
    }

    /// Link the detached subtree `node` into the tree next to its best sibling.
    ///
    /// The new parent takes a slot from `spare` when one is available.
    pub(super) fn attach(&mut self, node: NodeId, favor: InsertFavor, spare: &mut Vec<NodeId>) {
        let Some(root) = self.root_id() else {
            self.set_root(node);
            return;
        };
        let sphere = self.node(node).sphere;
        let sibling = match favor {
            InsertFavor::Rough => self.rough_sibling(root, &sphere),
            InsertFavor::Fine => self.fine_sibling(root, &sphere),
        };
        self.graft(sibling, node, spare);
    }

    /// Greedy descent, following the child whose sphere grows the least.
    fn rough_sibling(&self, root: NodeId, new: &Sphere<N, D>) -> NodeId {
        let mut best = root;
        let mut best_cost = self.node(root).sphere.bounding_sphere(new).volume();
        // growth of the ancestors of `node`'s children
        let mut inherited = N::zero();
        let mut node = root;

        while self.kind(node) == NodeKind::Internal {
            inherited = inherited + self.growth(node, new);
            if inherited >= best_cost {
                break;
            }
            let current = self.node(node);
            let child = if self.growth(current.left, new) <= self.growth(current.right, new) {
                current.left
            } else {
                current.right
            };
            let cost = inherited + self.node(child).sphere.bounding_sphere(new).volume();
            if cost < best_cost {
                best = child;
                best_cost = cost;
            }
            node = child;
        }
        best
    }

    /// Best-first search over every subtree whose lower bound beats the best cost so far.
    fn fine_sibling(&mut self, root: NodeId, new: &Sphere<N, D>) -> NodeId {
        let mut queue = take(&mut self.queue);
        queue.clear();

        let new_volume = new.volume();
        let mut best = root;
        let mut best_cost = N::infinity();
        queue.push(Reverse(Keyed::new(N::zero(), (root, N::zero()))));

        while let Some(Reverse(entry)) = queue.pop() {
            if entry.key >= best_cost {
                break;
            }
            let (node, inherited) = entry.item;
            let cost = inherited + self.node(node).sphere.bounding_sphere(new).volume();
            if cost < best_cost {
                best = node;
                best_cost = cost;
            }

            if self.kind(node) == NodeKind::Internal {
                let inherited = inherited + self.growth(node, new);
                let bound = inherited + new_volume;
                if bound < best_cost {
                    let current = self.node(node);
                    queue.push(Reverse(Keyed::new(bound, (current.left, inherited))));
                    queue.push(Reverse(Keyed::new(bound, (current.right, inherited))));
                }
            }
        }

        self.queue = queue;
        best
    }

    /// How much `node`'s volume grows when it also has to enclose `new`.
    #[inline]
    fn growth(&self, node: NodeId, new: &Sphere<N, D>) -> N {
        let sphere = &self.node(node).sphere;
        sphere.bounding_sphere(new).volume() - sphere.volume()
    }

    /// Put a new parent in `sibling`'s place, with `sibling` and `node` as its children.
    fn graft(&mut self, sibling: NodeId, node: NodeId, spare: &mut Vec<NodeId>) {
        let parent = self.node(sibling).parent;
        let sphere = self
            .node(sibling)
            .sphere
            .bounding_sphere(&self.node(node).sphere);
        let internal = self.alloc_node(
            DynNode {
                sphere,
                parent: NodeId::NULL,
                left: sibling,
                right: node,
                kind: NodeKind::Internal,
                payload: P::zeroed(),
            },
            spare,
        );

        self.replace_child(parent, sibling, internal);
        self.node_mut(sibling).parent = internal;
        self.node_mut(node).parent = internal;
        if parent != PSEUDO_ROOT {
            self.refit_from(parent);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::balltree::r#trait::BallTreeIndex;
    use crate::balltree::{DynamicBallTree, InsertFavor, NodeKind};
    use crate::geometry::Point;

    #[test]
    fn two_inserts_make_one_internal_root() {
        let mut tree = DynamicBallTree::<f64, 3, u32>::new();
        let a = tree.insert(Point::new([0., 0., 0.]), 1);
        let b = tree.insert(Point::new([2., 0., 0.]), 2);
        tree.check_invariants();

        assert_eq!(tree.num_items(), 2);
        let root = tree.root_id().unwrap();
        assert_eq!(tree.kind(root), NodeKind::Internal);
        assert_eq!(tree.children(root), Some((a, b)));
        assert_eq!(tree.sphere(root).radius(), 1.);
        assert_eq!(*tree.payload(b), 2);
    }

    #[test]
    fn new_item_joins_the_nearby_cluster() {
        for favor in [InsertFavor::Rough, InsertFavor::Fine] {
            let mut tree = DynamicBallTree::<f64, 2, u32>::new().with_favor(favor);
            tree.insert(Point::new([0., 0.]), 0);
            tree.insert(Point::new([1., 0.]), 1);
            let far = tree.insert(Point::new([100., 0.]), 2);
            let near = tree.insert(Point::new([101., 0.]), 3);
            tree.check_invariants();

            let parent = tree.slot(near).parent();
            assert_eq!(tree.children(parent), Some((far, near)));
        }
    }
}
