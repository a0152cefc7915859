use bytemuck::Pod;

use crate::balltree::dynamic::DynamicBallTree;
use crate::balltree::index::{finalize_preorder, StaticBallTree, StaticNode};
use crate::balltree::r#trait::BallTreeIndex;
use crate::r#type::BallFloat;

impl<N: BallFloat, const D: usize, P: Pod> DynamicBallTree<N, D, P> {
    /// Copy this tree into the compact pre-order layout of a [`StaticBallTree`].
    ///
    /// Spheres are copied as they are, so queries on both trees visit the same nodes.
    pub fn to_static(&self) -> StaticBallTree<N, D, P> {
        let mut nodes = Vec::with_capacity(self.num_slots().saturating_sub(1));
        let mut parents = Vec::with_capacity(nodes.capacity());

        // (node, index of its parent in `nodes`)
        let mut stack = vec![];
        if let Some(root) = self.root_id() {
            stack.push((root, u32::MAX));
        }
        while let Some((id, parent)) = stack.pop() {
            let index = nodes.len() as u32;
            let node = self.slot(id);
            nodes.push(StaticNode::new(
                *node.sphere().center(),
                node.sphere().radius(),
                1,
                *node.payload(),
            ));
            parents.push(parent);
            if !node.left().is_null() {
                stack.push((node.right(), index));
                stack.push((node.left(), index));
            }
        }

        finalize_preorder(&mut nodes, &parents, false);
        StaticBallTree::new_unchecked(nodes)
    }
}

#[cfg(test)]
mod test {
    use crate::balltree::{BallTreeIndex, DynamicBallTree};
    use crate::geometry::Point;

    #[test]
    fn flattening_keeps_structure_and_spheres() {
        let mut tree = DynamicBallTree::<f64, 2, u16>::new();
        for i in 0..7u16 {
            let x = f64::from(i * i);
            tree.insert(Point::new([x, -x]), i);
        }
        let flat = tree.to_static();
        assert_eq!(flat.info().num_items(), 7);
        assert_eq!(flat.nodes().len(), 13);
        assert_eq!(flat.volume(), tree.volume());

        let mut dynamic_leaves = vec![];
        tree.for_each_preorder(|id, node| {
            if node.left().is_null() {
                dynamic_leaves.push((*node.payload(), tree.position(id)));
            }
        });
        let static_leaves: Vec<_> = flat
            .root()
            .unwrap()
            .leaves()
            .map(|leaf| (*leaf.payload(), leaf.center()))
            .collect();
        assert_eq!(dynamic_leaves, static_leaves);
    }

    #[test]
    fn empty_tree_flattens_to_nothing() {
        let tree = DynamicBallTree::<f32, 3, u8>::new();
        let flat = tree.to_static();
        assert!(flat.nodes().is_empty());
        assert!(flat.root().is_none());
    }
}
