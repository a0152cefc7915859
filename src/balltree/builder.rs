use bytemuck::Pod;
use geo_traits::CoordTrait;

use crate::balltree::dynamic::DynamicBallTree;
use crate::balltree::index::StaticBallTree;
use crate::balltree::policy::{Algorithm, ConstructionPolicy, InsertFavor};
use crate::balltree::split::{build_top_down, KdSplit, VolumeSplit};
use crate::error::{KdSearchError, Result};
use crate::geometry::Point;
use crate::r#type::BallFloat;

/// A builder to create a [`StaticBallTree`].
///
/// ```
/// use kdsearch::balltree::{
///     Algorithm, BallTreeIndex, ConstructionPolicy, StaticBallTreeBuilder,
/// };
/// use kdsearch::Point;
///
/// let mut builder = StaticBallTreeBuilder::<f64, 2, u32>::new(3);
/// builder.add(Point::new([0., 0.]), 10);
/// builder.add(Point::new([5., 5.]), 11);
/// builder.add(Point::new([1., 0.]), 12);
/// let tree = builder
///     .finish(&ConstructionPolicy::new(Algorithm::Kd))
///     .unwrap();
///
/// let nearest = tree.nearest(&Point::new([0.9, 0.1])).unwrap();
/// assert_eq!(*tree.payload(nearest.node), 12);
/// ```
#[derive(Debug, Clone)]
pub struct StaticBallTreeBuilder<N: BallFloat, const D: usize, P: Pod> {
    positions: Vec<Point<N, D>>,
    payloads: Vec<P>,
    num_items: usize,
}

impl<N: BallFloat, const D: usize, P: Pod> StaticBallTreeBuilder<N, D, P> {
    /// Create a new builder for the provided number of items.
    pub fn new(num_items: usize) -> Self {
        Self {
            positions: Vec::with_capacity(num_items),
            payloads: Vec::with_capacity(num_items),
            num_items,
        }
    }

    /// Create a builder already holding `items`.
    pub fn from_items(items: impl IntoIterator<Item = (Point<N, D>, P)>) -> Self {
        let (positions, payloads): (Vec<_>, Vec<_>) = items.into_iter().unzip();
        Self {
            num_items: positions.len(),
            positions,
            payloads,
        }
    }

    /// Add an item to the index. Returns its insertion index.
    pub fn add(&mut self, position: Point<N, D>, payload: P) -> usize {
        let index = self.positions.len();
        self.positions.push(position);
        self.payloads.push(payload);
        index
    }

    /// Add an item located at any [`CoordTrait`] implementation with `D` dimensions.
    pub fn add_coord(&mut self, coord: &impl CoordTrait<T = N>, payload: P) -> Result<usize> {
        Ok(self.add(Point::try_from_coord(coord)?, payload))
    }

    /// Consume this builder, building the tree with the algorithm chosen by `policy`.
    ///
    /// ## Errors
    ///
    /// - If the number of added items differs from the number declared in
    ///   [`new`][StaticBallTreeBuilder::new].
    pub fn finish(self, policy: &ConstructionPolicy) -> Result<StaticBallTree<N, D, P>> {
        if self.positions.len() != self.num_items {
            return Err(KdSearchError::Length {
                expected: self.num_items,
                actual: self.positions.len(),
            });
        }
        if self.num_items > (u32::MAX / 2) as usize {
            return Err(KdSearchError::General(format!(
                "Too many items for one tree: {}.",
                self.num_items
            )));
        }

        let tree = match policy.algorithm() {
            Algorithm::Kd => build_top_down::<N, D, P, KdSplit>(
                &self.positions,
                &self.payloads,
                policy,
            ),
            Algorithm::TopDown => build_top_down::<N, D, P, VolumeSplit>(
                &self.positions,
                &self.payloads,
                policy,
            ),
            Algorithm::RoughInsertion | Algorithm::FineInsertion | Algorithm::BottomUp => {
                let mut dynamic =
                    DynamicBallTree::with_capacity(self.num_items).with_favor(policy.insert_favor());
                for (position, payload) in self.positions.into_iter().zip(self.payloads) {
                    dynamic.insert(position, payload);
                }
                if policy.algorithm() == Algorithm::BottomUp {
                    dynamic.bottom_up_refine(InsertFavor::Fine);
                }
                dynamic.to_static()
            }
        };

        log::debug!(
            "built {} ball tree: {} items, {} nodes, max depth {}",
            policy.algorithm(),
            tree.info().num_items(),
            tree.info().num_nodes(),
            tree.info().max_depth()
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn item_count_must_match() {
        let mut builder = StaticBallTreeBuilder::<f64, 2, u8>::new(3);
        builder.add(Point::new([0., 0.]), 0);
        let err = builder.finish(&ConstructionPolicy::default()).unwrap_err();
        assert_eq!(
            err,
            KdSearchError::Length {
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn add_coord_checks_dimensions() {
        let mut builder = StaticBallTreeBuilder::<f64, 3, u8>::new(1);
        let coord = geo_0_31::coord! { x: 1., y: 2. };
        assert!(builder.add_coord(&coord, 0).is_err());

        let mut builder = StaticBallTreeBuilder::<f64, 2, u8>::new(1);
        assert_eq!(builder.add_coord(&coord, 0).unwrap(), 0);
        assert!(builder.finish(&ConstructionPolicy::default()).is_ok());
    }

    #[test]
    fn every_algorithm_builds_a_valid_layout() {
        let items: Vec<_> = (0..20u32)
            .map(|i| {
                let t = f64::from(i);
                (Point::new([t.sin() * t, t.cos() * t]), i)
            })
            .collect();
        for algorithm in Algorithm::ALL {
            let tree = StaticBallTreeBuilder::from_items(items.iter().copied())
                .finish(&ConstructionPolicy::new(algorithm))
                .unwrap();
            assert_eq!(tree.info().num_items(), 20);
            assert_eq!(tree.info().num_nodes(), 39);
            let copy = StaticBallTree::try_new(tree.clone().into_inner()).unwrap();
            assert_eq!(copy.info(), tree.info());
        }
    }
}
