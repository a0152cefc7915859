//! Query regions for fixed-region searches.

use crate::geometry::{Point, Rect, Sphere};
use crate::r#type::BallFloat;

/// How a node's bounding sphere relates to a query region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// No point of the sphere lies in the region.
    Disjoint,
    /// The whole sphere lies in the region.
    Contained,
    /// Anything else. This may be conservative: a `Partial` node can still turn out to have no
    /// leaves inside the region.
    Partial,
}

/// A region that ball trees can be searched against.
pub trait QueryRegion<N: BallFloat, const D: usize> {
    /// Classify a node's bounding sphere against this region.
    fn classify(&self, sphere: &Sphere<N, D>) -> Overlap;

    /// Returns `true` if `point` lies in this region.
    fn contains_point(&self, point: &Point<N, D>) -> bool;
}

/// Slack for comparisons between values of the given magnitude.
#[inline]
fn slack<N: BallFloat>(magnitude: N) -> N {
    magnitude * N::TOLERANCE
}

impl<N: BallFloat, const D: usize> QueryRegion<N, D> for Rect<N, D> {
    /// Spheres within rounding distance of a face are `Partial`, so their leaves are tested
    /// one by one.
    fn classify(&self, sphere: &Sphere<N, D>) -> Overlap {
        let radius = sphere.radius();
        let mut contained = true;
        for axis in 0..D {
            let value = sphere.center().nth(axis);
            let min = self.min().nth(axis);
            let max = self.max().nth(axis);
            let slack = slack(radius + value.abs() + min.abs().max(max.abs()));

            // the box expanded by the radius must contain the center
            if value < min - radius - slack || value >= max + radius + slack {
                return Overlap::Disjoint;
            }
            // and the box shrunk by the radius must contain it for full containment
            if value < min + radius + slack || value >= max - radius - slack {
                contained = false;
            }
        }
        if contained {
            Overlap::Contained
        } else {
            Overlap::Partial
        }
    }

    #[inline]
    fn contains_point(&self, point: &Point<N, D>) -> bool {
        self.contains(point)
    }
}

impl<N: BallFloat, const D: usize> QueryRegion<N, D> for Sphere<N, D> {
    fn classify(&self, sphere: &Sphere<N, D>) -> Overlap {
        let distance = self.center().distance(sphere.center());
        let magnitude = (0..D).fold(N::zero(), |acc, axis| {
            acc.max(self.center().nth(axis).abs())
                .max(sphere.center().nth(axis).abs())
        });
        let slack = slack(self.radius() + sphere.radius() + magnitude);
        if distance > self.radius() + sphere.radius() + slack {
            Overlap::Disjoint
        } else if distance + sphere.radius() + slack <= self.radius() {
            Overlap::Contained
        } else {
            Overlap::Partial
        }
    }

    #[inline]
    fn contains_point(&self, point: &Point<N, D>) -> bool {
        self.contains(point)
    }
}
