//! N-dimensional points, spheres and axis-aligned rectangles.
//!
//! These are the only geometric primitives the trees need: distances between points, the
//! smallest sphere enclosing two spheres, and containment tests.

use geo_traits::{CoordTrait, RectTrait};

use crate::error::{KdSearchError, Result};
use crate::r#type::BallFloat;

/// A point in `D`-dimensional space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<N: BallFloat, const D: usize> {
    coords: [N; D],
}

impl<N: BallFloat, const D: usize> Point<N, D> {
    /// Create a point from its coordinates.
    #[inline]
    pub const fn new(coords: [N; D]) -> Self {
        Self { coords }
    }

    /// The point with all coordinates zero.
    pub fn origin() -> Self {
        Self::new([N::zero(); D])
    }

    /// Convert any [`CoordTrait`] implementation with exactly `D` dimensions.
    pub fn try_from_coord(coord: &impl CoordTrait<T = N>) -> Result<Self> {
        let dims = coord.dim().size();
        if dims != D {
            return Err(KdSearchError::Length {
                expected: D,
                actual: dims,
            });
        }
        let mut coords = [N::zero(); D];
        for (axis, value) in coords.iter_mut().enumerate() {
            *value = coord.nth_or_panic(axis);
        }
        Ok(Self::new(coords))
    }

    /// All coordinates of this point.
    #[inline]
    pub fn coords(&self) -> &[N; D] {
        &self.coords
    }

    /// The coordinate along `axis`.
    #[inline]
    pub fn nth(&self, axis: usize) -> N {
        self.coords[axis]
    }

    /// Squared Euclidean distance to `other`.
    #[inline]
    pub fn distance_squared(&self, other: &Self) -> N {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| (*a - *b) * (*a - *b))
            .sum()
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: &Self) -> N {
        self.distance_squared(other).sqrt()
    }
}

impl<N: BallFloat, const D: usize> From<[N; D]> for Point<N, D> {
    fn from(coords: [N; D]) -> Self {
        Self::new(coords)
    }
}

/// A ball given by its center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere<N: BallFloat, const D: usize> {
    center: Point<N, D>,
    radius: N,
}

impl<N: BallFloat, const D: usize> Sphere<N, D> {
    /// Create a sphere. `radius` must not be negative.
    #[inline]
    pub fn new(center: Point<N, D>, radius: N) -> Self {
        debug_assert!(radius >= N::zero());
        Self { center, radius }
    }

    /// The zero-radius sphere located at `point`.
    #[inline]
    pub fn from_point(point: Point<N, D>) -> Self {
        Self::new(point, N::zero())
    }

    /// The center of this sphere.
    #[inline]
    pub fn center(&self) -> &Point<N, D> {
        &self.center
    }

    /// The radius of this sphere.
    #[inline]
    pub fn radius(&self) -> N {
        self.radius
    }

    /// Twice the radius.
    #[inline]
    pub fn diameter(&self) -> N {
        self.radius * N::TWO
    }

    /// A volume proxy, `diameter^D`.
    ///
    /// This is not the volume of the ball but is monotonic in the diameter, which is all that
    /// cost comparisons need.
    #[inline]
    pub fn volume(&self) -> N {
        self.diameter().powi(D as i32)
    }

    /// Returns `true` if `point` lies inside or on the surface of this sphere.
    #[inline]
    pub fn contains(&self, point: &Point<N, D>) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    /// Returns `true` if `other` lies entirely inside this sphere.
    #[inline]
    pub fn contains_sphere(&self, other: &Self) -> bool {
        self.center.distance(&other.center) + other.radius <= self.radius
    }

    /// The smallest sphere enclosing both `self` and `other`.
    pub fn bounding_sphere(&self, other: &Self) -> Self {
        let distance = self.center.distance(&other.center);
        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }

        // Neither contains the other, so `distance` is strictly positive here.
        let radius = (distance + self.radius + other.radius) * N::HALF;
        let t = (radius - self.radius) / distance;
        let mut coords = *self.center.coords();
        for (axis, value) in coords.iter_mut().enumerate() {
            *value = *value + (other.center.nth(axis) - *value) * t;
        }
        let center = Point::new(coords);

        // grow past any rounding in the interpolated center
        let radius = radius
            .max(center.distance(&self.center) + self.radius)
            .max(center.distance(&other.center) + other.radius);
        Self::new(center, radius)
    }

    /// The smallest sphere enclosing `self` and `point`.
    #[inline]
    pub fn bounding_point(&self, point: &Point<N, D>) -> Self {
        self.bounding_sphere(&Self::from_point(*point))
    }
}

/// An axis-aligned box.
///
/// Containment is half-open: a point is inside when `min <= p < max` along every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<N: BallFloat, const D: usize> {
    min: Point<N, D>,
    max: Point<N, D>,
}

impl<N: BallFloat, const D: usize> Rect<N, D> {
    /// Create a box from its lower and upper corners.
    #[inline]
    pub fn new(min: Point<N, D>, max: Point<N, D>) -> Self {
        Self { min, max }
    }

    /// Convert any [`RectTrait`] implementation with exactly `D` dimensions.
    pub fn try_from_rect(rect: &impl RectTrait<T = N>) -> Result<Self> {
        Ok(Self::new(
            Point::try_from_coord(&rect.min())?,
            Point::try_from_coord(&rect.max())?,
        ))
    }

    /// The lower corner.
    #[inline]
    pub fn min(&self) -> &Point<N, D> {
        &self.min
    }

    /// The upper corner.
    #[inline]
    pub fn max(&self) -> &Point<N, D> {
        &self.max
    }

    /// Returns `true` if `value` lies in `[min, max)` along `axis`.
    #[inline]
    pub fn contains_along_axis(&self, axis: usize, value: N) -> bool {
        value >= self.min.nth(axis) && value < self.max.nth(axis)
    }

    /// Returns `true` if `point` lies inside this box.
    #[inline]
    pub fn contains(&self, point: &Point<N, D>) -> bool {
        (0..D).all(|axis| self.contains_along_axis(axis, point.nth(axis)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bounding_sphere_of_disjoint_spheres() {
        let a = Sphere::new(Point::new([0., 0.]), 1.);
        let b = Sphere::new(Point::new([4., 0.]), 1.);
        let s = a.bounding_sphere(&b);
        assert_eq!(s.radius(), 3.);
        assert_eq!(s.center(), &Point::new([2., 0.]));
        assert!(s.contains_sphere(&a));
        assert!(s.contains_sphere(&b));
    }

    #[test]
    fn bounding_sphere_keeps_enclosing_sphere() {
        let big = Sphere::new(Point::new([0., 0., 0.]), 5.);
        let small = Sphere::new(Point::new([1., 1., 1.]), 1.);
        assert_eq!(big.bounding_sphere(&small), big);
        assert_eq!(small.bounding_sphere(&big), big);
    }

    #[test]
    fn bounding_sphere_of_coincident_points() {
        let p = Sphere::from_point(Point::new([1., 2., 3.]));
        let s = p.bounding_sphere(&p);
        assert_eq!(s.radius(), 0.);
        assert_eq!(s.volume(), 0.);
    }

    #[test]
    fn bounding_point_uneven_radii() {
        let a = Sphere::new(Point::new([0.0f64]), 2.);
        let s = a.bounding_point(&Point::new([6.]));
        assert_eq!(s.radius(), 4.);
        assert!((s.center().nth(0) - 2.).abs() < 1e-12);
    }

    #[test]
    fn volume_proxy_is_diameter_power() {
        let s = Sphere::new(Point::new([0., 0., 0.]), 1.5);
        assert_eq!(s.volume(), 27.);
    }

    #[test]
    fn rect_is_half_open() {
        let r = Rect::new(Point::new([0., 0.]), Point::new([1., 1.]));
        assert!(r.contains(&Point::new([0., 0.])));
        assert!(r.contains(&Point::new([0.5, 0.999])));
        assert!(!r.contains(&Point::new([1., 0.5])));
        assert!(!r.contains(&Point::new([-0.1, 0.5])));
        assert!(r.contains_along_axis(1, 0.));
        assert!(!r.contains_along_axis(1, 1.));
    }

    #[test]
    fn converts_geo_traits_types() {
        let coord = geo_0_31::coord! { x: 1.5, y: -2. };
        let point = Point::<f64, 2>::try_from_coord(&coord).unwrap();
        assert_eq!(point, Point::new([1.5, -2.]));

        let rect = geo_0_31::Rect::new(
            geo_0_31::coord! { x: 0., y: 0. },
            geo_0_31::coord! { x: 2., y: 3. },
        );
        let rect = Rect::<f64, 2>::try_from_rect(&rect).unwrap();
        assert_eq!(rect.max(), &Point::new([2., 3.]));

        let err = Point::<f64, 3>::try_from_coord(&coord).unwrap_err();
        assert_eq!(
            err,
            KdSearchError::Length {
                expected: 3,
                actual: 2
            }
        );
    }
}
