use std::fmt::Debug;
use std::iter::Sum;

use num_traits::Float;

/// A trait for the scalar types that can be used for ball-tree coordinates.
///
/// This trait is sealed and cannot be implemented for external types. Bounding spheres need
/// square roots, so only `f32` and `f64` are supported.
pub trait BallFloat:
    private::Sealed + Float + Default + Debug + Send + Sync + Sum + bytemuck::Pod
{
    /// Half, used for sphere midpoints and radii.
    const HALF: Self;
    /// Two, used for diameters.
    const TWO: Self;
    /// Relative margin by which a query must clear a bounding sphere before a whole subtree is
    /// pruned or accepted. Covers the rounding accumulated by nested bounding spheres.
    const TOLERANCE: Self;
}

impl BallFloat for f32 {
    const HALF: Self = 0.5;
    const TWO: Self = 2.0;
    const TOLERANCE: Self = 1024.0 * f32::EPSILON;
}

impl BallFloat for f64 {
    const HALF: Self = 0.5;
    const TWO: Self = 2.0;
    const TOLERANCE: Self = 1024.0 * f64::EPSILON;
}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
