#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::balltree::split::{Split, SplitParams};
use crate::balltree::util::cmp_float;
use crate::geometry::{Point, Sphere};
use crate::r#type::BallFloat;

/// Split where the summed volume of the two halves' bounding spheres is smallest.
///
/// Every axis is tried: the range is sorted along it and swept once from each end, so each
/// candidate pivot costs constant time. Ties go to the pivot closest to the middle, then to the
/// lower axis.
#[derive(Debug, Clone, Copy)]
pub struct VolumeSplit;

/// The best pivot found along one axis.
struct Candidate<N: BallFloat> {
    cost: N,
    imbalance: usize,
    axis: usize,
    mid: usize,
    sorted: Vec<u32>,
}

impl<N: BallFloat> Candidate<N> {
    fn better(self, other: Self) -> Self {
        let ordering = cmp_float(self.cost, other.cost)
            .then(self.imbalance.cmp(&other.imbalance))
            .then(self.axis.cmp(&other.axis));
        if ordering.is_le() {
            self
        } else {
            other
        }
    }
}

fn evaluate_axis<N: BallFloat, const D: usize>(
    positions: &[Point<N, D>],
    ids: &[u32],
    axis: usize,
) -> Candidate<N> {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable_by(|a, b| {
        cmp_float(
            positions[*a as usize].nth(axis),
            positions[*b as usize].nth(axis),
        )
    });

    let len = sorted.len();
    let half = len / 2;
    let position = |k: usize| positions[sorted[k] as usize];

    // suffix[k] bounds sorted[k..]
    let mut suffix = Vec::with_capacity(len);
    let mut bound = Sphere::from_point(position(len - 1));
    suffix.push(bound);
    for k in (0..len - 1).rev() {
        bound = bound.bounding_point(&position(k));
        suffix.push(bound);
    }
    suffix.reverse();

    let mut best_cost = N::infinity();
    let mut best_mid = half;
    let mut prefix = Sphere::from_point(position(0));
    for k in 1..len {
        let cost = prefix.volume() + suffix[k].volume();
        let closer = k.abs_diff(half) < best_mid.abs_diff(half);
        if cost < best_cost || (cost == best_cost && closer) {
            best_cost = cost;
            best_mid = k;
        }
        prefix = prefix.bounding_point(&position(k));
    }

    Candidate {
        cost: best_cost,
        imbalance: best_mid.abs_diff(half),
        axis,
        mid: best_mid,
        sorted,
    }
}

impl<N: BallFloat, const D: usize> Split<N, D> for VolumeSplit {
    fn split(_params: &mut SplitParams, positions: &[Point<N, D>], ids: &mut [u32]) -> usize {
        let range: &[u32] = ids;

        #[cfg(feature = "rayon")]
        let best = (0..D)
            .into_par_iter()
            .map(|axis| evaluate_axis(positions, range, axis))
            .reduce_with(Candidate::better);

        #[cfg(not(feature = "rayon"))]
        let best = (0..D)
            .map(|axis| evaluate_axis(positions, range, axis))
            .reduce(Candidate::better);

        match best {
            Some(best) => {
                ids.copy_from_slice(&best.sorted);
                best.mid
            }
            None => ids.len() / 2,
        }
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::balltree::AxisSelection;

    fn params() -> SplitParams {
        SplitParams {
            depth: 0,
            axis_selection: AxisSelection::MaxExtreme,
            rng: StdRng::seed_from_u64(0),
        }
    }

    #[test]
    fn separates_two_clusters() {
        // three points near the origin, two far along y
        let positions: Vec<Point<f64, 2>> = vec![
            Point::new([0., 100.]),
            Point::new([0.1, 0.]),
            Point::new([0., 101.]),
            Point::new([0.2, 0.1]),
            Point::new([0., 0.2]),
        ];
        let mut ids: Vec<u32> = (0..5).collect();
        let mid = VolumeSplit::split(&mut params(), &positions, &mut ids);

        // either axis separates the same clusters, on either side
        let mut halves = [ids[..mid].to_vec(), ids[mid..].to_vec()];
        for half in halves.iter_mut() {
            half.sort();
        }
        halves.sort();
        assert_eq!(halves, [vec![0, 2], vec![1, 3, 4]]);
    }

    #[test]
    fn coincident_points_split_in_the_middle() {
        let positions = vec![Point::new([1., 1., 1.]); 6];
        let mut ids: Vec<u32> = (0..6).collect();
        let mid = VolumeSplit::split(&mut params(), &positions, &mut ids);
        assert_eq!(mid, 3);
    }
}
