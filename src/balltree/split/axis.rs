use rand::Rng;

use crate::balltree::policy::AxisSelection;
use crate::balltree::split::SplitParams;
use crate::geometry::Point;
use crate::r#type::BallFloat;

/// Choose the axis to split `ids` along, according to the params' axis-selection rule.
pub(crate) fn select_axis<N: BallFloat, const D: usize>(
    params: &mut SplitParams,
    positions: &[Point<N, D>],
    ids: &[u32],
) -> usize {
    if D <= 1 {
        return 0;
    }
    match params.axis_selection {
        AxisSelection::MaxExtreme => widest_axis(positions, ids),
        AxisSelection::MaxVariance => most_variant_axis(positions, ids),
        AxisSelection::Ordered => params.depth % D,
        AxisSelection::Random => params.rng.gen_range(0..D),
    }
}

fn widest_axis<N: BallFloat, const D: usize>(positions: &[Point<N, D>], ids: &[u32]) -> usize {
    let mut min = [N::infinity(); D];
    let mut max = [N::neg_infinity(); D];
    for &id in ids {
        let point = &positions[id as usize];
        for axis in 0..D {
            min[axis] = min[axis].min(point.nth(axis));
            max[axis] = max[axis].max(point.nth(axis));
        }
    }
    argmax((0..D).map(|axis| max[axis] - min[axis]))
}

fn most_variant_axis<N: BallFloat, const D: usize>(
    positions: &[Point<N, D>],
    ids: &[u32],
) -> usize {
    let count = N::from(ids.len()).unwrap_or_else(N::one);
    let mut mean = [N::zero(); D];
    for &id in ids {
        for (axis, m) in mean.iter_mut().enumerate() {
            *m = *m + positions[id as usize].nth(axis);
        }
    }
    for m in mean.iter_mut() {
        *m = *m / count;
    }

    let mut variance = [N::zero(); D];
    for &id in ids {
        for (axis, v) in variance.iter_mut().enumerate() {
            let delta = positions[id as usize].nth(axis) - mean[axis];
            *v = *v + delta * delta;
        }
    }
    argmax(variance.into_iter())
}

/// Index of the largest value; the first one wins ties.
fn argmax<N: BallFloat>(values: impl Iterator<Item = N>) -> usize {
    let mut best = 0;
    let mut best_value = N::neg_infinity();
    for (i, value) in values.enumerate() {
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;

    use super::*;
    use rand::rngs::StdRng;

    fn params(axis_selection: AxisSelection, depth: usize) -> SplitParams {
        SplitParams {
            depth,
            axis_selection,
            rng: StdRng::seed_from_u64(0),
        }
    }

    fn points() -> Vec<Point<f64, 3>> {
        // wide along y; x has two far outliers but most mass at 0
        vec![
            Point::new([-5., 0., 0.]),
            Point::new([5., 1., 0.]),
            Point::new([0., -4., 0.]),
            Point::new([0., 4., 0.]),
            Point::new([0., -4., 0.]),
            Point::new([0., 4., 0.]),
        ]
    }

    #[test]
    fn extreme_and_variance_axes() {
        let points = points();
        let ids: Vec<u32> = (0..points.len() as u32).collect();
        assert_eq!(
            select_axis(&mut params(AxisSelection::MaxExtreme, 0), &points, &ids),
            0
        );
        assert_eq!(
            select_axis(&mut params(AxisSelection::MaxVariance, 0), &points, &ids),
            1
        );
    }

    #[test]
    fn ordered_and_random_axes() {
        let points = points();
        let ids: Vec<u32> = (0..points.len() as u32).collect();
        assert_eq!(
            select_axis(&mut params(AxisSelection::Ordered, 4), &points, &ids),
            1
        );
        let mut random = params(AxisSelection::Random, 0);
        for _ in 0..20 {
            assert!(select_axis(&mut random, &points, &ids) < 3);
        }
    }
}
