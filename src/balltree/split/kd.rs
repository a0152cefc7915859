use crate::balltree::split::axis::select_axis;
use crate::balltree::split::{Split, SplitParams};
use crate::balltree::util::cmp_float;
use crate::geometry::Point;
use crate::r#type::BallFloat;

/// Split at the coordinate median along the axis chosen by the axis-selection rule.
///
/// The median is found with a selection algorithm, so each level costs linear time.
#[derive(Debug, Clone, Copy)]
pub struct KdSplit;

impl<N: BallFloat, const D: usize> Split<N, D> for KdSplit {
    fn split(params: &mut SplitParams, positions: &[Point<N, D>], ids: &mut [u32]) -> usize {
        let axis = select_axis(params, positions, ids);
        let mid = ids.len() / 2;
        ids.select_nth_unstable_by(mid, |a, b| {
            cmp_float(
                positions[*a as usize].nth(axis),
                positions[*b as usize].nth(axis),
            )
        });
        mid
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::balltree::AxisSelection;

    #[test]
    fn partitions_around_the_median() {
        let positions: Vec<Point<f64, 2>> = [7., 1., 5., 3., 9., 0., 4.]
            .iter()
            .map(|x| Point::new([*x, 0.]))
            .collect();
        let mut ids: Vec<u32> = (0..positions.len() as u32).collect();
        let mut params = SplitParams {
            depth: 0,
            axis_selection: AxisSelection::MaxExtreme,
            rng: StdRng::seed_from_u64(0),
        };
        let mid = KdSplit::split(&mut params, &positions, &mut ids);
        assert_eq!(mid, 3);
        let x = |id: &u32| positions[*id as usize].nth(0);
        assert!(ids[..mid].iter().all(|id| x(id) <= 4.));
        assert!(ids[mid..].iter().all(|id| x(id) >= 4.));
    }
}
