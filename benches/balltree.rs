use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kdsearch::balltree::{
    Algorithm, BallTreeIndex, ConstructionPolicy, DynamicBallTree, StaticBallTree,
    StaticBallTreeBuilder,
};
use kdsearch::{Point, Rect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstar::RTree;

fn generate_points(n: usize) -> Vec<Point<f64, 3>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| {
            Point::new([
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ])
        })
        .collect()
}

fn construct_static(points: &[Point<f64, 3>], algorithm: Algorithm) -> StaticBallTree<f64, 3, u32> {
    StaticBallTreeBuilder::from_items(points.iter().enumerate().map(|(i, p)| (*p, i as u32)))
        .finish(&ConstructionPolicy::new(algorithm))
        .unwrap()
}

fn construct_dynamic(points: &[Point<f64, 3>]) -> DynamicBallTree<f64, 3, u32> {
    let mut tree = DynamicBallTree::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        tree.insert(*p, i as u32);
    }
    tree
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let points = generate_points(10_000);
    let queries = generate_points(100);

    let mut group = c.benchmark_group("construction");
    for algorithm in Algorithm::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm),
            &algorithm,
            |b, algorithm| b.iter(|| construct_static(&points, *algorithm)),
        );
    }
    group.bench_function("dynamic insert", |b| b.iter(|| construct_dynamic(&points)));
    group.bench_function("rstar bulk", |b| {
        b.iter(|| RTree::bulk_load(points.iter().map(|p| *p.coords()).collect::<Vec<_>>()))
    });
    group.finish();

    let rstar_tree = RTree::bulk_load(points.iter().map(|p| *p.coords()).collect::<Vec<_>>());
    let mut group = c.benchmark_group("nearest_k");
    for algorithm in [Algorithm::Kd, Algorithm::TopDown, Algorithm::BottomUp] {
        let tree = construct_static(&points, algorithm);
        let mut scratch = tree.scratch();
        group.bench_function(BenchmarkId::from_parameter(algorithm), |b| {
            b.iter(|| {
                for query in &queries {
                    tree.nearest_k_with(query, 10, &mut scratch);
                }
            })
        });
    }
    group.bench_function("rstar", |b| {
        b.iter(|| {
            for query in &queries {
                rstar_tree
                    .nearest_neighbor_iter(query.coords())
                    .take(10)
                    .for_each(drop);
            }
        })
    });
    group.finish();

    let tree = construct_static(&points, Algorithm::TopDown);
    let rect = Rect::new(Point::new([-0.3, -0.3, -0.3]), Point::new([0.3, 0.3, 0.3]));
    c.bench_function("count_rect (top_down)", |b| b.iter(|| tree.count_rect(&rect)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
