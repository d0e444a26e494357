use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use geocluster::compute::grid::GridClusterer;
use geocluster::reconcile::{VisibleSet, reconcile};
use geocluster::{Annotation, CancellationToken, ClusterConfig, Coordinate, MapRect, QuadTree};
use parking_lot::RwLock;
use std::sync::Arc;

fn scattered(n: usize) -> Vec<Arc<Annotation>> {
    (0..n)
        .map(|i| {
            let lon = ((i * 7919) % 36_000) as f64 / 100.0 - 180.0;
            let lat = ((i * 104_729) % 16_000) as f64 / 100.0 - 80.0;
            Arc::new(Annotation::new(Coordinate::new(lon, lat)))
        })
        .collect()
}

fn europe() -> MapRect {
    MapRect::from_coordinates(&Coordinate::new(-10.0, 60.0), &Coordinate::new(30.0, 35.0))
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree");

    for size in [1_000, 10_000, 100_000].iter() {
        let items = scattered(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("insert", size), &items, |b, items| {
            b.iter(|| {
                let mut tree = QuadTree::new();
                for a in items {
                    tree.insert(a.clone());
                }
                black_box(tree.len())
            });
        });

        let mut tree = QuadTree::new();
        for a in &items {
            tree.insert(a.clone());
        }
        group.bench_with_input(BenchmarkId::new("query_europe", size), &tree, |b, tree| {
            b.iter(|| black_box(tree.query(&europe()).len()));
        });
    }

    group.finish();
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_pass");
    let config = ClusterConfig::default();

    for size in [1_000, 10_000, 100_000].iter() {
        let mut tree = QuadTree::new();
        for a in scattered(*size) {
            tree.insert(a);
        }
        let index = RwLock::new(tree);

        for level in [4, 8].iter() {
            let scale = 2f64.powi(level - 20);
            group.bench_with_input(
                BenchmarkId::new(format!("level_{}", level), size),
                &scale,
                |b, &scale| {
                    b.iter(|| {
                        GridClusterer::new(&config)
                            .run(&index, scale, &europe(), &CancellationToken::new())
                            .map(|pass| pass.markers.len())
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let config = ClusterConfig::default();
    let mut tree = QuadTree::new();
    for a in scattered(50_000) {
        tree.insert(a);
    }
    let index = RwLock::new(tree);
    let token = CancellationToken::new();
    let coarse = GridClusterer::new(&config)
        .run(&index, 2f64.powi(-16), &europe(), &token)
        .map(|pass| pass.markers)
        .unwrap_or_default();
    let fine = GridClusterer::new(&config)
        .run(&index, 2f64.powi(-12), &europe(), &token)
        .map(|pass| pass.markers)
        .unwrap_or_default();

    group.bench_function("zoom_in", |b| {
        b.iter(|| {
            let mut visible = VisibleSet::new();
            reconcile(&mut visible, coarse.clone(), &europe(), true);
            black_box(reconcile(&mut visible, fine.clone(), &europe(), true))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_index, bench_clustering, bench_reconcile);
criterion_main!(benches);
