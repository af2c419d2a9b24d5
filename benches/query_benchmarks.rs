use bigwall::prelude::*;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

fn grid_sites(count: usize) -> FeatureCollection<SiteRecord> {
    let side = (count as f64).sqrt().ceil() as usize;
    (0..count)
        .map(|i| {
            let lon = -119.7 + (i % side) as f64 * 0.002;
            let lat = 37.6 + (i / side) as f64 * 0.002;
            SiteRecord::new(format!("site:{}", i), Point::new(lon, lat), (i % 17) as u64, (i * 31 % 5000) as u64)
        })
        .collect()
}

fn grid_formations(count: usize) -> FeatureCollection<FormationRecord> {
    let side = (count as f64).sqrt().ceil() as usize;
    (0..count)
        .map(|i| {
            let lon = -119.7 + (i % side) as f64 * 0.003;
            let lat = 37.6 + (i / side) as f64 * 0.003;
            let footprint = Polygon::new(
                geo::LineString::from(vec![
                    (lon, lat),
                    (lon + 0.001, lat),
                    (lon + 0.001, lat + 0.001),
                    (lon, lat + 0.001),
                    (lon, lat),
                ]),
                vec![],
            );
            FormationRecord::new(format!("formation:{}", i), footprint, (i % 900) as f64)
        })
        .collect()
}

fn benchmark_store_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_load");

    for size in [1_000, 10_000] {
        let sites = grid_sites(size);
        let formations = grid_formations(size / 4);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| FeatureStore::load(sites.clone(), formations.clone()).unwrap())
        });
    }

    group.finish();
}

fn benchmark_range_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_queries");

    let store = FeatureStore::load(grid_sites(10_000), grid_formations(2_500)).unwrap();
    let center = Point::new(-119.6, 37.7);

    for radius in [250.0, 1_000.0, 5_000.0] {
        group.bench_with_input(BenchmarkId::new("sites", radius), &radius, |b, &radius| {
            b.iter(|| store.range_query_sites(black_box(&center), radius).unwrap().len())
        });
        group.bench_with_input(BenchmarkId::new("formations", radius), &radius, |b, &radius| {
            b.iter(|| store.range_query_formations(black_box(&center), radius).unwrap().len())
        });
    }

    group.finish();
}

fn benchmark_session_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_query");

    let store = FeatureStore::load(grid_sites(10_000), grid_formations(2_500)).unwrap();
    let session = QuerySession::new(Arc::new(store));

    group.bench_function("query_1km", |b| {
        let mut counter = 0;
        b.iter(|| {
            let lon = -119.68 + (counter % 100) as f64 * 0.001;
            counter += 1;
            session.query(black_box(Point::new(lon, 37.7))).unwrap()
        })
    });

    group.bench_function("nearest_assignment", |b| {
        b.iter(|| session.store().assign_sites_to_formations(black_box(300.0)).unwrap().len())
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_store_load,
    benchmark_range_queries,
    benchmark_session_query
);

criterion_main!(benches);
