// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use areal::{GeoBox, LatLng, PointSpatialIndex};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        ((x >> 11) as f64) / ((1u64 << 53) as f64)
    }
}

/// Stop-like points scattered over a metropolitan region.
fn gen_points(count: usize) -> Vec<LatLng> {
    let mut rng = Rng(0x2545_F491_4F6C_DD1D);
    (0..count)
        .map(|_| LatLng::new(52.3 + 0.4 * rng.next_f64(), 13.1 + 0.6 * rng.next_f64()))
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_index_build");
    for &n in &[10_000usize, 100_000] {
        let points = gen_points(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("collect_n{n}"), |b| {
            b.iter(|| black_box(points.iter().copied().collect::<PointSpatialIndex>()))
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_index_query");
    let points = gen_points(100_000);
    let idx: PointSpatialIndex = points.iter().copied().collect();
    let center = LatLng::new(52.52, 13.405);

    for &r in &[250.0, 1_000.0, 5_000.0] {
        group.bench_function(format!("in_radius_{r}m"), |b| {
            b.iter(|| black_box(idx.in_radius_with_distance(center, ..r).len()))
        });
    }
    group.bench_function("band_500m_1000m", |b| {
        b.iter(|| black_box(idx.in_radius(center, 500.0..1_000.0).len()))
    });
    group.bench_function("within_box", |b| {
        let bounds = GeoBox::around(center, 2_000.0);
        b.iter(|| black_box(idx.within(&bounds).len()))
    });
    group.bench_function("nearest_10", |b| {
        b.iter(|| black_box(idx.nearest(center, 10)))
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_queries);
criterion_main!(benches);
