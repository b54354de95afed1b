// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `areal_index` against `rstar` on the two query shapes areal issues:
//! point stabbing into area boxes, and radius pre-filtering over points.

#![cfg(feature = "compare_rstar")]

use areal::{GeoBox, LatLng, PointSpatialIndex, distance};
use areal_index::{Aabb2D, RTreeIndex};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

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

    fn lat_lng(&mut self) -> LatLng {
        LatLng::new(-60.0 + 120.0 * self.next_f64(), -180.0 + 360.0 * self.next_f64())
    }
}

/// Boxes of administrative areas: mostly municipalities, some regions.
fn area_boxes(count: usize) -> Vec<GeoBox> {
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
    (0..count)
        .map(|i| {
            let size = if i % 100 == 0 { 4.0 } else { 0.2 };
            let sw = rng.lat_lng();
            let ne = LatLng::new(
                sw.lat + size * (0.5 + rng.next_f64()),
                sw.lng + size * (0.5 + rng.next_f64()),
            );
            GeoBox::new(sw, ne)
        })
        .collect()
}

fn to_rstar_rect(b: &GeoBox) -> Rectangle<[f64; 2]> {
    Rectangle::from_corners([b.min.lng, b.min.lat], [b.max.lng, b.max.lat])
}

fn bench_area_boxes(c: &mut Criterion) {
    let mut group = c.benchmark_group("area_box_stabbing");
    let mut rng = Rng(0xD1B5_4A32_D192_ED03);
    let probes: Vec<LatLng> = (0..10_000).map(|_| rng.lat_lng()).collect();

    for &n in &[10_000usize, 100_000] {
        let boxes = area_boxes(n);
        group.throughput(Throughput::Elements(probes.len() as u64));

        let areal = RTreeIndex::<f64, usize>::from_entries(
            boxes.iter().enumerate().map(|(i, b)| (b.to_aabb(), i)).collect(),
        );
        group.bench_function(format!("areal_lookup_n{n}"), |b| {
            b.iter(|| {
                let hits: usize = probes
                    .iter()
                    .map(|p| areal.query_point(p.lng, p.lat).count())
                    .sum();
                black_box(hits)
            })
        });

        let rstar = RTree::bulk_load(boxes.iter().map(to_rstar_rect).collect());
        group.bench_function(format!("rstar_lookup_n{n}"), |b| {
            b.iter(|| {
                let hits: usize = probes
                    .iter()
                    .map(|p| rstar.locate_all_at_point(&[p.lng, p.lat]).count())
                    .sum();
                black_box(hits)
            })
        });

        group.bench_function(format!("areal_bulk_load_n{n}"), |b| {
            b.iter_batched(
                || boxes.iter().enumerate().map(|(i, b)| (b.to_aabb(), i)).collect::<Vec<_>>(),
                |entries| black_box(RTreeIndex::<f64, usize>::from_entries(entries).len()),
                BatchSize::LargeInput,
            )
        });
        group.bench_function(format!("rstar_bulk_load_n{n}"), |b| {
            b.iter_batched(
                || boxes.iter().map(to_rstar_rect).collect::<Vec<_>>(),
                |rects| black_box(RTree::bulk_load(rects).size()),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_point_radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_radius_prefilter");
    let mut rng = Rng(0x2545_F491_4F6C_DD1D);
    let points: Vec<LatLng> = (0..100_000)
        .map(|_| LatLng::new(47.0 + 8.0 * rng.next_f64(), 5.0 + 10.0 * rng.next_f64()))
        .collect();
    let centers: Vec<LatLng> = (0..1_000)
        .map(|_| LatLng::new(48.0 + 6.0 * rng.next_f64(), 6.0 + 8.0 * rng.next_f64()))
        .collect();
    let radius = 2_000.0;
    group.throughput(Throughput::Elements(centers.len() as u64));

    let areal: PointSpatialIndex = points.iter().copied().collect();
    group.bench_function("areal_in_radius", |b| {
        b.iter(|| {
            let hits: usize = centers
                .iter()
                .map(|&c| areal.in_radius(c, ..radius).len())
                .sum();
            black_box(hits)
        })
    });

    // Same box pre-filter and distance check, with rstar doing the filtering.
    let rstar = RTree::bulk_load(points.iter().map(|p| [p.lng, p.lat]).collect());
    group.bench_function("rstar_in_radius", |b| {
        b.iter(|| {
            let hits: usize = centers
                .iter()
                .map(|&c| {
                    let Aabb2D {
                        min_x,
                        min_y,
                        max_x,
                        max_y,
                    } = GeoBox::around(c, radius).to_aabb();
                    let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
                    rstar
                        .locate_in_envelope(&envelope)
                        .filter(|p| distance(c, LatLng::new(p[1], p[0])) < radius)
                        .count()
                })
                .sum();
            black_box(hits)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_area_boxes, bench_point_radius);
criterion_main!(benches);
