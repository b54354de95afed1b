// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use areal_index::{Aabb2D, Index, RTreeIndex};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb2D::<f64>::from_xywh(x0, y0, cell, cell));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// Boxes shaped like administrative areas: mostly small, a few large.
fn gen_area_like_rects(count: usize, world: f64, seed: u64) -> Vec<Aabb2D<f64>> {
    let mut rng = Rng::new(seed);
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let size = if i % 50 == 0 { world / 8.0 } else { world / 200.0 };
        let x = rng.next_f64() * world;
        let y = rng.next_f64() * world;
        let w = size * (0.5 + rng.next_f64());
        let h = size * (0.5 + rng.next_f64());
        out.push(Aabb2D::from_xywh(x, y, w, h));
    }
    out
}

fn bench_flatvec(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatvec");
    for &n in &[32usize, 64] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("insert_query_point_n{}", n), |b| {
            b.iter_batched(
                Index::<f64, u32>::new,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(r, i as u32);
                    }
                    let hits: usize = idx.query_point(105.0, 105.0).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_rtree_insert_vs_bulk(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_f64");
    for &n in &[64usize, 128, 256] {
        let rects = gen_grid_rects(n, 10.0);
        let query = Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0);
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("insert_query_n{}", n), |b| {
            b.iter_batched(
                RTreeIndex::<f64, u32>::new,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(r, i as u32);
                    }
                    let hits: usize = idx.query_rect(query).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("bulk_query_n{}", n), |b| {
            b.iter_batched(
                || {
                    rects
                        .iter()
                        .copied()
                        .enumerate()
                        .map(|(i, r)| (r, i as u32))
                        .collect::<Vec<_>>()
                },
                |entries| {
                    let idx = RTreeIndex::<f64, u32>::from_entries(entries);
                    let hits: usize = idx.query_rect(query).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_f64_fan_out");
    let rects = gen_area_like_rects(20_000, 360.0, 0x9E37_79B9_7F4A_7C15);
    let entries: Vec<_> = rects
        .iter()
        .copied()
        .enumerate()
        .map(|(i, r)| (r, i))
        .collect();
    for &m in &[4usize, 8, 16, 32] {
        let mut idx = RTreeIndex::<f64, usize>::with_max_children(m);
        idx.bulk_load(entries.clone());
        group.bench_function(format!("point_queries_m{}", m), |b| {
            let mut rng = Rng::new(7);
            b.iter(|| {
                let mut total = 0;
                for _ in 0..1_000 {
                    let x = rng.next_f64() * 360.0;
                    let y = rng.next_f64() * 360.0;
                    total += idx.query_point(x, y).count();
                }
                black_box(total);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flatvec, bench_rtree_insert_vs_bulk, bench_fan_out);
criterion_main!(benches);
