// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use areal::{AreaDb, BuildOptions, LatLng, RingStoreWriter};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

/// A `side x side` grid of twelve-sided cells, every tenth one with a hole.
fn populate(db: &mut AreaDb<RingStoreWriter>, side: usize) {
    let cell = 0.01;
    for row in 0..side {
        for col in 0..side {
            let lat = 47.0 + row as f64 * cell;
            let lng = 7.0 + col as f64 * cell;
            let ring: Vec<LatLng> = (0..12)
                .map(|k| {
                    let a = k as f64 * core::f64::consts::TAU / 12.0;
                    LatLng::new(lat + 0.55 * cell * a.sin(), lng + 0.55 * cell * a.cos())
                })
                .collect();
            let holes = if (row * side + col) % 10 == 0 {
                vec![
                    (0..6)
                        .map(|k| {
                            let a = k as f64 * core::f64::consts::TAU / 6.0;
                            LatLng::new(lat + 0.1 * cell * a.sin(), lng + 0.1 * cell * a.cos())
                        })
                        .collect(),
                ]
            } else {
                Vec::new()
            };
            db.add_area(&[ring], &[holes]).expect("append area");
        }
    }
}

fn probes(count: usize, side: usize) -> Vec<LatLng> {
    let span = side as f64 * 0.01;
    (0..count)
        .map(|i| {
            let t = i as f64 / count as f64;
            LatLng::new(47.0 + span * t, 7.0 + span * ((t * 7919.0) % 1.0))
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("area_db_build");
    group.sample_size(10);
    let dir = tempfile::tempdir().expect("tempdir");
    let mut db = AreaDb::create(dir.path()).expect("create store");
    let side = 100;
    populate(&mut db, side);
    group.throughput(Throughput::Elements((side * side) as u64));
    for threads in [Some(1), None] {
        db.set_options(BuildOptions {
            threads,
            ..BuildOptions::default()
        });
        let label = threads.map_or_else(|| "global".to_owned(), |t| t.to_string());
        group.bench_function(format!("build_threads_{label}"), |b| {
            b.iter(|| black_box(db.build_index().expect("build")))
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("area_db_lookup");
    let dir = tempfile::tempdir().expect("tempdir");
    let mut db = AreaDb::create(dir.path()).expect("create store");
    let side = 100;
    populate(&mut db, side);
    db.build_index().expect("build");
    let probes = probes(10_000, side);
    group.throughput(Throughput::Elements(probes.len() as u64));

    group.bench_function("lookup", |b| {
        b.iter(|| {
            let hits: usize = probes.iter().map(|&p| db.lookup(p).len()).sum();
            black_box(hits)
        })
    });
    group.bench_function("lookup_into_reused_buffer", |b| {
        let mut out = Vec::new();
        b.iter(|| {
            let mut hits = 0;
            for &p in &probes {
                out.clear();
                db.lookup_into(p, &mut out);
                hits += out.len();
            }
            black_box(hits)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_lookup);
criterion_main!(benches);
