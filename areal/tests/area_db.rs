// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behaviour of the area database over real store directories.

use areal::{
    AreaDb, AreaId, BuildOptions, Error, GeometryError, LatLng, PolyFile, RingSource,
    StorageError,
};

fn square(lo: f64, hi: f64) -> Vec<LatLng> {
    vec![
        LatLng::new(lo, lo),
        LatLng::new(lo, hi),
        LatLng::new(hi, hi),
        LatLng::new(hi, lo),
    ]
}

fn rect(lat0: f64, lng0: f64, lat1: f64, lng1: f64) -> Vec<LatLng> {
    vec![
        LatLng::new(lat0, lng0),
        LatLng::new(lat0, lng1),
        LatLng::new(lat1, lng1),
        LatLng::new(lat1, lng0),
    ]
}

/// A mix of overlapping, multi-part and holed areas.
fn populate(db: &mut AreaDb<areal::RingStoreWriter>) {
    for i in 0..40 {
        let lo = f64::from(i) * 0.5;
        db.add_area(&[square(lo, lo + 3.0)], &[vec![]]).unwrap();
    }
    db.add_area(
        &[square(0.0, 10.0), square(30.0, 31.0)],
        &[vec![square(4.0, 6.0), square(7.0, 8.0)], vec![]],
    )
    .unwrap();
    db.add_area(
        &[vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(20.0, 10.0),
            LatLng::new(0.0, 20.0),
        ]],
        &[vec![]],
    )
    .unwrap();
}

fn probes() -> Vec<LatLng> {
    let mut out = Vec::new();
    for lat in 0..64 {
        for lng in 0..64 {
            out.push(LatLng::new(
                -0.7 + f64::from(lat) * 0.53,
                -0.3 + f64::from(lng) * 0.51,
            ));
        }
    }
    out
}

#[test]
fn simple_square_containment() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = AreaDb::create(dir.path()).unwrap();
    let id = db
        .add_area(
            &[vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 10.0),
                LatLng::new(10.0, 10.0),
                LatLng::new(10.0, 0.0),
            ]],
            &[vec![]],
        )
        .unwrap();
    assert_eq!(id, AreaId::new(0));
    db.build_index().unwrap();

    assert_eq!(db.lookup(LatLng::new(5.0, 5.0)), [AreaId::new(0)]);
    assert!(db.lookup(LatLng::new(20.0, 20.0)).is_empty());
}

#[test]
fn holes_are_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = AreaDb::create(dir.path()).unwrap();
    let id = db
        .add_area(&[square(0.0, 10.0)], &[vec![square(4.0, 6.0)]])
        .unwrap();
    db.build_index().unwrap();

    assert!(!db.is_within(LatLng::new(5.0, 5.0), id));
    assert!(db.is_within(LatLng::new(1.0, 1.0), id));
    assert!(db.lookup(LatLng::new(5.0, 5.0)).is_empty());
    assert_eq!(db.lookup(LatLng::new(1.0, 1.0)), [id]);
}

#[test]
fn box_filter_never_drops_a_match() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = AreaDb::create(dir.path()).unwrap();
    populate(&mut db);
    db.build_index().unwrap();

    let ids: Vec<AreaId> = (0..db.area_count()).map(AreaId::new).collect();
    for p in probes() {
        let found = db.lookup(p);
        let exact: Vec<AreaId> = ids.iter().copied().filter(|&id| db.is_within(p, id)).collect();
        assert_eq!(found, exact, "at {p}");
        for &id in &found {
            let b = db.bounding_box(id).unwrap();
            assert!(
                p.lat >= b.min.lat && p.lat <= b.max.lat && p.lng >= b.min.lng && p.lng <= b.max.lng,
                "{id} matched {p} outside its box"
            );
        }
    }
}

#[test]
fn boxes_cover_outer_rings_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = AreaDb::create(dir.path()).unwrap();
    let id = db
        .add_area(
            &[rect(1.0, 2.0, 3.0, 4.0), rect(10.0, -5.0, 11.0, -4.0)],
            &[vec![rect(1.5, 2.5, 2.5, 3.5)], vec![]],
        )
        .unwrap();
    db.build_index().unwrap();
    let b = db.bounding_box(id).unwrap();
    assert_eq!(b.min, LatLng::new(1.0, -5.0));
    assert_eq!(b.max, LatLng::new(11.0, 4.0));
}

#[test]
fn build_is_deterministic_across_pool_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = AreaDb::create(dir.path()).unwrap();
    populate(&mut db);

    let probes = probes();
    let mut runs = Vec::new();
    for threads in [Some(1), Some(2), Some(4), None, Some(1)] {
        db.set_options(BuildOptions {
            threads,
            ..BuildOptions::default()
        });
        let report = db.build_index().unwrap();
        assert_eq!(report.area_count, 42);
        let answers: Vec<Vec<AreaId>> = probes.iter().map(|&p| db.lookup(p)).collect();
        runs.push(answers);
    }
    assert!(runs.iter().any(|r| r.iter().any(|a| a.len() > 1)));
    for run in &runs[1..] {
        assert_eq!(run, &runs[0]);
    }
}

#[test]
fn fan_out_does_not_change_answers() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = AreaDb::create(dir.path()).unwrap();
    populate(&mut db);

    db.build_index().unwrap();
    let wide: Vec<_> = probes().into_iter().map(|p| db.lookup(p)).collect();
    db.set_options(BuildOptions::default().with_max_children(4));
    db.build_index().unwrap();
    let narrow: Vec<_> = probes().into_iter().map(|p| db.lookup(p)).collect();
    assert_eq!(wide, narrow);
}

#[test]
fn ids_are_dense_and_never_reused() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut db = AreaDb::create(dir.path()).unwrap();
        for expected in 0..5 {
            let id = db.add_area(&[square(0.0, 1.0)], &[vec![]]).unwrap();
            assert_eq!(id.get(), expected);
        }
        db.build_index().unwrap();
        let id = db.add_area(&[square(0.0, 1.0)], &[vec![]]).unwrap();
        assert_eq!(id.get(), 5);
        // A rejected append does not consume an id.
        assert!(db.add_area(&[square(0.0, 1.0)], &[]).is_err());
    }

    let mut db = AreaDb::open_append(dir.path()).unwrap();
    assert_eq!(db.area_count(), 6);
    let id = db.add_area(&[square(0.0, 1.0)], &[vec![]]).unwrap();
    assert_eq!(id.get(), 6);
}

#[test]
fn reader_sees_what_the_writer_stored() {
    let dir = tempfile::tempdir().unwrap();
    let holes = vec![vec![rect(1.123_456_78, 1.0, 2.0, 2.0)], vec![]];
    let outer = vec![
        rect(0.0, 0.0, 10.0, 10.0),
        rect(-33.868_82, 151.209_29, -33.0, 152.0),
    ];
    {
        let mut db = AreaDb::create(dir.path()).unwrap();
        db.add_area(&outer, &holes).unwrap();
        db.add_area(&[], &[]).unwrap();
        db.flush().unwrap();
    }

    let mut db = AreaDb::open(dir.path()).unwrap();
    assert_eq!(db.store().area_count(), 2);
    let stored = db.outer_rings(AreaId::new(0));
    assert_eq!(stored.len(), 2);
    for (a, b) in stored.iter().flatten().zip(outer.iter().flatten()) {
        assert!((a.lat - b.lat).abs() <= 0.5e-7 + 1e-12);
        assert!((a.lng - b.lng).abs() <= 0.5e-7 + 1e-12);
    }
    assert_eq!(db.inner_rings(AreaId::new(0), 0).len(), 1);
    assert!(db.inner_rings(AreaId::new(0), 1).is_empty());
    assert!(db.outer_rings(AreaId::new(1)).is_empty());

    // Lookups need a build in read mode too.
    assert!(db.lookup(LatLng::new(5.0, 5.0)).is_empty());
    let report = db.build_index().unwrap();
    assert_eq!(report.degenerate_area_ids, [AreaId::new(1)]);
    assert_eq!(db.lookup(LatLng::new(5.0, 5.0)), [AreaId::new(0)]);
    assert_eq!(db.lookup(LatLng::new(-33.5, 151.5)), [AreaId::new(0)]);
    assert!(db.lookup(LatLng::new(1.5, 1.5)).is_empty());
}

#[test]
fn readers_and_writers_exclude_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let writer = AreaDb::create(dir.path()).unwrap();
    assert!(matches!(
        AreaDb::open(dir.path()),
        Err(Error::Storage(StorageError::Locked { .. }))
    ));
    drop(writer);

    let reader = AreaDb::open(dir.path()).unwrap();
    let second = AreaDb::open(dir.path()).unwrap();
    assert!(matches!(
        AreaDb::open_append(dir.path()),
        Err(Error::Storage(StorageError::Locked { .. }))
    ));
    drop((reader, second));
    AreaDb::open_append(dir.path()).unwrap();
}

#[test]
fn corrupt_store_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut db = AreaDb::create(dir.path()).unwrap();
        db.add_area(&[square(0.0, 1.0)], &[vec![]]).unwrap();
    }
    // Chop the last offset off the outer ring level.
    let idx1 = dir.path().join("outer.idx1");
    let bytes = std::fs::read(&idx1).unwrap();
    std::fs::write(&idx1, &bytes[..bytes.len() - 8]).unwrap();

    let err = AreaDb::open(dir.path()).unwrap_err();
    assert!(
        matches!(err, Error::Storage(StorageError::Corrupt { .. })),
        "{err}"
    );
}

#[test]
fn invalid_geometry_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = AreaDb::create(dir.path()).unwrap();
    let err = db
        .add_area(&[square(0.0, 1.0), square(2.0, 3.0)], &[vec![]])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidGeometry(GeometryError::RingCountMismatch { outer: 2, inner: 1 })
    ));
    let err = db.add_area(&[vec![]], &[vec![]]).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidGeometry(GeometryError::EmptyRing { outer: 0, hole: None })
    ));
    assert_eq!(db.area_count(), 0);
}

#[test]
fn poly_files_become_areas() {
    let dir = tempfile::tempdir().unwrap();
    let poly = PolyFile::parse(
        "city\n1\n 8.0 49.0\n 9.0 49.0\n 9.0 50.0\n 8.0 50.0\nEND\n!1\n 8.4 49.4\n 8.6 49.4\n 8.6 49.6\n 8.4 49.6\nEND\nEND\n",
    )
    .unwrap();
    let mut db = AreaDb::create(dir.path()).unwrap();
    let id = db.add_poly(&poly).unwrap();
    db.build_index().unwrap();
    assert_eq!(db.lookup(LatLng::new(49.2, 8.2)), [id]);
    assert!(db.lookup(LatLng::new(49.5, 8.5)).is_empty());
}
