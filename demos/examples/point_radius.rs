// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Radius bands, box and nearest queries over a handful of stops.

use areal::{GeoBox, LatLng, PointSpatialIndex};
use tracing_subscriber::EnvFilter;

struct Stop {
    name: &'static str,
    pos: LatLng,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let stops = [
        Stop {
            name: "Hauptbahnhof",
            pos: LatLng::new(49.872_601_6, 8.631_039_6),
        },
        Stop {
            name: "Luisenplatz",
            pos: LatLng::new(49.872_824_6, 8.651_252_9),
        },
        Stop {
            name: "Schloss",
            pos: LatLng::new(49.873_810_0, 8.656_540_0),
        },
        Stop {
            name: "Hochschulstadion",
            pos: LatLng::new(49.868_420_0, 8.682_510_0),
        },
    ];
    let idx = PointSpatialIndex::from_items(&stops, |s| s.pos);
    let here = LatLng::new(49.875_627_6, 8.657_783_3);

    for band in [0.0..500.0, 500.0..1_000.0, 1_000.0..5_000.0] {
        let names: Vec<_> = idx
            .in_radius_with_distance(here, band.clone())
            .into_iter()
            .map(|(d, i)| format!("{} ({d:.0} m)", stops[i].name))
            .collect();
        println!("{:>5}..{:<5} m: {names:?}", band.start, band.end);
    }

    let center = GeoBox::around(here, 1_500.0);
    let inside: Vec<_> = idx.within(&center).into_iter().map(|i| stops[i].name).collect();
    println!("within 1.5 km box: {inside:?}");

    let (d, i) = idx.nearest(here, 1)[0];
    println!("nearest: {} at {d:.0} m", stops[i].name);
}
