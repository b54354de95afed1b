// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build an area store, index it and look points up.
//!
//! Run with `RUST_LOG=debug` to see the per-area build diagnostics.

use areal::{AreaDb, LatLng, PolyFile};
use tracing_subscriber::EnvFilter;

const DISTRICT: &str = "\
district
1
   8.60 49.85
   8.70 49.85
   8.70 49.90
   8.60 49.90
END
!1
   8.64 49.87
   8.66 49.87
   8.66 49.88
   8.64 49.88
END
END
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dir = tempfile::tempdir()?;
    let mut db = AreaDb::create(dir.path())?;

    let district = db.add_poly(&PolyFile::parse(DISTRICT)?)?;
    let park = db.add_area(
        &[vec![
            LatLng::new(49.865, 8.645),
            LatLng::new(49.865, 8.675),
            LatLng::new(49.885, 8.675),
            LatLng::new(49.885, 8.645),
        ]],
        &[vec![]],
    )?;
    // No outer rings: reported by the build, never matched.
    db.add_area(&[], &[])?;

    let report = db.build_index()?;
    println!(
        "indexed {} areas, {} degenerate",
        report.area_count,
        report.degenerate_area_ids.len()
    );

    for (name, p) in [
        ("west side", LatLng::new(49.86, 8.61)),
        ("park in the hole", LatLng::new(49.875, 8.65)),
        ("park outside the hole", LatLng::new(49.866, 8.67)),
        ("outside", LatLng::new(50.0, 9.0)),
    ] {
        println!("{name:>22} {p}: {:?}", db.lookup(p));
    }
    println!("{district} and {park} are now stored in {}", dir.path().display());

    // Freeze to a read-only handle; the index built above is kept.
    let db = db.freeze()?;
    println!("frozen lookup: {:?}", db.lookup(LatLng::new(49.866, 8.67)));
    Ok(())
}
