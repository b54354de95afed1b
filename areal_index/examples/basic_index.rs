// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Areal Index: insert, bulk load, and query.

use areal_index::{Aabb2D, RTreeIndex};

fn main() {
    let mut idx: RTreeIndex<i64, u32> = RTreeIndex::new();
    idx.insert(Aabb2D::new(0, 0, 10, 10), 1);
    idx.insert(Aabb2D::new(5, 5, 15, 15), 2);

    // Query a point
    let hits: Vec<_> = idx.query_point(6, 6).collect();
    println!("hits at (6,6): {hits:?}");

    // Rebuild in one pass from a snapshot
    let packed = RTreeIndex::<i64, u32>::from_entries(
        (0..100)
            .map(|i| (Aabb2D::new(i * 10, 0, i * 10 + 9, 9), u32::try_from(i).unwrap_or(u32::MAX)))
            .collect(),
    );
    let hits: Vec<_> = packed.query_rect(Aabb2D::new(25, 0, 45, 0)).collect();
    println!("packed hits: {hits:?}");
}
