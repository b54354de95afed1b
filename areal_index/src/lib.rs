// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Areal Index: an append-only 2D AABB index (bounding-box index).
//!
//! Areal Index is the coarse-filter building block behind the `areal` crate's
//! area database and point index.
//!
//! - Insert axis-aligned bounding boxes (AABBs) with plain `Copy` payloads.
//! - Bulk-load a packed structure from a snapshot of entries.
//! - Query by point or intersecting rectangle. Bounds are inclusive: touching counts.
//!
//! It is generic over the scalar type `T` and does not depend on any geometry crate.
//! Entries are never removed or moved; rebuild the index from scratch instead.
//!
//! Backends are pluggable via a simple trait so you can swap the spatial strategy without API churn.
//! The default backend is a flat vector (linear scan). The R-tree backend is generic over the
//! scalar and uses widened accumulator types (f64→f64, i64→i128) for its split metrics.
//!
//! # Example
//!
//! ```rust
//! use areal_index::{Aabb2D, RTreeIndex};
//!
//! let mut idx: RTreeIndex<i64, u32> = RTreeIndex::new();
//! idx.insert(Aabb2D::new(0, 0, 10, 10), 1);
//! idx.insert(Aabb2D::new(5, 5, 15, 15), 2);
//!
//! // Query a point inside both boxes.
//! let mut hits: Vec<_> = idx.query_point(6, 6).collect();
//! hits.sort();
//! assert_eq!(hits, [1, 2]);
//!
//! // A point on the first box's edge still hits it.
//! assert_eq!(idx.query_point(0, 0).collect::<Vec<_>>(), [1]);
//! ```
//!
//! ## Choosing a backend
//!
//! - `FlatVec` (default): simplest and smallest, linear scans. Good for very small sets
//!   and as a reference implementation in tests.
//! - `RTreeF64`/`RTreeI64`: R-tree with quadratic splits on insert and STR packing on
//!   bulk load. Good general-purpose index for irregular distributions.
//!   See the [`backends`] docs for a short description of the split.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates. Inverted boxes (for example
//! [`Aabb2D::EMPTY`]) are accepted and never match a query.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod index;
pub mod types;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::rtree::{DEFAULT_MAX_CHILDREN, RTree, RTreeF64, RTreeI64};
pub use index::{Index, IndexGeneric, RTreeIndex, Slot};
pub use types::{Aabb2D, Scalar};
