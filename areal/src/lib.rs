// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Areal: persistent point-in-area lookup and point radius queries.
//!
//! - [`AreaDb`] stores polygonal areas (several outer rings, each with holes)
//!   in memory-mapped files, builds a bounding-box index in parallel, and
//!   answers "which areas contain this point?".
//! - [`PointSpatialIndex`] answers radius, box and nearest queries over a
//!   fixed set of points.
//!
//! Both filter candidates with an [`areal_index`] R-tree first and then run an
//! exact test: polygon containment for areas, great-circle distance for points.
//!
//! # Example
//!
//! ```rust
//! use areal::{AreaDb, AreaId, LatLng};
//!
//! # fn main() -> Result<(), areal::Error> {
//! let dir = tempfile::tempdir().unwrap();
//! let square = vec![
//!     LatLng::new(0.0, 0.0),
//!     LatLng::new(0.0, 10.0),
//!     LatLng::new(10.0, 10.0),
//!     LatLng::new(10.0, 0.0),
//! ];
//!
//! let mut db = AreaDb::create(dir.path())?;
//! let id = db.add_area(&[square], &[vec![]])?;
//! db.build_index()?;
//! assert_eq!(db.lookup(LatLng::new(5.0, 5.0)), [id]);
//! drop(db);
//!
//! // Any number of processes can map the same store read-only.
//! let mut db = AreaDb::open(dir.path())?;
//! db.build_index()?;
//! assert_eq!(db.lookup(LatLng::new(5.0, 5.0)), [AreaId::new(0)]);
//! assert!(db.lookup(LatLng::new(20.0, 20.0)).is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Boundaries
//!
//! The bounding-box filter is inclusive: a point on an area's box edge is a
//! candidate. [`GeoBox::contains`] and [`PointSpatialIndex::within`] are
//! strict: points on the edge are outside. Points exactly on a ring are
//! decided by the [`ExactGeometry`] implementation.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and spans (store opening, builds,
//! degenerate areas) and never installs a subscriber.
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`LatLng`], [`GeoBox`],
//!   [`AreaId`] and [`BuildOptions`].

pub mod area_db;
pub mod config;
pub mod error;
pub mod fixed;
pub mod geometry;
pub mod latlng;
pub mod point_index;
pub mod poly_file;
pub mod storage;

pub use area_db::{AreaAnomaly, AreaDb, AreaId, BuildReport};
pub use config::BuildOptions;
pub use error::{Error, GeometryError, Result, StorageError};
pub use fixed::FixedCoordinate;
pub use geometry::{ExactGeometry, KurboGeometry};
pub use latlng::{GeoBox, LatLng, distance};
pub use point_index::PointSpatialIndex;
pub use poly_file::PolyFile;
pub use storage::{RingSource, RingStoreReader, RingStoreWriter};
