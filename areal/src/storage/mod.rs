// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memory-mapped persistent storage for area rings.
//!
//! A store is one directory with seven flat arrays:
//!
//! | file         | element             | content                                |
//! |--------------|---------------------|----------------------------------------|
//! | `outer.data` | [`FixedCoordinate`] | points of every outer ring             |
//! | `outer.idx0` | `u64le`             | area → range of outer rings            |
//! | `outer.idx1` | `u64le`             | outer ring → range of points           |
//! | `inner.data` | [`FixedCoordinate`] | points of every hole                   |
//! | `inner.idx0` | `u64le`             | area → range of hole groups            |
//! | `inner.idx1` | `u64le`             | hole group (one per outer ring) → holes |
//! | `inner.idx2` | `u64le`             | hole → range of points                 |
//!
//! There are no headers: an array's length is its file length divided by the
//! element size. Every offset array starts with `0`.
//!
//! [`FixedCoordinate`]: crate::FixedCoordinate

mod column;
mod nested;
mod rings;

pub use rings::{LOCK_FILE, RingSource, RingStoreReader, RingStoreWriter, RingView, Rings};
