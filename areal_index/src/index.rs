// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API and generic implementation over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::backends::flatvec::FlatVec;
use crate::backends::rtree::RTree;
use crate::types::{Aabb2D, Scalar};

/// Slot handle returned by [`IndexGeneric::insert`].
///
/// Slots are dense and handed out in insertion order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(usize);

impl Slot {
    /// Position of the entry in insertion order.
    pub const fn get(self) -> usize {
        self.0
    }
}

/// An append-only AABB index parameterized by a spatial backend.
///
/// Each entry carries a plain `Copy` payload (typically an integer id) that
/// queries hand back; the backend itself only sees slot numbers.
#[derive(Debug)]
pub struct IndexGeneric<T: Copy + PartialOrd + Debug, P: Copy + Debug, B: Backend<T>> {
    entries: Vec<(Aabb2D<T>, P)>,
    backend: B,
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T> + Default,
{
    /// Create an empty index using the backend's default constructor.
    pub fn new() -> Self {
        Self::with_backend(B::default())
    }

    /// Build an index in one pass, letting the backend pack its structure.
    pub fn from_entries(entries: Vec<(Aabb2D<T>, P)>) -> Self {
        let mut idx = Self::new();
        idx.bulk_load(entries);
        idx
    }
}

impl<T, P, B> Default for IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T>,
{
    /// Create an empty index around an explicitly configured backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            backend,
        }
    }

    /// Reserve space for at least `n` more entries.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a new AABB with payload.
    pub fn insert(&mut self, aabb: Aabb2D<T>, payload: P) -> Slot {
        let slot = self.entries.len();
        self.entries.push((aabb, payload));
        self.backend.insert(slot, aabb);
        Slot(slot)
    }

    /// Replace the contents with `entries`, bulk-loading the backend.
    pub fn bulk_load(&mut self, entries: Vec<(Aabb2D<T>, P)>) {
        let pairs: Vec<(usize, Aabb2D<T>)> =
            entries.iter().enumerate().map(|(i, e)| (i, e.0)).collect();
        self.entries = entries;
        self.backend.bulk_load(&pairs);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.backend.clear();
    }

    /// Entry stored at `slot`.
    pub fn get(&self, slot: Slot) -> Option<&(Aabb2D<T>, P)> {
        self.entries.get(slot.0)
    }

    /// Payloads of entries whose AABB contains the point.
    pub fn query_point(&self, x: T, y: T) -> impl Iterator<Item = P> + '_ {
        self.backend
            .query_point(x, y)
            .filter_map(|i| self.entries.get(i).map(|e| e.1))
    }

    /// Payloads of entries whose AABB intersects the given rectangle.
    pub fn query_rect(&self, rect: Aabb2D<T>) -> impl Iterator<Item = (Aabb2D<T>, P)> + '_ {
        self.backend
            .query_rect(rect)
            .filter_map(|i| self.entries.get(i).copied())
    }
}

/// Default index using a flat vector backend.
pub type Index<T, P> = IndexGeneric<T, P, FlatVec<T>>;

/// Index backed by an R-tree.
pub type RTreeIndex<T, P> = IndexGeneric<T, P, RTree<T>>;

impl<T: Scalar, P: Copy + Debug> RTreeIndex<T, P> {
    /// Create an R-tree-backed index with a custom node fan-out.
    pub fn with_max_children(max_children: usize) -> Self {
        Self::with_backend(RTree::with_max_children(max_children))
    }
}
