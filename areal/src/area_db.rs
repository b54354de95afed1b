// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The area database: ring storage plus a derived point-in-area index.
//!
//! An [`AreaDb`] owns a ring store and, after [`build_index`](AreaDb::build_index),
//! one bounding box and one exact shape per area. Lookups filter by box first
//! and only run the exact test on candidates.
//!
//! The store type fixes the mode: `AreaDb<RingStoreWriter>` can append,
//! `AreaDb<RingStoreReader>` cannot. Both can build and query.

use core::fmt;
use std::path::Path;

use areal_index::RTreeIndex;
use bitflags::bitflags;
use parking_lot::Mutex;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info_span, warn};

use crate::config::BuildOptions;
use crate::error::Result;
use crate::fixed::FixedCoordinate;
use crate::geometry::{ExactGeometry, KurboGeometry};
use crate::latlng::{GeoBox, LatLng};
use crate::poly_file::PolyFile;
use crate::storage::{RingSource, RingStoreReader, RingStoreWriter, RingView};

/// Dense area identifier, assigned in insertion order starting at 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaId(usize);

impl AreaId {
    /// Wrap a raw index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The raw index.
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "area {}", self.0)
    }
}

bitflags! {
    /// Why an area was reported as degenerate by a build.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AreaAnomaly: u8 {
        /// No outer rings: the box is empty and no lookup can reach the area.
        const NO_OUTER_RINGS = 0b0000_0001;
        /// The box has zero width or height.
        const ZERO_EXTENT    = 0b0000_0010;
        /// An outer ring has fewer than three points and encloses nothing.
        const SHORT_RINGS    = 0b0000_0100;
    }
}

/// Outcome of [`AreaDb::build_index`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Number of areas indexed.
    pub area_count: usize,
    /// Areas with degenerate geometry, ascending.
    pub degenerate_area_ids: Vec<AreaId>,
    /// `anomalies[i]` describes `degenerate_area_ids[i]`.
    pub anomalies: Vec<AreaAnomaly>,
}

impl BuildReport {
    /// Degenerate areas paired with their anomalies.
    pub fn degenerate(&self) -> impl Iterator<Item = (AreaId, AreaAnomaly)> + '_ {
        self.degenerate_area_ids
            .iter()
            .copied()
            .zip(self.anomalies.iter().copied())
    }
}

struct BuiltArea<M> {
    bbox: GeoBox,
    shape: M,
    anomaly: AreaAnomaly,
}

/// Persistent set of areas answering "which areas contain this point?".
pub struct AreaDb<S, G: ExactGeometry = KurboGeometry> {
    store: S,
    geometry: G,
    options: BuildOptions,
    index: RTreeIndex<f64, AreaId>,
    boxes: Vec<GeoBox>,
    shapes: Vec<G::MultiPolygon>,
    built: bool,
}

impl<S: RingSource + fmt::Debug, G: ExactGeometry> fmt::Debug for AreaDb<S, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaDb")
            .field("store", &self.store)
            .field("options", &self.options)
            .field("indexed_areas", &self.shapes.len())
            .finish_non_exhaustive()
    }
}

impl AreaDb<RingStoreReader> {
    /// Open the store in `dir` read-only. Call [`build_index`](Self::build_index)
    /// before querying.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_store(RingStoreReader::open(dir)?))
    }
}

impl AreaDb<RingStoreWriter> {
    /// Create an empty store in `dir`, truncating any existing one.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_store(RingStoreWriter::create(dir)?))
    }

    /// Open the store in `dir` for further appends.
    pub fn open_append(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_store(RingStoreWriter::open_append(dir)?))
    }
}

impl<S: RingSource> AreaDb<S> {
    /// Wrap an opened store using [`KurboGeometry`].
    pub fn from_store(store: S) -> Self {
        Self::with_geometry(store, KurboGeometry)
    }
}

impl<G: ExactGeometry> AreaDb<RingStoreWriter, G> {
    /// Append an area and return its id.
    ///
    /// `inner[i]` lists the holes of `outer[i]`; the lengths must match. The
    /// new area is not found by lookups until the next
    /// [`build_index`](Self::build_index).
    pub fn add_area(&mut self, outer: &[Vec<LatLng>], inner: &[Vec<Vec<LatLng>>]) -> Result<AreaId> {
        self.store.append_area(outer, inner)
    }

    /// Append the polygon of a `.poly` file as one area.
    pub fn add_poly(&mut self, poly: &PolyFile) -> Result<AreaId> {
        self.add_area(&poly.outer, &poly.inner)
    }

    /// Write appended areas back to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }

    /// Close the writer and reopen the same store read-only, keeping the index.
    pub fn freeze(self) -> Result<AreaDb<RingStoreReader, G>> {
        let Self {
            store,
            geometry,
            options,
            index,
            boxes,
            shapes,
            built,
        } = self;
        let dir = store.dir().to_owned();
        drop(store);
        Ok(AreaDb {
            store: RingStoreReader::open(dir)?,
            geometry,
            options,
            index,
            boxes,
            shapes,
            built,
        })
    }
}

impl<S: RingSource, G: ExactGeometry> AreaDb<S, G> {
    /// Wrap an opened store with a custom exact-geometry implementation.
    pub fn with_geometry(store: S, geometry: G) -> Self {
        Self {
            store,
            geometry,
            options: BuildOptions::default(),
            index: RTreeIndex::new(),
            boxes: Vec::new(),
            shapes: Vec::new(),
            built: false,
        }
    }

    /// Replace the build options.
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the build options used by the next build.
    pub fn set_options(&mut self, options: BuildOptions) {
        self.options = options;
    }

    /// Current build options.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// The underlying ring store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give up the index and return the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Number of stored areas, indexed or not.
    pub fn area_count(&self) -> usize {
        self.store.area_count()
    }

    /// Whether a build has run and covers every stored area.
    pub fn is_indexed(&self) -> bool {
        self.built && self.shapes.len() == self.area_count()
    }

    /// Decoded outer rings of `id`.
    pub fn outer_rings(&self, id: AreaId) -> Vec<Vec<LatLng>> {
        self.store.view().outer_rings(id).decode()
    }

    /// Decoded holes of outer ring `outer` of `id`.
    pub fn inner_rings(&self, id: AreaId, outer: usize) -> Vec<Vec<LatLng>> {
        self.store.view().inner_rings(id, outer).decode()
    }

    /// Bounding box computed for `id` by the last build, if it is non-empty.
    pub fn bounding_box(&self, id: AreaId) -> Option<GeoBox> {
        self.boxes.get(id.get()).copied().filter(|b| !b.is_empty())
    }

    /// (Re)build the bounding-box index and exact shapes for every stored area.
    ///
    /// Areas are processed in parallel. Per-area results land in slots by id,
    /// so the outcome does not depend on scheduling. Degenerate areas are
    /// reported, not rejected. The previous index is replaced only if the
    /// build succeeds.
    pub fn build_index(&mut self) -> Result<BuildReport> {
        let area_count = self.area_count();
        let _span = info_span!("build_index", area_count, threads = ?self.options.threads).entered();

        let index = Mutex::new(RTreeIndex::with_max_children(self.options.max_children));
        let built = match self.options.threads {
            Some(threads) => ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?
                .install(|| self.build_areas(&index)),
            None => self.build_areas(&index),
        };

        let mut report = BuildReport {
            area_count,
            ..BuildReport::default()
        };
        let mut boxes = Vec::with_capacity(built.len());
        let mut shapes = Vec::with_capacity(built.len());
        for (i, area) in built.into_iter().enumerate() {
            if !area.anomaly.is_empty() {
                debug!(area = i, anomaly = ?area.anomaly, "degenerate area");
                report.degenerate_area_ids.push(AreaId(i));
                report.anomalies.push(area.anomaly);
            }
            boxes.push(area.bbox);
            shapes.push(area.shape);
        }
        if !report.degenerate_area_ids.is_empty() {
            warn!(
                count = report.degenerate_area_ids.len(),
                first = report.degenerate_area_ids[0].get(),
                "areas with degenerate geometry; areas without outer rings never match a lookup"
            );
        }

        self.index = index.into_inner();
        self.boxes = boxes;
        self.shapes = shapes;
        self.built = true;
        debug!(indexed = self.index.len(), "area index built");
        Ok(report)
    }

    fn build_areas(&self, index: &Mutex<RTreeIndex<f64, AreaId>>) -> Vec<BuiltArea<G::MultiPolygon>> {
        let view = self.store.view();
        let geometry = &self.geometry;
        (0..view.area_count())
            .into_par_iter()
            .map_init(Vec::new, |points, i| {
                let id = AreaId(i);
                let area = build_area(geometry, view, id, points);
                if !area.bbox.is_empty() {
                    index.lock().insert(area.bbox.to_aabb(), id);
                }
                area
            })
            .collect()
    }

    /// Ids of all areas containing `pos`, ascending. Empty before the first build.
    pub fn lookup(&self, pos: LatLng) -> Vec<AreaId> {
        let mut out = Vec::new();
        self.lookup_into(pos, &mut out);
        out
    }

    /// Append the ids of all areas containing `pos` to `out`.
    ///
    /// The appended run is sorted; earlier contents of `out` are left alone,
    /// so a reused buffer may end up with duplicates across calls.
    pub fn lookup_into(&self, pos: LatLng, out: &mut Vec<AreaId>) {
        let start = out.len();
        out.extend(
            self.index
                .query_point(pos.lng, pos.lat)
                .filter(|&id| self.is_within(pos, id)),
        );
        out[start..].sort_unstable();
    }

    /// Exact containment test for one area, skipping the box filter.
    ///
    /// False for ids not covered by the last build. Points on a ring's
    /// boundary give an implementation-defined answer.
    pub fn is_within(&self, pos: LatLng, id: AreaId) -> bool {
        self.shapes
            .get(id.get())
            .is_some_and(|shape| self.geometry.contains(shape, pos))
    }
}

fn decode_into(buf: &mut Vec<LatLng>, ring: &[FixedCoordinate]) {
    buf.clear();
    buf.extend(ring.iter().map(|c| c.decode()));
}

/// Box, shape and anomalies of one area. `points` is reused across areas.
fn build_area<G: ExactGeometry>(
    geometry: &G,
    view: RingView<'_>,
    id: AreaId,
    points: &mut Vec<LatLng>,
) -> BuiltArea<G::MultiPolygon> {
    let outer = view.outer_rings(id);
    let mut anomaly = AreaAnomaly::empty();
    if outer.is_empty() {
        anomaly |= AreaAnomaly::NO_OUTER_RINGS;
    }

    let mut bbox = GeoBox::EMPTY;
    let mut parts = Vec::with_capacity(outer.len());
    for (o, ring) in outer.iter().enumerate() {
        decode_into(points, ring);
        if points.len() < 3 {
            anomaly |= AreaAnomaly::SHORT_RINGS;
        }
        for &p in points.iter() {
            bbox.extend(p);
        }
        let shell = geometry.ring(points);
        let holes = view
            .inner_rings(id, o)
            .iter()
            .map(|hole| {
                decode_into(points, hole);
                geometry.ring(points)
            })
            .collect();
        parts.push(geometry.polygon(shell, holes));
    }
    if !bbox.is_empty() && (bbox.min.lat >= bbox.max.lat || bbox.min.lng >= bbox.max.lng) {
        anomaly |= AreaAnomaly::ZERO_EXTENT;
    }

    BuiltArea {
        bbox,
        shape: geometry.multi_polygon(parts),
        anomaly,
    }
}
