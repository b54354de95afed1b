// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Radius, box and nearest-neighbour queries over a fixed set of points.

use core::ops::{Bound, RangeBounds};

use areal_index::{Aabb2D, DEFAULT_MAX_CHILDREN, RTreeIndex};

use crate::latlng::{EARTH_RADIUS_METERS, GeoBox, LatLng};

/// Half the Earth's circumference: no two points are farther apart.
const MAX_DISTANCE: f64 = core::f64::consts::PI * EARTH_RADIUS_METERS;

/// First search radius of [`PointSpatialIndex::nearest`].
const NEAREST_START_RADIUS: f64 = 100.0;

/// Immutable index over `(point, id)` pairs.
///
/// Radius queries filter candidates with a lat/lng box padded by the radius,
/// then check the great-circle distance exactly. A box reaching past the
/// antimeridian is queried on both sides of it.
#[derive(Debug)]
pub struct PointSpatialIndex {
    index: RTreeIndex<f64, usize>,
}

impl Default for PointSpatialIndex {
    fn default() -> Self {
        Self::new([])
    }
}

impl PointSpatialIndex {
    /// Build from `(point, id)` pairs.
    pub fn new(points: impl IntoIterator<Item = (LatLng, usize)>) -> Self {
        Self::with_max_children(points, DEFAULT_MAX_CHILDREN)
    }

    /// Build with a custom R-tree fan-out.
    pub fn with_max_children(
        points: impl IntoIterator<Item = (LatLng, usize)>,
        max_children: usize,
    ) -> Self {
        let entries = points.into_iter().map(|(p, id)| (p.to_aabb(), id)).collect();
        let mut index = RTreeIndex::with_max_children(max_children);
        index.bulk_load(entries);
        Self { index }
    }

    /// Build from a caller collection, using each item's position as its id.
    pub fn from_items<I, F>(items: I, mut position: F) -> Self
    where
        I: IntoIterator,
        F: FnMut(&I::Item) -> LatLng,
    {
        Self::new(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (position(&item), i)),
        )
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// `(distance, id)` of every point whose distance from `center` in meters
    /// lies in `radius`, nearest first, ties by id.
    ///
    /// `50.0..150.0` is the half-open band `50 <= d < 150`, so adjacent bands
    /// never share a point; `..r` means `d < r`.
    pub fn in_radius_with_distance(
        &self,
        center: LatLng,
        radius: impl RangeBounds<f64>,
    ) -> Vec<(f64, usize)> {
        let reach = match radius.end_bound() {
            Bound::Included(&r) | Bound::Excluded(&r) => r.min(MAX_DISTANCE),
            Bound::Unbounded => MAX_DISTANCE,
        };
        let mut hits: Vec<(f64, usize)> = GeoBox::around(center, reach)
            .wrap_antimeridian()
            .flat_map(|part| self.index.query_rect(part.to_aabb()))
            .filter_map(|(aabb, id)| {
                let d = center.distance(&position(&aabb));
                radius.contains(&d).then_some((d, id))
            })
            .collect();
        sort_by_distance(&mut hits);
        hits
    }

    /// Ids of [`in_radius_with_distance`](Self::in_radius_with_distance), in the same order.
    pub fn in_radius(&self, center: LatLng, radius: impl RangeBounds<f64>) -> Vec<usize> {
        self.in_radius_with_distance(center, radius)
            .into_iter()
            .map(|(_, id)| id)
            .collect()
    }

    /// Ids of the points strictly inside `bounds` (edges excluded), ascending.
    pub fn within(&self, bounds: &GeoBox) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .index
            .query_rect(bounds.to_aabb())
            .filter(|(aabb, _)| bounds.contains(position(aabb)))
            .map(|(_, id)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// The `k` points closest to `center` as `(distance, id)`, nearest first.
    ///
    /// Searches with a doubling radius and falls back to a full scan once the
    /// radius spans the globe.
    pub fn nearest(&self, center: LatLng, k: usize) -> Vec<(f64, usize)> {
        let k = k.min(self.len());
        if k == 0 {
            return Vec::new();
        }
        let mut radius = NEAREST_START_RADIUS;
        while radius < MAX_DISTANCE {
            let mut hits = self.in_radius_with_distance(center, ..radius);
            if hits.len() >= k {
                hits.truncate(k);
                return hits;
            }
            radius *= 2.0;
        }
        let mut all: Vec<(f64, usize)> = self
            .index
            .query_rect(Aabb2D::new(
                f64::NEG_INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::INFINITY,
            ))
            .map(|(aabb, id)| (center.distance(&position(&aabb)), id))
            .collect();
        sort_by_distance(&mut all);
        all.truncate(k);
        all
    }
}

impl FromIterator<LatLng> for PointSpatialIndex {
    /// Ids are positions in iteration order.
    fn from_iter<I: IntoIterator<Item = LatLng>>(iter: I) -> Self {
        Self::new(iter.into_iter().enumerate().map(|(i, p)| (p, i)))
    }
}

fn position(aabb: &Aabb2D<f64>) -> LatLng {
    LatLng::new(aabb.min_y, aabb.min_x)
}

fn sort_by_distance(hits: &mut [(f64, usize)]) {
    hits.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
}
