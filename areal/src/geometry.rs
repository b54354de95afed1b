// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exact point-in-polygon refinement.
//!
//! [`ExactGeometry`] is the capability the area database uses after the
//! bounding-box filter. Handles are plain owned values; dropping them frees
//! whatever they hold.

use kurbo::{BezPath, Point, Rect, Shape};

use crate::latlng::LatLng;

/// Builds polygon handles and tests containment.
///
/// Rings are closed implicitly: the last point connects back to the first.
pub trait ExactGeometry: Send + Sync {
    /// A single closed ring.
    type Ring;
    /// An outer ring with its holes.
    type Polygon;
    /// Disjoint polygons forming one area.
    type MultiPolygon: Send + Sync;

    /// Build a ring from its points.
    fn ring(&self, points: &[LatLng]) -> Self::Ring;

    /// Combine an outer ring with the holes cut out of it.
    fn polygon(&self, outer: Self::Ring, holes: Vec<Self::Ring>) -> Self::Polygon;

    /// Combine the parts of an area.
    fn multi_polygon(&self, parts: Vec<Self::Polygon>) -> Self::MultiPolygon;

    /// Whether `pos` is inside at least one part and outside that part's holes.
    fn contains(&self, shape: &Self::MultiPolygon, pos: LatLng) -> bool;
}

/// [`ExactGeometry`] on `kurbo` paths in the plane `x = lng`, `y = lat`.
///
/// Each ring is tested with the nonzero winding rule, so orientation does
/// not matter. Whether a point exactly on a ring's edge counts as inside is
/// up to `kurbo`'s winding computation and should not be relied upon.
#[derive(Copy, Clone, Debug, Default)]
pub struct KurboGeometry;

/// Ring handle of [`KurboGeometry`].
#[derive(Clone, Debug)]
pub struct KurboRing {
    path: BezPath,
    bounds: Option<Rect>,
}

impl KurboRing {
    fn contains(&self, pt: Point) -> bool {
        self.bounds.is_some_and(|b| covers(b, pt)) && self.path.contains(pt)
    }
}

/// Polygon handle of [`KurboGeometry`].
#[derive(Clone, Debug)]
pub struct KurboPolygon {
    outer: KurboRing,
    holes: Vec<KurboRing>,
}

impl KurboPolygon {
    fn contains(&self, pt: Point) -> bool {
        self.outer.contains(pt) && !self.holes.iter().any(|h| h.contains(pt))
    }
}

/// Multipolygon handle of [`KurboGeometry`].
#[derive(Clone, Debug, Default)]
pub struct KurboMultiPolygon {
    parts: Vec<KurboPolygon>,
}

impl KurboMultiPolygon {
    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the area has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

// Inclusive on all sides, unlike `Rect::contains`.
fn covers(r: Rect, pt: Point) -> bool {
    pt.x >= r.x0 && pt.x <= r.x1 && pt.y >= r.y0 && pt.y <= r.y1
}

fn to_point(pos: LatLng) -> Point {
    Point::new(pos.lng, pos.lat)
}

impl ExactGeometry for KurboGeometry {
    type Ring = KurboRing;
    type Polygon = KurboPolygon;
    type MultiPolygon = KurboMultiPolygon;

    fn ring(&self, points: &[LatLng]) -> KurboRing {
        let mut path = BezPath::new();
        let mut bounds: Option<Rect> = None;
        for (i, &p) in points.iter().enumerate() {
            let pt = to_point(p);
            if i == 0 {
                path.move_to(pt);
            } else {
                path.line_to(pt);
            }
            bounds = Some(match bounds {
                Some(b) => b.union_pt(pt),
                None => Rect::from_points(pt, pt),
            });
        }
        if !points.is_empty() {
            path.close_path();
        }
        KurboRing { path, bounds }
    }

    fn polygon(&self, outer: KurboRing, holes: Vec<KurboRing>) -> KurboPolygon {
        KurboPolygon { outer, holes }
    }

    fn multi_polygon(&self, parts: Vec<KurboPolygon>) -> KurboMultiPolygon {
        KurboMultiPolygon { parts }
    }

    fn contains(&self, shape: &KurboMultiPolygon, pos: LatLng) -> bool {
        let pt = to_point(pos);
        shape.parts.iter().any(|p| p.contains(pt))
    }
}
