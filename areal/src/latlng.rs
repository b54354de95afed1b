// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geographic coordinates, great-circle distance and lat/lng boxes.
//!
//! Index structures work in a plane with `x = lng` and `y = lat`; the
//! conversions to [`Aabb2D`] live here so that mapping is defined once.

use core::f64::consts::FRAC_PI_2;
use core::fmt;

use areal_index::Aabb2D;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Length of one degree of latitude, as used when widening boxes by a distance.
const METERS_PER_LAT_DEGREE: f64 = 111_000.0;

/// Length of one degree of longitude at the equator, as used when widening boxes.
const METERS_PER_LNG_DEGREE_AT_EQUATOR: f64 = 111_200.0;

/// A latitude/longitude pair in degrees.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLng {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl LatLng {
    /// Create a coordinate from latitude and longitude in degrees.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in meters.
    pub fn distance(&self, other: &Self) -> f64 {
        distance(*self, *other)
    }

    /// Zero-size box at this coordinate in index space.
    pub fn to_aabb(self) -> Aabb2D<f64> {
        Aabb2D::point(self.lng, self.lat)
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// Great-circle (haversine) distance between two coordinates in meters.
pub fn distance(a: LatLng, b: LatLng) -> f64 {
    let (phi1, phi2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_phi = phi2 - phi1;
    let d_lambda = (b.lng - a.lng).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Axis-aligned lat/lng box.
///
/// The default box is inverted (min = +inf, max = -inf) so that the first
/// [`extend`](Self::extend) makes it exactly that point.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoBox {
    /// South-west corner.
    pub min: LatLng,
    /// North-east corner.
    pub max: LatLng,
}

impl Default for GeoBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl GeoBox {
    /// Inverted box containing nothing.
    pub const EMPTY: Self = Self {
        min: LatLng::new(f64::INFINITY, f64::INFINITY),
        max: LatLng::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    /// Box from its corners.
    pub const fn new(min: LatLng, max: LatLng) -> Self {
        Self { min, max }
    }

    /// Envelope of a set of coordinates.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Self {
        let mut b = Self::EMPTY;
        for p in points {
            b.extend(p);
        }
        b
    }

    /// Box enclosing every point within `meters` of `center`.
    ///
    /// Longitudes span the widest part of the spherical cap, or the whole
    /// globe once the cap reaches a pole. A cap crossing the antimeridian
    /// yields longitudes beyond ±180°; see
    /// [`wrap_antimeridian`](Self::wrap_antimeridian).
    pub fn around(center: LatLng, meters: f64) -> Self {
        let angle = meters / EARTH_RADIUS_METERS;
        let d_lat = meters / METERS_PER_LAT_DEGREE;
        let (min_lat, max_lat) = (center.lat - d_lat, center.lat + d_lat);

        let spread = angle.sin() / center.lat.to_radians().cos();
        let reaches_pole = min_lat <= -90.0 || max_lat >= 90.0;
        let (min_lng, max_lng) = if reaches_pole || angle >= FRAC_PI_2 || spread >= 1.0 {
            (-180.0, 180.0)
        } else {
            // Slack for rounding in the distance computation.
            let d_lng = spread.asin().to_degrees() * (1.0 + 1e-9);
            (center.lng - d_lng, center.lng + d_lng)
        };
        Self::new(LatLng::new(min_lat, min_lng), LatLng::new(max_lat, max_lng))
    }

    /// The box as one or two boxes within ±180° longitude.
    ///
    /// A box reaching past the antimeridian is returned as is, followed by a
    /// copy shifted by 360° that covers the part on the other side.
    pub fn wrap_antimeridian(&self) -> impl Iterator<Item = Self> + use<> {
        let shift = if self.is_empty() {
            None
        } else if self.min.lng < -180.0 && self.max.lng < 180.0 {
            Some(360.0)
        } else if self.max.lng > 180.0 && self.min.lng > -180.0 {
            Some(-360.0)
        } else {
            None
        };
        let shifted = shift.map(|d| {
            Self::new(
                LatLng::new(self.min.lat, self.min.lng + d),
                LatLng::new(self.max.lat, self.max.lng + d),
            )
        });
        core::iter::once(*self).chain(shifted)
    }

    /// Grow the box to include `pos`.
    pub fn extend(&mut self, pos: LatLng) {
        self.min.lat = self.min.lat.min(pos.lat);
        self.min.lng = self.min.lng.min(pos.lng);
        self.max.lat = self.max.lat.max(pos.lat);
        self.max.lng = self.max.lng.max(pos.lng);
    }

    /// Grow the box to include `other`.
    pub fn extend_box(&mut self, other: &Self) {
        self.extend(other.max);
        self.extend(other.min);
    }

    /// Pad the box by roughly `meters` on all sides.
    ///
    /// Longitude padding depends on latitude, so each side uses the cosine of
    /// its own (already padded) latitude. This is a fast approximation; use
    /// [`around`](Self::around) for a box guaranteed to hold a radius.
    pub fn extend_meters(&mut self, meters: f64) {
        let d_lat = meters / METERS_PER_LAT_DEGREE;
        self.min.lat -= d_lat;
        self.max.lat += d_lat;

        let min_m_per_deg = METERS_PER_LNG_DEGREE_AT_EQUATOR * self.min.lat.to_radians().cos();
        self.min.lng -= (meters / min_m_per_deg).abs();

        let max_m_per_deg = METERS_PER_LNG_DEGREE_AT_EQUATOR * self.max.lat.to_radians().cos();
        self.max.lng += (meters / max_m_per_deg).abs();
    }

    /// Whether `pos` lies strictly inside the box. Points on an edge are outside.
    pub fn contains(&self, pos: LatLng) -> bool {
        pos.lat > self.min.lat
            && pos.lat < self.max.lat
            && pos.lng > self.min.lng
            && pos.lng < self.max.lng
    }

    /// Whether the box is inverted on either axis.
    pub fn is_empty(&self) -> bool {
        self.max.lat < self.min.lat || self.max.lng < self.min.lng
    }

    /// Same box in index space (`x = lng`, `y = lat`).
    pub fn to_aabb(&self) -> Aabb2D<f64> {
        Aabb2D::new(self.min.lng, self.min.lat, self.max.lng, self.max.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_matches_known_values() {
        // One degree of latitude on a 6371 km sphere.
        let d = distance(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 0.5, "got {d}");
        assert_eq!(distance(LatLng::new(49.87, 8.63), LatLng::new(49.87, 8.63)), 0.0);

        let mensa = LatLng::new(49.875_627_6, 8.657_783_3);
        let algo = LatLng::new(49.878_051_3, 8.654_703_3);
        let d = mensa.distance(&algo);
        assert!(d > 300.0 && d < 400.0, "got {d}");
        assert_eq!(d, algo.distance(&mensa));
    }

    #[test]
    fn box_from_polyline() {
        let sut = GeoBox::from_points([
            LatLng::new(49.980_557, 9.143_697),
            LatLng::new(50.002_645, 9.072_252),
        ]);
        assert_eq!(sut.min, LatLng::new(49.980_557, 9.072_252));
        assert_eq!(sut.max, LatLng::new(50.002_645, 9.143_697));
    }

    #[test]
    fn contains_excludes_edges() {
        let b = GeoBox::new(LatLng::new(0.0, 0.0), LatLng::new(10.0, 10.0));
        assert!(b.contains(LatLng::new(5.0, 5.0)));
        assert!(!b.contains(LatLng::new(0.0, 5.0)));
        assert!(!b.contains(LatLng::new(5.0, 10.0)));
        assert!(!b.contains(LatLng::new(10.0, 10.0)));
    }

    #[test]
    fn radius_box_covers_the_disk() {
        let center = LatLng::new(60.0, 10.0);
        let b = GeoBox::around(center, 1_000.0);
        // Points exactly 999 m north/east are inside the padded box.
        let north = LatLng::new(60.0 + 999.0 / 111_194.93, 10.0);
        assert!(north.distance(&center) < 1_000.0);
        assert!(b.contains(north));
        let east = LatLng::new(60.0, 10.0 + 0.0179);
        assert!(east.distance(&center) < 1_000.0);
        assert!(b.contains(east));
        // The cap is widest poleward of its center.
        let west = LatLng::new(60.002, 10.0 - 0.0172);
        assert!(west.distance(&center) < 1_000.0);
        assert!(b.contains(west));
    }

    #[test]
    fn caps_over_a_pole_span_all_longitudes() {
        let b = GeoBox::around(LatLng::new(89.9, 0.0), 50_000.0);
        assert_eq!((b.min.lng, b.max.lng), (-180.0, 180.0));
    }

    #[test]
    fn boxes_past_the_antimeridian_wrap() {
        let b = GeoBox::around(LatLng::new(0.0, 179.999), 1_000.0);
        assert!(b.max.lng > 180.0);
        let parts: Vec<GeoBox> = b.wrap_antimeridian().collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], b);
        assert!(parts[1].contains(LatLng::new(0.0, -179.999)));
        assert!((parts[1].max.lng - (b.max.lng - 360.0)).abs() < 1e-12);

        let west = GeoBox::around(LatLng::new(0.0, -179.999), 1_000.0);
        assert!(west.wrap_antimeridian().nth(1).unwrap().contains(LatLng::new(0.0, 179.999)));

        let inside = GeoBox::around(LatLng::new(0.0, 10.0), 1_000.0);
        assert_eq!(inside.wrap_antimeridian().count(), 1);
        let globe = GeoBox::around(LatLng::new(89.9, 0.0), 50_000.0);
        assert_eq!(globe.wrap_antimeridian().count(), 1);
    }

    #[test]
    fn extend_meters_pads_each_side_by_its_own_latitude() {
        let mut b = GeoBox::new(LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.0));
        b.extend_meters(111_000.0);
        assert_eq!((b.min.lat, b.max.lat), (-1.0, 1.0));
        let d_lng = 111_000.0 / (111_200.0 * 1.0_f64.to_radians().cos());
        assert!((b.max.lng - d_lng).abs() < 1e-12);
        assert!((b.min.lng + d_lng).abs() < 1e-12);
    }

    #[test]
    fn empty_box() {
        assert!(GeoBox::default().is_empty());
        assert!(GeoBox::EMPTY.to_aabb().is_empty());
        assert!(!GeoBox::around(LatLng::default(), 0.0).is_empty());
    }
}
