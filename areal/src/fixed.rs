// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-point coordinates for compact persistent storage.

use zerocopy::little_endian::I32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::latlng::LatLng;

/// Fixed-point steps per degree (seven decimal places, about 1.1 cm of latitude).
pub const COORDINATE_PRECISION: f64 = 10_000_000.0;

/// Largest absolute error `decode(encode(x))` may introduce, in degrees.
pub const MAX_ROUNDING_ERROR: f64 = 0.5 / COORDINATE_PRECISION;

/// Lossy 32-bit fixed-point form of a [`LatLng`].
///
/// Stored little-endian and unaligned so a memory-mapped file can be viewed
/// directly as `&[FixedCoordinate]`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct FixedCoordinate {
    lat: I32,
    lng: I32,
}

impl FixedCoordinate {
    /// Build from raw fixed-point values.
    pub fn from_raw(lat: i32, lng: i32) -> Self {
        Self {
            lat: I32::new(lat),
            lng: I32::new(lng),
        }
    }

    /// Round `pos` to the nearest representable coordinate.
    pub fn encode(pos: LatLng) -> Self {
        Self::from_raw(double_to_fix(pos.lat), double_to_fix(pos.lng))
    }

    /// Back to floating-point degrees.
    pub fn decode(self) -> LatLng {
        LatLng::new(fix_to_double(self.lat.get()), fix_to_double(self.lng.get()))
    }

    /// Raw fixed-point latitude.
    pub fn raw_lat(self) -> i32 {
        self.lat.get()
    }

    /// Raw fixed-point longitude.
    pub fn raw_lng(self) -> i32 {
        self.lng.get()
    }
}

impl core::fmt::Debug for FixedCoordinate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FixedCoordinate")
            .field("lat", &self.lat.get())
            .field("lng", &self.lng.get())
            .finish()
    }
}

impl From<LatLng> for FixedCoordinate {
    fn from(pos: LatLng) -> Self {
        Self::encode(pos)
    }
}

impl From<FixedCoordinate> for LatLng {
    fn from(c: FixedCoordinate) -> Self {
        c.decode()
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "valid coordinates are within ±180° and scale to at most ±1.8e9, inside i32; \
              out-of-range inputs saturate"
)]
fn double_to_fix(c: f64) -> i32 {
    (c * COORDINATE_PRECISION).round() as i32
}

fn fix_to_double(c: i32) -> f64 {
    f64::from(c) / COORDINATE_PRECISION
}
