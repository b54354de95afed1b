// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `flatvec`: flat vector with linear scans (small, simple, obviously correct).
//! - `rtree`: generic R-tree (`T: Scalar`) with quadratic splits and STR bulk loading
//!   (aliases: `RTreeI64`, `RTreeF64`).
//!
//! Quadratic split
//! ---------------
//! When a node overflows, the two entries that would waste the most area if
//! kept together seed two groups. Remaining entries are assigned one at a time,
//! always picking the entry with the strongest preference for one group, until
//! a group needs every remaining entry to reach the minimum fill.
//! Area metrics use widened accumulators (`f64`→`f64`, `i64`→`i128`).

pub mod flatvec;
pub mod rtree;
