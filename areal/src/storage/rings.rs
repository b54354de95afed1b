// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ring store: outer and inner rings of every area in two nestings.
//!
//! - `outer` has depth 2: area → outer ring → points.
//! - `inner` has depth 3: area → outer ring → hole → points.
//!
//! Writers and readers are separate types. A directory is guarded by an
//! advisory lock file: one writer excludes everyone else, readers share.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use super::nested::{Nested, NestedMut, Offset, Ragged, bucket, bucket_count};
use crate::area_db::AreaId;
use crate::error::{GeometryError, Result, StorageError};
use crate::fixed::FixedCoordinate;
use crate::latlng::LatLng;

/// Name of the lock file inside a store directory.
pub const LOCK_FILE: &str = "areal.lock";

const OUTER: &str = "outer";
const INNER: &str = "inner";
const OUTER_DEPTH: usize = 2;
const INNER_DEPTH: usize = 3;

/// Read access shared by both store modes.
pub trait RingSource: Send + Sync {
    /// Borrow the mapped arrays.
    fn view(&self) -> RingView<'_>;

    /// Number of areas stored.
    fn area_count(&self) -> usize {
        self.view().area_count()
    }
}

/// Borrowed view of a store's mapped arrays.
///
/// Cheap to copy; all accessors are O(1) and never allocate.
#[derive(Copy, Clone, Debug)]
pub struct RingView<'a> {
    outer_data: &'a [FixedCoordinate],
    outer_idx: [&'a [Offset]; OUTER_DEPTH],
    inner_data: &'a [FixedCoordinate],
    inner_idx: [&'a [Offset]; INNER_DEPTH],
}

impl<'a> RingView<'a> {
    /// Number of areas.
    pub fn area_count(&self) -> usize {
        bucket_count(self.outer_idx[0])
    }

    /// Outer rings of `area`. Empty for unknown ids.
    pub fn outer_rings(&self, area: AreaId) -> Rings<'a> {
        match bucket(self.outer_idx[0], area.get()) {
            Some(rings) => Rings(Ragged::new(self.outer_data, self.outer_idx[1], rings)),
            None => Rings(Ragged::empty()),
        }
    }

    /// Holes cut from outer ring `outer` of `area`. Empty for unknown indices.
    pub fn inner_rings(&self, area: AreaId, outer: usize) -> Rings<'a> {
        let holes = bucket(self.inner_idx[0], area.get())
            .filter(|groups| outer < groups.len())
            .and_then(|groups| bucket(self.inner_idx[1], groups.start + outer));
        match holes {
            Some(holes) => Rings(Ragged::new(self.inner_data, self.inner_idx[2], holes)),
            None => Rings(Ragged::empty()),
        }
    }
}

/// The rings of one bucket, each a slice of stored coordinates.
#[derive(Copy, Clone, Debug)]
pub struct Rings<'a>(Ragged<'a, FixedCoordinate>);

impl<'a> Rings<'a> {
    /// Number of rings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no rings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ring `i`.
    pub fn get(&self, i: usize) -> Option<&'a [FixedCoordinate]> {
        self.0.get(i)
    }

    /// Iterate the rings in order.
    pub fn iter(&self) -> impl Iterator<Item = &'a [FixedCoordinate]> + '_ {
        self.0.iter()
    }

    /// Decode every ring to floating-point coordinates.
    pub fn decode(&self) -> Vec<Vec<LatLng>> {
        self.iter()
            .map(|ring| ring.iter().map(|c| c.decode()).collect())
            .collect()
    }
}

/// Advisory lock on a store directory, released on drop.
#[derive(Debug)]
struct StoreLock {
    _file: File,
}

impl StoreLock {
    fn exclusive(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        // Fully qualified: newer std has inherent `File` lock methods.
        FileExt::try_lock_exclusive(&file).map_err(|e| lock_error(dir, e, "reader or writer"))?;
        Ok(Self { _file: file })
    }

    fn shared(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join(LOCK_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)
                .map_err(|e| StorageError::io(&path, e))?,
            Err(e) => return Err(StorageError::io(path, e)),
        };
        FileExt::try_lock_shared(&file).map_err(|e| lock_error(dir, e, "writer"))?;
        Ok(Self { _file: file })
    }
}

fn lock_error(dir: &Path, e: std::io::Error, holder: &'static str) -> StorageError {
    if e.kind() == fs2::lock_contended_error().kind() {
        StorageError::Locked {
            path: dir.to_owned(),
            holder,
        }
    } else {
        StorageError::io(dir.join(LOCK_FILE), e)
    }
}

fn require_dir(dir: &Path) -> Result<(), StorageError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(StorageError::Missing {
            path: dir.to_owned(),
        })
    }
}

fn check_area_counts(dir: &Path, outer: &[Offset], inner: &[Offset]) -> Result<(), StorageError> {
    let (o, i) = (bucket_count(outer), bucket_count(inner));
    if o == i {
        Ok(())
    } else {
        Err(StorageError::Corrupt {
            path: dir.join(format!("{INNER}.idx0")),
            reason: format!("{i} inner ring groups for {o} areas"),
        })
    }
}

/// Reject geometry the store cannot represent, before anything is written.
fn validate_area(outer: &[Vec<LatLng>], inner: &[Vec<Vec<LatLng>>]) -> Result<(), GeometryError> {
    if outer.len() != inner.len() {
        return Err(GeometryError::RingCountMismatch {
            outer: outer.len(),
            inner: inner.len(),
        });
    }
    if let Some(o) = outer.iter().position(Vec::is_empty) {
        return Err(GeometryError::EmptyRing { outer: o, hole: None });
    }
    for (o, holes) in inner.iter().enumerate() {
        if let Some(h) = holes.iter().position(Vec::is_empty) {
            return Err(GeometryError::EmptyRing {
                outer: o,
                hole: Some(h),
            });
        }
    }
    Ok(())
}

/// A store opened for appending areas.
///
/// Arrays are flushed and trimmed to their used length by
/// [`flush`](Self::flush) and again on drop.
pub struct RingStoreWriter {
    dir: PathBuf,
    outer: NestedMut<FixedCoordinate>,
    inner: NestedMut<FixedCoordinate>,
    scratch: Vec<FixedCoordinate>,
    _lock: StoreLock,
}

impl core::fmt::Debug for RingStoreWriter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingStoreWriter")
            .field("dir", &self.dir)
            .field("area_count", &self.area_count())
            .finish_non_exhaustive()
    }
}

impl RingStoreWriter {
    /// Create (or truncate) a store in `dir`, creating the directory if needed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
        let lock = StoreLock::exclusive(dir)?;
        let outer = NestedMut::create(dir, OUTER, OUTER_DEPTH)?;
        let inner = NestedMut::create(dir, INNER, INNER_DEPTH)?;
        debug!(dir = %dir.display(), "created ring store");
        Ok(Self {
            dir: dir.to_owned(),
            outer,
            inner,
            scratch: Vec::new(),
            _lock: lock,
        })
    }

    /// Open an existing store and continue appending after its last area.
    pub fn open_append(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        require_dir(dir)?;
        let lock = StoreLock::exclusive(dir)?;
        let outer = NestedMut::open(dir, OUTER, OUTER_DEPTH)?;
        let inner = NestedMut::open(dir, INNER, INNER_DEPTH)?;
        check_area_counts(dir, outer.level(0), inner.level(0))?;
        let store = Self {
            dir: dir.to_owned(),
            outer,
            inner,
            scratch: Vec::new(),
            _lock: lock,
        };
        debug!(dir = %dir.display(), areas = store.area_count(), "opened ring store for append");
        Ok(store)
    }

    /// Store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one area and return its id.
    ///
    /// `inner[i]` holds the holes of `outer[i]`. The geometry is checked
    /// before anything is written. On any error the store is unchanged and
    /// the id is not used up.
    pub fn append_area(&mut self, outer: &[Vec<LatLng>], inner: &[Vec<Vec<LatLng>>]) -> Result<AreaId> {
        validate_area(outer, inner)?;
        let id = AreaId::new(self.area_count());
        let outer_mark = self.outer.mark();
        let inner_mark = self.inner.mark();
        if let Err(e) = self.write_area(outer, inner) {
            self.outer.rollback(&outer_mark);
            self.inner.rollback(&inner_mark);
            return Err(e.into());
        }
        Ok(id)
    }

    fn write_area(
        &mut self,
        outer: &[Vec<LatLng>],
        inner: &[Vec<Vec<LatLng>>],
    ) -> Result<(), StorageError> {
        for ring in outer {
            encode_into(&mut self.scratch, ring);
            self.outer.push_leaf(&self.scratch)?;
        }
        self.outer.close(0)?;

        for holes in inner {
            for ring in holes {
                encode_into(&mut self.scratch, ring);
                self.inner.push_leaf(&self.scratch)?;
            }
            self.inner.close(1)?;
        }
        self.inner.close(0)
    }

    /// Write dirty pages back and trim the files to their used length.
    pub fn flush(&mut self) -> Result<()> {
        self.outer.flush()?;
        self.inner.flush()?;
        Ok(())
    }
}

fn encode_into(buf: &mut Vec<FixedCoordinate>, ring: &[LatLng]) {
    buf.clear();
    buf.extend(ring.iter().copied().map(FixedCoordinate::encode));
}

impl RingSource for RingStoreWriter {
    fn view(&self) -> RingView<'_> {
        RingView {
            outer_data: self.outer.data(),
            outer_idx: [self.outer.level(0), self.outer.level(1)],
            inner_data: self.inner.data(),
            inner_idx: [self.inner.level(0), self.inner.level(1), self.inner.level(2)],
        }
    }
}

impl Drop for RingStoreWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to flush ring store on drop");
        }
    }
}

/// A store opened read-only.
pub struct RingStoreReader {
    dir: PathBuf,
    outer: Nested<FixedCoordinate>,
    inner: Nested<FixedCoordinate>,
    _lock: StoreLock,
}

impl core::fmt::Debug for RingStoreReader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingStoreReader")
            .field("dir", &self.dir)
            .field("area_count", &self.area_count())
            .finish_non_exhaustive()
    }
}

impl RingStoreReader {
    /// Map the store in `dir` read-only.
    ///
    /// Fails with [`StorageError::Locked`] while a writer holds the store and
    /// with [`StorageError::Corrupt`] if the arrays disagree with each other.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        require_dir(dir)?;
        let lock = StoreLock::shared(dir)?;
        let outer = Nested::open(dir, OUTER, OUTER_DEPTH)?;
        let inner = Nested::open(dir, INNER, INNER_DEPTH)?;
        check_area_counts(dir, outer.level(0), inner.level(0))?;
        let store = Self {
            dir: dir.to_owned(),
            outer,
            inner,
            _lock: lock,
        };
        debug!(dir = %dir.display(), areas = store.area_count(), "opened ring store read-only");
        Ok(store)
    }

    /// Store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RingSource for RingStoreReader {
    fn view(&self) -> RingView<'_> {
        RingView {
            outer_data: self.outer.data(),
            outer_idx: [self.outer.level(0), self.outer.level(1)],
            inner_data: self.inner.data(),
            inner_idx: [self.inner.level(0), self.inner.level(1), self.inner.level(2)],
        }
    }
}
