// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ragged nested arrays as one payload column plus offset columns.
//!
//! A nesting of depth `d` has index levels `idx0 .. idx{d-1}`. Every level
//! starts with a single `0` and bucket `i` of level `l` spans
//! `idx_l[i] .. idx_l[i + 1]` entries of level `l + 1` (or of the payload for
//! the last level). Appending a leaf extends the payload and records its end
//! on the last level; closing level `l` records the current bucket count of
//! level `l + 1` on level `l`.

use std::ops::Range;
use std::path::{Path, PathBuf};

use zerocopy::little_endian::U64;

use super::column::{Column, ColumnMut, Element};
use crate::error::StorageError;

/// Offset element stored in index columns.
pub(crate) type Offset = U64;

fn to_usize(offset: Offset) -> Option<usize> {
    usize::try_from(offset.get()).ok()
}

fn to_offset(n: usize) -> Offset {
    Offset::new(n as u64)
}

/// Bounds of bucket `i` in `index`.
pub(crate) fn bucket(index: &[Offset], i: usize) -> Option<Range<usize>> {
    let start = to_usize(*index.get(i)?)?;
    let end = to_usize(*index.get(i.checked_add(1)?)?)?;
    (start <= end).then_some(start..end)
}

/// Number of buckets recorded in an index level.
pub(crate) fn bucket_count(index: &[Offset]) -> usize {
    index.len().saturating_sub(1)
}

/// A sequence of payload slices delimited by a run of offsets.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Ragged<'a, T> {
    data: &'a [T],
    bounds: &'a [Offset],
}

impl<'a, T> Ragged<'a, T> {
    pub(crate) fn empty() -> Self {
        Self {
            data: &[],
            bounds: &[],
        }
    }

    /// Leaves of buckets `buckets` of the last index level `index`.
    pub(crate) fn new(data: &'a [T], index: &'a [Offset], buckets: Range<usize>) -> Self {
        match index.get(buckets.start..=buckets.end) {
            Some(bounds) => Self { data, bounds },
            None => Self::empty(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        bucket_count(self.bounds)
    }

    pub(crate) fn get(&self, i: usize) -> Option<&'a [T]> {
        self.data.get(bucket(self.bounds, i)?)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (0..self.len()).map(|i| self.get(i).unwrap_or_default())
    }
}

fn data_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.data"))
}

fn index_path(dir: &Path, name: &str, level: usize) -> PathBuf {
    dir.join(format!("{name}.idx{level}"))
}

/// Check that every level is a well-formed offset array into the next.
fn validate(data_len: usize, levels: &[(&[Offset], &Path)]) -> Result<(), StorageError> {
    for (l, (index, path)) in levels.iter().enumerate() {
        let corrupt = |reason: String| StorageError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };
        let Some(first) = index.first() else {
            return Err(corrupt("offset array is empty".into()));
        };
        if first.get() != 0 {
            return Err(corrupt(format!("first offset is {} instead of 0", first.get())));
        }
        if let Some(at) = index.windows(2).position(|w| w[0].get() > w[1].get()) {
            return Err(corrupt(format!("offsets decrease after entry {at}")));
        }
        let below = match levels.get(l + 1) {
            Some((next, _)) => bucket_count(next),
            None => data_len,
        };
        let last = index.last().map_or(0, |v| v.get());
        if usize::try_from(last).ok() != Some(below) {
            return Err(corrupt(format!(
                "last offset {last} does not match the {below} entries below it"
            )));
        }
    }
    Ok(())
}

/// Read-only nesting.
pub(crate) struct Nested<T> {
    data: Column<T>,
    index: Vec<Column<Offset>>,
}

impl<T: Element> Nested<T> {
    pub(crate) fn open(dir: &Path, name: &str, depth: usize) -> Result<Self, StorageError> {
        let data = Column::open(data_path(dir, name))?;
        let index = (0..depth)
            .map(|l| Column::open(index_path(dir, name, l)))
            .collect::<Result<Vec<_>, _>>()?;
        let levels: Vec<_> = index.iter().map(|c| (c.as_slice(), c.path())).collect();
        validate(data.as_slice().len(), &levels)?;
        Ok(Self { data, index })
    }

    pub(crate) fn data(&self) -> &[T] {
        self.data.as_slice()
    }

    pub(crate) fn level(&self, l: usize) -> &[Offset] {
        self.index.get(l).map(Column::as_slice).unwrap_or_default()
    }
}

/// Column lengths of a [`NestedMut`] at some point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Mark {
    data: usize,
    index: Vec<usize>,
}

/// Append-only nesting.
pub(crate) struct NestedMut<T> {
    data: ColumnMut<T>,
    index: Vec<ColumnMut<Offset>>,
}

impl<T: Element> NestedMut<T> {
    /// Start an empty nesting, truncating existing files.
    pub(crate) fn create(dir: &Path, name: &str, depth: usize) -> Result<Self, StorageError> {
        let data = ColumnMut::create(data_path(dir, name))?;
        let mut index = Vec::with_capacity(depth);
        for l in 0..depth {
            let mut level = ColumnMut::create(index_path(dir, name, l))?;
            level.push(to_offset(0))?;
            index.push(level);
        }
        Ok(Self { data, index })
    }

    /// Map an existing nesting for further appends.
    pub(crate) fn open(dir: &Path, name: &str, depth: usize) -> Result<Self, StorageError> {
        let data = ColumnMut::open(data_path(dir, name))?;
        let index = (0..depth)
            .map(|l| ColumnMut::open(index_path(dir, name, l)))
            .collect::<Result<Vec<_>, _>>()?;
        let levels: Vec<_> = index.iter().map(|c| (c.as_slice(), c.path())).collect();
        validate(data.len(), &levels)?;
        Ok(Self { data, index })
    }

    pub(crate) fn data(&self) -> &[T] {
        self.data.as_slice()
    }

    pub(crate) fn level(&self, l: usize) -> &[Offset] {
        self.index.get(l).map(ColumnMut::as_slice).unwrap_or_default()
    }

    /// Current length of every column, for [`rollback`](Self::rollback).
    pub(crate) fn mark(&self) -> Mark {
        Mark {
            data: self.data.len(),
            index: self.index.iter().map(ColumnMut::len).collect(),
        }
    }

    /// Drop everything appended since `mark` was taken.
    pub(crate) fn rollback(&mut self, mark: &Mark) {
        self.data.truncate(mark.data);
        for (level, &len) in self.index.iter_mut().zip(&mark.index) {
            level.truncate(len);
        }
    }

    #[cfg(test)]
    pub(crate) fn data_column_mut(&mut self) -> &mut ColumnMut<T> {
        &mut self.data
    }

    /// Append one leaf sequence to the innermost open bucket.
    pub(crate) fn push_leaf(&mut self, values: &[T]) -> Result<(), StorageError> {
        self.data.extend_from_slice(values)?;
        let end = to_offset(self.data.len());
        self.index
            .last_mut()
            .expect("nestings have at least one level")
            .push(end)
    }

    /// Close the open bucket of `level` over everything appended to the level below.
    pub(crate) fn close(&mut self, level: usize) -> Result<(), StorageError> {
        let below = bucket_count(self.level(level + 1));
        self.index[level].push(to_offset(below))
    }

    pub(crate) fn flush(&mut self) -> Result<(), StorageError> {
        self.data.flush()?;
        for level in &mut self.index {
            level.flush()?;
        }
        Ok(())
    }
}
