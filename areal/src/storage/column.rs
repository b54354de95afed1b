// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-file flat arrays backed by a memory map.
//!
//! A column file is nothing but `len * size_of::<T>()` bytes. Element types are
//! unaligned little-endian `zerocopy` types, so a mapping can be viewed as
//! `&[T]` without copying or alignment checks.

#![allow(unsafe_code, reason = "memory-mapping a file is inherently unsafe")]

use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::StorageError;

/// Element types that can live in a column file.
pub(crate) trait Element: FromBytes + IntoBytes + Immutable + KnownLayout + Unaligned + Copy {}

impl<T: FromBytes + IntoBytes + Immutable + KnownLayout + Unaligned + Copy> Element for T {}

/// Smallest mapping, in bytes, a growing column allocates.
const MIN_GROWTH_BYTES: usize = 64 * 1024;

fn element_count<T: Element>(path: &Path, bytes: u64) -> Result<usize, StorageError> {
    let size = size_of::<T>() as u64;
    if bytes % size != 0 {
        return Err(StorageError::Corrupt {
            path: path.to_owned(),
            reason: format!("length {bytes} is not a multiple of the {size}-byte element size"),
        });
    }
    usize::try_from(bytes / size).map_err(|_| StorageError::Corrupt {
        path: path.to_owned(),
        reason: format!("length {bytes} does not fit in memory"),
    })
}

fn view<T: Element>(bytes: &[u8]) -> &[T] {
    // Lengths are kept at whole multiples of the element size, so the cast
    // cannot fail; an empty slice is the harmless fallback.
    <[T]>::ref_from_bytes(bytes).unwrap_or_default()
}

/// Read-only mapped column.
pub(crate) struct Column<T> {
    path: PathBuf,
    // Zero-length files cannot be mapped on every platform.
    map: Option<Mmap>,
    _marker: PhantomData<T>,
}

impl<T: Element> Column<T> {
    pub(crate) fn open(path: PathBuf) -> Result<Self, StorageError> {
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::Missing { path });
            }
            Err(e) => return Err(StorageError::io(path, e)),
        };
        let bytes = file
            .metadata()
            .map_err(|e| StorageError::io(&path, e))?
            .len();
        let len = element_count::<T>(&path, bytes)?;
        let map = if len == 0 {
            None
        } else {
            // SAFETY: the store lock gives this process a shared lock that no
            // writer can hold at the same time, so the file is not resized or
            // modified while mapped. The mapping is owned by `self` and every
            // view borrows `self`.
            Some(unsafe { Mmap::map(&file) }.map_err(|e| StorageError::io(&path, e))?)
        };
        Ok(Self {
            path,
            map,
            _marker: PhantomData,
        })
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        self.map.as_deref().map(view).unwrap_or_default()
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// Writable, growable mapped column.
///
/// The file is over-allocated geometrically while appending and truncated
/// back to the used length by [`flush`](Self::flush).
///
/// `map` is `Some` exactly when `capacity` is non-zero.
pub(crate) struct ColumnMut<T> {
    path: PathBuf,
    file: File,
    map: Option<MmapMut>,
    len: usize,
    capacity: usize,
    // Largest file size, in elements, the column may grow to.
    max_capacity: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> ColumnMut<T> {
    /// Create an empty column, truncating any existing file.
    pub(crate) fn create(path: PathBuf) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        Ok(Self {
            path,
            file,
            map: None,
            len: 0,
            capacity: 0,
            max_capacity: usize::MAX,
            _marker: PhantomData,
        })
    }

    /// Map an existing column for appending.
    pub(crate) fn open(path: PathBuf) -> Result<Self, StorageError> {
        let file = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::Missing { path });
            }
            Err(e) => return Err(StorageError::io(path, e)),
        };
        let bytes = file
            .metadata()
            .map_err(|e| StorageError::io(&path, e))?
            .len();
        let len = element_count::<T>(&path, bytes)?;
        let mut column = Self {
            path,
            file,
            map: None,
            len,
            capacity: len,
            max_capacity: usize::MAX,
            _marker: PhantomData,
        };
        column.remap()?;
        Ok(column)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        self.map
            .as_deref()
            .map(|bytes| view(&bytes[..self.len * size_of::<T>()]))
            .unwrap_or_default()
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Refuse to grow the file beyond `elements`, as a full disk or a file
    /// size limit would.
    #[cfg(test)]
    pub(crate) fn set_max_capacity(&mut self, elements: usize) {
        self.max_capacity = elements;
    }

    /// Forget everything after the first `len` elements.
    ///
    /// The file keeps its size until the next [`flush`](Self::flush).
    pub(crate) fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub(crate) fn push(&mut self, value: T) -> Result<(), StorageError> {
        self.extend_from_slice(core::slice::from_ref(&value))
    }

    pub(crate) fn extend_from_slice(&mut self, values: &[T]) -> Result<(), StorageError> {
        if values.is_empty() {
            return Ok(());
        }
        self.reserve(values.len())?;
        let size = size_of::<T>();
        let start = self.len * size;
        let end = start + values.len() * size;
        let map = self
            .map
            .as_mut()
            .expect("reserve maps at least the requested capacity");
        map[start..end].copy_from_slice(values.as_bytes());
        self.len += values.len();
        Ok(())
    }

    /// Shrink the file to the used length and write dirty pages back.
    pub(crate) fn flush(&mut self) -> Result<(), StorageError> {
        if let Some(map) = &self.map {
            map.flush().map_err(|e| StorageError::io(&self.path, e))?;
        }
        if self.capacity != self.len {
            self.resize(self.len)?;
        }
        Ok(())
    }

    fn reserve(&mut self, additional: usize) -> Result<(), StorageError> {
        let needed = self.len + additional;
        if needed <= self.capacity {
            return Ok(());
        }
        let min = MIN_GROWTH_BYTES.div_ceil(size_of::<T>());
        let new_capacity = needed.max(self.capacity.saturating_mul(2)).max(min);
        if let Some(map) = &self.map {
            map.flush().map_err(|e| StorageError::io(&self.path, e))?;
        }
        self.resize(new_capacity)
    }

    /// Set the file length to `capacity` elements and map it again.
    ///
    /// If the file cannot be resized it keeps its old length and mapping.
    fn resize(&mut self, capacity: usize) -> Result<(), StorageError> {
        // Unmap first so nothing can touch a cut-off tail.
        self.map = None;
        if let Err(e) = self.set_file_len(capacity) {
            self.remap()?;
            return Err(e);
        }
        self.capacity = capacity;
        self.remap()
    }

    fn set_file_len(&self, elements: usize) -> Result<(), StorageError> {
        if elements > self.max_capacity {
            return Err(StorageError::io(
                &self.path,
                std::io::Error::from(std::io::ErrorKind::FileTooLarge),
            ));
        }
        let bytes = (elements as u64).saturating_mul(size_of::<T>() as u64);
        self.file
            .set_len(bytes)
            .map_err(|e| StorageError::io(&self.path, e))
    }

    fn remap(&mut self) -> Result<(), StorageError> {
        if self.capacity == 0 {
            self.map = None;
            return Ok(());
        }
        // SAFETY: the store holds an exclusive lock on its directory, so
        // no other process resizes or maps this file writable. The file
        // length is `capacity` elements and is only changed after the
        // mapping has been dropped.
        match unsafe { MmapMut::map_mut(&self.file) } {
            Ok(map) => {
                self.map = Some(map);
                Ok(())
            }
            Err(e) => {
                // Unmapped: the next append grows and maps the file again.
                self.map = None;
                self.capacity = 0;
                Err(StorageError::io(&self.path, e))
            }
        }
    }
}
