// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the area database and its storage.
#[derive(Error, Debug)]
pub enum Error {
    /// The geometry handed to `add_area` breaks a structural rule.
    /// Nothing was written.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    /// Opening, growing or flushing the backing files failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The dedicated worker pool for `build_index` could not be created.
    #[error("failed to start build workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A `.poly` file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A `.poly` file could not be parsed.
    #[error("poly file line {line}: {reason}")]
    PolyFormat {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Structural problems with an area's rings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Every outer ring needs exactly one (possibly empty) group of holes.
    #[error("{outer} outer rings but {inner} inner ring groups")]
    RingCountMismatch {
        /// Number of outer rings given.
        outer: usize,
        /// Number of inner ring groups given.
        inner: usize,
    },

    /// Rings are closed point sequences and cannot be empty.
    #[error("empty ring at outer ring {outer}{}", .hole.map(|h| format!(", hole {h}")).unwrap_or_default())]
    EmptyRing {
        /// Index of the outer ring (or the outer ring owning the hole).
        outer: usize,
        /// Index of the hole within its group, if the empty ring is a hole.
        hole: Option<usize>,
    },
}

/// Errors from the memory-mapped ring store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// An OS-level operation on one of the store's files failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Another process holds a conflicting lock on the store.
    #[error("store {} is locked by another {holder}", .path.display())]
    Locked {
        /// Store directory.
        path: PathBuf,
        /// Who may be holding it: `"writer"` when opening a reader, `"reader or writer"`
        /// when opening a writer.
        holder: &'static str,
    },

    /// A required array file does not exist.
    #[error("store file {} is missing", .path.display())]
    Missing {
        /// Expected file.
        path: PathBuf,
    },

    /// The arrays are inconsistent with each other.
    #[error("store file {} is corrupt: {reason}", .path.display())]
    Corrupt {
        /// Offending file.
        path: PathBuf,
        /// Which consistency check failed.
        reason: String,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for area database operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;
