// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build configuration.

use areal_index::DEFAULT_MAX_CHILDREN;

/// Knobs for [`AreaDb::build_index`](crate::AreaDb::build_index).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildOptions {
    /// Worker count. `None` runs on rayon's global pool; `Some(n)` starts a
    /// dedicated pool of `n` workers for each build.
    pub threads: Option<usize>,
    /// R-tree node fan-out of the area index.
    pub max_children: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            threads: None,
            max_children: DEFAULT_MAX_CHILDREN,
        }
    }
}

impl BuildOptions {
    /// Run builds on a dedicated pool of `threads` workers.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Use a custom R-tree fan-out.
    pub fn with_max_children(mut self, max_children: usize) -> Self {
        self.max_children = max_children;
        self
    }
}
