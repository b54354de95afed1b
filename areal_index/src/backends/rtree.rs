// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree backend generic over scalar `T: Scalar` with quadratic splits.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::{Aabb2D, Scalar, area, enlargement, union_aabb};

/// Default fan-out. Matches the classic quadratic R-tree parameterisation.
pub const DEFAULT_MAX_CHILDREN: usize = 16;

/// Append-only R-tree backend.
///
/// Incremental inserts choose the subtree needing least enlargement and split
/// overflowing nodes with Guttman's quadratic algorithm. [`Backend::bulk_load`]
/// packs the tree bottom-up with sort-tile-recursive (STR) ordering instead.
pub struct RTree<T: Scalar> {
    max_children: usize,
    min_children: usize,
    root: Option<NodeIdx>,
    arena: Vec<RNode<T>>,
    len: usize,
}

#[derive(Clone)]
struct RNode<T: Scalar> {
    bbox: Aabb2D<T>,
    leaf: bool,
    children: Vec<RChild<T>>,
}

/// Child entry. `target` is a slot in a leaf and an arena index otherwise.
#[derive(Copy, Clone)]
struct RChild<T: Scalar> {
    bbox: Aabb2D<T>,
    target: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

impl<T: Scalar> Default for RTree<T> {
    fn default() -> Self {
        Self::with_max_children(DEFAULT_MAX_CHILDREN)
    }
}

impl<T: Scalar> RTree<T> {
    /// Create an empty tree with the given node fan-out (at least 4).
    ///
    /// The minimum fill is 30% of the fan-out, as in the usual quadratic setup.
    pub fn with_max_children(max_children: usize) -> Self {
        let max_children = max_children.max(4);
        Self {
            max_children,
            min_children: (max_children * 3 / 10).max(2),
            root: None,
            arena: Vec::new(),
            len: 0,
        }
    }

    /// Number of items stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bounding box of everything in the tree.
    pub fn bounds(&self) -> Option<Aabb2D<T>> {
        self.root.map(|r| self.arena[r.get()].bbox)
    }

    fn push_node(&mut self, leaf: bool, children: Vec<RChild<T>>) -> NodeIdx {
        let bbox = bbox_of(&children);
        let idx = NodeIdx::new(self.arena.len());
        self.arena.push(RNode {
            bbox,
            leaf,
            children,
        });
        idx
    }

    fn child_of(&self, node: NodeIdx) -> RChild<T> {
        RChild {
            bbox: self.arena[node.get()].bbox,
            target: node.get(),
        }
    }

    /// Insert below `node`; returns a new sibling if `node` had to split.
    fn insert_into(&mut self, node: NodeIdx, child: RChild<T>) -> Option<NodeIdx> {
        let n = &mut self.arena[node.get()];
        n.bbox = union_aabb(n.bbox, child.bbox);
        if n.leaf {
            n.children.push(child);
        } else {
            let pick = choose_subtree(&n.children, &child.bbox);
            let target = NodeIdx::new(n.children[pick].target);
            if let Some(sibling) = self.insert_into(target, child) {
                let left = self.child_of(target);
                let right = self.child_of(sibling);
                let n = &mut self.arena[node.get()];
                n.children[pick] = left;
                n.children.push(right);
            } else {
                let grown = self.arena[target.get()].bbox;
                self.arena[node.get()].children[pick].bbox = grown;
            }
        }
        if self.arena[node.get()].children.len() > self.max_children {
            Some(self.split(node))
        } else {
            None
        }
    }

    fn split(&mut self, node: NodeIdx) -> NodeIdx {
        let entries = core::mem::take(&mut self.arena[node.get()].children);
        let (keep, moved) = quadratic_split(entries, self.min_children);
        let n = &mut self.arena[node.get()];
        n.bbox = bbox_of(&keep);
        n.children = keep;
        let leaf = n.leaf;
        self.push_node(leaf, moved)
    }

    /// One STR pass: tile `entries` into parent nodes and return their entries.
    fn pack_level(&mut self, mut entries: Vec<RChild<T>>, leaf: bool) -> Vec<RChild<T>> {
        let cap = self.max_children;
        let node_count = entries.len().div_ceil(cap);
        let mut slices = 1_usize;
        while slices * slices < node_count {
            slices += 1;
        }
        entries.sort_by(|a, b| cmp_centroid(a.bbox.min_x, a.bbox.max_x, b.bbox.min_x, b.bbox.max_x));
        let mut parents = Vec::with_capacity(node_count);
        for slice in entries.chunks_mut(slices * cap) {
            slice.sort_by(|a, b| {
                cmp_centroid(a.bbox.min_y, a.bbox.max_y, b.bbox.min_y, b.bbox.max_y)
            });
            for group in slice.chunks(cap) {
                let idx = self.push_node(leaf, group.to_vec());
                parents.push(self.child_of(idx));
            }
        }
        parents
    }

    fn collect_rect(&self, rect: &Aabb2D<T>, out: &mut Vec<usize>) {
        let Some(root) = self.root else {
            return;
        };
        if !self.arena[root.get()].bbox.intersects(rect) {
            return;
        }
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            for c in n.children.iter().filter(|c| c.bbox.intersects(rect)) {
                if n.leaf {
                    out.push(c.target);
                } else {
                    stack.push(NodeIdx::new(c.target));
                }
            }
        }
    }
}

fn bbox_of<T: Scalar>(children: &[RChild<T>]) -> Aabb2D<T> {
    let mut it = children.iter();
    match it.next() {
        Some(first) => it.fold(first.bbox, |acc, c| union_aabb(acc, c.bbox)),
        // Only reachable for a freshly cleared node; callers never query it.
        None => Aabb2D::new(T::zero(), T::zero(), T::zero(), T::zero()),
    }
}

fn cmp_centroid<T: Scalar>(a_min: T, a_max: T, b_min: T, b_max: T) -> Ordering {
    T::mid(a_min, a_max)
        .partial_cmp(&T::mid(b_min, b_max))
        .unwrap_or(Ordering::Equal)
}

/// Least enlargement, ties broken by smaller area.
fn choose_subtree<T: Scalar>(children: &[RChild<T>], bbox: &Aabb2D<T>) -> usize {
    let mut best = 0_usize;
    let mut best_cost: Option<(T::Acc, T::Acc)> = None;
    for (i, c) in children.iter().enumerate() {
        let cost = (enlargement(&c.bbox, bbox), area(&c.bbox));
        let better = best_cost
            .map(|(e, a)| cost.0 < e || (cost.0 == e && cost.1 < a))
            .unwrap_or(true);
        if better {
            best = i;
            best_cost = Some(cost);
        }
    }
    best
}

/// Seeds are the pair wasting the most area if grouped together.
fn pick_seeds<T: Scalar>(entries: &[RChild<T>]) -> (usize, usize) {
    let mut seeds = (0, 1);
    let mut worst: Option<T::Acc> = None;
    for i in 0..entries.len() {
        for j in i + 1..entries.len() {
            let (a, b) = (&entries[i].bbox, &entries[j].bbox);
            let waste = area(&union_aabb(*a, *b)) - area(a) - area(b);
            if worst.map(|w| waste > w).unwrap_or(true) {
                worst = Some(waste);
                seeds = (i, j);
            }
        }
    }
    seeds
}

fn abs_diff<A: PartialOrd + core::ops::Sub<Output = A>>(a: A, b: A) -> A {
    if a > b { a - b } else { b - a }
}

/// Guttman's quadratic split. Both halves end up with at least `min` entries.
fn quadratic_split<T: Scalar>(
    mut entries: Vec<RChild<T>>,
    min: usize,
) -> (Vec<RChild<T>>, Vec<RChild<T>>) {
    let (s1, s2) = pick_seeds(&entries);
    // s1 < s2, so removing s2 first leaves s1 in place.
    let seed_b = entries.swap_remove(s2);
    let seed_a = entries.swap_remove(s1);
    let (mut a, mut bb_a) = (vec![seed_a], seed_a.bbox);
    let (mut b, mut bb_b) = (vec![seed_b], seed_b.bbox);

    while !entries.is_empty() {
        let remaining = entries.len();
        if a.len() + remaining <= min {
            a.append(&mut entries);
            break;
        }
        if b.len() + remaining <= min {
            b.append(&mut entries);
            break;
        }

        let mut next = 0_usize;
        let mut strongest: Option<T::Acc> = None;
        for (i, e) in entries.iter().enumerate() {
            let pref = abs_diff(enlargement(&bb_a, &e.bbox), enlargement(&bb_b, &e.bbox));
            if strongest.map(|s| pref > s).unwrap_or(true) {
                strongest = Some(pref);
                next = i;
            }
        }

        let e = entries.swap_remove(next);
        let (grow_a, grow_b) = (enlargement(&bb_a, &e.bbox), enlargement(&bb_b, &e.bbox));
        let to_a = if grow_a != grow_b {
            grow_a < grow_b
        } else {
            let (area_a, area_b) = (area(&bb_a), area(&bb_b));
            if area_a != area_b {
                area_a < area_b
            } else {
                a.len() <= b.len()
            }
        };
        if to_a {
            bb_a = union_aabb(bb_a, e.bbox);
            a.push(e);
        } else {
            bb_b = union_aabb(bb_b, e.bbox);
            b.push(e);
        }
    }
    (a, b)
}

impl<T: Scalar> Backend<T> for RTree<T> {
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>) {
        self.len += 1;
        let child = RChild {
            bbox: aabb,
            target: slot,
        };
        let Some(root) = self.root else {
            self.root = Some(self.push_node(true, vec![child]));
            return;
        };
        if let Some(sibling) = self.insert_into(root, child) {
            // Root split: grow the tree by one level.
            let children = vec![self.child_of(root), self.child_of(sibling)];
            self.root = Some(self.push_node(false, children));
        }
    }

    fn bulk_load(&mut self, items: &[(usize, Aabb2D<T>)]) {
        self.clear();
        if items.is_empty() {
            return;
        }
        self.len = items.len();
        let mut level: Vec<RChild<T>> = items
            .iter()
            .map(|&(slot, bbox)| RChild { bbox, target: slot })
            .collect();
        let mut leaf = true;
        while level.len() > self.max_children {
            level = self.pack_level(level, leaf);
            leaf = false;
        }
        self.root = Some(self.push_node(leaf, level));
    }

    fn clear(&mut self) {
        self.root = None;
        self.arena.clear();
        self.len = 0;
    }

    fn query_point<'a>(&'a self, x: T, y: T) -> Box<dyn Iterator<Item = usize> + 'a> {
        self.query_rect(Aabb2D::new(x, y, x, y))
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<T>) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        self.collect_rect(&rect, &mut out);
        Box::new(out.into_iter())
    }
}

impl<T: Scalar> Debug for RTree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RTree")
            .field("max_children", &self.max_children)
            .field("min_children", &self.min_children)
            .field("arena_nodes", &self.arena.len())
            .field("len", &self.len)
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}

/// R-tree with i64 coordinates and i128 metrics.
pub type RTreeI64 = RTree<i64>;

/// R-tree with f64 coordinates and f64 metrics.
pub type RTreeF64 = RTree<f64>;
