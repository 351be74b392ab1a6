//! The balanced R-tree core: the tree handle, its mutation algorithms
//! (insert, delete-by-id, update-by-id, and the split/condense cascades
//! that keep the tree balanced), and the traversal routines for region
//! search and identifier lookup.
//!
//! Nodes live in a [`generational_arena::Arena`] and are addressed by
//! stable [`Index`] handles; every non-root node carries a back-reference
//! to its parent used only for mutation-path navigation (never followed
//! during read-only traversals).
//!
//! # Example
//! ```rust
//! use geortree::{RTree, Shape, Payload};
//!
//! let mut tree = RTree::new(4).unwrap();
//! tree.insert(Payload::new(1, "a"), Shape::rect(0.0, 0.0, 1.0, 1.0));
//! tree.insert(Payload::new(2, "b"), Shape::rect(5.0, 5.0, 6.0, 6.0));
//!
//! let hits = tree.search(&Shape::rect(0.0, 0.0, 2.0, 2.0));
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].id, 1);
//! ```

use generational_arena::Arena;
pub use generational_arena::Index;
use tracing::{debug, trace};

use node::Entry;
pub use node::Node;

use crate::error::IndexError;
use crate::geometry::{BoundingBox, Shape};
use crate::payload::Payload;

pub mod introspect;
mod node;
#[cfg(test)]
mod tests;

/// Tunables for an [`RTree`]: `max_entries` and the derived
/// `min_entries = max_entries / 2`, recorded together so the tree and its
/// introspection view always agree on the derived minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RTreeConfig {
    pub max_entries: usize,
    pub min_entries: usize,
}

impl RTreeConfig {
    /// # Errors
    /// Returns [`IndexError::InvalidCapacity`] if `max_entries < 2`.
    pub fn new(max_entries: usize) -> Result<Self, IndexError> {
        if max_entries < 2 {
            return Err(IndexError::InvalidCapacity(max_entries));
        }
        Ok(Self {
            max_entries,
            min_entries: max_entries / 2,
        })
    }
}

impl Default for RTreeConfig {
    /// `max_entries = 8`, matching the spec's default fan-out.
    fn default() -> Self {
        Self::new(8).expect("default max_entries is always valid")
    }
}

/// A height-balanced 2D R-tree keyed by axis-aligned minimum bounding
/// rectangles. See the module documentation for the mutation algorithms.
#[derive(Debug)]
pub struct RTree {
    nodes: Arena<Node>,
    root: Index,
    config: RTreeConfig,
}

impl RTree {
    /// # Errors
    /// Returns [`IndexError::InvalidCapacity`] if `max_entries < 2`.
    pub fn new(max_entries: usize) -> Result<Self, IndexError> {
        Ok(Self::with_config(RTreeConfig::new(max_entries)?))
    }

    pub fn with_config(config: RTreeConfig) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.insert(Node::new_leaf(None));
        Self {
            nodes,
            root,
            config,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.config.max_entries
    }

    pub fn min_entries(&self) -> usize {
        self.config.min_entries
    }

    pub fn root_index(&self) -> Index {
        self.root
    }

    /// Returns a reference to the node with index `index`.
    ///
    /// # Panics
    /// Panics if `index` does not refer to a node in this tree.
    pub fn get_node(&self, index: Index) -> &Node {
        &self.nodes[index]
    }

    /// Builds a read-only hierarchical description of the tree, suitable
    /// for dumping as JSON (§4.3/§6). Never mutates the tree.
    pub fn introspect(&self) -> introspect::NodeView {
        introspect::build(self)
    }

    // ---- insert -----------------------------------------------------

    /// Inserts `payload` under `shape`. Always succeeds.
    pub fn insert(&mut self, payload: Payload, shape: Shape) {
        let mbr = shape.mbr();
        let leaf = self.descend_to_leaf(mbr);
        self.nodes[leaf].push_entry(Entry::Leaf { shape, payload });
        self.handle_overflow(leaf);
    }

    /// Walks from the root to the leaf chosen by the choose-subtree
    /// heuristic, enlarging each visited internal entry's cached MBR to
    /// cover `mbr` on the way down (§4.1 "enlargement propagation"; per
    /// §9 this enlargement is simply discarded if that entry is later
    /// replaced by a split).
    fn descend_to_leaf(&mut self, mbr: BoundingBox) -> Index {
        let mut current = self.root;
        loop {
            if self.nodes[current].is_leaf() {
                return current;
            }
            let chosen = choose_subtree(&self.nodes[current], &mbr);
            let child = match &mut self.nodes[current].entries_mut()[chosen] {
                Entry::Internal {
                    mbr: cached,
                    child,
                } => {
                    cached.expand_to_include(&mbr);
                    *child
                }
                Entry::Leaf { .. } => unreachable!("internal node holds only internal entries"),
            };
            trace!(node = ?current, entry = chosen, child = ?child, "choose-subtree");
            current = child;
        }
    }

    /// Splits `index` if it has grown past `max_entries`, propagating the
    /// split upward through parent back-references (and possibly growing
    /// the tree by one level if the root itself overflows).
    fn handle_overflow(&mut self, index: Index) {
        if self.nodes[index].len() <= self.config.max_entries {
            return;
        }

        let is_leaf = self.nodes[index].is_leaf();
        let mut entries = self.nodes[index].take_entries();
        let total = entries.len();
        // Order-preserving halving: ceil((m+1)/2) in the left half.
        let left_len = (total + 1) / 2;
        let right_entries = entries.split_off(left_len);
        let left_entries = entries;

        let left_mbr = node::union_mbr(&left_entries).expect("split halves are non-empty");
        let right_mbr = node::union_mbr(&right_entries).expect("split halves are non-empty");
        let parent = self.nodes[index].parent();

        debug!(
            node = ?index,
            left = left_entries.len(),
            right = right_entries.len(),
            "splitting overfull node"
        );

        self.nodes[index].set_entries(left_entries);

        let right_index = self.nodes.insert(Node::new(is_leaf, parent));
        self.nodes[right_index].set_entries(right_entries);
        if !is_leaf {
            let moved_children: Vec<Index> = self.nodes[right_index]
                .entries()
                .iter()
                .filter_map(Entry::child_index)
                .collect();
            for child in moved_children {
                self.nodes[child].set_parent(Some(right_index));
            }
        }

        match parent {
            None => {
                let new_root = self.nodes.insert(Node::new_internal(None));
                self.nodes[index].set_parent(Some(new_root));
                self.nodes[right_index].set_parent(Some(new_root));
                self.nodes[new_root].push_entry(Entry::Internal {
                    mbr: left_mbr,
                    child: index,
                });
                self.nodes[new_root].push_entry(Entry::Internal {
                    mbr: right_mbr,
                    child: right_index,
                });
                self.root = new_root;
            }
            Some(parent_index) => {
                self.replace_child_entry(
                    parent_index,
                    index,
                    [
                        Entry::Internal {
                            mbr: left_mbr,
                            child: index,
                        },
                        Entry::Internal {
                            mbr: right_mbr,
                            child: right_index,
                        },
                    ],
                );
                self.handle_overflow(parent_index);
            }
        }
    }

    /// Replaces the single entry in `parent_index` pointing at `old_child`
    /// with the two entries produced by splitting it.
    fn replace_child_entry(&mut self, parent_index: Index, old_child: Index, new_entries: [Entry; 2]) {
        let pos = self.nodes[parent_index]
            .entries()
            .iter()
            .position(|e| e.child_index() == Some(old_child))
            .expect("a split node is always referenced by its parent");
        let mut entries = self.nodes[parent_index].take_entries();
        entries.splice(pos..=pos, new_entries);
        self.nodes[parent_index].set_entries(entries);
    }

    // ---- search -------------------------------------------------------

    /// Returns every payload whose stored shape reports `intersects(region)`
    /// true. Unordered modulo the natural DFS traversal order.
    pub fn search(&self, region: &Shape) -> Vec<Payload> {
        let mut hits = Vec::new();
        self.search_rec(self.root, region, &mut hits);
        hits
    }

    fn search_rec(&self, index: Index, region: &Shape, hits: &mut Vec<Payload>) {
        let node = &self.nodes[index];
        for entry in node.entries() {
            match entry {
                Entry::Leaf { shape, payload } => {
                    if shape.intersects(region) {
                        hits.push(payload.clone());
                    }
                }
                Entry::Internal { mbr, child } => {
                    if mbr.intersects(&region.mbr()) {
                        self.search_rec(*child, region, hits);
                    }
                }
            }
        }
    }

    /// Returns the payload with the given id, or `None`.
    pub fn search_by_id(&self, id: u64) -> Option<Payload> {
        self.search_by_id_rec(self.root, id)
    }

    fn search_by_id_rec(&self, index: Index, id: u64) -> Option<Payload> {
        let node = &self.nodes[index];
        if node.is_leaf() {
            return node.entries().iter().find_map(|entry| match entry {
                Entry::Leaf { payload, .. } if payload.id == id => Some(payload.clone()),
                _ => None,
            });
        }
        for entry in node.entries() {
            if let Entry::Internal { child, .. } = entry {
                if let Some(found) = self.search_by_id_rec(*child, id) {
                    return Some(found);
                }
            }
        }
        None
    }

    // ---- delete / update ----------------------------------------------

    /// Removes the payload with the given id. Returns `true` if it was
    /// present.
    pub fn delete_by_id(&mut self, id: u64) -> bool {
        self.remove_payload_by_id(id).is_some()
    }

    /// Equivalent to `delete_by_id(id)` followed by `insert` with the
    /// preserved payload and `shape`. Returns `false` without inserting if
    /// `id` was not present.
    pub fn update_by_id(&mut self, id: u64, shape: Shape) -> bool {
        match self.remove_payload_by_id(id) {
            Some(payload) => {
                self.insert(payload, shape);
                true
            }
            None => false,
        }
    }

    fn remove_payload_by_id(&mut self, id: u64) -> Option<Payload> {
        let path = self.find_path(id)?;
        let leaf_index = *path.last().expect("a found path is non-empty");

        let entries = self.nodes[leaf_index].take_entries();
        let mut removed = None;
        let mut remaining = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Entry::Leaf { shape, payload } if removed.is_none() && payload.id == id => {
                    drop(shape);
                    removed = Some(payload);
                }
                other => remaining.push(other),
            }
        }
        self.nodes[leaf_index].set_entries(remaining);

        self.condense(path);
        removed
    }

    /// Threads the path of node indices from the root to the leaf holding
    /// `id`, following DFS entry order (first encountered leaf wins, per
    /// the duplicate-id resolution in §9).
    fn find_path(&self, id: u64) -> Option<Vec<Index>> {
        let mut path = vec![self.root];
        if self.find_path_rec(self.root, id, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn find_path_rec(&self, index: Index, id: u64, path: &mut Vec<Index>) -> bool {
        let node = &self.nodes[index];
        if node.is_leaf() {
            return node.entries().iter().any(|entry| {
                matches!(entry, Entry::Leaf { payload, .. } if payload.id == id)
            });
        }
        for entry in node.entries() {
            if let Entry::Internal { child, .. } = entry {
                path.push(*child);
                if self.find_path_rec(*child, id, path) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }

    /// Walks `path` from the leaf toward the root. Any non-root node that
    /// drops below `min_entries` is detached from its parent and its
    /// entries are queued for reinsertion; surviving ancestors get their
    /// cached MBR refreshed. Finishes with root collapse and reinsertion
    /// of every orphaned entry.
    fn condense(&mut self, path: Vec<Index>) {
        let mut orphans: Vec<Entry> = Vec::new();

        for i in (0..path.len()).rev() {
            let index = path[i];
            if index == self.root {
                continue;
            }
            let parent_index = path[i - 1];

            if self.nodes[index].len() < self.config.min_entries {
                debug!(
                    node = ?index,
                    entries = self.nodes[index].len(),
                    min_entries = self.config.min_entries,
                    "condensing under-full node"
                );
                let entries = self.nodes[index].take_entries();
                orphans.extend(entries);
                self.remove_child_entry(parent_index, index);
                self.nodes.remove(index);
            } else {
                let mbr = self.nodes[index]
                    .coverage()
                    .expect("a node above min_entries >= 1 is never empty");
                self.set_child_mbr(parent_index, index, mbr);
            }
        }

        self.collapse_root_if_needed();
        self.reinsert_orphans(orphans);
    }

    fn remove_child_entry(&mut self, parent_index: Index, child_index: Index) {
        let mut entries = self.nodes[parent_index].take_entries();
        entries.retain(|entry| entry.child_index() != Some(child_index));
        self.nodes[parent_index].set_entries(entries);
    }

    fn set_child_mbr(&mut self, parent_index: Index, child_index: Index, mbr: BoundingBox) {
        for entry in self.nodes[parent_index].entries_mut() {
            if let Entry::Internal { mbr: cached, child } = entry {
                if *child == child_index {
                    *cached = mbr;
                    return;
                }
            }
        }
    }

    /// If the root is internal and holds exactly one entry, replaces the
    /// root with that entry's child (tree height decreases by one). If the
    /// root is internal and empty, replaces it with a fresh empty leaf
    /// (the §9 resolution of the otherwise-unreachable "root empty and
    /// internal" case).
    fn collapse_root_if_needed(&mut self) {
        loop {
            if self.nodes[self.root].is_leaf() {
                return;
            }
            match self.nodes[self.root].len() {
                0 => {
                    debug!("collapsing empty internal root to an empty leaf");
                    let old_root = self.root;
                    self.root = self.nodes.insert(Node::new_leaf(None));
                    self.nodes.remove(old_root);
                    return;
                }
                1 => {
                    debug!(root = ?self.root, "collapsing single-entry root");
                    let child = match &self.nodes[self.root].entries()[0] {
                        Entry::Internal { child, .. } => *child,
                        Entry::Leaf { .. } => {
                            unreachable!("an internal node holds only internal entries")
                        }
                    };
                    let old_root = self.root;
                    self.nodes[child].set_parent(None);
                    self.root = child;
                    self.nodes.remove(old_root);
                }
                _ => return,
            }
        }
    }

    /// Reinserts every orphaned entry produced by condense. Leaf entries
    /// go through the normal `insert` path; orphaned subtrees (entries
    /// that were internal) are walked down to their own leaves and each
    /// leaf reinserted individually, discarding the internal skeleton.
    /// This is the chosen resolution of the §9 "depth of reinserted
    /// internal entries" open question (simplicity over preserving
    /// original depth).
    fn reinsert_orphans(&mut self, orphans: Vec<Entry>) {
        for entry in orphans {
            match entry {
                Entry::Leaf { shape, payload } => self.insert(payload, shape),
                Entry::Internal { child, .. } => {
                    for (shape, payload) in self.collect_leaf_entries(child) {
                        self.insert(payload, shape);
                    }
                }
            }
        }
    }

    /// Removes the subtree rooted at `index` from the arena entirely,
    /// returning its leaf entries as owned (shape, payload) pairs.
    fn collect_leaf_entries(&mut self, index: Index) -> Vec<(Shape, Payload)> {
        let mut node = self
            .nodes
            .remove(index)
            .expect("an orphaned subtree's nodes must still be present");
        let mut out = Vec::new();
        for entry in node.take_entries() {
            match entry {
                Entry::Leaf { shape, payload } => out.push((shape, payload)),
                Entry::Internal { child, .. } => out.extend(self.collect_leaf_entries(child)),
            }
        }
        out
    }
}

/// Starting at `node`, selects the entry whose MBR requires the smallest
/// area enlargement to include `mbr`; ties broken by smaller current MBR
/// area, then by first position.
fn choose_subtree(node: &Node, mbr: &BoundingBox) -> usize {
    debug_assert!(!node.is_leaf(), "choose-subtree only runs on internal nodes");

    let mut best = 0usize;
    let mut best_enlargement = f64::INFINITY;
    let mut best_area = f64::INFINITY;

    for (i, entry) in node.entries().iter().enumerate() {
        let entry_mbr = entry.mbr();
        let enlargement = entry_mbr.enlargement(mbr);
        let area = entry_mbr.area();

        if enlargement < best_enlargement || (enlargement == best_enlargement && area < best_area) {
            best = i;
            best_enlargement = enlargement;
            best_area = area;
        }
    }

    best
}
