use generational_arena::Index;

use crate::geometry::{BoundingBox, Shape, ShapeKind};
use crate::payload::Payload;

/// A unit of storage in a [`Node`]: either `(MBR, payload)` in a leaf node,
/// or `(MBR, child-node-reference)` in an internal node.
#[derive(Debug, Clone)]
pub enum Entry {
    Leaf { shape: Shape, payload: Payload },
    Internal { mbr: BoundingBox, child: Index },
}

impl Entry {
    /// The MBR this entry contributes to its host node's coverage. For a
    /// leaf entry this is always exactly the stored shape's MBR (I1); for an
    /// internal entry it is the cached union of the child's entries.
    pub fn mbr(&self) -> BoundingBox {
        match self {
            Entry::Leaf { shape, .. } => shape.mbr(),
            Entry::Internal { mbr, .. } => *mbr,
        }
    }

    pub fn shape_kind(&self) -> ShapeKind {
        match self {
            Entry::Leaf { shape, .. } => shape.kind(),
            // Internal entries have no shape of their own; they report the
            // kind of bounding rectangle they cache.
            Entry::Internal { .. } => ShapeKind::Rect,
        }
    }

    pub fn child_index(&self) -> Option<Index> {
        match self {
            Entry::Internal { child, .. } => Some(*child),
            Entry::Leaf { .. } => None,
        }
    }
}

/// A node in the tree: an ordered sequence of entries, a leaf flag fixed at
/// construction, and a non-owning back-reference to the parent node (`None`
/// only for the root). Nodes live in a [`generational_arena::Arena`] and are
/// addressed by stable [`Index`] handles, per the crate's arena layout.
#[derive(Debug)]
pub struct Node {
    is_leaf: bool,
    entries: Vec<Entry>,
    parent: Option<Index>,
}

impl Node {
    pub fn new_leaf(parent: Option<Index>) -> Self {
        Self {
            is_leaf: true,
            entries: Vec::new(),
            parent,
        }
    }

    pub fn new_internal(parent: Option<Index>) -> Self {
        Self {
            is_leaf: false,
            entries: Vec::new(),
            parent,
        }
    }

    pub fn new(is_leaf: bool, parent: Option<Index>) -> Self {
        Self {
            is_leaf,
            entries: Vec::new(),
            parent,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[inline]
    pub fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<Index>) {
        self.parent = parent;
    }

    /// Appends an entry without checking the fan-out bound; callers are
    /// responsible for splitting a node that grows past `max_entries + 1`.
    pub fn push_entry(&mut self, entry: Entry) {
        debug_assert_eq!(
            matches!(entry, Entry::Leaf { .. }),
            self.is_leaf,
            "entry kind must match host node's leaf flag"
        );
        self.entries.push(entry);
    }

    /// Removes and returns all entries of this node, leaving it empty.
    pub fn take_entries(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }

    /// Replaces this node's entries wholesale (used when rebuilding a node
    /// around one half of a split, or after reassembling the survivors of a
    /// condense pass).
    pub fn set_entries(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
    }

    /// The tight cover of this node's current entries, or `None` if empty
    /// (only possible for an empty root).
    pub fn coverage(&self) -> Option<BoundingBox> {
        union_mbr(&self.entries)
    }
}

/// The tight cover of a bare entry slice, or `None` if empty. Shared by
/// [`Node::coverage`] and the split/condense machinery in
/// [`crate::rtree`], which need the union of a half-partition before it has
/// been installed into a node.
pub(crate) fn union_mbr(entries: &[Entry]) -> Option<BoundingBox> {
    let mut iter = entries.iter();
    let first = iter.next()?.mbr();
    Some(iter.fold(first, |acc, entry| acc.combined(&entry.mbr())))
}
