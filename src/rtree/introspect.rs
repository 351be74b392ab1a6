//! A pure, read-only traversal that describes the tree's shape for
//! debugging: node kind, depth, coverage, and per-entry MBR/payload/child.
//! Never mutates the tree; every reachable node is visited exactly once.
//! The view types derive [`serde::Serialize`] so a caller can dump them as
//! the JSON schema described in the crate's external interfaces. This
//! module only builds the in-memory view; it performs no I/O itself.

use serde::Serialize;

use super::node::Entry;
use super::{Index, RTree};
use crate::geometry::{BoundingBox, ShapeKind};

/// Whether a [`NodeView`] describes a leaf or an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NodeKind {
    Leaf,
    Internal,
}

/// A hierarchical description of one node and its subtree.
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub level: usize,
    pub mbr: Option<BoundingBox>,
    pub elements: Vec<ElementView>,
}

/// A single entry within a [`NodeView`]: exactly one of `data`/`child` is
/// present, depending on whether the host node is a leaf.
#[derive(Debug, Clone, Serialize)]
pub struct ElementView {
    pub index: usize,
    #[serde(rename = "shapeType")]
    pub shape_type: ShapeKind,
    pub mbr: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PayloadView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<NodeView>>,
}

/// The `{id, name}` pair carried by a leaf entry.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadView {
    pub id: u64,
    pub name: String,
}

pub(crate) fn build(tree: &RTree) -> NodeView {
    build_node_view(tree, tree.root, 0)
}

fn build_node_view(tree: &RTree, index: Index, level: usize) -> NodeView {
    let node = &tree.nodes[index];
    let kind = if node.is_leaf() {
        NodeKind::Leaf
    } else {
        NodeKind::Internal
    };

    let elements = node
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let (data, child) = match entry {
                Entry::Leaf { payload, .. } => (
                    Some(PayloadView {
                        id: payload.id,
                        name: payload.name.clone(),
                    }),
                    None,
                ),
                Entry::Internal { child, .. } => {
                    (None, Some(Box::new(build_node_view(tree, *child, level + 1))))
                }
            };
            ElementView {
                index: i + 1,
                shape_type: entry.shape_kind(),
                mbr: entry.mbr(),
                data,
                child,
            }
        })
        .collect();

    NodeView {
        kind,
        level,
        mbr: node.coverage(),
        elements,
    }
}
