use thiserror::Error;

/// Errors raised at construction time. Every other public operation on
/// [`crate::rtree::RTree`](crate::rtree::RTree) is total: absent ids are a
/// boolean outcome (see `search_by_id`/`delete_by_id`/`update_by_id`), not a
/// thrown condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("max_entries must be at least 2, got {0}")]
    InvalidCapacity(usize),

    #[error("a polygon needs at least 3 vertices, got {0}")]
    DegeneratePolygon(usize),
}
