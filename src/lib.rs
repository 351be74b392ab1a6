//! A height-balanced 2D R-tree spatial index over rectangle, disk and
//! polygon shapes. Organizes shapes keyed by their axis-aligned minimum
//! bounding rectangle (MBR) so that region queries run in time roughly
//! proportional to the result set plus a shallow tree traversal.
//!
//! The crate is single-threaded and in-memory only: persistence, bulk
//! loading, nearest-neighbor queries, and dimensions other than 2 are out
//! of scope (see `RTree` for the supported operations).

pub mod error;
pub mod geometry;
#[cfg(feature = "setup_tracing")]
pub mod logging;
pub mod payload;
pub mod rtree;

pub use error::IndexError;
pub use geometry::{BoundingBox, Shape, ShapeKind};
pub use payload::Payload;
pub use rtree::{RTree, RTreeConfig};
