use geo::bounding_rect::BoundingRect;
use geo_types::{Coord, LineString, Polygon as GeoPolygon};
use serde::Serialize;

use crate::error::IndexError;
use crate::geometry::BoundingBox;

/// The polymorphic shape kinds stored in the tree. Index-internal mutation
/// logic (choose-subtree, split, condense) only ever needs `mbr()`; the
/// richer `intersects`/`contains`/`area` predicates are evaluated at
/// leaf-entry test time during `search`.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect(BoundingBox),
    Disk { cx: f64, cy: f64, r: f64 },
    Polygon(Vec<(f64, f64)>),
}

/// The `shapeType` tag reported in the introspection view (§6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Rect,
    Disk,
    Polygon,
}

impl Shape {
    pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Shape::Rect(BoundingBox::new(min_x, min_y, max_x, max_y))
    }

    pub fn disk(cx: f64, cy: f64, r: f64) -> Self {
        Shape::Disk { cx, cy, r }
    }

    /// Constructs a polygon from an ordered vertex ring.
    ///
    /// # Errors
    /// Returns [`IndexError::DegeneratePolygon`] if fewer than 3 vertices are given.
    pub fn polygon(points: Vec<(f64, f64)>) -> Result<Self, IndexError> {
        if points.len() < 3 {
            return Err(IndexError::DegeneratePolygon(points.len()));
        }
        Ok(Shape::Polygon(points))
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rect(_) => ShapeKind::Rect,
            Shape::Disk { .. } => ShapeKind::Disk,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// The minimum bounding rectangle of this shape.
    pub fn mbr(&self) -> BoundingBox {
        match self {
            Shape::Rect(b) => *b,
            Shape::Disk { cx, cy, r } => BoundingBox::new(cx - r, cy - r, cx + r, cy + r),
            Shape::Polygon(points) => polygon_bounding_box(points),
        }
    }

    /// Conservative MBR-based intersection test (see §4.2). `Rect` delegates
    /// exactly to MBR overlap; `Disk` and `Polygon` test their MBRs rather
    /// than the true geometry, by design (this can admit false positives
    /// for `search` but never false negatives).
    pub fn intersects(&self, other: &Shape) -> bool {
        self.mbr().intersects(&other.mbr())
    }

    /// `Rect.contains` delegates to MBR containment. `Disk.contains` uses
    /// the exact farthest-corner test against `other`'s MBR. `Polygon.contains`
    /// is the conservative MBR test, like `intersects`.
    pub fn contains(&self, other: &Shape) -> bool {
        match self {
            Shape::Rect(b) => b.contains(&other.mbr()),
            Shape::Disk { cx, cy, r } => {
                let other_mbr = other.mbr();
                let dx = (other_mbr.min_x - cx).abs().max((other_mbr.max_x - cx).abs());
                let dy = (other_mbr.min_y - cy).abs().max((other_mbr.max_y - cy).abs());
                dx * dx + dy * dy <= r * r
            }
            Shape::Polygon(_) => self.mbr().contains(&other.mbr()),
        }
    }

    /// `Rect`/`Disk` areas are exact (`area = π·r²` for disks). `Polygon`
    /// area is the absolute value of half the signed shoelace sum over the
    /// vertex ring (the true polygon area, not an MBR approximation).
    pub fn area(&self) -> f64 {
        match self {
            Shape::Rect(b) => b.area(),
            Shape::Disk { r, .. } => std::f64::consts::PI * r * r,
            Shape::Polygon(points) => shoelace_area(points),
        }
    }
}

fn shoelace_area(points: &[(f64, f64)]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        sum += x0 * y1 - x1 * y0;
    }
    (sum / 2.0).abs()
}

fn polygon_bounding_box(points: &[(f64, f64)]) -> BoundingBox {
    let ring: LineString<f64> = points.iter().map(|&(x, y)| Coord { x, y }).collect();
    let poly = GeoPolygon::new(ring, vec![]);
    let rect = poly
        .bounding_rect()
        .expect("a polygon with at least 3 vertices always has a bounding rect");
    BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_intersects_delegates_to_mbr() {
        let a = Shape::rect(0.0, 0.0, 2.0, 2.0);
        let b = Shape::rect(2.0, 0.0, 3.0, 1.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn disk_mbr_is_centered_square() {
        let d = Shape::disk(0.0, 0.0, 5.0);
        assert_eq!(d.mbr(), BoundingBox::new(-5.0, -5.0, 5.0, 5.0));
    }

    #[test]
    fn disk_contains_uses_farthest_corner() {
        let d = Shape::disk(0.0, 0.0, 5.0);
        let inside = Shape::rect(-1.0, -1.0, 1.0, 1.0);
        assert!(d.contains(&inside));

        let corner_too_far = Shape::rect(3.0, 3.0, 4.0, 4.0);
        assert!(!d.contains(&corner_too_far));
    }

    #[test]
    fn polygon_area_matches_shoelace() {
        let p = Shape::polygon(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 3.0)]).unwrap();
        assert_eq!(p.area(), 6.0);
        assert_eq!(p.mbr(), BoundingBox::new(0.0, 0.0, 4.0, 3.0));
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let err = Shape::polygon(vec![(0.0, 0.0), (1.0, 1.0)]).unwrap_err();
        assert_eq!(err, IndexError::DegeneratePolygon(2));
    }
}
