//! Plane geometry for the hexagon overlay.
//!
//! Everything here is pure math on `f64` coordinates: vertex generation for
//! a single hexagon, the even-odd point-in-polygon test used for hit
//! testing, and the centroid/distance helpers used by the ripple and the
//! nearest-cell lookup.

use serde::{Deserialize, Serialize};

/// A point in either screen space or grid-local space.
///
/// Which space a point lives in is a property of where it came from, not of
/// the type: input events carry screen coordinates, hexagon vertices are in
/// grid-local coordinates (relative to the top-left of the overlay bounds).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by `(-dx, -dy)`.
    pub fn offset_by(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x - dx, self.y - dy)
    }
}

/// An axis-aligned rectangle described by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Length of the diagonal; the farthest any two points inside can be apart.
    pub fn diagonal(&self) -> f64 {
        (self.width * self.width + self.height * self.height).sqrt()
    }

    /// Whether the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Convert a screen-space point into coordinates relative to this
    /// rectangle's origin.
    pub fn to_local(&self, p: Point) -> Point {
        p.offset_by(self.left, self.top)
    }
}

/// Generate the six vertices of a hexagon centred on `center`.
///
/// Vertex `i` sits at angle `60°·i − 30°`, so the first vertex is the
/// upper-right one and the ring runs clockwise in screen coordinates
/// (y grows downwards).  Hit testing relies on this exact ordering.
pub fn hexagon_vertices(center: Point, radius: f64) -> [Point; 6] {
    let mut points = [Point::default(); 6];
    for (i, p) in points.iter_mut().enumerate() {
        let angle = (60.0 * i as f64 - 30.0).to_radians();
        *p = Point::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        );
    }
    points
}

/// Even-odd ray casting test.
///
/// Each edge `(i, i-1)` that straddles the horizontal line through `point`
/// and crosses it to the right of `point` flips the inside flag.  Edges
/// with equal Y at both ends never straddle, so they are skipped before
/// the division.
pub fn point_in_polygon(vertices: &[Point], point: Point) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = vertices[i];
        let pj = vertices[j];
        if pi.y != pj.y && (pi.y > point.y) != (pj.y > point.y) {
            let cross_x = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Arithmetic mean of the vertices.
///
/// Not an area-weighted centroid; for regular polygons the two agree.
/// Returns `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f64;
    Some(Point::new(sx / n, sy / n))
}

/// Euclidean distance.
pub fn distance(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}
