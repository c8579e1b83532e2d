//! Planar geometry over pixel-space points
//!
//! All functions are pure and tolerate degenerate input: fewer vertices than a
//! shape needs yields zero instead of an error, because half-drawn shapes are
//! an expected state while digitizing.

/// A point in page pixel space
///
/// Origin at the top-left of the rendered page, x to the right, y downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Multiply both coordinates by `factor`
    pub fn scaled(&self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }
}

/// Euclidean distance between two points
pub fn distance(a: &Point, b: &Point) -> f64 {
    a.distance_to(b)
}

/// Point halfway between `a` and `b`
pub fn midpoint(a: &Point, b: &Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Polygon area in square pixels (shoelace formula)
pub fn polygon_area_px(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x * points[j].y;
        twice_area -= points[j].x * points[i].y;
    }
    (twice_area / 2.0).abs()
}

/// Closed polygon perimeter in pixels
pub fn polygon_perimeter_px(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }

    (0..n)
        .map(|i| points[i].distance_to(&points[(i + 1) % n]))
        .sum()
}

/// Arithmetic mean of the vertices
///
/// This is the vertex average, not the area-weighted centroid. It is only used
/// to anchor labels, where the difference does not matter.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }

    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|p| p.x).sum();
    let sum_y: f64 = points.iter().map(|p| p.y).sum();
    Point::new(sum_x / n, sum_y / n)
}
