//! Pixel geometry used by measurements and hit testing.

use crate::entry::Point;

/// Euclidean distance between two points, in pixels.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    let dx = f64::from(b.x) - f64::from(a.x);
    let dy = f64::from(b.y) - f64::from(a.y);
    dx.hypot(dy)
}

/// Snap a ruler end point onto the start point's row or column.
///
/// When one axis dominates the other by more than `ratio`, the minor axis of
/// `end` is replaced by the start's. A `ratio` of 0 disables snapping.
/// Returns the possibly adjusted end point.
#[must_use]
pub fn align(start: Point, end: Point, ratio: u32) -> Point {
    if ratio == 0 {
        return end;
    }
    let dx = (i64::from(end.x) - i64::from(start.x)).abs();
    let dy = (i64::from(end.y) - i64::from(start.y)).abs();
    let ratio = i64::from(ratio);

    if dx > dy.saturating_mul(ratio) {
        Point::new(end.x, start.y)
    } else if dy > dx.saturating_mul(ratio) {
        Point::new(start.x, end.y)
    } else {
        end
    }
}

/// Distance from `(px, py)` to the segment `a`–`b`.
///
/// A degenerate segment is treated as a single point.
#[must_use]
pub fn distance_to_segment(px: f64, py: f64, a: Point, b: Point) -> f64 {
    let (x1, y1) = (f64::from(a.x), f64::from(a.y));
    let (x2, y2) = (f64::from(b.x), f64::from(b.y));
    let len2 = (x2 - x1).powi(2) + (y2 - y1).powi(2);

    if len2 == 0.0 {
        return (px - x1).hypot(py - y1);
    }

    let t = (((px - x1) * (x2 - x1) + (py - y1) * (y2 - y1)) / len2).clamp(0.0, 1.0);
    let proj_x = x1 + t * (x2 - x1);
    let proj_y = y1 + t * (y2 - y1);
    (px - proj_x).hypot(py - proj_y)
}
