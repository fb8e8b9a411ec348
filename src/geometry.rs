//! Integer geometry and 2D affine transforms
//!
//! Window bounds, hit-test insets and event locations are integral pixel
//! values. Transforms are full 2D affine matrices backed by `cgmath`; points
//! pushed through them are rounded back onto the pixel grid.

use cgmath::{Matrix3, SquareMatrix, Vector3};
use std::fmt;

/// Determinants smaller than this are treated as non-invertible.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// A point in some window's coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Midpoint between two points, truncated like integer division.
    pub fn middle(self, other: Point) -> Self {
        Self::new((self.x + other.x) / 2, (self.y + other.y) / 2)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Rectangle for window positioning and sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn from_origin_and_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Half-open containment: `[x, x + width) x [y, y + height)`.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Shrinks the rectangle by `insets`; negative insets grow it.
    pub fn inset(&self, insets: &Insets) -> Rect {
        Rect::new(
            self.x + insets.left,
            self.y + insets.top,
            (self.width - insets.left - insets.right).max(0),
            (self.height - insets.top - insets.bottom).max(0),
        )
    }

    pub fn with_size(&self, size: Size) -> Rect {
        Rect::new(self.x, self.y, size.width, size.height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Per-edge insets. Positive values shrink a rectangle, negative values
/// extend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Insets {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl Insets {
    pub const fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0 && self.left == 0 && self.bottom == 0 && self.right == 0
    }
}

/// A 2D affine transform stored as a homogeneous 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        // Column-major: the third column carries the translation.
        Self {
            matrix: Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, tx, ty, 1.0),
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            matrix: Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0),
        }
    }

    /// Clockwise rotation in degrees (y grows downwards on screen).
    pub fn rotation(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            matrix: Matrix3::new(cos, sin, 0.0, -sin, cos, 0.0, 0.0, 0.0, 1.0),
        }
    }

    /// Returns a transform that applies `self` first and then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        Transform {
            matrix: next.matrix * self.matrix,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix3::identity()
    }

    /// Zero-scale and other collapsed transforms cannot be inverted.
    pub fn is_invertible(&self) -> bool {
        self.matrix.determinant().abs() > DEGENERATE_EPSILON
    }

    pub fn inverse(&self) -> Option<Transform> {
        if !self.is_invertible() {
            return None;
        }
        self.matrix.invert().map(|matrix| Transform { matrix })
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let (x, y) = self.apply(point.x as f64, point.y as f64);
        Point::new(round_to_int(x), round_to_int(y))
    }

    /// Maps `point` through the inverse transform; `None` when degenerate.
    pub fn transform_point_reverse(&self, point: Point) -> Option<Point> {
        self.inverse().map(|inverse| inverse.transform_point(point))
    }

    /// Bounding box of the transformed rectangle.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        if self.is_identity() {
            return *rect;
        }
        let corners = [
            self.apply(rect.x as f64, rect.y as f64),
            self.apply(rect.right() as f64, rect.y as f64),
            self.apply(rect.x as f64, rect.bottom() as f64),
            self.apply(rect.right() as f64, rect.bottom() as f64),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
        let x = round_to_int(min_x);
        let y = round_to_int(min_y);
        Rect::new(x, y, round_to_int(max_x) - x, round_to_int(max_y) - y)
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let v = self.matrix * Vector3::new(x, y, 1.0);
        (v.x, v.y)
    }
}

fn round_to_int(value: f64) -> i32 {
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(10, 10, 5, 5);
        assert!(r.contains(Point::new(10, 10)));
        assert!(r.contains(Point::new(14, 14)));
        assert!(!r.contains(Point::new(15, 10)));
        assert!(!r.contains(Point::new(9, 12)));
    }

    #[test]
    fn negative_insets_expand() {
        let r = Rect::new(0, 0, 50, 60).inset(&Insets::uniform(-1));
        assert_eq!(r, Rect::new(-1, -1, 52, 62));
        assert!(r.contains(Point::new(-1, -1)));
        assert!(!r.contains(Point::new(-2, -2)));
    }

    #[test]
    fn rotation_round_trips_through_inverse() {
        let t = Transform::rotation(90.0).then(&Transform::translation(600.0, 0.0));
        let p = t.transform_point(Point::new(10, 20));
        assert_eq!(p, Point::new(580, 10));
        assert_eq!(t.transform_point_reverse(p), Some(Point::new(10, 20)));
    }

    #[test]
    fn halves_round_away_from_zero() {
        let t = Transform::scale(0.5, 0.5);
        assert_eq!(t.transform_point(Point::new(-5, 5)), Point::new(-3, 3));
        assert_eq!(t.transform_point(Point::new(-3, 3)), Point::new(-2, 2));
    }

    #[test]
    fn zero_scale_is_not_invertible() {
        let t = Transform::scale(0.0, 1.0);
        assert!(!t.is_invertible());
        assert_eq!(t.transform_point_reverse(Point::new(1, 1)), None);
    }

    #[test]
    fn transform_rect_takes_bounding_box() {
        let t = Transform::rotation(90.0);
        assert_eq!(t.transform_rect(&Rect::new(0, 0, 800, 600)), Rect::new(-600, 0, 600, 800));
    }
}
