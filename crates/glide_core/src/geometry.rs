//! Geometry primitives
//!
//! Small f32 vector/rect types used throughout the engine. All derived
//! quantities (unit vectors, ratios) guard zero-length and non-finite inputs
//! and degrade to identity/zero rather than producing NaN.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Coordinate comparisons below this magnitude are treated as zero.
pub const COORD_EPSILON: f32 = 0.01;

/// A 2D point or displacement in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Alias used where the value denotes a displacement or velocity rather
/// than a position.
pub type Vector = Point;

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or zero if degenerate.
    pub fn normalized(&self) -> Vector {
        let len = self.length();
        if len <= COORD_EPSILON || !len.is_finite() {
            return Vector::ZERO;
        }
        Vector::new(self.x / len, self.y / len)
    }

    /// Absolute angle of the vector in `[0, pi]`, measured from the
    /// positive X axis. Degenerate vectors report 0.
    pub fn angle(&self) -> f32 {
        if self.length() <= COORD_EPSILON {
            return 0.0;
        }
        self.y.atan2(self.x).abs()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn abs(&self) -> Point {
        Point::new(self.x.abs(), self.y.abs())
    }

    pub fn clamp(&self, min: Point, max: Point) -> Point {
        Point::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Point {
    type Output = Point;
    /// Division by a degenerate scale yields zero rather than NaN.
    fn div(self, rhs: f32) -> Point {
        if rhs.abs() <= f32::EPSILON || !rhs.is_finite() {
            return Point::ZERO;
        }
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// An axis-aligned rectangle: origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Point {
        Point::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

/// Bitset of the sides on which an axis pair is currently overscrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideBits(u8);

impl SideBits {
    pub const NONE: SideBits = SideBits(0);
    pub const TOP: SideBits = SideBits(1 << 0);
    pub const RIGHT: SideBits = SideBits(1 << 1);
    pub const BOTTOM: SideBits = SideBits(1 << 2);
    pub const LEFT: SideBits = SideBits(1 << 3);

    pub fn contains(&self, other: SideBits) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn union(&self, other: SideBits) -> SideBits {
        SideBits(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Whether two angles (in `[0, pi]`) lie within `threshold` of the
/// horizontal axis (either direction).
pub fn is_close_to_horizontal(angle: f32, threshold: f32) -> bool {
    angle < threshold || angle > std::f32::consts::PI - threshold
}

/// Whether an angle (in `[0, pi]`) lies within `threshold` of vertical.
pub fn is_close_to_vertical(angle: f32, threshold: f32) -> bool {
    (angle - std::f32::consts::FRAC_PI_2).abs() < threshold
}
