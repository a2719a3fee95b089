//! Points and axis-aligned rectangles tagged by coordinate space.
//!
//! The space parameter is a zero-sized marker that keeps world pixels, client
//! pixels, geographic degrees and projected plane units from being mixed up.
//! Converting between spaces goes through a projection or viewport transform;
//! [`Vec2::reinterpret`] and [`Rect::reinterpret`] exist for the few places
//! where two spaces share the same numeric layout on purpose.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Fixed pixel space covering the whole addressable map at zoom 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum World {}

/// Pixel space of the on-screen viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Client {}

/// Longitude/latitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geographic {}

/// Native plane of a geographic projection, before world scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projected {}

/// Represents a point (or a size) in the coordinate space `S`
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Vec2<S> {
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    _space: PhantomData<S>,
}

impl<S> Vec2<S> {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Reuses the same numbers in another space.
    pub fn reinterpret<T>(self) -> Vec2<T> {
        Vec2::new(self.x, self.y)
    }

    pub fn with_x(self, x: f64) -> Self {
        Self::new(x, self.y)
    }

    pub fn with_y(self, y: f64) -> Self {
        Self::new(self.x, y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<S> Clone for Vec2<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Vec2<S> {}

impl<S> PartialEq for Vec2<S> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl<S> Default for Vec2<S> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<S> fmt::Debug for Vec2<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec2({}, {})", self.x, self.y)
    }
}

impl<S> Add for Vec2<S> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<S> Sub for Vec2<S> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<S> Mul<f64> for Vec2<S> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl<S> Div<f64> for Vec2<S> {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl<S> Neg for Vec2<S> {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle in space `S`, stored as origin (minimum corner)
/// plus dimension. No wraparound is implied.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Rect<S> {
    pub origin: Vec2<S>,
    pub dimension: Vec2<S>,
}

impl<S> Rect<S> {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Vec2::new(left, top),
            dimension: Vec2::new(width, height),
        }
    }

    pub fn from_origin_and_dimension(origin: Vec2<S>, dimension: Vec2<S>) -> Self {
        Self { origin, dimension }
    }

    /// Creates a rectangle spanning two corners given in any order
    pub fn from_corners(a: Vec2<S>, b: Vec2<S>) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::new(left, top, a.x.max(b.x) - left, a.y.max(b.y) - top)
    }

    /// Creates a rectangle from `[min, max]` ranges on each axis
    pub fn from_ranges(x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self::new(
            x_range.0,
            y_range.0,
            x_range.1 - x_range.0,
            y_range.1 - y_range.0,
        )
    }

    /// Bounding box of a set of points, `None` when the set is empty
    pub fn bounding_box<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec2<S>>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::from_ranges((min_x, max_x), (min_y, max_y)))
    }

    pub fn reinterpret<T>(self) -> Rect<T> {
        Rect::from_origin_and_dimension(self.origin.reinterpret(), self.dimension.reinterpret())
    }

    pub fn left(&self) -> f64 {
        self.origin.x
    }

    pub fn top(&self) -> f64 {
        self.origin.y
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.dimension.x
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.dimension.y
    }

    pub fn width(&self) -> f64 {
        self.dimension.x
    }

    pub fn height(&self) -> f64 {
        self.dimension.y
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.left(), self.right())
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.top(), self.bottom())
    }

    pub fn center(&self) -> Vec2<S> {
        self.origin + self.dimension / 2.0
    }

    /// Corner points in ring order starting at the origin
    pub fn corners(&self) -> [Vec2<S>; 4] {
        [
            self.origin,
            Vec2::new(self.right(), self.top()),
            Vec2::new(self.right(), self.bottom()),
            Vec2::new(self.left(), self.bottom()),
        ]
    }

    pub fn translate(&self, delta: Vec2<S>) -> Self {
        Self::from_origin_and_dimension(self.origin + delta, self.dimension)
    }

    /// Closed containment: points on the border count as inside
    pub fn contains(&self, point: &Vec2<S>) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect<S>) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Open intersection: rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect<S>) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn intersection(&self, other: &Rect<S>) -> Option<Rect<S>> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self::from_ranges(
            (self.left().max(other.left()), self.right().min(other.right())),
            (self.top().max(other.top()), self.bottom().min(other.bottom())),
        ))
    }

    pub fn union(&self, other: &Rect<S>) -> Rect<S> {
        Self::from_ranges(
            (self.left().min(other.left()), self.right().max(other.right())),
            (self.top().min(other.top()), self.bottom().max(other.bottom())),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.dimension.x <= 0.0 || self.dimension.y <= 0.0
    }
}

impl<S> Clone for Rect<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Rect<S> {}

impl<S> PartialEq for Rect<S> {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.dimension == other.dimension
    }
}

impl<S> Default for Rect<S> {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl<S> fmt::Debug for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect(left={}, top={}, width={}, height={})",
            self.left(),
            self.top(),
            self.width(),
            self.height()
        )
    }
}
