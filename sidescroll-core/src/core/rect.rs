//! Axis-Aligned Rectangle
//!
//! The single shape used for hitboxes, collision probes and tile queries.
//! Origin is the bottom-left corner; Y grows upward.

use serde::{Serialize, Deserialize};

use super::vec2::Vec2;

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width (never negative)
    pub w: f32,
    /// Height (never negative)
    pub h: f32,
}

impl Rect {
    /// Create a rectangle from its bottom-left corner and size.
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Create a rectangle centred on a point.
    #[inline]
    pub fn from_center(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w * 0.5, center.y - h * 0.5, w, h)
    }

    /// Left edge (x).
    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge (x + w).
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Bottom edge (y).
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y
    }

    /// Top edge (y + h).
    #[inline]
    pub fn top(&self) -> f32 {
        self.y + self.h
    }

    /// Centre point.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Bottom-left corner.
    #[inline]
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Same size, shifted by an offset.
    #[inline]
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }

    /// Strict overlap test. Rectangles that only share an edge do not overlap,
    /// so a body resting on a floor is not "inside" it.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }

    /// Check if a point lies inside (edges inclusive).
    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.top()
    }
}
