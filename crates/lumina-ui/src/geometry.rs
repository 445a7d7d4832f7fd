//! Screen-space rectangles. Units are physical pixels, origin top-left, +y down.

use glam::Vec2;

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle from a corner and a size.
    #[must_use]
    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::new(min.x, min.y, size.x, size.y)
    }

    #[must_use]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[must_use]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.min() + self.size() * 0.5
    }

    /// Whether `point` lies inside. The right and bottom edges are exclusive.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.y >= self.y && point.x < self.right() && point.y < self.bottom()
    }

    #[must_use]
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Shrinks every side by `amount`, never below zero size.
    #[must_use]
    pub fn shrink(&self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            (self.width - 2.0 * amount).max(0.0),
            (self.height - 2.0 * amount).max(0.0),
        )
    }

    /// Overlap of two rectangles, or `None` if they do not overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let min = self.min().max(other.min());
        let max = self.max().min(other.max());
        (max.x > min.x && max.y > min.y).then(|| Self::from_min_size(min, max - min))
    }

    /// Splits off the top `height` pixels, returning (top, rest).
    #[must_use]
    pub fn split_top(&self, height: f32) -> (Self, Self) {
        let height = height.clamp(0.0, self.height);
        (
            Self::new(self.x, self.y, self.width, height),
            Self::new(self.x, self.y + height, self.width, self.height - height),
        )
    }

    /// Splits off the right `width` pixels, returning (rest, right).
    #[must_use]
    pub fn split_right(&self, width: f32) -> (Self, Self) {
        let width = width.clamp(0.0, self.width);
        (
            Self::new(self.x, self.y, self.width - width, self.height),
            Self::new(self.right() - width, self.y, width, self.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 20.0, 10.0);
        assert!(r.contains(Vec2::new(10.0, 10.0)));
        assert!(r.contains(Vec2::new(29.9, 19.9)));
        assert!(!r.contains(Vec2::new(30.0, 15.0)));
        assert!(!r.contains(Vec2::new(15.0, 20.0)));
    }

    #[test]
    fn test_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersect(&Rect::new(10.0, 0.0, 5.0, 5.0)), None);
    }

    #[test]
    fn test_splits() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.0);
        let (top, rest) = r.split_top(20.0);
        assert_eq!(top.height, 20.0);
        assert_eq!(rest.y, 20.0);
        assert_eq!(rest.height, 30.0);
        let (left, right) = r.split_right(12.0);
        assert_eq!(left.width, 88.0);
        assert_eq!(right.x, 88.0);
    }
}
