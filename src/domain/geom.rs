/// Plane geometry in world pixels.
///
/// `Rect` is always derived from an owner's position + size. Nothing in the
/// game stores a rect next to the position it came from.

use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Unit vector at `angle` radians scaled by `len`.
    pub fn from_angle(angle: f32, len: f32) -> Self {
        Vec2 { x: angle.cos() * len, y: angle.sin() * len }
    }

    pub fn midpoint(self, other: Vec2) -> Vec2 {
        Vec2 { x: (self.x + other.x) / 2.0, y: (self.y + other.y) / 2.0 }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2 { x: self.x * rhs, y: self.y * rhs }
    }
}

/// Axis-aligned bounding box. Edges touching do not count as overlap.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn at(pos: Vec2, size: Vec2) -> Self {
        Rect { x: pos.x, y: pos.y, w: size.x, h: size.y }
    }

    #[inline] pub fn left(&self) -> f32 { self.x }
    #[inline] pub fn right(&self) -> f32 { self.x + self.w }
    #[inline] pub fn top(&self) -> f32 { self.y }
    #[inline] pub fn bottom(&self) -> f32 { self.y + self.h }

    pub fn center(&self) -> Vec2 {
        Vec2 { x: self.x + self.w / 2.0, y: self.y + self.h / 2.0 }
    }

    pub fn set_right(&mut self, right: f32) { self.x = right - self.w; }
    pub fn set_left(&mut self, left: f32) { self.x = left; }
    pub fn set_bottom(&mut self, bottom: f32) { self.y = bottom - self.h; }
    pub fn set_top(&mut self, top: f32) { self.y = top; }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(16.0, 0.0, 16.0, 16.0);
        assert!(!a.overlaps(&b));
        let c = Rect::new(15.5, 4.0, 8.0, 15.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn edge_setters_move_origin() {
        let mut r = Rect::new(10.0, 10.0, 8.0, 15.0);
        r.set_right(32.0);
        assert_eq!(r.x, 24.0);
        r.set_bottom(48.0);
        assert_eq!(r.y, 33.0);
        r.set_left(1.0);
        r.set_top(2.0);
        assert_eq!((r.x, r.y), (1.0, 2.0));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 8.0, 15.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(7.9, 14.9)));
        assert!(!r.contains(Vec2::new(8.0, 3.0)));
    }

    #[test]
    fn center_and_midpoint() {
        let r = Rect::new(2.0, 4.0, 8.0, 16.0);
        assert_eq!(r.center(), Vec2::new(6.0, 12.0));
        assert_eq!(Vec2::new(0.0, 0.0).midpoint(Vec2::new(10.0, -4.0)), Vec2::new(5.0, -2.0));
    }
}
