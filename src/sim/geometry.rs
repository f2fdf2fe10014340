//! Collision primitives for the rectangular court
//!
//! Rackets are axis-aligned rectangles, the ball is a circle. The test is a
//! plain closest-point check with no swept volume, so a very fast ball can
//! skip through a thin racket between two frames.

use glam::Vec2;

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Closest point of the rectangle to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.x, self.right()), p.y.clamp(self.y, self.bottom()))
    }
}

/// True iff the circle touches or overlaps the rectangle
#[inline]
pub fn circle_rect_collision(center: Vec2, radius: f32, rect: &Rect) -> bool {
    let closest = rect.closest_point(center);
    center.distance_squared(closest) <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    fn racket() -> Rect {
        Rect::new(100.0, 200.0, 10.0, 60.0)
    }

    #[test]
    fn test_circle_inside_rect_hits() {
        assert!(circle_rect_collision(Vec2::new(105.0, 230.0), 4.0, &racket()));
    }

    #[test]
    fn test_circle_touching_face_hits() {
        // Exactly one radius from the right face counts as contact
        assert!(circle_rect_collision(Vec2::new(120.0, 230.0), 10.0, &racket()));
        assert!(!circle_rect_collision(Vec2::new(120.5, 230.0), 10.0, &racket()));
    }

    #[test]
    fn test_circle_near_corner() {
        let r = racket();
        // 6-8-10 triangle from the top-left corner
        assert!(circle_rect_collision(Vec2::new(94.0, 192.0), 10.0, &r));
        assert!(!circle_rect_collision(Vec2::new(93.0, 191.0), 10.0, &r));
    }

    #[test]
    fn test_rect_accessors() {
        let r = racket();
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 260.0);
        assert_eq!(r.center(), Vec2::new(105.0, 230.0));
    }
}
