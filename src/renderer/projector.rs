//! Letterboxed mapping between world units and canvas pixels
//!
//! The court keeps its aspect ratio; spare space on either axis becomes
//! equal bars. Pointer input goes through [`Letterbox::screen_to_world`] so
//! swipes land on the same spot the player sees.

use glam::Vec2;

use crate::sim::World;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Pixels per world unit
    pub scale: f32,
    /// Top-left of the world in canvas pixels
    pub offset: Vec2,
    pub viewport: Vec2,
}

impl Letterbox {
    pub fn new(viewport_w: f32, viewport_h: f32, world: &World) -> Self {
        let viewport = Vec2::new(viewport_w.max(1.0), viewport_h.max(1.0));
        let scale = (viewport.x / world.width).min(viewport.y / world.height);
        let drawn = Vec2::new(world.width, world.height) * scale;
        Self {
            scale,
            offset: (viewport - drawn) * 0.5,
            viewport,
        }
    }

    pub fn world_to_screen(&self, p: Vec2) -> Vec2 {
        self.offset + p * self.scale
    }

    pub fn screen_to_world(&self, p: Vec2) -> Vec2 {
        (p - self.offset) / self.scale
    }

    /// World length to pixels
    pub fn length(&self, world_len: f32) -> f32 {
        world_len * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::default()
    }

    #[test]
    fn test_exact_fit_has_no_bars() {
        let lb = Letterbox::new(1800.0, 1000.0, &world());
        assert_eq!(lb.scale, 2.0);
        assert_eq!(lb.offset, Vec2::ZERO);
    }

    #[test]
    fn test_tall_viewport_bars_top_and_bottom() {
        // Portrait phone
        let lb = Letterbox::new(450.0, 900.0, &world());
        assert_eq!(lb.scale, 0.5);
        assert_eq!(lb.offset.x, 0.0);
        assert_eq!(lb.offset.y, (900.0 - 250.0) / 2.0);
    }

    #[test]
    fn test_wide_viewport_bars_left_and_right() {
        let lb = Letterbox::new(2000.0, 500.0, &world());
        assert_eq!(lb.scale, 1.0);
        assert_eq!(lb.offset, Vec2::new(550.0, 0.0));
    }

    #[test]
    fn test_round_trip() {
        let lb = Letterbox::new(390.0, 844.0, &world());
        let p = Vec2::new(123.0, 456.0);
        let back = lb.screen_to_world(lb.world_to_screen(p));
        assert!(back.distance(p) < 1e-3);
        assert_eq!(lb.world_to_screen(Vec2::ZERO), lb.offset);
    }

    #[test]
    fn test_degenerate_viewport_is_safe() {
        let lb = Letterbox::new(0.0, 0.0, &world());
        assert!(lb.scale.is_finite() && lb.scale > 0.0);
    }
}
