//! Pointer input reduced to what the simulation needs
//!
//! The host converts pointer coordinates to world space (see
//! [`crate::renderer::projector::Letterbox`]) and feeds them in here together with a
//! millisecond timestamp. Nothing else about the pointer reaches the sim.

use crate::lerp;

/// Blend factor applied to each new swipe speed sample
const SWIPE_BLEND: f32 = 0.35;
/// Shortest interval between samples used for the speed estimate (ms)
const MIN_SAMPLE_MS: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
struct Sample {
    y: f32,
    t_ms: f64,
}

/// Derived input for one frame
#[derive(Debug, Clone, Default)]
pub struct InputSignal {
    /// Where the player paddle is heading (world units)
    pub target_y: f32,
    /// Smoothed vertical swipe speed (world units/s)
    pub swipe_speed: f32,
    pressed: bool,
    last: Option<Sample>,
}

impl InputSignal {
    pub fn new(target_y: f32) -> Self {
        Self {
            target_y,
            ..Default::default()
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn pointer_down(&mut self, world_y: f32, now_ms: f64) {
        self.pressed = true;
        self.target_y = world_y;
        self.last = Some(Sample {
            y: world_y,
            t_ms: now_ms,
        });
    }

    /// Moves without a preceding press are ignored
    pub fn pointer_move(&mut self, world_y: f32, now_ms: f64) {
        if !self.pressed {
            return;
        }
        self.target_y = world_y;

        if let Some(last) = self.last {
            let dy = (world_y - last.y).abs();
            let dt = (now_ms - last.t_ms).max(MIN_SAMPLE_MS) / 1000.0;
            let speed = dy / dt as f32;
            self.swipe_speed = lerp(self.swipe_speed, speed, SWIPE_BLEND);
        }
        self.last = Some(Sample {
            y: world_y,
            t_ms: now_ms,
        });
    }

    pub fn pointer_up(&mut self) {
        self.pressed = false;
        self.last = None;
    }

    /// Forget any swipe in progress and aim at `target_y`
    pub fn reset(&mut self, target_y: f32) {
        *self = Self::new(target_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut input = InputSignal::new(250.0);
        input.pointer_move(100.0, 10.0);
        assert_eq!(input.target_y, 250.0);
        assert_eq!(input.swipe_speed, 0.0);
    }

    #[test]
    fn test_swipe_speed_blends_samples() {
        let mut input = InputSignal::new(250.0);
        input.pointer_down(250.0, 0.0);
        assert_eq!(input.target_y, 250.0);

        // 40 units in 10 ms is 4000 units/s, blended at 0.35
        input.pointer_move(290.0, 10.0);
        assert!((input.swipe_speed - 1400.0).abs() < 0.01);
        assert_eq!(input.target_y, 290.0);

        input.pointer_move(330.0, 20.0);
        assert!((input.swipe_speed - (1400.0 + (4000.0 - 1400.0) * 0.35)).abs() < 0.01);
    }

    #[test]
    fn test_sample_interval_has_a_floor() {
        let mut input = InputSignal::new(0.0);
        input.pointer_down(0.0, 5.0);
        // Same timestamp behaves as a 1 ms gap
        input.pointer_move(2.0, 5.0);
        assert!((input.swipe_speed - 2000.0 * 0.35).abs() < 0.01);
    }

    #[test]
    fn test_direction_does_not_matter() {
        let mut up = InputSignal::new(250.0);
        up.pointer_down(250.0, 0.0);
        up.pointer_move(200.0, 16.0);

        let mut down = InputSignal::new(250.0);
        down.pointer_down(250.0, 0.0);
        down.pointer_move(300.0, 16.0);

        assert_eq!(up.swipe_speed, down.swipe_speed);
    }

    #[test]
    fn test_release_ends_swipe_tracking() {
        let mut input = InputSignal::new(250.0);
        input.pointer_down(250.0, 0.0);
        input.pointer_up();
        assert!(!input.is_pressed());
        input.pointer_move(10.0, 5.0);
        assert_eq!(input.target_y, 250.0);
    }

    #[test]
    fn test_reset() {
        let mut input = InputSignal::new(250.0);
        input.pointer_down(100.0, 0.0);
        input.pointer_move(400.0, 10.0);
        input.reset(250.0);
        assert_eq!(input.target_y, 250.0);
        assert_eq!(input.swipe_speed, 0.0);
        assert!(!input.is_pressed());
    }
}
