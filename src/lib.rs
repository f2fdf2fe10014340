//! Swipe Pong - face-paddle Pong against the computer
//!
//! Core modules:
//! - `sim`: Simulation step (physics, collisions, scoring, particles)
//! - `session`: Menu / intro / play / pause / victory state machine
//! - `audio`: Procedural audio (tones, crowd bed, victory melody)
//! - `feedback`: Maps simulation events to sound and haptic requests
//! - `game`: `GameContext` that owns everything and drives a frame
//! - `renderer`: Letterbox projector and WebGPU SDF pipeline
//! - `platform`: Input signal and haptics shims

pub mod audio;
pub mod avatars;
pub mod feedback;
pub mod game;
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use game::{GameContext, RenderView};
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Logical world size (independent of device pixels)
    pub const WORLD_WIDTH: f32 = 900.0;
    pub const WORLD_HEIGHT: f32 = 500.0;
    /// Court inset from the world edges
    pub const COURT_PADDING: f32 = 40.0;

    /// Largest frame delta fed to the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Points needed to win a match
    pub const WIN_SCORE: u32 = 10;

    /// Paddle body/face
    pub const PADDLE_RADIUS: f32 = 26.0;
    pub const FACE_RADIUS: f32 = 18.0;
    /// Distance of each paddle from its own side of the world
    pub const PADDLE_INSET: f32 = 140.0;
    /// Racket geometry, offset is toward the net
    pub const RACKET_WIDTH: f32 = 10.0;
    pub const RACKET_HEIGHT: f32 = 60.0;
    pub const RACKET_OFFSET: f32 = 30.0;

    /// Computer paddle chase speed (world units/s)
    pub const CPU_SPEED: f32 = 260.0;
    /// Fraction of chase speed used while drifting back to center
    pub const CPU_RETURN_FACTOR: f32 = 0.55;

    /// Max paddle tilt (radians), purely cosmetic
    pub const MAX_TILT: f32 = 0.22;
    /// Vertical ball offset that produces full tilt
    pub const TILT_RANGE: f32 = 220.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 10.0;
    pub const BALL_MAX_SPEED: f32 = 720.0;
    /// Serve speed, also the floor after any racket bounce
    pub const SERVE_SPEED: f32 = 420.0;
    /// Serve angle spread either side of horizontal (radians)
    pub const SERVE_ANGLE_SPREAD: f32 = 0.45;
    /// Speed multiplier on every racket bounce
    pub const HIT_SPEEDUP: f32 = 1.04;
    /// Max deflection at the racket tips (radians)
    pub const HIT_ANGLE_RANGE: f32 = 0.9;
    /// How far past the world edge the ball must travel to score
    pub const GOAL_MARGIN: f32 = 50.0;

    /// Super-hit tuning
    pub const SUPER_SWIPE_THRESHOLD: f32 = 1100.0;
    pub const SUPER_HIT_BOOST: f32 = 1.35;
    pub const SUPER_MIN_SPEED: f32 = 520.0;
    pub const SUPER_WINDOW_MS: f64 = 1200.0;

    /// Exponential smoothing bases (fraction left after one second)
    pub const SWIPE_DECAY_BASE: f32 = 0.0006;
    pub const PLAYER_EASE_BASE: f32 = 0.0001;
    pub const TILT_EASE_BASE: f32 = 0.001;

    /// Trail ring buffer
    pub const TRAIL_CAPACITY: usize = 26;
    pub const TRAIL_LIFE: f32 = 0.18;

    /// Banner durations
    pub const POINT_MESSAGE_MS: f64 = 900.0;
    pub const SUPER_MESSAGE_MS: f64 = 650.0;
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Frame-rate independent easing factor: `1 - base^dt`.
///
/// Feeding this into [`lerp`] every frame leaves `base^T` of the initial gap
/// after a total of `T` seconds, whatever the individual frame lengths were.
#[inline]
pub fn smoothing(base: f32, dt: f32) -> f32 {
    1.0 - base.powf(dt)
}

/// Ease `current` toward `target` using [`smoothing`]
#[inline]
pub fn approach(current: f32, target: f32, base: f32, dt: f32) -> f32 {
    lerp(current, target, smoothing(base, dt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
        assert!((lerp(-4.0, 4.0, 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_smoothing_zero_dt_is_still() {
        assert_eq!(smoothing(consts::PLAYER_EASE_BASE, 0.0), 0.0);
        assert_eq!(approach(3.0, 100.0, consts::PLAYER_EASE_BASE, 0.0), 3.0);
    }

    #[test]
    fn test_player_ease_settles_within_a_second_of_frames() {
        // 60 Hz frames: the gap must shrink to under one world unit well inside a second
        let mut y = 66.0_f32;
        let target = 434.0;
        let mut frames = 0;
        while (target - y).abs() > 1.0 {
            y = approach(y, target, consts::PLAYER_EASE_BASE, 1.0 / 60.0);
            frames += 1;
            assert!(frames < 60, "easing took too long");
        }
        // Never teleports on the first frame
        let first = approach(66.0, target, consts::PLAYER_EASE_BASE, 1.0 / 60.0);
        assert!(first < target - 100.0);
    }

    proptest! {
        #[test]
        fn smoothing_is_frame_rate_independent(
            gap in 10.0f32..500.0,
            frames in 5usize..120,
        ) {
            // Same total time split into `frames` steps vs one step
            let total = 0.5f32;
            let dt = total / frames as f32;
            let mut current = 0.0f32;
            for _ in 0..frames {
                current = approach(current, gap, consts::TILT_EASE_BASE, dt);
            }
            let single = approach(0.0, gap, consts::TILT_EASE_BASE, total);
            prop_assert!((current - single).abs() < gap * 1e-3);
        }

        #[test]
        fn smoothing_never_overshoots(
            start in -500.0f32..500.0,
            target in -500.0f32..500.0,
            dt in 0.0f32..0.033,
        ) {
            let next = approach(start, target, consts::SWIPE_DECAY_BASE, dt);
            let (lo, hi) = if start < target { (start, target) } else { (target, start) };
            prop_assert!(next >= lo - 1e-3 && next <= hi + 1e-3);
        }
    }
}
