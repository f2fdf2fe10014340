//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Time comes in as arguments, never read from the platform
//! - No rendering, audio or platform dependencies; side effects leave as [`GameEvent`]s

pub mod effects;
pub mod geometry;
pub mod state;
pub mod tick;

pub use effects::{Effects, MAX_PARTICLES, Particle, Tint, TrailPoint};
pub use geometry::{Rect, circle_rect_collision};
pub use state::{
    Ball, Banner, Controller, GameEvent, GameState, Paddle, Racket, RacketPose, Score, Side,
    World,
};
pub use tick::simulate;
