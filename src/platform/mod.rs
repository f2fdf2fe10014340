//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Pointer input, reduced to a target y and a swipe speed
//! - Haptics (Vibration API on web, no-op elsewhere)

pub mod haptics;
pub mod input;

pub use input::InputSignal;
