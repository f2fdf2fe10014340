//! Simulation events to sound and vibration
//!
//! The simulation only reports what happened. This table decides what the
//! player hears and feels for each [`GameEvent`] and countdown cue.

use crate::audio::SoundEffect;
use crate::session::IntroCue;
use crate::sim::GameEvent;

/// Alternating on/off milliseconds for `navigator.vibrate`
pub type HapticPattern = &'static [u32];

pub const HAPTIC_HIT: HapticPattern = &[12];
pub const HAPTIC_SUPER_HIT: HapticPattern = &[20, 30, 20];
pub const HAPTIC_GOAL: HapticPattern = &[18];
pub const HAPTIC_COUNTDOWN: HapticPattern = &[10];
pub const HAPTIC_GO: HapticPattern = &[18, 40, 18];
pub const HAPTIC_VICTORY: HapticPattern = &[25, 40, 25, 40, 25];

/// What to play for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Feedback {
    pub sound: Option<SoundEffect>,
    pub haptic: Option<HapticPattern>,
}

/// Response to a simulation event
pub fn feedback_for(event: &GameEvent) -> Feedback {
    match *event {
        GameEvent::WallBounce { .. } => Feedback {
            sound: Some(SoundEffect::WallBounce),
            haptic: None,
        },
        GameEvent::RacketHit {
            super_hit: true, ..
        } => Feedback {
            sound: Some(SoundEffect::SuperHit),
            haptic: Some(HAPTIC_SUPER_HIT),
        },
        GameEvent::RacketHit { .. } => Feedback {
            sound: Some(SoundEffect::RacketHit),
            haptic: Some(HAPTIC_HIT),
        },
        GameEvent::Goal { scorer } => Feedback {
            sound: Some(SoundEffect::Point(scorer)),
            haptic: Some(HAPTIC_GOAL),
        },
        // Melody and confetti are driven by the session transition
        GameEvent::MatchWon { .. } => Feedback {
            sound: None,
            haptic: Some(HAPTIC_VICTORY),
        },
    }
}

/// Response to a countdown cue
pub fn feedback_for_intro(cue: &IntroCue) -> Feedback {
    match *cue {
        IntroCue::Step { .. } if cue.is_go() => Feedback {
            sound: Some(SoundEffect::CountdownGo),
            haptic: Some(HAPTIC_GO),
        },
        IntroCue::Step { index, .. } => Feedback {
            sound: Some(SoundEffect::CountdownTick(index)),
            haptic: Some(HAPTIC_COUNTDOWN),
        },
        IntroCue::Finished => Feedback::default(),
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::session::INTRO_STEPS;
    use crate::sim::Side;

    #[test]
    fn test_wall_is_silent_to_the_touch() {
        let fb = feedback_for(&GameEvent::WallBounce { pos: Vec2::ZERO });
        assert_eq!(fb.sound, Some(SoundEffect::WallBounce));
        assert_eq!(fb.haptic, None);
    }

    #[test]
    fn test_hits() {
        let normal = feedback_for(&GameEvent::RacketHit {
            side: Side::Computer,
            pos: Vec2::ZERO,
            super_hit: false,
        });
        assert_eq!(normal.sound, Some(SoundEffect::RacketHit));
        assert_eq!(normal.haptic, Some(HAPTIC_HIT));

        let sup = feedback_for(&GameEvent::RacketHit {
            side: Side::Player,
            pos: Vec2::ZERO,
            super_hit: true,
        });
        assert_eq!(sup.sound, Some(SoundEffect::SuperHit));
        assert_eq!(sup.haptic, Some(HAPTIC_SUPER_HIT));
    }

    #[test]
    fn test_goal_sound_depends_on_scorer() {
        let fb = feedback_for(&GameEvent::Goal {
            scorer: Side::Computer,
        });
        assert_eq!(fb.sound, Some(SoundEffect::Point(Side::Computer)));
        assert_eq!(fb.haptic, Some(&[18u32][..]));
    }

    #[test]
    fn test_victory_pattern() {
        let fb = feedback_for(&GameEvent::MatchWon {
            winner: Side::Player,
        });
        assert_eq!(fb.haptic, Some(HAPTIC_VICTORY));
        assert!(fb.sound.is_none());
    }

    #[test]
    fn test_countdown_feedback() {
        let tick = feedback_for_intro(&IntroCue::Step {
            index: 1,
            step: INTRO_STEPS[1],
        });
        assert_eq!(tick.sound, Some(SoundEffect::CountdownTick(1)));
        assert_eq!(tick.haptic, Some(HAPTIC_COUNTDOWN));

        let go = feedback_for_intro(&IntroCue::Step {
            index: 3,
            step: INTRO_STEPS[3],
        });
        assert_eq!(go.sound, Some(SoundEffect::CountdownGo));
        assert_eq!(go.haptic, Some(HAPTIC_GO));

        assert_eq!(feedback_for_intro(&IntroCue::Finished), Feedback::default());
    }
}
