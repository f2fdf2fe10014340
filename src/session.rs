//! Session state machine
//!
//! Governs which presentation phase is active and therefore which subsystems
//! run: the simulation only advances in [`Phase::Playing`]. The intro
//! countdown is a small sequencer owned by the session and advanced by the
//! frame clock; leaving the intro drops it, so no stale step can fire later.

use serde::{Deserialize, Serialize};

use crate::sim::Side;

/// Delay before the first countdown step (ms)
pub const INTRO_LEAD_IN_MS: f64 = 350.0;
/// Gap between countdown steps (ms)
pub const INTRO_STEP_MS: f64 = 780.0;
/// Hold after the last step before play starts (ms)
pub const INTRO_HOLD_MS: f64 = 650.0;

/// One countdown step as shown in the intro overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntroStep {
    pub label: &'static str,
    pub caption: &'static str,
}

pub const INTRO_STEPS: [IntroStep; 4] = [
    IntroStep {
        label: "3",
        caption: "Get ready…",
    },
    IntroStep {
        label: "2",
        caption: "Warm-up's over",
    },
    IntroStep {
        label: "1",
        caption: "The referee is watching",
    },
    IntroStep {
        label: "PLAY",
        caption: "Go!",
    },
];

/// Presentation phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Face selection; simulation paused
    Menu,
    /// Countdown before the first serve
    Intro,
    Playing,
    Paused,
    /// Winner overlay; simulation frozen
    Victory,
}

/// Actions that trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    OpenMenu,
    CloseMenu,
    Start,
    CountdownDone,
    TogglePause,
    VisibilityLost,
    Won(Side),
    Rematch,
    CloseVictory,
}

/// Result of a transition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub accepted: bool,
    pub from: Phase,
    pub to: Phase,
    pub action: SessionAction,
}

impl Transition {
    /// Accepted and the phase actually changed
    pub fn entered(&self, phase: Phase) -> bool {
        self.accepted && self.to == phase && self.from != phase
    }
}

/// Something the countdown wants the presentation to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroCue {
    /// Show step `index`; the last step is the "go"
    Step { index: usize, step: IntroStep },
    /// Hold elapsed, start play
    Finished,
}

impl IntroCue {
    pub fn is_go(&self) -> bool {
        matches!(self, IntroCue::Step { index, .. } if *index == INTRO_STEPS.len() - 1)
    }
}

/// Countdown sequencer
#[derive(Debug, Clone)]
pub struct IntroCountdown {
    started_ms: f64,
    /// Next step to emit
    next: usize,
    finished: bool,
}

impl IntroCountdown {
    pub fn new(now_ms: f64) -> Self {
        Self {
            started_ms: now_ms,
            next: 0,
            finished: false,
        }
    }

    fn step_due_ms(&self, index: usize) -> f64 {
        self.started_ms + INTRO_LEAD_IN_MS + INTRO_STEP_MS * index as f64
    }

    fn finish_due_ms(&self) -> f64 {
        self.step_due_ms(INTRO_STEPS.len() - 1) + INTRO_HOLD_MS
    }

    /// Emit every cue that has come due by `now_ms`, in order
    pub fn advance(&mut self, now_ms: f64) -> Vec<IntroCue> {
        let mut cues = Vec::new();
        while self.next < INTRO_STEPS.len() && now_ms >= self.step_due_ms(self.next) {
            cues.push(IntroCue::Step {
                index: self.next,
                step: INTRO_STEPS[self.next],
            });
            self.next += 1;
        }
        if !self.finished && self.next == INTRO_STEPS.len() && now_ms >= self.finish_due_ms() {
            self.finished = true;
            cues.push(IntroCue::Finished);
        }
        cues
    }

    /// Step currently on screen; the first one is shown during the lead-in
    pub fn current(&self) -> IntroStep {
        INTRO_STEPS[self.next.saturating_sub(1)]
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Session finite state machine
#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    intro_pending: bool,
    intro: Option<IntroCountdown>,
    winner: Option<Side>,
    /// Phase to go back to when the menu is closed
    return_to: Option<Phase>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh page: menu open, intro pending
    pub fn new() -> Self {
        Self {
            phase: Phase::Menu,
            intro_pending: true,
            intro: None,
            winner: None,
            return_to: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn intro_pending(&self) -> bool {
        self.intro_pending
    }

    pub fn intro(&self) -> Option<&IntroCountdown> {
        self.intro.as_ref()
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// The simulation and the computer AI run only while playing
    pub fn is_simulating(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn can_transition(&self, action: SessionAction) -> bool {
        self.get_next_state(action).is_some()
    }

    /// Attempt a transition
    pub fn transition(&mut self, action: SessionAction, now_ms: f64) -> Transition {
        let from = self.phase;

        let Some(to) = self.get_next_state(action) else {
            log::debug!("Rejected {:?} in {:?}", action, from);
            return Transition {
                accepted: false,
                from,
                to: from,
                action,
            };
        };

        self.apply(from, to, action, now_ms);
        self.phase = to;
        log::info!("Session {:?} -> {:?} ({:?})", from, to, action);

        Transition {
            accepted: true,
            from,
            to,
            action,
        }
    }

    /// Advance the countdown; returns the cues that came due
    pub fn advance_intro(&mut self, now_ms: f64) -> Vec<IntroCue> {
        match self.intro.as_mut() {
            Some(intro) if self.phase == Phase::Intro => intro.advance(now_ms),
            _ => Vec::new(),
        }
    }

    /// Status line for the HUD
    pub fn status_text(&self) -> &'static str {
        match self.phase {
            Phase::Menu => "Choose faces",
            Phase::Intro => "Intro",
            Phase::Paused => "Paused",
            Phase::Playing if self.winner.is_some() => "Match over",
            Phase::Playing | Phase::Victory => "",
        }
    }

    /// Countdown step on screen during the intro
    pub fn countdown(&self) -> Option<IntroStep> {
        match (&self.intro, self.phase) {
            (Some(intro), Phase::Intro) => Some(intro.current()),
            _ => None,
        }
    }

    fn apply(&mut self, from: Phase, to: Phase, action: SessionAction, now_ms: f64) {
        // Whatever happens, a countdown never outlives the intro
        if from == Phase::Intro {
            self.intro = None;
        }

        match action {
            SessionAction::Start if to == Phase::Intro => {
                self.intro_pending = false;
                self.intro = Some(IntroCountdown::new(now_ms));
                self.return_to = None;
            }
            SessionAction::Start => self.return_to = None,
            SessionAction::OpenMenu => {
                if from == Phase::Intro {
                    self.intro_pending = true;
                    self.return_to = None;
                } else {
                    self.return_to = Some(from);
                }
            }
            SessionAction::CloseMenu => self.return_to = None,
            SessionAction::Won(side) => self.winner = Some(side),
            SessionAction::Rematch => {
                self.intro_pending = true;
                self.intro = None;
                self.winner = None;
                self.return_to = None;
            }
            SessionAction::CountdownDone
            | SessionAction::TogglePause
            | SessionAction::VisibilityLost
            | SessionAction::CloseVictory => {}
        }
    }

    /// Get next phase for a given action (if valid)
    fn get_next_state(&self, action: SessionAction) -> Option<Phase> {
        match (self.phase, action) {
            // Restart button works everywhere
            (_, SessionAction::Rematch) => Some(Phase::Menu),

            // From Menu
            (Phase::Menu, SessionAction::Start) if self.intro_pending => Some(Phase::Intro),
            (Phase::Menu, SessionAction::Start) => Some(Phase::Playing),
            (Phase::Menu, SessionAction::CloseMenu) => self.return_to,

            // From Intro
            (Phase::Intro, SessionAction::CountdownDone) => Some(Phase::Playing),
            (Phase::Intro, SessionAction::OpenMenu) => Some(Phase::Menu),

            // From Playing
            (Phase::Playing, SessionAction::TogglePause) => Some(Phase::Paused),
            (Phase::Playing, SessionAction::VisibilityLost) => Some(Phase::Paused),
            (Phase::Playing, SessionAction::OpenMenu) => Some(Phase::Menu),
            (Phase::Playing, SessionAction::Won(_)) => Some(Phase::Victory),

            // From Paused
            (Phase::Paused, SessionAction::TogglePause) => Some(Phase::Playing),
            (Phase::Paused, SessionAction::OpenMenu) => Some(Phase::Menu),

            // From Victory
            (Phase::Victory, SessionAction::CloseVictory) => Some(Phase::Playing),

            // Invalid transition
            _ => None,
        }
    }
}
