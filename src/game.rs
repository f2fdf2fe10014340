//! Game context: owns all state and drives one frame
//!
//! The host forwards DOM events to the action methods below and calls
//! [`GameContext::frame`] from `requestAnimationFrame`. Everything observable
//! comes back out through [`GameContext::render_view`],
//! [`GameContext::drain_haptics`] and the audio backend.

use std::collections::VecDeque;

use crate::audio::{AudioEngine, AudioOpener, CrowdCue};
use crate::avatars::{AvatarCatalog, AvatarSelection};
use crate::consts::MAX_FRAME_DT;
use crate::feedback::{Feedback, HapticPattern, feedback_for, feedback_for_intro};
use crate::platform::InputSignal;
use crate::session::{IntroCue, IntroStep, Phase, Session, SessionAction, Transition};
use crate::settings::Settings;
use crate::sim::{
    Ball, GameEvent, GameState, Paddle, Particle, RacketPose, Score, Side, TrailPoint, World,
    simulate,
};

/// Audio RNG stream, kept apart from the simulation's
const AUDIO_SEED_SALT: u64 = 0x5eed_a0d1_0000_0001;

/// Winner overlay copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VictoryText {
    pub title: &'static str,
    pub name: &'static str,
}

impl VictoryText {
    pub fn for_winner(winner: Side) -> Self {
        match winner {
            Side::Player => Self {
                title: "YOU ARE THE CHAMPION!",
                name: "Champion: You",
            },
            Side::Computer => Self {
                title: "CPU WINS!",
                name: "Champion: CPU",
            },
        }
    }
}

/// Read-only snapshot for the renderer and HUD
#[derive(Debug)]
pub struct RenderView<'a> {
    pub phase: Phase,
    pub world: &'a World,
    pub ball: &'a Ball,
    pub player: &'a Paddle,
    pub computer: &'a Paddle,
    pub player_racket: RacketPose,
    pub computer_racket: RacketPose,
    pub particles: &'a [Particle],
    pub trail: &'a VecDeque<TrailPoint>,
    pub score: Score,
    /// In-court banner ("Point to you!")
    pub banner: Option<&'static str>,
    pub status: &'static str,
    pub countdown: Option<IntroStep>,
    /// Victory overlay is up
    pub victory: Option<VictoryText>,
    pub super_active: bool,
}

impl RenderView<'_> {
    pub fn score_text(&self) -> String {
        format!("{} : {}", self.score.player, self.score.computer)
    }
}

/// Everything for one page session
pub struct GameContext {
    state: GameState,
    session: Session,
    input: InputSignal,
    audio: AudioEngine,
    settings: Settings,
    avatars: AvatarCatalog,
    selection: AvatarSelection,
    haptics: Vec<HapticPattern>,
    last_frame_ms: Option<f64>,
}

impl GameContext {
    pub fn new(seed: u64, settings: Settings, audio_opener: AudioOpener) -> Self {
        let mut state = GameState::new(seed);
        state.effects.set_particle_cap(settings.max_particles());
        let input = InputSignal::new(state.player.pos.y);
        let avatars = AvatarCatalog::default();
        let selection = avatars.default_selection();

        let mut ctx = Self {
            state,
            session: Session::new(),
            input,
            audio: AudioEngine::new(seed ^ AUDIO_SEED_SALT, audio_opener),
            settings: Settings::default(),
            avatars,
            selection,
            haptics: Vec::new(),
            last_frame_ms: None,
        };
        ctx.apply_settings(settings);
        log::info!("Game initialized with seed: {}", seed);
        ctx
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access for tooling and scripted scenarios
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn avatars(&self) -> &AvatarCatalog {
        &self.avatars
    }

    pub fn selection(&self) -> &AvatarSelection {
        &self.selection
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        self.state
            .effects
            .set_particle_cap(settings.max_particles());
        if !settings.trails {
            self.state.effects.clear_trail();
        }
        self.audio.set_master_volume(settings.master_volume);
        self.audio.set_sfx_volume(settings.sfx_volume);
        self.audio.set_crowd_volume(settings.crowd_volume);
        self.audio.set_muted(settings.muted);
        self.settings = settings;
    }

    /// Install the loaded faces and pick defaults
    pub fn set_avatars(&mut self, catalog: AvatarCatalog) {
        self.selection = catalog.default_selection();
        self.avatars = catalog;
    }

    pub fn select_avatar(&mut self, side: Side, src: &str) -> bool {
        self.avatars.select(&mut self.selection, side, src)
    }

    /// Pending vibration patterns, oldest first
    pub fn drain_haptics(&mut self) -> Vec<HapticPattern> {
        std::mem::take(&mut self.haptics)
    }

    /// Advance everything to `now_ms`; returns what the simulation reported
    pub fn frame(&mut self, now_ms: f64) -> Vec<GameEvent> {
        let dt = match self.last_frame_ms {
            Some(last) => (((now_ms - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);

        for cue in self.session.advance_intro(now_ms) {
            self.dispatch(feedback_for_intro(&cue));
            if cue == IntroCue::Finished {
                self.finish_intro(now_ms);
            }
        }

        let events = if self.session.is_simulating() {
            simulate(&mut self.state, &mut self.input, dt, now_ms)
        } else {
            Vec::new()
        };
        for event in &events {
            self.dispatch(feedback_for(event));
            if let GameEvent::MatchWon { winner } = *event {
                self.match_won(winner, now_ms);
            }
        }

        if !self.settings.trails {
            self.state.effects.clear_trail();
        }
        self.state.effects.update(dt);
        self.audio.tick(now_ms);

        events
    }

    fn dispatch(&mut self, feedback: Feedback) {
        if let Some(sound) = feedback.sound {
            self.audio.play(sound);
        }
        if let Some(pattern) = feedback.haptic
            && self.settings.haptics
        {
            self.haptics.push(pattern);
        }
    }

    fn transition(&mut self, action: SessionAction, now_ms: f64) -> Transition {
        self.session.transition(action, now_ms)
    }

    fn finish_intro(&mut self, now_ms: f64) {
        if self
            .transition(SessionAction::CountdownDone, now_ms)
            .accepted
        {
            let dir = self.state.random_direction();
            self.state.reset_ball(dir);
            self.audio.set_crowd(CrowdCue::Kickoff, now_ms);
        }
    }

    fn match_won(&mut self, winner: Side, now_ms: f64) {
        if !self.transition(SessionAction::Won(winner), now_ms).accepted {
            return;
        }
        self.state.celebrate();
        self.audio.set_crowd(CrowdCue::Victory, now_ms);
        self.audio.start_victory_melody(now_ms);
    }

    /// Crowd level for wherever a transition landed
    fn crowd_for(&mut self, t: Transition, now_ms: f64) {
        if !t.accepted {
            return;
        }
        let cue = match t.to {
            Phase::Menu => CrowdCue::Menu,
            Phase::Intro => CrowdCue::Intro,
            Phase::Playing => CrowdCue::Playing,
            Phase::Paused => CrowdCue::Paused,
            Phase::Victory => CrowdCue::Victory,
        };
        self.audio.set_crowd(cue, now_ms);
    }

    // === User actions ===

    /// "Start" in the face menu
    pub fn start(&mut self, now_ms: f64) -> Transition {
        self.audio.ensure_started();
        let t = self.transition(SessionAction::Start, now_ms);
        self.crowd_for(t, now_ms);
        t
    }

    pub fn toggle_pause(&mut self, now_ms: f64) -> Transition {
        self.audio.ensure_started();
        let t = self.transition(SessionAction::TogglePause, now_ms);
        self.crowd_for(t, now_ms);
        t
    }

    pub fn open_menu(&mut self, now_ms: f64) -> Transition {
        self.audio.ensure_started();
        let t = self.transition(SessionAction::OpenMenu, now_ms);
        self.crowd_for(t, now_ms);
        t
    }

    pub fn close_menu(&mut self, now_ms: f64) -> Transition {
        let t = self.transition(SessionAction::CloseMenu, now_ms);
        self.crowd_for(t, now_ms);
        t
    }

    /// Restart button and "play again": zero score, back to the menu
    pub fn rematch(&mut self, now_ms: f64) -> Transition {
        self.audio.ensure_started();
        self.audio.stop_victory_melody();
        let t = self.transition(SessionAction::Rematch, now_ms);
        self.state.reset_match();
        self.input.reset(self.state.player.pos.y);
        self.crowd_for(t, now_ms);
        t
    }

    /// Dismiss the winner overlay; the finished match stays on screen
    pub fn close_victory(&mut self, now_ms: f64) -> Transition {
        self.audio.ensure_started();
        let t = self.transition(SessionAction::CloseVictory, now_ms);
        if t.accepted {
            self.audio.stop_victory_melody();
        }
        t
    }

    /// Tab hidden: pause play and duck the crowd whatever the phase
    pub fn visibility_lost(&mut self, now_ms: f64) -> Transition {
        self.input.pointer_up();
        let t = self.transition(SessionAction::VisibilityLost, now_ms);
        if t.accepted {
            log::info!("Auto-paused (tab hidden)");
        }
        self.audio.set_crowd(CrowdCue::Hidden, now_ms);
        t
    }

    /// Any tap on an overlay counts as the gesture that unlocks audio
    pub fn user_gesture(&mut self) {
        self.audio.ensure_started();
    }

    pub fn pointer_down(&mut self, world_y: f32, now_ms: f64) {
        self.audio.ensure_started();
        self.input.pointer_down(world_y, now_ms);
    }

    pub fn pointer_move(&mut self, world_y: f32, now_ms: f64) {
        self.input.pointer_move(world_y, now_ms);
    }

    pub fn pointer_up(&mut self) {
        self.input.pointer_up();
    }

    pub fn input(&self) -> &InputSignal {
        &self.input
    }

    pub fn render_view(&self, now_ms: f64) -> RenderView<'_> {
        let state = &self.state;
        let ball_y = state.ball.pos.y;
        let victory = match (self.session.phase(), self.session.winner()) {
            (Phase::Victory, Some(winner)) => Some(VictoryText::for_winner(winner)),
            _ => None,
        };

        RenderView {
            phase: self.session.phase(),
            world: &state.world,
            ball: &state.ball,
            player: &state.player,
            computer: &state.computer,
            player_racket: state.player.racket_pose(ball_y, now_ms),
            computer_racket: state.computer.racket_pose(ball_y, now_ms),
            particles: &state.effects.particles,
            trail: &state.effects.trail,
            score: state.score,
            banner: state.message.as_ref().map(|m| m.text),
            status: self.session.status_text(),
            countdown: self.session.countdown(),
            victory,
            super_active: state.ball.is_super(now_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::audio::testing::{CallLog, recording_opener, tones};
    use crate::avatars::{AVATAR_FILES, AvatarEntry};
    use crate::consts::*;
    use crate::feedback::{HAPTIC_GO, HAPTIC_VICTORY};
    use crate::session::{INTRO_HOLD_MS, INTRO_LEAD_IN_MS, INTRO_STEP_MS};

    const FRAME_MS: f64 = 16.0;

    fn context() -> (GameContext, CallLog) {
        let (opener, log) = recording_opener();
        (GameContext::new(7, Settings::default(), opener), log)
    }

    /// Run frames until `until_ms`, returning the time reached
    fn run(ctx: &mut GameContext, from_ms: f64, until_ms: f64) -> f64 {
        let mut now = from_ms;
        while now < until_ms {
            now += FRAME_MS;
            ctx.frame(now);
        }
        now
    }

    fn through_intro(ctx: &mut GameContext) -> f64 {
        ctx.frame(0.0);
        ctx.start(0.0);
        let end = INTRO_LEAD_IN_MS + INTRO_STEP_MS * 3.0 + INTRO_HOLD_MS;
        let now = run(ctx, 0.0, end + FRAME_MS);
        assert_eq!(ctx.phase(), Phase::Playing);
        now
    }

    #[test]
    fn test_menu_does_not_simulate() {
        let (mut ctx, _) = context();
        let ball = ctx.state().ball.pos;
        run(&mut ctx, 0.0, 500.0);
        assert_eq!(ctx.state().ball.pos, ball);
        assert_eq!(ctx.render_view(0.0).status, "Choose faces");
    }

    #[test]
    fn test_intro_plays_countdown_then_starts() {
        let (mut ctx, log) = context();
        ctx.frame(0.0);
        ctx.start(0.0);
        assert_eq!(ctx.phase(), Phase::Intro);
        assert_eq!(ctx.render_view(0.0).countdown.map(|c| c.label), Some("3"));

        through_intro_from(&mut ctx, 0.0);
        assert_eq!(ctx.phase(), Phase::Playing);

        let haptics = ctx.drain_haptics();
        assert_eq!(haptics.len(), 4);
        assert_eq!(haptics[3], HAPTIC_GO);
        // 3 ticks + 2-tone go
        assert_eq!(tones(&log).len(), 5);
        assert!(ctx.drain_haptics().is_empty());
    }

    fn through_intro_from(ctx: &mut GameContext, start: f64) -> f64 {
        let end = start + INTRO_LEAD_IN_MS + INTRO_STEP_MS * 3.0 + INTRO_HOLD_MS;
        run(ctx, start, end + FRAME_MS)
    }

    #[test]
    fn test_ball_moves_once_playing() {
        let (mut ctx, _) = context();
        let now = through_intro(&mut ctx);
        let before = ctx.state().ball.pos;
        ctx.frame(now + FRAME_MS);
        assert_ne!(ctx.state().ball.pos, before);
    }

    #[test]
    fn test_pause_freezes_ball() {
        let (mut ctx, _) = context();
        let now = through_intro(&mut ctx);
        ctx.toggle_pause(now);
        let frozen = ctx.state().ball.pos;
        ctx.frame(now + FRAME_MS);
        ctx.frame(now + 2.0 * FRAME_MS);
        assert_eq!(ctx.state().ball.pos, frozen);
        assert_eq!(ctx.render_view(now).status, "Paused");
    }

    #[test]
    fn test_resume_after_long_pause_is_clamped() {
        let (mut ctx, _) = context();
        let now = through_intro(&mut ctx);
        ctx.toggle_pause(now);
        ctx.toggle_pause(now + 60_000.0);

        let before = ctx.state().ball.clone();
        ctx.frame(now + 60_000.0);
        let moved = ctx.state().ball.pos.distance(before.pos);
        assert!(moved <= before.speed() * MAX_FRAME_DT + 1e-3);
    }

    #[test]
    fn test_visibility_loss_pauses_and_ducks() {
        let (mut ctx, _) = context();
        let now = through_intro(&mut ctx);
        let t = ctx.visibility_lost(now);
        assert!(t.accepted);
        assert_eq!(ctx.phase(), Phase::Paused);
        assert_eq!(ctx.audio().crowd_level(), CrowdCue::Hidden.level());
    }

    #[test]
    fn test_match_won_shows_victory_and_plays_melody() {
        let (mut ctx, log) = context();
        let now = through_intro(&mut ctx);
        ctx.drain_haptics();

        ctx.state.score.player = WIN_SCORE - 1;
        ctx.state.ball.pos = Vec2::new(WORLD_WIDTH + GOAL_MARGIN - 1.0, 250.0);
        ctx.state.ball.vel = Vec2::new(400.0, 0.0);
        let events = ctx.frame(now + FRAME_MS);

        assert!(events.contains(&GameEvent::MatchWon { winner: Side::Player }));
        assert_eq!(ctx.phase(), Phase::Victory);
        assert!(ctx.audio().melody_playing());
        assert!(ctx.drain_haptics().contains(&HAPTIC_VICTORY));
        let view = ctx.render_view(now);
        assert_eq!(view.victory.map(|v| v.name), Some("Champion: You"));
        assert!(view.particles.len() > 100);

        let before = tones(&log).len();
        run(&mut ctx, now + FRAME_MS, now + 1000.0);
        assert!(tones(&log).len() > before);

        // Pause is ignored, close keeps the score and stops the tune
        assert!(!ctx.toggle_pause(now + 1000.0).accepted);
        ctx.close_victory(now + 1000.0);
        assert_eq!(ctx.phase(), Phase::Playing);
        assert!(!ctx.audio().melody_playing());
        assert_eq!(ctx.state().score.player, WIN_SCORE);
        assert_eq!(ctx.render_view(now).status, "Match over");

        let frozen = ctx.state().ball.pos;
        ctx.frame(now + 1100.0);
        assert_eq!(ctx.state().ball.pos, frozen);
    }

    #[test]
    fn test_rematch_resets() {
        let (mut ctx, _) = context();
        let now = through_intro(&mut ctx);
        ctx.state.score = Score {
            player: 4,
            computer: 6,
        };
        ctx.rematch(now);
        assert_eq!(ctx.phase(), Phase::Menu);
        assert_eq!(ctx.state().score, Score::default());
        assert!(ctx.session().intro_pending());
        assert!(ctx.state().running);
    }

    #[test]
    fn test_haptics_respect_settings() {
        let (opener, _) = recording_opener();
        let settings = Settings {
            haptics: false,
            ..Settings::default()
        };
        let mut ctx = GameContext::new(3, settings, opener);
        through_intro(&mut ctx);
        assert!(ctx.drain_haptics().is_empty());
    }

    #[test]
    fn test_avatars_and_selection() {
        let (mut ctx, _) = context();
        assert_eq!(ctx.selection().player, "assets/face_player.png");

        let catalog = AvatarCatalog::from_results(
            AVATAR_FILES
                .iter()
                .enumerate()
                .map(|(i, src)| AvatarEntry::new(*src, i >= 2)),
        );
        ctx.set_avatars(catalog);
        assert_eq!(ctx.selection().player, "assets/face_1.png");
        assert_eq!(ctx.selection().computer, "assets/face_2.png");
        assert!(ctx.select_avatar(Side::Player, "assets/face_4.png"));
        assert!(!ctx.select_avatar(Side::Player, "assets/face_cpu.png"));
        assert_eq!(ctx.selection().player, "assets/face_4.png");
    }

    #[test]
    fn test_swipe_feeds_player_target() {
        let (mut ctx, _) = context();
        let now = through_intro(&mut ctx);
        ctx.pointer_down(250.0, now);
        ctx.pointer_move(400.0, now + 10.0);
        assert_eq!(ctx.input().target_y, 400.0);
        assert!(ctx.input().swipe_speed > SUPER_SWIPE_THRESHOLD);
        run(&mut ctx, now, now + 1000.0);
        assert!(ctx.state().player.pos.y > 380.0);
    }

    #[test]
    fn test_particles_disabled_by_settings() {
        let (opener, _) = recording_opener();
        let settings = Settings {
            particles: false,
            ..Settings::default()
        };
        let mut ctx = GameContext::new(3, settings, opener);
        ctx.state.celebrate();
        assert!(ctx.state().effects.particles.is_empty());
    }
}
