//! Procedural audio: sound effects, crowd bed and victory melody
//!
//! No sample files. Every sound is a short oscillator [`Tone`], the crowd is a
//! looping buffer of generated pink-ish noise, and the victory tune is a
//! [`MelodySequencer`] advanced by the frame clock.
//!
//! The engine talks to the platform through [`AudioBackend`]. The backend is
//! only created on the first user gesture ([`AudioEngine::ensure_started`]);
//! until then, and forever on platforms without audio, every call is a no-op.

#[cfg(target_arch = "wasm32")]
pub mod web;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::Side;

/// Quietest gain an exponential ramp may reach
pub const GAIN_FLOOR: f32 = 0.0001;
/// Extra time a note's oscillator keeps running after its decay
const NOTE_TAIL: f64 = 0.02;
/// Attack for melody notes (seconds)
const NOTE_ATTACK: f64 = 0.01;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A single oscillator burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    /// Decay end (seconds)
    pub duration: f64,
    pub waveform: Waveform,
    /// Peak gain before volume scaling
    pub gain: f32,
    /// Linear attack from the floor (seconds); 0 starts at peak
    pub attack: f64,
}

impl Tone {
    /// Percussive blip: starts at peak, decays exponentially
    pub fn beep(freq: f32, duration: f64, waveform: Waveform, gain: f32) -> Self {
        Self {
            freq,
            duration,
            waveform,
            gain,
            attack: 0.0,
        }
    }

    /// Musical note with a short attack
    pub fn note(midi: i32, duration: f64, waveform: Waveform, gain: f32) -> Self {
        Self {
            freq: midi_to_freq(midi),
            duration,
            waveform,
            gain,
            attack: NOTE_ATTACK,
        }
    }

    /// When the oscillator is stopped, relative to its start
    pub fn stop_after(&self) -> f64 {
        if self.attack > 0.0 {
            self.duration + NOTE_TAIL
        } else {
            self.duration
        }
    }
}

/// Equal temperament, A4 = 440 Hz
pub fn midi_to_freq(midi: i32) -> f32 {
    440.0 * 2f32.powf((midi - 69) as f32 / 12.0)
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Ball hits top/bottom wall
    WallBounce,
    /// Normal racket hit
    RacketHit,
    /// Player racket hit during a fast swipe
    SuperHit,
    /// Point scored by the given side
    Point(Side),
    /// Countdown step `i` (0 = "3")
    CountdownTick(usize),
    /// Final countdown step
    CountdownGo,
}

impl SoundEffect {
    /// Tones making up this effect; the hit pitch is jittered from `rng`
    pub fn tones(&self, rng: &mut Pcg32) -> Vec<Tone> {
        match *self {
            SoundEffect::WallBounce => vec![Tone::beep(260.0, 0.03, Waveform::Triangle, 0.03)],
            SoundEffect::RacketHit => {
                let freq = 520.0 + rng.random::<f32>() * 160.0;
                vec![Tone::beep(freq, 0.05, Waveform::Square, 0.04)]
            }
            SoundEffect::SuperHit => vec![
                Tone::beep(920.0, 0.05, Waveform::Sawtooth, 0.06),
                Tone::beep(620.0, 0.08, Waveform::Square, 0.04),
            ],
            SoundEffect::Point(Side::Player) => {
                vec![Tone::beep(740.0, 0.12, Waveform::Triangle, 0.05)]
            }
            SoundEffect::Point(Side::Computer) => {
                vec![Tone::beep(330.0, 0.12, Waveform::Triangle, 0.05)]
            }
            SoundEffect::CountdownTick(step) => {
                let freq = 420.0 + 90.0 * step as f32;
                vec![Tone::beep(freq, 0.08, Waveform::Triangle, 0.05)]
            }
            SoundEffect::CountdownGo => vec![
                Tone::beep(880.0, 0.14, Waveform::Sine, 0.06),
                Tone::beep(660.0, 0.10, Waveform::Triangle, 0.04),
            ],
        }
    }
}

/// A crowd gain target and how long to ramp there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrowdLevel {
    pub volume: f32,
    pub ramp_secs: f64,
}

impl CrowdLevel {
    pub const fn new(volume: f32, ramp_secs: f64) -> Self {
        Self { volume, ramp_secs }
    }
}

/// Where the session wants the crowd
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrowdCue {
    Menu,
    Intro,
    Playing,
    Paused,
    /// Tab hidden
    Hidden,
    Victory,
    /// Swell at the first serve, then settle back to the playing level
    Kickoff,
}

/// Delay before the kickoff swell settles (ms)
const KICKOFF_SETTLE_MS: f64 = 260.0;
const KICKOFF_SETTLE: CrowdLevel = CrowdLevel::new(0.12, 0.65);

impl CrowdCue {
    /// Immediate ramp for this cue
    pub fn level(&self) -> CrowdLevel {
        match self {
            CrowdCue::Menu => CrowdLevel::new(0.0, 0.25),
            CrowdCue::Intro => CrowdLevel::new(0.07, 0.5),
            CrowdCue::Playing => CrowdLevel::new(0.12, 0.5),
            CrowdCue::Paused => CrowdLevel::new(0.04, 0.35),
            CrowdCue::Hidden => CrowdLevel::new(0.03, 0.3),
            CrowdCue::Victory => CrowdLevel::new(0.03, 0.4),
            CrowdCue::Kickoff => CrowdLevel::new(0.18, 0.15),
        }
    }
}

/// Crowd bed graph parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrowdBed {
    pub noise_secs: f32,
    pub highpass_hz: f32,
    pub lowpass_hz: f32,
    pub lfo_hz: f32,
    pub lfo_depth: f32,
}

pub const CROWD_BED: CrowdBed = CrowdBed {
    noise_secs: 2.0,
    highpass_hz: 250.0,
    lowpass_hz: 2200.0,
    lfo_hz: 0.12,
    lfo_depth: 0.06,
};

/// White noise through three leaky integrators, roughly -3 dB/octave
pub fn pink_noise(rng: &mut Pcg32, len: usize) -> Vec<f32> {
    let (mut b0, mut b1, mut b2) = (0.0f32, 0.0f32, 0.0f32);
    (0..len)
        .map(|_| {
            let white = rng.random::<f32>() * 2.0 - 1.0;
            b0 = 0.99765 * b0 + white * 0.0990460;
            b1 = 0.96300 * b1 + white * 0.2965164;
            b2 = 0.57000 * b2 + white * 1.0526913;
            (b0 + b1 + b2 + white * 0.1848) * 0.12
        })
        .collect()
}

/// Melody step (ms)
pub const MELODY_STEP_MS: f64 = 170.0;

/// (midi, seconds, gain)
const MELODY: [(i32, f64, f32); 13] = [
    (72, 0.16, 0.06),
    (76, 0.16, 0.05),
    (79, 0.18, 0.05),
    (74, 0.16, 0.06),
    (77, 0.16, 0.05),
    (81, 0.18, 0.05),
    (76, 0.16, 0.06),
    (79, 0.16, 0.05),
    (83, 0.18, 0.05),
    (79, 0.14, 0.06),
    (76, 0.14, 0.05),
    (74, 0.14, 0.05),
    (72, 0.22, 0.06),
];

/// Looping victory tune, one step per `MELODY_STEP_MS`
#[derive(Debug, Clone)]
pub struct MelodySequencer {
    step: usize,
    next_due_ms: f64,
}

impl MelodySequencer {
    pub fn new(now_ms: f64) -> Self {
        Self {
            step: 0,
            next_due_ms: now_ms + MELODY_STEP_MS,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Tones for the step that came due, if any
    ///
    /// Plays at most one step per call. After a stall the missed steps are
    /// skipped instead of bunched up.
    pub fn advance(&mut self, now_ms: f64) -> Vec<Tone> {
        if now_ms < self.next_due_ms {
            return Vec::new();
        }

        let (midi, dur, gain) = MELODY[self.step % MELODY.len()];
        let mut tones = vec![Tone::note(midi, dur, Waveform::Triangle, gain)];
        if self.step % 2 == 0 {
            tones.push(Tone::note(midi - 24, 0.20, Waveform::Sine, 0.035));
        }

        self.step += 1;
        self.next_due_ms += MELODY_STEP_MS;
        if self.next_due_ms <= now_ms {
            self.next_due_ms = now_ms + MELODY_STEP_MS;
        }
        tones
    }
}

/// Platform audio graph
pub trait AudioBackend {
    /// Resume a suspended context (needs a user gesture on the web)
    fn resume(&self);

    fn sample_rate(&self) -> f32;

    /// Fire-and-forget oscillator burst; `volume` scales the tone gain
    fn play_tone(&mut self, tone: &Tone, volume: f32);

    /// Build the looping crowd graph, silent at first. False if it can't.
    fn start_crowd(&mut self, noise: &[f32], bed: &CrowdBed) -> bool;

    /// Cancel pending crowd ramps and ramp the bed gain and the LFO depth
    /// linearly from their current values
    fn ramp_crowd(&mut self, volume: f32, lfo_depth: f32, ramp_secs: f64);
}

/// Creates the backend on first use
pub type AudioOpener = Box<dyn FnOnce() -> Option<Box<dyn AudioBackend>>>;

/// Audio manager for the game
pub struct AudioEngine {
    opener: Option<AudioOpener>,
    backend: Option<Box<dyn AudioBackend>>,
    crowd_started: bool,
    /// Last requested crowd level, before volume scaling
    crowd_level: CrowdLevel,
    /// Kickoff settle ramp waiting for its time
    pending_crowd: Option<(f64, CrowdLevel)>,
    melody: Option<MelodySequencer>,
    rng: Pcg32,
    master_volume: f32,
    sfx_volume: f32,
    crowd_volume: f32,
    muted: bool,
}

impl AudioEngine {
    pub fn new(seed: u64, opener: AudioOpener) -> Self {
        Self {
            opener: Some(opener),
            backend: None,
            crowd_started: false,
            crowd_level: CrowdCue::Menu.level(),
            pending_crowd: None,
            melody: None,
            rng: Pcg32::seed_from_u64(seed),
            master_volume: 0.8,
            sfx_volume: 1.0,
            crowd_volume: 1.0,
            muted: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn crowd_started(&self) -> bool {
        self.crowd_started
    }

    pub fn crowd_level(&self) -> CrowdLevel {
        self.crowd_level
    }

    pub fn melody_playing(&self) -> bool {
        self.melody.is_some()
    }

    /// Call from every user gesture: opens the backend once, then just resumes
    pub fn ensure_started(&mut self) {
        if let Some(open) = self.opener.take() {
            self.backend = open();
            if self.backend.is_some() {
                log::info!("Audio enabled");
            } else {
                log::warn!("Audio unavailable - continuing without sound");
            }
        }

        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        backend.resume();

        if !self.crowd_started {
            let len = (backend.sample_rate() * CROWD_BED.noise_secs) as usize;
            let noise = pink_noise(&mut self.rng, len);
            self.crowd_started = backend.start_crowd(&noise, &CROWD_BED);
            if self.crowd_started {
                self.apply_crowd(self.crowd_level);
            } else {
                log::warn!("Crowd ambience unavailable");
            }
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
        self.apply_crowd(self.crowd_level);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set crowd volume (0.0 - 1.0)
    pub fn set_crowd_volume(&mut self, vol: f32) {
        self.crowd_volume = vol.clamp(0.0, 1.0);
        self.apply_crowd(self.crowd_level);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_crowd(self.crowd_level);
    }

    fn sfx_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    fn crowd_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.crowd_volume
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.sfx_gain();
        if vol <= 0.0 {
            return;
        }
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        for tone in effect.tones(&mut self.rng) {
            backend.play_tone(&tone, vol);
        }
    }

    /// Ramp the crowd for a session cue; replaces any pending ramp
    pub fn set_crowd(&mut self, cue: CrowdCue, now_ms: f64) {
        self.pending_crowd = None;
        self.apply_crowd(cue.level());
        if cue == CrowdCue::Kickoff {
            self.pending_crowd = Some((now_ms + KICKOFF_SETTLE_MS, KICKOFF_SETTLE));
        }
    }

    fn apply_crowd(&mut self, level: CrowdLevel) {
        self.crowd_level = level;
        let gain = self.crowd_gain();
        if !self.crowd_started {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            backend.ramp_crowd(
                level.volume * gain,
                CROWD_BED.lfo_depth * gain,
                level.ramp_secs,
            );
        }
    }

    /// Restart the victory tune from its first note
    pub fn start_victory_melody(&mut self, now_ms: f64) {
        self.melody = Some(MelodySequencer::new(now_ms));
    }

    pub fn stop_victory_melody(&mut self) {
        self.melody = None;
    }

    /// Advance timed audio (crowd settle, melody) to `now_ms`
    pub fn tick(&mut self, now_ms: f64) {
        if let Some((due, level)) = self.pending_crowd
            && now_ms >= due
        {
            self.pending_crowd = None;
            self.apply_crowd(level);
        }

        let tones = match self.melody.as_mut() {
            Some(melody) => melody.advance(now_ms),
            None => return,
        };
        let vol = self.sfx_gain();
        if vol <= 0.0 {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            for tone in &tones {
                backend.play_tone(tone, vol);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::testing::*;
    use super::*;

    fn started_engine() -> (AudioEngine, CallLog) {
        let (opener, log) = recording_opener();
        let mut engine = AudioEngine::new(1, opener);
        engine.set_master_volume(1.0);
        engine.ensure_started();
        (engine, log)
    }

    #[test]
    fn test_nothing_happens_before_first_gesture() {
        let (opener, log) = recording_opener();
        let mut engine = AudioEngine::new(1, opener);
        engine.play(SoundEffect::WallBounce);
        engine.set_crowd(CrowdCue::Intro, 0.0);
        assert!(!engine.is_available());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_open_attempted_once() {
        let attempts = Rc::new(Cell::new(0));
        let counter = attempts.clone();
        let mut engine = AudioEngine::new(
            1,
            Box::new(move || {
                counter.set(counter.get() + 1);
                None::<Box<dyn AudioBackend>>
            }),
        );
        engine.ensure_started();
        engine.ensure_started();
        engine.play(SoundEffect::RacketHit);
        assert_eq!(attempts.get(), 1);
        assert!(!engine.is_available());
        assert!(!engine.crowd_started());
    }

    #[test]
    fn test_start_builds_crowd_once_and_resumes_each_time() {
        let (mut engine, log) = started_engine();
        engine.ensure_started();

        let calls = log.borrow();
        let starts = calls
            .iter()
            .filter(|c| matches!(c, Call::StartCrowd(_)))
            .count();
        let resumes = calls.iter().filter(|c| **c == Call::Resume).count();
        assert_eq!(starts, 1);
        assert_eq!(resumes, 2);
        // 2 s of noise at the backend's rate
        assert!(calls.contains(&Call::StartCrowd(16000)));
    }

    #[test]
    fn test_effect_tone_table() {
        let mut rng = Pcg32::seed_from_u64(3);
        let wall = SoundEffect::WallBounce.tones(&mut rng);
        assert_eq!(wall, vec![Tone::beep(260.0, 0.03, Waveform::Triangle, 0.03)]);

        for _ in 0..20 {
            let hit = SoundEffect::RacketHit.tones(&mut rng);
            assert!(hit[0].freq >= 520.0 && hit[0].freq <= 680.0);
            assert_eq!(hit[0].waveform, Waveform::Square);
        }

        let sup = SoundEffect::SuperHit.tones(&mut rng);
        assert_eq!(sup.len(), 2);
        assert_eq!(sup[0].waveform, Waveform::Sawtooth);

        assert_eq!(SoundEffect::Point(Side::Player).tones(&mut rng)[0].freq, 740.0);
        assert_eq!(SoundEffect::Point(Side::Computer).tones(&mut rng)[0].freq, 330.0);
        assert_eq!(SoundEffect::CountdownGo.tones(&mut rng).len(), 2);
    }

    #[test]
    fn test_countdown_ticks_rise() {
        let mut rng = Pcg32::seed_from_u64(0);
        let freqs: Vec<f32> = (0..3)
            .map(|i| SoundEffect::CountdownTick(i).tones(&mut rng)[0].freq)
            .collect();
        assert_eq!(freqs, vec![420.0, 510.0, 600.0]);
    }

    #[test]
    fn test_play_scales_by_volume_and_respects_mute() {
        let (mut engine, log) = started_engine();
        engine.set_sfx_volume(0.5);
        engine.play(SoundEffect::WallBounce);
        assert!(log.borrow().iter().any(|c| matches!(c, Call::Tone(_, v) if *v == 0.5)));

        engine.set_muted(true);
        let before = tones(&log).len();
        engine.play(SoundEffect::SuperHit);
        assert_eq!(tones(&log).len(), before);
    }

    #[test]
    fn test_crowd_level_applied_when_bed_starts() {
        let (opener, log) = recording_opener();
        let mut engine = AudioEngine::new(1, opener);
        engine.set_master_volume(1.0);
        engine.set_crowd(CrowdCue::Intro, 0.0);
        engine.ensure_started();
        assert_eq!(ramps(&log), vec![(0.07, 0.5)]);
    }

    #[test]
    fn test_crowd_cues_are_ramped() {
        let (mut engine, log) = started_engine();
        engine.set_crowd(CrowdCue::Paused, 0.0);
        engine.set_crowd(CrowdCue::Playing, 0.0);
        let r = ramps(&log);
        assert_eq!(r[r.len() - 2..], [(0.04, 0.35), (0.12, 0.5)]);
    }

    #[test]
    fn test_kickoff_swells_then_settles() {
        let (mut engine, log) = started_engine();
        engine.set_crowd(CrowdCue::Kickoff, 1000.0);
        assert_eq!(ramps(&log).last(), Some(&(0.18, 0.15)));

        engine.tick(1259.0);
        assert_eq!(ramps(&log).last(), Some(&(0.18, 0.15)));
        engine.tick(1260.0);
        assert_eq!(ramps(&log).last(), Some(&(0.12, 0.65)));

        // Settle fires once
        let count = ramps(&log).len();
        engine.tick(2000.0);
        assert_eq!(ramps(&log).len(), count);
    }

    #[test]
    fn test_mute_silences_crowd_swell() {
        let (mut engine, log) = started_engine();
        engine.set_crowd(CrowdCue::Playing, 0.0);
        assert_eq!(lfo_depths(&log).last(), Some(&CROWD_BED.lfo_depth));

        engine.set_muted(true);
        assert_eq!(ramps(&log).last().map(|r| r.0), Some(0.0));
        assert_eq!(lfo_depths(&log).last(), Some(&0.0));

        engine.set_muted(false);
        engine.set_crowd_volume(0.0);
        assert_eq!(lfo_depths(&log).last(), Some(&0.0));

        engine.set_crowd_volume(0.5);
        assert_eq!(lfo_depths(&log).last(), Some(&(CROWD_BED.lfo_depth * 0.5)));
    }

    #[test]
    fn test_new_cue_cancels_pending_settle() {
        let (mut engine, log) = started_engine();
        engine.set_crowd(CrowdCue::Kickoff, 0.0);
        engine.set_crowd(CrowdCue::Hidden, 100.0);
        engine.tick(1000.0);
        assert_eq!(ramps(&log).last(), Some(&(0.03, 0.3)));
    }

    #[test]
    fn test_melody_sequence() {
        let mut melody = MelodySequencer::new(0.0);
        assert!(melody.advance(169.0).is_empty());

        let first = melody.advance(170.0);
        assert_eq!(first.len(), 2);
        assert!((first[0].freq - midi_to_freq(72)).abs() < 1e-3);
        assert_eq!(first[0].waveform, Waveform::Triangle);
        assert!((first[1].freq - midi_to_freq(48)).abs() < 1e-3);
        assert_eq!(first[1].waveform, Waveform::Sine);

        // Odd step: melody only
        assert_eq!(melody.advance(340.0).len(), 1);
        assert_eq!(melody.step(), 2);
    }

    #[test]
    fn test_melody_loops_and_skips_missed_steps() {
        let mut melody = MelodySequencer::new(0.0);
        let mut now = 0.0;
        for _ in 0..13 {
            now += MELODY_STEP_MS;
            assert!(!melody.advance(now).is_empty());
        }
        now += MELODY_STEP_MS;
        let wrapped = melody.advance(now);
        assert!((wrapped[0].freq - midi_to_freq(72)).abs() < 1e-3);

        // Long stall: one step now, the next a full step later
        now += 5_000.0;
        assert!(!melody.advance(now).is_empty());
        assert!(melody.advance(now + 1.0).is_empty());
        assert!(!melody.advance(now + MELODY_STEP_MS).is_empty());
    }

    #[test]
    fn test_engine_melody_start_stop() {
        let (mut engine, log) = started_engine();
        engine.start_victory_melody(0.0);
        assert!(engine.melody_playing());
        engine.tick(170.0);
        assert_eq!(tones(&log).len(), 2);

        engine.stop_victory_melody();
        engine.tick(1000.0);
        assert_eq!(tones(&log).len(), 2);
    }

    #[test]
    fn test_pink_noise_is_bounded_and_seeded() {
        let a = pink_noise(&mut Pcg32::seed_from_u64(9), 4096);
        let b = pink_noise(&mut Pcg32::seed_from_u64(9), 4096);
        assert_eq!(a, b);
        assert!(a.iter().all(|s| s.abs() < 1.0));
        let mean = a.iter().sum::<f32>() / a.len() as f32;
        assert!(mean.abs() < 0.2);
    }

    #[test]
    fn test_midi_to_freq() {
        assert_eq!(midi_to_freq(69), 440.0);
        assert!((midi_to_freq(81) - 880.0).abs() < 1e-3);
        assert!((midi_to_freq(60) - 261.626).abs() < 0.01);
    }

    #[test]
    fn test_tone_stop_times() {
        assert_eq!(Tone::beep(100.0, 0.05, Waveform::Sine, 0.1).stop_after(), 0.05);
        let note = Tone::note(72, 0.16, Waveform::Triangle, 0.06);
        assert!((note.stop_after() - 0.18).abs() < 1e-9);
    }
}
