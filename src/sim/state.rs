//! Game state and entity types
//!
//! Entities are created once and reset in place: at every serve the ball is
//! re-centered, at every rematch the paddles and score are too.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::{Effects, Tint};
use super::geometry::Rect;
use crate::consts::*;

/// Which end of the court
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Human, left side
    Player,
    /// Computer, right side
    #[serde(rename = "cpu")]
    Computer,
}

impl Side {
    /// Stable key used by the presentation layer
    pub fn key(&self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Computer => "cpu",
        }
    }

    /// Horizontal sign of a ball leaving this side's racket
    pub fn outgoing(&self) -> f32 {
        match self {
            Side::Player => 1.0,
            Side::Computer => -1.0,
        }
    }
}

/// Fixed logical court
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct World {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub net_x: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WORLD_WIDTH, WORLD_HEIGHT, COURT_PADDING)
    }
}

impl World {
    pub fn new(width: f32, height: f32, padding: f32) -> Self {
        Self {
            width,
            height,
            padding,
            net_x: width / 2.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Inner wall positions
    pub fn top(&self) -> f32 {
        self.padding
    }

    pub fn bottom(&self) -> f32 {
        self.height - self.padding
    }

    /// Keep a body of `radius` between the walls
    pub fn clamp_y(&self, y: f32, radius: f32) -> f32 {
        y.clamp(self.top() + radius, self.bottom() - radius)
    }
}

/// Match score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub player: u32,
    pub computer: u32,
}

impl Score {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player,
            Side::Computer => self.computer,
        }
    }

    pub fn award(&mut self, side: Side) {
        match side {
            Side::Player => self.player += 1,
            Side::Computer => self.computer += 1,
        }
    }

    /// First side at `WIN_SCORE`
    pub fn winner(&self) -> Option<Side> {
        if self.player >= WIN_SCORE {
            Some(Side::Player)
        } else if self.computer >= WIN_SCORE {
            Some(Side::Computer)
        } else {
            None
        }
    }
}

/// Racket geometry relative to the paddle body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Racket {
    pub width: f32,
    pub height: f32,
    /// Horizontal offset of the racket center from the body center
    pub offset_x: f32,
}

/// How a paddle decides where to go
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Controller {
    /// Eases toward the y derived from pointer input
    Human { target_y: f32 },
    /// Chases the ball at a capped linear speed
    Computer { chase_speed: f32 },
}

/// Where the renderer should draw a racket this frame
#[derive(Debug, Clone, Copy)]
pub struct RacketPose {
    pub center: Vec2,
    pub angle: f32,
}

/// A paddle: face disc plus racket
#[derive(Debug, Clone)]
pub struct Paddle {
    pub side: Side,
    pub pos: Vec2,
    pub radius: f32,
    pub face_radius: f32,
    pub racket: Racket,
    /// Cosmetic body tilt (radians)
    pub tilt: f32,
    pub last_hit_at_ms: f64,
    pub controller: Controller,
}

impl Paddle {
    pub fn player(world: &World) -> Self {
        let y = world.height / 2.0;
        Self {
            side: Side::Player,
            pos: Vec2::new(PADDLE_INSET, y),
            radius: PADDLE_RADIUS,
            face_radius: FACE_RADIUS,
            racket: Racket {
                width: RACKET_WIDTH,
                height: RACKET_HEIGHT,
                offset_x: RACKET_OFFSET,
            },
            tilt: 0.0,
            last_hit_at_ms: f64::NEG_INFINITY,
            controller: Controller::Human { target_y: y },
        }
    }

    pub fn computer(world: &World) -> Self {
        Self {
            side: Side::Computer,
            pos: Vec2::new(world.width - PADDLE_INSET, world.height / 2.0),
            radius: PADDLE_RADIUS,
            face_radius: FACE_RADIUS,
            racket: Racket {
                width: RACKET_WIDTH,
                height: RACKET_HEIGHT,
                offset_x: -RACKET_OFFSET,
            },
            tilt: 0.0,
            last_hit_at_ms: f64::NEG_INFINITY,
            controller: Controller::Computer {
                chase_speed: CPU_SPEED,
            },
        }
    }

    /// Hit box of the racket
    pub fn racket_rect(&self) -> Rect {
        Rect::new(
            self.pos.x + self.racket.offset_x - self.racket.width / 2.0,
            self.pos.y - self.racket.height / 2.0,
            self.racket.width,
            self.racket.height,
        )
    }

    /// Set the input target (ignored for the computer)
    pub fn set_target_y(&mut self, y: f32) {
        if let Controller::Human { target_y } = &mut self.controller {
            *target_y = y;
        }
    }

    pub fn target_y(&self) -> Option<f32> {
        match self.controller {
            Controller::Human { target_y } => Some(target_y),
            Controller::Computer { .. } => None,
        }
    }

    /// Back to mid-court, target included
    pub fn recenter(&mut self, world: &World) {
        self.pos.y = world.height / 2.0;
        self.tilt = 0.0;
        self.set_target_y(self.pos.y);
    }

    /// Racket angle leans toward the ball and kicks forward right after a hit
    pub fn racket_pose(&self, ball_y: f32, now_ms: f64) -> RacketPose {
        let rect = self.racket_rect();
        let toward_ball = ((ball_y - self.pos.y) / 140.0).clamp(-1.0, 1.0);
        let lean = if self.side == Side::Player { 0.10 } else { -0.10 };

        let since_hit = ((now_ms - self.last_hit_at_ms) / 1000.0) as f32;
        let kick = if (0.0..0.12).contains(&since_hit) {
            (1.0 - since_hit / 0.12) * 6.0
        } else {
            0.0
        };

        let mut center = rect.center();
        center.x += kick * self.side.outgoing();
        RacketPose {
            center,
            angle: toward_ball * 0.35 + lean,
        }
    }
}

/// The ball
#[derive(Debug, Clone)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub max_speed: f32,
    /// Super-hit window end (ms); 0 when no window is open
    pub super_until_ms: f64,
    pub last_touch: Option<Side>,
}

impl Ball {
    pub fn new(world: &World) -> Self {
        Self {
            pos: world.center(),
            vel: Vec2::new(360.0, 160.0),
            radius: BALL_RADIUS,
            max_speed: BALL_MAX_SPEED,
            super_until_ms: 0.0,
            last_touch: None,
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    pub fn is_super(&self, now_ms: f64) -> bool {
        now_ms < self.super_until_ms
    }
}

/// Transient in-court banner ("Point to you!")
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub text: &'static str,
    pub until_ms: f64,
}

/// Events produced by one simulation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    WallBounce { pos: Vec2 },
    RacketHit { side: Side, pos: Vec2, super_hit: bool },
    Goal { scorer: Side },
    MatchWon { winner: Side },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub world: World,
    pub ball: Ball,
    pub player: Paddle,
    pub computer: Paddle,
    pub score: Score,
    /// False once a side has won; the step is a no-op until rematch
    pub running: bool,
    pub message: Option<Banner>,
    pub effects: Effects,
    rng: Pcg32,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64) -> Self {
        let world = World::default();
        let mut state = Self {
            seed,
            world,
            ball: Ball::new(&world),
            player: Paddle::player(&world),
            computer: Paddle::computer(&world),
            score: Score::default(),
            running: true,
            message: None,
            effects: Effects::default(),
            rng: Pcg32::seed_from_u64(seed),
        };
        let dir = state.random_direction();
        state.reset_ball(dir);
        state
    }

    /// Fair coin for the first serve
    pub fn random_direction(&mut self) -> f32 {
        if self.rng.random_bool(0.5) { 1.0 } else { -1.0 }
    }

    /// Serve from the center; `direction` is the sign of the new vx
    pub fn reset_ball(&mut self, direction: f32) {
        let angle = self.rng.random::<f32>() * (2.0 * SERVE_ANGLE_SPREAD) - SERVE_ANGLE_SPREAD;
        let dir = if direction < 0.0 { -1.0 } else { 1.0 };

        self.ball.pos = self.world.center();
        self.ball.vel = Vec2::new(angle.cos() * SERVE_SPEED * dir, angle.sin() * SERVE_SPEED);
        self.ball.super_until_ms = 0.0;
        self.ball.last_touch = None;
        self.effects.clear_trail();
    }

    /// Fresh match: zero score, paddles centered, new serve
    pub fn reset_match(&mut self) {
        self.score = Score::default();
        self.running = true;
        self.message = None;
        self.player.recenter(&self.world);
        self.computer.recenter(&self.world);
        let dir = self.random_direction();
        self.reset_ball(dir);
    }

    pub fn set_message(&mut self, text: &'static str, now_ms: f64, duration_ms: f64) {
        self.message = Some(Banner {
            text,
            until_ms: now_ms + duration_ms,
        });
    }

    pub fn expire_message(&mut self, now_ms: f64) {
        if self.message.as_ref().is_some_and(|m| now_ms > m.until_ms) {
            self.message = None;
        }
    }

    /// Spawn a burst using the state's own RNG
    pub fn burst(&mut self, origin: Vec2, count: usize, strength: f32, tint: Tint) {
        self.effects
            .spawn_burst(&mut self.rng, origin, count, strength, tint);
    }

    /// Victory confetti
    pub fn celebrate(&mut self) {
        let center = self.world.center();
        for _ in 0..6 {
            self.burst(center, 18, 520.0, Tint::Gold);
            self.burst(center, 16, 520.0, Tint::Periwinkle);
        }
    }

    pub fn paddle(&self, side: Side) -> &Paddle {
        match side {
            Side::Player => &self.player,
            Side::Computer => &self.computer,
        }
    }
}
