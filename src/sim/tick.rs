//! Per-frame simulation step
//!
//! Advances paddles and ball by a clamped frame delta, resolves wall and
//! racket contacts, scores goals and detects the match winner. Side effects
//! (sound, haptics, HUD) are not performed here: the step returns the
//! [`GameEvent`]s that happened and the caller dispatches them.

use glam::Vec2;

use super::effects::Tint;
use super::geometry::circle_rect_collision;
use super::state::{Ball, Controller, GameEvent, GameState, Paddle, Side, World};
use crate::consts::*;
use crate::platform::input::InputSignal;
use crate::{approach, lerp, smoothing};

/// Advance the game by `dt` seconds at wall-clock time `now_ms`
pub fn simulate(
    state: &mut GameState,
    input: &mut InputSignal,
    dt: f32,
    now_ms: f64,
) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if !state.running {
        return events;
    }
    let dt = dt.clamp(0.0, MAX_FRAME_DT);

    // Swipe estimate bleeds off between pointer samples
    input.swipe_speed = lerp(input.swipe_speed, 0.0, smoothing(SWIPE_DECAY_BASE, dt));

    // Paddles
    state.player.set_target_y(input.target_y);
    move_player(&mut state.player, &state.world, dt);
    move_computer(&mut state.computer, &state.ball, &state.world, dt);

    let ball_y = state.ball.pos.y;
    for paddle in [&mut state.player, &mut state.computer] {
        let target = ((ball_y - paddle.pos.y) / TILT_RANGE).clamp(-1.0, 1.0) * MAX_TILT;
        paddle.tilt = approach(paddle.tilt, target, TILT_EASE_BASE, dt);
    }

    // Ball
    state.ball.pos += state.ball.vel * dt;
    if state.ball.is_super(now_ms) {
        let pos = state.ball.pos;
        state.effects.push_trail(pos);
    }

    // Walls
    let r = state.ball.radius;
    let (top, bottom) = (state.world.top(), state.world.bottom());
    if state.ball.pos.y - r <= top {
        state.ball.pos.y = top + r;
        state.ball.vel.y = -state.ball.vel.y;
        wall_bounce(state, top, &mut events);
    }
    if state.ball.pos.y + r >= bottom {
        state.ball.pos.y = bottom - r;
        state.ball.vel.y = -state.ball.vel.y;
        wall_bounce(state, bottom, &mut events);
    }

    // Rackets, only the one the ball is heading toward
    if state.ball.vel.x < 0.0
        && circle_rect_collision(state.ball.pos, r, &state.player.racket_rect())
    {
        events.push(bounce_from_racket(state, Side::Player, input.swipe_speed, now_ms));
    }
    if state.ball.vel.x > 0.0
        && circle_rect_collision(state.ball.pos, r, &state.computer.racket_rect())
    {
        events.push(bounce_from_racket(state, Side::Computer, input.swipe_speed, now_ms));
    }

    // Goals
    if state.ball.pos.x < -GOAL_MARGIN {
        point_scored(state, Side::Computer, now_ms, &mut events);
        state.reset_ball(1.0);
    }
    if state.ball.pos.x > state.world.width + GOAL_MARGIN {
        point_scored(state, Side::Player, now_ms, &mut events);
        state.reset_ball(-1.0);
    }

    // Match over
    if let Some(winner) = state.score.winner() {
        state.running = false;
        log::info!(
            "Match won by {} ({}:{})",
            winner.key(),
            state.score.player,
            state.score.computer
        );
        events.push(GameEvent::MatchWon { winner });
    }

    state.expire_message(now_ms);

    events
}

/// Ease toward the input target and stay on court
fn move_player(paddle: &mut Paddle, world: &World, dt: f32) {
    if let Some(target) = paddle.target_y() {
        paddle.pos.y = approach(paddle.pos.y, target, PLAYER_EASE_BASE, dt);
    }
    paddle.pos.y = world.clamp_y(paddle.pos.y, paddle.radius);
}

/// Chase the ball while it approaches, otherwise drift back to center slower
fn move_computer(paddle: &mut Paddle, ball: &Ball, world: &World, dt: f32) {
    let Controller::Computer { chase_speed } = paddle.controller else {
        return;
    };
    let ball_coming = ball.vel.x > 0.0;
    let desired_y = if ball_coming {
        ball.pos.y
    } else {
        world.height / 2.0
    };
    let factor = if ball_coming { 1.0 } else { CPU_RETURN_FACTOR };
    let max_step = chase_speed * dt * factor;

    paddle.pos.y += (desired_y - paddle.pos.y).clamp(-max_step, max_step);
    paddle.pos.y = world.clamp_y(paddle.pos.y, paddle.radius);
}

fn wall_bounce(state: &mut GameState, wall_y: f32, events: &mut Vec<GameEvent>) {
    let pos = Vec2::new(state.ball.pos.x, wall_y);
    state.burst(pos, 8, 240.0, Tint::Chalk);
    events.push(GameEvent::WallBounce { pos });
}

/// Reflect off a racket; returns the hit event
fn bounce_from_racket(
    state: &mut GameState,
    side: Side,
    swipe_speed: f32,
    now_ms: f64,
) -> GameEvent {
    let rect = state.paddle(side).racket_rect();
    let hit_pos = (state.ball.pos.y - rect.y) / rect.h;
    let center_offset = ((hit_pos - 0.5) * 2.0).clamp(-1.0, 1.0);

    let max_speed = state.ball.max_speed;
    let mut speed = (state.ball.speed() * HIT_SPEEDUP).clamp(SERVE_SPEED, max_speed);

    // Only the human can land a super-hit
    let super_hit = side == Side::Player && swipe_speed >= SUPER_SWIPE_THRESHOLD;
    if super_hit {
        speed = (speed * SUPER_HIT_BOOST).clamp(SUPER_MIN_SPEED, max_speed);
        state.ball.super_until_ms = now_ms + SUPER_WINDOW_MS;
        state.set_message("SUPER HIT!", now_ms, SUPER_MESSAGE_MS);
    }

    let angle = center_offset * HIT_ANGLE_RANGE;
    let dir = side.outgoing();
    state.ball.vel = Vec2::new(angle.cos() * speed * dir, angle.sin() * speed);

    // Flush against the face so the next frame doesn't collide again
    let r = state.ball.radius;
    let face_x = match side {
        Side::Player => rect.right(),
        Side::Computer => rect.x,
    };
    state.ball.pos.x = face_x + (r + 0.5) * dir;
    state.ball.last_touch = Some(side);

    let spark_at = Vec2::new(face_x, state.ball.pos.y);
    if super_hit {
        state.burst(spark_at, 26, 520.0, Tint::Spark);
    } else {
        state.burst(spark_at, 16, 380.0, Tint::Spark);
    }

    match side {
        Side::Player => state.player.last_hit_at_ms = now_ms,
        Side::Computer => state.computer.last_hit_at_ms = now_ms,
    }

    GameEvent::RacketHit {
        side,
        pos: spark_at,
        super_hit,
    }
}

fn point_scored(state: &mut GameState, scorer: Side, now_ms: f64, events: &mut Vec<GameEvent>) {
    state.score.award(scorer);
    log::debug!(
        "Point to {} ({}:{})",
        scorer.key(),
        state.score.player,
        state.score.computer
    );

    let text = match scorer {
        Side::Player => "Point to you!",
        Side::Computer => "Point to CPU!",
    };
    state.set_message(text, now_ms, POINT_MESSAGE_MS);

    let center = state.world.center();
    state.burst(center, 22, 420.0, Tint::Gold);
    events.push(GameEvent::Goal { scorer });
}
