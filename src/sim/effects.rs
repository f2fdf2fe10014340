//! Cosmetic particle bursts and the super-hit ball trail
//!
//! Nothing in here feeds back into gameplay. Entries age every frame and are
//! culled as soon as `age >= life`, so the renderer never sees a negative
//! alpha.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{TRAIL_CAPACITY, TRAIL_LIFE};

/// Default cap on live particles
pub const MAX_PARTICLES: usize = 512;

/// Particle drag per second
const PARTICLE_DRAG: f32 = 2.4;
/// Downward pull on particles (world units/s²)
const PARTICLE_GRAVITY: f32 = 420.0 * 0.12;

/// Particle colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tint {
    /// Racket sparks
    Spark,
    /// Wall dust
    Chalk,
    /// Goals and confetti
    Gold,
    /// Second confetti color
    Periwinkle,
}

impl Tint {
    /// sRGB components plus alpha
    pub fn rgba(&self) -> [f32; 4] {
        match self {
            Tint::Spark => [1.0, 1.0, 1.0, 0.9],
            Tint::Chalk => [1.0, 1.0, 1.0, 0.75],
            Tint::Gold => [1.0, 211.0 / 255.0, 122.0 / 255.0, 0.95],
            Tint::Periwinkle => [170.0 / 255.0, 190.0 / 255.0, 1.0, 0.9],
        }
    }
}

/// A particle for visual effects
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds since spawn
    pub age: f32,
    /// Seconds until removal
    pub life: f32,
    pub radius: f32,
    pub tint: Tint,
}

impl Particle {
    /// Remaining fraction of life, 1 at spawn and 0 at death
    pub fn fade(&self) -> f32 {
        (1.0 - self.age / self.life).max(0.0)
    }
}

/// A sampled ball position while the super window is open
#[derive(Debug, Clone, Copy)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub age: f32,
    pub life: f32,
}

impl TrailPoint {
    pub fn fade(&self) -> f32 {
        (1.0 - self.age / self.life).max(0.0)
    }
}

/// Particle and trail pools
#[derive(Debug, Clone)]
pub struct Effects {
    pub particles: Vec<Particle>,
    /// Oldest first
    pub trail: VecDeque<TrailPoint>,
    particle_cap: usize,
}

impl Default for Effects {
    fn default() -> Self {
        Self::new(MAX_PARTICLES)
    }
}

impl Effects {
    pub fn new(particle_cap: usize) -> Self {
        Self {
            particles: Vec::with_capacity(particle_cap.min(MAX_PARTICLES)),
            trail: VecDeque::with_capacity(TRAIL_CAPACITY),
            particle_cap,
        }
    }

    /// Change the cap; live particles beyond it are dropped
    pub fn set_particle_cap(&mut self, cap: usize) {
        self.particle_cap = cap;
        self.particles.truncate(cap);
    }

    /// Radial burst of `count` particles around `origin`
    pub fn spawn_burst(
        &mut self,
        rng: &mut Pcg32,
        origin: Vec2,
        count: usize,
        strength: f32,
        tint: Tint,
    ) {
        for _ in 0..count {
            if self.particles.len() >= self.particle_cap {
                break;
            }
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let speed = strength * (0.5 + rng.random::<f32>() * 0.9);
            self.particles.push(Particle {
                pos: origin,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                age: 0.0,
                life: 0.35 + rng.random::<f32>() * 0.35,
                radius: 1.5 + rng.random::<f32>() * 2.2,
                tint,
            });
        }
    }

    /// Record a trail sample, discarding the oldest past capacity
    pub fn push_trail(&mut self, pos: Vec2) {
        self.trail.push_back(TrailPoint {
            pos,
            age: 0.0,
            life: TRAIL_LIFE,
        });
        while self.trail.len() > TRAIL_CAPACITY {
            self.trail.pop_front();
        }
    }

    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }

    /// Age, integrate and cull everything
    pub fn update(&mut self, dt: f32) {
        for point in self.trail.iter_mut() {
            point.age += dt;
        }
        self.trail.retain(|p| p.age < p.life);

        let drag = (1.0 - PARTICLE_DRAG * dt).max(0.0);
        self.particles.retain_mut(|p| {
            p.age += dt;
            if p.age >= p.life {
                return false;
            }
            p.vel *= drag;
            p.vel.y += PARTICLE_GRAVITY * dt;
            p.pos += p.vel * dt;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn test_burst_spawns_requested_count() {
        let mut fx = Effects::default();
        fx.spawn_burst(&mut rng(), Vec2::new(450.0, 250.0), 16, 380.0, Tint::Spark);
        assert_eq!(fx.particles.len(), 16);
        for p in &fx.particles {
            assert_eq!(p.pos, Vec2::new(450.0, 250.0));
            assert!(p.life >= 0.35 && p.life <= 0.7);
            assert!(p.radius >= 1.5 && p.radius <= 3.7);
            let speed = p.vel.length();
            assert!(speed >= 380.0 * 0.5 - 0.01 && speed <= 380.0 * 1.4 + 0.01);
        }
    }

    #[test]
    fn test_burst_respects_cap() {
        let mut fx = Effects::new(10);
        fx.spawn_burst(&mut rng(), Vec2::ZERO, 25, 100.0, Tint::Gold);
        assert_eq!(fx.particles.len(), 10);

        fx.set_particle_cap(4);
        assert_eq!(fx.particles.len(), 4);
    }

    #[test]
    fn test_particles_removed_once_aged_out() {
        let mut fx = Effects::default();
        fx.spawn_burst(&mut rng(), Vec2::ZERO, 30, 200.0, Tint::Chalk);

        // Longest possible life is 0.7s
        for _ in 0..10 {
            fx.update(0.033);
            assert!(fx.particles.iter().all(|p| p.age < p.life && p.fade() > 0.0));
        }
        for _ in 0..20 {
            fx.update(0.033);
        }
        assert!(fx.particles.is_empty());
    }

    #[test]
    fn test_trail_capped_and_oldest_dropped() {
        let mut fx = Effects::default();
        for i in 0..40 {
            fx.push_trail(Vec2::new(i as f32, 0.0));
        }
        assert_eq!(fx.trail.len(), TRAIL_CAPACITY);
        assert_eq!(fx.trail.front().map(|p| p.pos.x), Some(14.0));
        assert_eq!(fx.trail.back().map(|p| p.pos.x), Some(39.0));
    }

    #[test]
    fn test_trail_expires() {
        let mut fx = Effects::default();
        fx.push_trail(Vec2::ZERO);
        fx.update(0.1);
        assert_eq!(fx.trail.len(), 1);
        fx.update(0.1);
        assert!(fx.trail.is_empty());
    }

    #[test]
    fn test_same_seed_same_burst() {
        let mut a = Effects::default();
        let mut b = Effects::default();
        a.spawn_burst(&mut rng(), Vec2::ZERO, 8, 240.0, Tint::Chalk);
        b.spawn_burst(&mut rng(), Vec2::ZERO, 8, 240.0, Tint::Chalk);
        for (pa, pb) in a.particles.iter().zip(&b.particles) {
            assert_eq!(pa.vel, pb.vel);
            assert_eq!(pa.life, pb.life);
        }
    }
}
