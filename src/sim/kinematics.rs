//! Per-tick movement for every entity kind
//!
//! Straight-line drift for asteroids, projectiles and pickups; saucers add a
//! global-time wobble; stingers steer toward the player with a zig-zag on top.

use glam::Vec2;

use super::state::{Entity, EntityId, EntityKind, Player};
use crate::consts::*;
use crate::tuning::{SaucerTuning, StingerTuning};

/// Vertical movement intent sampled from input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MoveIntent {
    Up,
    Down,
    #[default]
    None,
}

impl MoveIntent {
    /// Screen-space direction (y grows downward)
    pub fn direction(self) -> f32 {
        match self {
            MoveIntent::Up => -1.0,
            MoveIntent::Down => 1.0,
            MoveIntent::None => 0.0,
        }
    }
}

/// Move the player vertically and clamp to the playfield
pub fn move_player(player: &mut Player, intent: MoveIntent, speed: f32, dt: f32) {
    player.pos.y += intent.direction() * speed * dt;
    player.pos.y = player.pos.y.clamp(Player::min_y(), Player::max_y());
}

/// Advance the two background scroll layers
pub fn scroll_background(offsets: &mut (f32, f32), dt: f32) {
    offsets.0 = (offsets.0 + STAR_SLOW_SPEED * dt) % GAME_WIDTH;
    offsets.1 = (offsets.1 + STAR_FAST_SPEED * dt) % GAME_WIDTH;
}

/// `pos += vel * dt` for every live entity
pub fn advance_linear(entities: &mut [Entity], dt: f32) {
    for entity in entities.iter_mut().filter(|e| e.alive) {
        entity.pos += entity.vel * dt;
    }
}

/// Saucers drift left along a sine wobble driven by global time
pub fn advance_saucers(saucers: &mut [Entity], dt: f32, now_ms: f64, tuning: &SaucerTuning) {
    for entity in saucers.iter_mut().filter(|e| e.alive) {
        if let EntityKind::Saucer(saucer) = &mut entity.kind {
            entity.pos.x += entity.vel.x * dt;
            saucer.base_y += entity.vel.y * dt;
            let phase = (now_ms as f32) * tuning.wobble_freq + saucer.wobble_phase;
            entity.pos.y = saucer.base_y + phase.sin() * tuning.wobble_amplitude;
        }
    }
}

/// Advance stingers toward `target`
///
/// Returns the IDs of stingers that re-locked this tick.
pub fn advance_stingers(
    stingers: &mut [Entity],
    dt_ms: f64,
    target: Vec2,
    tuning: &StingerTuning,
) -> Vec<EntityId> {
    let dt = (dt_ms / 1000.0) as f32;
    let nominal = tuning.speed;
    let mut locked = Vec::new();

    for entity in stingers.iter_mut().filter(|e| e.alive) {
        let EntityKind::Stinger(stinger) = &mut entity.kind else {
            continue;
        };

        stinger.age_ms += dt_ms;

        // Periodic re-lock onto the player's current position
        if stinger.age_ms - stinger.last_lock_ms >= tuning.lock_interval_ms {
            stinger.last_lock_ms = stinger.age_ms;
            let to_target = target - entity.pos;
            if to_target.length_squared() > f32::EPSILON {
                stinger.target_vel = to_target.normalize() * nominal;
            }
            locked.push(entity.id);
        }

        // Smooth steering, then keep speed inside the band
        entity.vel = entity.vel.lerp(stinger.target_vel, tuning.steer_lerp);
        let speed = entity.vel.length();
        if speed > nominal * tuning.max_speed_factor || speed < nominal * tuning.min_speed_factor {
            entity.vel = if speed > f32::EPSILON {
                entity.vel / speed * nominal
            } else {
                Vec2::new(-nominal, 0.0)
            };
        }

        stinger.travel += entity.vel * dt;

        // Lateral zig-zag perpendicular to the heading
        let lateral = entity.vel.normalize_or_zero().perp();
        let age_secs = (stinger.age_ms / 1000.0) as f32;
        let offset = (age_secs * tuning.zigzag_freq).sin() * tuning.zigzag_amplitude;
        entity.pos = stinger.travel + lateral * offset;
    }

    locked
}
