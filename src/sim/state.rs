//! Game state and core simulation types
//!
//! Entities are a tagged variant over hazard/projectile/pickup kinds so the
//! kinematics and collision passes can match exhaustively on what they hold.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::size_vec;

/// Stable per-session entity identifier
pub type EntityId = u32;

/// Asteroid size tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsteroidSize {
    Small,
    Medium,
    Large,
}

impl AsteroidSize {
    pub const ALL: [AsteroidSize; 3] = [AsteroidSize::Small, AsteroidSize::Medium, AsteroidSize::Large];

    /// Index into the tuning scale table
    pub fn tier(self) -> usize {
        match self {
            AsteroidSize::Small => 0,
            AsteroidSize::Medium => 1,
            AsteroidSize::Large => 2,
        }
    }

    pub fn scale(self, scales: &[f32; 3]) -> f32 {
        scales[self.tier()]
    }
}

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Shield,
    ExtraLife,
    DoubleShot,
    ScoreMultiplier,
}

/// Hostile entity kinds that can be shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    Saucer,
    Stinger,
    Asteroid,
}

impl HazardKind {
    pub const ALL: [HazardKind; 3] = [HazardKind::Saucer, HazardKind::Stinger, HazardKind::Asteroid];
}

/// Standard enemy saucer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Saucer {
    /// Wobble centerline
    pub base_y: f32,
    /// Per-saucer wobble phase offset (radians)
    pub wobble_phase: f32,
    /// Next time this saucer fires (ms)
    pub next_fire_at: f64,
}

/// Homing zig-zag enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stinger {
    /// Path position before the lateral zig-zag is applied
    pub travel: Vec2,
    /// Lifetime (ms)
    pub age_ms: f64,
    /// Age at the last re-lock (ms)
    pub last_lock_ms: f64,
    /// Steering target recomputed on each lock
    pub target_vel: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub size: AsteroidSize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: Owner,
    /// Despawn time even if it never hits anything (ms)
    pub expires_at: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
}

/// Kind-specific entity state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Saucer(Saucer),
    Stinger(Stinger),
    Asteroid(Asteroid),
    Projectile(Projectile),
    PowerUp(PowerUp),
}

/// A live simulation entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Center position
    pub pos: Vec2,
    /// Velocity (px/s)
    pub vel: Vec2,
    /// Bounding box (width, height)
    pub size: Vec2,
    /// Cleared exactly once, before any destruction side effects run
    pub alive: bool,
    pub kind: EntityKind,
}

impl Entity {
    /// True once the entity is past the sweep margin on any side
    pub fn is_offscreen(&self) -> bool {
        self.pos.x < -OFFSCREEN_MARGIN
            || self.pos.x > GAME_WIDTH + OFFSCREEN_MARGIN
            || self.pos.y < -OFFSCREEN_MARGIN
            || self.pos.y > GAME_HEIGHT + OFFSCREEN_MARGIN
    }

    /// True for projectiles whose time-to-live has run out
    pub fn is_expired(&self, now: f64) -> bool {
        match &self.kind {
            EntityKind::Projectile(p) => now >= p.expires_at,
            _ => false,
        }
    }

    pub fn hazard_kind(&self) -> Option<HazardKind> {
        match &self.kind {
            EntityKind::Saucer(_) => Some(HazardKind::Saucer),
            EntityKind::Stinger(_) => Some(HazardKind::Stinger),
            EntityKind::Asteroid(_) => Some(HazardKind::Asteroid),
            EntityKind::Projectile(_) | EntityKind::PowerUp(_) => None,
        }
    }

    pub fn asteroid_size(&self) -> Option<AsteroidSize> {
        match &self.kind {
            EntityKind::Asteroid(a) => Some(a.size),
            _ => None,
        }
    }
}

/// The player's craft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_X, GAME_HEIGHT / 2.0),
            size: size_vec(PLAYER_SIZE),
        }
    }
}

impl Player {
    pub fn min_y() -> f32 {
        PLAYER_EDGE_MARGIN
    }

    pub fn max_y() -> f32 {
        GAME_HEIGHT - PLAYER_EDGE_MARGIN
    }
}

/// Session-wide counters and flags read by the HUD
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Remaining lives (capped at the tuning maximum)
    pub lives: u8,
    /// Score (never decreases during play)
    pub score: u64,
    /// Saucer kills
    pub enemy_kills: u32,
    pub stinger_kills: u32,
    pub asteroid_kills: u32,
    pub game_over: bool,
    pub mission_complete: bool,
    /// Post-hit invulnerability
    pub invulnerable: bool,
    /// Remaining invulnerability (ms)
    pub invulnerable_ms: f64,
    /// Invulnerability lasts through this time (ms)
    pub invulnerable_until: f64,
    /// Current wave (1-based)
    pub wave_index: u32,
    /// Progress through the current wave in [0, 1]
    pub progress: f32,
    /// Background scroll offsets (slow, fast)
    pub star_offsets: (f32, f32),
    /// Last wall-danger hit (ms)
    pub last_wall_tick_at: Option<f64>,
}

impl GameState {
    pub fn new(start_lives: u8) -> Self {
        Self {
            lives: start_lives,
            score: 0,
            enemy_kills: 0,
            stinger_kills: 0,
            asteroid_kills: 0,
            game_over: false,
            mission_complete: false,
            invulnerable: false,
            invulnerable_ms: 0.0,
            invulnerable_until: 0.0,
            wave_index: 1,
            progress: 0.0,
            star_offsets: (0.0, 0.0),
            last_wall_tick_at: None,
        }
    }

    /// Session is no longer simulating
    pub fn is_finished(&self) -> bool {
        self.game_over || self.mission_complete
    }

    pub fn total_kills(&self) -> u32 {
        self.enemy_kills + self.stinger_kills + self.asteroid_kills
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = GameState::new(3);
        assert_eq!(state.lives, 3);
        assert_eq!(state.score, 0);
        assert_eq!(state.wave_index, 1);
        assert!(!state.is_finished());
    }

    #[test]
    fn test_offscreen_margin() {
        let mut e = Entity {
            id: 1,
            pos: Vec2::new(GAME_WIDTH + 50.0, 300.0),
            vel: Vec2::ZERO,
            size: Vec2::splat(10.0),
            alive: true,
            kind: EntityKind::Asteroid(Asteroid {
                size: AsteroidSize::Small,
            }),
        };
        // Spawn point is inside the margin
        assert!(!e.is_offscreen());
        e.pos.x = -OFFSCREEN_MARGIN - 1.0;
        assert!(e.is_offscreen());
        e.pos = Vec2::new(400.0, GAME_HEIGHT + OFFSCREEN_MARGIN + 1.0);
        assert!(e.is_offscreen());
    }

    #[test]
    fn test_projectile_expiry() {
        let e = Entity {
            id: 2,
            pos: Vec2::ZERO,
            vel: Vec2::X,
            size: Vec2::ONE,
            alive: true,
            kind: EntityKind::Projectile(Projectile {
                owner: Owner::Player,
                expires_at: 1200.0,
            }),
        };
        assert!(!e.is_expired(1199.0));
        assert!(e.is_expired(1200.0));
        assert_eq!(e.hazard_kind(), None);
    }
}
