//! Astro Saucer - simulation core for a side-scrolling saucer shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, kinematics, collisions, waves, scoring)
//! - `platform`: Storage abstraction (memory, file, browser LocalStorage)
//! - `highscores`: Best-score service backed by platform storage
//! - `tuning`: Data-driven game balance

pub mod highscores;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use highscores::{HighScoreService, HighScoreUpdate, StoredHighScore};
pub use sim::{GameEvent, Session, TickInput};
pub use tuning::{Tuning, WaveSpec};

use glam::Vec2;

/// Playfield geometry
pub mod consts {
    /// Playfield dimensions (pixels)
    pub const GAME_WIDTH: f32 = 1600.0;
    pub const GAME_HEIGHT: f32 = 720.0;

    /// Player is anchored at a fixed x and only moves vertically
    pub const PLAYER_X: f32 = 140.0;
    /// Vertical clamp margin for the player
    pub const PLAYER_EDGE_MARGIN: f32 = 20.0;

    /// Hazards spawn just past the right edge
    pub const SPAWN_X: f32 = GAME_WIDTH + 50.0;
    /// Spawn y is drawn from [EDGE_PADDING, GAME_HEIGHT - EDGE_PADDING]
    pub const EDGE_PADDING: f32 = 8.0;
    /// Entities further than this past any edge are swept
    pub const OFFSCREEN_MARGIN: f32 = 100.0;

    /// Bounding boxes (width, height)
    pub const PLAYER_SIZE: (f32, f32) = (48.0, 28.0);
    pub const SAUCER_SIZE: (f32, f32) = (44.0, 26.0);
    pub const STINGER_SIZE: (f32, f32) = (36.0, 22.0);
    /// Asteroid box before tier scaling
    pub const ASTEROID_BASE_SIZE: f32 = 48.0;
    pub const PLAYER_BOLT_SIZE: (f32, f32) = (24.0, 6.0);
    pub const ENEMY_BOLT_SIZE: (f32, f32) = (18.0, 6.0);
    pub const POWERUP_SIZE: (f32, f32) = (28.0, 28.0);

    /// Background scroll layers (px/s)
    pub const STAR_SLOW_SPEED: f32 = 24.0;
    pub const STAR_FAST_SPEED: f32 = 48.0;
}

/// Build a `Vec2` from a `(width, height)` tuple
#[inline]
pub fn size_vec((w, h): (f32, f32)) -> Vec2 {
    Vec2::new(w, h)
}

/// Milliseconds to seconds
#[inline]
pub fn ms_to_secs(ms: f64) -> f32 {
    (ms / 1000.0) as f32
}
