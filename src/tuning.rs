//! Data-driven game balance
//!
//! Every gameplay number lives here. Defaults reproduce the shipped mission;
//! hosts can override any subset from JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{EDGE_PADDING, GAME_HEIGHT};

/// One timed difficulty phase of the mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveSpec {
    /// How long the wave runs before it completes (ms)
    pub duration_ms: f64,
    /// Multiplier on saucer fire intervals (lower = more fire)
    pub enemy_fire_mul: f64,
    /// Multiplier on the enemy spawn timer delay
    pub enemy_spawn_mul: f64,
    /// Multiplier on the asteroid spawn timer delay
    pub asteroid_spawn_mul: f64,
    /// Saucers allowed on top of the base concurrency cap
    pub extra_enemy_cap: u32,
}

impl WaveSpec {
    pub fn new(
        duration_ms: f64,
        enemy_fire_mul: f64,
        enemy_spawn_mul: f64,
        asteroid_spawn_mul: f64,
        extra_enemy_cap: u32,
    ) -> Self {
        Self {
            duration_ms,
            enemy_fire_mul,
            enemy_spawn_mul,
            asteroid_spawn_mul,
            extra_enemy_cap,
        }
    }
}

/// The shipped three-wave mission
pub fn default_mission() -> Vec<WaveSpec> {
    vec![
        WaveSpec::new(40_000.0, 1.0, 1.0, 1.0, 0),
        WaveSpec::new(40_000.0, 0.85, 0.85, 0.9, 1),
        WaveSpec::new(45_000.0, 0.7, 0.7, 0.8, 2),
    ]
}

/// Player movement and weapon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Vertical speed (px/s)
    pub speed: f32,
    pub start_lives: u8,
    pub max_lives: u8,
    /// Invulnerability after a hit (ms)
    pub invuln_ms: f64,
    /// Minimum time between shots while fire is held (ms)
    pub fire_cooldown_ms: f64,
    pub bolt_speed: f32,
    pub bolt_ttl_ms: f64,
    /// Bolt spawns this far ahead of the player anchor
    pub muzzle_offset: f32,
    /// Danger band at the clamp limits (px)
    pub wall_danger_thickness: f32,
    pub wall_tick_cooldown_ms: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 380.0,
            start_lives: 3,
            max_lives: 5,
            invuln_ms: 1000.0,
            fire_cooldown_ms: 140.0,
            bolt_speed: 900.0,
            bolt_ttl_ms: 1200.0,
            muzzle_offset: 30.0,
            wall_danger_thickness: 8.0,
            wall_tick_cooldown_ms: 1000.0,
        }
    }
}

/// Magazine and reload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmmoTuning {
    pub max_shots: u32,
    pub reload_ms: f64,
}

impl Default for AmmoTuning {
    fn default() -> Self {
        Self {
            max_shots: 10,
            reload_ms: 1200.0,
        }
    }
}

/// Point values and multiplier rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    pub saucer_points: u64,
    pub stinger_points: u64,
    pub asteroid_points: u64,
    pub wave_clear_bonus: u64,
    pub combo_max: u32,
    /// Silence after which combo decays to 1 (ms)
    pub combo_window_ms: f64,
    /// Max gap between kills to keep a streak (ms)
    pub streak_window_ms: f64,
    /// Bonus per chained kill (0.2 = +20%)
    pub streak_step: f64,
    /// Max chained steps that count
    pub streak_cap: u32,
    pub player_hit_resets_streak: bool,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            saucer_points: 200,
            stinger_points: 120,
            asteroid_points: 50,
            wave_clear_bonus: 1000,
            combo_max: 5,
            combo_window_ms: 2500.0,
            streak_window_ms: 1200.0,
            streak_step: 0.2,
            streak_cap: 5,
            player_hit_resets_streak: true,
        }
    }
}

/// Saucer (standard enemy)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaucerTuning {
    pub speed_min: f32,
    pub speed_max: f32,
    pub wobble_amplitude: f32,
    /// Wobble angular rate in radians per millisecond of global time
    pub wobble_freq: f32,
    pub fire_min_ms: f64,
    pub fire_max_ms: f64,
    pub bolt_speed: f32,
    pub bolt_ttl_ms: f64,
    /// Base concurrency cap (waves add `extra_enemy_cap`)
    pub base_cap: u32,
}

impl Default for SaucerTuning {
    fn default() -> Self {
        Self {
            speed_min: 280.0,
            speed_max: 320.0,
            wobble_amplitude: 24.0,
            wobble_freq: 0.003,
            fire_min_ms: 1000.0,
            fire_max_ms: 1500.0,
            bolt_speed: 700.0,
            bolt_ttl_ms: 3000.0,
            base_cap: 4,
        }
    }
}

/// Homing stinger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StingerTuning {
    pub enabled: bool,
    pub speed: f32,
    pub zigzag_amplitude: f32,
    /// Zig-zag angular rate (rad/s of stinger lifetime)
    pub zigzag_freq: f32,
    pub lock_interval_ms: f64,
    pub steer_lerp: f32,
    /// Speed band as fractions of nominal speed
    pub min_speed_factor: f32,
    pub max_speed_factor: f32,
    /// First wave (1-based) stingers may appear in
    pub from_wave: u32,
    pub spawn_chance: f64,
    pub check_interval_ms: f64,
    pub max_alive: u32,
}

impl Default for StingerTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 260.0,
            zigzag_amplitude: 38.0,
            zigzag_freq: 2.2,
            lock_interval_ms: 800.0,
            steer_lerp: 0.12,
            min_speed_factor: 0.8,
            max_speed_factor: 1.2,
            from_wave: 3,
            spawn_chance: 0.35,
            check_interval_ms: 1500.0,
            max_alive: 6,
        }
    }
}

/// Asteroids
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidTuning {
    pub speed_base: f32,
    /// Speed jitter applied in [-jitter, jitter]
    pub speed_jitter: f32,
    /// Small, medium, large scale factors
    pub scales: [f32; 3],
    pub split_count: u32,
    /// Vertical speed spread for split fragments (px/s)
    pub split_spread: f32,
}

impl Default for AsteroidTuning {
    fn default() -> Self {
        Self {
            speed_base: 260.0,
            speed_jitter: 30.0,
            scales: [0.6, 1.0, 1.4],
            split_count: 3,
            split_spread: 90.0,
        }
    }
}

/// Spawn timers and wave pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub asteroid_min_ms: f64,
    pub asteroid_max_ms: f64,
    pub enemy_min_ms: f64,
    pub enemy_max_ms: f64,
    /// Chance a generic spawn attempt produces an asteroid instead of a saucer
    pub asteroid_chance: f64,
    pub intro_ms: f64,
    /// Breather between waves (ms)
    pub inter_wave_ms: f64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            asteroid_min_ms: 700.0,
            asteroid_max_ms: 1000.0,
            enemy_min_ms: 1300.0,
            enemy_max_ms: 1900.0,
            asteroid_chance: 0.65,
            intro_ms: 1000.0,
            inter_wave_ms: 1500.0,
        }
    }
}

/// Power-up durations and drop tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    pub shield_ms: f64,
    pub double_shot_ms: f64,
    pub multiplier_ms: f64,
    pub score_multiplier: u64,
    /// Delay before the second bolt of a double shot (ms)
    pub double_shot_delay_ms: f64,
    pub double_shot_offset: f32,
    /// Large asteroid drop chance
    pub asteroid_drop_chance: f64,
    /// Share of asteroid drops that are double-shot (rest: multiplier)
    pub double_shot_share: f64,
    /// Saucer drop chance (from `saucer_drop_from_wave`)
    pub saucer_drop_chance: f64,
    pub saucer_drop_from_wave: u32,
    /// Share of saucer drops that are shields (rest: extra life)
    pub shield_share: f64,
    pub drift_x_min: f32,
    pub drift_x_max: f32,
    pub drift_y: f32,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            shield_ms: 5000.0,
            double_shot_ms: 8000.0,
            multiplier_ms: 8000.0,
            score_multiplier: 2,
            double_shot_delay_ms: 60.0,
            double_shot_offset: 10.0,
            asteroid_drop_chance: 0.25,
            double_shot_share: 0.5,
            saucer_drop_chance: 0.1,
            saucer_drop_from_wave: 2,
            shield_share: 0.7,
            drift_x_min: -120.0,
            drift_x_max: -40.0,
            drift_y: 50.0,
        }
    }
}

/// Complete balance sheet for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub ammo: AmmoTuning,
    pub score: ScoreTuning,
    pub saucer: SaucerTuning,
    pub stinger: StingerTuning,
    pub asteroid: AsteroidTuning,
    pub spawn: SpawnTuning,
    pub powerups: PowerUpTuning,
    pub waves: Vec<WaveSpec>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            ammo: AmmoTuning::default(),
            score: ScoreTuning::default(),
            saucer: SaucerTuning::default(),
            stinger: StingerTuning::default(),
            asteroid: AsteroidTuning::default(),
            spawn: SpawnTuning::default(),
            powerups: PowerUpTuning::default(),
            waves: default_mission(),
        }
    }
}

/// Rejected balance data
#[derive(Debug)]
pub enum TuningError {
    /// JSON could not be parsed
    Parse(serde_json::Error),
    /// The mission has no waves
    EmptyMission,
    /// A value is outside its usable range
    OutOfRange {
        field: &'static str,
        value: f64,
    },
    /// A `[min, max]` pair is inverted
    InvertedRange { field: &'static str },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "invalid tuning JSON: {}", e),
            TuningError::EmptyMission => write!(f, "mission must contain at least one wave"),
            TuningError::OutOfRange { field, value } => {
                write!(f, "tuning value `{}` out of range: {}", field, value)
            }
            TuningError::InvertedRange { field } => {
                write!(f, "tuning range `{}` has min > max", field)
            }
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), TuningError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::OutOfRange { field, value })
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::OutOfRange { field, value })
    }
}

fn ordered(field: &'static str, min: f64, max: f64) -> Result<(), TuningError> {
    if min <= max {
        Ok(())
    } else {
        Err(TuningError::InvertedRange { field })
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for shipping a balance file)
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every value is usable by the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.waves.is_empty() {
            return Err(TuningError::EmptyMission);
        }
        for wave in &self.waves {
            positive("waves.duration_ms", wave.duration_ms)?;
            positive("waves.enemy_fire_mul", wave.enemy_fire_mul)?;
            positive("waves.enemy_spawn_mul", wave.enemy_spawn_mul)?;
            positive("waves.asteroid_spawn_mul", wave.asteroid_spawn_mul)?;
        }

        if self.ammo.max_shots == 0 {
            return Err(TuningError::OutOfRange {
                field: "ammo.max_shots",
                value: 0.0,
            });
        }
        positive("ammo.reload_ms", self.ammo.reload_ms)?;

        if self.player.start_lives == 0 || self.player.start_lives > self.player.max_lives {
            return Err(TuningError::OutOfRange {
                field: "player.start_lives",
                value: self.player.start_lives as f64,
            });
        }
        positive("player.invuln_ms", self.player.invuln_ms)?;
        positive("player.bolt_ttl_ms", self.player.bolt_ttl_ms)?;

        if self.score.combo_max == 0 {
            return Err(TuningError::OutOfRange {
                field: "score.combo_max",
                value: 0.0,
            });
        }

        // Saucer spawn band is inset by the wobble on both sides
        let wobble = self.saucer.wobble_amplitude;
        if !(wobble >= 0.0 && 2.0 * (EDGE_PADDING + wobble) <= GAME_HEIGHT) {
            return Err(TuningError::OutOfRange {
                field: "saucer.wobble_amplitude",
                value: wobble as f64,
            });
        }
        for scale in self.asteroid.scales {
            positive("asteroid.scales", scale as f64)?;
        }

        ordered("saucer.speed", self.saucer.speed_min as f64, self.saucer.speed_max as f64)?;
        ordered("saucer.fire", self.saucer.fire_min_ms, self.saucer.fire_max_ms)?;
        positive("saucer.fire_min_ms", self.saucer.fire_min_ms)?;
        ordered("spawn.asteroid", self.spawn.asteroid_min_ms, self.spawn.asteroid_max_ms)?;
        ordered("spawn.enemy", self.spawn.enemy_min_ms, self.spawn.enemy_max_ms)?;
        positive("spawn.asteroid_min_ms", self.spawn.asteroid_min_ms)?;
        positive("spawn.enemy_min_ms", self.spawn.enemy_min_ms)?;
        positive("stinger.check_interval_ms", self.stinger.check_interval_ms)?;
        ordered(
            "stinger.speed_band",
            self.stinger.min_speed_factor as f64,
            self.stinger.max_speed_factor as f64,
        )?;
        ordered(
            "powerups.drift_x",
            self.powerups.drift_x_min as f64,
            self.powerups.drift_x_max as f64,
        )?;

        probability("spawn.asteroid_chance", self.spawn.asteroid_chance)?;
        probability("stinger.spawn_chance", self.stinger.spawn_chance)?;
        probability("powerups.asteroid_drop_chance", self.powerups.asteroid_drop_chance)?;
        probability("powerups.double_shot_share", self.powerups.double_shot_share)?;
        probability("powerups.saucer_drop_chance", self.powerups.saucer_drop_chance)?;
        probability("powerups.shield_share", self.powerups.shield_share)?;
        probability("stinger.steer_lerp", self.stinger.steer_lerp as f64)?;

        Ok(())
    }
}
