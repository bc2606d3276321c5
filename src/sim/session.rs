//! One play session
//!
//! Owns every subsystem and the services injected by the host. The per-frame
//! loop lives in `tick.rs`; this file holds the session boundary and the
//! shared routines the loop and the host both call (fire, kill, damage).

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::ammo::{AmmoState, FireOutcome};
use super::events::{EventBus, EventKind, EventSink, GameEvent};
use super::powerups::{roll_asteroid_drop, roll_saucer_drop, BuffKind, Buffs};
use super::registry::{EntityRegistry, EntitySet};
use super::scoring::ScoringEngine;
use super::state::{
    AsteroidSize, Entity, EntityId, EntityKind, GameState, HazardKind, Owner, Player, PowerUpKind,
};
use super::wave::{SpawnRequest, WaveDirector, WavePhase, WaveSummary};
use crate::consts::*;
use crate::highscores::HighScoreService;
use crate::tuning::Tuning;

/// Result of [`Session::damage_player`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Shield absorbed the hit
    Blocked,
    /// Invulnerable or session over; nothing happened
    Ignored,
    /// Lost a life, invulnerability started
    Damaged { lives: u8 },
    /// Lost the last life
    Killed,
}

/// Second bolt of a double shot, waiting for its delay
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PendingShot {
    pub fire_at: f64,
    pub y_offset: f32,
}

/// A play session: simulation state plus host services
pub struct Session {
    pub(super) tuning: Tuning,
    pub(super) state: GameState,
    pub(super) player: Player,
    pub(super) registry: EntityRegistry,
    pub(super) director: WaveDirector,
    pub(super) ammo: AmmoState,
    pub(super) scoring: ScoringEngine,
    pub(super) buffs: Buffs,
    pub(super) events: EventBus,
    pub(super) rng: Pcg32,
    high_scores: Box<dyn HighScoreService>,
    pub(super) last_shot_at: Option<f64>,
    pub(super) pending_shots: Vec<PendingShot>,
    pub(super) now: f64,
    started: bool,
    ended: bool,
    seed: u64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("wave", &self.director.wave_number())
            .field("phase", &self.director.phase())
            .field("now", &self.now)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build an idle session; call [`Session::start_session`] to begin play
    ///
    /// `tuning` must already pass [`Tuning::validate`]. Spawn ranges and
    /// probability rolls panic on out-of-range values.
    pub fn new(tuning: Tuning, high_scores: Box<dyn HighScoreService>, seed: u64) -> Self {
        let state = GameState::new(tuning.player.start_lives);
        let ammo = AmmoState::new(tuning.ammo.max_shots, tuning.ammo.reload_ms);
        let scoring = ScoringEngine::new(tuning.score.clone());
        let director = WaveDirector::new(tuning.waves.clone());
        Self {
            tuning,
            state,
            player: Player::default(),
            registry: EntityRegistry::new(),
            director,
            ammo,
            scoring,
            buffs: Buffs::new(),
            events: EventBus::new(),
            rng: Pcg32::seed_from_u64(seed),
            high_scores,
            last_shot_at: None,
            pending_shots: Vec::new(),
            now: 0.0,
            started: false,
            ended: false,
            seed,
        }
    }

    // Accessors

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Direct registry access for hosts that stage scenes
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn director(&self) -> &WaveDirector {
        &self.director
    }

    pub fn ammo(&self) -> &AmmoState {
        &self.ammo
    }

    pub fn ammo_mut(&mut self) -> &mut AmmoState {
        &mut self.ammo
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub fn buffs(&self) -> &Buffs {
        &self.buffs
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Clock value of the last tick or session call (ms)
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Started and not yet over
    pub fn is_running(&self) -> bool {
        self.started && !self.state.is_finished()
    }

    /// Best score known to the high-score service
    pub fn best_score(&self) -> u64 {
        self.high_scores.high_score()
    }

    // Events

    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.events.subscribe(sink);
    }

    pub fn subscribe_to(&mut self, kinds: &[EventKind], sink: Box<dyn EventSink>) {
        self.events.subscribe_to(kinds, sink);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    pub(super) fn emit(&mut self, event: GameEvent) {
        self.events.emit(event);
    }

    // Session boundary

    /// Begin a fresh session at wave 1
    pub fn start_session(&mut self, now: f64) {
        self.now = now;
        self.director.cancel_timers();
        self.pending_shots.clear();
        self.registry.clear();
        self.state = GameState::new(self.tuning.player.start_lives);
        self.player = Player::default();
        self.ammo.reset();
        self.scoring.reset();
        self.buffs.clear();
        self.last_shot_at = None;
        self.started = true;
        self.ended = false;

        self.director.start_wave(0, now, self.tuning.spawn.intro_ms);

        log::info!(
            "Session started (seed {}, {} waves, best {})",
            self.seed,
            self.director.wave_count(),
            self.high_scores.high_score()
        );

        self.emit(GameEvent::Lives {
            lives: self.state.lives,
        });
        self.emit(GameEvent::Score { score: 0, delta: 0 });
        self.emit_kills();
        self.emit(GameEvent::AmmoArc {
            ratio: 0.0,
            reloading: false,
        });
        self.emit(GameEvent::Combo { level: 1 });
        self.announce_wave();
    }

    /// Tear down the current session and start over
    pub fn restart(&mut self, now: f64) {
        log::info!("Restart requested at {:.0}ms", now);
        self.start_session(now);
    }

    fn announce_wave(&mut self) {
        let wave = self.director.wave_number();
        self.state.wave_index = wave;
        self.state.progress = 0.0;
        self.emit(GameEvent::Wave { wave });
        self.emit(GameEvent::WaveIntro {
            wave,
            total: self.director.wave_count() as u32,
        });
        self.emit(GameEvent::WaveProgress { progress: 0.0 });
    }

    pub(super) fn emit_kills(&mut self) {
        self.emit(GameEvent::Kills {
            saucers: self.state.enemy_kills,
            stingers: self.state.stinger_kills,
            asteroids: self.state.asteroid_kills,
        });
    }

    pub(super) fn emit_ammo(&mut self, now: f64) {
        self.emit(GameEvent::AmmoArc {
            ratio: self.ammo.ratio(now),
            reloading: self.ammo.is_reloading(),
        });
    }

    fn add_score(&mut self, delta: u64) {
        self.state.score += delta;
        self.emit(GameEvent::Score {
            score: self.state.score,
            delta,
        });
    }

    // Fire

    pub(super) fn spawn_player_bolt(&mut self, now: f64, y_offset: f32) {
        let p = &self.tuning.player;
        let pos = self.player.pos + Vec2::new(p.muzzle_offset, y_offset);
        let vel = Vec2::new(p.bolt_speed, 0.0);
        let expires_at = now + p.bolt_ttl_ms;
        self.registry.spawn_projectile(Owner::Player, pos, vel, expires_at);
        self.director.stats.shots_fired += 1;
    }

    /// Fire action, gated by the magazine
    ///
    /// Returns true if a bolt was spawned.
    pub fn fire(&mut self, now: f64) -> bool {
        if !self.is_running() {
            return false;
        }
        let outcome = self.ammo.try_fire(now);
        if let FireOutcome::Fired { .. } = outcome {
            self.spawn_player_bolt(now, 0.0);
            self.last_shot_at = Some(now);
            if self.buffs.is_active(BuffKind::DoubleShot) {
                self.pending_shots.push(PendingShot {
                    fire_at: now + self.tuning.powerups.double_shot_delay_ms,
                    y_offset: self.tuning.powerups.double_shot_offset,
                });
            }
        }
        if outcome != FireOutcome::Reloading {
            self.emit_ammo(now);
        }
        outcome.fired()
    }

    // Hazards

    fn asteroid_speed(&mut self, size: AsteroidSize) -> f32 {
        let a = &self.tuning.asteroid;
        let scale = size.scale(&a.scales);
        let base = a.speed_base + ((1.0 - scale) * 200.0).round();
        let jitter = a.speed_jitter;
        let offset = if jitter > 0.0 {
            self.rng.random_range(-jitter..=jitter)
        } else {
            0.0
        };
        (base + offset).max(1.0)
    }

    fn saucer_fire_delay(&mut self) -> f64 {
        let s = &self.tuning.saucer;
        let (min, max) = (s.fire_min_ms, s.fire_max_ms);
        let base = if max > min { self.rng.random_range(min..=max) } else { min };
        let mul = self.director.current().map_or(1.0, |w| w.enemy_fire_mul);
        base * mul
    }

    /// Spawn a hazard just past the right edge
    pub(super) fn spawn_hazard(&mut self, request: SpawnRequest, now: f64) -> EntityId {
        let (kind, id, y) = match request {
            SpawnRequest::Asteroid => {
                let y = self.rng.random_range(EDGE_PADDING..=GAME_HEIGHT - EDGE_PADDING);
                let size = AsteroidSize::ALL[self.rng.random_range(0..AsteroidSize::ALL.len())];
                let speed = self.asteroid_speed(size);
                let id = self.registry.spawn_asteroid(
                    Vec2::new(SPAWN_X, y),
                    size,
                    Vec2::new(-speed, 0.0),
                    &self.tuning.asteroid.scales,
                );
                (HazardKind::Asteroid, id, y)
            }
            SpawnRequest::Saucer => {
                let s = &self.tuning.saucer;
                let margin = EDGE_PADDING + s.wobble_amplitude;
                let (speed_min, speed_max) = (s.speed_min, s.speed_max);
                let y = self.rng.random_range(margin..=GAME_HEIGHT - margin);
                let speed = if speed_max > speed_min {
                    self.rng.random_range(speed_min..=speed_max)
                } else {
                    speed_min
                };
                let phase = self.rng.random_range(0.0..std::f32::consts::TAU);
                let next_fire_at = now + self.saucer_fire_delay();
                let id = self
                    .registry
                    .spawn_saucer(Vec2::new(SPAWN_X, y), speed, phase, next_fire_at);
                (HazardKind::Saucer, id, y)
            }
            SpawnRequest::Stinger => {
                let y = self.rng.random_range(EDGE_PADDING..=GAME_HEIGHT - EDGE_PADDING);
                let id = self
                    .registry
                    .spawn_stinger(Vec2::new(SPAWN_X, y), self.tuning.stinger.speed);
                (HazardKind::Stinger, id, y)
            }
        };
        log::trace!("Spawned {:?} #{} at y={:.0}", kind, id, y);
        self.emit(GameEvent::ThreatIncoming { kind, y });
        id
    }

    /// Saucers whose fire timer is due shoot a bolt toward the left edge
    pub(super) fn fire_enemy_bolts(&mut self, now: f64) {
        let muzzles: Vec<(usize, Vec2)> = self
            .registry
            .saucers
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive && e.pos.x <= GAME_WIDTH)
            .filter(|(_, e)| matches!(&e.kind, EntityKind::Saucer(s) if now >= s.next_fire_at))
            .map(|(i, e)| (i, e.pos))
            .collect();

        for (index, pos) in muzzles {
            let delay = self.saucer_fire_delay();
            if let EntityKind::Saucer(s) = &mut self.registry.saucers[index].kind {
                s.next_fire_at = now + delay;
            }

            let bolt_pos = pos - Vec2::new(20.0, 0.0);
            self.registry.spawn_projectile(
                Owner::Enemy,
                bolt_pos,
                Vec2::new(-self.tuning.saucer.bolt_speed, 0.0),
                now + self.tuning.saucer.bolt_ttl_ms,
            );
            self.emit(GameEvent::EnemyFired {
                x: bolt_pos.x,
                y: bolt_pos.y,
            });
        }
    }

    /// Kill a hazard by ID, running its destruction side effects once
    ///
    /// Returns false if the entity is unknown, not a hazard, or already dead,
    /// and always once the session has ended.
    pub fn destroy_hazard(&mut self, set: EntitySet, id: EntityId, now: f64) -> bool {
        if !self.is_running() {
            return false;
        }
        if !matches!(set, EntitySet::Saucers | EntitySet::Stingers | EntitySet::Asteroids) {
            return false;
        }
        match self.registry.destroy(set, id) {
            Some(entity) => {
                self.on_hazard_destroyed(&entity, now);
                true
            }
            None => false,
        }
    }

    /// Destruction side effects for a hazard already marked dead
    pub(super) fn on_hazard_destroyed(&mut self, entity: &Entity, now: f64) {
        let Some(kind) = entity.hazard_kind() else {
            return;
        };

        let factor = self.buffs.score_factor(&self.tuning.powerups);
        let award = self.scoring.register_kill(kind, now, factor);
        self.add_score(award.points);

        match kind {
            HazardKind::Saucer => {
                self.state.enemy_kills += 1;
                self.director.stats.saucer_kills += 1;
            }
            HazardKind::Stinger => {
                self.state.stinger_kills += 1;
                self.director.stats.stinger_kills += 1;
            }
            HazardKind::Asteroid => {
                self.state.asteroid_kills += 1;
                self.director.stats.asteroid_kills += 1;
            }
        }
        self.emit_kills();
        self.emit(GameEvent::Combo {
            level: self.scoring.combo(),
        });
        self.emit(GameEvent::Streak {
            level: self.scoring.streak(),
            multiplier: self.scoring.streak_multiplier(),
        });

        let scale = entity
            .asteroid_size()
            .map_or(1.0, |size| size.scale(&self.tuning.asteroid.scales));
        self.emit(GameEvent::Explosion {
            x: entity.pos.x,
            y: entity.pos.y,
            scale,
        });

        log::debug!(
            "{:?} #{} destroyed: +{} (combo {}, streak x{:.1})",
            kind,
            entity.id,
            award.points,
            award.combo,
            award.streak_bonus
        );

        match (kind, entity.asteroid_size()) {
            (HazardKind::Asteroid, Some(AsteroidSize::Large)) => {
                self.split_asteroid(entity.pos);
                if let Some(drop) = roll_asteroid_drop(&mut self.rng, &self.tuning.powerups) {
                    self.spawn_powerup(drop, entity.pos);
                }
            }
            (HazardKind::Saucer, _) => {
                let wave = self.director.wave_number();
                if let Some(drop) = roll_saucer_drop(&mut self.rng, &self.tuning.powerups, wave) {
                    self.spawn_powerup(drop, entity.pos);
                }
            }
            _ => {}
        }
    }

    /// Break a large asteroid into small fragments fanning out vertically
    fn split_asteroid(&mut self, pos: Vec2) {
        let count = self.tuning.asteroid.split_count;
        let spread = self.tuning.asteroid.split_spread;
        for i in 0..count {
            let t = if count > 1 {
                i as f32 / (count - 1) as f32 * 2.0 - 1.0
            } else {
                0.0
            };
            let speed = self.asteroid_speed(AsteroidSize::Small);
            self.registry.spawn_asteroid(
                pos,
                AsteroidSize::Small,
                Vec2::new(-speed, t * spread),
                &self.tuning.asteroid.scales,
            );
        }
        self.emit(GameEvent::Ripple { x: pos.x, y: pos.y });
    }

    fn spawn_powerup(&mut self, kind: PowerUpKind, pos: Vec2) {
        let p = &self.tuning.powerups;
        let (x_min, x_max, drift_y) = (p.drift_x_min, p.drift_x_max, p.drift_y);
        let vx = if x_max > x_min { self.rng.random_range(x_min..=x_max) } else { x_min };
        let vy = if drift_y > 0.0 { self.rng.random_range(-drift_y..=drift_y) } else { 0.0 };
        self.registry.spawn_powerup(kind, pos, Vec2::new(vx, vy));
        log::debug!("{:?} dropped at ({:.0}, {:.0})", kind, pos.x, pos.y);
    }

    /// Contact with a hazard: consumed without scoring
    pub(super) fn consume_hazard(&mut self, set: EntitySet, id: EntityId) {
        if let Some(entity) = self.registry.destroy(set, id) {
            self.emit(GameEvent::Explosion {
                x: entity.pos.x,
                y: entity.pos.y,
                scale: 1.0,
            });
        }
    }

    // Power-ups

    /// Grant a pickup's effect; a no-op once the session has ended
    pub fn apply_powerup(&mut self, kind: PowerUpKind, now: f64) {
        if !self.is_running() {
            return;
        }
        match kind.buff() {
            Some(buff) => {
                let duration_ms = buff.duration_ms(&self.tuning.powerups);
                let refreshed = self.buffs.activate(buff, now, duration_ms);
                log::debug!("{:?} {} for {:.0}ms", buff, if refreshed { "refreshed" } else { "active" }, duration_ms);
                self.emit(GameEvent::BuffStarted { buff, duration_ms });
            }
            None => {
                self.state.lives = (self.state.lives + 1).min(self.tuning.player.max_lives);
                self.emit(GameEvent::Lives {
                    lives: self.state.lives,
                });
            }
        }
    }

    // Damage

    /// Apply one hit to the player
    pub fn damage_player(&mut self, now: f64) -> DamageOutcome {
        if !self.is_running() {
            return DamageOutcome::Ignored;
        }
        if self.buffs.is_active(BuffKind::Shield) {
            self.emit(GameEvent::ShieldBlocked);
            return DamageOutcome::Blocked;
        }
        if self.is_invulnerable(now) {
            return DamageOutcome::Ignored;
        }

        self.state.lives = self.state.lives.saturating_sub(1);
        if self.scoring.on_player_hit() {
            self.emit(GameEvent::Streak {
                level: 0,
                multiplier: 1.0,
            });
        }
        let lives = self.state.lives;
        self.emit(GameEvent::PlayerHit { lives });
        self.emit(GameEvent::Lives { lives });
        self.emit(GameEvent::Ripple {
            x: self.player.pos.x,
            y: self.player.pos.y,
        });
        log::info!("Player hit at {:.0}ms, {} lives left", now, lives);

        if lives == 0 {
            self.game_over(now);
            return DamageOutcome::Killed;
        }

        let invuln = self.tuning.player.invuln_ms;
        self.state.invulnerable = true;
        self.state.invulnerable_ms = invuln;
        self.state.invulnerable_until = now + invuln;
        DamageOutcome::Damaged { lives }
    }

    /// Invulnerability follows the timestamp, even between ticks
    pub(super) fn is_invulnerable(&self, now: f64) -> bool {
        self.state.invulnerable && now <= self.state.invulnerable_until
    }

    /// Ask the high-score service once per session end
    fn record_final_score(&mut self) -> (u64, bool) {
        let update = self.high_scores.try_update_high_score(self.state.score);
        self.ended = true;
        (update.best, update.is_new)
    }

    fn halt(&mut self) {
        self.director.cancel_timers();
        self.pending_shots.clear();
    }

    /// Terminal failure: stop spawning and report the final score
    pub(super) fn game_over(&mut self, now: f64) {
        if self.ended {
            return;
        }
        self.state.game_over = true;
        self.halt();
        let (best, is_new_best) = self.record_final_score();
        log::info!(
            "Game over at {:.0}ms: score {} (best {}{})",
            now,
            self.state.score,
            best,
            if is_new_best { ", new" } else { "" }
        );
        self.emit(GameEvent::GameOver {
            final_score: self.state.score,
            best,
            is_new_best,
        });
    }

    /// Last wave cleared: stop the simulation and report
    pub(super) fn complete_mission(&mut self, now: f64) {
        if self.ended {
            return;
        }
        self.state.mission_complete = true;
        self.halt();
        let (best, is_new_best) = self.record_final_score();
        log::info!("Mission complete at {:.0}ms: score {}", now, self.state.score);
        self.emit(GameEvent::Celebration);
        self.emit(GameEvent::MissionComplete {
            score: self.state.score,
            best,
            is_new_best,
        });
    }

    /// Wave timer ran out: clear enemies, pay the bonus, publish the summary
    pub(super) fn finish_wave(&mut self) {
        let mut cleared = 0u32;
        for set in [EntitySet::Saucers, EntitySet::Stingers, EntitySet::EnemyShots] {
            for entity in self.registry.set_mut(set).iter_mut().filter(|e| e.alive) {
                entity.alive = false;
                cleared += 1;
            }
        }
        if cleared > 0 {
            self.emit(GameEvent::HazardsCleared { count: cleared });
        }

        let bonus = self.tuning.score.wave_clear_bonus;
        if bonus > 0 {
            self.add_score(bonus);
        }

        self.state.progress = 1.0;
        self.emit(GameEvent::WaveProgress { progress: 1.0 });

        let summary = WaveSummary::new(
            self.director.wave_number(),
            &self.director.stats,
            self.scoring.peak_combo(),
            bonus,
        );
        log::info!(
            "Wave {} summary: {} kills, {}% accuracy, peak combo x{}",
            summary.wave,
            self.director.stats.kills(),
            summary.accuracy,
            summary.peak_combo
        );
        self.emit(GameEvent::WaveSummary(summary));
        self.emit(GameEvent::Celebration);
    }

    /// Breather over, next wave's intro begins
    pub(super) fn begin_next_wave(&mut self) {
        self.scoring.reset_peak();
        self.announce_wave();
    }

    pub(super) fn wave_is_active(&self) -> bool {
        self.director.phase() == WavePhase::Active
    }
}
