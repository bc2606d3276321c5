//! Per-frame simulation step
//!
//! Subsystems run in a fixed order every frame:
//!
//! 1. background scroll
//! 2. reload completion, player movement, held fire, delayed double shots
//! 3. hazard kinematics, off-screen sweep
//! 4. saucer fire timers
//! 5. wave director (progress, spawns, wave transitions)
//! 6. wall danger zone
//! 7. collisions
//! 8. invulnerability decay
//! 9. pickups, buff timers, combo decay, HUD refresh
//!
//! Dead entities are compacted once at the end of the frame.

use super::collision::{overlapping, resolve_shots};
use super::events::GameEvent;
use super::kinematics::{
    advance_linear, advance_saucers, advance_stingers, move_player, scroll_background, MoveIntent,
};
use super::powerups::BuffKind;
use super::registry::EntitySet;
use super::session::Session;
use super::state::{EntityKind, Player};
use super::wave::{DirectorEvent, LiveCounts};
use crate::ms_to_secs;

/// Input sampled once per frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub movement: MoveIntent,
    /// Fire held
    pub fire: bool,
    /// Demo mode: the session steers and fires on its own
    pub autopilot: bool,
}

impl TickInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(movement: MoveIntent) -> Self {
        Self {
            movement,
            ..Self::default()
        }
    }

    pub fn firing() -> Self {
        Self {
            fire: true,
            ..Self::default()
        }
    }
}

impl Session {
    /// Advance the session to `now`; `delta` is the frame time in ms
    pub fn tick(&mut self, now: f64, delta: f64, input: &TickInput) {
        if !self.is_running() {
            return;
        }
        let delta = delta.max(0.0);
        let dt = ms_to_secs(delta);
        self.now = now;

        // Background
        scroll_background(&mut self.state.star_offsets, dt);

        // Player
        let input = if input.autopilot { self.autopilot_input() } else { *input };
        self.update_player(now, dt, &input);

        // Hazards
        self.advance_entities(now, delta, dt);
        self.fire_enemy_bolts(now);

        // Waves
        self.update_director(now);
        if self.state.is_finished() {
            self.registry.compact();
            return;
        }

        self.check_wall_danger(now);
        if !self.state.is_finished() {
            self.resolve_collisions(now);
        }
        if self.state.is_finished() {
            self.registry.compact();
            return;
        }

        self.decay_invulnerability(now);
        self.update_pickups_and_timers(now);

        self.registry.compact();
    }

    fn update_player(&mut self, now: f64, dt: f32, input: &TickInput) {
        if self.ammo.update(now) {
            self.emit_ammo(now);
        }

        move_player(&mut self.player, input.movement, self.tuning.player.speed, dt);

        if input.fire {
            let cooled = self
                .last_shot_at
                .is_none_or(|at| now - at >= self.tuning.player.fire_cooldown_ms);
            if cooled {
                self.fire(now);
            }
        }

        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_shots)
            .into_iter()
            .partition(|shot| now >= shot.fire_at);
        self.pending_shots = waiting;
        for shot in due {
            self.spawn_player_bolt(now, shot.y_offset);
        }
    }

    fn advance_entities(&mut self, now: f64, delta: f64, dt: f32) {
        let reg = &mut self.registry;
        advance_linear(&mut reg.asteroids, dt);
        advance_linear(&mut reg.player_shots, dt);
        advance_linear(&mut reg.enemy_shots, dt);
        advance_linear(&mut reg.powerups, dt);
        advance_saucers(&mut reg.saucers, dt, now, &self.tuning.saucer);
        let locked = advance_stingers(&mut reg.stingers, delta, self.player.pos, &self.tuning.stinger);

        let swept = self.registry.sweep(now);
        if swept > 0 {
            log::trace!("Swept {} entities", swept);
        }

        for id in locked {
            self.emit(GameEvent::StingerLocked { id });
        }
    }

    fn update_director(&mut self, now: f64) {
        let live = LiveCounts {
            saucers: self.registry.live_count(EntitySet::Saucers),
            stingers: self.registry.live_count(EntitySet::Stingers),
        };
        let events = self.director.update(now, &self.tuning, live, &mut self.rng);

        for event in events {
            match event {
                DirectorEvent::Activated => {}
                DirectorEvent::Spawn(request) => {
                    self.spawn_hazard(request, now);
                }
                DirectorEvent::Completed => self.finish_wave(),
                DirectorEvent::NextWave(_) => self.begin_next_wave(),
                DirectorEvent::MissionComplete => self.complete_mission(now),
            }
        }

        if self.wave_is_active() {
            let progress = self.director.progress(now);
            self.state.progress = progress;
            self.emit(GameEvent::WaveProgress { progress });
        }
    }

    /// Hugging the top or bottom clamp hurts, at most once per cooldown
    fn check_wall_danger(&mut self, now: f64) {
        let thickness = self.tuning.player.wall_danger_thickness;
        let y = self.player.pos.y;
        let in_zone = y <= Player::min_y() + thickness || y >= Player::max_y() - thickness;
        // Invulnerability skips the hit without spending the cooldown
        if !in_zone || self.is_invulnerable(now) {
            return;
        }
        let cooldown = self.tuning.player.wall_tick_cooldown_ms;
        if self
            .state
            .last_wall_tick_at
            .is_some_and(|at| now - at < cooldown)
        {
            return;
        }
        self.state.last_wall_tick_at = Some(now);
        log::debug!("Wall danger at y={:.0}", y);
        self.damage_player(now);
    }

    /// True while contact can still matter this frame
    fn contact_open(&self) -> bool {
        !self.state.is_finished()
            && (!self.state.invulnerable || self.buffs.is_active(BuffKind::Shield))
    }

    fn resolve_collisions(&mut self, now: f64) {
        // Player bolts against hazards
        for set in [EntitySet::Saucers, EntitySet::Stingers, EntitySet::Asteroids] {
            let hits = {
                let reg = &mut self.registry;
                let targets = match set {
                    EntitySet::Saucers => &mut reg.saucers,
                    EntitySet::Stingers => &mut reg.stingers,
                    _ => &mut reg.asteroids,
                };
                resolve_shots(&mut reg.player_shots, targets)
            };
            for hit in hits {
                self.director.stats.hits += 1;
                self.on_hazard_destroyed(&hit.target, now);
            }
        }

        // Direct contact; stops at the first hit that starts invulnerability
        let player_box = self.player.bounds();
        for set in [EntitySet::Saucers, EntitySet::Stingers, EntitySet::Asteroids] {
            if !self.contact_open() {
                break;
            }
            for index in overlapping(&player_box, self.registry.set(set)) {
                if !self.contact_open() {
                    break;
                }
                let id = self.registry.set(set)[index].id;
                self.consume_hazard(set, id);
                self.damage_player(now);
            }
        }

        // Enemy bolts; ignored while invulnerable
        if self.contact_open() {
            for index in overlapping(&player_box, &self.registry.enemy_shots) {
                if !self.contact_open() {
                    break;
                }
                let id = self.registry.enemy_shots[index].id;
                self.registry.destroy(EntitySet::EnemyShots, id);
                self.damage_player(now);
            }
        }
    }

    fn decay_invulnerability(&mut self, now: f64) {
        if !self.state.invulnerable {
            return;
        }
        self.state.invulnerable_ms = (self.state.invulnerable_until - now).max(0.0);
        if now >= self.state.invulnerable_until {
            self.state.invulnerable = false;
            self.state.invulnerable_ms = 0.0;
            log::debug!("Invulnerability ended at {:.0}ms", now);
        }
    }

    fn update_pickups_and_timers(&mut self, now: f64) {
        let player_box = self.player.bounds();
        for index in overlapping(&player_box, &self.registry.powerups) {
            let entity = &self.registry.powerups[index];
            let (id, pos) = (entity.id, entity.pos);
            let EntityKind::PowerUp(pickup) = &entity.kind else {
                continue;
            };
            let kind = pickup.kind;
            if self.registry.destroy(EntitySet::PowerUps, id).is_some() {
                self.apply_powerup(kind, now);
                self.emit(GameEvent::PowerUpCollected { kind });
                self.emit(GameEvent::Ripple { x: pos.x, y: pos.y });
            }
        }

        for buff in self.buffs.update(now) {
            log::debug!("{:?} expired", buff);
            self.emit(GameEvent::BuffExpired { buff });
        }
        for buff in BuffKind::ALL {
            if self.buffs.is_active(buff) {
                let remaining = self.buffs.remaining_fraction(buff, now);
                self.emit(GameEvent::BuffProgress { buff, remaining });
            }
        }

        if self.scoring.update(now) {
            self.emit(GameEvent::Combo { level: 1 });
        }

        if self.ammo.is_reloading() {
            self.emit_ammo(now);
        }
    }

    /// Steer toward the nearest hazard ahead and fire when lined up
    fn autopilot_input(&self) -> TickInput {
        let player = self.player.pos;
        let target = [EntitySet::Saucers, EntitySet::Stingers, EntitySet::Asteroids]
            .into_iter()
            .flat_map(|set| self.registry.set(set).iter())
            .filter(|e| e.alive && e.pos.x > player.x)
            .min_by(|a, b| {
                a.pos
                    .x
                    .partial_cmp(&b.pos.x)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        let Some(target) = target else {
            return TickInput::idle();
        };

        let dy = target.pos.y - player.y;
        let movement = if dy < -6.0 {
            MoveIntent::Up
        } else if dy > 6.0 {
            MoveIntent::Down
        } else {
            MoveIntent::None
        };
        TickInput {
            movement,
            fire: dy.abs() < target.size.y,
            autopilot: true,
        }
    }
}
