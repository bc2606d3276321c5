//! Entity registry
//!
//! Owns every live entity, one insertion-ordered `Vec` per set. Removal is
//! mark-and-compact: passes clear `alive`, and `compact` drops dead entries
//! once the frame is done, so indices stay stable while a pass iterates.

use glam::Vec2;

use super::state::{
    Asteroid, AsteroidSize, Entity, EntityId, EntityKind, HazardKind, Owner, PowerUp,
    PowerUpKind, Projectile, Saucer, Stinger,
};
use crate::consts::*;
use crate::size_vec;

/// Registry collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitySet {
    Saucers,
    Stingers,
    Asteroids,
    PlayerShots,
    EnemyShots,
    PowerUps,
}

impl EntitySet {
    pub const ALL: [EntitySet; 6] = [
        EntitySet::Saucers,
        EntitySet::Stingers,
        EntitySet::Asteroids,
        EntitySet::PlayerShots,
        EntitySet::EnemyShots,
        EntitySet::PowerUps,
    ];
}

impl From<HazardKind> for EntitySet {
    fn from(kind: HazardKind) -> Self {
        match kind {
            HazardKind::Saucer => EntitySet::Saucers,
            HazardKind::Stinger => EntitySet::Stingers,
            HazardKind::Asteroid => EntitySet::Asteroids,
        }
    }
}

/// All live entities of a session
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    pub saucers: Vec<Entity>,
    pub stingers: Vec<Entity>,
    pub asteroids: Vec<Entity>,
    pub player_shots: Vec<Entity>,
    pub enemy_shots: Vec<Entity>,
    pub powerups: Vec<Entity>,
    next_id: EntityId,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            saucers: Vec::new(),
            stingers: Vec::new(),
            asteroids: Vec::new(),
            player_shots: Vec::new(),
            enemy_shots: Vec::new(),
            powerups: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn set(&self, set: EntitySet) -> &[Entity] {
        match set {
            EntitySet::Saucers => &self.saucers,
            EntitySet::Stingers => &self.stingers,
            EntitySet::Asteroids => &self.asteroids,
            EntitySet::PlayerShots => &self.player_shots,
            EntitySet::EnemyShots => &self.enemy_shots,
            EntitySet::PowerUps => &self.powerups,
        }
    }

    pub fn set_mut(&mut self, set: EntitySet) -> &mut Vec<Entity> {
        match set {
            EntitySet::Saucers => &mut self.saucers,
            EntitySet::Stingers => &mut self.stingers,
            EntitySet::Asteroids => &mut self.asteroids,
            EntitySet::PlayerShots => &mut self.player_shots,
            EntitySet::EnemyShots => &mut self.enemy_shots,
            EntitySet::PowerUps => &mut self.powerups,
        }
    }

    fn push(&mut self, set: EntitySet, pos: Vec2, vel: Vec2, size: Vec2, kind: EntityKind) -> EntityId {
        let id = self.next_entity_id();
        self.set_mut(set).push(Entity {
            id,
            pos,
            vel,
            size,
            alive: true,
            kind,
        });
        id
    }

    /// Spawn a saucer flying left at `speed`
    pub fn spawn_saucer(&mut self, pos: Vec2, speed: f32, wobble_phase: f32, next_fire_at: f64) -> EntityId {
        self.push(
            EntitySet::Saucers,
            pos,
            Vec2::new(-speed, 0.0),
            size_vec(SAUCER_SIZE),
            EntityKind::Saucer(Saucer {
                base_y: pos.y,
                wobble_phase,
                next_fire_at,
            }),
        )
    }

    /// Spawn a stinger heading left at nominal `speed`
    pub fn spawn_stinger(&mut self, pos: Vec2, speed: f32) -> EntityId {
        let vel = Vec2::new(-speed, 0.0);
        self.push(
            EntitySet::Stingers,
            pos,
            vel,
            size_vec(STINGER_SIZE),
            EntityKind::Stinger(Stinger {
                travel: pos,
                age_ms: 0.0,
                last_lock_ms: 0.0,
                target_vel: vel,
            }),
        )
    }

    /// Spawn an asteroid; its box scales with the size tier
    pub fn spawn_asteroid(&mut self, pos: Vec2, size: AsteroidSize, vel: Vec2, scales: &[f32; 3]) -> EntityId {
        let extent = ASTEROID_BASE_SIZE * size.scale(scales);
        self.push(
            EntitySet::Asteroids,
            pos,
            vel,
            Vec2::splat(extent),
            EntityKind::Asteroid(Asteroid { size }),
        )
    }

    pub fn spawn_projectile(&mut self, owner: Owner, pos: Vec2, vel: Vec2, expires_at: f64) -> EntityId {
        let (set, size) = match owner {
            Owner::Player => (EntitySet::PlayerShots, PLAYER_BOLT_SIZE),
            Owner::Enemy => (EntitySet::EnemyShots, ENEMY_BOLT_SIZE),
        };
        self.push(
            set,
            pos,
            vel,
            size_vec(size),
            EntityKind::Projectile(Projectile { owner, expires_at }),
        )
    }

    pub fn spawn_powerup(&mut self, kind: PowerUpKind, pos: Vec2, vel: Vec2) -> EntityId {
        self.push(
            EntitySet::PowerUps,
            pos,
            vel,
            size_vec(POWERUP_SIZE),
            EntityKind::PowerUp(PowerUp { kind }),
        )
    }

    /// Find a live entity
    pub fn get(&self, set: EntitySet, id: EntityId) -> Option<&Entity> {
        self.set(set).iter().find(|e| e.id == id && e.alive)
    }

    /// Mark an entity dead, returning a snapshot of it
    ///
    /// Returns `None` when the entity is unknown or already dead, so callers
    /// run destruction side effects only on the first attempt.
    pub fn destroy(&mut self, set: EntitySet, id: EntityId) -> Option<Entity> {
        let entity = self.set_mut(set).iter_mut().find(|e| e.id == id)?;
        if !entity.alive {
            return None;
        }
        entity.alive = false;
        Some(entity.clone())
    }

    /// Number of live entities in a set
    pub fn live_count(&self, set: EntitySet) -> usize {
        self.set(set).iter().filter(|e| e.alive).count()
    }

    /// Mark off-screen entities and expired projectiles dead
    ///
    /// Returns how many were swept.
    pub fn sweep(&mut self, now: f64) -> usize {
        let mut swept = 0;
        for set in EntitySet::ALL {
            for entity in self.set_mut(set).iter_mut().filter(|e| e.alive) {
                if entity.is_offscreen() || entity.is_expired(now) {
                    entity.alive = false;
                    swept += 1;
                }
            }
        }
        swept
    }

    /// Drop dead entities from every set, preserving insertion order
    pub fn compact(&mut self) {
        for set in EntitySet::ALL {
            self.set_mut(set).retain(|e| e.alive);
        }
    }

    /// Remove everything (restart)
    pub fn clear(&mut self) {
        for set in EntitySet::ALL {
            self.set_mut(set).clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALES: [f32; 3] = [0.6, 1.0, 1.4];

    #[test]
    fn test_ids_are_unique_across_sets() {
        let mut reg = EntityRegistry::new();
        let a = reg.spawn_saucer(Vec2::new(100.0, 100.0), 300.0, 0.0, 1000.0);
        let b = reg.spawn_asteroid(Vec2::new(200.0, 100.0), AsteroidSize::Large, Vec2::NEG_X, &SCALES);
        let c = reg.spawn_projectile(Owner::Player, Vec2::ZERO, Vec2::X, 1200.0);
        assert!(a != b && b != c && a != c);
        assert_eq!(reg.player_shots.len(), 1);
        assert!(reg.enemy_shots.is_empty());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut reg = EntityRegistry::new();
        let id = reg.spawn_saucer(Vec2::new(500.0, 300.0), 300.0, 0.0, 1000.0);

        let first = reg.destroy(EntitySet::Saucers, id);
        assert!(first.is_some());
        assert!(reg.destroy(EntitySet::Saucers, id).is_none());
        assert_eq!(reg.live_count(EntitySet::Saucers), 0);

        // Dead entry stays in place until compaction
        assert_eq!(reg.saucers.len(), 1);
        reg.compact();
        assert!(reg.saucers.is_empty());
        assert!(reg.destroy(EntitySet::Saucers, id).is_none());
    }

    #[test]
    fn test_destroy_wrong_set_is_noop() {
        let mut reg = EntityRegistry::new();
        let id = reg.spawn_stinger(Vec2::new(500.0, 300.0), 260.0);
        assert!(reg.destroy(EntitySet::Saucers, id).is_none());
        assert!(reg.get(EntitySet::Stingers, id).is_some());
    }

    #[test]
    fn test_asteroid_box_scales_with_tier() {
        let mut reg = EntityRegistry::new();
        let small = reg.spawn_asteroid(Vec2::ZERO, AsteroidSize::Small, Vec2::ZERO, &SCALES);
        let large = reg.spawn_asteroid(Vec2::ZERO, AsteroidSize::Large, Vec2::ZERO, &SCALES);
        let small = reg.get(EntitySet::Asteroids, small).unwrap().size;
        let large = reg.get(EntitySet::Asteroids, large).unwrap().size;
        assert!((small.x - ASTEROID_BASE_SIZE * 0.6).abs() < 1e-4);
        assert!(large.x > small.x);
    }

    #[test]
    fn test_sweep_offscreen_and_expired() {
        let mut reg = EntityRegistry::new();
        reg.spawn_asteroid(Vec2::new(-200.0, 300.0), AsteroidSize::Small, Vec2::NEG_X, &SCALES);
        reg.spawn_asteroid(Vec2::new(800.0, 300.0), AsteroidSize::Small, Vec2::NEG_X, &SCALES);
        reg.spawn_projectile(Owner::Player, Vec2::new(400.0, 300.0), Vec2::X, 500.0);
        reg.spawn_projectile(Owner::Enemy, Vec2::new(400.0, 300.0), Vec2::NEG_X, 5000.0);

        let swept = reg.sweep(500.0);
        assert_eq!(swept, 2);
        reg.compact();
        assert_eq!(reg.asteroids.len(), 1);
        assert!(reg.player_shots.is_empty());
        assert_eq!(reg.enemy_shots.len(), 1);
    }

    #[test]
    fn test_compact_preserves_order() {
        let mut reg = EntityRegistry::new();
        let ids: Vec<_> = (0..5)
            .map(|i| reg.spawn_saucer(Vec2::new(100.0 * i as f32, 300.0), 300.0, 0.0, 0.0))
            .collect();
        reg.destroy(EntitySet::Saucers, ids[1]);
        reg.destroy(EntitySet::Saucers, ids[3]);
        reg.compact();
        let remaining: Vec<_> = reg.saucers.iter().map(|e| e.id).collect();
        assert_eq!(remaining, vec![ids[0], ids[2], ids[4]]);
    }
}
