//! Axis-aligned bounding-box collision
//!
//! Simple rectangle overlap, no continuous detection. The resolver marks both
//! participants dead as it pairs them, so a target already claimed this frame
//! (or a spent shot) is skipped by every later test.

use glam::Vec2;

use super::state::{Entity, Player};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Overlap test; touching edges count as a hit
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.max.y < other.min.y
            || self.min.x > other.max.x
            || self.min.y > other.max.y)
    }
}

impl Entity {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }
}

impl Player {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }
}

/// A shot that connected with a target
#[derive(Debug, Clone)]
pub struct ShotHit {
    /// Snapshot of the target at the moment it was hit
    pub target: Entity,
}

/// Pair live shots with live targets
///
/// Each shot hits at most the first overlapping target in insertion order.
/// Both the shot and the target are marked dead on a hit.
pub fn resolve_shots(shots: &mut [Entity], targets: &mut [Entity]) -> Vec<ShotHit> {
    let mut hits = Vec::new();
    for shot in shots.iter_mut().filter(|s| s.alive) {
        let shot_box = shot.bounds();
        if let Some(target) = targets
            .iter_mut()
            .find(|t| t.alive && t.bounds().intersects(&shot_box))
        {
            shot.alive = false;
            target.alive = false;
            hits.push(ShotHit {
                target: target.clone(),
            });
        }
    }
    hits
}

/// Indices of live entities overlapping `area`, in insertion order
pub fn overlapping(area: &Aabb, entities: &[Entity]) -> Vec<usize> {
    entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.alive && e.bounds().intersects(area))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::EntityRegistry;
    use crate::sim::state::{AsteroidSize, Owner};

    const SCALES: [f32; 3] = [0.6, 1.0, 1.4];

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::from_center(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::from_center(Vec2::new(8.0, 0.0), Vec2::new(10.0, 10.0));
        let c = Aabb::from_center(Vec2::new(30.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_aabb_touching_edges() {
        let a = Aabb::from_center(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::from_center(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_shot_kills_one_target() {
        let mut reg = EntityRegistry::new();
        reg.spawn_projectile(Owner::Player, Vec2::new(500.0, 300.0), Vec2::X, 1200.0);
        // Two stacked asteroids under one shot
        let first = reg.spawn_asteroid(Vec2::new(505.0, 300.0), AsteroidSize::Medium, Vec2::ZERO, &SCALES);
        reg.spawn_asteroid(Vec2::new(506.0, 300.0), AsteroidSize::Medium, Vec2::ZERO, &SCALES);

        let hits = resolve_shots(&mut reg.player_shots, &mut reg.asteroids);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target.id, first);
        assert!(!reg.player_shots[0].alive);
        assert_eq!(reg.asteroids.iter().filter(|a| a.alive).count(), 1);
    }

    #[test]
    fn test_two_shots_one_target() {
        let mut reg = EntityRegistry::new();
        reg.spawn_projectile(Owner::Player, Vec2::new(500.0, 300.0), Vec2::X, 1200.0);
        reg.spawn_projectile(Owner::Player, Vec2::new(502.0, 300.0), Vec2::X, 1200.0);
        reg.spawn_saucer(Vec2::new(505.0, 300.0), 300.0, 0.0, 1e9);

        let hits = resolve_shots(&mut reg.player_shots, &mut reg.saucers);
        // Second shot finds the saucer already dead and flies on
        assert_eq!(hits.len(), 1);
        assert!(!reg.player_shots[0].alive);
        assert!(reg.player_shots[1].alive);
    }

    #[test]
    fn test_spent_shot_ignored() {
        let mut reg = EntityRegistry::new();
        let shot = reg.spawn_projectile(Owner::Player, Vec2::new(500.0, 300.0), Vec2::X, 1200.0);
        reg.spawn_saucer(Vec2::new(505.0, 300.0), 300.0, 0.0, 1e9);
        reg.destroy(crate::sim::EntitySet::PlayerShots, shot);

        let hits = resolve_shots(&mut reg.player_shots, &mut reg.saucers);
        assert!(hits.is_empty());
        assert!(reg.saucers[0].alive);
    }

    #[test]
    fn test_overlapping_skips_dead() {
        let mut reg = EntityRegistry::new();
        let a = reg.spawn_saucer(Vec2::new(140.0, 360.0), 300.0, 0.0, 1e9);
        reg.spawn_saucer(Vec2::new(150.0, 360.0), 300.0, 0.0, 1e9);
        reg.spawn_saucer(Vec2::new(900.0, 360.0), 300.0, 0.0, 1e9);
        reg.destroy(crate::sim::EntitySet::Saucers, a);

        let player = Player::default();
        assert_eq!(overlapping(&player.bounds(), &reg.saucers), vec![1]);
    }
}
