//! Timed buffs and pickup drop tables
//!
//! Each buff is an optional expiry timestamp. Picking up a buff that is
//! already running replaces its expiry with `now + duration`; durations never
//! stack.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::PowerUpKind;
use crate::tuning::PowerUpTuning;

/// Timed buffs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    Shield,
    DoubleShot,
    ScoreMultiplier,
}

impl BuffKind {
    pub const ALL: [BuffKind; 3] = [BuffKind::Shield, BuffKind::DoubleShot, BuffKind::ScoreMultiplier];

    pub fn duration_ms(self, tuning: &PowerUpTuning) -> f64 {
        match self {
            BuffKind::Shield => tuning.shield_ms,
            BuffKind::DoubleShot => tuning.double_shot_ms,
            BuffKind::ScoreMultiplier => tuning.multiplier_ms,
        }
    }
}

impl PowerUpKind {
    /// The buff a pickup grants, if it is a timed one
    pub fn buff(self) -> Option<BuffKind> {
        match self {
            PowerUpKind::Shield => Some(BuffKind::Shield),
            PowerUpKind::DoubleShot => Some(BuffKind::DoubleShot),
            PowerUpKind::ScoreMultiplier => Some(BuffKind::ScoreMultiplier),
            PowerUpKind::ExtraLife => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
struct BuffTimer {
    started_at: f64,
    expires_at: f64,
}

/// Active buff timers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Buffs {
    shield: Option<BuffTimer>,
    double_shot: Option<BuffTimer>,
    multiplier: Option<BuffTimer>,
}

impl Buffs {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: BuffKind) -> &Option<BuffTimer> {
        match kind {
            BuffKind::Shield => &self.shield,
            BuffKind::DoubleShot => &self.double_shot,
            BuffKind::ScoreMultiplier => &self.multiplier,
        }
    }

    fn slot_mut(&mut self, kind: BuffKind) -> &mut Option<BuffTimer> {
        match kind {
            BuffKind::Shield => &mut self.shield,
            BuffKind::DoubleShot => &mut self.double_shot,
            BuffKind::ScoreMultiplier => &mut self.multiplier,
        }
    }

    /// Start or refresh a buff; returns true if it was already running
    pub fn activate(&mut self, kind: BuffKind, now: f64, duration_ms: f64) -> bool {
        let slot = self.slot_mut(kind);
        let refreshed = slot.is_some();
        *slot = Some(BuffTimer {
            started_at: now,
            expires_at: now + duration_ms,
        });
        refreshed
    }

    pub fn is_active(&self, kind: BuffKind) -> bool {
        self.slot(kind).is_some()
    }

    pub fn expires_at(&self, kind: BuffKind) -> Option<f64> {
        self.slot(kind).map(|t| t.expires_at)
    }

    /// Remaining share of the buff's duration in [0, 1]
    pub fn remaining_fraction(&self, kind: BuffKind, now: f64) -> f32 {
        match self.slot(kind) {
            Some(t) => {
                let total = t.expires_at - t.started_at;
                if total <= 0.0 {
                    0.0
                } else {
                    ((t.expires_at - now) / total).clamp(0.0, 1.0) as f32
                }
            }
            None => 0.0,
        }
    }

    /// Clear every buff whose expiry has passed
    pub fn update(&mut self, now: f64) -> Vec<BuffKind> {
        let mut expired = Vec::new();
        for kind in BuffKind::ALL {
            let slot = self.slot_mut(kind);
            if slot.is_some_and(|t| now >= t.expires_at) {
                *slot = None;
                expired.push(kind);
            }
        }
        expired
    }

    /// Score factor from the multiplier buff
    pub fn score_factor(&self, tuning: &PowerUpTuning) -> u64 {
        if self.is_active(BuffKind::ScoreMultiplier) {
            tuning.score_multiplier
        } else {
            1
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Roll the large-asteroid drop table
pub fn roll_asteroid_drop<R: Rng + ?Sized>(rng: &mut R, tuning: &PowerUpTuning) -> Option<PowerUpKind> {
    if !rng.random_bool(tuning.asteroid_drop_chance) {
        return None;
    }
    Some(if rng.random_bool(tuning.double_shot_share) {
        PowerUpKind::DoubleShot
    } else {
        PowerUpKind::ScoreMultiplier
    })
}

/// Roll the saucer drop table for a 1-based wave number
pub fn roll_saucer_drop<R: Rng + ?Sized>(
    rng: &mut R,
    tuning: &PowerUpTuning,
    wave: u32,
) -> Option<PowerUpKind> {
    if wave < tuning.saucer_drop_from_wave || !rng.random_bool(tuning.saucer_drop_chance) {
        return None;
    }
    Some(if rng.random_bool(tuning.shield_share) {
        PowerUpKind::Shield
    } else {
        PowerUpKind::ExtraLife
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_refresh_replaces_expiry() {
        let mut buffs = Buffs::new();
        assert!(!buffs.activate(BuffKind::Shield, 0.0, 5000.0));
        assert!(buffs.activate(BuffKind::Shield, 3000.0, 5000.0));
        // 3000 + 5000, not 0 + 10000
        assert_eq!(buffs.expires_at(BuffKind::Shield), Some(8000.0));
    }

    #[test]
    fn test_expiry_polled() {
        let mut buffs = Buffs::new();
        buffs.activate(BuffKind::DoubleShot, 0.0, 8000.0);
        buffs.activate(BuffKind::ScoreMultiplier, 1000.0, 8000.0);

        assert!(buffs.update(7999.0).is_empty());
        assert_eq!(buffs.update(8000.0), vec![BuffKind::DoubleShot]);
        assert!(!buffs.is_active(BuffKind::DoubleShot));
        assert!(buffs.is_active(BuffKind::ScoreMultiplier));
        assert_eq!(buffs.update(9000.0), vec![BuffKind::ScoreMultiplier]);
        assert!(buffs.update(20_000.0).is_empty());
    }

    #[test]
    fn test_remaining_fraction() {
        let mut buffs = Buffs::new();
        buffs.activate(BuffKind::Shield, 1000.0, 4000.0);
        assert!((buffs.remaining_fraction(BuffKind::Shield, 1000.0) - 1.0).abs() < 1e-6);
        assert!((buffs.remaining_fraction(BuffKind::Shield, 3000.0) - 0.5).abs() < 1e-6);
        assert_eq!(buffs.remaining_fraction(BuffKind::DoubleShot, 3000.0), 0.0);
    }

    #[test]
    fn test_score_factor() {
        let tuning = PowerUpTuning::default();
        let mut buffs = Buffs::new();
        assert_eq!(buffs.score_factor(&tuning), 1);
        buffs.activate(BuffKind::ScoreMultiplier, 0.0, 100.0);
        assert_eq!(buffs.score_factor(&tuning), 2);
    }

    #[test]
    fn test_asteroid_drops_are_offensive_buffs() {
        let tuning = PowerUpTuning {
            asteroid_drop_chance: 1.0,
            ..PowerUpTuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..200 {
            let kind = roll_asteroid_drop(&mut rng, &tuning).unwrap();
            assert!(matches!(kind, PowerUpKind::DoubleShot | PowerUpKind::ScoreMultiplier));
        }
    }

    #[test]
    fn test_saucer_drops_gated_by_wave() {
        let tuning = PowerUpTuning {
            saucer_drop_chance: 1.0,
            ..PowerUpTuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(42);
        assert_eq!(roll_saucer_drop(&mut rng, &tuning, 1), None);
        let kind = roll_saucer_drop(&mut rng, &tuning, 2).unwrap();
        assert!(matches!(kind, PowerUpKind::Shield | PowerUpKind::ExtraLife));
    }

    #[test]
    fn test_zero_chance_never_drops() {
        let tuning = PowerUpTuning {
            asteroid_drop_chance: 0.0,
            ..PowerUpTuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        assert!((0..100).all(|_| roll_asteroid_drop(&mut rng, &tuning).is_none()));
    }
}
