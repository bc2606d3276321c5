//! Kill scoring with combo and streak multipliers
//!
//! points = base × power-up factor × combo × streak bonus
//!
//! Combo climbs on every kill and falls back to 1 after a silence window,
//! polled each tick. Streak tracks kills chained within a short window and
//! is the one reset by taking damage.

use serde::{Deserialize, Serialize};

use super::state::HazardKind;
use crate::tuning::ScoreTuning;

/// Breakdown of one kill award
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub base: u64,
    pub powerup_factor: u64,
    /// Combo level applied to this kill
    pub combo: u32,
    /// Streak bonus applied to this kill
    pub streak_bonus: f64,
    pub points: u64,
}

/// Combo/streak bookkeeping for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringEngine {
    config: ScoreTuning,
    combo: u32,
    combo_expires_at: Option<f64>,
    peak_combo: u32,
    streak: u32,
    last_kill_at: Option<f64>,
}

impl ScoringEngine {
    pub fn new(config: ScoreTuning) -> Self {
        Self {
            config,
            combo: 1,
            combo_expires_at: None,
            peak_combo: 1,
            streak: 0,
            last_kill_at: None,
        }
    }

    pub fn base_points(&self, kind: HazardKind) -> u64 {
        match kind {
            HazardKind::Saucer => self.config.saucer_points,
            HazardKind::Stinger => self.config.stinger_points,
            HazardKind::Asteroid => self.config.asteroid_points,
        }
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn peak_combo(&self) -> u32 {
        self.peak_combo
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Chained kills beyond the first, capped
    fn streak_steps(&self) -> u32 {
        self.streak.saturating_sub(1).min(self.config.streak_cap)
    }

    /// Current streak bonus factor (1.0 for a lone kill)
    pub fn streak_multiplier(&self) -> f64 {
        1.0 + self.streak_steps() as f64 * self.config.streak_step
    }

    /// Score a kill at `now`; `powerup_factor` is 1 unless a multiplier buff is up
    pub fn register_kill(&mut self, kind: HazardKind, now: f64, powerup_factor: u64) -> Award {
        let chained = self
            .last_kill_at
            .is_some_and(|last| now - last <= self.config.streak_window_ms);
        self.streak = if chained { self.streak + 1 } else { 1 };
        self.last_kill_at = Some(now);

        let combo = self.combo;
        let base = self.base_points(kind);
        let streak_bonus = self.streak_multiplier();
        let points = ((base * powerup_factor * combo as u64) as f64 * streak_bonus).round() as u64;

        self.combo = (self.combo + 1).min(self.config.combo_max);
        self.peak_combo = self.peak_combo.max(self.combo);
        self.combo_expires_at = Some(now + self.config.combo_window_ms);

        Award {
            base,
            powerup_factor,
            combo,
            streak_bonus,
            points,
        }
    }

    /// Decay the combo once its window has run out
    ///
    /// Returns true on the tick the combo drops back to 1.
    pub fn update(&mut self, now: f64) -> bool {
        match self.combo_expires_at {
            Some(expires) if now >= expires => {
                self.combo_expires_at = None;
                let decayed = self.combo > 1;
                self.combo = 1;
                decayed
            }
            _ => false,
        }
    }

    /// Player took damage; returns true if the streak was cleared
    pub fn on_player_hit(&mut self) -> bool {
        if self.config.player_hit_resets_streak && self.streak > 0 {
            self.streak = 0;
            self.last_kill_at = None;
            return true;
        }
        false
    }

    /// Start a new wave's peak tracking from the current combo
    pub fn reset_peak(&mut self) {
        self.peak_combo = self.combo;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoreTuning::default())
    }

    #[test]
    fn test_lone_kill_is_base() {
        let mut scoring = engine();
        let award = scoring.register_kill(HazardKind::Saucer, 1000.0, 1);
        assert_eq!(award.points, 200);
        assert_eq!(award.combo, 1);
        assert_eq!(scoring.streak(), 1);
    }

    #[test]
    fn test_streak_chain_and_reset() {
        let mut scoring = engine();
        scoring.register_kill(HazardKind::Asteroid, 0.0, 1);
        scoring.register_kill(HazardKind::Asteroid, 1000.0, 1);
        assert_eq!(scoring.streak(), 2);
        assert!((scoring.streak_multiplier() - 1.2).abs() < 1e-9);

        // Gap longer than the window starts over
        scoring.register_kill(HazardKind::Asteroid, 1000.0 + 1201.0, 1);
        assert_eq!(scoring.streak(), 1);
        assert!((scoring.streak_multiplier() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_streak_cap() {
        let mut scoring = engine();
        for i in 0..20 {
            scoring.register_kill(HazardKind::Asteroid, i as f64 * 100.0, 1);
        }
        assert_eq!(scoring.streak(), 20);
        // 5 steps of 20%
        assert!((scoring.streak_multiplier() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_combo_multiplies_and_caps() {
        let mut scoring = engine();
        let awards: Vec<_> = (0..7)
            .map(|i| scoring.register_kill(HazardKind::Asteroid, i as f64 * 2000.0, 1))
            .collect();
        // 2000ms apart: outside streak window, inside combo window
        let combos: Vec<_> = awards.iter().map(|a| a.combo).collect();
        assert_eq!(combos, vec![1, 2, 3, 4, 5, 5, 5]);
        assert_eq!(awards[2].points, 50 * 3);
        assert_eq!(scoring.peak_combo(), 5);
    }

    #[test]
    fn test_combo_decays_after_window() {
        let mut scoring = engine();
        scoring.register_kill(HazardKind::Saucer, 0.0, 1);
        scoring.register_kill(HazardKind::Saucer, 100.0, 1);
        assert_eq!(scoring.combo(), 3);

        assert!(!scoring.update(100.0 + 2499.0));
        assert_eq!(scoring.combo(), 3);
        assert!(scoring.update(100.0 + 2500.0));
        assert_eq!(scoring.combo(), 1);
        // Only reports once
        assert!(!scoring.update(10_000.0));
    }

    #[test]
    fn test_powerup_factor() {
        let mut scoring = engine();
        let award = scoring.register_kill(HazardKind::Stinger, 0.0, 2);
        assert_eq!(award.points, 240);
    }

    #[test]
    fn test_full_stack() {
        let mut scoring = engine();
        scoring.register_kill(HazardKind::Asteroid, 0.0, 1);
        // combo 2, streak 2 (1.2x), multiplier 2x: 200 * 2 * 2 * 1.2
        let award = scoring.register_kill(HazardKind::Saucer, 500.0, 2);
        assert_eq!(award.points, 960);
    }

    #[test]
    fn test_hit_resets_streak_not_combo() {
        let mut scoring = engine();
        scoring.register_kill(HazardKind::Asteroid, 0.0, 1);
        scoring.register_kill(HazardKind::Asteroid, 100.0, 1);
        assert!(scoring.on_player_hit());
        assert_eq!(scoring.streak(), 0);
        assert_eq!(scoring.combo(), 3);

        // Next kill starts a fresh chain even inside the old window
        scoring.register_kill(HazardKind::Asteroid, 200.0, 1);
        assert_eq!(scoring.streak(), 1);
    }

    #[test]
    fn test_hit_reset_configurable() {
        let mut scoring = ScoringEngine::new(ScoreTuning {
            player_hit_resets_streak: false,
            ..ScoreTuning::default()
        });
        scoring.register_kill(HazardKind::Asteroid, 0.0, 1);
        assert!(!scoring.on_player_hit());
        assert_eq!(scoring.streak(), 1);
    }
}
