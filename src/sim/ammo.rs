//! Magazine and reload
//!
//! Two states: Ready and Reloading. The shot that fills the magazine starts
//! the reload; the reload always runs its full duration.

use serde::{Deserialize, Serialize};

/// Result of a fire request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Shot accepted; `reload_started` when it emptied the magazine
    Fired { reload_started: bool },
    /// Magazine was already empty; reload began, no shot
    Empty,
    /// Reload in progress; no shot
    Reloading,
}

impl FireOutcome {
    pub fn fired(self) -> bool {
        matches!(self, FireOutcome::Fired { .. })
    }
}

/// Ammunition state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmmoState {
    /// Shots used from the current magazine (0..=max_shots)
    pub shots_used: u32,
    pub max_shots: u32,
    pub reload_ms: f64,
    reloading: bool,
    reload_started_at: f64,
}

impl AmmoState {
    pub fn new(max_shots: u32, reload_ms: f64) -> Self {
        Self {
            shots_used: 0,
            max_shots,
            reload_ms,
            reloading: false,
            reload_started_at: 0.0,
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn reload_started_at(&self) -> Option<f64> {
        self.reloading.then_some(self.reload_started_at)
    }

    fn begin_reload(&mut self, now: f64) {
        self.reloading = true;
        self.reload_started_at = now;
        log::debug!("Reload started at {:.0}ms", now);
    }

    /// Request one shot
    pub fn try_fire(&mut self, now: f64) -> FireOutcome {
        if self.reloading {
            return FireOutcome::Reloading;
        }
        if self.shots_used >= self.max_shots {
            self.begin_reload(now);
            return FireOutcome::Empty;
        }

        self.shots_used += 1;
        let reload_started = self.shots_used >= self.max_shots;
        if reload_started {
            self.begin_reload(now);
        }
        FireOutcome::Fired { reload_started }
    }

    /// Complete the reload once its full duration has elapsed
    ///
    /// Returns true on the tick the magazine refills.
    pub fn update(&mut self, now: f64) -> bool {
        if self.reloading && now - self.reload_started_at >= self.reload_ms {
            self.reloading = false;
            self.shots_used = 0;
            log::debug!("Reload complete at {:.0}ms", now);
            return true;
        }
        false
    }

    /// HUD arc: fraction used, or a shrinking fraction while reloading
    pub fn ratio(&self, now: f64) -> f32 {
        if self.reloading {
            let elapsed = (now - self.reload_started_at).max(0.0);
            (1.0 - elapsed / self.reload_ms).clamp(0.0, 1.0) as f32
        } else {
            self.shots_used as f32 / self.max_shots as f32
        }
    }

    /// Full magazine, not reloading
    pub fn reset(&mut self) {
        self.shots_used = 0;
        self.reloading = false;
        self.reload_started_at = 0.0;
    }
}
