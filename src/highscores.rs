//! Best-score persistence
//!
//! A single best score per install, stored under a namespaced key. Storage
//! failures never reach the session: reads degrade to "no previous best"
//! and failed writes are logged and dropped.

use crate::platform::KeyValueStore;

/// Result of offering a final score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighScoreUpdate {
    /// This score beat the previous best
    pub is_new: bool,
    /// Best score after the update
    pub best: u64,
}

/// Synchronous best-score service the session reports to
pub trait HighScoreService {
    /// Current best (0 when none or when storage is unavailable)
    fn high_score(&self) -> u64;
    /// Record `final_score` if it beats the current best
    fn try_update_high_score(&mut self, final_score: u64) -> HighScoreUpdate;
}

/// Best score kept in a `KeyValueStore`
#[derive(Debug)]
pub struct StoredHighScore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StoredHighScore<S> {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "astro_highscore_v1";

    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Clear the stored best (debug/testing)
    pub fn reset(&mut self) {
        if let Err(e) = self.store.remove(Self::STORAGE_KEY) {
            log::warn!("Failed to reset high score: {}", e);
        }
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: KeyValueStore> HighScoreService for StoredHighScore<S> {
    fn high_score(&self) -> u64 {
        match self.store.get(Self::STORAGE_KEY) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring unreadable high score {:?}", raw);
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                log::warn!("Failed to read high score: {}", e);
                0
            }
        }
    }

    fn try_update_high_score(&mut self, final_score: u64) -> HighScoreUpdate {
        let current = self.high_score();
        if final_score > current {
            if let Err(e) = self.store.set(Self::STORAGE_KEY, &final_score.to_string()) {
                log::warn!("Failed to save high score: {}", e);
            } else {
                log::info!("New high score: {}", final_score);
            }
            HighScoreUpdate {
                is_new: true,
                best: final_score,
            }
        } else {
            HighScoreUpdate {
                is_new: false,
                best: current,
            }
        }
    }
}

/// Service that never remembers anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHighScore;

impl HighScoreService for NoHighScore {
    fn high_score(&self) -> u64 {
        0
    }

    fn try_update_high_score(&mut self, final_score: u64) -> HighScoreUpdate {
        HighScoreUpdate {
            is_new: final_score > 0,
            best: final_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MemoryStore, StorageError};

    /// Store whose every call fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[test]
    fn test_empty_store_has_no_best() {
        let scores = StoredHighScore::new(MemoryStore::new());
        assert_eq!(scores.high_score(), 0);
    }

    #[test]
    fn test_update_only_when_higher() {
        let mut scores = StoredHighScore::new(MemoryStore::new());

        let first = scores.try_update_high_score(1500);
        assert_eq!(first, HighScoreUpdate { is_new: true, best: 1500 });

        let lower = scores.try_update_high_score(900);
        assert_eq!(lower, HighScoreUpdate { is_new: false, best: 1500 });

        let equal = scores.try_update_high_score(1500);
        assert!(!equal.is_new);

        assert_eq!(scores.high_score(), 1500);
    }

    #[test]
    fn test_unreadable_value_degrades_to_zero() {
        let mut store = MemoryStore::new();
        store.set(StoredHighScore::<MemoryStore>::STORAGE_KEY, "banana").unwrap();
        let mut scores = StoredHighScore::new(store);
        assert_eq!(scores.high_score(), 0);
        assert!(scores.try_update_high_score(10).is_new);
        assert_eq!(scores.high_score(), 10);
    }

    #[test]
    fn test_broken_storage_does_not_panic() {
        let mut scores = StoredHighScore::new(BrokenStore);
        assert_eq!(scores.high_score(), 0);
        let update = scores.try_update_high_score(300);
        assert_eq!(update, HighScoreUpdate { is_new: true, best: 300 });
        scores.reset();
    }

    #[test]
    fn test_reset_clears_best() {
        let mut scores = StoredHighScore::new(MemoryStore::new());
        scores.try_update_high_score(42);
        scores.reset();
        assert_eq!(scores.high_score(), 0);
    }
}
