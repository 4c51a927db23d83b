//! Persisted player profile
//!
//! Two string-encoded integers. Both only ever grow: a write that would
//! lower the stored value is skipped.

use super::store::{KeyValueStore, StorageError};
use crate::consts::LEVEL_COUNT;

/// Best score ever recorded
pub const HIGH_SCORE_KEY: &str = "highScore";
/// Highest selectable mission
pub const UNLOCKED_LEVELS_KEY: &str = "unlockedLevels";

/// Cross-run progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    pub high_score: u64,
    pub unlocked_levels: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            high_score: 0,
            unlocked_levels: 1,
        }
    }
}

impl Profile {
    /// Load from `store`, falling back to defaults for missing or bad values
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();
        let high_score = read_int(store, HIGH_SCORE_KEY).unwrap_or(defaults.high_score);
        let unlocked_levels = read_int(store, UNLOCKED_LEVELS_KEY)
            .map(|v| v.clamp(1, LEVEL_COUNT as u64) as u32)
            .unwrap_or(defaults.unlocked_levels);
        log::info!("Profile loaded: high score {high_score}, {unlocked_levels} missions unlocked");
        Self {
            high_score,
            unlocked_levels,
        }
    }

    /// Record `score` if it beats the best; returns `true` if it did
    ///
    /// A larger value already in `store` wins and is adopted instead.
    pub fn record_score(&mut self, store: &mut dyn KeyValueStore, score: u64) -> bool {
        if score <= self.high_score {
            return false;
        }
        match write_max(store, HIGH_SCORE_KEY, score) {
            Ok(MaxWrite::Written) => {
                self.high_score = score;
                true
            }
            Ok(MaxWrite::Kept(stored)) => {
                self.high_score = stored;
                score > stored
            }
            Err(e) => {
                log::warn!("Failed to save high score: {e}");
                self.high_score = score;
                true
            }
        }
    }

    /// Raise the unlock frontier to `level`; returns `true` if it moved
    pub fn unlock(&mut self, store: &mut dyn KeyValueStore, level: u32) -> bool {
        let level = level.min(LEVEL_COUNT);
        if level <= self.unlocked_levels {
            return false;
        }
        match write_max(store, UNLOCKED_LEVELS_KEY, level as u64) {
            Ok(MaxWrite::Written) => self.unlocked_levels = level,
            Ok(MaxWrite::Kept(stored)) => {
                self.unlocked_levels = (stored as u32).clamp(level, LEVEL_COUNT);
            }
            Err(e) => {
                log::warn!("Failed to save unlocked missions: {e}");
                self.unlocked_levels = level;
            }
        }
        true
    }

    /// Whether `level` may be selected
    #[inline]
    pub fn is_unlocked(&self, level: u32) -> bool {
        (1..=self.unlocked_levels).contains(&level)
    }
}

fn read_int(store: &dyn KeyValueStore, key: &str) -> Option<u64> {
    match store.get(key) {
        Ok(Some(raw)) => match raw.trim().parse::<u64>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring malformed {key} value {raw:?}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::warn!("Failed to read {key}: {e}");
            None
        }
    }
}

/// Outcome of [`write_max`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaxWrite {
    Written,
    /// Store already held this value, at least as large
    Kept(u64),
}

/// Write `value` unless the store already holds something at least as large
fn write_max(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: u64,
) -> Result<MaxWrite, StorageError> {
    let stored = store
        .get(key)?
        .and_then(|raw| raw.trim().parse::<u64>().ok());
    match stored {
        Some(stored) if stored >= value => Ok(MaxWrite::Kept(stored)),
        _ => {
            store.set(key, &value.to_string())?;
            Ok(MaxWrite::Written)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_defaults_on_empty_store() {
        let store = MemoryStore::new();
        assert_eq!(Profile::load(&store), Profile::default());
        assert_eq!(Profile::default().unlocked_levels, 1);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, "lots").unwrap();
        store.set(UNLOCKED_LEVELS_KEY, "999").unwrap();
        let profile = Profile::load(&store);
        assert_eq!(profile.high_score, 0);
        assert_eq!(profile.unlocked_levels, LEVEL_COUNT);
    }

    #[test]
    fn test_lower_score_is_not_written() {
        let mut store = MemoryStore::new();
        let mut profile = Profile::load(&store);
        assert!(profile.record_score(&mut store, 300));
        assert!(!profile.record_score(&mut store, 200));
        assert_eq!(store.peek(HIGH_SCORE_KEY).as_deref(), Some("300"));
    }

    #[test]
    fn test_stale_profile_never_lowers_stored_value() {
        let mut store = MemoryStore::new();
        let mut stale = Profile::load(&store);
        let mut fresh = Profile::load(&store);

        assert!(fresh.record_score(&mut store, 900));
        // Stale copy still believes the best is 0
        assert!(!stale.record_score(&mut store, 500));
        assert_eq!(stale.high_score, 900);
        assert_eq!(store.peek(HIGH_SCORE_KEY).as_deref(), Some("900"));

        // Beating the stored best still counts
        assert!(stale.record_score(&mut store, 901));
        assert_eq!(store.peek(HIGH_SCORE_KEY).as_deref(), Some("901"));
    }

    #[test]
    fn test_stale_unlock_adopts_stored_frontier() {
        let mut store = MemoryStore::new();
        store.set(UNLOCKED_LEVELS_KEY, "7").unwrap();
        let mut stale = Profile::default();

        assert!(stale.unlock(&mut store, 3));
        assert_eq!(stale.unlocked_levels, 7);
        assert_eq!(store.peek(UNLOCKED_LEVELS_KEY).as_deref(), Some("7"));
    }

    #[test]
    fn test_unlock_is_monotonic_and_capped() {
        let mut store = MemoryStore::new();
        let mut profile = Profile::load(&store);
        assert!(profile.unlock(&mut store, 2));
        assert!(!profile.unlock(&mut store, 2));
        assert!(!profile.unlock(&mut store, 1));
        assert!(profile.unlock(&mut store, 500));
        assert_eq!(profile.unlocked_levels, LEVEL_COUNT);
        assert_eq!(store.peek(UNLOCKED_LEVELS_KEY), Some(LEVEL_COUNT.to_string()));
    }

    #[test]
    fn test_is_unlocked() {
        let profile = Profile {
            high_score: 0,
            unlocked_levels: 3,
        };
        assert!(!profile.is_unlocked(0));
        assert!(profile.is_unlocked(3));
        assert!(!profile.is_unlocked(4));
    }
}
