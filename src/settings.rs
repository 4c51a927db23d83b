//! Player preferences
//!
//! Persisted as one JSON blob next to the profile keys.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StorageError};

/// Audio and behaviour preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Crash/nitro/fanfare volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Engine drone volume (0.0 - 1.0)
    pub engine_volume: f32,
    pub muted: bool,

    // === Behaviour ===
    /// Pause automatically when the page is hidden or loses focus
    pub pause_on_blur: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            engine_volume: 0.5,
            muted: false,
            pause_on_blur: true,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "laneRushSettings";

    /// Effective effect gain after master volume and mute
    pub fn sfx_gain(&self) -> f32 {
        self.gain(self.sfx_volume)
    }

    /// Effective engine gain after master volume and mute
    pub fn engine_gain(&self) -> f32 {
        self.gain(self.engine_volume)
    }

    /// Flip mute and persist; returns the new state
    ///
    /// The in-memory flag changes even if the save fails.
    pub fn toggle_muted(&mut self, store: &mut dyn KeyValueStore) -> bool {
        self.muted = !self.muted;
        if let Err(e) = self.save_to(store) {
            log::warn!("Failed to save settings: {e}");
        }
        self.muted
    }

    fn gain(&self, channel: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * channel).clamp(0.0, 1.0)
        }
    }

    /// Load from `store`, using defaults when missing or unreadable
    pub fn load_from(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings: {e}");
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to read settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_settings_round_trip_through_store() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            muted: true,
            pause_on_blur: false,
            ..Settings::default()
        };
        settings.save_to(&mut store).unwrap();
        assert_eq!(Settings::load_from(&store), settings);
    }

    #[test]
    fn test_partial_blob_keeps_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(Settings::STORAGE_KEY, r#"{"engine_volume":0.1}"#)
            .unwrap();
        let settings = Settings::load_from(&store);
        assert_eq!(settings.engine_volume, 0.1);
        assert_eq!(settings.master_volume, Settings::default().master_volume);
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, "{{{").unwrap();
        assert_eq!(Settings::load_from(&store), Settings::default());
    }

    #[test]
    fn test_mute_silences_every_channel() {
        let settings = Settings {
            muted: true,
            ..Settings::default()
        };
        assert_eq!(settings.sfx_gain(), 0.0);
        assert_eq!(settings.engine_gain(), 0.0);
        assert!((Settings::default().engine_gain() - 0.4).abs() < 0.0001);
    }

    #[test]
    fn test_toggle_muted_persists_and_silences() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();

        assert!(settings.toggle_muted(&mut store));
        assert_eq!(settings.engine_gain(), 0.0);
        assert!(Settings::load_from(&store).muted);

        assert!(!settings.toggle_muted(&mut store));
        assert!(settings.sfx_gain() > 0.0);
        assert!(!Settings::load_from(&store).muted);
    }
}
