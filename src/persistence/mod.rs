//! Key-value persistence
//!
//! Features:
//! - String key-value store abstraction (LocalStorage on web, JSON file native)
//! - Player profile (best score + unlocked missions) with monotonic writes
//! - Storage failures are logged and never interrupt gameplay

pub mod profile;
pub mod store;

pub use profile::{HIGH_SCORE_KEY, Profile, UNLOCKED_LEVELS_KEY};
#[cfg(not(target_arch = "wasm32"))]
pub use store::JsonFileStore;
pub use store::{KeyValueStore, MemoryStore, StorageError};
