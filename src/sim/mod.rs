//! Simulation module
//!
//! All gameplay logic lives here. This module stays free of platform code:
//! - Time arrives as timestamps from the frame driver
//! - Seeded RNG only
//! - Presentation, storage and scheduling sit behind traits

pub mod collision;
pub mod nitro;
pub mod obstacles;
pub mod progression;
pub mod state;
pub mod tick;

pub use collision::{Hitbox, first_hit, vehicle_collides};
pub use nitro::NitroGauge;
pub use obstacles::ObstacleField;
pub use progression::{LevelDefinition, LevelTable, Progression, difficulty_seed, level_target};
pub use state::{Control, GameMode, GamePhase, Obstacle, RunState, Steering, Vehicle};
pub use tick::{Game, Host};
