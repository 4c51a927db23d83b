//! Lane Rush - A four-lane arcade driving game
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (obstacles, collisions, nitro, missions)
//! - `platform`: Clock and frame-scheduling abstraction (browser/native)
//! - `persistence`: Key-value storage and the persisted player profile
//! - `tuning`: Data-driven game balance
//! - `settings`: Audio and pause preferences
//! - `ui`: Presentation sink and per-frame snapshots
//! - `autopilot`: Demo driver for attract mode and headless runs

pub mod autopilot;
#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Reference frame duration (ms) that speeds are expressed against
    pub const FRAME_UNIT_MS: f64 = 16.0;
    /// Largest delta a single frame may simulate (prevents spiral of death)
    pub const MAX_FRAME_DELTA_MS: f64 = 40.0;

    /// Track dimensions
    pub const TRACK_WIDTH: f32 = 400.0;
    pub const TRACK_HEIGHT: f32 = 600.0;
    pub const LANE_COUNT: u32 = 4;
    pub const LANE_WIDTH: f32 = TRACK_WIDTH / LANE_COUNT as f32;
    /// Horizontal gap between a lane edge and the car inside it
    pub const LANE_MARGIN: f32 = 10.0;

    /// Player car
    pub const VEHICLE_WIDTH: f32 = LANE_WIDTH - LANE_MARGIN * 2.0;
    pub const VEHICLE_HEIGHT: f32 = 130.0;
    pub const VEHICLE_START_Y: f32 = 460.0;
    /// Lateral steering speed (px/s)
    pub const VEHICLE_MAX_SPEED: f32 = 500.0;

    /// Traffic cars
    pub const OBSTACLE_WIDTH: f32 = VEHICLE_WIDTH;
    pub const OBSTACLE_HEIGHT: f32 = 130.0;
    /// Extra distance above the track where obstacles appear
    pub const OBSTACLE_SPAWN_GAP: f32 = 20.0;
    /// Distance below the track after which obstacles are dropped
    pub const OBSTACLE_RETIRE_MARGIN: f32 = 100.0;
    /// Number of traffic car sprites
    pub const OBSTACLE_VARIANTS: u32 = 4;

    /// Fraction of the visual size used for collision boxes
    pub const HITBOX_SCALE: f32 = 0.7;

    /// Mission count
    pub const LEVEL_COUNT: u32 = 50;
}

/// Left edge of the car slot inside `lane`
#[inline]
pub fn lane_x(lane: u32) -> f32 {
    consts::LANE_MARGIN + lane as f32 * consts::LANE_WIDTH
}

/// Lane whose slot contains the horizontal center of a box at `x`
#[inline]
pub fn lane_at(x: f32, width: f32) -> u32 {
    let center = x + width / 2.0;
    ((center / consts::LANE_WIDTH).floor().max(0.0) as u32).min(consts::LANE_COUNT - 1)
}
