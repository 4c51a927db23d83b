//! Run state and core simulation types
//!
//! Everything a single run mutates lives here; the persisted profile is the
//! only state that outlives a run.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::nitro::NitroGauge;
use super::progression::{Progression, difficulty_seed};
use crate::Tuning;
use crate::consts::*;

/// Current phase of the game loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Before the first run
    #[default]
    Idle,
    /// Active gameplay
    Running,
    /// Run suspended, no time accrues
    Paused,
    /// Run ended by a collision
    Terminal,
}

/// Which kind of run is being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Endless run with the default starting difficulty
    #[default]
    Free,
    /// Mission run seeded from the selected level
    Level { level: u32 },
}

impl GameMode {
    /// Selected level, if this is a mission run
    pub fn level(&self) -> Option<u32> {
        match self {
            GameMode::Free => None,
            GameMode::Level { level } => Some(*level),
        }
    }
}

/// Discrete player controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Left,
    Right,
    Boost,
}

/// Steering direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Steering {
    Left,
    #[default]
    Straight,
    Right,
}

impl Steering {
    /// Signed direction in {-1, 0, +1}
    pub fn sign(self) -> f32 {
        match self {
            Steering::Left => -1.0,
            Steering::Straight => 0.0,
            Steering::Right => 1.0,
        }
    }
}

/// The player's car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub steering: Steering,
    /// Lateral speed (px/s)
    pub max_speed: f32,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            pos: Vec2::new((TRACK_WIDTH - VEHICLE_WIDTH) / 2.0, VEHICLE_START_Y),
            size: Vec2::new(VEHICLE_WIDTH, VEHICLE_HEIGHT),
            steering: Steering::Straight,
            max_speed: VEHICLE_MAX_SPEED,
        }
    }
}

impl Vehicle {
    /// Rightmost legal x position
    #[inline]
    pub fn max_x(&self) -> f32 {
        (TRACK_WIDTH - self.size.x).max(0.0)
    }

    /// Move sideways for `delta_ms` and clamp to the track
    pub fn steer(&mut self, delta_ms: f64) {
        let step = self.max_speed * (delta_ms / 1000.0) as f32;
        self.pos.x += self.steering.sign() * step;
        self.clamp_to_track();
    }

    pub fn clamp_to_track(&mut self) {
        self.pos.x = self.pos.x.clamp(0.0, self.max_x());
    }

    /// Press a direction: the newest press always wins
    pub fn press(&mut self, steering: Steering) {
        self.steering = steering;
    }

    /// Release a direction: ignored if a newer press replaced it
    pub fn release(&mut self, steering: Steering) {
        if self.steering == steering {
            self.steering = Steering::Straight;
        }
    }
}

/// A traffic car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Downward speed (px per reference frame)
    pub speed: f32,
    /// Sprite index in [0, OBSTACLE_VARIANTS)
    pub variant: u32,
    pub lane: u32,
}

/// Mutable state of a single run
///
/// Reset wholesale on every start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub phase: GamePhase,
    pub mode: GameMode,
    /// Simulated time since the run started (ms)
    pub elapsed_ms: f64,
    /// Time since the last spawn (ms)
    pub spawn_timer_ms: f64,
    pub spawn_interval_ms: f64,
    /// Obstacle base speed after ramps
    pub base_speed: f32,
    pub nitro: NitroGauge,
    /// Highest level reached this run
    pub progression: Progression,
    pub score: u64,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(GameMode::Free, &Tuning::default())
    }
}

impl RunState {
    /// Fresh run state seeded from the mode
    pub fn new(mode: GameMode, tuning: &Tuning) -> Self {
        let (base_speed, spawn_interval_ms) = difficulty_seed(mode, tuning);
        Self {
            phase: GamePhase::Idle,
            mode,
            elapsed_ms: 0.0,
            spawn_timer_ms: 0.0,
            spawn_interval_ms,
            base_speed,
            nitro: NitroGauge::new(tuning.nitro_max),
            progression: Progression::new(mode.level().unwrap_or(1)),
            score: 0,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self.phase, GamePhase::Running | GamePhase::Paused)
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    /// Apply every ramp boundary crossed during the last `delta_ms`
    ///
    /// Returns the number of ramps applied.
    pub fn apply_difficulty_ramp(&mut self, delta_ms: f64, tuning: &Tuning) -> u32 {
        let period = tuning.ramp_period_ms;
        let before = ((self.elapsed_ms - delta_ms).max(0.0) / period).floor();
        let after = (self.elapsed_ms / period).floor();
        let crossings = (after - before).max(0.0) as u32;

        for _ in 0..crossings {
            self.base_speed += tuning.ramp_speed_step;
            let shrunk = (self.spawn_interval_ms - tuning.ramp_interval_step_ms)
                .max(tuning.ramp_interval_floor_ms);
            // Levels may seed below the ramp floor; the ramp never slows spawning
            self.spawn_interval_ms = self.spawn_interval_ms.min(shrunk);
        }
        crossings
    }

    /// Score earned over `delta_ms` at the current speed
    pub fn score_increment(&self, delta_ms: f64, tuning: &Tuning) -> u64 {
        let boost = if self.nitro.is_active() {
            tuning.boost_score_bonus as f64
        } else {
            0.0
        };
        let rate = 1.0 + self.base_speed as f64 / 4.0 + boost;
        (rate * (delta_ms / FRAME_UNIT_MS)).round().max(0.0) as u64
    }
}
