//! Missions: level table, score targets and the unlock frontier

use serde::{Deserialize, Serialize};

use super::state::GameMode;
use crate::Tuning;
use crate::consts::LEVEL_COUNT;

/// Road names, cycled every ten levels
const ROUTES: [&str; 10] = [
    "Suburb Sprint",
    "Harbor Run",
    "Canyon Pass",
    "Neon Strip",
    "Desert Highway",
    "Mountain Switchback",
    "Coastal Drift",
    "Industrial Belt",
    "Midnight Express",
    "Storm Circuit",
];

/// Tier suffix for each block of ten levels
const TIERS: [&str; 5] = ["I", "II", "III", "IV", "V"];

/// A mission: ordinal, display name and score target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub ordinal: u32,
    pub name: String,
    pub target: u64,
}

/// Score needed to clear level `ordinal` (1-based)
///
/// Grows quadratically so late missions need disproportionately more.
pub fn level_target(ordinal: u32) -> u64 {
    let i = ordinal as u64;
    500 + i.saturating_sub(1) * 800 + i * i * 20
}

/// Starting `(base_speed, spawn_interval_ms)` for a run
pub fn difficulty_seed(mode: GameMode, tuning: &Tuning) -> (f32, f64) {
    match mode {
        GameMode::Free => (tuning.base_speed, tuning.spawn_interval_ms),
        GameMode::Level { level } => {
            let steps = level.clamp(1, LEVEL_COUNT) - 1;
            let speed = tuning.base_speed + steps as f32 * tuning.level_speed_step;
            let interval = (tuning.spawn_interval_ms - steps as f64 * tuning.level_interval_step_ms)
                .max(tuning.level_interval_floor_ms);
            (speed, interval)
        }
    }
}

/// Immutable ordered table of every mission
#[derive(Debug, Clone)]
pub struct LevelTable {
    levels: Vec<LevelDefinition>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelTable {
    pub fn new() -> Self {
        let levels = (1..=LEVEL_COUNT)
            .map(|ordinal| {
                let idx = (ordinal - 1) as usize;
                let route = ROUTES[idx % ROUTES.len()];
                let tier = TIERS[(idx / ROUTES.len()).min(TIERS.len() - 1)];
                LevelDefinition {
                    ordinal,
                    name: format!("{route} {tier}"),
                    target: level_target(ordinal),
                }
            })
            .collect();
        Self { levels }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.levels.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.iter()
    }

    /// Level by 1-based ordinal, clamped to the table bounds
    pub fn get(&self, ordinal: u32) -> &LevelDefinition {
        let idx = ordinal.clamp(1, self.len()) - 1;
        &self.levels[idx as usize]
    }

    /// Highest level whose own target `score` has met, else level 1
    pub fn reached_level(&self, score: u64) -> u32 {
        (1..=self.len())
            .rev()
            .find(|&i| score >= self.get(i).target)
            .unwrap_or(1)
    }

    /// Mission progress toward `ordinal`'s target, as a whole percentage
    pub fn progress_percent(&self, ordinal: u32, score: u64) -> u8 {
        let target = self.get(ordinal).target;
        ((score.min(target) * 100) / target) as u8
    }

    /// Whether `score` clears level `ordinal`
    #[inline]
    pub fn is_complete(&self, ordinal: u32, score: u64) -> bool {
        score >= self.get(ordinal).target
    }

    /// New frontier after clearing `ordinal`, if it moves
    pub fn unlock_after(&self, frontier: u32, ordinal: u32, score: u64) -> Option<u32> {
        if !self.is_complete(ordinal, score) {
            return None;
        }
        let next = (ordinal + 1).min(self.len());
        (next > frontier).then_some(next)
    }
}

/// Per-run level tracker (mission runs only)
///
/// Never moves backwards within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub current_level: u32,
}

impl Progression {
    pub fn new(start_level: u32) -> Self {
        Self {
            current_level: start_level.max(1),
        }
    }

    /// Advance to the level `score` has reached; returns `true` on a level-up
    pub fn update(&mut self, table: &LevelTable, score: u64) -> bool {
        let reached = table.reached_level(score);
        if reached > self.current_level {
            self.current_level = reached;
            true
        } else {
            false
        }
    }
}
