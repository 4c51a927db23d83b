//! Data-driven game balance
//!
//! Every number that shapes difficulty lives here so a run can be re-tuned
//! from JSON without touching the simulation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value: {0}")]
    Invalid(&'static str),
}

/// Balance parameters
///
/// Times are in milliseconds, speeds in pixels per reference frame
/// ([`crate::consts::FRAME_UNIT_MS`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Obstacle base speed at the start of a free run
    pub base_speed: f32,
    /// Time between spawns at the start of a free run
    pub spawn_interval_ms: f64,

    // === Difficulty ramp ===
    /// Ramp fires every time elapsed time crosses a multiple of this
    pub ramp_period_ms: f64,
    pub ramp_speed_step: f32,
    pub ramp_interval_step_ms: f64,
    /// The ramp never shrinks the spawn interval below this
    pub ramp_interval_floor_ms: f64,

    // === Obstacles ===
    /// Upper bound (exclusive) of the random per-obstacle speed jitter
    pub speed_jitter: f32,
    /// Elapsed milliseconds per extra unit of obstacle speed
    pub speed_creep_divisor_ms: f64,

    // === Nitro ===
    pub nitro_max: f32,
    /// Gauge units drained per millisecond while boosting
    pub nitro_drain_per_ms: f32,
    /// Gauge units recovered per millisecond while not boosting
    pub nitro_refill_per_ms: f32,
    /// Added to obstacle speed while boosting
    pub boost_speed_bonus: f32,
    /// Added to the score rate while boosting
    pub boost_score_bonus: f32,

    // === Level seeding ===
    pub level_speed_step: f32,
    pub level_interval_step_ms: f64,
    pub level_interval_floor_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_speed: 3.0,
            spawn_interval_ms: 1500.0,

            ramp_period_ms: 8000.0,
            ramp_speed_step: 0.4,
            ramp_interval_step_ms: 80.0,
            ramp_interval_floor_ms: 600.0,

            speed_jitter: 2.0,
            speed_creep_divisor_ms: 15000.0,

            nitro_max: 100.0,
            nitro_drain_per_ms: 0.04,
            nitro_refill_per_ms: 0.01,
            boost_speed_bonus: 6.0,
            boost_score_bonus: 2.0,

            level_speed_step: 0.3,
            level_interval_step_ms: 20.0,
            level_interval_floor_ms: 400.0,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would stall or break the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.ramp_period_ms <= 0.0 {
            return Err(TuningError::Invalid("ramp_period_ms must be positive"));
        }
        if self.spawn_interval_ms <= 0.0 || self.level_interval_floor_ms <= 0.0 {
            return Err(TuningError::Invalid("spawn intervals must be positive"));
        }
        if self.speed_creep_divisor_ms <= 0.0 {
            return Err(TuningError::Invalid("speed_creep_divisor_ms must be positive"));
        }
        if self.nitro_max <= 0.0 {
            return Err(TuningError::Invalid("nitro_max must be positive"));
        }
        if self.nitro_drain_per_ms < 0.0 || self.nitro_refill_per_ms < 0.0 {
            return Err(TuningError::Invalid("nitro rates cannot be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "base_speed": 5.0 }"#).unwrap();
        assert_eq!(tuning.base_speed, 5.0);
        assert_eq!(tuning.spawn_interval_ms, 1500.0);
        assert_eq!(tuning.nitro_max, 100.0);
    }

    #[test]
    fn test_rejects_zero_ramp_period() {
        let err = Tuning::from_json(r#"{ "ramp_period_ms": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }
}
