//! Nitro gauge regulation
//!
//! The boost is gated on the gauge at the moment of the press: holding the
//! button on an empty tank never engages it, and an active boost is cut the
//! same frame the tank runs dry.

use serde::{Deserialize, Serialize};

use crate::Tuning;

/// Bounded nitro resource plus the boost flags it gates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NitroGauge {
    level: f32,
    max: f32,
    /// Boost button currently held
    requested: bool,
    /// Boost currently applied to speed and score
    active: bool,
}

impl NitroGauge {
    /// A full tank
    pub fn new(max: f32) -> Self {
        Self {
            level: max,
            max,
            requested: false,
            active: false,
        }
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Gauge fill as a whole percentage
    pub fn percent(&self) -> u8 {
        if self.max <= 0.0 {
            return 0;
        }
        ((self.level / self.max) * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Boost button pressed; returns whether boost engaged
    pub fn press(&mut self) -> bool {
        self.requested = true;
        self.active = self.level > 0.0;
        self.active
    }

    /// Boost button released
    pub fn release(&mut self) {
        self.requested = false;
        self.active = false;
    }

    /// Drain or refill for `delta_ms`
    ///
    /// Returns `true` if the boost was cut off by an empty tank this call.
    pub fn regulate(&mut self, delta_ms: f64, tuning: &Tuning) -> bool {
        let delta = delta_ms as f32;
        if self.active {
            self.level = (self.level - tuning.nitro_drain_per_ms * delta).max(0.0);
            if self.level <= 0.0 {
                self.level = 0.0;
                self.active = false;
                return true;
            }
        } else {
            self.level = (self.level + tuning.nitro_refill_per_ms * delta).min(self.max);
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn set_level(&mut self, level: f32) {
        self.level = level.clamp(0.0, self.max);
    }

    /// Speed added to obstacles while boosting
    #[inline]
    pub fn speed_bonus(&self, tuning: &Tuning) -> f32 {
        if self.active {
            tuning.boost_speed_bonus
        } else {
            0.0
        }
    }
}
