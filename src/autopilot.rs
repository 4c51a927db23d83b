//! Demo driver
//!
//! Reads a [`Snapshot`] and decides which way to steer and whether to hold
//! boost. Used for attract mode in the browser and for headless native runs.

use crate::consts::*;
use crate::lane_x;
use crate::sim::{Control, Game, GamePhase, Obstacle, Steering, Vehicle};
use crate::ui::Snapshot;

/// Controls the autopilot wants held this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub steering: Steering,
    pub boost: bool,
}

/// Lane-picking driver
#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Extra clearance (px) a lane needs before leaving the current one
    pub switch_margin: f32,
    /// Clearance (px) above which boosting is considered safe
    pub boost_clearance: f32,
    /// Horizontal error (px) tolerated before steering
    pub deadzone: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            switch_margin: 40.0,
            boost_clearance: 320.0,
            deadzone: 6.0,
        }
    }
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controls for this frame; `None` when no run is in progress
    pub fn decide(&self, snapshot: &Snapshot<'_>) -> Option<Decision> {
        if snapshot.phase != GamePhase::Running {
            return None;
        }
        let vehicle = snapshot.vehicle;
        let current = crate::lane_at(vehicle.pos.x, vehicle.size.x);

        let clearances: Vec<f32> = (0..LANE_COUNT)
            .map(|lane| lane_clearance(vehicle, snapshot.obstacles, lane))
            .collect();

        // Farthest threat wins; ties go to the lane closest to where we are
        let mut target = current;
        for lane in 0..LANE_COUNT {
            let better = clearances[lane as usize]
                > clearances[target as usize] + self.switch_margin;
            let tied_but_closer = clearances[lane as usize] == clearances[target as usize]
                && lane.abs_diff(current) < target.abs_diff(current);
            if better || tied_but_closer {
                target = lane;
            }
        }

        let dx = lane_x(target) - vehicle.pos.x;
        let steering = if dx.abs() <= self.deadzone {
            Steering::Straight
        } else if dx < 0.0 {
            Steering::Left
        } else {
            Steering::Right
        };

        let boost = target == current && clearances[target as usize] >= self.boost_clearance;

        Some(Decision { steering, boost })
    }

    /// Decide from `game`'s current snapshot and hold the matching controls
    pub fn drive(&self, game: &mut Game) -> Option<Decision> {
        let decision = self.decide(&game.snapshot())?;

        let held = game.vehicle().steering;
        if decision.steering != held {
            if let Some(control) = steering_control(held) {
                game.release(control);
            }
            if let Some(control) = steering_control(decision.steering) {
                game.press(control);
            }
        }

        let boosting = game.run().nitro.is_requested();
        if decision.boost && !boosting {
            game.press(Control::Boost);
        } else if !decision.boost && boosting {
            game.release(Control::Boost);
        }

        Some(decision)
    }
}

fn steering_control(steering: Steering) -> Option<Control> {
    match steering {
        Steering::Left => Some(Control::Left),
        Steering::Straight => None,
        Steering::Right => Some(Control::Right),
    }
}

/// Gap (px) between the vehicle's nose and the nearest car still ahead in `lane`
///
/// Negative when a car already overlaps the vehicle vertically; infinite for
/// an empty lane.
fn lane_clearance(vehicle: &Vehicle, obstacles: &[Obstacle], lane: u32) -> f32 {
    let vehicle_bottom = vehicle.pos.y + vehicle.size.y;
    obstacles
        .iter()
        .filter(|o| o.lane == lane && o.pos.y < vehicle_bottom)
        .map(|o| vehicle.pos.y - (o.pos.y + o.size.y))
        .fold(f32::INFINITY, f32::min)
}
