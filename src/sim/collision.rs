//! Collision detection between the player and traffic
//!
//! Sprites carry transparent padding, so both boxes are shrunk to
//! [`HITBOX_SCALE`] of their visual size (centered) before the AABB test.
//! Cars only crash when they visibly touch.

use glam::Vec2;

use super::state::{Obstacle, Vehicle};
use crate::consts::HITBOX_SCALE;

/// Axis-aligned box given by its top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub min: Vec2,
    pub size: Vec2,
}

impl Hitbox {
    /// Box scaled by `scale` around the center of the visual bounds
    pub fn shrunk(pos: Vec2, size: Vec2, scale: f32) -> Self {
        let inset = size * (1.0 - scale) / 2.0;
        Self {
            min: pos + inset,
            size: size * scale,
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Strict overlap on both axes; touching edges do not collide
    #[inline]
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && a_max.x > other.min.x && self.min.y < b_max.y && a_max.y > other.min.y
    }
}

impl Vehicle {
    pub fn hitbox(&self) -> Hitbox {
        Hitbox::shrunk(self.pos, self.size, HITBOX_SCALE)
    }
}

impl Obstacle {
    pub fn hitbox(&self) -> Hitbox {
        Hitbox::shrunk(self.pos, self.size, HITBOX_SCALE)
    }
}

/// First obstacle whose hitbox overlaps the vehicle's
pub fn first_hit<'a>(vehicle: &Vehicle, obstacles: &'a [Obstacle]) -> Option<&'a Obstacle> {
    let car = vehicle.hitbox();
    obstacles.iter().find(|ob| car.overlaps(&ob.hitbox()))
}

/// Whether the vehicle overlaps any obstacle
#[inline]
pub fn vehicle_collides(vehicle: &Vehicle, obstacles: &[Obstacle]) -> bool {
    first_hit(vehicle, obstacles).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use proptest::prelude::*;

    fn obstacle_at(x: f32, y: f32) -> Obstacle {
        Obstacle {
            id: 1,
            pos: Vec2::new(x, y),
            size: Vec2::new(OBSTACLE_WIDTH, OBSTACLE_HEIGHT),
            speed: 3.0,
            variant: 0,
            lane: 0,
        }
    }

    #[test]
    fn test_shrunk_box_is_centered() {
        let hitbox = Hitbox::shrunk(Vec2::new(0.0, 0.0), Vec2::new(100.0, 200.0), 0.7);
        assert!((hitbox.min.x - 15.0).abs() < 0.001);
        assert!((hitbox.min.y - 30.0).abs() < 0.001);
        assert!((hitbox.size.x - 70.0).abs() < 0.001);
        assert!((hitbox.size.y - 140.0).abs() < 0.001);
    }

    #[test]
    fn test_head_on_overlap_collides() {
        let vehicle = Vehicle::default();
        let ob = obstacle_at(vehicle.pos.x, vehicle.pos.y - 50.0);
        assert!(vehicle_collides(&vehicle, &[ob]));
    }

    #[test]
    fn test_visual_touch_inside_padding_is_safe() {
        let vehicle = Vehicle::default();
        // Visual boxes overlap by 30px vertically, padding is 19.5px per side
        let ob = obstacle_at(vehicle.pos.x, vehicle.pos.y - OBSTACLE_HEIGHT + 30.0);
        assert!(!vehicle_collides(&vehicle, &[ob]));
    }

    #[test]
    fn test_adjacent_lane_is_safe() {
        let vehicle = Vehicle::default();
        let ob = obstacle_at(vehicle.pos.x + LANE_WIDTH, vehicle.pos.y);
        assert!(!vehicle_collides(&vehicle, &[ob]));
    }

    #[test]
    fn test_first_hit_reports_the_overlapping_car() {
        let vehicle = Vehicle::default();
        let mut far = obstacle_at(0.0, -500.0);
        far.id = 7;
        let mut near = obstacle_at(vehicle.pos.x, vehicle.pos.y);
        near.id = 9;
        let obstacles = [far, near];
        assert_eq!(first_hit(&vehicle, &obstacles).map(|o| o.id), Some(9));
    }

    proptest! {
        #[test]
        fn prop_collision_matches_scaled_box_overlap(
            vx in 0.0f32..320.0,
            ox in -100.0f32..400.0,
            oy in -200.0f32..700.0,
        ) {
            let mut vehicle = Vehicle::default();
            vehicle.pos.x = vx;
            let ob = obstacle_at(ox, oy);

            let pad_x = VEHICLE_WIDTH * (1.0 - HITBOX_SCALE) / 2.0;
            let pad_y = VEHICLE_HEIGHT * (1.0 - HITBOX_SCALE) / 2.0;
            let (ax0, ay0) = (vx + pad_x, vehicle.pos.y + pad_y);
            let (bx0, by0) = (ox + pad_x, oy + pad_y);
            let w = VEHICLE_WIDTH * HITBOX_SCALE;
            let h = VEHICLE_HEIGHT * HITBOX_SCALE;
            let expected = ax0 < bx0 + w && ax0 + w > bx0 && ay0 < by0 + h && ay0 + h > by0;

            prop_assert_eq!(vehicle_collides(&vehicle, &[ob]), expected);
        }
    }
}
