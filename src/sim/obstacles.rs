//! Obstacle field: spawning, motion and retirement of traffic cars

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::Obstacle;
use crate::consts::*;
use crate::{Tuning, lane_x};

/// Owns every live traffic car
#[derive(Debug, Clone)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    rng: Pcg32,
    next_id: u32,
}

impl ObstacleField {
    pub fn new(seed: u64) -> Self {
        Self {
            obstacles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    #[inline]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Drop every obstacle (run reset)
    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    /// Spawn a car in a random lane just above the visible track
    pub fn spawn(&mut self, base_speed: f32, elapsed_ms: f64, tuning: &Tuning) -> &Obstacle {
        let lane = self.rng.random_range(0..LANE_COUNT);
        let variant = self.rng.random_range(0..OBSTACLE_VARIANTS);
        let jitter = self.rng.random::<f32>() * tuning.speed_jitter;
        let creep = (elapsed_ms / tuning.speed_creep_divisor_ms) as f32;

        let id = self.next_id;
        self.next_id += 1;

        self.obstacles.push(Obstacle {
            id,
            pos: Vec2::new(lane_x(lane), -OBSTACLE_HEIGHT - OBSTACLE_SPAWN_GAP),
            size: Vec2::new(OBSTACLE_WIDTH, OBSTACLE_HEIGHT),
            speed: base_speed + jitter + creep,
            variant,
            lane,
        });
        let last = self.obstacles.len() - 1;
        &self.obstacles[last]
    }

    /// Insert a pre-built obstacle (scripted scenarios)
    pub fn insert(&mut self, mut obstacle: Obstacle) -> u32 {
        obstacle.id = self.next_id;
        self.next_id += 1;
        let id = obstacle.id;
        self.obstacles.push(obstacle);
        id
    }

    /// Move every car down; distance scales with wall-time, not frame count
    pub fn advance(&mut self, delta_ms: f64, speed_bonus: f32) {
        let frames = (delta_ms / FRAME_UNIT_MS) as f32;
        for obstacle in &mut self.obstacles {
            obstacle.pos.y += (obstacle.speed + speed_bonus) * frames;
        }
    }

    /// Remove cars that have left the bottom of the track; returns how many
    pub fn retire(&mut self) -> usize {
        let before = self.obstacles.len();
        let limit = TRACK_HEIGHT + OBSTACLE_RETIRE_MARGIN;
        self.obstacles.retain(|o| o.pos.y < limit);
        before - self.obstacles.len()
    }
}
