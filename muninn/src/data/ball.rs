use std::time::{Duration, Instant};

use mimir::DataType;
use nalgebra::{Point2, Vector2};

/// The ball as this robot sees it, robot-relative coordinates. Input contract of the
/// vision/ball-filter pipeline.
#[derive(Clone, Copy, Debug)]
pub struct BallState {
    /// Ball position relative to the robot, meters.
    pub position: Point2<f32>,
    /// Ball velocity relative to the robot, meters per second.
    pub velocity: Vector2<f32>,
    /// Whether the filter currently tracks a ball.
    pub found: bool,
    /// Whether the track is confident enough to share with the team.
    pub confident: bool,
    /// Time since the ball was last seen.
    pub age: Duration,
    /// When the ball was last seen.
    pub time_when_last_seen: Instant,
    /// Validity in [0, 1] as reported by the filter.
    pub validity: f32,
}

impl Default for BallState {
    fn default() -> Self {
        Self {
            position: Point2::origin(),
            velocity: Vector2::zeros(),
            found: false,
            confident: false,
            age: Duration::MAX,
            time_when_last_seen: Instant::now(),
            validity: 0.0,
        }
    }
}

impl DataType for BallState {
    fn reset(&mut self) {
        // input slot, refreshed by the embedding perception pipeline
    }
}
