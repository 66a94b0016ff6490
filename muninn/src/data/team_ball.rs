use std::time::Instant;

use mimir::DataType;
use nalgebra::{Point2, Vector2};

/// Where the team-agreed ball belief comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BallType {
    /// No ball at all.
    #[default]
    None,
    /// The own ball observation.
    Self_,
    /// A teammate's observation.
    Team,
    /// The position is dictated by the rules (READY and SET).
    Rule,
}

/// The team-agreed belief about the ball.
#[derive(Clone, Copy, Debug)]
pub struct TeamBallModel {
    /// Where the belief comes from.
    pub ball_type: BallType,
    /// Whether any team member saw a ball confidently enough.
    pub seen: bool,
    /// Whether a majority consensus could be established.
    pub found: bool,
    /// Whether the ball is inside the field.
    pub inside_field: bool,
    /// Ball position in field coordinates, meters.
    pub position: Point2<f32>,
    /// Ball position relative to this robot, meters.
    pub rel_position: Point2<f32>,
    /// Ball velocity in field coordinates, meters per second.
    pub velocity: Vector2<f32>,
    /// When the model was last fed with a real observation.
    pub time_last_updated: Instant,
}

impl Default for TeamBallModel {
    fn default() -> Self {
        Self {
            ball_type: BallType::None,
            seen: false,
            found: false,
            inside_field: false,
            position: Point2::origin(),
            rel_position: Point2::origin(),
            velocity: Vector2::zeros(),
            time_last_updated: Instant::now(),
        }
    }
}

impl DataType for TeamBallModel {
    fn reset(&mut self) {
        self.ball_type = BallType::None;
        self.seen = false;
        self.found = false;
    }
}
