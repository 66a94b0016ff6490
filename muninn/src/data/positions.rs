use mimir::DataType;
use nalgebra::Point2;

use crate::math::Pose;

/// Where the defender should stand.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefendingPosition {
    pub valid: bool,
    pub pose: Pose,
}

impl DataType for DefendingPosition {
    fn reset(&mut self) {
        self.valid = false;
    }
}

/// Where the bishop should stand.
#[derive(Clone, Copy, Debug, Default)]
pub struct BishopPosition {
    pub valid: bool,
    pub position: Point2<f32>,
    pub orientation: f32,
}

impl DataType for BishopPosition {
    fn reset(&mut self) {
        self.valid = false;
    }
}

/// Where the support striker should stand.
#[derive(Clone, Copy, Debug, Default)]
pub struct SupportingPosition {
    pub valid: bool,
    pub position: Point2<f32>,
    pub orientation: f32,
}

impl DataType for SupportingPosition {
    fn reset(&mut self) {
        self.valid = false;
    }
}

/// Where the loser should retreat to after the team lost the ball.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoserPosition {
    pub valid: bool,
    pub pose: Pose,
}

impl DataType for LoserPosition {
    fn reset(&mut self) {
        self.valid = false;
    }
}

/// The pose to take up while walking in during READY, per role and kick-off flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetPosition {
    pub valid: bool,
    pub pose: Pose,
}

impl DataType for SetPosition {
    fn reset(&mut self) {
        self.valid = false;
    }
}

/// One point worth looking at, with a weight for the active vision arbitration.
#[derive(Clone, Copy, Debug)]
pub struct PointOfInterest {
    /// Field coordinates, meters.
    pub position: Point2<f32>,
    /// Relative importance in [0, 1].
    pub weight: f32,
}

/// Interesting gaze targets for active vision.
#[derive(Clone, Debug, Default)]
pub struct PointOfInterests {
    pub valid: bool,
    pub points: Vec<PointOfInterest>,
}

impl DataType for PointOfInterests {
    fn reset(&mut self) {
        self.valid = false;
        self.points.clear();
    }
}
