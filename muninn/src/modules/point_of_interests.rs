use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::data::positions::PointOfInterest;
use crate::data::{
    BallType, FieldDimensions, PointOfInterests, RobotPosition, TeamBallModel,
};

/// Collects gaze targets for active vision: the ball first, then the landmarks that help
/// the localization, weighted down with distance.
pub struct PointOfInterestsProvider;

impl PointOfInterestsProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn landmark_weight(robot: &RobotPosition, position: Point2<f32>) -> f32 {
        // close landmarks are worth looking at, far ones barely
        let distance = (position - robot.pose.position).norm();
        (1.0 / (1.0 + distance * 0.5)).clamp(0.0, 1.0)
    }
}

impl Default for PointOfInterestsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for PointOfInterestsProvider {
    fn name(&self) -> &'static str {
        "point_of_interests_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamBallModel>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<PointOfInterests>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<PointOfInterests>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let field = database.get::<FieldDimensions>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let mut points = database.get_mut::<PointOfInterests>()?;

        if !robot.valid {
            return Ok(());
        }

        if team_ball.ball_type != BallType::None {
            points.points.push(PointOfInterest {
                position: team_ball.position,
                weight: 1.0,
            });
        }

        for landmark in [
            Point2::origin(),
            field.own_penalty_spot(),
            field.opponent_penalty_spot(),
        ] {
            points.points.push(PointOfInterest {
                position: landmark,
                weight: Self::landmark_weight(&robot, landmark),
            });
        }

        points.valid = true;
        Ok(())
    }
}
