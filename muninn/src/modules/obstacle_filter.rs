use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::ObstacleConfig;
use crate::data::game_state::Penalty;
use crate::data::{
    BallState, BallType, FootCollisionData, GameControllerState, Obstacle, ObstacleData,
    ObstacleType, RobotDetections, RobotPosition, SonarData, TeamBallModel,
};

/// Fuses this robot's own obstacle evidence into one list: sonar echoes, foot bumper
/// collisions, visually detected robots, and the ball when it sits between us and our
/// current walk direction.
pub struct ObstacleFilter {
    config: ObstacleConfig,
}

impl ObstacleFilter {
    #[must_use]
    pub fn new(config: ObstacleConfig) -> Self {
        Self { config }
    }

    /// Appends `obstacle` or merges it with the closest existing entry of the same type.
    fn add_obstacle(&self, obstacles: &mut Vec<Obstacle>, obstacle: Obstacle) {
        let merge_radius_squared = self.config.obstacle_merge_radius.powi(2);
        if let Some(existing) = obstacles.iter_mut().find(|existing| {
            existing.obstacle_type == obstacle.obstacle_type
                && (existing.relative_position - obstacle.relative_position).norm_squared()
                    < merge_radius_squared
        }) {
            existing.relative_position = Point2::from(
                (existing.relative_position.coords + obstacle.relative_position.coords) * 0.5,
            );
        } else {
            obstacles.push(obstacle);
        }
    }
}

impl Module for ObstacleFilter {
    fn name(&self) -> &'static str {
        "obstacle_filter"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<FootCollisionData>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<RobotDetections>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<SonarData>(),
            SlotInfo::of::<TeamBallModel>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<ObstacleData>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<ObstacleData>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball_state = database.get::<BallState>()?;
        let foot_collision = database.get::<FootCollisionData>()?;
        let game = database.get::<GameControllerState>()?;
        let detections = database.get::<RobotDetections>()?;
        let robot = database.get::<RobotPosition>()?;
        let sonar = database.get::<SonarData>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let mut obstacle_data = database.get_mut::<ObstacleData>()?;

        if game.penalty != Penalty::None {
            return Ok(());
        }

        let mut obstacles = Vec::new();

        for position in &detections.positions {
            self.add_obstacle(
                &mut obstacles,
                Obstacle::new(*position, ObstacleType::AnonymousRobot),
            );
        }

        if self.config.use_sonar {
            // a sonar echo with no matching detection is something unknown ahead
            for (distance, side) in [(sonar.left_distance, 0.15), (sonar.right_distance, -0.15)] {
                let Some(distance) = distance else {
                    continue;
                };
                if distance < 1.0 {
                    self.add_obstacle(
                        &mut obstacles,
                        Obstacle::new(Point2::new(distance, side), ObstacleType::Unknown),
                    );
                }
            }
        }

        if foot_collision.collision {
            // something touched the bumpers that vision did not see; assume it right
            // in front of us
            self.add_obstacle(
                &mut obstacles,
                Obstacle::new(Point2::new(0.1, 0.0), ObstacleType::Unknown),
            );
        }

        // the ball is an obstacle when it is between us and where we want to go, i.e. on
        // the wrong side of the robot relative to the team ball
        if ball_state.found && team_ball.ball_type != BallType::None {
            let rel_team_ball = robot.pose.field_to_robot(team_ball.position);
            let own_ball_behind_target = ball_state.position.x < rel_team_ball.x - 0.2;
            if own_ball_behind_target {
                self.add_obstacle(
                    &mut obstacles,
                    Obstacle::new(ball_state.position, ObstacleType::Ball),
                );
            }
        }

        obstacle_data.obstacles = obstacles;
        Ok(())
    }

    fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
        self.config = super::parse_parameters(parameters)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearby_detections_merge_into_one_obstacle() {
        let filter = ObstacleFilter::new(ObstacleConfig::default());
        let mut obstacles = Vec::new();

        filter.add_obstacle(
            &mut obstacles,
            Obstacle::new(Point2::new(1.0, 0.0), ObstacleType::AnonymousRobot),
        );
        filter.add_obstacle(
            &mut obstacles,
            Obstacle::new(Point2::new(1.2, 0.1), ObstacleType::AnonymousRobot),
        );

        assert_eq!(obstacles.len(), 1);
        assert!((obstacles[0].relative_position.x - 1.1).abs() < 1e-5);
    }

    #[test]
    fn different_types_do_not_merge_here() {
        let filter = ObstacleFilter::new(ObstacleConfig::default());
        let mut obstacles = Vec::new();

        filter.add_obstacle(
            &mut obstacles,
            Obstacle::new(Point2::new(1.0, 0.0), ObstacleType::AnonymousRobot),
        );
        filter.add_obstacle(
            &mut obstacles,
            Obstacle::new(Point2::new(1.0, 0.0), ObstacleType::Ball),
        );

        assert_eq!(obstacles.len(), 2);
    }
}
