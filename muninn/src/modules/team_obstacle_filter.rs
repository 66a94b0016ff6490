use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::ObstacleConfig;
use crate::data::game_state::Penalty;
use crate::data::obstacles::TeamObstacle;
use crate::data::{
    BodyPose, FieldDimensions, GameControllerState, ObstacleData, ObstacleType, RobotPosition,
    TeamObstacleData, TeamPlayers,
};
use crate::math::Pose;

/// Merges the own obstacle list with the obstacles reported by teammates into one team
/// obstacle model, using the type lattice to combine classifications.
pub struct TeamObstacleFilter {
    config: ObstacleConfig,
}

impl TeamObstacleFilter {
    #[must_use]
    pub fn new(config: ObstacleConfig) -> Self {
        Self { config }
    }

    /// Whether `first` is at least as specific as `second` and the two may merge.
    fn type_is_at_least_as_specific_and_mergeable(
        &self,
        first: ObstacleType,
        second: ObstacleType,
    ) -> bool {
        second == first
            || (self.config.reclassify_unknown_obstacles
                && second == ObstacleType::Unknown
                && first != ObstacleType::Unknown
                && first != ObstacleType::Ball
                && first != ObstacleType::FreeKickArea)
            || (second == ObstacleType::AnonymousRobot
                && matches!(
                    first,
                    ObstacleType::HostileRobot | ObstacleType::TeamRobot
                ))
            || (second == ObstacleType::FallenAnonymousRobot
                && matches!(
                    first,
                    ObstacleType::FallenHostileRobot | ObstacleType::FallenTeamRobot
                ))
    }

    /// The merged type of two obstacles, `None` when they may not merge.
    fn map_to_merged_type(&self, t1: ObstacleType, t2: ObstacleType) -> Option<ObstacleType> {
        if self.type_is_at_least_as_specific_and_mergeable(t1, t2) {
            return Some(t1);
        }
        if self.type_is_at_least_as_specific_and_mergeable(t2, t1) {
            return Some(t2);
        }
        None
    }

    /// Whether an obstacle of this type could be this very robot.
    fn compatible_with_this_robot(obstacle_type: ObstacleType, fallen: bool) -> bool {
        match obstacle_type {
            ObstacleType::Unknown => true,
            ObstacleType::AnonymousRobot | ObstacleType::TeamRobot => !fallen,
            ObstacleType::FallenAnonymousRobot | ObstacleType::FallenTeamRobot => fallen,
            _ => false,
        }
    }

    fn update_obstacle(
        &self,
        team_obstacles: &mut Vec<TeamObstacle>,
        robot: &RobotPosition,
        fallen: bool,
        new_position: Point2<f32>,
        reference_pose: &Pose,
        new_type: ObstacleType,
        obstacle_could_be_this_robot: bool,
    ) {
        let new_absolute = reference_pose.robot_to_field(new_position);
        let new_relative = robot.pose.field_to_robot(new_absolute);

        // find the closest obstacle the new one may merge with
        let mut closest: Option<usize> = None;
        let mut merged_type = None;
        let mut closest_distance_squared = self.config.obstacle_merge_radius.powi(2);
        for (index, obstacle) in team_obstacles.iter().enumerate() {
            let distance_squared =
                (new_relative - obstacle.relative_position).norm_squared();
            if distance_squared < closest_distance_squared {
                let Some(merge) = self.map_to_merged_type(new_type, obstacle.obstacle_type) else {
                    continue;
                };
                closest = Some(index);
                merged_type = Some(merge);
                closest_distance_squared = distance_squared;
            }
        }

        // this very robot must not become an obstacle, and goal posts never move
        if (obstacle_could_be_this_robot
            && new_relative.coords.norm_squared() < closest_distance_squared
            && Self::compatible_with_this_robot(new_type, fallen))
            || merged_type == Some(ObstacleType::GoalPost)
        {
            return;
        }

        if let (Some(index), Some(merged_type)) = (closest, merged_type) {
            let obstacle = &mut team_obstacles[index];
            // positions fuse as simple midpoints, the more specific type wins
            obstacle.absolute_position = Point2::from(
                (obstacle.absolute_position.coords + new_absolute.coords) * 0.5,
            );
            obstacle.relative_position = Point2::from(
                (obstacle.relative_position.coords + new_relative.coords) * 0.5,
            );
            obstacle.radius = merged_type.radius();
            obstacle.obstacle_type = merged_type;
            return;
        }

        team_obstacles.push(TeamObstacle {
            relative_position: new_relative,
            absolute_position: new_absolute,
            radius: new_type.radius(),
            obstacle_type: new_type,
        });
    }

    fn integrate_map_obstacles(
        &self,
        team_obstacles: &mut Vec<TeamObstacle>,
        robot: &RobotPosition,
        fallen: bool,
        field: &FieldDimensions,
    ) {
        if !self.config.goal_posts_are_obstacles {
            return;
        }
        let post_y = (field.goal_inner_width + field.goal_post_diameter) * 0.5;
        let post_x = field.field_length * 0.5;
        for position in [
            Point2::new(-post_x, post_y),
            Point2::new(-post_x, -post_y),
            Point2::new(post_x, post_y),
            Point2::new(post_x, -post_y),
        ] {
            self.update_obstacle(
                team_obstacles,
                robot,
                fallen,
                position,
                &Pose::default(),
                ObstacleType::GoalPost,
                false,
            );
        }
    }
}

impl Module for TeamObstacleFilter {
    fn name(&self) -> &'static str {
        "team_obstacle_filter"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BodyPose>(),
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<ObstacleData>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamPlayers>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<TeamObstacleData>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<TeamObstacleData>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let body_pose = database.get::<BodyPose>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let obstacle_data = database.get::<ObstacleData>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_players = database.get::<TeamPlayers>()?;
        let mut team_obstacle_data = database.get_mut::<TeamObstacleData>()?;

        if game.penalty != Penalty::None {
            return Ok(());
        }

        let fallen = body_pose.fallen;
        let mut team_obstacles = Vec::new();

        // goal posts come from the field model; teammate goal post sightings are dropped
        // below to avoid double counting
        self.integrate_map_obstacles(&mut team_obstacles, &robot, fallen, &field);

        for obstacle in &obstacle_data.obstacles {
            self.update_obstacle(
                &mut team_obstacles,
                &robot,
                fallen,
                obstacle.relative_position,
                &robot.pose,
                obstacle.obstacle_type,
                false,
            );
        }

        for player in &team_players.players {
            if player.penalized {
                continue;
            }
            if self.config.team_players_are_obstacles {
                self.update_obstacle(
                    &mut team_obstacles,
                    &robot,
                    fallen,
                    player.pose.position,
                    &Pose::default(),
                    if player.fallen {
                        ObstacleType::FallenTeamRobot
                    } else {
                        ObstacleType::TeamRobot
                    },
                    false,
                );
            }
            if !player.fallen && self.config.use_other_robots_obstacles {
                for obstacle in &player.local_obstacles {
                    if obstacle.obstacle_type == ObstacleType::GoalPost {
                        continue;
                    }
                    self.update_obstacle(
                        &mut team_obstacles,
                        &robot,
                        fallen,
                        obstacle.relative_position,
                        &player.pose,
                        obstacle.obstacle_type,
                        true,
                    );
                }
            }
        }

        team_obstacle_data.obstacles = team_obstacles;
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

    fn filter() -> TeamObstacleFilter {
        TeamObstacleFilter::new(ObstacleConfig::default())
    }

    #[test]
    fn the_lattice_prefers_the_more_specific_type() {
        let filter = filter();

        assert_eq!(
            filter.map_to_merged_type(ObstacleType::HostileRobot, ObstacleType::AnonymousRobot),
            Some(ObstacleType::HostileRobot)
        );
        assert_eq!(
            filter.map_to_merged_type(ObstacleType::AnonymousRobot, ObstacleType::FallenTeamRobot),
            None
        );
        assert_eq!(
            filter.map_to_merged_type(ObstacleType::Unknown, ObstacleType::TeamRobot),
            Some(ObstacleType::TeamRobot)
        );
        // incomparable leaves never merge with robots
        assert_eq!(
            filter.map_to_merged_type(ObstacleType::Ball, ObstacleType::AnonymousRobot),
            None
        );
        assert_eq!(
            filter.map_to_merged_type(ObstacleType::GoalPost, ObstacleType::GoalPost),
            Some(ObstacleType::GoalPost)
        );
    }

    #[test]
    fn nearby_compatible_obstacles_fuse_as_midpoints() {
        let filter = filter();
        let robot = RobotPosition {
            valid: true,
            ..Default::default()
        };
        let mut obstacles = Vec::new();

        filter.update_obstacle(
            &mut obstacles,
            &robot,
            false,
            Point2::new(2.0, 0.0),
            &Pose::default(),
            ObstacleType::AnonymousRobot,
            false,
        );
        filter.update_obstacle(
            &mut obstacles,
            &robot,
            false,
            Point2::new(2.2, 0.0),
            &Pose::default(),
            ObstacleType::HostileRobot,
            false,
        );

        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].obstacle_type, ObstacleType::HostileRobot);
        assert!((obstacles[0].absolute_position.x - 2.1).abs() < 1e-5);
    }

    #[test]
    fn an_obstacle_that_could_be_this_robot_is_dropped() {
        let filter = filter();
        let robot = RobotPosition {
            valid: true,
            ..Default::default()
        };
        let mut obstacles = Vec::new();

        // a teammate reports a robot exactly where we stand
        filter.update_obstacle(
            &mut obstacles,
            &robot,
            false,
            Point2::new(0.05, 0.0),
            &Pose::default(),
            ObstacleType::AnonymousRobot,
            true,
        );

        assert!(obstacles.is_empty());
    }

    #[test]
    fn goal_posts_are_injected_from_the_field_model() {
        let filter = filter();
        let robot = RobotPosition {
            valid: true,
            ..Default::default()
        };
        let mut obstacles = Vec::new();

        filter.integrate_map_obstacles(
            &mut obstacles,
            &robot,
            false,
            &FieldDimensions::default(),
        );

        assert_eq!(obstacles.len(), 4);
        assert!(obstacles
            .iter()
            .all(|obstacle| obstacle.obstacle_type == ObstacleType::GoalPost));
    }
}
