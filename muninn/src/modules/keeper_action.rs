use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::KeeperConfig;
use crate::data::game_state::{GameState, Penalty};
use crate::data::striker::{KeeperAction, KeeperActionType};
use crate::data::{
    BallState, BallType, FieldDimensions, GameControllerState, RobotPosition, TeamBallModel,
    WorldState,
};
use crate::math::Pose;

/// Computes the keeper's blocking pose on the line between ball and own goal, and
/// decides when to squat against a fast incoming ball.
pub struct KeeperActionProvider {
    config: KeeperConfig,
}

impl KeeperActionProvider {
    #[must_use]
    pub fn new(config: KeeperConfig) -> Self {
        Self { config }
    }

    /// The default keeper position: half a goal box length in front of the goal line.
    fn default_position(field: &FieldDimensions) -> Point2<f32> {
        Point2::new(
            -field.field_length / 2.0 + field.goal_box_area_length * 0.5,
            0.0,
        )
    }

    /// The blocking pose: on the ball-goal line, clipped to the goal box.
    pub(crate) fn block_pose(field: &FieldDimensions, ball: Point2<f32>) -> Pose {
        let goal = field.own_goal_center();
        let goal_to_ball = ball - goal;

        let position = if goal_to_ball.norm() > f32::EPSILON {
            goal + goal_to_ball.normalize() * (field.goal_box_area_length * 0.5)
        } else {
            Self::default_position(field)
        };
        let position = Point2::new(
            position.x.clamp(
                -field.field_length / 2.0,
                -field.field_length / 2.0 + field.goal_box_area_length,
            ),
            position
                .y
                .clamp(-field.goal_box_area_width / 2.0, field.goal_box_area_width / 2.0),
        );

        let to_ball = ball - position;
        Pose::new(position, to_ball.y.atan2(to_ball.x))
    }

    /// Whether the ball moves fast and straight enough at the goal to warrant the squat.
    fn should_genuflect(&self, field: &FieldDimensions, ball: &TeamBallModel) -> bool {
        let speed = ball.velocity.norm();
        if speed < self.config.genuflect_min_ball_speed {
            return false;
        }
        // heading towards our goal line at all?
        if ball.velocity.x >= 0.0 {
            return false;
        }

        let goal_line_x = -field.field_length / 2.0;
        let time_to_goal_line = (goal_line_x - ball.position.x) / ball.velocity.x;
        if time_to_goal_line < 0.0
            || time_to_goal_line > self.config.genuflect_time_to_impact.as_secs_f32()
        {
            return false;
        }

        // where the ball crosses the goal line
        let crossing_y = ball.position.y + ball.velocity.y * time_to_goal_line;
        crossing_y.abs() < field.goal_inner_width / 2.0 + field.goal_post_diameter
    }
}

impl Module for KeeperActionProvider {
    fn name(&self) -> &'static str {
        "keeper_action_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamBallModel>(),
            SlotInfo::of::<WorldState>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<KeeperAction>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<KeeperAction>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball_state = database.get::<BallState>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let world = database.get::<WorldState>()?;
        let mut action = database.get_mut::<KeeperAction>()?;

        if game.game_state != GameState::Playing || game.penalty != Penalty::None {
            return Ok(());
        }

        let ball_known = team_ball.ball_type != BallType::None;
        action.pose = if ball_known {
            Self::block_pose(&field, team_ball.position)
        } else {
            let position = Self::default_position(&field);
            Pose::new(position, 0.0)
        };

        action.action_type = if ball_known && self.should_genuflect(&field, &team_ball) {
            KeeperActionType::Genuflect
        } else {
            KeeperActionType::BlockGoal
        };

        // a ball sitting almost on the keeper's feet inside the goal box is played away
        action.wants_to_play_ball = self.config.may_play_ball
            && ball_known
            && world.ball_in_penalty_area
            && robot.valid
            && ball_state.found
            && ball_state.position.coords.norm() < 0.6
            && team_ball.velocity.norm() < 0.2;

        action.valid = true;
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
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn field() -> FieldDimensions {
        FieldDimensions::default()
    }

    #[test]
    fn block_pose_sits_between_ball_and_goal() {
        let pose = KeeperActionProvider::block_pose(&field(), Point2::new(0.0, 0.0));

        // on the goal-box arc in front of the goal, facing the ball
        assert_relative_eq!(pose.position.x, -4.5 + 0.3, epsilon = 1e-5);
        assert_relative_eq!(pose.position.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(pose.orientation, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn block_pose_is_clipped_to_the_goal_box() {
        let pose = KeeperActionProvider::block_pose(&field(), Point2::new(-4.4, 3.0));

        assert!(pose.position.y <= field().goal_box_area_width / 2.0 + 1e-5);
        assert!(pose.position.x >= -field().field_length / 2.0 - 1e-5);
    }

    #[test]
    fn fast_straight_ball_triggers_the_squat() {
        let provider = KeeperActionProvider::new(KeeperConfig::default());
        let ball = TeamBallModel {
            ball_type: BallType::Team,
            position: Point2::new(-3.0, 0.0),
            velocity: Vector2::new(-1.5, 0.0),
            ..Default::default()
        };

        assert!(provider.should_genuflect(&field(), &ball));
    }

    #[test]
    fn slow_or_wide_balls_do_not() {
        let provider = KeeperActionProvider::new(KeeperConfig::default());
        let field = field();

        let slow = TeamBallModel {
            ball_type: BallType::Team,
            position: Point2::new(-3.0, 0.0),
            velocity: Vector2::new(-0.2, 0.0),
            ..Default::default()
        };
        assert!(!provider.should_genuflect(&field, &slow));

        let wide = TeamBallModel {
            ball_type: BallType::Team,
            position: Point2::new(-3.0, 0.0),
            velocity: Vector2::new(-1.5, 2.0),
            ..Default::default()
        };
        assert!(!provider.should_genuflect(&field, &wide));
    }
}
