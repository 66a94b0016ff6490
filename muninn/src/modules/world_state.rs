use std::time::Duration;

use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::WorldStateConfig;
use crate::data::game_state::GameState;
use crate::data::{
    BallType, CycleInfo, FieldDimensions, GameControllerState, RobotPosition, TeamBallModel,
    WorldState,
};
use crate::math::geometry::is_inside_ellipse;
use crate::math::hysteresis::Hysteresis;

/// Derives the hysteretic region flags about ball and robot, and whether the ball is
/// free to be played after kick-off.
pub struct WorldStateProvider {
    config: WorldStateConfig,
    ball_is_free: bool,
    ball_in_own_half: bool,
    ball_in_left_half: bool,
    ball_in_corner: bool,
    ball_in_penalty_area: bool,
    ball_in_center_circle: bool,
    ball_is_to_my_left: bool,
    robot_in_own_half: bool,
    robot_in_left_half: bool,
}

impl WorldStateProvider {
    #[must_use]
    pub fn new(config: WorldStateConfig) -> Self {
        Self {
            config,
            ball_is_free: false,
            ball_in_own_half: true,
            ball_in_left_half: true,
            ball_in_corner: false,
            ball_in_penalty_area: false,
            ball_in_center_circle: true,
            ball_is_to_my_left: true,
            robot_in_own_half: true,
            robot_in_left_half: true,
        }
    }

    fn check_ball_in_corner(&self, field: &FieldDimensions, ball: Point2<f32>) -> bool {
        let threshold = if self.ball_in_corner {
            self.config.ball_in_corner_threshold + self.config.hysteresis
        } else {
            self.config.ball_in_corner_threshold - self.config.hysteresis
        };

        let half_length = field.field_length / 2.0;
        let half_width = field.field_width / 2.0;
        [
            Point2::new(half_length, half_width),
            Point2::new(-half_length, half_width),
            Point2::new(-half_length, -half_width),
            Point2::new(half_length, -half_width),
        ]
        .into_iter()
        .any(|corner| {
            is_inside_ellipse(
                ball,
                corner,
                self.config.ball_in_corner_x_threshold,
                self.config.ball_in_corner_y_threshold,
                threshold,
            )
        })
    }
}

impl Module for WorldStateProvider {
    fn name(&self) -> &'static str {
        "world_state_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamBallModel>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<WorldState>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<WorldState>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let cycle_info = database.get::<CycleInfo>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let mut world = database.get_mut::<WorldState>()?;

        let hysteresis = self.config.hysteresis;

        if game.game_state == GameState::Playing {
            if !self.ball_is_free {
                // only found team balls may declare the ball free; a RULE ball sitting on
                // the kickoff spot must not
                if game.kicking_team
                    || cycle_info.age(game.game_state_changed) > Duration::from_secs(10)
                    || (team_ball.found
                        && team_ball.ball_type != BallType::None
                        && team_ball.position.coords.norm() > field.center_circle_diameter * 0.5)
                {
                    self.ball_is_free = true;
                }
            }
        } else {
            self.ball_is_free = false;
        }
        world.ball_is_free = self.ball_is_free;

        if team_ball.ball_type != BallType::None {
            let ball = team_ball.position;
            self.ball_in_own_half =
                Hysteresis::smaller_than(ball.x, 0.0, hysteresis, self.ball_in_own_half);
            self.ball_in_left_half =
                Hysteresis::greater_than(ball.y, 0.0, hysteresis, self.ball_in_left_half);
            self.ball_in_corner = self.check_ball_in_corner(&field, ball);
            self.ball_in_penalty_area = Hysteresis::smaller_than(
                ball.x.abs(),
                field.field_length / 2.0 + hysteresis,
                hysteresis,
                self.ball_in_penalty_area,
            ) && Hysteresis::greater_than(
                ball.x.abs(),
                field.field_length / 2.0 - field.penalty_area_length - hysteresis,
                hysteresis,
                self.ball_in_penalty_area,
            ) && Hysteresis::smaller_than(
                ball.y.abs(),
                field.penalty_area_width / 2.0,
                hysteresis,
                self.ball_in_penalty_area,
            );
            self.ball_is_to_my_left = Hysteresis::greater_than(
                ball.y,
                robot.pose.position.y,
                hysteresis,
                self.ball_is_to_my_left,
            );
            self.ball_in_center_circle = Hysteresis::smaller_than(
                ball.coords.norm(),
                field.center_circle_diameter / 2.0,
                hysteresis,
                self.ball_in_center_circle,
            );

            world.ball_in_own_half = self.ball_in_own_half;
            world.ball_in_left_half = self.ball_in_left_half;
            world.ball_in_corner = self.ball_in_corner;
            world.ball_in_penalty_area = self.ball_in_penalty_area;
            world.ball_is_to_my_left = self.ball_is_to_my_left;
            world.ball_in_center_circle = self.ball_in_center_circle;
            world.ball_valid = true;
        }

        if robot.valid {
            self.robot_in_own_half = Hysteresis::smaller_than(
                robot.pose.position.x,
                0.0,
                hysteresis,
                self.robot_in_own_half,
            );
            self.robot_in_left_half = Hysteresis::greater_than(
                robot.pose.position.y,
                0.0,
                hysteresis,
                self.robot_in_left_half,
            );
            world.robot_in_own_half = self.robot_in_own_half;
            world.robot_in_left_half = self.robot_in_left_half;
            world.robot_valid = true;
        }

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
    use mimir::App;

    fn brain_with(
        game_state: GameState,
        kicking_team: bool,
        ball: Option<Point2<f32>>,
    ) -> mimir::Brain {
        let mut game = GameControllerState {
            game_state,
            kicking_team,
            ..Default::default()
        };
        game.game_state_changed = std::time::Instant::now();

        let mut team_ball = TeamBallModel::default();
        if let Some(position) = ball {
            team_ball.ball_type = BallType::Team;
            team_ball.found = true;
            team_ball.position = position;
        }

        let mut brain = App::new()
            .add_input(CycleInfo::default())
            .unwrap()
            .add_input(FieldDimensions::default())
            .unwrap()
            .add_input(game)
            .unwrap()
            .add_input(RobotPosition {
                valid: true,
                ..Default::default()
            })
            .unwrap()
            .add_input(team_ball)
            .unwrap()
            .add_module(WorldStateProvider::new(WorldStateConfig::default()))
            .unwrap()
            .build()
            .unwrap();
        brain.tick().unwrap();
        brain
    }

    #[test]
    fn ball_outside_center_circle_frees_the_ball() {
        let brain = brain_with(GameState::Playing, false, Some(Point2::new(2.0, 1.0)));
        let world = brain.database().get::<WorldState>().unwrap();

        assert!(world.ball_is_free);
        assert!(world.ball_valid);
        assert!(!world.ball_in_own_half);
        assert!(world.ball_in_left_half);
    }

    #[test]
    fn kicking_team_gets_the_ball_immediately() {
        let brain = brain_with(GameState::Playing, true, None);
        assert!(brain.database().get::<WorldState>().unwrap().ball_is_free);
    }

    #[test]
    fn no_team_ball_leaves_ball_flags_invalid() {
        let brain = brain_with(GameState::Playing, false, None);
        let world = brain.database().get::<WorldState>().unwrap();

        assert!(!world.ball_valid);
        assert!(world.robot_valid);
    }
}
