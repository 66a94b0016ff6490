use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::{Point2, Vector2};

use crate::config::SupporterConfig;
use crate::data::game_state::{GameState, Penalty};
use crate::data::{
    BallType, FieldDimensions, GameControllerState, PlayingRole, PlayingRoles, RobotPosition,
    SupportingPosition, TeamBallModel, TeamPlayers,
};

use crate::config::PlayerConfig;

/// Positions the support striker behind the ball, repelled from the striker's kick line
/// so a missed kick is collected without the supporter ever obstructing it.
pub struct SupportingPositionProvider {
    config: SupporterConfig,
    player: PlayerConfig,
    was_obstructing: bool,
}

impl SupportingPositionProvider {
    #[must_use]
    pub fn new(config: SupporterConfig, player: PlayerConfig) -> Self {
        Self {
            config,
            player,
            was_obstructing: false,
        }
    }

    /// The player number of the striker's current pass target, if any.
    fn find_pass_target(team_players: &TeamPlayers) -> Option<u8> {
        let striker = team_players.players.iter().find(|player| {
            !player.penalized && player.currently_performing_role == PlayingRole::Striker
        })?;
        (striker.current_pass_target != 0).then_some(striker.current_pass_target)
    }
}

impl Module for SupportingPositionProvider {
    fn name(&self) -> &'static str {
        "supporting_position_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<PlayingRoles>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamBallModel>(),
            SlotInfo::of::<TeamPlayers>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<SupportingPosition>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<SupportingPosition>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let roles = database.get::<PlayingRoles>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let team_players = database.get::<TeamPlayers>()?;
        let mut supporting = database.get_mut::<SupportingPosition>()?;

        if game.game_state != GameState::Playing
            || game.penalty != Penalty::None
            || roles.role != PlayingRole::SupportStriker
            || team_ball.ball_type == BallType::None
        {
            return Ok(());
        }

        // the striker kicks at the pass target if it has one, at the goal otherwise
        let pass_target = Self::find_pass_target(&team_players);
        if pass_target == Some(self.player.player_number) {
            // we are the pass target: wait where we are
            supporting.position = robot.pose.position;
            supporting.orientation = robot.pose.angle_to(team_ball.position);
            supporting.valid = true;
            self.was_obstructing = false;
            return Ok(());
        }
        let rel_kick_target = pass_target
            .and_then(|number| {
                team_players
                    .players
                    .iter()
                    .find(|player| !player.penalized && player.player_number == number)
            })
            .map_or_else(
                || robot.pose.field_to_robot(field.opponent_goal_center()),
                |target| robot.pose.field_to_robot(target.pose.position),
            );

        let rel_ball = robot.pose.field_to_robot(team_ball.position);
        let stand_off = self.config.distance_to_ball;

        // desired position: behind the ball, seen from this robot
        let rel_supporting = if (rel_ball.coords.norm_squared() - stand_off * stand_off).abs()
            >= 0.1 * 0.1
        {
            rel_ball + rel_ball.coords.normalize() * (-stand_off)
        } else {
            Point2::origin()
        };

        // distance of that position to the kick line (ball -> kick target)
        let ball_to_target = rel_kick_target - rel_ball;
        let ball_to_supporting = rel_supporting - rel_ball;
        let projected = rel_ball
            + ball_to_target * (ball_to_supporting.dot(&ball_to_target))
                / ball_to_target.dot(&ball_to_target);
        let distance_to_kick_line_squared = (projected - rel_supporting).norm_squared();

        let minimum_distance = if self.was_obstructing {
            self.config.minimum_distance + 0.2
        } else {
            self.config.minimum_distance
        };
        let too_close = distance_to_kick_line_squared < minimum_distance * minimum_distance;
        let between = rel_supporting.x > rel_ball.x && rel_supporting.x < rel_kick_target.x;

        let rel_position = if too_close && between {
            // slide off the kick line on the shorter side
            let cross = (rel_kick_target.x - rel_ball.x) * (rel_supporting.y - rel_ball.y)
                - (rel_supporting.x - rel_ball.x) * (rel_kick_target.y - rel_ball.y);
            let sign = if cross > 0.0 { 1.0 } else { -1.0 };
            let normal = Vector2::new(-ball_to_target.y, ball_to_target.x) / ball_to_target.norm();
            self.was_obstructing = true;
            projected + normal * sign * self.config.minimum_distance
        } else {
            self.was_obstructing = false;
            rel_supporting
        };

        supporting.position = robot.pose.robot_to_field(rel_position);
        let to_ball = team_ball.position - supporting.position;
        supporting.orientation = to_ball.y.atan2(to_ball.x);
        supporting.valid = true;

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
    use mimir::{App, Brain};

    fn build_brain(robot_at: Point2<f32>, ball_at: Point2<f32>) -> Brain {
        let game = GameControllerState {
            game_state: GameState::Playing,
            ..Default::default()
        };
        let team_ball = TeamBallModel {
            ball_type: BallType::Team,
            seen: true,
            found: true,
            position: ball_at,
            ..Default::default()
        };
        let mut brain = App::new()
            .add_input(FieldDimensions::default())
            .unwrap()
            .add_input(game)
            .unwrap()
            .add_input(PlayingRoles {
                role: PlayingRole::SupportStriker,
                player_roles: Vec::new(),
            })
            .unwrap()
            .add_input(RobotPosition {
                valid: true,
                pose: crate::math::Pose::new(robot_at, 0.0),
                ..Default::default()
            })
            .unwrap()
            .add_input(team_ball)
            .unwrap()
            .add_input(TeamPlayers::default())
            .unwrap()
            .add_module(SupportingPositionProvider::new(
                SupporterConfig::default(),
                PlayerConfig::default(),
            ))
            .unwrap()
            .build()
            .unwrap();
        brain.tick().unwrap();
        brain
    }

    #[test]
    fn supporter_stands_behind_the_ball() {
        let brain = build_brain(Point2::new(-2.0, 0.5), Point2::new(0.0, 1.0));
        let supporting = brain.database().get::<SupportingPosition>().unwrap();

        assert!(supporting.valid);
        // behind the ball as seen from the supporter, i.e. closer to the own goal
        assert!(supporting.position.x < 0.0);
        let distance = (supporting.position - Point2::new(0.0, 1.0)).norm();
        assert!((distance - 1.0).abs() < 0.15);
    }
}
