use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::SetPlayStrikerConfig;
use crate::data::game_state::{GamePhase, GameState, Penalty, SetPlay};
use crate::data::striker::{KickType, SetPlayStrikerAction, SetPlayStrikerActionType};
use crate::data::{
    BallState, BallType, CycleInfo, FieldDimensions, GameControllerState, RobotPosition,
    TeamBallModel, TeamPlayers, WorldState,
};
use crate::math::hysteresis::Hysteresis;
use crate::math::{ball_utils, Pose};

const TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// The striker's behavior during set plays: perform the free kick when we are the
/// kicking team, block the opponent's free kick otherwise.
pub struct SetPlayStrikerActionProvider {
    config: SetPlayStrikerConfig,
    angle_to_ball_dribble: f32,
    angle_to_ball_kick: f32,
    last_sign: i32,
    ball_near_opponent_goal: bool,
    should_kick: bool,
}

impl SetPlayStrikerActionProvider {
    #[must_use]
    pub fn new(config: SetPlayStrikerConfig) -> Self {
        Self {
            angle_to_ball_dribble: config.angle_to_ball_dribble * TO_RAD,
            angle_to_ball_kick: config.angle_to_ball_kick * TO_RAD,
            config,
            last_sign: 1,
            ball_near_opponent_goal: false,
            should_kick: false,
        }
    }

    fn kick_target(
        &self,
        field: &FieldDimensions,
        game: &GameControllerState,
        world: &WorldState,
    ) -> Point2<f32> {
        let opponent_goal = field.opponent_goal_center();
        let corner_kick_target = Point2::new(
            field.field_length / 2.0 - self.config.corner_kick_target_offset,
            0.0,
        );
        let ball_in_opponents_corner = world.ball_in_corner && !world.ball_in_own_half;

        match game.set_play {
            SetPlay::CornerKick => corner_kick_target,
            SetPlay::GoalKick => opponent_goal,
            SetPlay::KickIn | SetPlay::PushingFreeKick if ball_in_opponents_corner => {
                corner_kick_target
            }
            _ => opponent_goal,
        }
    }

    fn kick_or_dribble(
        &mut self,
        field: &FieldDimensions,
        team_ball: &TeamBallModel,
        team_players: &TeamPlayers,
        world: &WorldState,
    ) -> SetPlayStrikerActionType {
        // score directly when the ball is already close to the opponent goal
        let distance_to_goal = (team_ball.position - field.opponent_goal_center()).norm();
        self.ball_near_opponent_goal =
            Hysteresis::smaller_than(distance_to_goal, 3.0, 0.25, self.ball_near_opponent_goal);
        let ball_in_opponents_corner = world.ball_in_corner && !world.ball_in_own_half;
        if self.ball_near_opponent_goal && self.config.enable_scoring && !ball_in_opponents_corner {
            return SetPlayStrikerActionType::Kick;
        }

        // kick long if there is a teammate forward to collect it
        for player in &team_players.players {
            if player.penalized || player.fallen {
                continue;
            }
            self.should_kick =
                Hysteresis::greater_than(player.pose.position.x, 0.0, 0.25, self.should_kick);
            if self.should_kick && self.config.enable_passing {
                return SetPlayStrikerActionType::Kick;
            }
        }
        SetPlayStrikerActionType::Dribble
    }

    /// The blocking pose during enemy free kicks: 85 cm from the ball towards the own
    /// goal, never backed into the goal itself.
    fn block(
        field: &FieldDimensions,
        team_ball: &TeamBallModel,
        action: &mut SetPlayStrikerAction,
    ) {
        let ball = team_ball.position;
        let own_goal = field.own_goal_center();
        let goal_to_ball = ball - own_goal;
        let mut position = ball - 0.85 * goal_to_ball.normalize();

        let x_limit = field.field_length / 2.0 - 0.3;
        position.x = position.x.clamp(-x_limit, x_limit);

        let to_ball = ball - position;
        action.action_type = SetPlayStrikerActionType::Walk;
        action.kick_pose = Pose::new(position, to_ball.y.atan2(to_ball.x));
        action.kickable = ball_utils::Kickable::Not;
        action.valid = true;
    }
}

impl Module for SetPlayStrikerActionProvider {
    fn name(&self) -> &'static str {
        "set_play_striker_action_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamBallModel>(),
            SlotInfo::of::<TeamPlayers>(),
            SlotInfo::of::<WorldState>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<SetPlayStrikerAction>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<SetPlayStrikerAction>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball_state = database.get::<BallState>()?;
        let cycle_info = database.get::<CycleInfo>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let team_players = database.get::<TeamPlayers>()?;
        let world = database.get::<WorldState>()?;
        let mut action = database.get_mut::<SetPlayStrikerAction>()?;

        if game.game_state != GameState::Playing
            || game.penalty != Penalty::None
            || game.game_phase != GamePhase::Normal
            || game.set_play == SetPlay::None
            || game.set_play == SetPlay::PenaltyKick
            || team_ball.ball_type == BallType::None
        {
            return Ok(());
        }

        if !game.kicking_team {
            Self::block(&field, &team_ball, &mut action);
            return Ok(());
        }

        let rel_ball = robot.pose.field_to_robot(team_ball.position);
        let target = self.kick_target(&field, &game, &world);
        let decision = self.kick_or_dribble(&field, &team_ball, &team_players, &world);

        let ball_age = if ball_state.found {
            cycle_info.age(ball_state.time_when_last_seen)
        } else {
            std::time::Duration::MAX
        };

        match decision {
            SetPlayStrikerActionType::Kick => {
                let distance_to_ball = 0.2;
                action.action_type = SetPlayStrikerActionType::Kick;
                action.kick_type = KickType::Forward;
                action.kick_pose = ball_utils::kick_pose(
                    rel_ball,
                    robot.pose.field_to_robot(target),
                    distance_to_ball,
                    &mut self.last_sign,
                    false,
                );
                action.kickable = ball_utils::kickable(
                    &action.kick_pose,
                    ball_state.position,
                    ball_state.found,
                    ball_age,
                    distance_to_ball,
                    self.angle_to_ball_kick,
                );
            }
            _ => {
                action.action_type = SetPlayStrikerActionType::Dribble;
                action.kick_type = KickType::InWalkGentle;
                action.kick_pose = ball_utils::kick_pose(
                    rel_ball,
                    robot.pose.field_to_robot(target),
                    self.config.distance_to_ball_dribble,
                    &mut self.last_sign,
                    false,
                );
                action.kickable = ball_utils::kickable(
                    &action.kick_pose,
                    ball_state.position,
                    ball_state.found,
                    ball_age,
                    self.config.distance_to_ball_dribble,
                    self.angle_to_ball_dribble,
                );
            }
        }
        action.target = target;
        action.valid = true;

        Ok(())
    }

    fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
        self.config = super::parse_parameters(parameters)?;
        self.angle_to_ball_dribble = self.config.angle_to_ball_dribble * TO_RAD;
        self.angle_to_ball_kick = self.config.angle_to_ball_kick * TO_RAD;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team_ball_at(position: Point2<f32>) -> TeamBallModel {
        TeamBallModel {
            ball_type: BallType::Team,
            seen: true,
            found: true,
            position,
            ..Default::default()
        }
    }

    #[test]
    fn corner_kicks_aim_in_front_of_the_goal() {
        let provider = SetPlayStrikerActionProvider::new(SetPlayStrikerConfig::default());
        let game = GameControllerState {
            set_play: SetPlay::CornerKick,
            kicking_team: true,
            ..Default::default()
        };

        let target = provider.kick_target(
            &FieldDimensions::default(),
            &game,
            &WorldState::default(),
        );

        assert!(target.x < 4.5);
        assert!(target.x > 2.5);
        assert_eq!(target.y, 0.0);
    }

    #[test]
    fn blocking_pose_stays_between_ball_and_own_goal() {
        let field = FieldDimensions::default();
        let team_ball = team_ball_at(Point2::new(-2.0, 1.0));
        let mut action = SetPlayStrikerAction::default();

        SetPlayStrikerActionProvider::block(&field, &team_ball, &mut action);

        assert!(action.valid);
        assert_eq!(action.action_type, SetPlayStrikerActionType::Walk);
        // the blocker is on the goal side of the ball
        assert!(action.kick_pose.position.x < team_ball.position.x);
        let distance = (team_ball.position - action.kick_pose.position).norm();
        assert!((distance - 0.85).abs() < 1e-4);
    }

    #[test]
    fn a_ball_near_the_goal_is_kicked_directly() {
        let mut provider = SetPlayStrikerActionProvider::new(SetPlayStrikerConfig::default());
        let decision = provider.kick_or_dribble(
            &FieldDimensions::default(),
            &team_ball_at(Point2::new(3.0, 0.5)),
            &TeamPlayers::default(),
            &WorldState::default(),
        );

        assert_eq!(decision, SetPlayStrikerActionType::Kick);
    }
}
