use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::StrikerConfig;
use crate::data::game_state::{GamePhase, GameState, Penalty};
use crate::data::striker::{KickType, StrikerActionType};
use crate::data::{
    BallState, BallType, CycleInfo, FieldDimensions, GameControllerState, PlayingRole,
    RobotPosition, StrikerAction, TeamBallModel, TeamPlayers,
};
use crate::math::{ball_utils, Pose};

const TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// A teammate the ball could be passed to.
struct PassTarget {
    number: u8,
    position: Point2<f32>,
}

/// Decides what the striker does with the ball: score, pass, or dribble to a better
/// position, and computes the kick pose and foot for it.
pub struct StrikerActionProvider {
    config: StrikerConfig,
    angle_to_ball_dribble: f32,
    angle_to_ball_kick: f32,
    last_action: StrikerActionType,
    last_sign: i32,
    last_pass_target: u8,
}

impl StrikerActionProvider {
    #[must_use]
    pub fn new(config: StrikerConfig) -> Self {
        Self {
            angle_to_ball_dribble: config.angle_to_ball_dribble * TO_RAD,
            angle_to_ball_kick: config.angle_to_ball_kick * TO_RAD,
            last_sign: if config.use_only_this_foot != 0 {
                config.use_only_this_foot
            } else {
                1
            },
            config,
            last_action: StrikerActionType::Dribble,
            last_pass_target: 0,
        }
    }

    /// Rates a position as a kick origin: closer to the goal and at a flatter angle is
    /// better (smaller).
    fn rate_position(field: &FieldDimensions, position: Point2<f32>) -> f32 {
        let to_goal = field.opponent_goal_center() - position;
        to_goal.norm() + to_goal.y.atan2(to_goal.x).abs() * 0.75
    }

    fn keeper_wants_to_play_ball(team_players: &TeamPlayers) -> bool {
        // the keeper announces this through its reported action
        team_players.players.iter().any(|player| {
            player.currently_performing_role == PlayingRole::Keeper
                && player.current_action == gjallarhorn::team_message::WireAction::Kick
        })
    }

    fn find_pass_target(
        &self,
        field: &FieldDimensions,
        team_players: &TeamPlayers,
        team_ball: &TeamBallModel,
        ball_rating: f32,
    ) -> Option<PassTarget> {
        let mut best: Option<PassTarget> = None;
        // treat the ball rating like a last target so a pass must clearly improve on it
        let mut best_rating = ball_rating - self.config.last_target_bonus;

        for player in &team_players.players {
            if player.penalized || player.fallen {
                continue;
            }
            let distance = (player.pose.position - team_ball.position).norm();
            if !(1.5..=3.0).contains(&distance) {
                continue;
            }
            let bonus = if self.last_action == StrikerActionType::Pass
                && player.player_number == self.last_pass_target
            {
                self.config.last_target_bonus
            } else {
                0.0
            };
            let rating = Self::rate_position(field, player.pose.position) - bonus;
            if rating < best_rating {
                best_rating = rating;
                best = Some(PassTarget {
                    number: player.player_number,
                    position: player.pose.position,
                });
            }
        }
        best
    }

    fn calculate_striker_action(
        &mut self,
        action: &mut StrikerAction,
        field: &FieldDimensions,
        team_ball: &TeamBallModel,
        team_players: &TeamPlayers,
    ) {
        let goal_position = field.opponent_goal_center();
        let ball_target = Point2::new(goal_position.x + 0.2, goal_position.y);
        let ball_position = team_ball.position;

        // close to the goal mouth the ball is simply pushed over the line
        let was_dribbling_into_goal = self.last_action == StrikerActionType::DribbleIntoGoal;
        let dribble_window = if was_dribbling_into_goal { 0.6 } else { 0.5 };
        if ball_position.y.abs() < dribble_window
            && ball_position.x > goal_position.x - dribble_window
        {
            action.target = ball_target;
            action.action_type = StrikerActionType::DribbleIntoGoal;
            self.last_action = action.action_type;
            self.last_pass_target = 0;
            action.valid = true;
            return;
        }

        let ball_rating = Self::rate_position(field, ball_position);

        // scoring region, sticky once we are at it
        let was_scoring = matches!(
            self.last_action,
            StrikerActionType::DribbleIntoGoal | StrikerActionType::KickIntoGoal
        );
        let score_threshold = if was_scoring { 3.0 } else { 2.0 };
        if ball_rating < score_threshold {
            action.target = ball_target;
            action.action_type = if self.config.shoot_into_goal {
                StrikerActionType::KickIntoGoal
            } else {
                StrikerActionType::DribbleIntoGoal
            };
            self.last_action = action.action_type;
            self.last_pass_target = 0;
            action.valid = true;
            return;
        }

        if let Some(pass_target) = self.find_pass_target(field, team_players, team_ball, ball_rating)
        {
            action.action_type = StrikerActionType::Pass;
            action.target = pass_target.position;
            action.pass_target = pass_target.number;
            self.last_action = action.action_type;
            self.last_pass_target = pass_target.number;
            action.valid = true;
            return;
        }

        // no better option: dribble towards the front of the opponent penalty area
        action.action_type = StrikerActionType::Dribble;
        action.target = Point2::new(
            field.field_length / 2.0 - field.penalty_area_length,
            0.0,
        );
        self.last_action = action.action_type;
        self.last_pass_target = 0;
        action.valid = true;
    }

    fn calculate_kick(
        &mut self,
        action: &mut StrikerAction,
        robot: &RobotPosition,
        team_ball: &TeamBallModel,
        ball_state: &BallState,
        cycle_info: &CycleInfo,
    ) {
        let rel_ball_source = robot.pose.field_to_robot(team_ball.position);
        let rel_ball_target = robot.pose.field_to_robot(action.target);

        let mut forced_foot = self.config.use_only_this_foot;
        let force_sign = forced_foot != 0;
        let last_sign = if force_sign {
            &mut forced_foot
        } else {
            &mut self.last_sign
        };

        let ball_age = if ball_state.found {
            cycle_info.age(ball_state.time_when_last_seen)
        } else {
            std::time::Duration::MAX
        };

        let dribbling = matches!(
            action.action_type,
            StrikerActionType::DribbleIntoGoal | StrikerActionType::Dribble
        );
        let (distance, angle, kick_type) = if dribbling {
            (
                self.config.distance_to_ball_dribble,
                self.angle_to_ball_dribble,
                KickType::InWalkGentle,
            )
        } else {
            (
                self.config.distance_to_ball_kick,
                self.angle_to_ball_kick,
                KickType::Forward,
            )
        };

        action.kick_pose = ball_utils::kick_pose(
            rel_ball_source,
            rel_ball_target,
            distance,
            last_sign,
            force_sign,
        );
        action.kickable = ball_utils::kickable(
            &action.kick_pose,
            ball_state.position,
            ball_state.found,
            ball_age,
            distance,
            angle,
        );
        action.kick_type = kick_type;
    }
}

impl Module for StrikerActionProvider {
    fn name(&self) -> &'static str {
        "striker_action_provider"
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
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<StrikerAction>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<StrikerAction>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball_state = database.get::<BallState>()?;
        let cycle_info = database.get::<CycleInfo>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let team_players = database.get::<TeamPlayers>()?;
        let mut action = database.get_mut::<StrikerAction>()?;

        let in_active_state = matches!(
            game.game_state,
            GameState::Playing | GameState::Ready | GameState::Set
        );
        if !in_active_state
            || game.penalty != Penalty::None
            || game.game_phase != GamePhase::Normal
            || team_ball.ball_type == BallType::None
        {
            return Ok(());
        }

        if self.config.check_if_keeper_wants_to_play_ball
            && Self::keeper_wants_to_play_ball(&team_players)
        {
            // stay a meter away and wait for the keeper to clear the ball
            let mut walk_pose = robot.pose;
            let suggested_distance = 1.0;
            let to_ball = team_ball.position - robot.pose.position;
            if to_ball.norm() <= suggested_distance {
                let position = team_ball.position - to_ball.normalize() * suggested_distance;
                walk_pose = Pose::new(position, to_ball.y.atan2(to_ball.x));
            }

            action.target = Point2::origin();
            action.action_type = StrikerActionType::WaitingForKeeper;
            action.kick_pose = walk_pose;
            action.kickable = ball_utils::Kickable::Not;
            self.last_action = action.action_type;
            self.last_pass_target = 0;
            action.valid = true;
            return Ok(());
        }

        // do not change the order: the kick uses the target the action decided on
        self.calculate_striker_action(&mut action, &field, &team_ball, &team_players);
        self.calculate_kick(&mut action, &robot, &team_ball, &ball_state, &cycle_info);

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
    use crate::data::TeamPlayer;

    fn field() -> FieldDimensions {
        FieldDimensions::default()
    }

    fn provider() -> StrikerActionProvider {
        StrikerActionProvider::new(StrikerConfig::default())
    }

    fn team_ball_at(position: Point2<f32>) -> TeamBallModel {
        TeamBallModel {
            ball_type: BallType::Self_,
            seen: true,
            found: true,
            position,
            ..Default::default()
        }
    }

    #[test]
    fn ball_in_the_goal_mouth_is_dribbled_over_the_line() {
        let mut provider = provider();
        let mut action = StrikerAction::default();

        provider.calculate_striker_action(
            &mut action,
            &field(),
            &team_ball_at(Point2::new(4.2, 0.2)),
            &TeamPlayers::default(),
        );

        assert!(action.valid);
        assert_eq!(action.action_type, StrikerActionType::DribbleIntoGoal);
    }

    #[test]
    fn close_to_goal_the_striker_scores() {
        let mut provider = provider();
        let mut action = StrikerAction::default();

        provider.calculate_striker_action(
            &mut action,
            &field(),
            &team_ball_at(Point2::new(3.0, 0.0)),
            &TeamPlayers::default(),
        );

        assert_eq!(action.action_type, StrikerActionType::KickIntoGoal);
        // the target overshoots the goal line slightly
        assert!(action.target.x > field().field_length / 2.0);
    }

    #[test]
    fn scoring_region_is_sticky() {
        let mut provider = provider();
        let mut action = StrikerAction::default();
        let field = field();

        // rating at this ball is between the 2.0 entry and 3.0 exit threshold
        let ball = team_ball_at(Point2::new(2.0, 0.0));
        provider.calculate_striker_action(
            &mut action,
            &field,
            &ball,
            &TeamPlayers::default(),
        );
        assert_eq!(action.action_type, StrikerActionType::Dribble);

        provider.last_action = StrikerActionType::KickIntoGoal;
        provider.calculate_striker_action(
            &mut action,
            &field,
            &ball,
            &TeamPlayers::default(),
        );
        assert_eq!(action.action_type, StrikerActionType::KickIntoGoal);
    }

    #[test]
    fn a_well_placed_teammate_becomes_the_pass_target() {
        let mut provider = provider();
        let mut action = StrikerAction::default();

        // ball far from the goal, teammate two meters ahead of it and much better placed
        let ball = team_ball_at(Point2::new(-2.0, 0.0));
        let teammate = TeamPlayer::at_pose(4, Pose::new(Point2::new(0.0, 0.0), 0.0));
        let players = TeamPlayers {
            players: vec![teammate],
            active_player_count: 2,
        };

        provider.calculate_striker_action(&mut action, &field(), &ball, &players);

        assert_eq!(action.action_type, StrikerActionType::Pass);
        assert_eq!(action.pass_target, 4);
    }

    #[test]
    fn fallen_teammates_are_not_passed_to() {
        let mut provider = provider();
        let mut action = StrikerAction::default();

        let ball = team_ball_at(Point2::new(-2.0, 0.0));
        let mut teammate = TeamPlayer::at_pose(4, Pose::new(Point2::new(0.0, 0.0), 0.0));
        teammate.fallen = true;
        let players = TeamPlayers {
            players: vec![teammate],
            active_player_count: 2,
        };

        provider.calculate_striker_action(&mut action, &field(), &ball, &players);

        assert_eq!(action.action_type, StrikerActionType::Dribble);
    }
}
