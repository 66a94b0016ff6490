use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;
use rand::Rng;

use crate::config::PenaltyStrikerConfig;
use crate::data::game_state::{GamePhase, GameState, Penalty, SetPlay};
use crate::data::striker::{KickType, PenaltyStrikerAction};
use crate::data::{BallState, CycleInfo, FieldDimensions, GameControllerState, RobotPosition};
use crate::math::ball_utils;

const TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// Decides the penalty shot: the corner is chosen once at random when the shootout
/// starts and held until the penalty situation ends.
pub struct PenaltyStrikerActionProvider {
    config: PenaltyStrikerConfig,
    /// The sign of the chosen corner; 0 while no corner has been chosen yet.
    penalty_target_offset: f32,
}

impl PenaltyStrikerActionProvider {
    #[must_use]
    pub fn new(config: PenaltyStrikerConfig) -> Self {
        Self {
            config,
            penalty_target_offset: 0.0,
        }
    }
}

impl Module for PenaltyStrikerActionProvider {
    fn name(&self) -> &'static str {
        "penalty_striker_action_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<RobotPosition>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<PenaltyStrikerAction>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<PenaltyStrikerAction>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball_state = database.get::<BallState>()?;
        let cycle_info = database.get::<CycleInfo>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let robot = database.get::<RobotPosition>()?;
        let mut action = database.get_mut::<PenaltyStrikerAction>()?;

        let in_penalty_situation =
            game.game_phase == GamePhase::PenaltyShoot || game.set_play == SetPlay::PenaltyKick;
        if !in_penalty_situation
            || game.game_state != GameState::Playing
            || !game.kicking_team
            || game.penalty != Penalty::None
        {
            self.penalty_target_offset = 0.0;
            return Ok(());
        }

        if self.penalty_target_offset == 0.0 {
            // TODO: aim at the side the opponent keeper leaves open once the robot
            // detection is reliable enough to tell
            self.penalty_target_offset = if rand::rng().random_range(0..2) == 0 {
                -1.0
            } else {
                1.0
            };
        }

        let abs_ball = robot.pose.robot_to_field(ball_state.position);
        let penalty_spot = field.opponent_penalty_spot();

        let ball_on_the_spot = ball_state.found && (abs_ball - penalty_spot).norm() < 0.5;
        if !ball_on_the_spot {
            return Ok(());
        }

        let target = robot.pose.field_to_robot(Point2::new(
            field.field_length * 0.5,
            self.penalty_target_offset * field.goal_inner_width * 0.5
                * self.config.aim_at_corner_factor,
        ));

        // the left foot kicks more reliably than config would suggest, especially in
        // shootouts, so it is pinned here
        let mut use_only_this_foot = 1;
        let angle_to_ball = 5.0 * TO_RAD;
        let kick_pose = ball_utils::kick_pose(
            ball_state.position,
            target,
            self.config.distance_to_ball_kick,
            &mut use_only_this_foot,
            true,
        );
        let kickable = ball_utils::kickable(
            &kick_pose,
            ball_state.position,
            ball_state.found,
            cycle_info.age(ball_state.time_when_last_seen),
            self.config.distance_to_ball_kick,
            angle_to_ball,
        );
        action.kick_pose = kick_pose;
        action.target = target;
        action.kick_type = KickType::Forward;
        action.kickable = kickable;
        action.valid = true;

        Ok(())
    }

    fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
        self.config = super::parse_parameters(parameters)?;
        Ok(())
    }
}
