use mimir::{Database, Module, Result, SlotInfo};

use crate::data::game_state::{GameState, Penalty, SetPlay};
use crate::data::striker::{KeeperActionType, ReplacementKeeperAction};
use crate::data::{BallType, FieldDimensions, GameControllerState, TeamBallModel};
use crate::math::Pose;

use super::keeper_action::KeeperActionProvider;

/// The replacement keeper guards the goal like the keeper, but may not enter the goal
/// box during enemy penalty kicks; it then waits just outside.
pub struct ReplacementKeeperActionProvider;

impl ReplacementKeeperActionProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReplacementKeeperActionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for ReplacementKeeperActionProvider {
    fn name(&self) -> &'static str {
        "replacement_keeper_action_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<TeamBallModel>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<ReplacementKeeperAction>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<ReplacementKeeperAction>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let mut action = database.get_mut::<ReplacementKeeperAction>()?;

        if game.game_state != GameState::Playing || game.penalty != Penalty::None {
            return Ok(());
        }

        let mut pose = if team_ball.ball_type != BallType::None {
            KeeperActionProvider::block_pose(&field, team_ball.position)
        } else {
            Pose::new(
                nalgebra::Point2::new(
                    -field.field_length / 2.0 + field.goal_box_area_length * 0.5,
                    0.0,
                ),
                0.0,
            )
        };

        // during an enemy penalty kick only the real keeper may be inside the penalty
        // area, so wait right in front of it
        if game.set_play == SetPlay::PenaltyKick && !game.kicking_team {
            pose.position.x = (-field.field_length / 2.0 + field.penalty_area_length + 0.2)
                .max(pose.position.x);
        }

        action.pose = pose;
        action.action_type = KeeperActionType::BlockGoal;
        action.valid = true;
        Ok(())
    }
}
