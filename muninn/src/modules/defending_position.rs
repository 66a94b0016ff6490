use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::DefenderConfig;
use crate::data::game_state::{GameState, Penalty, SetPlay};
use crate::data::{
    BallType, DefendingPosition, FieldDimensions, GameControllerState, PlayingRole, PlayingRoles,
    TeamBallModel,
};
use crate::math::Pose;

/// Positions the defender: the ball is projected onto an ellipse around the own goal,
/// clipped so the defender neither retreats into the goal nor drifts too wide.
pub struct DefendingPositionProvider {
    config: DefenderConfig,
}

impl DefendingPositionProvider {
    #[must_use]
    pub fn new(config: DefenderConfig) -> Self {
        Self { config }
    }

    fn defending_position(&self, field: &FieldDimensions, ball: Point2<f32>) -> Point2<f32> {
        let own_goal = field.own_goal_center();
        let goal_to_ball = ball - own_goal;
        let direction_angle = goal_to_ball.y.atan2(goal_to_ball.x);

        // the ball direction projected onto the defense ellipse
        let mut position = Point2::new(
            own_goal.x + self.config.defense_radius_x * direction_angle.cos(),
            own_goal.y + self.config.defense_radius_y * direction_angle.sin(),
        );

        // never behind the passive defense line, never too wide
        position.x = position
            .x
            .max(own_goal.x + self.config.passive_defense_line_x);
        position.y = position
            .y
            .clamp(-self.config.passive_defense_line_y, self.config.passive_defense_line_y);
        position
    }

    /// During enemy free kicks the defender may not stand within 75 cm of the ball.
    fn consider_set_play(
        game: &GameControllerState,
        ball: Point2<f32>,
        position: Point2<f32>,
    ) -> Point2<f32> {
        if game.set_play == SetPlay::None || game.kicking_team {
            return position;
        }
        let required_distance = 0.75;
        let ball_to_position = position - ball;
        let distance = ball_to_position.norm();
        if distance >= required_distance || distance < f32::EPSILON {
            return position;
        }
        ball + ball_to_position / distance * required_distance
    }
}

impl Module for DefendingPositionProvider {
    fn name(&self) -> &'static str {
        "defending_position_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<PlayingRoles>(),
            SlotInfo::of::<TeamBallModel>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<DefendingPosition>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<DefendingPosition>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let roles = database.get::<PlayingRoles>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let mut defending = database.get_mut::<DefendingPosition>()?;

        if game.game_state != GameState::Playing
            || game.penalty != Penalty::None
            || roles.role != PlayingRole::Defender
            || team_ball.ball_type == BallType::None
        {
            return Ok(());
        }

        let position = self.defending_position(&field, team_ball.position);
        let position = Self::consider_set_play(&game, team_ball.position, position);

        let to_ball = team_ball.position - position;
        defending.pose = Pose::new(position, to_ball.y.atan2(to_ball.x));
        defending.valid = true;

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
    fn defender_stays_on_the_ellipse_between_ball_and_goal() {
        let provider = DefendingPositionProvider::new(DefenderConfig::default());
        let field = FieldDimensions::default();

        let position = provider.defending_position(&field, Point2::new(0.0, 0.0));

        // ball straight ahead: the defender stands on the major axis
        assert!((position.x - (-4.5 + 2.2)).abs() < 1e-5);
        assert!(position.y.abs() < 1e-5);
    }

    #[test]
    fn defender_never_retreats_behind_the_passive_line() {
        let provider = DefendingPositionProvider::new(DefenderConfig::default());
        let field = FieldDimensions::default();

        // ball almost behind the goal line
        let position = provider.defending_position(&field, Point2::new(-4.4, 2.5));

        assert!(position.x >= -4.5 + provider.config.passive_defense_line_x - 1e-5);
        assert!(position.y <= provider.config.passive_defense_line_y + 1e-5);
    }

    #[test]
    fn enemy_free_kick_pushes_the_defender_off_the_ball() {
        let game = GameControllerState {
            set_play: SetPlay::KickIn,
            kicking_team: false,
            ..Default::default()
        };
        let ball = Point2::new(-2.5, 0.0);
        let too_close = Point2::new(-2.8, 0.0);

        let adjusted = DefendingPositionProvider::consider_set_play(&game, ball, too_close);

        assert!((adjusted - ball).norm() >= 0.75 - 1e-5);
    }
}
