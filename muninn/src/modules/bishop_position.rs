use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::BishopConfig;
use crate::data::game_state::{GameState, SetPlay};
use crate::data::{
    BallType, BishopPosition, FieldDimensions, GameControllerState, PlayingRole, PlayingRoles,
    SupportingPosition, TeamBallModel, WorldState,
};

const TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// Which side of the field the bishop roams.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left = 1,
    Right = -1,
}

/// Positions the bishop: a forward pass target on the side of the field the ball is not
/// on, pushed towards the opponent goal during own set plays near the goal.
pub struct BishopPositionProvider {
    config: BishopConfig,
    minimum_angle: f32,
    side: Side,
}

impl BishopPositionProvider {
    #[must_use]
    pub fn new(config: BishopConfig) -> Self {
        Self {
            minimum_angle: config.minimum_angle * TO_RAD,
            config,
            side: Side::Left,
        }
    }

    /// Updates the preferred side. Only while the ball is in the own half, so the bishop
    /// never crosses in front of the striker.
    fn determine_side(&mut self, world: &WorldState) {
        if world.ball_in_own_half {
            self.side = if world.ball_in_left_half {
                Side::Right
            } else {
                Side::Left
            };
        }
    }

    fn aggressive_position(
        &self,
        field: &FieldDimensions,
        game: &GameControllerState,
        world: &WorldState,
        ball: Point2<f32>,
    ) -> Point2<f32> {
        let side = self.side as i32 as f32;
        let mut position = Point2::new(
            self.config.default_position_offset[0],
            side * self.config.default_position_offset[1],
        );

        let kicking_team = game.set_play != SetPlay::None && game.kicking_team;
        let corner_kick = world.ball_in_corner && !world.ball_in_own_half;
        let goalhanger = !world.ball_in_own_half;
        if kicking_team {
            if corner_kick {
                position = Point2::new(
                    field.field_length / 2.0 + self.config.corner_kick_offset[0],
                    side * self.config.corner_kick_offset[1],
                );
            } else if goalhanger {
                position = Point2::new(
                    field.field_length / 2.0 + self.config.goalhanger_offset[0],
                    side * self.config.goalhanger_offset[1],
                );
            }
        }

        // keep a stand-off from the ball so the bishop does not steal it
        let ball_to_bishop = position - ball;
        let distance = ball_to_bishop.norm();
        if distance < self.config.distance_to_ball && distance > f32::EPSILON {
            position += ball_to_bishop / distance * (self.config.distance_to_ball - distance);
        }
        position
    }

    fn passive_position(
        &self,
        field: &FieldDimensions,
        world: &WorldState,
        supporting: &SupportingPosition,
        ball: Point2<f32>,
    ) -> Point2<f32> {
        // stand at the minimum angle off the supporter's line to the ball
        let supporting_position = if supporting.valid {
            supporting.position
        } else {
            field.own_goal_center()
        };
        let to_ball = ball - supporting_position;
        let angle_supporter_to_ball = to_ball.y.atan2(to_ball.x);
        let angle_bishop_to_ball = angle_supporter_to_ball
            + if world.ball_in_left_half { 1.0 } else { -1.0 } * self.minimum_angle;

        let mut position = Point2::new(
            ball.x - self.config.distance_to_ball * angle_bishop_to_ball.cos(),
            ball.y - self.config.distance_to_ball * angle_bishop_to_ball.sin(),
        );
        // not too close to our own goal
        position.x = position.x.max(-field.field_length / 2.0 + 3.0);
        position
    }
}

impl Module for BishopPositionProvider {
    fn name(&self) -> &'static str {
        "bishop_position_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<PlayingRoles>(),
            SlotInfo::of::<SupportingPosition>(),
            SlotInfo::of::<TeamBallModel>(),
            SlotInfo::of::<WorldState>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<BishopPosition>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<BishopPosition>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let roles = database.get::<PlayingRoles>()?;
        let supporting = database.get::<SupportingPosition>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let world = database.get::<WorldState>()?;
        let mut bishop = database.get_mut::<BishopPosition>()?;

        if game.game_state != GameState::Playing
            || roles.role != PlayingRole::Bishop
            || team_ball.ball_type == BallType::None
        {
            return Ok(());
        }

        self.determine_side(&world);

        let ball = team_ball.position;
        let position = if self.config.allow_aggressive_bishop {
            self.aggressive_position(&field, &game, &world, ball)
        } else {
            self.passive_position(&field, &world, &supporting, ball)
        };

        // orientation trades off facing the ball against facing the opponent goal
        let to_ball = (ball - position).normalize();
        let to_goal = (field.opponent_goal_center() - position).normalize();
        let orientation_vector = to_ball + to_goal;

        bishop.position = position;
        bishop.orientation = orientation_vector.y.atan2(orientation_vector.x);
        bishop.valid = true;

        Ok(())
    }

    fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
        self.config = super::parse_parameters(parameters)?;
        self.minimum_angle = self.config.minimum_angle * TO_RAD;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir::{App, Brain};

    fn build_brain(game: GameControllerState, world: WorldState, ball: Point2<f32>) -> Brain {
        let team_ball = TeamBallModel {
            ball_type: BallType::Team,
            seen: true,
            found: true,
            position: ball,
            ..Default::default()
        };
        let roles = PlayingRoles {
            role: PlayingRole::Bishop,
            player_roles: vec![PlayingRole::Bishop],
        };
        let mut brain = App::new()
            .add_input(FieldDimensions::default())
            .unwrap()
            .add_input(game)
            .unwrap()
            .add_input(roles)
            .unwrap()
            .add_input(SupportingPosition::default())
            .unwrap()
            .add_input(team_ball)
            .unwrap()
            .add_input(world)
            .unwrap()
            .add_module(BishopPositionProvider::new(BishopConfig::default()))
            .unwrap()
            .build()
            .unwrap();
        brain.tick().unwrap();
        brain
    }

    #[test]
    fn own_corner_kick_places_the_bishop_in_front_of_the_goal() {
        // boundary scenario: corner kick for us, ball in the opponent corner
        let game = GameControllerState {
            game_state: GameState::Playing,
            set_play: SetPlay::CornerKick,
            kicking_team: true,
            ..Default::default()
        };
        let world = WorldState {
            ball_valid: true,
            ball_in_corner: true,
            ball_in_own_half: false,
            ball_in_left_half: true,
            ..Default::default()
        };
        let brain = build_brain(game, world, Point2::new(4.4, 2.9));

        let bishop = brain.database().get::<BishopPosition>().unwrap();
        assert!(bishop.valid);
        // in front of the opponent goal, on the configured offset
        assert!(bishop.position.x > 2.5);
        assert!(bishop.position.x < 4.5);
    }

    #[test]
    fn bishop_mirrors_the_ball_side_in_the_own_half() {
        let game = GameControllerState {
            game_state: GameState::Playing,
            ..Default::default()
        };
        let world = WorldState {
            ball_valid: true,
            ball_in_own_half: true,
            ball_in_left_half: true,
            ..Default::default()
        };
        let brain = build_brain(game, world, Point2::new(-2.0, 1.5));

        let bishop = brain.database().get::<BishopPosition>().unwrap();
        assert!(bishop.valid);
        // ball on the left: the bishop takes the right side
        assert!(bishop.position.y < 0.0);
    }
}
