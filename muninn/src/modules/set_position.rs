use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::{PlayerConfig, SetPositionConfig};
use crate::data::game_state::{GameState, Penalty};
use crate::data::{GameControllerState, SetPosition};
use crate::math::Pose;

const TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// Provides the pose to walk to during READY, from the configured formation for the own
/// player number and kick-off flag.
pub struct SetPositionProvider {
    config: SetPositionConfig,
    player: PlayerConfig,
}

impl SetPositionProvider {
    #[must_use]
    pub fn new(config: SetPositionConfig, player: PlayerConfig) -> Self {
        Self { config, player }
    }
}

impl Module for SetPositionProvider {
    fn name(&self) -> &'static str {
        "set_position_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<GameControllerState>()]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<SetPosition>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<SetPosition>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let game = database.get::<GameControllerState>()?;
        let mut set_position = database.get_mut::<SetPosition>()?;

        let in_walk_in_state = matches!(game.game_state, GameState::Ready | GameState::Set);
        if !in_walk_in_state || game.penalty != Penalty::None {
            return Ok(());
        }

        let positions = if game.kickoff {
            &self.config.kickoff_positions
        } else {
            &self.config.default_positions
        };
        let Some(&[x, y, theta_degrees]) =
            positions.get(usize::from(self.player.player_number) - 1)
        else {
            return Ok(());
        };

        set_position.pose = Pose::new(Point2::new(x, y), theta_degrees * TO_RAD);
        set_position.valid = true;
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

    #[test]
    fn kickoff_and_receiving_formations_differ() {
        let game = GameControllerState {
            game_state: GameState::Ready,
            kickoff: true,
            ..Default::default()
        };
        let mut brain = App::new()
            .add_input(game)
            .unwrap()
            .add_module(SetPositionProvider::new(
                SetPositionConfig::default(),
                PlayerConfig {
                    player_number: 2,
                    team_number: 8,
                },
            ))
            .unwrap()
            .build()
            .unwrap();

        brain.tick().unwrap();
        let with_kickoff = brain.database().get::<SetPosition>().unwrap().pose;

        brain.database().get_mut::<GameControllerState>().unwrap().kickoff = false;
        brain.tick().unwrap();
        let without_kickoff = brain.database().get::<SetPosition>().unwrap().pose;

        // with kick-off player 2 lines up closer to the center circle
        assert!(with_kickoff.position.x > without_kickoff.position.x);
    }
}
