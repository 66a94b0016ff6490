use crate::data::game_state::{GamePhase, GameState, Penalty};
use crate::data::ActionCommand;

use super::super::DataSet;

/// The root of the behavior tree: safety gates first, then the game-state dispatch.
pub fn root_behavior(d: &DataSet) -> ActionCommand {
    // a penalized robot sits still, whatever else is going on
    if d.game.penalty != Penalty::None {
        return ActionCommand::penalized();
    }

    // fallen long enough: get up before anything else
    if d.body.fallen && d.cycle.age(d.body.fallen_since) > d.config.stand_up_delay {
        return ActionCommand::stand_up();
    }
    if d.body.fallen {
        // brief falls may still be caught by the motion layer
        return ActionCommand::hold();
    }

    if d.game.game_phase == GamePhase::PenaltyShoot {
        return super::penalty_shootout(d);
    }

    match d.game.game_state {
        GameState::Initial => super::initial(d),
        GameState::Ready => super::ready(d),
        GameState::Set => super::set(d),
        GameState::Playing => super::playing(d),
        GameState::Finished => super::finished(d),
    }
}
