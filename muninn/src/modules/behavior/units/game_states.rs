use crate::data::action_command::LedCommand;
use crate::data::{ActionCommand, PlayingRole};

use super::super::DataSet;

/// INITIAL: stand still, look ahead.
pub fn initial(_d: &DataSet) -> ActionCommand {
    ActionCommand::stand()
}

/// READY: walk to the configured set position, scanning for landmarks on the way.
pub fn ready(d: &DataSet) -> ActionCommand {
    if d.set_position.valid {
        super::walk_to_pose(d, d.set_position.pose)
    } else {
        ActionCommand::stand().combine_head(super::look_around(d))
    }
}

/// SET: stand and keep the anticipated ball in view.
pub fn set(d: &DataSet) -> ActionCommand {
    ActionCommand::stand().combine_head(super::track_ball(d))
}

/// PLAYING: dispatch on the elected role.
pub fn playing(d: &DataSet) -> ActionCommand {
    let command = match d.roles.role {
        PlayingRole::Keeper => super::keeper(d),
        PlayingRole::ReplacementKeeper => super::replacement_keeper(d),
        PlayingRole::Striker => super::striker(d),
        PlayingRole::Defender => super::defender(d),
        PlayingRole::Bishop => super::bishop(d),
        PlayingRole::SupportStriker => super::support_striker(d),
        PlayingRole::Loser => super::loser(d),
        PlayingRole::Searcher => super::searcher(d),
        PlayingRole::None => ActionCommand::stand().combine_head(super::look_around(d)),
    };

    // the striker flags itself on the eyes so the bench can read the election
    if d.roles.role == PlayingRole::Striker {
        command.combine_right_led(LedCommand::Color {
            red: 1.0,
            green: 0.0,
            blue: 0.0,
        })
    } else {
        command
    }
}

/// FINISHED: stand down.
pub fn finished(_d: &DataSet) -> ActionCommand {
    ActionCommand::stand()
}

/// Penalty shootout: the striker kicks, the keeper guards the line, everyone else
/// stands.
pub fn penalty_shootout(d: &DataSet) -> ActionCommand {
    use crate::data::game_state::GameState;

    if d.game.game_state != GameState::Playing {
        return ActionCommand::stand().combine_head(super::track_ball(d));
    }

    if d.game.kicking_team {
        if d.penalty_striker_action.valid {
            return super::walk_to_ball_and_kick(
                d,
                d.penalty_striker_action.kick_pose,
                d.penalty_striker_action.kickable,
                d.penalty_striker_action.kick_type,
                d.penalty_striker_action.target,
            );
        }
        return ActionCommand::stand().combine_head(super::track_ball(d));
    }

    // defending: the penalty keeper covers the goal
    if d.keeper_action.valid {
        super::keeper(d)
    } else {
        ActionCommand::stand().combine_head(super::track_ball(d))
    }
}
