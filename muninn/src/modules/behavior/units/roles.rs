use crate::data::action_command::{HeadCommand, KeeperMotion, WalkMode};
use crate::data::game_state::SetPlay;
use crate::data::striker::{KeeperActionType, SetPlayStrikerActionType, StrikerActionType};
use crate::data::ActionCommand;
use crate::math::Pose;

use super::super::DataSet;

/// The striker plays the ball according to the striker action; during set plays the
/// set-play variant takes precedence.
pub fn striker(d: &DataSet) -> ActionCommand {
    if d.game.set_play != SetPlay::None && d.set_play_striker_action.valid {
        let action = d.set_play_striker_action;
        return match action.action_type {
            SetPlayStrikerActionType::Walk => super::walk_to_pose(d, action.kick_pose),
            _ => super::walk_to_ball_and_kick(
                d,
                action.kick_pose,
                action.kickable,
                action.kick_type,
                d.robot.field_to_robot(action.target),
            ),
        };
    }

    if !d.striker_action.valid {
        return super::search_for_ball(d);
    }

    let action = d.striker_action;
    match action.action_type {
        StrikerActionType::WaitingForKeeper => {
            // the kick pose carries the waiting pose in field coordinates here
            super::walk_to_pose(d, action.kick_pose)
        }
        _ => super::walk_to_ball_and_kick(
            d,
            action.kick_pose,
            action.kickable,
            action.kick_type,
            d.robot.field_to_robot(action.target),
        ),
    }
}

/// The keeper holds its blocking pose and squats against fast incoming balls.
pub fn keeper(d: &DataSet) -> ActionCommand {
    if !d.keeper_action.valid {
        return ActionCommand::stand().combine_head(super::track_ball(d));
    }
    match d.keeper_action.action_type {
        KeeperActionType::Genuflect => {
            ActionCommand::keeper(KeeperMotion::Genuflect).combine_head(super::track_ball(d))
        }
        KeeperActionType::BlockGoal => {
            let pose = d.keeper_action.pose;
            if at_pose(d, &pose) {
                ActionCommand::stand().combine_head(super::track_ball(d))
            } else {
                super::walk_to_pose(d, pose).combine_head(super::track_ball(d))
            }
        }
    }
}

/// The replacement keeper behaves like the keeper without the squat.
pub fn replacement_keeper(d: &DataSet) -> ActionCommand {
    if !d.replacement_keeper_action.valid {
        return ActionCommand::stand().combine_head(super::track_ball(d));
    }
    let pose = d.replacement_keeper_action.pose;
    if at_pose(d, &pose) {
        ActionCommand::stand().combine_head(super::track_ball(d))
    } else {
        super::walk_to_pose(d, pose).combine_head(super::track_ball(d))
    }
}

/// The defender walks to its position on the defense ellipse.
pub fn defender(d: &DataSet) -> ActionCommand {
    if !d.defending_position.valid {
        return ActionCommand::stand().combine_head(super::active_vision(d));
    }
    walk_or_stand(d, d.defending_position.pose).combine_head(super::track_ball(d))
}

/// The bishop holds its forward pass-target position.
pub fn bishop(d: &DataSet) -> ActionCommand {
    if !d.bishop_position.valid {
        return ActionCommand::stand().combine_head(super::active_vision(d));
    }
    let pose = Pose::new(d.bishop_position.position, d.bishop_position.orientation);
    walk_or_stand(d, pose).combine_head(super::track_ball(d))
}

/// The support striker shadows the striker from behind.
pub fn support_striker(d: &DataSet) -> ActionCommand {
    if !d.supporting_position.valid {
        return ActionCommand::stand().combine_head(super::active_vision(d));
    }
    let pose = Pose::new(
        d.supporting_position.position,
        d.supporting_position.orientation,
    );
    walk_or_stand(d, pose).combine_head(super::track_ball(d))
}

/// The loser backs off from where the ball was lost, keeping it in view.
pub fn loser(d: &DataSet) -> ActionCommand {
    if !d.loser_position.valid {
        return super::search_for_ball(d);
    }
    walk_or_stand(d, d.loser_position.pose).combine_head(super::look_around(d))
}

/// The searcher follows the team search plan, pointing its head at the assigned cell.
pub fn searcher(d: &DataSet) -> ActionCommand {
    if !d.searcher_position.valid {
        return super::search_for_ball(d);
    }
    let look_at = d.robot.field_to_robot(d.searcher_position.search_position);
    walk_or_stand(d, d.searcher_position.pose).combine_head(HeadCommand::LookAt {
        target: look_at,
        yaw_velocity: 0.6,
        pitch_velocity: 0.6,
    })
}

/// Whether the robot has effectively reached a target pose.
fn at_pose(d: &DataSet, pose: &Pose) -> bool {
    (pose.position - d.robot.pose.position).norm() < 0.15
        && crate::math::angle::difference(pose.orientation, d.robot.pose.orientation) < 0.2
}

fn walk_or_stand(d: &DataSet, pose: Pose) -> ActionCommand {
    if at_pose(d, &pose) {
        ActionCommand::stand()
    } else {
        ActionCommand::walk(
            Pose::new(
                d.robot.field_to_robot(pose.position),
                crate::math::angle::normalize(pose.orientation - d.robot.pose.orientation),
            ),
            WalkMode::PathPlanning,
        )
    }
}
