use nalgebra::Point2;

use crate::data::action_command::{InWalkKick, WalkMode};
use crate::data::striker::KickType;
use crate::data::ActionCommand;
use crate::math::ball_utils::Kickable;
use crate::math::Pose;

use super::super::DataSet;

/// Walks to a pose on the field, planning around obstacles, scanning on the way.
pub fn walk_to_pose(d: &DataSet, target: Pose) -> ActionCommand {
    // the target arrives in field coordinates; the walk wants it robot-relative
    let relative_target = Pose::new(
        d.robot.field_to_robot(target.position),
        crate::math::angle::normalize(target.orientation - d.robot.pose.orientation),
    );
    ActionCommand::walk(relative_target, WalkMode::PathPlanning)
        .combine_head(super::look_around(d))
}

/// Walks behind the ball onto the kick pose and kicks as soon as the ball is kickable.
///
/// The kick pose is robot-relative; close to it the approach switches from path
/// planning to walking straight so the planner cannot push us over the ball.
pub fn walk_to_ball_and_kick(
    d: &DataSet,
    kick_pose: Pose,
    kickable: Kickable,
    kick_type: KickType,
    rel_target: Point2<f32>,
) -> ActionCommand {
    match kickable {
        Kickable::Left | Kickable::Right => match kick_type {
            KickType::Forward => ActionCommand::kick(d.ball.position, rel_target, kick_type)
                .combine_head(super::track_ball(d)),
            _ => {
                // in-walk kicks are executed by the walk itself
                let mut command = ActionCommand::walk(kick_pose, WalkMode::Direct);
                if let crate::data::action_command::BodyCommand::Walk { in_walk_kick, .. } =
                    &mut command.body
                {
                    *in_walk_kick = match kick_type {
                        KickType::InWalkStrong => InWalkKick::Strong,
                        _ => InWalkKick::Gentle,
                    };
                }
                command.combine_head(super::track_ball(d))
            }
        },
        Kickable::Not => {
            let distance = kick_pose.position.coords.norm();
            let mode = if distance < 0.35 {
                WalkMode::Direct
            } else {
                WalkMode::PathPlanning
            };
            ActionCommand::walk(kick_pose, mode).combine_head(super::track_ball(d))
        }
    }
}

/// Turns on the spot and scans when the ball is lost and no searcher plan exists.
pub fn search_for_ball(d: &DataSet) -> ActionCommand {
    // turn towards where the team last believed the ball to be
    let turn = if d.world.ball_is_to_my_left { 0.5 } else { -0.5 };
    ActionCommand::walk_velocity(nalgebra::Vector2::zeros(), turn)
        .combine_head(super::look_around(d))
}
