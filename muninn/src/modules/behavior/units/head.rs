use nalgebra::Point2;

use crate::data::action_command::HeadCommand;
use crate::data::BallType;

use super::super::DataSet;

/// Sweep period of the idle look-around, milliseconds.
const LOOK_AROUND_PERIOD_MS: u32 = 4000;

/// Maximum yaw of the idle look-around, radians.
const LOOK_AROUND_YAW: f32 = 0.8;

/// Slowly sweeps the head left and right to scan the surroundings.
pub fn look_around(d: &DataSet) -> HeadCommand {
    // triangle wave over the sweep period
    let phase = d.clock.millis(d.cycle.start_time) % LOOK_AROUND_PERIOD_MS;
    let normalized = phase as f32 / LOOK_AROUND_PERIOD_MS as f32;
    let triangle = if normalized < 0.5 {
        4.0 * normalized - 1.0
    } else {
        3.0 - 4.0 * normalized
    };

    HeadCommand::Angles {
        yaw: triangle * LOOK_AROUND_YAW,
        pitch: 0.25,
        yaw_velocity: 0.6,
        pitch_velocity: 0.6,
    }
}

/// Tracks the most trustworthy ball: the own sighting when present, the team belief
/// otherwise.
pub fn track_ball(d: &DataSet) -> HeadCommand {
    let target = if d.ball.found {
        d.ball.position
    } else if d.team_ball.ball_type != BallType::None {
        d.team_ball.rel_position
    } else {
        return look_around(d);
    };

    HeadCommand::LookAt {
        target,
        yaw_velocity: 0.8,
        pitch_velocity: 0.8,
    }
}

/// Looks at the most valuable point of interest, weighted by importance.
pub fn active_vision(d: &DataSet) -> HeadCommand {
    if !d.points_of_interest.valid {
        return look_around(d);
    }
    let best = d
        .points_of_interest
        .points
        .iter()
        .max_by(|a, b| a.weight.total_cmp(&b.weight));
    let Some(best) = best else {
        return look_around(d);
    };

    let relative: Point2<f32> = d.robot.field_to_robot(best.position);
    HeadCommand::LookAt {
        target: relative,
        yaw_velocity: 0.5,
        pitch_velocity: 0.5,
    }
}
