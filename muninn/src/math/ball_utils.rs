//! Kick geometry: where to stand to kick the ball towards a target, and whether the ball
//! is currently positioned for an immediate kick.

use std::time::Duration;

use nalgebra::{Point2, Vector2};

use crate::math::{angle, Pose};

/// Whether and with which foot the ball is immediately kickable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Kickable {
    /// Ball is kickable with the left foot.
    Left,
    /// Ball is kickable with the right foot.
    Right,
    /// Ball is not kickable at the moment.
    #[default]
    Not,
}

/// Half the stance width: the lateral offset of one foot from the robot origin.
const FOOT_OFFSET: f32 = 0.05;

/// A ball older than this is not trusted for an immediate kick.
const KICKABLE_BALL_AGE_MAX: Duration = Duration::from_millis(300);

/// Calculates the robot-relative pose from which the ball can be kicked to the target.
///
/// The robot stands `distance_to_ball` behind the ball on the ball→target line, shifted
/// sideways so the kicking foot lines up with the ball. The foot is chosen by the side of
/// the ball relative to that line and kept sticky through `last_sign` (+1 left, -1 right):
/// the sign only flips when the ball is clearly (> 5 cm) on the other side, and never
/// when `force_sign` is set.
pub fn kick_pose(
    ball_source: Point2<f32>,
    ball_target: Point2<f32>,
    distance_to_ball: f32,
    last_sign: &mut i32,
    force_sign: bool,
) -> Pose {
    let source_to_target = ball_target - ball_source;
    let direction = source_to_target.normalize();

    let behind_ball = -direction * distance_to_ball;

    let side_distance =
        (ball_target.x * ball_source.y - ball_target.y * ball_source.x) / source_to_target.norm();
    if !force_sign && side_distance.abs() > FOOT_OFFSET {
        *last_sign = if side_distance > 0.0 { 1 } else { -1 };
    }

    let along = direction * FOOT_OFFSET;
    let foot_select = Vector2::new(*last_sign as f32 * along.y, -*last_sign as f32 * along.x);

    Pose::new(
        ball_source + behind_ball + foot_select,
        source_to_target.y.atan2(source_to_target.x),
    )
}

/// Determines whether and with which foot the ball is kickable right now.
///
/// The ball must be fresh, sitting next to one foot (within 1 cm laterally and of the
/// desired kick distance), and the kick pose must already point at the target.
#[must_use]
pub fn kickable(
    kick_pose: &Pose,
    ball_position: Point2<f32>,
    ball_found: bool,
    ball_age: Duration,
    distance_to_ball: f32,
    angle_to_ball: f32,
) -> Kickable {
    if !ball_found || ball_age >= KICKABLE_BALL_AGE_MAX {
        return Kickable::Not;
    }

    let near_right = (ball_position.y + FOOT_OFFSET).abs() < 0.01
        && (ball_position.x - distance_to_ball).abs() < 0.01;
    let near_left = (ball_position.y - FOOT_OFFSET).abs() < 0.01
        && (ball_position.x - distance_to_ball).abs() < 0.01;
    // zero because the x axis faces forward relative to the robot
    let correct_direction = angle::difference(0.0, kick_pose.orientation) < angle_to_ball;

    if near_left && correct_direction {
        Kickable::Left
    } else if near_right && correct_direction {
        Kickable::Right
    } else {
        Kickable::Not
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stands_behind_the_ball_facing_the_target() {
        let mut sign = 1;
        let pose = kick_pose(
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            0.2,
            &mut sign,
            false,
        );

        assert_relative_eq!(pose.orientation, 0.0);
        assert_relative_eq!(pose.position.x, 0.8, epsilon = 1e-6);
        // left foot selected: robot shifted right so the foot lines up with the ball
        assert_relative_eq!(pose.position.y, -FOOT_OFFSET, epsilon = 1e-6);
    }

    #[test]
    fn foot_sign_flips_only_outside_the_dead_zone() {
        let mut sign = 1;
        // ball well right of the target line flips to the right foot
        kick_pose(
            Point2::new(1.0, -0.3),
            Point2::new(3.0, 0.0),
            0.2,
            &mut sign,
            false,
        );
        assert_eq!(sign, -1);

        // ball barely off the line keeps the previous foot
        kick_pose(
            Point2::new(1.0, 0.02),
            Point2::new(3.0, 0.0),
            0.2,
            &mut sign,
            false,
        );
        assert_eq!(sign, -1);
    }

    #[test]
    fn forced_sign_never_changes() {
        let mut sign = 1;
        kick_pose(
            Point2::new(1.0, -0.5),
            Point2::new(3.0, 0.0),
            0.2,
            &mut sign,
            true,
        );
        assert_eq!(sign, 1);
    }

    #[test]
    fn kickable_with_the_left_foot() {
        let pose = Pose::new(Point2::new(-0.2, -0.05), 0.0);
        let result = kickable(
            &pose,
            Point2::new(0.2, FOOT_OFFSET),
            true,
            Duration::from_millis(100),
            0.2,
            0.1,
        );
        assert_eq!(result, Kickable::Left);
    }

    #[test]
    fn stale_ball_is_not_kickable() {
        let pose = Pose::new(Point2::new(-0.2, -0.05), 0.0);
        let result = kickable(
            &pose,
            Point2::new(0.2, FOOT_OFFSET),
            true,
            Duration::from_millis(400),
            0.2,
            0.1,
        );
        assert_eq!(result, Kickable::Not);
    }
}
