use std::time::Duration;

use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::TimeToReachBallConfig;
use crate::data::game_state::{GamePhase, GameState, Penalty};
use crate::data::{
    BallType, BodyPose, GameControllerState, RobotPosition, StrikerAction, TeamBallModel,
    TimeToReachBall,
};
use crate::math::{angle, Pose};

const TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// Estimates how long this robot needs to reach the ball and be ready to kick it towards
/// the striker target. The estimate is the striker election bid of this robot.
pub struct TimeToReachBallProvider {
    config: TimeToReachBallConfig,
}

impl TimeToReachBallProvider {
    #[must_use]
    pub fn new(config: TimeToReachBallConfig) -> Self {
        Self { config }
    }
}

/// The components of the estimate, reused for the strike-own-ball comparison with a
/// shared velocity profile.
pub fn estimate_time_to_reach_ball(
    config: &TimeToReachBallConfig,
    pose: &Pose,
    ball_position: Point2<f32>,
    target: Point2<f32>,
    fallen: bool,
    ball_seen: bool,
) -> Duration {
    let rel_ball = ball_position - pose.position;
    let walk_time = rel_ball.norm() / config.translation_velocity;

    let ball_orientation = rel_ball.y.atan2(rel_ball.x);
    let rotate_time =
        angle::difference(ball_orientation, pose.orientation) / (config.rotation_velocity * TO_RAD);

    let ball_to_target = target - ball_position;
    let ball_to_target_orientation = ball_to_target.y.atan2(ball_to_target.x);
    let walk_around_ball_time = angle::difference(ball_to_target_orientation, ball_orientation)
        / (config.walk_around_ball_velocity * TO_RAD);

    let fallen_penalty = if fallen { config.fallen_penalty } else { 0.0 };
    let not_seen_penalty = if ball_seen {
        0.0
    } else {
        config.ball_not_seen_penalty
    };

    Duration::from_secs_f32(
        walk_time + rotate_time + walk_around_ball_time + fallen_penalty + not_seen_penalty,
    )
}

impl Module for TimeToReachBallProvider {
    fn name(&self) -> &'static str {
        "time_to_reach_ball_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BodyPose>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<StrikerAction>(),
            SlotInfo::of::<TeamBallModel>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<TimeToReachBall>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<TimeToReachBall>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let body_pose = database.get::<BodyPose>()?;
        let game = database.get::<GameControllerState>()?;
        let robot = database.get::<RobotPosition>()?;
        let striker_action = database.get::<StrikerAction>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let mut time_to_reach_ball = database.get_mut::<TimeToReachBall>()?;

        let in_active_state = matches!(
            game.game_state,
            GameState::Playing | GameState::Ready | GameState::Set
        );
        if !in_active_state
            || game.penalty != Penalty::None
            || game.game_phase != GamePhase::Normal
            || team_ball.ball_type == BallType::None
            || !striker_action.valid
        {
            return Ok(());
        }

        let estimate = estimate_time_to_reach_ball(
            &self.config,
            &robot.pose,
            team_ball.position,
            striker_action.target,
            body_pose.fallen,
            team_ball.ball_type == BallType::Self_,
        );
        // the ball-not-seen penalty is part of the plain bid but not of the bonus track
        let ball_seen = team_ball.ball_type == BallType::Self_;
        let without_not_seen_penalty = if ball_seen {
            estimate
        } else {
            estimate.saturating_sub(Duration::from_secs_f32(self.config.ball_not_seen_penalty))
        };

        time_to_reach_ball.time_to_reach_ball = estimate;
        // the bonus track is floored at zero so a stale striker cannot bid negative time
        time_to_reach_ball.time_to_reach_ball_striker = without_not_seen_penalty
            .saturating_sub(Duration::from_secs_f32(self.config.striker_bonus));
        time_to_reach_ball.valid = true;

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
    fn straight_walk_dominates_the_estimate() {
        let config = TimeToReachBallConfig::default();
        let pose = Pose::default();

        let estimate = estimate_time_to_reach_ball(
            &config,
            &pose,
            Point2::new(1.8, 0.0),
            Point2::new(4.5, 0.0),
            false,
            true,
        );

        // 1.8 m at 0.18 m/s, no rotation, no walk-around, no penalties
        assert_eq!(estimate.as_secs(), 10);
    }

    #[test]
    fn fallen_robots_bid_later() {
        let config = TimeToReachBallConfig::default();
        let pose = Pose::default();
        let ball = Point2::new(1.8, 0.0);
        let target = Point2::new(4.5, 0.0);

        let upright = estimate_time_to_reach_ball(&config, &pose, ball, target, false, true);
        let fallen = estimate_time_to_reach_ball(&config, &pose, ball, target, true, true);

        assert_eq!(
            (fallen - upright).as_secs_f32().round() as u32,
            config.fallen_penalty as u32
        );
    }

    #[test]
    fn striker_track_is_floored_at_zero() {
        let config = TimeToReachBallConfig::default();
        let pose = Pose::default();

        // the ball right in front of the robot: the raw estimate is below the bonus
        let estimate = estimate_time_to_reach_ball(
            &config,
            &pose,
            Point2::new(0.2, 0.0),
            Point2::new(4.5, 0.0),
            false,
            true,
        );
        let bonus = Duration::from_secs_f32(config.striker_bonus);
        assert_eq!(estimate.saturating_sub(bonus), Duration::ZERO);
    }
}
