use mimir::DataType;
use nalgebra::Point2;

use crate::math::ball_utils::Kickable;
use crate::math::Pose;

/// What the striker wants to do with the ball.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrikerActionType {
    /// Kick the ball into the goal.
    KickIntoGoal,
    /// Dribble the ball into the goal.
    DribbleIntoGoal,
    /// Pass the ball to a teammate.
    Pass,
    /// Dribble the ball to a better position.
    #[default]
    Dribble,
    /// Wait while the keeper plays the ball.
    WaitingForKeeper,
}

/// How the ball should be kicked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KickType {
    /// The strong forward kick motion.
    Forward,
    /// The gentle in-walk kick.
    #[default]
    InWalkGentle,
    /// The strong in-walk kick.
    InWalkStrong,
    /// Do not kick.
    None,
}

/// The striker's decision of this tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrikerAction {
    pub valid: bool,
    pub action_type: StrikerActionType,
    /// The player number of the pass target, 0 if none.
    pub pass_target: u8,
    /// Where the ball should end up, field coordinates.
    pub target: Point2<f32>,
    pub kick_type: KickType,
    /// The robot-relative pose from which to kick.
    pub kick_pose: Pose,
    /// Whether the ball is positioned for an immediate kick, and with which foot.
    pub kickable: Kickable,
}

impl DataType for StrikerAction {
    fn reset(&mut self) {
        self.valid = false;
    }
}

/// What the keeper should do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeeperActionType {
    /// Stand on the blocking position.
    #[default]
    BlockGoal,
    /// Squat to cover the goal against a fast incoming ball.
    Genuflect,
}

/// The keeper's decision of this tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeeperAction {
    pub valid: bool,
    pub action_type: KeeperActionType,
    /// The blocking pose, field coordinates.
    pub pose: Pose,
    /// Whether the keeper wants to leave the goal and play the ball itself.
    pub wants_to_play_ball: bool,
}

impl DataType for KeeperAction {
    fn reset(&mut self) {
        self.valid = false;
    }
}

/// The replacement keeper's decision of this tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReplacementKeeperAction {
    pub valid: bool,
    pub action_type: KeeperActionType,
    pub pose: Pose,
}

impl DataType for ReplacementKeeperAction {
    fn reset(&mut self) {
        self.valid = false;
    }
}

/// The penalty striker's decision, only valid during penalty shootouts and penalty kicks.
#[derive(Clone, Copy, Debug, Default)]
pub struct PenaltyStrikerAction {
    pub valid: bool,
    /// Where to shoot, robot-relative.
    pub target: Point2<f32>,
    pub kick_type: KickType,
    pub kick_pose: Pose,
    pub kickable: Kickable,
}

impl DataType for PenaltyStrikerAction {
    fn reset(&mut self) {
        self.valid = false;
    }
}

/// What the striker does during set plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SetPlayStrikerActionType {
    /// Kick the free kick towards the target.
    Kick,
    /// Dribble towards the target.
    #[default]
    Dribble,
    /// Walk to a blocking pose (enemy free kick).
    Walk,
}

/// The set-play striker's decision of this tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetPlayStrikerAction {
    pub valid: bool,
    pub action_type: SetPlayStrikerActionType,
    /// Where the ball should end up, field coordinates.
    pub target: Point2<f32>,
    pub kick_type: KickType,
    /// The walk or kick pose. Robot-relative for kicks, field coordinates for walking.
    pub kick_pose: Pose,
    pub kickable: Kickable,
}

impl DataType for SetPlayStrikerAction {
    fn reset(&mut self) {
        self.valid = false;
    }
}
