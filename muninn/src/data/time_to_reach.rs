use std::time::Duration;

use mimir::DataType;

/// This robot's time-to-reach-ball bids for the striker election.
#[derive(Clone, Copy, Debug)]
pub struct TimeToReachBall {
    /// The estimated time this robot needs to reach the ball and be ready to kick.
    pub time_to_reach_ball: Duration,
    /// The same estimate on the striker bonus track: the current striker bids with a
    /// bonus subtracted so the striker role does not oscillate between robots.
    pub time_to_reach_ball_striker: Duration,
    pub valid: bool,
}

impl Default for TimeToReachBall {
    fn default() -> Self {
        Self {
            time_to_reach_ball: Duration::MAX,
            time_to_reach_ball_striker: Duration::MAX,
            valid: false,
        }
    }
}

impl DataType for TimeToReachBall {
    fn reset(&mut self) {
        self.valid = false;
    }
}
