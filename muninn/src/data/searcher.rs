use mimir::DataType;
use nalgebra::Point2;

use crate::math::Pose;

/// Where the searchers should look for the ball.
///
/// `suggested_positions` is this robot's proposal for every player; the team agrees by
/// adopting the proposal of the lowest-numbered active teammate (the "most wise player").
#[derive(Clone, Debug, Default)]
pub struct SearcherPosition {
    /// The pose this robot should walk to, when it is a searcher.
    pub pose: Pose,
    /// The field position this robot should point its head at.
    pub search_position: Point2<f32>,
    /// Whether `pose` and `search_position` are valid.
    pub valid: bool,
    /// Search positions this robot proposes for every player, index 0 is player 1.
    pub suggested_positions: Vec<Point2<f32>>,
    /// Which of the proposals are valid.
    pub suggestions_valid: Vec<bool>,
}

impl DataType for SearcherPosition {
    fn reset(&mut self) {
        self.valid = false;
        self.suggested_positions.clear();
        self.suggestions_valid.clear();
    }
}
