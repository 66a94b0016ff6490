use mimir::DataType;

/// Hysteretic boolean beliefs about where the ball and this robot are on the field.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorldState {
    pub ball_in_own_half: bool,
    pub ball_in_left_half: bool,
    pub ball_in_corner: bool,
    pub ball_in_penalty_area: bool,
    pub ball_in_center_circle: bool,
    pub ball_is_to_my_left: bool,
    pub robot_in_own_half: bool,
    pub robot_in_left_half: bool,
    /// Whether the ball may be played after kick-off (free after touch, leaving the
    /// center circle, or ten seconds).
    pub ball_is_free: bool,
    pub ball_valid: bool,
    pub robot_valid: bool,
}

impl DataType for WorldState {
    fn reset(&mut self) {
        self.ball_valid = false;
        self.robot_valid = false;
        self.ball_is_free = false;
    }
}
