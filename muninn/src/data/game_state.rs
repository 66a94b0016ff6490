use std::time::{Duration, Instant};

use mimir::DataType;

pub use gjallarhorn::game_controller::{GamePhase, GameState, Penalty, SetPlay, TeamColor};

/// The merged referee belief: the last well-formed GameController datagram combined with
/// button-press events on the robot.
#[derive(Clone, Debug)]
pub struct GameControllerState {
    /// Primary game state.
    pub game_state: GameState,
    /// When the primary game state last changed.
    pub game_state_changed: Instant,
    /// Game phase (normal, penalty shootout, ...).
    pub game_phase: GamePhase,
    /// Active set play.
    pub set_play: SetPlay,
    /// When the set play last changed.
    pub set_play_changed: Instant,
    /// Whether the own team is the kicking team of the current set play or kick-off.
    pub kicking_team: bool,
    /// Whether the own team has kick-off.
    pub kickoff: bool,
    /// The penalty of this robot.
    pub penalty: Penalty,
    /// The penalties of all players in the own team, index 0 is player 1.
    pub penalties: Vec<Penalty>,
    /// Number of players per team as announced by the referee.
    pub players_per_team: u8,
    /// Whether the game is in the first half.
    pub first_half: bool,
    /// The own jersey color.
    pub team_color: TeamColor,
    /// Seconds shown as secondary time (remaining ready time, time until free ball, ...).
    pub secondary_time: Duration,
    /// Seconds remaining in the half.
    pub remaining_time: Duration,
    /// When the last referee datagram arrived, `None` while running on button fallback.
    pub last_message_received: Option<Instant>,
}

impl Default for GameControllerState {
    fn default() -> Self {
        Self {
            game_state: GameState::Initial,
            game_state_changed: Instant::now(),
            game_phase: GamePhase::Normal,
            set_play: SetPlay::None,
            set_play_changed: Instant::now(),
            kicking_team: false,
            kickoff: false,
            penalty: Penalty::None,
            penalties: Vec::new(),
            players_per_team: 5,
            first_half: true,
            team_color: TeamColor::Black,
            secondary_time: Duration::ZERO,
            remaining_time: Duration::ZERO,
            last_message_received: None,
        }
    }
}

impl DataType for GameControllerState {
    fn reset(&mut self) {
        // overwritten wholesale by the game controller client each tick
    }
}

impl GameControllerState {
    /// Whether the given player (1-based) is penalized.
    #[must_use]
    pub fn is_player_penalized(&self, player_number: u8) -> bool {
        player_number >= 1
            && self
                .penalties
                .get(usize::from(player_number) - 1)
                .is_some_and(|penalty| *penalty != Penalty::None)
    }
}
