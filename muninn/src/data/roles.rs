use mimir::DataType;

pub use gjallarhorn::team_message::WireRole;

/// The role a robot plays in the team.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayingRole {
    #[default]
    None,
    Keeper,
    Defender,
    SupportStriker,
    Striker,
    Bishop,
    ReplacementKeeper,
    Loser,
    Searcher,
}

impl From<PlayingRole> for WireRole {
    fn from(role: PlayingRole) -> Self {
        match role {
            PlayingRole::None => WireRole::None,
            PlayingRole::Keeper => WireRole::Keeper,
            PlayingRole::Defender => WireRole::Defender,
            PlayingRole::SupportStriker => WireRole::SupportStriker,
            PlayingRole::Striker => WireRole::Striker,
            PlayingRole::Bishop => WireRole::Bishop,
            PlayingRole::ReplacementKeeper => WireRole::ReplacementKeeper,
            PlayingRole::Loser => WireRole::Loser,
            PlayingRole::Searcher => WireRole::Searcher,
        }
    }
}

impl From<WireRole> for PlayingRole {
    fn from(role: WireRole) -> Self {
        match role {
            WireRole::None => PlayingRole::None,
            WireRole::Keeper => PlayingRole::Keeper,
            WireRole::Defender => PlayingRole::Defender,
            WireRole::SupportStriker => PlayingRole::SupportStriker,
            WireRole::Striker => PlayingRole::Striker,
            WireRole::Bishop => PlayingRole::Bishop,
            WireRole::ReplacementKeeper => PlayingRole::ReplacementKeeper,
            WireRole::Loser => PlayingRole::Loser,
            WireRole::Searcher => PlayingRole::Searcher,
        }
    }
}

/// The team role election result of this tick.
#[derive(Clone, Debug, Default)]
pub struct PlayingRoles {
    /// The role this robot performs.
    pub role: PlayingRole,
    /// The roles of all players as elected by this robot, index 0 is player 1.
    pub player_roles: Vec<PlayingRole>,
}

impl DataType for PlayingRoles {}

impl PlayingRoles {
    /// The role assigned to the given player (1-based), `None` if out of range.
    #[must_use]
    pub fn role_of(&self, player_number: u8) -> PlayingRole {
        if player_number == 0 {
            return PlayingRole::None;
        }
        self.player_roles
            .get(usize::from(player_number) - 1)
            .copied()
            .unwrap_or(PlayingRole::None)
    }
}
