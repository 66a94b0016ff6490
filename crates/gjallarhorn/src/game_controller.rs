//! The referee datagram layouts, matching `RoboCupGameControlData.h` from the official
//! GameController distribution.
//!
//! The GameController broadcasts [`GameControllerMessage`]s to the robots; robots answer
//! with [`GameControllerReturnMessage`]s to the sender so they show up in the referee UI
//! and can signal manual (un)penalisation.

use std::io::{Read, Write};

use crate::serialization::{Decode, Encode};
use crate::{Error, Result};

/// The port from which the GameController sends [`GameControllerMessage`]s to the robots.
pub const GAME_CONTROLLER_DATA_PORT: u16 = 3838;

/// The port on which the robots send [`GameControllerReturnMessage`]s back.
pub const GAME_CONTROLLER_RETURN_PORT: u16 = 3939;

/// The header of the data sent by the GameController.
pub const GAME_CONTROLLER_STRUCT_HEADER: [u8; 4] = *b"RGme";

/// The version of the data sent by the GameController.
pub const GAME_CONTROLLER_STRUCT_VERSION: u8 = 15;

/// The header of the data sent by the robots.
pub const GAME_CONTROLLER_RETURN_STRUCT_HEADER: [u8; 4] = *b"RGrt";

/// The version of the data sent by the robots.
pub const GAME_CONTROLLER_RETURN_STRUCT_VERSION: u8 = 4;

/// The maximum number of players per team the wire format can carry.
pub const MAX_NUM_PLAYERS: u8 = 20;

/// Implements [`Encode`] and [`Decode`] for a fieldless `#[repr(u8)]` enum, rejecting
/// unknown discriminants instead of wrapping them.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        impl Encode for $name {
            fn encode(&self, mut write: impl Write) -> Result<()> {
                (*self as u8).encode(&mut write)
            }

            fn encoded_len(&self) -> usize {
                1
            }
        }

        impl Decode for $name {
            fn decode(mut read: impl Read) -> Result<Self> {
                match u8::decode(&mut read)? {
                    $($value => Ok($name::$variant),)+
                    value => Err(Error::InvalidDiscriminant {
                        type_name: stringify!($name),
                        value,
                    }),
                }
            }
        }
    };
}

/// Enum for each half of the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Half {
    /// First half of the match.
    #[default]
    First = 1,
    /// Second half of the match.
    Second = 0,
}

wire_enum!(Half { First = 1, Second = 0 });

/// Enum for the jersey colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum TeamColor {
    #[default]
    Blue = 0,
    Red = 1,
    Yellow = 2,
    Black = 3,
    White = 4,
    Green = 5,
    Orange = 6,
    Purple = 7,
    Brown = 8,
    Gray = 9,
}

wire_enum!(TeamColor {
    Blue = 0,
    Red = 1,
    Yellow = 2,
    Black = 3,
    White = 4,
    Green = 5,
    Orange = 6,
    Purple = 7,
    Brown = 8,
    Gray = 9,
});

/// Enum for the competition phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum CompetitionPhase {
    /// Round-robin phase of the competition.
    #[default]
    RoundRobin = 0,
    /// Playoff phase of the competition.
    PlayOff = 1,
}

wire_enum!(CompetitionPhase {
    RoundRobin = 0,
    PlayOff = 1,
});

/// Enum for the competition types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum CompetitionType {
    /// Normal game mode.
    #[default]
    Normal = 0,
    /// Challenge game mode.
    Challenge = 1,
}

wire_enum!(CompetitionType {
    Normal = 0,
    Challenge = 1,
});

/// Enum for the game phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum GamePhase {
    /// Normal game phase.
    #[default]
    Normal = 0,
    /// Penalty shootout game phase.
    PenaltyShoot = 1,
    /// Overtime game phase.
    Overtime = 2,
    /// Timeout game phase.
    Timeout = 3,
}

wire_enum!(GamePhase {
    Normal = 0,
    PenaltyShoot = 1,
    Overtime = 2,
    Timeout = 3,
});

/// Enum for the primary game states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum GameState {
    /// Initial game state.
    #[default]
    Initial = 0,
    /// Ready game state.
    Ready = 1,
    /// Set game state.
    Set = 2,
    /// Playing game state.
    Playing = 3,
    /// Finished game state.
    Finished = 4,
}

wire_enum!(GameState {
    Initial = 0,
    Ready = 1,
    Set = 2,
    Playing = 3,
    Finished = 4,
});

/// Enum for the set plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum SetPlay {
    /// No set play.
    #[default]
    None = 0,
    /// Goal kick set play.
    GoalKick = 1,
    /// Pushing free kick set play.
    PushingFreeKick = 2,
    /// Corner kick set play.
    CornerKick = 3,
    /// Kick in set play.
    KickIn = 4,
    /// Penalty kick set play.
    PenaltyKick = 5,
}

wire_enum!(SetPlay {
    None = 0,
    GoalKick = 1,
    PushingFreeKick = 2,
    CornerKick = 3,
    KickIn = 4,
    PenaltyKick = 5,
});

/// Enum for the penalty states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Penalty {
    /// No penalty.
    #[default]
    None = 0,
    /// Ball holding / playing with hands.
    IllegalBallContact = 1,
    /// Pushing an opponent.
    PlayerPushing = 2,
    /// Moved before the whistle.
    IllegalMotionInSet = 3,
    /// Fallen or inactive for too long.
    InactivePlayer = 4,
    /// Illegal position.
    IllegalPosition = 5,
    /// Left the field.
    LeavingTheField = 6,
    /// Requested for pickup.
    RequestForPickup = 7,
    /// Not moving while the game is.
    LocalGameStuck = 8,
    /// Illegal position in set.
    IllegalPositionInSet = 9,
    /// Penalty for a substitute player.
    Substitute = 14,
    /// Penalty set by hand in the referee UI.
    Manual = 15,
}

wire_enum!(Penalty {
    None = 0,
    IllegalBallContact = 1,
    PlayerPushing = 2,
    IllegalMotionInSet = 3,
    InactivePlayer = 4,
    IllegalPosition = 5,
    LeavingTheField = 6,
    RequestForPickup = 7,
    LocalGameStuck = 8,
    IllegalPositionInSet = 9,
    Substitute = 14,
    Manual = 15,
});

/// The state of one player as the referee sees it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RobotInfo {
    /// Penalty state of the player.
    pub penalty: Penalty,
    /// Estimate of seconds till the player is unpenalised.
    pub secs_till_unpenalised: u8,
}

impl RobotInfo {
    #[must_use]
    pub fn is_penalized(&self) -> bool {
        self.penalty != Penalty::None
    }
}

impl Encode for RobotInfo {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        self.penalty.encode(&mut write)?;
        self.secs_till_unpenalised.encode(&mut write)
    }

    fn encoded_len(&self) -> usize {
        2
    }
}

impl Decode for RobotInfo {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(Self {
            penalty: Penalty::decode(&mut read)?,
            secs_till_unpenalised: u8::decode(&mut read)?,
        })
    }
}

/// The referee view of one team.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeamInfo {
    /// Unique team number.
    pub team_number: u8,
    /// Jersey colour of the field players.
    pub field_color: TeamColor,
    /// The team's score.
    pub score: u8,
    /// Penalty shot counter.
    pub penalty_shot: u8,
    /// Bits represent penalty shot success.
    pub single_shots: u16,
    /// Number of team messages the team may still send this game.
    pub message_budget: u16,
    /// The team's players, index 0 is player 1.
    pub players: [RobotInfo; MAX_NUM_PLAYERS as usize],
}

impl Default for TeamInfo {
    fn default() -> Self {
        Self {
            team_number: 0,
            field_color: TeamColor::default(),
            score: 0,
            penalty_shot: 0,
            single_shots: 0,
            message_budget: 0,
            players: [RobotInfo::default(); MAX_NUM_PLAYERS as usize],
        }
    }
}

impl TeamInfo {
    /// Whether the given player (1-based) is currently penalized.
    #[must_use]
    pub fn is_penalized(&self, player_number: u8) -> bool {
        player_number >= 1
            && self
                .players
                .get(usize::from(player_number) - 1)
                .is_some_and(RobotInfo::is_penalized)
    }
}

impl Encode for TeamInfo {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        self.team_number.encode(&mut write)?;
        self.field_color.encode(&mut write)?;
        self.score.encode(&mut write)?;
        self.penalty_shot.encode(&mut write)?;
        self.single_shots.encode(&mut write)?;
        self.message_budget.encode(&mut write)?;
        self.players.encode(&mut write)
    }

    fn encoded_len(&self) -> usize {
        8 + self.players.encoded_len()
    }
}

impl Decode for TeamInfo {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(Self {
            team_number: u8::decode(&mut read)?,
            field_color: TeamColor::decode(&mut read)?,
            score: u8::decode(&mut read)?,
            penalty_shot: u8::decode(&mut read)?,
            single_shots: u16::decode(&mut read)?,
            message_budget: u16::decode(&mut read)?,
            players: <[RobotInfo; MAX_NUM_PLAYERS as usize]>::decode(&mut read)?,
        })
    }
}

/// The `RoboCupGameControlData` broadcast received by the robots.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GameControllerMessage {
    /// Header to identify the structure.
    pub header: [u8; 4],
    /// Version of the game-controller protocol.
    pub version: u8,
    /// Number incremented with each packet sent (with wraparound).
    pub packet_number: u8,
    /// The number of players on a team.
    pub players_per_team: u8,
    /// Phase of the competition.
    pub competition_phase: CompetitionPhase,
    /// Type of the competition.
    pub competition_type: CompetitionType,
    /// Phase of the game.
    pub game_phase: GamePhase,
    /// State of the game.
    pub state: GameState,
    /// Active set play.
    pub set_play: SetPlay,
    /// Whether the game is in the first half.
    pub first_half: Half,
    /// The team number of the next team to kick off or free kick.
    pub kicking_team: u8,
    /// Estimate of number of seconds remaining in the half.
    pub secs_remaining: i16,
    /// Number of seconds shown as secondary time (remaining ready, until free ball, etc).
    pub secondary_time: i16,
    /// Info about the two teams.
    pub teams: [TeamInfo; 2],
}

impl GameControllerMessage {
    /// Checks the magic header, protocol version and player bound.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.header == GAME_CONTROLLER_STRUCT_HEADER
            && self.version == GAME_CONTROLLER_STRUCT_VERSION
            && self.players_per_team <= MAX_NUM_PLAYERS
    }

    /// Finds the [`TeamInfo`] for the given team number.
    #[must_use]
    pub fn team(&self, team_number: u8) -> Option<&TeamInfo> {
        self.teams
            .iter()
            .find(|team| team.team_number == team_number)
    }
}

impl Encode for GameControllerMessage {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        self.header.encode(&mut write)?;
        self.version.encode(&mut write)?;
        self.packet_number.encode(&mut write)?;
        self.players_per_team.encode(&mut write)?;
        self.competition_phase.encode(&mut write)?;
        self.competition_type.encode(&mut write)?;
        self.game_phase.encode(&mut write)?;
        self.state.encode(&mut write)?;
        self.set_play.encode(&mut write)?;
        self.first_half.encode(&mut write)?;
        self.kicking_team.encode(&mut write)?;
        self.secs_remaining.encode(&mut write)?;
        self.secondary_time.encode(&mut write)?;
        self.teams.encode(&mut write)
    }

    fn encoded_len(&self) -> usize {
        18 + self.teams.encoded_len()
    }
}

impl Decode for GameControllerMessage {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(Self {
            header: <[u8; 4]>::decode(&mut read)?,
            version: u8::decode(&mut read)?,
            packet_number: u8::decode(&mut read)?,
            players_per_team: u8::decode(&mut read)?,
            competition_phase: CompetitionPhase::decode(&mut read)?,
            competition_type: CompetitionType::decode(&mut read)?,
            game_phase: GamePhase::decode(&mut read)?,
            state: GameState::decode(&mut read)?,
            set_play: SetPlay::decode(&mut read)?,
            first_half: Half::decode(&mut read)?,
            kicking_team: u8::decode(&mut read)?,
            secs_remaining: i16::decode(&mut read)?,
            secondary_time: i16::decode(&mut read)?,
            teams: <[TeamInfo; 2]>::decode(&mut read)?,
        })
    }
}

/// Status a robot reports back to the referee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum ReturnStatus {
    /// The robot is alive and playing.
    #[default]
    Alive = 0,
    /// The robot was penalised by hand (chest button).
    ManuallyPenalised = 1,
    /// The robot was unpenalised by hand (chest button).
    ManuallyUnpenalised = 2,
}

wire_enum!(ReturnStatus {
    Alive = 0,
    ManuallyPenalised = 1,
    ManuallyUnpenalised = 2,
});

/// The `RoboCupGameControlReturnData` sent by the robots to the GameController.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameControllerReturnMessage {
    /// "RGrt".
    pub header: [u8; 4],
    /// Has to be set to [`GAME_CONTROLLER_RETURN_STRUCT_VERSION`].
    pub version: u8,
    /// Player number, starts with 1.
    pub player_num: u8,
    /// Team number.
    pub team_num: u8,
    /// Status report, e.g. a manual (un)penalisation by button.
    pub status: ReturnStatus,
    /// 1 means that the robot is fallen, 0 means that the robot can play.
    pub fallen: u8,
    /// Position and orientation of the robot.
    ///
    /// Coordinates in millimeters, (0, 0) in the center of the field, the +x axis points
    /// towards the opponent goal, angle in radians counter-clockwise from +x.
    pub pose: [f32; 3],
    /// Seconds since this robot last saw the ball, -1 if it has not seen it.
    pub ball_age: f32,
    /// Position of the ball relative to the robot, in millimeters.
    pub ball: [f32; 2],
}

impl GameControllerReturnMessage {
    /// Constructs a return message with the fixed header and version filled in.
    #[must_use]
    pub fn new(
        player_num: u8,
        team_num: u8,
        status: ReturnStatus,
        fallen: bool,
        pose: [f32; 3],
        ball_age: f32,
        ball: [f32; 2],
    ) -> Self {
        Self {
            header: GAME_CONTROLLER_RETURN_STRUCT_HEADER,
            version: GAME_CONTROLLER_RETURN_STRUCT_VERSION,
            player_num,
            team_num,
            status,
            fallen: u8::from(fallen),
            pose,
            ball_age,
            ball,
        }
    }
}

impl Encode for GameControllerReturnMessage {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        self.header.encode(&mut write)?;
        self.version.encode(&mut write)?;
        self.player_num.encode(&mut write)?;
        self.team_num.encode(&mut write)?;
        self.status.encode(&mut write)?;
        self.fallen.encode(&mut write)?;
        self.pose.encode(&mut write)?;
        self.ball_age.encode(&mut write)?;
        self.ball.encode(&mut write)
    }

    fn encoded_len(&self) -> usize {
        9 + self.pose.encoded_len() + 4 + self.ball.encoded_len()
    }
}

impl Decode for GameControllerReturnMessage {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(Self {
            header: <[u8; 4]>::decode(&mut read)?,
            version: u8::decode(&mut read)?,
            player_num: u8::decode(&mut read)?,
            team_num: u8::decode(&mut read)?,
            status: ReturnStatus::decode(&mut read)?,
            fallen: u8::decode(&mut read)?,
            pose: <[f32; 3]>::decode(&mut read)?,
            ball_age: f32::decode(&mut read)?,
            ball: <[f32; 2]>::decode(&mut read)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> GameControllerMessage {
        let mut message = GameControllerMessage {
            header: GAME_CONTROLLER_STRUCT_HEADER,
            version: GAME_CONTROLLER_STRUCT_VERSION,
            packet_number: 42,
            players_per_team: 5,
            competition_phase: CompetitionPhase::PlayOff,
            competition_type: CompetitionType::Normal,
            game_phase: GamePhase::Normal,
            state: GameState::Playing,
            set_play: SetPlay::CornerKick,
            first_half: Half::Second,
            kicking_team: 8,
            secs_remaining: 321,
            secondary_time: 17,
            ..Default::default()
        };
        message.teams[0].team_number = 8;
        message.teams[0].message_budget = 1200;
        message.teams[0].players[2].penalty = Penalty::PlayerPushing;
        message.teams[0].players[2].secs_till_unpenalised = 30;
        message.teams[1].team_number = 24;
        message
    }

    #[test]
    fn message_roundtrip() -> crate::Result<()> {
        let message = sample_message();

        let mut buf = Vec::new();
        message.encode(&mut buf)?;
        assert_eq!(buf.len(), message.encoded_len());

        let decoded = GameControllerMessage::decode(&mut buf.as_slice())?;
        assert_eq!(message, decoded);
        assert!(decoded.is_valid());

        Ok(())
    }

    #[test]
    fn return_message_roundtrip() -> crate::Result<()> {
        let message = GameControllerReturnMessage::new(
            3,
            8,
            ReturnStatus::ManuallyPenalised,
            false,
            [1000.0, -250.0, 1.57],
            0.25,
            [300.0, 50.0],
        );

        let mut buf = Vec::new();
        message.encode(&mut buf)?;
        assert_eq!(buf.len(), message.encoded_len());

        let decoded = GameControllerReturnMessage::decode(&mut buf.as_slice())?;
        assert_eq!(message, decoded);

        Ok(())
    }

    #[test]
    fn team_lookup_and_penalties() {
        let message = sample_message();

        let team = message.team(8).expect("own team present");
        assert!(team.is_penalized(3));
        assert!(!team.is_penalized(1));
        assert!(message.team(13).is_none());
    }

    #[test]
    fn wrong_version_is_invalid() {
        let mut message = sample_message();
        message.version = GAME_CONTROLLER_STRUCT_VERSION + 1;
        assert!(!message.is_valid());
    }

    #[test]
    fn unknown_discriminant_is_an_error() {
        let result = GameState::decode(&mut [250_u8].as_slice());
        assert!(matches!(
            result,
            Err(crate::Error::InvalidDiscriminant { .. })
        ));
    }
}
