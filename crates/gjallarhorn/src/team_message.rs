//! The SPL standard team message and our vendor payload.
//!
//! Every frame on the team channel is the fixed SPL prelude ([`SplMessage`]) followed by
//! an opaque payload. Our payload ([`TeamMessagePayload`]) carries the state the team
//! coordination needs: role assignments, time-to-reach-ball bids, ball-search suggestions,
//! obstacles and the embedded NTP exchange. Payloads with an unknown magic or version are
//! skipped by receivers.

use std::io::{Read, Write};

use crate::serialization::{Decode, Encode};
use crate::{Error, Result};

/// The header of the SPL standard message.
pub const SPL_STANDARD_MESSAGE_STRUCT_HEADER: [u8; 4] = *b"SPL ";

/// The version of the SPL standard message.
pub const SPL_STANDARD_MESSAGE_STRUCT_VERSION: u8 = 7;

/// The maximum number of payload bytes one frame may carry.
pub const SPL_STANDARD_MESSAGE_DATA_SIZE: usize = 474;

/// The magic of our vendor payload.
pub const TEAM_MESSAGE_PAYLOAD_MAGIC: [u8; 4] = *b"HORN";

/// The version of our vendor payload.
pub const TEAM_MESSAGE_PAYLOAD_VERSION: u8 = 2;

/// The number of players a team message carries assignments and suggestions for.
pub const MAX_PLAYERS: usize = 6;

/// The maximum number of obstacles one payload may carry.
pub const MAX_OBSTACLES: usize = 16;

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

/// Playing roles as carried on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum WireRole {
    #[default]
    None = 0,
    Keeper = 1,
    Defender = 2,
    SupportStriker = 3,
    Striker = 4,
    Bishop = 5,
    ReplacementKeeper = 6,
    Loser = 7,
    Searcher = 8,
}

wire_enum!(WireRole {
    None = 0,
    Keeper = 1,
    Defender = 2,
    SupportStriker = 3,
    Striker = 4,
    Bishop = 5,
    ReplacementKeeper = 6,
    Loser = 7,
    Searcher = 8,
});

/// The body action a teammate is currently performing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum WireAction {
    #[default]
    Dead = 0,
    Stand = 1,
    Walk = 2,
    Kick = 3,
    Penalized = 4,
    Keeper = 5,
    StandUp = 6,
    Hold = 7,
}

wire_enum!(WireAction {
    Dead = 0,
    Stand = 1,
    Walk = 2,
    Kick = 3,
    Penalized = 4,
    Keeper = 5,
    StandUp = 6,
    Hold = 7,
});

/// Obstacle classification as carried on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum WireObstacleKind {
    #[default]
    Unknown = 0,
    AnonymousRobot = 1,
    HostileRobot = 2,
    TeamRobot = 3,
    FallenAnonymousRobot = 4,
    FallenHostileRobot = 5,
    FallenTeamRobot = 6,
    Ball = 7,
    FreeKickArea = 8,
    GoalPost = 9,
}

wire_enum!(WireObstacleKind {
    Unknown = 0,
    AnonymousRobot = 1,
    HostileRobot = 2,
    TeamRobot = 3,
    FallenAnonymousRobot = 4,
    FallenHostileRobot = 5,
    FallenTeamRobot = 6,
    Ball = 7,
    FreeKickArea = 8,
    GoalPost = 9,
});

/// One obstacle as carried on the wire, robot-relative coordinates in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WireObstacle {
    pub center: [f32; 2],
    pub kind: WireObstacleKind,
}

impl Encode for WireObstacle {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        self.center.encode(&mut write)?;
        self.kind.encode(&mut write)
    }

    fn encoded_len(&self) -> usize {
        9
    }
}

impl Decode for WireObstacle {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(Self {
            center: <[f32; 2]>::decode(&mut read)?,
            kind: WireObstacleKind::decode(&mut read)?,
        })
    }
}

/// A ball-search position suggested for one teammate, field coordinates in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchSuggestion {
    pub position: [f32; 2],
    pub valid: bool,
}

impl Encode for SearchSuggestion {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        self.position.encode(&mut write)?;
        self.valid.encode(&mut write)
    }

    fn encoded_len(&self) -> usize {
        9
    }
}

impl Decode for SearchSuggestion {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(Self {
            position: <[f32; 2]>::decode(&mut read)?,
            valid: bool::decode(&mut read)?,
        })
    }
}

/// An NTP request: "my clock read `origination` when I sent this".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NtpRequest {
    /// Sender-local milliseconds at transmission.
    pub origination: u32,
}

impl Encode for NtpRequest {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        self.origination.encode(&mut write)
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

impl Decode for NtpRequest {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(Self {
            origination: u32::decode(&mut read)?,
        })
    }
}

/// An NTP response addressed to one requester.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NtpResponse {
    /// Player number of the original requester.
    pub to: u8,
    /// The requester-local origination timestamp, echoed back.
    pub origination: u32,
    /// Responder-local milliseconds when the request arrived.
    pub receipt: u32,
    /// Responder-local milliseconds when this response was transmitted. Responses are
    /// buffered until the next permitted transmission, so this differs from `receipt`.
    pub sent: u32,
}

impl Encode for NtpResponse {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        self.to.encode(&mut write)?;
        self.origination.encode(&mut write)?;
        self.receipt.encode(&mut write)?;
        self.sent.encode(&mut write)
    }

    fn encoded_len(&self) -> usize {
        13
    }
}

impl Decode for NtpResponse {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(Self {
            to: u8::decode(&mut read)?,
            origination: u32::decode(&mut read)?,
            receipt: u32::decode(&mut read)?,
            sent: u32::decode(&mut read)?,
        })
    }
}

/// Our vendor payload inside the SPL standard message.
///
/// All timestamps are sender-local milliseconds; the receiver shifts them by the NTP
/// offset it has estimated for the sender.
#[derive(Clone, Debug, PartialEq)]
pub struct TeamMessagePayload {
    /// Whether the sender trusts its self-localization.
    pub is_pose_valid: bool,
    /// The sender's head yaw in radians, for field-of-view reasoning.
    pub head_yaw: f32,
    /// Sender-local milliseconds of the last localization jump.
    pub timestamp_last_jumped: u32,
    /// Sender-local milliseconds when the ball was last seen.
    pub time_when_ball_was_seen: u32,
    /// Ball velocity relative to the sender, meters per second.
    pub ball_velocity: [f32; 2],
    /// Time-to-reach-ball bid in milliseconds.
    pub time_to_reach_ball: u32,
    /// Time-to-reach-ball bid on the striker bonus track, milliseconds.
    pub time_to_reach_ball_striker: u32,
    /// The role the sender is currently performing.
    pub current_role: WireRole,
    /// The sender's full role assignment, index 0 is player 1.
    pub role_assignments: [WireRole; MAX_PLAYERS],
    /// The body action the sender is currently performing.
    pub current_action: WireAction,
    /// The player number the sender wants to pass to, 0 if none.
    pub pass_target: u8,
    /// Ball-search suggestions for every player, index 0 is player 1.
    pub search_suggestions: [SearchSuggestion; MAX_PLAYERS],
    /// Sender-local milliseconds when a whistle was last heard, `u32::MAX` if never.
    pub last_whistle_heard: u32,
    /// Obstacles seen by the sender, at most [`MAX_OBSTACLES`].
    pub obstacles: Vec<WireObstacle>,
    /// An NTP request, if the sender wants its clock offset measured.
    pub ntp_request: Option<NtpRequest>,
    /// Answers to previously received NTP requests.
    pub ntp_responses: Vec<NtpResponse>,
}

impl Default for TeamMessagePayload {
    fn default() -> Self {
        Self {
            is_pose_valid: false,
            head_yaw: 0.0,
            timestamp_last_jumped: 0,
            time_when_ball_was_seen: 0,
            ball_velocity: [0.0; 2],
            time_to_reach_ball: u32::MAX,
            time_to_reach_ball_striker: u32::MAX,
            current_role: WireRole::None,
            role_assignments: [WireRole::None; MAX_PLAYERS],
            current_action: WireAction::Dead,
            pass_target: 0,
            search_suggestions: [SearchSuggestion::default(); MAX_PLAYERS],
            last_whistle_heard: u32::MAX,
            obstacles: Vec::new(),
            ntp_request: None,
            ntp_responses: Vec::new(),
        }
    }
}

impl Encode for TeamMessagePayload {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        if self.obstacles.len() > MAX_OBSTACLES {
            return Err(Error::PayloadTooLarge {
                len: self.obstacles.len(),
                max: MAX_OBSTACLES,
            });
        }

        TEAM_MESSAGE_PAYLOAD_MAGIC.encode(&mut write)?;
        TEAM_MESSAGE_PAYLOAD_VERSION.encode(&mut write)?;
        self.is_pose_valid.encode(&mut write)?;
        self.head_yaw.encode(&mut write)?;
        self.timestamp_last_jumped.encode(&mut write)?;
        self.time_when_ball_was_seen.encode(&mut write)?;
        self.ball_velocity.encode(&mut write)?;
        self.time_to_reach_ball.encode(&mut write)?;
        self.time_to_reach_ball_striker.encode(&mut write)?;
        self.current_role.encode(&mut write)?;
        self.role_assignments.encode(&mut write)?;
        self.current_action.encode(&mut write)?;
        self.pass_target.encode(&mut write)?;
        self.search_suggestions.encode(&mut write)?;
        self.last_whistle_heard.encode(&mut write)?;

        (self.obstacles.len() as u8).encode(&mut write)?;
        for obstacle in &self.obstacles {
            obstacle.encode(&mut write)?;
        }

        self.ntp_request.is_some().encode(&mut write)?;
        if let Some(request) = &self.ntp_request {
            request.encode(&mut write)?;
        }

        (self.ntp_responses.len() as u8).encode(&mut write)?;
        for response in &self.ntp_responses {
            response.encode(&mut write)?;
        }

        Ok(())
    }

    fn encoded_len(&self) -> usize {
        let fixed = 4
            + 1
            + 1
            + 4
            + 4
            + 4
            + 8
            + 4
            + 4
            + 1
            + MAX_PLAYERS
            + 1
            + 1
            + MAX_PLAYERS * 9
            + 4;
        fixed
            + 1
            + self.obstacles.len() * 9
            + 1
            + self.ntp_request.map_or(0, |r| r.encoded_len())
            + 1
            + self.ntp_responses.len() * 13
    }
}

impl Decode for TeamMessagePayload {
    fn decode(mut read: impl Read) -> Result<Self> {
        let magic = <[u8; 4]>::decode(&mut read)?;
        if magic != TEAM_MESSAGE_PAYLOAD_MAGIC {
            return Err(Error::BadMagic {
                expected: TEAM_MESSAGE_PAYLOAD_MAGIC,
                found: magic,
            });
        }
        let version = u8::decode(&mut read)?;
        if version != TEAM_MESSAGE_PAYLOAD_VERSION {
            return Err(Error::BadVersion {
                expected: TEAM_MESSAGE_PAYLOAD_VERSION,
                found: version,
            });
        }

        let is_pose_valid = bool::decode(&mut read)?;
        let head_yaw = f32::decode(&mut read)?;
        let timestamp_last_jumped = u32::decode(&mut read)?;
        let time_when_ball_was_seen = u32::decode(&mut read)?;
        let ball_velocity = <[f32; 2]>::decode(&mut read)?;
        let time_to_reach_ball = u32::decode(&mut read)?;
        let time_to_reach_ball_striker = u32::decode(&mut read)?;
        let current_role = WireRole::decode(&mut read)?;
        let role_assignments = <[WireRole; MAX_PLAYERS]>::decode(&mut read)?;
        let current_action = WireAction::decode(&mut read)?;
        let pass_target = u8::decode(&mut read)?;
        let search_suggestions = <[SearchSuggestion; MAX_PLAYERS]>::decode(&mut read)?;
        let last_whistle_heard = u32::decode(&mut read)?;

        let obstacle_count = usize::from(u8::decode(&mut read)?);
        if obstacle_count > MAX_OBSTACLES {
            return Err(Error::PayloadTooLarge {
                len: obstacle_count,
                max: MAX_OBSTACLES,
            });
        }
        let mut obstacles = Vec::with_capacity(obstacle_count);
        for _ in 0..obstacle_count {
            obstacles.push(WireObstacle::decode(&mut read)?);
        }

        let ntp_request = if bool::decode(&mut read)? {
            Some(NtpRequest::decode(&mut read)?)
        } else {
            None
        };

        let response_count = usize::from(u8::decode(&mut read)?);
        let mut ntp_responses = Vec::with_capacity(response_count);
        for _ in 0..response_count {
            ntp_responses.push(NtpResponse::decode(&mut read)?);
        }

        Ok(Self {
            is_pose_valid,
            head_yaw,
            timestamp_last_jumped,
            time_when_ball_was_seen,
            ball_velocity,
            time_to_reach_ball,
            time_to_reach_ball_striker,
            current_role,
            role_assignments,
            current_action,
            pass_target,
            search_suggestions,
            last_whistle_heard,
            obstacles,
            ntp_request,
            ntp_responses,
        })
    }
}

/// The SPL standard message: the fixed prelude followed by the vendor payload bytes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplMessage {
    /// Player number, starts with 1.
    pub player_num: u8,
    /// Team number.
    pub team_num: u8,
    /// Whether the sender is fallen.
    pub fallen: bool,
    /// Pose on the field `[x, y, theta]`, meters and radians.
    pub pose: [f32; 3],
    /// Seconds since the sender saw the ball, -1 if never.
    pub ball_age: f32,
    /// Ball position relative to the sender, meters.
    pub ball: [f32; 2],
    /// The vendor payload.
    pub payload: Vec<u8>,
}

impl SplMessage {
    /// Wraps an encoded vendor payload into a full frame.
    pub fn new(
        player_num: u8,
        team_num: u8,
        fallen: bool,
        pose: [f32; 3],
        ball_age: f32,
        ball: [f32; 2],
        payload: Vec<u8>,
    ) -> Result<Self> {
        if payload.len() > SPL_STANDARD_MESSAGE_DATA_SIZE {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                max: SPL_STANDARD_MESSAGE_DATA_SIZE,
            });
        }
        Ok(Self {
            player_num,
            team_num,
            fallen,
            pose,
            ball_age,
            ball,
            payload,
        })
    }
}

impl Encode for SplMessage {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        SPL_STANDARD_MESSAGE_STRUCT_HEADER.encode(&mut write)?;
        SPL_STANDARD_MESSAGE_STRUCT_VERSION.encode(&mut write)?;
        self.player_num.encode(&mut write)?;
        self.team_num.encode(&mut write)?;
        u8::from(self.fallen).encode(&mut write)?;
        self.pose.encode(&mut write)?;
        self.ball_age.encode(&mut write)?;
        self.ball.encode(&mut write)?;
        (self.payload.len() as u16).encode(&mut write)?;
        write.write_all(&self.payload)?;
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        4 + 1 + 3 + self.pose.encoded_len() + 4 + self.ball.encoded_len() + 2 + self.payload.len()
    }
}

impl Decode for SplMessage {
    fn decode(mut read: impl Read) -> Result<Self> {
        let header = <[u8; 4]>::decode(&mut read)?;
        if header != SPL_STANDARD_MESSAGE_STRUCT_HEADER {
            return Err(Error::BadMagic {
                expected: SPL_STANDARD_MESSAGE_STRUCT_HEADER,
                found: header,
            });
        }
        let version = u8::decode(&mut read)?;
        if version != SPL_STANDARD_MESSAGE_STRUCT_VERSION {
            return Err(Error::BadVersion {
                expected: SPL_STANDARD_MESSAGE_STRUCT_VERSION,
                found: version,
            });
        }

        let player_num = u8::decode(&mut read)?;
        let team_num = u8::decode(&mut read)?;
        let fallen = bool::decode(&mut read)?;
        let pose = <[f32; 3]>::decode(&mut read)?;
        let ball_age = f32::decode(&mut read)?;
        let ball = <[f32; 2]>::decode(&mut read)?;

        let payload_len = usize::from(u16::decode(&mut read)?);
        if payload_len > SPL_STANDARD_MESSAGE_DATA_SIZE {
            return Err(Error::PayloadTooLarge {
                len: payload_len,
                max: SPL_STANDARD_MESSAGE_DATA_SIZE,
            });
        }
        let mut payload = vec![0; payload_len];
        read.read_exact(&mut payload)?;

        Ok(Self {
            player_num,
            team_num,
            fallen,
            pose,
            ball_age,
            ball,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> TeamMessagePayload {
        let mut payload = TeamMessagePayload {
            is_pose_valid: true,
            timestamp_last_jumped: 1_000,
            time_when_ball_was_seen: 41_500,
            ball_velocity: [0.2, -0.1],
            time_to_reach_ball: 3_200,
            time_to_reach_ball_striker: 2_700,
            current_role: WireRole::Striker,
            current_action: WireAction::Walk,
            last_whistle_heard: 39_000,
            ntp_request: Some(NtpRequest {
                origination: 42_000,
            }),
            ..Default::default()
        };
        payload.role_assignments[0] = WireRole::Keeper;
        payload.role_assignments[1] = WireRole::Striker;
        payload.search_suggestions[2] = SearchSuggestion {
            position: [-1.5, 0.5],
            valid: true,
        };
        payload.obstacles.push(WireObstacle {
            center: [0.8, -0.2],
            kind: WireObstacleKind::HostileRobot,
        });
        payload.ntp_responses.push(NtpResponse {
            to: 4,
            origination: 40_000,
            receipt: 40_123,
            sent: 41_000,
        });
        payload
    }

    #[test]
    fn payload_roundtrip() -> crate::Result<()> {
        let payload = sample_payload();

        let mut buf = Vec::new();
        payload.encode(&mut buf)?;
        assert_eq!(buf.len(), payload.encoded_len());

        let decoded = TeamMessagePayload::decode(&mut buf.as_slice())?;
        assert_eq!(payload, decoded);

        Ok(())
    }

    #[test]
    fn frame_roundtrip() -> crate::Result<()> {
        let mut payload_bytes = Vec::new();
        sample_payload().encode(&mut payload_bytes)?;

        let message = SplMessage::new(
            2,
            8,
            false,
            [1.0, -0.5, 0.7],
            0.1,
            [0.5, 0.0],
            payload_bytes,
        )?;

        let mut buf = Vec::new();
        message.encode(&mut buf)?;
        assert_eq!(buf.len(), message.encoded_len());

        let decoded = SplMessage::decode(&mut buf.as_slice())?;
        assert_eq!(message, decoded);

        let decoded_payload = TeamMessagePayload::decode(&mut decoded.payload.as_slice())?;
        assert_eq!(decoded_payload.current_role, WireRole::Striker);

        Ok(())
    }

    #[test]
    fn unknown_payload_version_is_skippable() -> crate::Result<()> {
        let mut buf = Vec::new();
        sample_payload().encode(&mut buf)?;
        buf[4] = TEAM_MESSAGE_PAYLOAD_VERSION + 1;

        assert!(matches!(
            TeamMessagePayload::decode(&mut buf.as_slice()),
            Err(Error::BadVersion { .. })
        ));

        Ok(())
    }

    #[test]
    fn bad_frame_magic_is_rejected() {
        let buf = [0_u8; 64];
        assert!(matches!(
            SplMessage::decode(&mut buf.as_slice()),
            Err(Error::BadMagic { .. })
        ));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let result = SplMessage::new(
            1,
            8,
            false,
            [0.0; 3],
            -1.0,
            [0.0; 2],
            vec![0; SPL_STANDARD_MESSAGE_DATA_SIZE + 1],
        );
        assert!(matches!(result, Err(Error::PayloadTooLarge { .. })));
    }
}
