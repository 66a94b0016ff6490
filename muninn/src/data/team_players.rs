use std::time::Instant;

use mimir::DataType;
use nalgebra::{Point2, Vector2};

use crate::data::obstacles::Obstacle;
use crate::data::roles::PlayingRole;
use crate::math::Pose;

use gjallarhorn::team_message::WireAction;

/// The number of players the team coordination handles.
pub const MAX_PLAYERS: usize = gjallarhorn::team_message::MAX_PLAYERS;

/// Everything this robot knows about one teammate, built from its last team message.
/// All timestamps are already shifted into the local clock by the NTP offset.
#[derive(Clone, Debug)]
pub struct TeamPlayer {
    pub player_number: u8,
    /// The teammate's pose on the field.
    pub pose: Pose,
    pub is_pose_valid: bool,
    /// When the teammate's localization last jumped.
    pub timestamp_last_jumped: Instant,
    /// The ball as the teammate saw it, relative to the teammate.
    pub ball_position: Point2<f32>,
    /// Ball velocity, relative to the teammate like the position.
    pub ball_velocity: Vector2<f32>,
    pub time_when_ball_was_seen: Instant,
    /// The teammate's time-to-reach-ball bid, as a deadline on the local clock.
    pub time_when_reach_ball: Instant,
    /// The bid on the striker bonus track.
    pub time_when_reach_ball_striker: Instant,
    pub penalized: bool,
    pub fallen: bool,
    pub head_yaw: f32,
    /// The role the teammate is currently performing.
    pub currently_performing_role: PlayingRole,
    /// The teammate's full role election, index 0 is player 1.
    pub role_assignments: Vec<PlayingRole>,
    /// The body action the teammate reported.
    pub current_action: WireAction,
    /// The player number the teammate wants to pass to, 0 if none.
    pub current_pass_target: u8,
    /// Obstacles the teammate reported, relative to the teammate.
    pub local_obstacles: Vec<Obstacle>,
    /// Ball-search positions the teammate suggests, index 0 is player 1.
    pub suggested_search_positions: Vec<Point2<f32>>,
    pub suggested_search_positions_valid: Vec<bool>,
    /// When the teammate last heard a whistle.
    pub last_time_whistle_heard: Option<Instant>,
    /// When the last valid message from this teammate arrived.
    pub last_message_received: Instant,
}

impl TeamPlayer {
    #[must_use]
    pub fn new(player_number: u8) -> Self {
        let now = Instant::now();
        Self {
            player_number,
            pose: Pose::default(),
            is_pose_valid: false,
            timestamp_last_jumped: now,
            ball_position: Point2::origin(),
            ball_velocity: Vector2::zeros(),
            time_when_ball_was_seen: now,
            time_when_reach_ball: now,
            time_when_reach_ball_striker: now,
            penalized: false,
            fallen: false,
            head_yaw: 0.0,
            currently_performing_role: PlayingRole::None,
            role_assignments: Vec::new(),
            current_action: WireAction::Dead,
            current_pass_target: 0,
            local_obstacles: Vec::new(),
            suggested_search_positions: Vec::new(),
            suggested_search_positions_valid: Vec::new(),
            last_time_whistle_heard: None,
            last_message_received: now,
        }
    }

    /// A convenience constructor for an unpenalized teammate at a pose, used by tests.
    #[must_use]
    pub fn at_pose(player_number: u8, pose: Pose) -> Self {
        Self {
            pose,
            is_pose_valid: true,
            ..Self::new(player_number)
        }
    }
}

/// One row per teammate this robot currently hears on the radio. The own robot is not
/// listed here.
#[derive(Clone, Debug, Default)]
pub struct TeamPlayers {
    pub players: Vec<TeamPlayer>,
    /// How many active (unpenalized) players the team currently has, including self.
    pub active_player_count: u32,
}

impl DataType for TeamPlayers {}

impl TeamPlayers {
    /// The teammate with the given player number, if known.
    #[must_use]
    pub fn player(&self, player_number: u8) -> Option<&TeamPlayer> {
        self.players
            .iter()
            .find(|player| player.player_number == player_number)
    }
}
