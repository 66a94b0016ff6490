//! The typed data slots exchanged between brain modules.
//!
//! Every type here implements [`mimir::DataType`]: its `reset` state is the invalid
//! state written before each tick, so consumers must gate on the `valid`-style flags.

pub mod action_command;
pub mod ball;
pub mod body;
pub mod cycle;
pub mod field;
pub mod game_state;
pub mod ntp;
pub mod obstacles;
pub mod positions;
pub mod roles;
pub mod search_map;
pub mod searcher;
pub mod striker;
pub mod team_ball;
pub mod team_players;
pub mod time_to_reach;
pub mod world_state;

pub use action_command::ActionCommand;
pub use ball::BallState;
pub use body::{
    AudioRequest, BodyPose, ButtonData, FootCollisionData, JointSensorData, RobotDetections,
    RobotPosition, SonarData, WhistleData,
};
pub use cycle::CycleInfo;
pub use field::FieldDimensions;
pub use game_state::GameControllerState;
pub use ntp::{NtpData, ReceivedNtpRequest, TeamClock};
pub use obstacles::{Obstacle, ObstacleData, ObstacleType, TeamObstacleData};
pub use positions::{
    BishopPosition, DefendingPosition, LoserPosition, PointOfInterests, SetPosition,
    SupportingPosition,
};
pub use roles::{PlayingRole, PlayingRoles};
pub use search_map::{BallSearchMap, ProbCell};
pub use searcher::SearcherPosition;
pub use striker::{
    KeeperAction, PenaltyStrikerAction, ReplacementKeeperAction, SetPlayStrikerAction,
    StrikerAction,
};
pub use team_ball::{BallType, TeamBallModel};
pub use team_players::{TeamPlayer, TeamPlayers, MAX_PLAYERS};
pub use time_to_reach::TimeToReachBall;
pub use world_state::WorldState;
