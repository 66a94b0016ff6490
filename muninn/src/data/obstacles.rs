use mimir::DataType;
use nalgebra::Point2;

use gjallarhorn::team_message::WireObstacleKind;

/// Obstacle classification.
///
/// For team fusion the types form a lattice: `Unknown` is above the robot types,
/// `AnonymousRobot` above the upright robots, `FallenAnonymousRobot` above the fallen
/// ones. `Ball`, `FreeKickArea` and `GoalPost` are incomparable leaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ObstacleType {
    #[default]
    Unknown,
    AnonymousRobot,
    HostileRobot,
    TeamRobot,
    FallenAnonymousRobot,
    FallenHostileRobot,
    FallenTeamRobot,
    Ball,
    FreeKickArea,
    GoalPost,
}

impl ObstacleType {
    /// The merge radius the filters use for this type, meters.
    #[must_use]
    pub fn radius(self) -> f32 {
        match self {
            ObstacleType::Ball => 0.05,
            ObstacleType::GoalPost => 0.05,
            ObstacleType::FreeKickArea => 0.75,
            ObstacleType::Unknown => 0.2,
            _ => 0.3,
        }
    }
}

impl From<ObstacleType> for WireObstacleKind {
    fn from(obstacle_type: ObstacleType) -> Self {
        match obstacle_type {
            ObstacleType::Unknown => WireObstacleKind::Unknown,
            ObstacleType::AnonymousRobot => WireObstacleKind::AnonymousRobot,
            ObstacleType::HostileRobot => WireObstacleKind::HostileRobot,
            ObstacleType::TeamRobot => WireObstacleKind::TeamRobot,
            ObstacleType::FallenAnonymousRobot => WireObstacleKind::FallenAnonymousRobot,
            ObstacleType::FallenHostileRobot => WireObstacleKind::FallenHostileRobot,
            ObstacleType::FallenTeamRobot => WireObstacleKind::FallenTeamRobot,
            ObstacleType::Ball => WireObstacleKind::Ball,
            ObstacleType::FreeKickArea => WireObstacleKind::FreeKickArea,
            ObstacleType::GoalPost => WireObstacleKind::GoalPost,
        }
    }
}

impl From<WireObstacleKind> for ObstacleType {
    fn from(kind: WireObstacleKind) -> Self {
        match kind {
            WireObstacleKind::Unknown => ObstacleType::Unknown,
            WireObstacleKind::AnonymousRobot => ObstacleType::AnonymousRobot,
            WireObstacleKind::HostileRobot => ObstacleType::HostileRobot,
            WireObstacleKind::TeamRobot => ObstacleType::TeamRobot,
            WireObstacleKind::FallenAnonymousRobot => ObstacleType::FallenAnonymousRobot,
            WireObstacleKind::FallenHostileRobot => ObstacleType::FallenHostileRobot,
            WireObstacleKind::FallenTeamRobot => ObstacleType::FallenTeamRobot,
            WireObstacleKind::Ball => ObstacleType::Ball,
            WireObstacleKind::FreeKickArea => ObstacleType::FreeKickArea,
            WireObstacleKind::GoalPost => ObstacleType::GoalPost,
        }
    }
}

/// One obstacle, robot-relative.
#[derive(Clone, Copy, Debug)]
pub struct Obstacle {
    pub relative_position: Point2<f32>,
    pub radius: f32,
    pub obstacle_type: ObstacleType,
}

impl Obstacle {
    #[must_use]
    pub fn new(relative_position: Point2<f32>, obstacle_type: ObstacleType) -> Self {
        Self {
            relative_position,
            radius: obstacle_type.radius(),
            obstacle_type,
        }
    }
}

/// The obstacles this robot detected itself this tick.
#[derive(Clone, Debug, Default)]
pub struct ObstacleData {
    pub obstacles: Vec<Obstacle>,
}

impl DataType for ObstacleData {}

/// One obstacle in the merged team model, kept in both frames.
#[derive(Clone, Copy, Debug)]
pub struct TeamObstacle {
    pub relative_position: Point2<f32>,
    pub absolute_position: Point2<f32>,
    pub radius: f32,
    pub obstacle_type: ObstacleType,
}

/// The merged obstacle model across the team.
#[derive(Clone, Debug, Default)]
pub struct TeamObstacleData {
    pub obstacles: Vec<TeamObstacle>,
}

impl DataType for TeamObstacleData {}
