use std::time::Instant;

use mimir::DataType;
use nalgebra::Point2;

use crate::math::Pose;

/// The robot's pose on the field as estimated by self-localization. Input contract.
#[derive(Clone, Copy, Debug)]
pub struct RobotPosition {
    pub pose: Pose,
    /// Whether the localization currently trusts its estimate.
    pub valid: bool,
    /// When the estimate last jumped discontinuously.
    pub last_time_jumped: Instant,
}

impl Default for RobotPosition {
    fn default() -> Self {
        Self {
            pose: Pose::default(),
            valid: false,
            last_time_jumped: Instant::now(),
        }
    }
}

impl DataType for RobotPosition {
    fn reset(&mut self) {
        // input slot
    }
}

impl RobotPosition {
    /// Transforms a robot-relative point into field coordinates.
    #[must_use]
    pub fn robot_to_field(&self, point: Point2<f32>) -> Point2<f32> {
        self.pose.robot_to_field(point)
    }

    /// Transforms a field point into robot-relative coordinates.
    #[must_use]
    pub fn field_to_robot(&self, point: Point2<f32>) -> Point2<f32> {
        self.pose.field_to_robot(point)
    }
}

/// Whether the robot body is upright, and since when. Input contract of the IMU filter.
#[derive(Clone, Copy, Debug)]
pub struct BodyPose {
    pub fallen: bool,
    pub fallen_since: Instant,
}

impl Default for BodyPose {
    fn default() -> Self {
        Self {
            fallen: false,
            fallen_since: Instant::now(),
        }
    }
}

impl DataType for BodyPose {
    fn reset(&mut self) {
        // input slot
    }
}

/// Debounced button events, latched with the timestamp of the press so each press is
/// handled exactly once. Input contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonData {
    /// Timestamp of the last single chest-button press.
    pub last_chest_button_single_press: Option<Instant>,
    /// Timestamp of the last long chest-button press.
    pub last_chest_button_long_press: Option<Instant>,
    /// Timestamp of the last simultaneous hold of all three head buttons.
    pub last_head_buttons_hold: Option<Instant>,
}

impl DataType for ButtonData {
    fn reset(&mut self) {
        // input slot
    }
}

/// Joint angles the brain cares about. Input contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct JointSensorData {
    /// Head yaw in radians, positive left.
    pub head_yaw: f32,
    /// Head pitch in radians.
    pub head_pitch: f32,
}

impl DataType for JointSensorData {
    fn reset(&mut self) {
        // input slot
    }
}

/// Filtered sonar distances. Input contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct SonarData {
    pub left_distance: Option<f32>,
    pub right_distance: Option<f32>,
}

impl DataType for SonarData {
    fn reset(&mut self) {
        // input slot
    }
}

/// Foot bumper collision events. Input contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct FootCollisionData {
    pub collision: bool,
    pub last_collision: Option<Instant>,
}

impl DataType for FootCollisionData {
    fn reset(&mut self) {
        // input slot
    }
}

/// Robots detected by vision, robot-relative positions. Input contract.
#[derive(Clone, Debug, Default)]
pub struct RobotDetections {
    pub positions: Vec<Point2<f32>>,
}

impl DataType for RobotDetections {
    fn reset(&mut self) {
        // input slot
    }
}

/// Whistle detection. Input contract of the audio pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhistleData {
    pub last_time_whistle_heard: Option<Instant>,
}

impl DataType for WhistleData {
    fn reset(&mut self) {
        // input slot
    }
}

/// Audio playback requests queued by brain modules for the operator, e.g. the
/// same-player-number warning.
#[derive(Clone, Debug, Default)]
pub struct AudioRequest {
    pub phrases: Vec<String>,
}

impl DataType for AudioRequest {}
