pub mod angle;
pub mod ball_utils;
pub mod geometry;
pub mod hysteresis;
pub mod pose;

pub use pose::Pose;
