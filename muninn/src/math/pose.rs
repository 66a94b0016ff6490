use nalgebra::{Point2, Rotation2, Vector2};

use crate::math::angle;

/// A 2D pose on the field: position in meters plus orientation in radians, counter-
/// clockwise from the +x axis (which points at the opponent goal).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub position: Point2<f32>,
    pub orientation: f32,
}

impl Pose {
    #[must_use]
    pub fn new(position: Point2<f32>, orientation: f32) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Transforms a robot-relative point into field coordinates.
    #[must_use]
    pub fn robot_to_field(&self, point: Point2<f32>) -> Point2<f32> {
        self.position + Rotation2::new(self.orientation) * point.coords
    }

    /// Transforms a field point into robot-relative coordinates.
    #[must_use]
    pub fn field_to_robot(&self, point: Point2<f32>) -> Point2<f32> {
        Point2::from(Rotation2::new(-self.orientation) * (point - self.position))
    }

    /// Rotates a robot-relative direction into field coordinates.
    #[must_use]
    pub fn rotate_to_field(&self, direction: Vector2<f32>) -> Vector2<f32> {
        Rotation2::new(self.orientation) * direction
    }

    /// The bearing from this pose to a field point, relative to the pose orientation.
    #[must_use]
    pub fn angle_to(&self, point: Point2<f32>) -> f32 {
        let to_point = point - self.position;
        angle::normalize(to_point.y.atan2(to_point.x) - self.orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn transforms_are_inverse_of_each_other() {
        let pose = Pose::new(Point2::new(1.0, -2.0), 0.7);
        let point = Point2::new(0.5, 0.25);

        let there = pose.robot_to_field(point);
        let back = pose.field_to_robot(there);

        assert_relative_eq!(back.x, point.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, point.y, epsilon = 1e-5);
    }

    #[test]
    fn robot_to_field_rotates_and_translates() {
        let pose = Pose::new(Point2::new(1.0, 1.0), FRAC_PI_2);

        let transformed = pose.robot_to_field(Point2::new(1.0, 0.0));
        assert_relative_eq!(transformed.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(transformed.y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn angle_to_is_relative_to_orientation() {
        let pose = Pose::new(Point2::origin(), FRAC_PI_2);

        assert_relative_eq!(pose.angle_to(Point2::new(0.0, 1.0)), 0.0);
        assert_relative_eq!(pose.angle_to(Point2::new(1.0, 0.0)), -FRAC_PI_2);
    }
}
