use mimir::DataType;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// The field geometry in meters. Immutable per run, loaded from configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldDimensions {
    pub field_length: f32,
    pub field_width: f32,
    pub line_width: f32,
    pub center_circle_diameter: f32,
    pub penalty_area_length: f32,
    pub penalty_area_width: f32,
    pub goal_box_area_length: f32,
    pub goal_box_area_width: f32,
    pub goal_inner_width: f32,
    pub goal_post_diameter: f32,
    pub ball_diameter: f32,
    pub penalty_marker_distance: f32,
    pub throw_in_line_length: f32,
    pub throw_in_line_spacing: f32,
    pub border_strip_width: f32,
}

impl Default for FieldDimensions {
    fn default() -> Self {
        // the standard SPL field
        Self {
            field_length: 9.0,
            field_width: 6.0,
            line_width: 0.05,
            center_circle_diameter: 1.5,
            penalty_area_length: 1.65,
            penalty_area_width: 4.0,
            goal_box_area_length: 0.6,
            goal_box_area_width: 2.2,
            goal_inner_width: 1.5,
            goal_post_diameter: 0.1,
            ball_diameter: 0.1,
            penalty_marker_distance: 1.3,
            throw_in_line_length: 7.0,
            throw_in_line_spacing: 0.4,
            border_strip_width: 0.7,
        }
    }
}

impl DataType for FieldDimensions {
    fn reset(&mut self) {
        // immutable per run
    }
}

impl FieldDimensions {
    /// Whether `position` lies on the field, allowing `tolerance` meters beyond the lines.
    #[must_use]
    pub fn is_inside_field(&self, position: Point2<f32>, tolerance: f32) -> bool {
        position.x.abs() <= self.field_length / 2.0 + tolerance
            && position.y.abs() <= self.field_width / 2.0 + tolerance
    }

    /// The center of the own goal on the ground, field coordinates.
    #[must_use]
    pub fn own_goal_center(&self) -> Point2<f32> {
        Point2::new(-self.field_length / 2.0, 0.0)
    }

    /// The center of the opponent goal on the ground, field coordinates.
    #[must_use]
    pub fn opponent_goal_center(&self) -> Point2<f32> {
        Point2::new(self.field_length / 2.0, 0.0)
    }

    /// The opponent penalty spot.
    #[must_use]
    pub fn opponent_penalty_spot(&self) -> Point2<f32> {
        Point2::new(self.field_length / 2.0 - self.penalty_marker_distance, 0.0)
    }

    /// The own penalty spot.
    #[must_use]
    pub fn own_penalty_spot(&self) -> Point2<f32> {
        Point2::new(-self.field_length / 2.0 + self.penalty_marker_distance, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_field_respects_tolerance() {
        let field = FieldDimensions::default();

        assert!(field.is_inside_field(Point2::new(4.4, 2.9), 0.0));
        assert!(!field.is_inside_field(Point2::new(4.6, 0.0), 0.0));
        assert!(field.is_inside_field(Point2::new(4.6, 0.0), 0.2));
    }
}
