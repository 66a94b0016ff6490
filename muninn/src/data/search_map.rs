use std::time::Instant;

use mimir::DataType;
use nalgebra::Point2;

use crate::math::{angle, Pose};

/// Number of columns in the map, including the one-cell convolution border.
pub const COLS: usize = 20;

/// Number of rows in the map, including the one-cell convolution border.
pub const ROWS: usize = 14;

/// Beyond this head yaw the shoulders block the view; cells are never in FOV then.
const MAX_HEAD_YAW: f32 = 50.0 * std::f32::consts::PI / 180.0;

/// One cell of the ball-search probability map.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProbCell {
    /// How likely it is that the ball is in this cell.
    pub probability: f32,
    /// The probability during the last cycle, backup for the convolution.
    pub old_probability: f32,
    /// How old the value is, in cycles.
    pub age: u32,
    /// The position of the cell's center on the field, meters.
    pub position: Point2<f32>,
    /// The indices of the cell in the map.
    pub indices: (usize, usize),
}

/// Grid of probabilities for where the ball might be when unseen.
///
/// Interior cells exactly tile the field; the outer border exists only as convolution
/// padding and mirrors its nearest interior neighbour. This is running state: it carries
/// over from tick to tick and is only re-initialised on READY.
#[derive(Clone, Debug)]
pub struct BallSearchMap {
    /// Cells indexed `[col][row]`.
    pub cells: Vec<Vec<ProbCell>>,
    /// Cell size in meters.
    pub cell_length: f32,
    pub cell_width: f32,
    /// When the map was last known to be unreliable (own penalty, READY).
    pub timestamp_unreliable: Instant,
    field_length: f32,
    field_width: f32,
}

impl Default for BallSearchMap {
    fn default() -> Self {
        Self::new(9.0, 6.0)
    }
}

impl DataType for BallSearchMap {
    fn reset(&mut self) {
        // running state, only mutated by its producer
    }
}

impl BallSearchMap {
    /// Creates a map whose interior cells tile a field of the given size.
    #[must_use]
    pub fn new(field_length: f32, field_width: f32) -> Self {
        let cell_length = field_length / (COLS - 2) as f32;
        let cell_width = field_width / (ROWS - 2) as f32;

        let mut cells = Vec::with_capacity(COLS);
        for x in 0..COLS {
            let mut column = Vec::with_capacity(ROWS);
            for y in 0..ROWS {
                let probability = 1.0 / (COLS * ROWS) as f32;
                column.push(ProbCell {
                    probability,
                    old_probability: probability,
                    age: 1,
                    position: Point2::new(
                        (x as f32 - 1.0) * cell_length + 0.5 * cell_length - field_length / 2.0,
                        (y as f32 - 1.0) * cell_width + 0.5 * cell_width - field_width / 2.0,
                    ),
                    indices: (x, y),
                });
            }
            cells.push(column);
        }

        Self {
            cells,
            cell_length,
            cell_width,
            timestamp_unreliable: Instant::now(),
            field_length,
            field_width,
        }
    }

    /// Re-initialises the map when the configured field size differs from the one the
    /// map was built for.
    pub fn ensure_field(&mut self, field_length: f32, field_width: f32) {
        if (self.field_length - field_length).abs() > f32::EPSILON
            || (self.field_width - field_width).abs() > f32::EPSILON
        {
            *self = Self::new(field_length, field_width);
        }
    }

    /// The indices of the interior cell containing `position`, clamped to the interior.
    #[must_use]
    pub fn indices_from_position(&self, position: Point2<f32>) -> (usize, usize) {
        let x = ((position.x + self.field_length / 2.0) / self.cell_length) as isize + 1;
        let y = ((position.y + self.field_width / 2.0) / self.cell_width) as isize + 1;

        (
            x.clamp(1, COLS as isize - 2) as usize,
            y.clamp(1, ROWS as isize - 2) as usize,
        )
    }

    /// The interior cell containing `position`.
    #[must_use]
    pub fn cell_from_position(&self, position: Point2<f32>) -> &ProbCell {
        let (x, y) = self.indices_from_position(position);
        &self.cells[x][y]
    }

    /// Mutable access to the interior cell containing `position`.
    pub fn cell_from_position_mut(&mut self, position: Point2<f32>) -> &mut ProbCell {
        let (x, y) = self.indices_from_position(position);
        &mut self.cells[x][y]
    }

    /// Whether a cell is in the visual cone of a robot with the given pose and head yaw.
    #[must_use]
    pub fn is_cell_in_fov(
        &self,
        pose: &Pose,
        head_yaw: f32,
        cell: &ProbCell,
        max_detection_range_squared: f32,
        fov_angle: f32,
    ) -> bool {
        if head_yaw.abs() > MAX_HEAD_YAW {
            return false;
        }
        let rel_cell = cell.position - pose.position;
        if rel_cell.norm_squared() >= max_detection_range_squared {
            return false;
        }
        let relative_cell_angle = rel_cell.y.atan2(rel_cell.x);
        let angle_to_head_x = angle::difference(relative_cell_angle, head_yaw + pose.orientation);
        angle_to_head_x < fov_angle * 0.5
    }

    /// Sum of the interior cell probabilities.
    #[must_use]
    pub fn interior_sum(&self) -> f32 {
        let mut sum = 0.0;
        for x in 1..COLS - 1 {
            for y in 1..ROWS - 1 {
                sum += self.cells[x][y].probability;
            }
        }
        sum
    }

    /// Applies `f` to every interior cell.
    pub fn for_each_interior(&mut self, mut f: impl FnMut(&mut ProbCell)) {
        for x in 1..COLS - 1 {
            for y in 1..ROWS - 1 {
                f(&mut self.cells[x][y]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn interior_cells_tile_the_field() {
        let map = BallSearchMap::new(9.0, 6.0);

        assert_relative_eq!(map.cell_length, 0.5);
        assert_relative_eq!(map.cell_width, 0.5);

        // first interior cell center sits half a cell inside the field corner
        let cell = &map.cells[1][1];
        assert_relative_eq!(cell.position.x, -4.25);
        assert_relative_eq!(cell.position.y, -2.75);
    }

    #[test]
    fn position_lookup_clamps_to_the_interior() {
        let map = BallSearchMap::new(9.0, 6.0);

        assert_eq!(map.indices_from_position(Point2::new(0.1, 0.1)), (10, 7));
        // positions beyond the lines map to the outermost interior cells
        assert_eq!(map.indices_from_position(Point2::new(100.0, 100.0)), (18, 12));
        assert_eq!(
            map.indices_from_position(Point2::new(-100.0, -100.0)),
            (1, 1)
        );
    }

    #[test]
    fn head_turned_past_the_shoulder_sees_nothing() {
        let map = BallSearchMap::new(9.0, 6.0);
        let pose = Pose::default();
        let cell = map.cells[12][7];

        assert!(map.is_cell_in_fov(&pose, 0.0, &cell, 9.0, 1.0));
        assert!(!map.is_cell_in_fov(&pose, 1.2, &cell, 9.0, 1.0));
    }
}
