use nalgebra::Point2;

/// Whether `point` lies inside the axis-aligned ellipse around `center` with the given
/// semi-axes, scaled by `factor`.
#[must_use]
pub fn is_inside_ellipse(
    point: Point2<f32>,
    center: Point2<f32>,
    semi_axis_x: f32,
    semi_axis_y: f32,
    factor: f32,
) -> bool {
    let dx = (point.x - center.x) / (semi_axis_x * factor);
    let dy = (point.y - center.y) / (semi_axis_y * factor);
    dx * dx + dy * dy < 1.0
}

/// Clamps `value` into `[min, max]`.
#[must_use]
pub fn clip(value: f32, min: f32, max: f32) -> f32 {
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipse_membership() {
        let center = Point2::new(4.5, 3.0);
        assert!(is_inside_ellipse(
            Point2::new(4.0, 3.0),
            center,
            1.0,
            0.5,
            1.0
        ));
        assert!(!is_inside_ellipse(
            Point2::new(4.5, 2.4),
            center,
            1.0,
            0.5,
            1.0
        ));
        // scaling the ellipse pulls the same point inside
        assert!(is_inside_ellipse(
            Point2::new(4.5, 2.4),
            center,
            1.0,
            0.5,
            1.5
        ));
    }
}
