use std::f32::consts::PI;

/// Normalizes an angle into `(-PI, PI]`.
#[must_use]
pub fn normalize(mut angle: f32) -> f32 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// The absolute difference between two angles, accounting for wraparound.
#[must_use]
pub fn difference(a: f32, b: f32) -> f32 {
    normalize(a - b).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalize_wraps_into_range() {
        assert_relative_eq!(normalize(3.0 * PI), PI);
        assert_relative_eq!(normalize(-3.0 * PI), PI);
        assert_relative_eq!(normalize(0.5), 0.5);
    }

    #[test]
    fn difference_takes_the_short_way() {
        assert_relative_eq!(difference(PI - 0.1, -PI + 0.1), 0.2, epsilon = 1e-6);
        assert_relative_eq!(difference(0.25, -0.25), 0.5);
    }
}
