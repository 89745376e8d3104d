//! Compass heading from two magnetometer axes
//!
//! The chip's X axis points to the reference direction and its Y axis 90°
//! counter-clockwise from it, while a compass bearing grows clockwise. The
//! heading is therefore `atan2(-y, x)`, folded into `[0, 360)`.

use core::f64::consts::PI;

/// Convert radians to degrees
#[must_use]
pub fn radians_to_degrees(radians: f64) -> f64 {
    radians * (180.0 / PI)
}

/// Compute the bearing of the `(x, y)` field vector in degrees, `[0, 360)`
///
/// `(0, 0)` has no direction and maps to 0°.
///
/// # Example
///
/// ```
/// use hmc5883::compute_vector_angle;
///
/// let east = compute_vector_angle(0, -1);
/// assert!((east - 90.0).abs() < 1e-9);
///
/// let west = compute_vector_angle(0, 1);
/// assert!((west - 270.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn compute_vector_angle(x: i16, y: i16) -> f64 {
    let mut degrees = radians_to_degrees(libm::atan2(-f64::from(y), f64::from(x)));
    if degrees < 0.0 {
        degrees += 360.0;
    }
    // Rounding can land exactly on 360 for tiny negative angles
    if degrees >= 360.0 {
        degrees -= 360.0;
    }
    // Normalise -0.0 from atan2(-0.0, +x)
    degrees + 0.0
}
