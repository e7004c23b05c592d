//! Physical constants and the little bits of vector maths shared by the integrators.

use glam::DVec2;

/// Standard gravity, in metres per second squared. Positive `y` is up.
pub const GRAVITY: DVec2 = DVec2::new(0.0, -9.81);

/// How many display pixels make up one simulated metre.
pub const PIXELS_PER_METRE: f64 = 100.0;

/// The synthetic previous time step used to seed a particle's Verlet history when there is no
/// real previous step, for example at emission.
pub const BOOTSTRAP_TIME_STEP: f64 = 0.002;

/// The smallest previous time step the Verlet correction will divide by.
pub const MIN_TIME_STEP: f64 = 1e-6;

/// Rotate a vector counter-clockwise by `angle` radians.
#[must_use]
pub fn rotated(vector: DVec2, angle: f64) -> DVec2 {
    DVec2::from_angle(angle).rotate(vector)
}

/// The angle of a vector from the positive `x` axis, in radians.
#[must_use]
pub fn angle_of(vector: DVec2) -> f64 {
    vector.y.atan2(vector.x)
}
