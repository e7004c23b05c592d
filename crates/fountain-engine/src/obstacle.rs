//! A static circular obstacle that particles bounce off.

use glam::DVec2;

use crate::errors::{InvalidObstacleSnafu, Result};
use crate::particle::Particle;
use crate::physics::{angle_of, rotated};

/// How far past the boundary, as a multiple of the radius, a colliding particle is pushed out.
/// Anything over 1.0 stops the particle from immediately colliding again.
pub const PUSH_OUT_MULTIPLIER: f64 = 1.1;

/// A forbidden disk in the same coordinate space as the particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Centre of the circle, in pixels
    position: DVec2,
    /// Radius, in pixels
    radius: f64,
}

impl Circle {
    /// Create a new obstacle.
    ///
    /// # Errors
    /// When the centre isn't finite or the radius isn't positive.
    pub fn new(position: DVec2, radius: f64) -> Result<Self> {
        snafu::ensure!(
            position.is_finite() && radius.is_finite() && radius > 0.0,
            InvalidObstacleSnafu {
                x: position.x,
                y: position.y,
                radius,
            }
        );
        Ok(Self { position, radius })
    }

    /// The centre of the circle.
    #[must_use]
    pub const fn position(&self) -> DVec2 {
        self.position
    }

    /// The radius of the circle.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Is the point inside, or on the edge of, the circle?
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        self.position.distance(point) <= self.radius
    }

    /// If `new_position` lands inside the circle, bounce the particle: reflect its velocity
    /// about the tangent at the contact point and return a corrected position just outside the
    /// circle. Returns `None` when there's no collision.
    ///
    /// The reflection is an approximation. Velocity is rotated by twice the angle between it
    /// and the surface normal, which visually repels particles rather than modelling exact
    /// restitution. Head-on hits, where that rotation comes out as a whole turn, are simply
    /// reversed.
    pub fn deflect(&self, particle: &mut Particle, new_position: DVec2) -> Option<DVec2> {
        if !self.contains(new_position) {
            return None;
        }

        let normal = self.outward_normal(particle.position, particle.speed);
        let corrected = self.position + normal * self.radius * PUSH_OUT_MULTIPLIER;

        let unit_speed = particle.speed.normalize_or_zero();
        if unit_speed != DVec2::ZERO {
            let rotation = 2.0 * (angle_of(unit_speed) - angle_of(normal));
            particle.speed = if (rotation / 2.0).sin().abs() < 1e-9 {
                -particle.speed
            } else {
                rotated(particle.speed, rotation)
            };
        }

        Some(corrected)
    }

    /// The unit normal pointing from the centre through the particle's position before it
    /// collided.
    fn outward_normal(&self, position: DVec2, speed: DVec2) -> DVec2 {
        let normal = (position - self.position).normalize_or_zero();
        if normal != DVec2::ZERO {
            return normal;
        }

        let reversed_speed = (-speed).normalize_or_zero();
        if reversed_speed != DVec2::ZERO {
            return reversed_speed;
        }

        DVec2::Y
    }
}
