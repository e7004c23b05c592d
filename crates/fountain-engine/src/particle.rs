//! A single simulated point mass and the integrators that move it.

use glam::DVec2;

use crate::integration::IntegrationMethod;
use crate::physics::{BOOTSTRAP_TIME_STEP, GRAVITY, MIN_TIME_STEP, PIXELS_PER_METRE};

/// The two most recent position samples that Verlet integration extrapolates from.
///
/// Verlet doesn't track velocity directly. Instead it needs the "current" and the "next"
/// positions, plus the time step that separated them, in order to predict the one after. The
/// position that can be displayed in any given frame was therefore already calculated in the
/// previous frame: that one frame lag is part of how the method works.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct VerletHistory {
    /// The confirmed sample.
    pub current: DVec2,
    /// The provisional sample, pending confirmation by the next step.
    pub next: DVec2,
    /// The time step that separated `current` from `next`.
    pub prev_dt: f64,
}

impl VerletHistory {
    /// Seed a history one step ahead of `position`, as if the particle had been moving with
    /// `speed` (in metres per second) under gravity for `time_step` seconds. A time step too
    /// short to divide by uses the bootstrap step instead.
    #[must_use]
    pub fn seeded(position: DVec2, speed: DVec2, time_step: f64) -> Self {
        let dt = if time_step >= MIN_TIME_STEP {
            time_step
        } else {
            BOOTSTRAP_TIME_STEP
        };

        Self {
            current: position,
            next: position
                + speed * PIXELS_PER_METRE * dt
                + GRAVITY * PIXELS_PER_METRE * (dt * dt * 0.5),
            prev_dt: dt,
        }
    }

    /// Would the Verlet correction have to divide by a zero or negative time step?
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.prev_dt.is_nan() || self.prev_dt < MIN_TIME_STEP
    }

    /// The previous time step, floored so that it's always safe to divide by.
    fn guarded_prev_dt(&self) -> f64 {
        if self.is_degenerate() {
            tracing::trace!(
                "Flooring degenerate previous time step ({}) to {MIN_TIME_STEP}",
                self.prev_dt
            );
            MIN_TIME_STEP
        } else {
            self.prev_dt
        }
    }
}

/// One simulated point mass.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Where the particle is currently displayed, in pixels.
    pub position: DVec2,
    /// Position samples for Verlet integration.
    pub history: VerletHistory,
    /// Velocity in metres per second.
    pub speed: DVec2,
    /// How many seconds the particle may live for.
    pub lifespan: f64,
    /// How many seconds the particle has been alive for.
    pub alive: f64,
}

impl Particle {
    /// Create a particle from its raw parts.
    #[must_use]
    pub const fn new(position: DVec2, history: VerletHistory, speed: DVec2, lifespan: f64) -> Self {
        Self {
            position,
            history,
            speed,
            lifespan,
            alive: 0.0,
        }
    }

    /// A freshly emitted particle, with its Verlet history seeded one bootstrap step ahead so
    /// that Verlet needs no special case for brand new particles.
    #[must_use]
    pub fn emit(position: DVec2, speed: DVec2, lifespan: f64) -> Self {
        let history = VerletHistory::seeded(position, speed, BOOTSTRAP_TIME_STEP);
        Self::new(position, history, speed, lifespan)
    }

    /// Has the particle outlived its lifespan?
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.alive >= self.lifespan
    }

    /// Calculate the particle's next position with the given method. The position itself isn't
    /// changed, but the method's own state (velocity or Verlet history) is.
    pub fn integrate(&mut self, method: IntegrationMethod, dt: f64) -> DVec2 {
        match method {
            IntegrationMethod::ExplicitEuler => self.explicit_euler(dt),
            IntegrationMethod::Midpoint => self.explicit_midpoint(dt),
            IntegrationMethod::Verlet => self.verlet(dt),
        }
    }

    /// Semi-implicit Euler. Velocity is updated before position:
    ///
    /// ```text
    /// v(t+h) = v(t) + h*g
    /// p(t+h) = p(t) + h*v(t+h)
    /// ```
    pub fn explicit_euler(&mut self, dt: f64) -> DVec2 {
        self.speed += GRAVITY * dt;
        self.position + self.speed * dt * PIXELS_PER_METRE
    }

    /// Explicit midpoint, as two half steps that each update velocity before position.
    pub fn explicit_midpoint(&mut self, dt: f64) -> DVec2 {
        let half = dt * 0.5;

        self.speed += GRAVITY * half;
        let midpoint = self.position + self.speed * half * PIXELS_PER_METRE;

        self.speed += GRAVITY * half;
        midpoint + self.speed * half * PIXELS_PER_METRE
    }

    /// Verlet with a variable time step correction:
    ///
    /// ```text
    /// p(t+h) = p(t) + (p(t) - p(t-h'))*(h/h') + g*((h + h')*h/2)
    /// ```
    ///
    /// Returns the *previously* predicted position, then shuffles the history along by one
    /// sample. The particle's velocity is re-derived from the new history so that switching to
    /// another method carries on smoothly.
    ///
    /// A step shorter than [`MIN_TIME_STEP`] can't be extrapolated from, so it leaves both the
    /// particle and its history where they are.
    pub fn verlet(&mut self, dt: f64) -> DVec2 {
        if Self::is_too_short_for_verlet(dt) {
            return self.position;
        }

        let prev_dt = self.history.guarded_prev_dt();
        let current = self.history.current;
        let next = self.history.next;

        let candidate = next
            + (next - current) * (dt / prev_dt)
            + GRAVITY * PIXELS_PER_METRE * ((dt + prev_dt) * dt / 2.0);

        self.history = VerletHistory {
            current: next,
            next: candidate,
            prev_dt: dt,
        };

        self.speed = (candidate - next) / (dt * PIXELS_PER_METRE);

        next
    }

    /// Would a Verlet step of `dt` be held rather than taken?
    #[must_use]
    pub fn is_too_short_for_verlet(dt: f64) -> bool {
        dt.is_nan() || dt < MIN_TIME_STEP
    }

    /// Re-seed the Verlet history from the particle's committed position and velocity. Needed
    /// whenever something other than Verlet itself has moved the particle.
    pub fn reseed_history(&mut self, dt: f64) {
        self.history = VerletHistory::seeded(self.position, self.speed, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(actual: DVec2, expected: DVec2) {
        assert!(
            actual.distance(expected) < 1e-9,
            "Expected {expected:?}, got {actual:?}"
        );
    }

    fn particle(position: DVec2, next: DVec2, speed: DVec2, prev_dt: f64) -> Particle {
        let history = VerletHistory {
            current: position,
            next,
            prev_dt,
        };
        Particle::new(position, history, speed, 10.0)
    }

    #[test]
    fn initialisation() {
        let particle = particle(DVec2::ZERO, DVec2::ZERO, DVec2::new(0.0, 10.0), 0.0);
        assert_eq!(particle.position, DVec2::ZERO);
        assert_eq!(particle.history.next, DVec2::ZERO);
        assert_eq!(particle.speed, DVec2::new(0.0, 10.0));
        assert!((particle.lifespan - 10.0).abs() < f64::EPSILON);
        assert!(particle.alive.abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_euler() {
        let mut particle = particle(DVec2::ZERO, DVec2::ZERO, DVec2::new(0.0, 10.0), 0.0);

        particle.position = particle.explicit_euler(1.0);
        assert_near(particle.speed, DVec2::new(0.0, 0.189_999_999_999_999_5));
        assert_near(particle.position, DVec2::new(0.0, 18.999_999_999_999_95));

        particle.position = particle.explicit_euler(0.0);
        assert_near(particle.speed, DVec2::new(0.0, 0.189_999_999_999_999_5));
        assert_near(particle.position, DVec2::new(0.0, 18.999_999_999_999_95));
    }

    #[test]
    fn explicit_euler_falls_monotonically() {
        let mut particle = particle(DVec2::ZERO, DVec2::ZERO, DVec2::new(3.0, 0.0), 0.0);
        let mut previous = particle.position;
        for _ in 0..50 {
            particle.position = particle.explicit_euler(0.016);
            assert!(particle.position.y < previous.y);
            previous = particle.position;
        }
    }

    #[test]
    fn explicit_midpoint() {
        let mut particle = particle(DVec2::ZERO, DVec2::ZERO, DVec2::new(0.0, 10.0), 0.0);
        let position = particle.explicit_midpoint(1.0);

        // v = 5.095, p = 254.75, then v = 0.19, p = 254.75 + 9.5
        assert_near(particle.speed, DVec2::new(0.0, 0.19));
        assert_near(position, DVec2::new(0.0, 264.25));
    }

    #[test]
    fn midpoint_is_closer_to_the_parabola_than_euler() {
        let initial_speed = DVec2::new(1.0, 5.0);
        let mut euler = particle(DVec2::ZERO, DVec2::ZERO, initial_speed, 0.0);
        let mut midpoint = euler.clone();
        let dt = 0.1;
        for _ in 0..10 {
            euler.position = euler.explicit_euler(dt);
            midpoint.position = midpoint.explicit_midpoint(dt);
        }

        // p = (v*t + g*t^2/2) * ppm
        let exact = (initial_speed + GRAVITY * 0.5) * PIXELS_PER_METRE;
        assert!(midpoint.position.distance(exact) < euler.position.distance(exact));
        assert_near(midpoint.speed, euler.speed);
    }

    #[test]
    fn verlet_returns_the_previous_prediction() {
        let mut particle = particle(DVec2::ZERO, DVec2::new(0.0, 1.0), DVec2::ZERO, 1.0);

        particle.position = particle.verlet(1.0);
        assert_near(particle.position, DVec2::new(0.0, 1.0));
        assert_near(particle.history.next, DVec2::new(0.0, -979.0));

        particle.position = particle.verlet(1.0);
        assert_near(particle.position, DVec2::new(0.0, -979.0));
        assert_near(particle.history.next, DVec2::new(0.0, -2940.0));
        assert_near(particle.history.current, DVec2::new(0.0, -979.0));
    }

    #[test]
    fn verlet_guards_a_zero_previous_step() {
        let mut particle = particle(DVec2::ZERO, DVec2::ZERO, DVec2::ZERO, 0.0);
        assert!(particle.history.is_degenerate());

        let position = particle.verlet(0.01);
        assert!(position.is_finite());
        assert!(particle.history.next.is_finite());
        assert!(!particle.history.is_degenerate());
    }

    #[test]
    fn verlet_holds_still_for_a_zero_step() {
        let mut particle = Particle::emit(DVec2::new(10.0, 10.0), DVec2::new(3.0, 5.0), 2.0);
        particle.position = particle.verlet(0.01);
        let before = particle.clone();

        let position = particle.verlet(0.0);

        assert_eq!(position, before.position);
        assert_eq!(particle, before);
    }

    #[test]
    fn verlet_keeps_its_momentum_through_short_steps() {
        let mut steady = Particle::emit(DVec2::new(10.0, 10.0), DVec2::new(3.0, 5.0), 2.0);
        for _ in 0..10 {
            steady.position = steady.verlet(0.01);
        }
        let mut interrupted = steady.clone();

        for dt in [0.0, 1e-9, 5e-7] {
            interrupted.position = interrupted.verlet(dt);
        }
        for _ in 0..10 {
            steady.position = steady.verlet(0.01);
            interrupted.position = interrupted.verlet(0.01);
        }

        assert_near(interrupted.position, steady.position);
        assert_near(interrupted.speed, steady.speed);
        assert!(interrupted.speed.x > 2.9);
    }

    #[test]
    fn history_seeded_from_a_short_step_uses_the_bootstrap_step() {
        let history = VerletHistory::seeded(DVec2::ZERO, DVec2::new(0.0, 1.0), 1e-9);
        assert!((history.prev_dt - BOOTSTRAP_TIME_STEP).abs() < f64::EPSILON);
        assert!(!history.is_degenerate());
    }

    #[test]
    fn emitted_history_is_one_bootstrap_step_ahead() {
        let particle = Particle::emit(DVec2::new(100.0, 100.0), DVec2::new(0.0, 10.0), 2.0);
        let dt = BOOTSTRAP_TIME_STEP;
        let expected_y = 100.0 + 10.0 * PIXELS_PER_METRE * dt - 9.81 * PIXELS_PER_METRE * dt * dt / 2.0;
        assert_near(particle.history.current, DVec2::new(100.0, 100.0));
        assert_near(particle.history.next, DVec2::new(100.0, expected_y));
        assert!((particle.history.prev_dt - dt).abs() < f64::EPSILON);
    }

    #[test]
    fn verlet_derives_velocity() {
        let mut particle = Particle::emit(DVec2::ZERO, DVec2::new(2.0, 0.0), 2.0);
        particle.position = particle.verlet(BOOTSTRAP_TIME_STEP);
        assert!((particle.speed.x - 2.0).abs() < 1e-9);
        assert!(particle.speed.y < 0.0);
    }

    #[test]
    fn expiry() {
        let mut particle = Particle::emit(DVec2::ZERO, DVec2::ZERO, 1.0);
        assert!(!particle.is_expired());
        particle.alive = 1.0;
        assert!(particle.is_expired());
    }
}
