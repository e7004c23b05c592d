//! The particle collection, along with emitting new particles and culling dead ones.

use glam::DVec2;
use rand::Rng as _;

use crate::controls::Settings;
use crate::particle::Particle;
use crate::physics::rotated;
use crate::viewport::Viewport;

/// The default limit on live particles.
pub const DEFAULT_MAX_PARTICLES: usize = 20_000;

/// Rounding slack, in particles, when counting how many are due. Summing many frame times
/// drifts by far less than this.
const EMISSION_TOLERANCE: f64 = 1e-9;

/// The direction particles are fired in before the random spread is applied.
pub const BASE_DIRECTION: DVec2 = DVec2::Y;

/// What happened during one emission pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Emission {
    /// Particles added to the system
    pub emitted: usize,
    /// Particles that were due but didn't fit under the particle limit
    pub dropped: usize,
}

/// Owns all the particles and the point they're emitted from.
#[derive(Debug)]
pub struct ParticleSystem {
    /// The emission point, in pixels
    position: DVec2,
    /// All the live particles
    particles: Vec<Particle>,
    /// Elapsed time that hasn't yet been spent on emitting particles
    budget: f64,
    /// Hard limit on the number of live particles
    max_particles: usize,
    /// Source of the random spread
    rng: rand::rngs::StdRng,
}

impl ParticleSystem {
    /// Create an empty system.
    #[must_use]
    pub const fn new(position: DVec2, max_particles: usize, rng: rand::rngs::StdRng) -> Self {
        Self {
            position,
            particles: Vec::new(),
            budget: 0.0,
            max_particles,
            rng,
        }
    }

    /// The emission point.
    #[must_use]
    pub const fn position(&self) -> DVec2 {
        self.position
    }

    /// All the live particles.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// All the live particles, for advancing.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// The number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Are there no live particles?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Time accumulated towards the next emission.
    #[must_use]
    pub const fn budget(&self) -> f64 {
        self.budget
    }

    /// Add elapsed time to the emission budget.
    pub fn accumulate(&mut self, dt: f64) {
        self.budget += dt;
    }

    /// Spend the emission budget on new particles, one for every `1 / rate` seconds of it.
    ///
    /// The number due is counted in whole particles, so a slow frame can emit several and the
    /// total doesn't depend on how the elapsed time was split into frames. Without a positive
    /// rate the budget is discarded, otherwise raising the rate later would release everything
    /// that built up in the meantime.
    pub fn emit(&mut self, settings: &Settings) -> Emission {
        let mut emission = Emission::default();
        if settings.emission_rate <= 0.0 || !settings.emission_rate.is_finite() {
            self.budget = 0.0;
            return emission;
        }

        let whole_particles = (self.budget * settings.emission_rate + EMISSION_TOLERANCE).floor();
        if whole_particles < 1.0 {
            return emission;
        }
        self.budget -= whole_particles / settings.emission_rate;

        #[expect(
            clippy::as_conversions,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "It's a positive whole number, and saturating is fine for absurd frames"
        )]
        let due = whole_particles as usize;
        let room = self.max_particles.saturating_sub(self.particles.len());
        emission.emitted = due.min(room);
        emission.dropped = due - emission.emitted;

        for _ in 0..emission.emitted {
            let particle = self.new_particle(settings);
            self.particles.push(particle);
        }

        if emission.dropped > 0 {
            tracing::debug!(
                "Particle limit ({}) reached, dropped {} particle(s)",
                self.max_particles,
                emission.dropped
            );
        }

        emission
    }

    /// A new particle fired from the emission point, in a random direction within the spread.
    fn new_particle(&mut self, settings: &Settings) -> Particle {
        let spread = settings.spread_degrees.to_radians();
        let angle = (self.rng.gen::<f64>() - 0.5) * spread;
        let speed = rotated(BASE_DIRECTION * settings.initial_speed, angle);
        Particle::emit(self.position, speed, settings.lifespan)
    }

    /// Remove every particle that has expired or left the viewport. The order of the survivors
    /// is kept. Returns how many were removed.
    pub fn cull(&mut self, viewport: &Viewport) -> usize {
        let before = self.particles.len();
        self.particles
            .retain(|particle| !particle.is_expired() && viewport.retains(particle.position));
        before - self.particles.len()
    }

    /// Remove every particle and forget any accumulated emission time.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.budget = 0.0;
    }
}
