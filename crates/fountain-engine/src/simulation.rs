//! The per-frame driver: advance, collide, age, cull and emit.

use glam::DVec2;
use rand::SeedableRng as _;

use crate::controls::Settings;
use crate::errors::Result;
use crate::integration::IntegrationMethod;
use crate::obstacle::Circle;
use crate::particle::Particle;
use crate::particle_system::{ParticleSystem, DEFAULT_MAX_PARTICLES};
use crate::viewport::Viewport;

/// The outcome of one simulation step. This is everything a renderer needs.
#[derive(serde::Serialize, Debug, Default, Clone, PartialEq)]
#[non_exhaustive]
pub struct Frame {
    /// Positions of all the live particles, in pixels
    pub positions: Vec<DVec2>,
    /// The time step that was actually simulated
    pub time_step: f64,
    /// The integration method that was used
    pub method: IntegrationMethod,
    /// Particles emitted during this step
    pub emitted: usize,
    /// Particles that were due but didn't fit under the particle limit
    pub dropped: usize,
    /// Particles removed for expiring or leaving the viewport
    pub culled: usize,
    /// Particles that bounced off the obstacle
    pub collisions: usize,
    /// Verlet steps that were too short to take, or had to floor a zero previous time step
    pub degenerate_steps: usize,
}

/// Owns the particle system and the optional obstacle, and steps them through time.
#[derive(Debug)]
pub struct Simulation {
    /// The particles and their emitter
    system: ParticleSystem,
    /// The one thing particles can bump into
    obstacle: Option<Circle>,
}

impl Simulation {
    /// A simulation emitting from `emitter`, with entropy-seeded randomness.
    #[must_use]
    pub fn new(emitter: DVec2) -> Self {
        Self::with_rng(
            emitter,
            DEFAULT_MAX_PARTICLES,
            rand::rngs::StdRng::from_entropy(),
        )
    }

    /// A reproducible simulation.
    #[must_use]
    pub fn seeded(emitter: DVec2, seed: u64) -> Self {
        Self::with_rng(
            emitter,
            DEFAULT_MAX_PARTICLES,
            rand::rngs::StdRng::seed_from_u64(seed),
        )
    }

    /// A simulation with full control over the particle limit and randomness.
    #[must_use]
    pub const fn with_rng(
        emitter: DVec2,
        max_particles: usize,
        rng: rand::rngs::StdRng,
    ) -> Self {
        Self {
            system: ParticleSystem::new(emitter, max_particles, rng),
            obstacle: None,
        }
    }

    /// Advance the whole simulation by one frame.
    ///
    /// Every particle is moved with the method in `settings`, bounced off the obstacle, aged
    /// and culled. Only then are new particles emitted, so that dead particles never survive
    /// into an emission pass. A negative or non-finite `dt` is treated as zero.
    pub fn step(&mut self, settings: &Settings, dt: f64, viewport: &Viewport) -> Frame {
        let time_step = sanitise_time_step(dt);

        let (collisions, degenerate_steps) = self.advance(settings.method, time_step);
        let culled = self.system.cull(viewport);

        self.system.accumulate(time_step);
        let emission = self.system.emit(settings);

        if degenerate_steps > 0 {
            tracing::trace!("Held or floored {degenerate_steps} degenerate Verlet time step(s)");
        }

        Frame {
            positions: self.positions(),
            time_step,
            method: settings.method,
            emitted: emission.emitted,
            dropped: emission.dropped,
            culled,
            collisions,
            degenerate_steps,
        }
    }

    /// The current state, without advancing time. For drawing whilst paused.
    #[must_use]
    pub fn frame(&self, method: IntegrationMethod) -> Frame {
        Frame {
            positions: self.positions(),
            method,
            ..Frame::default()
        }
    }

    /// Integrate, collide and age every particle. Returns the number of collisions and the
    /// number of degenerate Verlet steps.
    fn advance(&mut self, method: IntegrationMethod, dt: f64) -> (usize, usize) {
        let obstacle = self.obstacle;
        let mut collisions = 0;
        let mut degenerate_steps = 0;

        for particle in self.system.particles_mut() {
            if method == IntegrationMethod::Verlet
                && (Particle::is_too_short_for_verlet(dt) || particle.history.is_degenerate())
            {
                degenerate_steps += 1;
            }

            let mut new_position = particle.integrate(method, dt);

            let mut is_deflected = false;
            if let Some(circle) = obstacle {
                if let Some(corrected) = circle.deflect(particle, new_position) {
                    new_position = corrected;
                    is_deflected = true;
                    collisions += 1;
                }
            }

            particle.position = new_position;
            particle.alive += dt;

            if method != IntegrationMethod::Verlet || is_deflected {
                particle.reseed_history(dt);
            }
        }

        (collisions, degenerate_steps)
    }

    /// Place the obstacle, replacing any existing one.
    ///
    /// # Errors
    /// When the centre isn't finite or the radius isn't positive.
    pub fn set_obstacle(&mut self, center: DVec2, radius: f64) -> Result<()> {
        let circle = Circle::new(center, radius)?;
        tracing::debug!("Obstacle set at {center} with radius {radius}");
        self.obstacle = Some(circle);
        Ok(())
    }

    /// Remove the obstacle. Collision checks are skipped entirely until a new one is set.
    pub fn clear_obstacle(&mut self) {
        tracing::debug!("Obstacle cleared");
        self.obstacle = None;
    }

    /// The current obstacle, if any.
    #[must_use]
    pub const fn obstacle(&self) -> Option<Circle> {
        self.obstacle
    }

    /// Remove every particle and forget any accumulated emission time.
    pub fn reset(&mut self) {
        tracing::debug!("Resetting simulation");
        self.system.clear();
    }

    /// The particle system.
    #[must_use]
    pub const fn system(&self) -> &ParticleSystem {
        &self.system
    }

    /// All the live particles.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        self.system.particles()
    }

    /// The positions of all the live particles.
    #[must_use]
    pub fn positions(&self) -> Vec<DVec2> {
        self.system
            .particles()
            .iter()
            .map(|particle| particle.position)
            .collect()
    }
}

/// Time can't run backwards.
fn sanitise_time_step(dt: f64) -> f64 {
    if dt.is_finite() && dt >= 0.0 {
        dt
    } else {
        tracing::warn!("Invalid time step ({dt}), treating it as 0");
        0.0
    }
}
