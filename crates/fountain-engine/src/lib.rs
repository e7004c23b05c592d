//! # Fountain Engine
//! A 2D particle fountain simulated purely in memory.
//!
//! Particles are emitted from a single point at a configurable rate, advanced every frame under
//! gravity by one of three interchangeable integrators, optionally bounced off a circular
//! obstacle, and culled once they expire or leave the viewport.
//!
//! The main entrypoint is [`Simulation`], which is stepped once per frame with a [`Settings`]
//! snapshot taken from the user-facing [`Controls`]. Rendering is left entirely to the caller:
//! every step returns a [`Frame`] with the positions of all the live particles.

#![expect(clippy::pub_use, reason = "How else are you supposed re-export??")]

pub mod controls;
pub mod errors;
pub mod integration;
pub mod obstacle;
pub mod parameter;
pub mod particle;
pub mod particle_system;
pub mod physics;
pub mod simulation;
pub mod viewport;

pub use controls::{Controls, Knob, Settings};
pub use errors::{EngineError, Result};
pub use glam::DVec2;
pub use integration::IntegrationMethod;
pub use obstacle::Circle;
pub use parameter::Parameter;
pub use particle::{Particle, VerletHistory};
pub use particle_system::ParticleSystem;
pub use simulation::{Frame, Simulation};
pub use viewport::Viewport;
