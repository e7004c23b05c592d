//! The user-facing knobs of the simulation, and the per-frame snapshot taken of them.

use crate::errors::{EngineError, Result};
use crate::integration::IntegrationMethod;
use crate::parameter::Parameter;

/// Identifies one of the adjustable parameters.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Knob {
    /// Particles emitted per second
    EmissionRate,
    /// Width of the emission cone, in degrees
    Spread,
    /// How long new particles live for, in seconds
    Lifespan,
    /// Launch speed of new particles, in metres per second
    InitialSpeed,
}

impl Knob {
    /// Short name used in control commands.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EmissionRate => "rate",
            Self::Spread => "spread",
            Self::Lifespan => "lifespan",
            Self::InitialSpeed => "speed",
        }
    }
}

impl std::fmt::Display for Knob {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name())
    }
}

impl std::str::FromStr for Knob {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().as_str() {
            "rate" | "emission_rate" => Ok(Self::EmissionRate),
            "spread" | "angle" => Ok(Self::Spread),
            "lifespan" | "life" => Ok(Self::Lifespan),
            "speed" | "initial_speed" | "velocity" => Ok(Self::InitialSpeed),
            _ => Err(EngineError::InvalidParameterName {
                name: name.to_owned(),
            }),
        }
    }
}

/// A consistent-enough copy of the controls, taken once at the start of every step.
#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "It mirrors the controls one-to-one"
)]
pub struct Settings {
    /// Particles emitted per second
    pub emission_rate: f64,
    /// Width of the emission cone, in degrees
    pub spread_degrees: f64,
    /// How long new particles live for, in seconds
    pub lifespan: f64,
    /// Launch speed of new particles, in metres per second
    pub initial_speed: f64,
    /// The active integration method
    pub method: IntegrationMethod,
}

/// All the parameters that can be changed whilst the simulation runs.
#[derive(Debug, Clone, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "These are exactly the knobs of the simulation"
)]
pub struct Controls {
    /// Particles emitted per second
    pub emission_rate: Parameter,
    /// Width of the emission cone, in degrees
    pub spread: Parameter,
    /// How long new particles live for, in seconds
    pub lifespan: Parameter,
    /// Launch speed of new particles, in metres per second
    pub initial_speed: Parameter,
    /// The active integration method
    pub method: IntegrationMethod,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            emission_rate: Parameter::fixed(1000.0, 0.0, 2200.0, 100.0),
            spread: Parameter::fixed(60.0, 10.0, 360.0, 5.0),
            lifespan: Parameter::fixed(2.0, 0.1, 4.0, 0.1),
            initial_speed: Parameter::fixed(9.5, -2.0, 20.0, 0.5),
            method: IntegrationMethod::default(),
        }
    }
}

impl Controls {
    /// Set every control at once. Each value is clamped to its own bounds independently of
    /// the others.
    pub fn configure(
        &mut self,
        emission_rate: f64,
        spread_degrees: f64,
        lifespan: f64,
        initial_speed: f64,
        method: IntegrationMethod,
    ) -> Settings {
        self.emission_rate.set(emission_rate);
        self.spread.set(spread_degrees);
        self.lifespan.set(lifespan);
        self.initial_speed.set(initial_speed);
        self.method = method;
        tracing::debug!("Controls configured: {:?}", self.snapshot());
        self.snapshot()
    }

    /// Copy the current values.
    #[must_use]
    pub const fn snapshot(&self) -> Settings {
        Settings {
            emission_rate: self.emission_rate.value(),
            spread_degrees: self.spread.value(),
            lifespan: self.lifespan.value(),
            initial_speed: self.initial_speed.value(),
            method: self.method,
        }
    }

    /// Get one of the parameters.
    #[must_use]
    pub const fn parameter(&self, knob: Knob) -> &Parameter {
        match knob {
            Knob::EmissionRate => &self.emission_rate,
            Knob::Spread => &self.spread,
            Knob::Lifespan => &self.lifespan,
            Knob::InitialSpeed => &self.initial_speed,
        }
    }

    /// Get one of the parameters for changing.
    pub fn parameter_mut(&mut self, knob: Knob) -> &mut Parameter {
        match knob {
            Knob::EmissionRate => &mut self.emission_rate,
            Knob::Spread => &mut self.spread,
            Knob::Lifespan => &mut self.lifespan,
            Knob::InitialSpeed => &mut self.initial_speed,
        }
    }

    /// Switch integration method by name. An unknown name leaves the current method in place.
    ///
    /// # Errors
    /// When the name isn't a known integration method.
    pub fn set_method_by_name(&mut self, name: &str) -> Result<IntegrationMethod> {
        match name.parse::<IntegrationMethod>() {
            Ok(method) => {
                self.method = method;
                Ok(method)
            }
            Err(error) => {
                tracing::warn!("Keeping {} integration: {error}", self.method);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot() {
        let settings = Controls::default().snapshot();
        assert!((settings.emission_rate - 1000.0).abs() < f64::EPSILON);
        assert!((settings.spread_degrees - 60.0).abs() < f64::EPSILON);
        assert!((settings.lifespan - 2.0).abs() < f64::EPSILON);
        assert!((settings.initial_speed - 9.5).abs() < f64::EPSILON);
        assert_eq!(settings.method, IntegrationMethod::ExplicitEuler);
    }

    #[test]
    fn configure_clamps_each_value_independently() {
        let mut controls = Controls::default();
        let settings = controls.configure(99_999.0, 1.0, 3.0, -50.0, IntegrationMethod::Verlet);
        assert!((settings.emission_rate - 2200.0).abs() < f64::EPSILON);
        assert!((settings.spread_degrees - 10.0).abs() < f64::EPSILON);
        assert!((settings.lifespan - 3.0).abs() < f64::EPSILON);
        assert!((settings.initial_speed - -2.0).abs() < f64::EPSILON);
        assert_eq!(settings.method, IntegrationMethod::Verlet);
    }

    #[test]
    fn unknown_method_is_kept() {
        let mut controls = Controls::default();
        controls.set_method_by_name("midpoint").unwrap();
        assert!(controls.set_method_by_name("leapfrog").is_err());
        assert_eq!(controls.method, IntegrationMethod::Midpoint);
    }

    #[test]
    fn knobs_by_name() {
        let mut controls = Controls::default();
        let knob: Knob = "speed".parse().unwrap();
        controls.parameter_mut(knob).increment();
        assert!((controls.parameter(Knob::InitialSpeed).value() - 10.0).abs() < f64::EPSILON);
        assert!("gravity".parse::<Knob>().is_err());
    }
}
