//! A bounded, steppable scalar that drives one simulation knob.

use crate::errors::{InvalidParameterSnafu, Result};

/// A single user-adjustable value that can never leave its `[min, max]` range.
///
/// Requests that would breach the bounds aren't errors, they're just clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    /// The current value
    value: f64,
    /// Lowest allowed value
    min: f64,
    /// Highest allowed value
    max: f64,
    /// How much a single increment or decrement changes the value
    step: f64,
}

impl Parameter {
    /// Create a new parameter. The initial value is clamped into the bounds.
    ///
    /// # Errors
    /// When the bounds are non-finite or inverted, or the step is negative.
    pub fn new(value: f64, min: f64, max: f64, step: f64) -> Result<Self> {
        snafu::ensure!(
            min.is_finite() && max.is_finite() && step.is_finite() && min <= max && step >= 0.0,
            InvalidParameterSnafu { min, max, step }
        );

        let mut parameter = Self {
            value: min,
            min,
            max,
            step,
        };
        parameter.set(value);
        Ok(parameter)
    }

    /// A parameter with built-in bounds, already known to be valid. `value` must be in range.
    pub(crate) const fn fixed(value: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            value,
            min,
            max,
            step,
        }
    }

    /// The current value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// The lower bound.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// The upper bound.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// The increment size.
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// Step the value up, saturating at `max`. Returns the new value.
    pub fn increment(&mut self) -> f64 {
        self.set(self.value + self.step)
    }

    /// Step the value down, saturating at `min`. Returns the new value.
    pub fn decrement(&mut self) -> f64 {
        self.set(self.value - self.step)
    }

    /// Set an arbitrary value, clamped to the bounds. Non-finite values are ignored. Returns the
    /// new value.
    pub fn set(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            self.value = value.clamp(self.min, self.max);
        } else {
            tracing::warn!("Ignoring non-finite parameter value: {value}");
        }
        self.value
    }

    /// Is the value sitting on its lower bound?
    #[must_use]
    pub fn is_at_min(&self) -> bool {
        self.value <= self.min
    }

    /// Is the value sitting on its upper bound?
    #[must_use]
    pub fn is_at_max(&self) -> bool {
        self.value >= self.max
    }
}
