//! Errors for this library

/// All the known errors returned by this crate.
///
/// None of these are fatal to a running simulation. They are only ever returned at the edges,
/// when something from the outside world (a config file, a control command) is turned into
/// engine types.
#[derive(Debug, snafu::Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum EngineError {
    #[snafu(display("Unknown method of position integration: {name:?}"))]
    /// The requested integration method isn't one of the known methods.
    InvalidIntegrationMethod {
        /// What was asked for
        name: String,
    },

    #[snafu(display("Unknown parameter: {name:?}"))]
    /// There's no adjustable parameter with this name.
    InvalidParameterName {
        /// What was asked for
        name: String,
    },

    #[snafu(display(
        "Invalid parameter bounds: min ({min}), max ({max}) and step ({step}) must be finite, \
         with min no greater than max and a non-negative step"
    ))]
    /// A parameter's bounds can't hold any value.
    InvalidParameter {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
        /// Increment size
        step: f64,
    },

    #[snafu(display("Invalid obstacle at ({x}, {y}) with radius {radius}"))]
    /// An obstacle needs a finite centre and a positive radius.
    InvalidObstacle {
        /// Horizontal centre
        x: f64,
        /// Vertical centre
        y: f64,
        /// Radius in pixels
        radius: f64,
    },
}

/// Convenience alias for results from this crate.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
