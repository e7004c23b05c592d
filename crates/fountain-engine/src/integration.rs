//! The closed set of position integration methods.

use crate::errors::{EngineError, InvalidIntegrationMethodSnafu};

/// How particle positions are advanced through time. Exactly one method is active for the whole
/// simulation at any one time.
#[derive(
    serde::Serialize, serde::Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// Semi-implicit Euler: velocity first, then position.
    #[default]
    #[serde(alias = "euler")]
    ExplicitEuler,
    /// Two half steps, each updating velocity before position.
    #[serde(alias = "mid_point")]
    Midpoint,
    /// Position Verlet with a correction for variable time steps.
    Verlet,
}

impl IntegrationMethod {
    /// Every method, in the order they're usually presented.
    pub const ALL: [Self; 3] = [Self::ExplicitEuler, Self::Midpoint, Self::Verlet];

    /// The canonical name, as used in config files and control commands.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ExplicitEuler => "explicit_euler",
            Self::Midpoint => "midpoint",
            Self::Verlet => "verlet",
        }
    }
}

impl std::fmt::Display for IntegrationMethod {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name())
    }
}

impl std::str::FromStr for IntegrationMethod {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalised = name.trim().to_lowercase().replace(['-', ' '], "_");
        match normalised.as_str() {
            "explicit_euler" | "euler" | "0" => Ok(Self::ExplicitEuler),
            "midpoint" | "mid_point" | "explicit_midpoint" | "1" => Ok(Self::Midpoint),
            "verlet" | "2" => Ok(Self::Verlet),
            _ => InvalidIntegrationMethodSnafu { name }.fail(),
        }
    }
}
