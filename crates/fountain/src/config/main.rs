//! All of the user config for Fountain.

use color_eyre::eyre::{ContextCompat as _, Result, WrapErr as _};
use fountain_engine::{Circle, Controls, DVec2, IntegrationMethod, Knob, Parameter, Viewport};

/// A copy of the default config file. It gets copied to the user's config folder the first time
/// they start Fountain.
static DEFAULT_CONFIG: &str = include_str!("../../default_config.toml");

/// The valid log levels. Based on our `tracing` crate.
#[derive(serde::Serialize, serde::Deserialize, clap::ValueEnum, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LogLevel {
    /// Error
    Error,
    /// Warnings
    Warn,
    /// Info
    Info,
    /// Debug
    Debug,
    /// Trace
    Trace,
    /// No logging
    Off,
}

/// Managing user config.
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct Config {
    /// The maximum log level
    pub log_level: LogLevel,
    /// The location of the log file.
    pub log_path: std::path::PathBuf,
    /// Target frame rate
    pub frame_rate: u32,
    /// Hard limit on the number of live particles
    pub max_particles: usize,
    /// The integration method to start with
    pub integration_method: IntegrationMethod,
    /// Seed for the random number generator. Random when not set.
    pub seed: Option<u64>,
    /// The visible area
    pub viewport: ViewportConfig,
    /// Where particles are emitted from
    pub emitter: Point,
    /// The circle that particles bounce off
    pub obstacle: ObstacleConfig,
    /// Starting values and bounds of the live-adjustable parameters
    pub parameters: ParametersConfig,
}

impl Default for Config {
    fn default() -> Self {
        let log_directory = match dirs::state_dir() {
            Some(directory) => directory,
            None => std::path::PathBuf::new().join("./"),
        };
        let log_path = log_directory.join("fountain").join("fountain.log");

        Self {
            log_level: LogLevel::Off,
            log_path,
            frame_rate: 200,
            max_particles: fountain_engine::particle_system::DEFAULT_MAX_PARTICLES,
            integration_method: IntegrationMethod::default(),
            seed: None,
            viewport: ViewportConfig::default(),
            emitter: Point { x: 672.0, y: 192.0 },
            obstacle: ObstacleConfig::default(),
            parameters: ParametersConfig::default(),
        }
    }
}

/// Size of the visible area, in pixels.
#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub(crate) struct ViewportConfig {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

/// A point in pixels, with the origin at the bottom-left.
#[derive(serde::Deserialize, Debug, Default, Clone, Copy, PartialEq)]
#[serde(default)]
pub(crate) struct Point {
    /// Horizontal
    pub x: f64,
    /// Vertical
    pub y: f64,
}

/// Config for the obstacle.
#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub(crate) struct ObstacleConfig {
    /// Whether there's an obstacle at all
    pub enabled: bool,
    /// Horizontal centre
    pub x: f64,
    /// Vertical centre
    pub y: f64,
    /// Radius
    pub radius: f64,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            x: 412.0,
            y: 400.0,
            radius: 50.0,
        }
    }
}

/// One adjustable parameter. Anything not set falls back to the built-in value for that
/// parameter.
#[derive(serde::Deserialize, Debug, Default, Clone, Copy, PartialEq)]
#[serde(default)]
pub(crate) struct ParameterConfig {
    /// Starting value
    pub value: Option<f64>,
    /// Lower bound
    pub min: Option<f64>,
    /// Upper bound
    pub max: Option<f64>,
    /// How much `+` and `-` change the value by
    pub step: Option<f64>,
}

impl ParameterConfig {
    /// Merge with the built-in defaults and validate.
    fn to_parameter(self, defaults: &Parameter, knob: Knob) -> Result<Parameter> {
        Parameter::new(
            self.value.unwrap_or_else(|| defaults.value()),
            self.min.unwrap_or_else(|| defaults.min()),
            self.max.unwrap_or_else(|| defaults.max()),
            self.step.unwrap_or_else(|| defaults.step()),
        )
        .wrap_err_with(|| format!("Bad config for the `{knob}` parameter"))
    }
}

/// All the adjustable parameters.
#[derive(serde::Deserialize, Debug, Default, Clone, Copy, PartialEq)]
#[serde(default)]
pub(crate) struct ParametersConfig {
    /// Particles per second
    pub emission_rate: ParameterConfig,
    /// Width of the emission cone, in degrees
    pub spread: ParameterConfig,
    /// Lifespan of new particles, in seconds
    pub lifespan: ParameterConfig,
    /// Launch speed of new particles, in metres per second
    pub initial_speed: ParameterConfig,
}

impl ParametersConfig {
    /// Get the config for one parameter.
    const fn get(&self, knob: Knob) -> ParameterConfig {
        match knob {
            Knob::EmissionRate => self.emission_rate,
            Knob::Spread => self.spread,
            Knob::Lifespan => self.lifespan,
            Knob::InitialSpeed => self.initial_speed,
        }
    }
}

impl Config {
    /// Canonical path to the config directory.
    pub async fn directory(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> std::path::PathBuf {
        state.config_path.read().await.clone()
    }

    /// Get the stable location of Fountain's config directory on the user's system.
    pub fn default_directory() -> Result<std::path::PathBuf> {
        Ok(dirs::config_dir()
            .context("Couldn't get standard config directory")?
            .join("fountain"))
    }

    /// Figure out where our config is being stored, and create the directory if needed.
    pub async fn setup_directory(
        maybe_custom_path: Option<std::path::PathBuf>,
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> Result<()> {
        let path = match maybe_custom_path {
            None => Self::default_directory()?,
            Some(path_string) => std::path::PathBuf::new().join(path_string),
        };

        std::fs::create_dir_all(path.clone())?;
        *state.config_path.write().await = path;

        Ok(())
    }

    /// Canonical path to the main config file.
    pub async fn main_config_path(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> std::path::PathBuf {
        let directory = Self::directory(state).await;
        let main_config_file = state.main_config_file.read().await.clone();
        directory.join(main_config_file)
    }

    /// Load the main config
    pub async fn load(state: &std::sync::Arc<crate::shared_state::SharedState>) -> Result<Self> {
        let config_path = Self::main_config_path(state).await;
        let config_file_name = config_path
            .file_name()
            .context("Couldn't get file name from config path")?;
        let is_default_config = config_file_name == crate::cli_args::DEFAULT_CONFIG_FILE_NAME;
        if is_default_config && !config_path.exists() {
            std::fs::write(config_path.clone(), DEFAULT_CONFIG)?;
        }

        tracing::info!("Loading the main Fountain config from: {config_path:?}");
        let result = std::fs::read_to_string(config_path.clone());
        match result {
            Ok(data) => {
                tracing::trace!("Using config file:\n{data}");
                let config = toml::from_str::<Self>(&data)?;
                config.validate()?;
                Ok(config)
            }
            Err(err) => {
                tracing::error!("Loading config: {err:?}");
                color_eyre::eyre::bail!(
                    "Couldn't load config at {config_path:?}: {}",
                    err.to_string()
                );
            }
        }
    }

    /// Load the main config, and everything derived from it, into the shared state.
    pub async fn load_config_into_shared_state(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> Result<Self> {
        let new_config = Self::load(state).await?;

        *state.controls.write().await = new_config.controls()?;
        *state.obstacle.write().await = new_config.obstacle()?;
        *state.config.write().await = new_config.clone();

        Ok(new_config)
    }

    /// Catch anything that would make for a nonsensical simulation.
    fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            color_eyre::eyre::bail!("`frame_rate` must be more than 0");
        }

        let ViewportConfig { width, height } = self.viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            color_eyre::eyre::bail!("Viewport must have a positive size, got {width}x{height}");
        }

        let Point { x, y } = self.emitter;
        if !(0.0..=width).contains(&x) || !(0.0..=height).contains(&y) {
            color_eyre::eyre::bail!(
                "The emitter ({x}, {y}) must be inside the {width}x{height} viewport"
            );
        }

        self.controls()?;
        self.obstacle()?;

        Ok(())
    }

    /// The controls, with their configured starting values and bounds.
    pub fn controls(&self) -> Result<Controls> {
        let defaults = Controls::default();
        let parameter = |knob: Knob| {
            self.parameters
                .get(knob)
                .to_parameter(defaults.parameter(knob), knob)
        };

        Ok(Controls {
            emission_rate: parameter(Knob::EmissionRate)?,
            spread: parameter(Knob::Spread)?,
            lifespan: parameter(Knob::Lifespan)?,
            initial_speed: parameter(Knob::InitialSpeed)?,
            method: self.integration_method,
        })
    }

    /// The configured obstacle, if it's enabled.
    pub fn obstacle(&self) -> Result<Option<Circle>> {
        let ObstacleConfig {
            enabled,
            x,
            y,
            radius,
        } = self.obstacle;
        if !enabled {
            return Ok(None);
        }

        let circle = Circle::new(DVec2::new(x, y), radius).wrap_err("Bad `obstacle` config")?;
        Ok(Some(circle))
    }

    /// The area that particles must stay inside.
    pub const fn viewport(&self) -> Viewport {
        Viewport::with_width(self.viewport.width)
    }

    /// Where particles are emitted from.
    pub const fn emitter(&self) -> DVec2 {
        DVec2::new(self.emitter.x, self.emitter.y)
    }
}
