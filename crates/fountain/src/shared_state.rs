//! Here we store all the shared data that the simulator and the control surface use.
//! Access is mediated with locks to support asynchronicity

use std::sync::Arc;

use tokio::sync::RwLock;

/// Whether the simulation is advancing. Mirrors the play, pause and stop buttons of a media
/// player.
#[derive(serde::Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RunState {
    /// Stepping every frame
    #[default]
    Playing,
    /// Frozen in place. Time that passes whilst paused isn't simulated.
    Paused,
    /// All particles removed and no emission
    Stopped,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        formatter.write_str(name)
    }
}

/// Performance figures from the simulator.
#[derive(serde::Serialize, Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct Stats {
    /// Frames simulated so far
    pub frames: u64,
    /// Average frames per second over recent frames
    pub fps: f64,
    /// Number of live particles
    pub particles: usize,
}

/// All the shared data the app uses
#[non_exhaustive]
pub(crate) struct SharedState {
    /// The channel on which all Fountain protocol messages are sent.
    pub protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    /// Location of the config directory.
    pub config_path: RwLock<std::path::PathBuf>,
    /// Name of the main config file.
    pub main_config_file: RwLock<std::path::PathBuf>,
    /// User config
    pub config: RwLock<crate::config::main::Config>,
    /// The live-adjustable parameters and the integration method.
    pub controls: RwLock<fountain_engine::Controls>,
    /// Playing, paused or stopped.
    pub run_state: RwLock<RunState>,
    /// The obstacle that the simulator should be using.
    pub obstacle: RwLock<Option<fountain_engine::Circle>>,
    /// The latest performance figures.
    pub stats: RwLock<Stats>,
    /// Is the application logging?
    pub is_logging: RwLock<bool>,
}

impl SharedState {
    /// Initialise the shared state
    pub fn init(protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>) -> Arc<Self> {
        let state = Self {
            protocol_tx,
            config_path: RwLock::default(),
            main_config_file: RwLock::default(),
            config: RwLock::default(),
            controls: RwLock::default(),
            run_state: RwLock::default(),
            obstacle: RwLock::default(),
            stats: RwLock::default(),
            is_logging: RwLock::default(),
        };
        Arc::new(state)
    }

    /// Get a read lock and return the current run state.
    pub async fn get_run_state(&self) -> RunState {
        *self.run_state.read().await
    }

    /// Get a write lock and set the run state.
    pub async fn set_run_state(&self, run_state: RunState) {
        let mut current = self.run_state.write().await;
        if *current != run_state {
            tracing::debug!("Run state changed from {} to {run_state}", *current);
        }
        *current = run_state;
    }

    /// Take a snapshot of the controls for the next simulation step.
    pub async fn get_settings(&self) -> fountain_engine::Settings {
        self.controls.read().await.snapshot()
    }

    /// Get a read lock and return the latest performance figures.
    pub async fn get_stats(&self) -> Stats {
        *self.stats.read().await
    }
}
