//! All the CLI arguments for Fountain

/// The default name of the main config file.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "fountain.toml";

/// A real-time 2D particle fountain.
#[derive(clap::Parser, Debug, Clone)]
#[command(
    version,
    about,
    long_about = "A particle fountain simulated in real time. Whilst running, type commands like \
                  `rate +`, `method verlet` or `pause` followed by Enter. Type `help` to see them all."
)]
#[non_exhaustive]
pub struct CliArgs {
    /// Use a custom config directory.
    #[arg(long)]
    pub config_dir: Option<std::path::PathBuf>,

    /// The name of the main config file, relative to the config directory.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE_NAME)]
    pub main_config: std::path::PathBuf,

    /// Override the configured log level.
    #[arg(long, value_enum)]
    pub log_level: Option<crate::config::main::LogLevel>,

    /// Override the configured log path.
    #[arg(long)]
    pub log_path: Option<std::path::PathBuf>,

    /// Start with this integration method: `explicit_euler`, `midpoint` or `verlet`.
    #[arg(short, long)]
    pub method: Option<String>,

    /// Only simulate this many frames, then exit. Frames are then run as fast as possible, each
    /// with a fixed time step based on the frame rate.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Write every frame to STDOUT as a line of JSON.
    #[arg(long)]
    pub dump_frames: bool,

    /// Seed the random number generator, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Don't read control commands from STDIN.
    #[arg(long)]
    pub no_input: bool,
}
