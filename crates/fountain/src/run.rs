//! Main entrypoint for running Fountain

use std::sync::Arc;

use clap::Parser as _;
use color_eyre::eyre::{ContextCompat as _, Result};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use crate::cli_args::CliArgs;
use crate::control_surface::ControlSurface;
use crate::shared_state::SharedState;
use crate::simulator::Simulator;

/// Messages between the various tasks/threads
#[non_exhaustive]
#[derive(Clone, Debug)]
pub(crate) enum Protocol {
    /// The entire application is exiting.
    End,
    /// A parsed control command from the user.
    Command(crate::control_surface::Command),
}

/// Main entrypoint
#[expect(clippy::non_ascii_literal, reason = "It's just for debugging")]
pub(crate) async fn run(state_arc: &std::sync::Arc<SharedState>) -> Result<()> {
    let protocol_tx = state_arc.protocol_tx.clone();
    let cli_args = setup(state_arc).await?;

    let command_handle = ControlSurface::handle(Arc::clone(state_arc));
    let input_thread_handle = if cli_args.no_input {
        None
    } else {
        Some(ControlSurface::start(protocol_tx.clone()))
    };

    let options = crate::simulator::Options {
        max_frames: cli_args.frames,
        dump_frames: cli_args.dump_frames,
        seed: cli_args.seed,
    };
    let simulator_result = Simulator::start(Arc::clone(state_arc), options).await;
    tracing::debug!("🏁 left simulation task, exiting Fountain...");
    broadcast_protocol_end(&protocol_tx);

    command_handle.await??;
    if let Some(handle) = input_thread_handle {
        // The STDIN loop doesn't listen to the protocol, because it spends all its time blocked
        // on reading. Therefore we should only join it if it finished due to its own error.
        if handle.is_finished() {
            handle
                .join()
                .map_err(|err| color_eyre::eyre::eyre!("STDIN handle: {err:?}"))??;
        }
    }
    simulator_result??;

    tracing::trace!("Leaving Fountain's main `run()` function");
    Ok(())
}

/// Signal all task/thread loops to exit.
///
/// We keep it in its own function because we need to handle the error separately. If the error
/// were to be bubbled with `?` as usual, there's a chance it would never be logged, because the
/// protocol end signal is itself what allows the central error handler to even be reached.
pub(crate) fn broadcast_protocol_end(protocol_tx: &tokio::sync::broadcast::Sender<Protocol>) {
    tracing::debug!("Broadcasting the protocol `End` message to all listeners");
    let result = protocol_tx.send(Protocol::End);
    if let Err(error) = result {
        tracing::error!("{error:?}");
    }
}

/// Prepare the application to start.
async fn setup(state: &std::sync::Arc<SharedState>) -> Result<CliArgs> {
    let cli_args = CliArgs::parse();

    let mut main_config_file = state.main_config_file.write().await;
    (*main_config_file).clone_from(&cli_args.main_config);
    drop(main_config_file);

    let directory_result =
        crate::config::main::Config::setup_directory(cli_args.config_dir.clone(), state).await;
    if let Err(directory_error) = directory_result {
        color_eyre::eyre::bail!("Error setting up config directory: {directory_error:?}");
    }

    let config_result = crate::config::main::Config::load_config_into_shared_state(state).await;
    if let Err(config_error) = config_result {
        let path = crate::config::main::Config::main_config_path(state).await;
        color_eyre::eyre::bail!(
            "Bad config file: {config_error:?}\n\nConfig path: {}",
            path.display()
        );
    }

    setup_logging(cli_args.clone(), state).await?;

    if let Some(method) = &cli_args.method {
        let result = state.controls.write().await.set_method_by_name(method);
        if let Err(method_error) = result {
            color_eyre::eyre::bail!("Bad `--method` argument: {method_error}");
        }
    }

    tracing::info!("Starting Fountain");
    tracing::debug!("Loaded config: {:?}", state.config.read().await);
    tracing::debug!("Starting with: {:?}", state.get_settings().await);

    Ok(cli_args)
}

/// Setup logging
async fn setup_logging(cli_args: CliArgs, state: &std::sync::Arc<SharedState>) -> Result<()> {
    let are_log_filters_manually_set = std::env::var("FOUNTAIN_LOG").is_ok();
    let mut path = state.config.read().await.log_path.clone();

    if let Some(cli_override_path) = cli_args.log_path {
        path = cli_override_path;
    }

    let mut level = state.config.read().await.log_level.clone();
    if let Some(cli_override_level) = cli_args.log_level {
        level = cli_override_level;
    }
    let level_as_string = format!("{level:?}").to_lowercase();

    let is_loggable =
        !matches!(level, crate::config::main::LogLevel::Off) || are_log_filters_manually_set;

    if !is_loggable {
        return Ok(());
    }

    let directory = path.parent().context("Couldn't get log path's parent")?;
    std::fs::create_dir_all(directory)?;
    let file = std::fs::File::create(path.clone())?;

    let filters = if are_log_filters_manually_set {
        if let Ok(user_filters) = std::env::var("FOUNTAIN_LOG") {
            std::env::set_var("RUST_LOG", user_filters);
        }

        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("error".parse()?)
            .from_env_lossy()
    } else {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("off".parse()?)
            .from_env_lossy()
            .add_directive(format!("fountain={level_as_string}").parse()?)
            .add_directive(format!("fountain_engine={level_as_string}").parse()?)
    };

    let logfile_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(filters);

    tracing_subscriber::registry().with(logfile_layer).init();

    state.config.write().await.log_path = path;
    let mut is_logging = state.is_logging.write().await;
    *is_logging = true;
    drop(is_logging);

    Ok(())
}
