//! Just `main()`. Keep as small as possible.

pub mod cli_args;
/// All the user-configurable settings.
pub mod config {
    pub mod main;
}
pub mod control_surface;
pub mod run;
pub mod shared_state;
pub mod simulator;

use color_eyre::eyre::Result;

/// Generous, commands only ever come in at typing speed.
const PROTOCOL_CHANNEL_CAPACITY: usize = 1024;

#[expect(
    clippy::print_stderr,
    reason = "It's our central place for communicating with the user on CLI"
)]
#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let (protocol_tx, _) = tokio::sync::broadcast::channel(PROTOCOL_CHANNEL_CAPACITY);
    let state_arc = shared_state::SharedState::init(protocol_tx);
    let result = run::run(&std::sync::Arc::clone(&state_arc)).await;

    let logpath = state_arc.config.read().await.log_path.clone();
    let is_logging = *state_arc.is_logging.read().await;
    tracing::debug!("Fountain is exiting");

    match result {
        Ok(()) => {
            if is_logging {
                eprintln!("Logs saved to {}", logpath.display());
            }
        }
        Err(error) => {
            tracing::error!("{error:?}");
            eprintln!("Error: {error}");
            if is_logging {
                eprintln!("See {} for more details", logpath.display());
            }
            #[expect(clippy::exit, reason = "Failures should be visible to scripts")]
            std::process::exit(1);
        }
    }

    Ok(())
}
