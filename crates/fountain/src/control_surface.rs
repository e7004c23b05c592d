//! Live control of the simulation: text commands read from STDIN, one per line.
//!
//! Reading happens on its own thread and parsed commands are sent over the protocol channel. A
//! separate task applies them to the shared state, which the simulator picks up on its next
//! frame. Bad commands are reported to the user but are never fatal.

use std::io::BufRead as _;
use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr as _};
use fountain_engine::{DVec2, Knob};

use crate::run::Protocol;
use crate::shared_state::{RunState, SharedState};

/// The help text for all the commands.
const HELP: &str = "\
Commands:
  rate|spread|lifespan|speed +      Increase the parameter by one step
  rate|spread|lifespan|speed -      Decrease the parameter by one step
  rate|spread|lifespan|speed <n>    Set the parameter, within its bounds
  method euler|midpoint|verlet      Change the integration method
  play|pause|stop                   Control the simulation
  obstacle <x> <y> <radius>         Move the obstacle
  obstacle off                      Remove the obstacle
  obstacle reset                    Put the configured obstacle back
  status                            Show the current settings
  help                              Show this help
  quit                              Exit";

/// How to change a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Adjustment {
    /// Up by one step
    Increment,
    /// Down by one step
    Decrement,
    /// To a specific value
    Set(f64),
}

/// Everything the user can ask for.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    /// Change one of the live parameters.
    Adjust {
        /// Which parameter
        knob: Knob,
        /// How to change it
        adjustment: Adjustment,
    },
    /// Change the integration method, by name.
    Method(String),
    /// Play, pause or stop.
    Run(RunState),
    /// Put the obstacle somewhere.
    PlaceObstacle {
        /// Horizontal centre
        x: f64,
        /// Vertical centre
        y: f64,
        /// Radius
        radius: f64,
    },
    /// Take the obstacle away.
    RemoveObstacle,
    /// Restore the obstacle from the config.
    ResetObstacle,
    /// Report the current settings.
    Status,
    /// List the commands.
    Help,
    /// Exit the whole application.
    Quit,
}

/// Parse a float argument, naming it in any error.
fn parse_number(word: &str, name: &str) -> Result<f64> {
    let number = word
        .parse::<f64>()
        .wrap_err_with(|| format!("Couldn't parse {name} from {word:?}"))?;
    if !number.is_finite() {
        color_eyre::eyre::bail!("The {name} must be a finite number, got {word:?}");
    }
    Ok(number)
}

impl std::str::FromStr for Command {
    type Err = color_eyre::eyre::Report;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => color_eyre::eyre::bail!("Empty command"),
            ["play"] => Self::Run(RunState::Playing),
            ["pause"] => Self::Run(RunState::Paused),
            ["stop"] => Self::Run(RunState::Stopped),
            ["status"] => Self::Status,
            ["help" | "?"] => Self::Help,
            ["quit" | "exit" | "q"] => Self::Quit,
            ["method", name] => Self::Method((*name).to_owned()),
            ["obstacle", "off"] => Self::RemoveObstacle,
            ["obstacle", "reset"] => Self::ResetObstacle,
            ["obstacle", x, y, radius] => Self::PlaceObstacle {
                x: parse_number(x, "x coordinate")?,
                y: parse_number(y, "y coordinate")?,
                radius: parse_number(radius, "radius")?,
            },
            [name, argument] => {
                let knob = name.parse::<Knob>()?;
                let adjustment = match *argument {
                    "+" => Adjustment::Increment,
                    "-" => Adjustment::Decrement,
                    value => Adjustment::Set(parse_number(value, knob.name())?),
                };
                Self::Adjust { knob, adjustment }
            }
            _ => color_eyre::eyre::bail!("Unknown command: {line:?}. Type `help` for a list."),
        };

        Ok(command)
    }
}

/// Tell the user something. STDOUT is reserved for dumped frames, so it all goes to STDERR.
#[expect(
    clippy::print_stderr,
    reason = "It's our central place for communicating with the user whilst running"
)]
fn report(message: &str) {
    eprintln!("{message}");
}

/// Reading and applying control commands.
pub(crate) struct ControlSurface;

impl ControlSurface {
    /// Start a thread to read commands from STDIN and forward them to the rest of the
    /// application.
    pub fn start(
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    ) -> std::thread::JoinHandle<Result<()>> {
        // The Tokio docs actually suggest using `std::thread` to listen on STDIN for interactive
        // applications.
        std::thread::spawn(move || -> Result<()> {
            let result = Self::consume_stdin(&protocol_tx);
            if let Err(error) = result {
                crate::run::broadcast_protocol_end(&protocol_tx);
                return Err(error);
            }
            Ok(())
        })
    }

    /// Read STDIN line by line until it closes.
    fn consume_stdin(protocol_tx: &tokio::sync::broadcast::Sender<Protocol>) -> Result<()> {
        tracing::debug!("Starting to listen for commands on STDIN");

        for maybe_line in std::io::stdin().lock().lines() {
            let line = maybe_line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            tracing::trace!("Received STDIN input: {trimmed}");
            match trimmed.parse::<Command>() {
                Ok(command) => {
                    let result = protocol_tx.send(Protocol::Command(command));
                    if let Err(error) = result {
                        tracing::error!("Error sending command from thread to task: {error:?}");
                    }
                }
                Err(error) => {
                    tracing::warn!("Bad command: {error}");
                    report(&format!("{error}"));
                }
            }
        }

        tracing::debug!("STDIN closed, no more commands will be read");
        Ok(())
    }

    /// Start the task that applies commands to the shared state.
    pub fn handle(state: Arc<SharedState>) -> tokio::task::JoinHandle<Result<()>> {
        let mut protocol = state.protocol_tx.subscribe();
        tokio::spawn(async move {
            loop {
                let message = match protocol.recv().await {
                    Ok(message) => message,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Command handler lagged, skipped {skipped} message(s)");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                };

                match message {
                    Protocol::End => break,
                    Protocol::Command(command) => match Self::apply(&state, command).await {
                        Ok(Some(message)) => report(&message),
                        Ok(None) => (),
                        Err(error) => {
                            tracing::warn!("Command failed: {error:?}");
                            report(&format!("{error}"));
                        }
                    },
                }
            }

            tracing::debug!("Leaving command handler loop");
            Ok(())
        })
    }

    /// Apply a single command. Returns anything that should be shown to the user.
    pub async fn apply(state: &Arc<SharedState>, command: Command) -> Result<Option<String>> {
        tracing::debug!("Applying command: {command:?}");

        let message = match command {
            Command::Adjust { knob, adjustment } => {
                let mut controls = state.controls.write().await;
                let parameter = controls.parameter_mut(knob);
                let value = match adjustment {
                    Adjustment::Increment => parameter.increment(),
                    Adjustment::Decrement => parameter.decrement(),
                    Adjustment::Set(value) => parameter.set(value),
                };
                let limit = if parameter.is_at_max() {
                    " (max)"
                } else if parameter.is_at_min() {
                    " (min)"
                } else {
                    ""
                };
                Some(format!("{knob}: {value}{limit}"))
            }
            Command::Method(name) => {
                let method = state.controls.write().await.set_method_by_name(&name)?;
                Some(format!("method: {method}"))
            }
            Command::Run(run_state) => {
                state.set_run_state(run_state).await;
                Some(format!("{run_state}"))
            }
            Command::PlaceObstacle { x, y, radius } => {
                let circle = fountain_engine::Circle::new(DVec2::new(x, y), radius)?;
                *state.obstacle.write().await = Some(circle);
                None
            }
            Command::RemoveObstacle => {
                *state.obstacle.write().await = None;
                None
            }
            Command::ResetObstacle => {
                let configured = state.config.read().await.obstacle()?;
                *state.obstacle.write().await = configured;
                None
            }
            Command::Status => Some(Self::status(state).await),
            Command::Help => Some(HELP.to_owned()),
            Command::Quit => {
                crate::run::broadcast_protocol_end(&state.protocol_tx);
                None
            }
        };

        Ok(message)
    }

    /// A one-line summary of everything that can be controlled.
    pub async fn status(state: &Arc<SharedState>) -> String {
        let settings = state.get_settings().await;
        let run_state = state.get_run_state().await;
        let stats = state.get_stats().await;
        let obstacle = match *state.obstacle.read().await {
            Some(circle) => format!(
                "obstacle at ({}, {}) r {}",
                circle.position().x,
                circle.position().y,
                circle.radius()
            ),
            None => "no obstacle".to_owned(),
        };

        format!(
            "{run_state}, {method}, rate {rate}, spread {spread}, lifespan {lifespan}, \
             speed {speed}, {obstacle}, {particles} particles, {fps:.1} FPS",
            method = settings.method,
            rate = settings.emission_rate,
            spread = settings.spread_degrees,
            lifespan = settings.lifespan,
            speed = settings.initial_speed,
            particles = stats.particles,
            fps = stats.fps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fountain_engine::IntegrationMethod;

    fn state() -> Arc<SharedState> {
        let (protocol_tx, _) = tokio::sync::broadcast::channel(16);
        SharedState::init(protocol_tx)
    }

    #[test]
    fn parsing() {
        assert_eq!(
            "rate +".parse::<Command>().unwrap(),
            Command::Adjust {
                knob: Knob::EmissionRate,
                adjustment: Adjustment::Increment
            }
        );
        assert_eq!(
            "  speed   -5 ".parse::<Command>().unwrap(),
            Command::Adjust {
                knob: Knob::InitialSpeed,
                adjustment: Adjustment::Set(-5.0)
            }
        );
        assert_eq!(
            "spread -".parse::<Command>().unwrap(),
            Command::Adjust {
                knob: Knob::Spread,
                adjustment: Adjustment::Decrement
            }
        );
        assert_eq!(
            "method verlet".parse::<Command>().unwrap(),
            Command::Method("verlet".to_owned())
        );
        assert_eq!(
            "pause".parse::<Command>().unwrap(),
            Command::Run(RunState::Paused)
        );
        assert_eq!(
            "obstacle 10 20.5 30".parse::<Command>().unwrap(),
            Command::PlaceObstacle {
                x: 10.0,
                y: 20.5,
                radius: 30.0
            }
        );
        assert_eq!(
            "obstacle off".parse::<Command>().unwrap(),
            Command::RemoveObstacle
        );
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn bad_commands() {
        assert!("".parse::<Command>().is_err());
        assert!("jump".parse::<Command>().is_err());
        assert!("gravity +".parse::<Command>().is_err());
        assert!("rate lots".parse::<Command>().is_err());
        assert!("rate NaN".parse::<Command>().is_err());
        assert!("obstacle 1 2".parse::<Command>().is_err());
        assert!("play now".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn adjusting_parameters() {
        let state = state();
        let command = "rate +".parse::<Command>().unwrap();
        let message = ControlSurface::apply(&state, command).await.unwrap();
        assert_eq!(message.as_deref(), Some("rate: 1100"));

        let command = "lifespan 99".parse::<Command>().unwrap();
        let message = ControlSurface::apply(&state, command).await.unwrap();
        assert_eq!(message.as_deref(), Some("lifespan: 4 (max)"));
        let settings = state.get_settings().await;
        assert!((settings.lifespan - 4.0).abs() < f64::EPSILON);

        let command = "rate 0".parse::<Command>().unwrap();
        let message = ControlSurface::apply(&state, command).await.unwrap();
        assert_eq!(message.as_deref(), Some("rate: 0 (min)"));
    }

    #[tokio::test]
    async fn unknown_method_keeps_the_current_one() {
        let state = state();
        ControlSurface::apply(&state, Command::Method("midpoint".to_owned()))
            .await
            .unwrap();
        let result = ControlSurface::apply(&state, Command::Method("rk4".to_owned())).await;
        assert!(result.is_err());
        assert_eq!(
            state.get_settings().await.method,
            IntegrationMethod::Midpoint
        );
    }

    #[tokio::test]
    async fn obstacle_commands() {
        let state = state();
        ControlSurface::apply(
            &state,
            Command::PlaceObstacle {
                x: 1.0,
                y: 2.0,
                radius: 3.0,
            },
        )
        .await
        .unwrap();
        let circle = state.obstacle.read().await.unwrap();
        assert_eq!(circle.position(), DVec2::new(1.0, 2.0));

        ControlSurface::apply(&state, Command::RemoveObstacle)
            .await
            .unwrap();
        assert!(state.obstacle.read().await.is_none());

        ControlSurface::apply(&state, Command::ResetObstacle)
            .await
            .unwrap();
        let circle = state.obstacle.read().await.unwrap();
        assert_eq!(circle.position(), DVec2::new(412.0, 400.0));

        let result = ControlSurface::apply(
            &state,
            Command::PlaceObstacle {
                x: 1.0,
                y: 2.0,
                radius: 0.0,
            },
        )
        .await;
        assert!(result.is_err());
        assert!(state.obstacle.read().await.is_some());
    }

    #[tokio::test]
    async fn run_state_and_status() {
        let state = state();
        ControlSurface::apply(&state, Command::Run(RunState::Stopped))
            .await
            .unwrap();
        assert_eq!(state.get_run_state().await, RunState::Stopped);

        let status = ControlSurface::apply(&state, Command::Status)
            .await
            .unwrap()
            .unwrap();
        assert!(status.starts_with("stopped, explicit_euler, rate 1000"));
    }

    #[tokio::test]
    async fn quitting_ends_everything() {
        let state = state();
        let mut protocol = state.protocol_tx.subscribe();
        ControlSurface::apply(&state, Command::Quit).await.unwrap();
        assert!(matches!(protocol.recv().await.unwrap(), Protocol::End));
    }

    #[tokio::test]
    async fn handler_applies_commands_until_the_end() {
        let state = state();
        let handle = ControlSurface::handle(Arc::clone(&state));
        state
            .protocol_tx
            .send(Protocol::Command(Command::Run(RunState::Paused)))
            .unwrap();
        state.protocol_tx.send(Protocol::End).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(state.get_run_state().await, RunState::Paused);
    }
}
