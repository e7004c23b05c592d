//! The frame loop: steps the simulation with whatever the shared controls currently say.

use std::collections::VecDeque;
use std::io::Write as _;
use std::sync::Arc;

use color_eyre::eyre::Result;
use fountain_engine::{Frame, Simulation, Viewport};
use rand::SeedableRng as _;

use crate::run::Protocol;
use crate::shared_state::{RunState, SharedState, Stats};

/// Used for calculating frame durations.
const ONE_MICROSECOND: u64 = 1_000_000;

/// How many recent frames the FPS is averaged over.
const FPS_WINDOW: usize = 30;

/// How often the status line is logged.
const STATUS_LOG_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Behaviour that's fixed for the whole run.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Options {
    /// Exit after this many frames, running them as fast as possible.
    pub max_frames: Option<u64>,
    /// Write every frame to STDOUT as JSON.
    pub dump_frames: bool,
    /// Overrides the configured seed.
    pub seed: Option<u64>,
}

/// One line of the frame dump.
#[derive(serde::Serialize)]
struct DumpedFrame<'frame> {
    /// Frame counter, starting at 1
    frame: u64,
    /// Whether the simulation was advancing
    run_state: RunState,
    /// Recent average FPS
    fps: f64,
    /// Everything the simulation reported
    #[serde(flatten)]
    details: &'frame Frame,
}

/// Owns the simulation and drives it from the shared state.
pub(crate) struct Simulator {
    /// Shared controls, obstacle and run state
    state: Arc<SharedState>,
    /// The particles themselves
    simulation: Simulation,
    /// Where particles may live
    viewport: Viewport,
    /// Target frame rate
    frame_rate: u32,
    /// Fixed behaviour
    options: Options,
    /// The time at which the previous frame tick finished sleeping.
    last_frame_tick: std::time::Instant,
    /// The time at which the previous frame was simulated.
    last_step: std::time::Instant,
    /// The most recent intervals between frames, newest first.
    durations: VecDeque<f64>,
    /// Frames simulated so far
    frames: u64,
    /// When the status line was last logged
    last_status_log: std::time::Instant,
}

impl Simulator {
    /// Instantiate from the loaded config.
    async fn new(state: Arc<SharedState>, options: Options) -> Self {
        let config = state.config.read().await.clone();

        let rng = match options.seed.or(config.seed) {
            Some(seed) => {
                tracing::debug!("Seeding the simulation with {seed}");
                rand::rngs::StdRng::seed_from_u64(seed)
            }
            None => rand::rngs::StdRng::from_entropy(),
        };
        let simulation = Simulation::with_rng(config.emitter(), config.max_particles, rng);

        let now = std::time::Instant::now();
        Self {
            state,
            simulation,
            viewport: config.viewport(),
            frame_rate: config.frame_rate,
            options,
            last_frame_tick: now,
            last_step: now,
            durations: VecDeque::default(),
            frames: 0,
            last_status_log: now,
        }
    }

    /// Our main entrypoint.
    pub(crate) fn start(
        state: Arc<SharedState>,
        options: Options,
    ) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move {
            let protocol_tx = state.protocol_tx.clone();
            let mut simulator = Self::new(state, options).await;
            let result = simulator.run().await;
            crate::run::broadcast_protocol_end(&protocol_tx);
            result
        })
    }

    /// Tick until told to stop, or until the frame limit is reached.
    async fn run(&mut self) -> Result<()> {
        let mut protocol = self.state.protocol_tx.subscribe();
        tracing::debug!(
            "Starting simulation at {} FPS, with {:?}",
            self.frame_rate,
            self.options
        );

        #[expect(
            clippy::integer_division_remainder_used,
            reason = "This is caused by the `tokio::select!`"
        )]
        while !self.is_finished() {
            tokio::select! {
                () = self.sleep_until_next_frame_tick() => {
                    self.tick().await?;
                },
                Ok(message) = protocol.recv() => {
                    if matches!(message, Protocol::End) {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Leaving simulation loop after {} frames", self.frames);
        Ok(())
    }

    /// Has the frame limit been reached?
    fn is_finished(&self) -> bool {
        self.options
            .max_frames
            .is_some_and(|max_frames| self.frames >= max_frames)
    }

    /// Is there a frame limit? Then frames aren't paced in real time.
    const fn is_headless(&self) -> bool {
        self.options.max_frames.is_some()
    }

    /// Sleep until the next frame is due.
    async fn sleep_until_next_frame_tick(&mut self) {
        if self.is_headless() {
            tokio::task::yield_now().await;
            return;
        }

        let target = ONE_MICROSECOND.wrapping_div(self.frame_rate.into());
        let target_frame_rate_micro = std::time::Duration::from_micros(target);
        if let Some(wait) = target_frame_rate_micro.checked_sub(self.last_frame_tick.elapsed()) {
            tokio::time::sleep(wait).await;
        }
        self.last_frame_tick = std::time::Instant::now();
    }

    /// The time to simulate this frame, along with the real time since the last frame.
    ///
    /// The clock is reset every frame whatever the run state, so that time spent paused is
    /// never simulated in one big burst when playing resumes.
    fn time_step(&mut self) -> (f64, f64) {
        let now = std::time::Instant::now();
        let real = now.duration_since(self.last_step).as_secs_f64();
        self.last_step = now;

        let simulated = if self.is_headless() {
            1.0 / f64::from(self.frame_rate)
        } else {
            real
        };
        (simulated, real)
    }

    /// One frame of the simulation.
    async fn tick(&mut self) -> Result<()> {
        let (time_step, real_time) = self.time_step();
        self.sync_obstacle().await?;
        let settings = self.state.get_settings().await;
        let run_state = self.state.get_run_state().await;

        let frame = match run_state {
            RunState::Playing => self.simulation.step(&settings, time_step, &self.viewport),
            RunState::Paused => self.simulation.frame(settings.method),
            RunState::Stopped => {
                if !self.simulation.particles().is_empty() {
                    self.simulation.reset();
                }
                self.simulation.frame(settings.method)
            }
        };
        self.frames += 1;

        self.durations.push_front(real_time);
        if self.durations.len() > FPS_WINDOW {
            self.durations.pop_back();
        }
        let fps = self.fps();

        *self.state.stats.write().await = Stats {
            frames: self.frames,
            fps,
            particles: frame.positions.len(),
        };

        if self.options.dump_frames {
            self.dump(&frame, run_state, fps)?;
        }

        if self.last_status_log.elapsed() >= STATUS_LOG_INTERVAL {
            self.last_status_log = std::time::Instant::now();
            tracing::info!(
                "{fps:.1} FPS, {} particles, {run_state}",
                frame.positions.len()
            );
        }

        Ok(())
    }

    /// Pick up any changes to the obstacle.
    async fn sync_obstacle(&mut self) -> Result<()> {
        let wanted = *self.state.obstacle.read().await;
        if wanted == self.simulation.obstacle() {
            return Ok(());
        }

        match wanted {
            Some(circle) => self
                .simulation
                .set_obstacle(circle.position(), circle.radius())?,
            None => self.simulation.clear_obstacle(),
        }
        Ok(())
    }

    /// The average frames per second over the recent frames.
    fn fps(&self) -> f64 {
        #[expect(
            clippy::as_conversions,
            clippy::cast_precision_loss,
            reason = "The window is tiny"
        )]
        let count = self.durations.len() as f64;
        let total = self.durations.iter().sum::<f64>();
        if total <= 0.0 {
            return 0.0;
        }
        count / total
    }

    /// Write the frame to STDOUT as a single line of JSON.
    fn dump(&self, frame: &Frame, run_state: RunState, fps: f64) -> Result<()> {
        let dumped = DumpedFrame {
            frame: self.frames,
            run_state,
            fps,
            details: frame,
        };

        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer(&mut stdout, &dumped)?;
        writeln!(stdout)?;
        Ok(())
    }
}
