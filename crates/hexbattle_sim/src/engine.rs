//! # Simulation Engine
//!
//! Runs turns on a background thread against a private grid snapshot
//! and streams each finished turn to the consumer.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start()──> Running ──stop()──> Stopping ──worker exits──> Stopped
//!   └──────────────────stop()───────────────────────────────────────┘
//! ```
//!
//! The worker checks the stop flag between turns only. A turn is
//! resolved, grown and summarised completely before it is published, so
//! the consumer never sees part of a turn.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use hexbattle_core::Grid;
use parking_lot::Mutex;

use crate::channel::{command_channel, BatchConsumer, BatchPublisher, CancellationToken};
use crate::combat::CombatResolver;
use crate::command::{Batch, Command, Turn};
use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::growth::{GrowthPolicy, ThroughputGrowth};
use crate::rng::{DamageRng, SeededRng};

/// Engine lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Built, not started.
    Idle,
    /// Worker is producing turns.
    Running,
    /// Stop requested, worker finishing its current turn.
    Stopping,
    /// Worker has exited.
    Stopped,
}

/// Turn timing and outcome statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TurnStats {
    /// Turns resolved.
    pub turns: u64,
    /// Move commands produced.
    pub moves: u64,
    /// Attack commands produced.
    pub attacks: u64,
    /// Units killed.
    pub deaths: u64,
    /// Growth steps.
    pub expansions: u64,
    /// Fastest turn.
    pub min_turn_us: u64,
    /// Slowest turn.
    pub max_turn_us: u64,
    /// Rolling average turn time.
    pub avg_turn_us: u64,
}

/// Synchronous turn driver: resolve, grow, summarise.
///
/// The engine runs one of these on its worker thread; tests and tools
/// can drive it directly.
pub struct TurnLoop {
    grid: Grid,
    resolver: CombatResolver<Box<dyn DamageRng>>,
    growth: Box<dyn GrowthPolicy>,
    next_turn: Turn,
    stats: TurnStats,
}

impl TurnLoop {
    /// Driver owning `grid`. The first turn produced is turn 1.
    #[must_use]
    pub fn new(
        grid: Grid,
        rng: impl DamageRng + 'static,
        growth: impl GrowthPolicy + 'static,
    ) -> Self {
        let rng: Box<dyn DamageRng> = Box::new(rng);
        Self {
            grid,
            resolver: CombatResolver::new(rng),
            growth: Box::new(growth),
            next_turn: 1,
            stats: TurnStats::default(),
        }
    }

    /// Resolves the next turn and returns its batch.
    ///
    /// `throughput` is the consumer's latest reported frame rate.
    ///
    /// # Errors
    ///
    /// [`SimError::Grid`] on a structural fault. The session cannot
    /// continue after one.
    pub fn run_turn(&mut self, throughput: u32) -> SimResult<Batch> {
        let start = Instant::now();
        let turn = self.next_turn;

        let mut commands = self.resolver.resolve_turn(&mut self.grid, turn)?;

        let mut expanded = false;
        if let Some(increase) = self.growth.expansion(turn, throughput, self.grid.radius()) {
            let expansion = self.grid.grow(increase)?;
            tracing::debug!(
                "turn {}: map grew by {} to radius {} ({} units spawned)",
                turn,
                increase,
                self.grid.radius(),
                expansion.spawned().count()
            );
            commands.push(Command::MapExpand { turn, expansion });
            expanded = true;
        }

        let counts = self.grid.faction_counts();
        commands.push(Command::TurnInfo {
            turn,
            attackers: counts.attackers,
            defenders: counts.defenders,
        });

        if cfg!(debug_assertions) {
            self.grid.validate()?;
        }

        self.next_turn += 1;
        let batch = Batch::new(turn, commands);
        self.record(&batch, expanded, start.elapsed());
        Ok(batch)
    }

    fn record(&mut self, batch: &Batch, expanded: bool, elapsed: Duration) {
        let summary = batch.summary();
        let elapsed_us = elapsed.as_micros() as u64;
        let stats = &mut self.stats;

        stats.moves += summary.moves as u64;
        stats.attacks += summary.attacks as u64;
        stats.deaths += summary.deaths as u64;
        stats.expansions += u64::from(expanded);

        if stats.turns == 0 {
            stats.min_turn_us = elapsed_us;
            stats.avg_turn_us = elapsed_us;
        } else {
            stats.min_turn_us = stats.min_turn_us.min(elapsed_us);
            // Rolling average
            stats.avg_turn_us = (stats.avg_turn_us * 15 + elapsed_us) / 16;
        }
        stats.max_turn_us = stats.max_turn_us.max(elapsed_us);
        stats.turns += 1;
    }

    /// The private grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number the next turn will carry.
    #[must_use]
    pub const fn next_turn(&self) -> Turn {
        self.next_turn
    }

    /// Statistics so far.
    #[must_use]
    pub const fn stats(&self) -> &TurnStats {
        &self.stats
    }
}

/// What the worker did before it exited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineReport {
    /// Batches handed to the consumer.
    pub turns_published: u64,
    /// Radius of the private grid at exit.
    pub final_radius: u32,
    /// Structural fault that ended the session, if any.
    pub fault: Option<String>,
    /// Turn statistics.
    pub stats: TurnStats,
}

/// Everything the worker thread owns.
struct Worker {
    turn_loop: TurnLoop,
    publisher: BatchPublisher,
    token: CancellationToken,
    state: Arc<Mutex<EngineState>>,
    turn_interval: Duration,
    poll: Duration,
}

impl Worker {
    fn run(mut self) -> EngineReport {
        tracing::info!(
            "simulation worker started: radius {}, {} units",
            self.turn_loop.grid().radius(),
            self.turn_loop.grid().active_count()
        );
        let mut report = EngineReport::default();

        while !self.token.is_cancelled() {
            let batch = match self.turn_loop.run_turn(self.publisher.throughput()) {
                Ok(batch) => batch,
                Err(fault) => {
                    tracing::error!(
                        "turn {} failed, ending session: {}",
                        self.turn_loop.next_turn(),
                        fault
                    );
                    report.fault = Some(fault.to_string());
                    break;
                }
            };

            let turn = batch.turn();
            tracing::trace!("turn {}: publishing {} commands", turn, batch.len());
            match self.publisher.publish(batch, self.poll, &self.token) {
                Ok(()) => report.turns_published += 1,
                Err(SimError::ChannelClosed) => {
                    tracing::info!("consumer gone after turn {}, worker exiting", turn);
                    break;
                }
                Err(_) => break,
            }

            if !self.publisher.wait_for_capacity(self.poll, &self.token) {
                break;
            }
            if !pause(self.turn_interval, self.poll, &self.token) {
                break;
            }
        }

        report.final_radius = self.turn_loop.grid().radius();
        report.stats = *self.turn_loop.stats();
        *self.state.lock() = EngineState::Stopped;
        tracing::info!(
            "simulation worker stopped after {} turns",
            report.turns_published
        );
        report
    }
}

/// Sleeps for `total` in `poll`-sized slices. Returns `false` if the
/// token fired.
fn pause(total: Duration, poll: Duration, token: &CancellationToken) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if token.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(poll));
    }
}

/// Owns the background worker and its lifecycle.
///
/// # Example
///
/// ```rust,ignore
/// let (mut engine, consumer) = SimulationEngine::new(&grid, SimulationConfig::default())?;
/// engine.start()?;
/// while let Some(batch) = consumer.try_take_batch() { /* apply */ }
/// let report = engine.shutdown();
/// ```
pub struct SimulationEngine {
    config: SimulationConfig,
    state: Arc<Mutex<EngineState>>,
    token: CancellationToken,
    pending: Option<(TurnLoop, BatchPublisher)>,
    handle: Option<JoinHandle<EngineReport>>,
    report: Option<EngineReport>,
}

impl SimulationEngine {
    /// Builds an engine over a snapshot of `source`, with seeded rolls
    /// and throughput-driven growth taken from `config`.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] if `config` does not validate.
    pub fn new(source: &Grid, config: SimulationConfig) -> SimResult<(Self, BatchConsumer)> {
        let rng = config.seed.map_or_else(SeededRng::from_clock, SeededRng::new);
        let growth = ThroughputGrowth::new(config.growth.clone());
        Self::with_parts(source, config, rng, growth)
    }

    /// Builds an engine with an explicit damage source and growth policy.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] if `config` does not validate.
    pub fn with_parts(
        source: &Grid,
        config: SimulationConfig,
        rng: impl DamageRng + 'static,
        growth: impl GrowthPolicy + 'static,
    ) -> SimResult<(Self, BatchConsumer)> {
        config.validate()?;
        let (publisher, consumer) = command_channel(config.backlog_threshold);
        let turn_loop = TurnLoop::new(source.snapshot(), rng, growth);

        let engine = Self {
            config,
            state: Arc::new(Mutex::new(EngineState::Idle)),
            token: CancellationToken::new(),
            pending: Some((turn_loop, publisher)),
            handle: None,
            report: None,
        };
        Ok((engine, consumer))
    }

    /// Starts the worker thread.
    ///
    /// # Errors
    ///
    /// - [`SimError::AlreadyStarted`] unless the engine is idle
    /// - [`SimError::Worker`] if the thread cannot be spawned
    pub fn start(&mut self) -> SimResult<()> {
        let mut state = self.state.lock();
        if *state != EngineState::Idle {
            return Err(SimError::AlreadyStarted);
        }
        let Some((turn_loop, publisher)) = self.pending.take() else {
            return Err(SimError::AlreadyStarted);
        };

        let worker = Worker {
            turn_loop,
            publisher,
            token: self.token.clone(),
            state: Arc::clone(&self.state),
            turn_interval: self.config.turn_interval(),
            poll: self.config.backpressure_poll(),
        };
        let handle = thread::Builder::new()
            .name("hexbattle-sim".into())
            .spawn(move || worker.run())
            .map_err(|e| SimError::Worker(e.to_string()))?;

        *state = EngineState::Running;
        self.handle = Some(handle);
        Ok(())
    }

    /// Requests a stop. The worker exits after its current turn.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        match *state {
            EngineState::Idle => *state = EngineState::Stopped,
            EngineState::Running => *state = EngineState::Stopping,
            EngineState::Stopping | EngineState::Stopped => {}
        }
        self.token.cancel();
    }

    /// Waits for the worker to exit and returns its report.
    ///
    /// Blocks until the worker stops on its own (fault, consumer gone)
    /// unless [`stop`](Self::stop) was called first. Returns `None` if
    /// the engine never started.
    pub fn join(&mut self) -> Option<EngineReport> {
        if let Some(handle) = self.handle.take() {
            let report = handle.join().unwrap_or_else(|_| {
                tracing::error!("simulation worker panicked");
                *self.state.lock() = EngineState::Stopped;
                EngineReport {
                    fault: Some("worker panicked".into()),
                    ..EngineReport::default()
                }
            });
            self.report = Some(report);
        }
        self.report.clone()
    }

    /// [`stop`](Self::stop) then [`join`](Self::join).
    pub fn shutdown(&mut self) -> Option<EngineReport> {
        self.stop();
        self.join()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    /// Whether the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

impl Drop for SimulationEngine {
    fn drop(&mut self) {
        // Signal shutdown and wait for the worker
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
