//! # Battle Session
//!
//! Wires one battle together: catalog, consumer grid, initial
//! formation, simulation engine and playback.
//!
//! ```text
//! BattleConfig ──> catalog ──> Grid ──> Battlefield::deploy
//!                                  │
//!                                  └─ snapshot ──> SimulationEngine ──┐
//!                                                                     │ Batch
//! frame(delta) ──> Playback::tick ──> Battlefield::apply <────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use hexbattle_core::{Faction, Grid};
use hexbattle_sim::{EngineReport, EngineState, SimulationEngine};

use crate::battlefield::{Battlefield, PowerBalance};
use crate::config::BattleConfig;
use crate::deploy::Formation;
use crate::error::BattleResult;
use crate::events::{BattleEvent, EventSender};
use crate::playback::Playback;

/// A running battle.
pub struct BattleSession {
    battlefield: Battlefield,
    engine: SimulationEngine,
    playback: Playback,
    config: BattleConfig,
}

impl BattleSession {
    /// Builds the battle described by `config` and deploys the initial
    /// formation. The engine is not started yet.
    ///
    /// Deployment events go to `sink` if one is given, and so do the
    /// events of every replayed batch.
    ///
    /// # Errors
    ///
    /// Invalid configuration, an unreadable catalog, a formation the
    /// catalog cannot man, or an engine that refuses the settings.
    pub fn new(config: BattleConfig, sink: Option<EventSender>) -> BattleResult<Self> {
        config.validate()?;
        let catalog = Arc::new(config.load_catalog()?);
        let grid = Grid::with_layout(config.map.radius, config.map.layout(), catalog);

        let mut battlefield = Battlefield::new(grid);
        let deployed = battlefield.deploy(&Formation::from_config(&config.map))?;

        let (engine, consumer) = SimulationEngine::new(battlefield.grid(), config.simulation.clone())?;
        let mut playback = Playback::new(consumer, config.playback.clone());
        if let Some(sink) = sink {
            playback = playback.with_sink(sink);
        }
        playback.forward(&deployed);

        tracing::info!(
            "battle ready: radius {}, {} attackers, {} defenders",
            battlefield.grid().radius(),
            battlefield.balance().attackers,
            battlefield.balance().defenders
        );
        Ok(Self {
            battlefield,
            engine,
            playback,
            config,
        })
    }

    /// Starts the simulation worker.
    ///
    /// # Errors
    ///
    /// [`hexbattle_sim::SimError::AlreadyStarted`] on a second call.
    pub fn start(&mut self) -> BattleResult<()> {
        self.engine.start()?;
        Ok(())
    }

    /// Advances the battle by one presented frame.
    ///
    /// # Errors
    ///
    /// A batch that cannot be replayed. The worker is stopped first.
    pub fn frame(&mut self, delta: Duration) -> BattleResult<Vec<BattleEvent>> {
        match self.playback.tick(delta, &mut self.battlefield) {
            Ok(events) => Ok(events),
            Err(error) => {
                tracing::error!("replay failed, stopping the simulation: {}", error);
                self.engine.stop();
                Err(error)
            }
        }
    }

    /// The faction left standing, once the other has no units.
    #[must_use]
    pub fn winner(&self) -> Option<Faction> {
        let balance = self.battlefield.balance();
        match (balance.attackers, balance.defenders) {
            (0, 0) => None,
            (_, 0) => Some(Faction::Attacker),
            (0, _) => Some(Faction::Defender),
            _ => None,
        }
    }

    /// Stops the worker and waits for it.
    pub fn shutdown(&mut self) -> Option<EngineReport> {
        let report = self.engine.shutdown();
        if let Some(report) = &report {
            tracing::info!(
                "battle over after {} published turns, {} replayed",
                report.turns_published,
                self.battlefield.last_turn()
            );
        }
        report
    }

    /// The consumer's battlefield.
    #[inline]
    #[must_use]
    pub const fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    /// Current population.
    #[inline]
    #[must_use]
    pub const fn balance(&self) -> PowerBalance {
        self.battlefield.balance()
    }

    /// Engine lifecycle state.
    #[must_use]
    pub fn engine_state(&self) -> EngineState {
        self.engine.state()
    }

    /// Playback controls.
    #[inline]
    pub fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }

    /// Playback counters and state.
    #[inline]
    #[must_use]
    pub const fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Settings this session was built from.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }
}
