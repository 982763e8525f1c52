//! # HEXBATTLE Simulation
//!
//! The producer half of the battle: a background worker that resolves
//! turns on a private grid snapshot and streams them, whole, to the
//! consumer through a bounded channel.
//!
//! ## Architecture Rules
//!
//! 1. **Private state** - the worker never touches the consumer's grid
//! 2. **Atomic turns** - a batch is published complete or not at all
//! 3. **Backpressure** - at most `backlog_threshold` turns in flight
//! 4. **Injected randomness** - every roll comes from a [`DamageRng`]
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hexbattle_core::{ArchetypeCatalog, Grid, HexCoordinate};
//! use hexbattle_sim::{NeverGrow, SeededRng, TurnLoop};
//!
//! let mut grid = Grid::new(3, Arc::new(ArchetypeCatalog::builtin()));
//! grid.spawn(HexCoordinate::ORIGIN, "defender").unwrap();
//! grid.spawn(HexCoordinate::axial(3, 0), "attacker").unwrap();
//!
//! let mut turns = TurnLoop::new(grid.snapshot(), SeededRng::new(7), NeverGrow);
//! let batch = turns.run_turn(60).unwrap();
//! assert_eq!(batch.turn(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod channel;
pub mod combat;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod growth;
pub mod rng;

pub use channel::{command_channel, BatchConsumer, BatchPublisher, CancellationToken, ThroughputSignal};
pub use combat::{CombatResolver, TurnTally};
pub use command::{Batch, BatchSummary, CombatDelta, Command, Turn};
pub use config::{GrowthConfig, SimulationConfig};
pub use engine::{EngineReport, EngineState, SimulationEngine, TurnLoop, TurnStats};
pub use error::{SimError, SimResult};
pub use growth::{GrowthPolicy, NeverGrow, ThroughputGrowth};
pub use rng::{damage_for, DamageRng, ScriptedRolls, SeededRng, ROLL_SIDES};
