//! # HEXBATTLE
//!
//! The consumer half of the battle and the pieces that tie a session
//! together.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   Batch    ┌──────────────────┐  BattleEvent  ┌──────────────┐
//! │ SimulationEngine │──────────> │   Battlefield    │─────────────> │ Presentation │
//! │  (worker thread) │ <───────── │ (authoritative)  │   EventBus    │              │
//! └──────────────────┘ throughput └──────────────────┘               └──────────────┘
//!                                        ▲
//!                                        │ tick(delta)
//!                                   ┌────┴─────┐
//!                                   │ Playback │
//!                                   └──────────┘
//! ```
//!
//! ## Modules
//!
//! - `battlefield`: replays batches onto the authoritative grid
//! - `deploy`: the initial formation
//! - `events`: battle events and the bus that carries them
//! - `playback`: cadence, throughput feedback, expansion holds
//! - `session`: one battle from config to shutdown
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hexbattle::{Battlefield, Formation};
//! use hexbattle_core::{ArchetypeCatalog, Grid};
//! use hexbattle_sim::{NeverGrow, SeededRng, TurnLoop};
//!
//! let mut field = Battlefield::new(Grid::new(6, Arc::new(ArchetypeCatalog::builtin())));
//! field.deploy(&Formation::default()).unwrap();
//!
//! let mut turns = TurnLoop::new(field.grid().snapshot(), SeededRng::new(1), NeverGrow);
//! let events = field.apply(&turns.run_turn(60).unwrap()).unwrap();
//! assert!(!events.is_empty());
//! assert_eq!(field.last_turn(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod battlefield;
pub mod config;
pub mod deploy;
pub mod error;
pub mod events;
pub mod playback;
pub mod session;
pub mod throughput;

pub use hexbattle_core as core;
pub use hexbattle_sim as sim;

pub use battlefield::{Battlefield, PowerBalance};
pub use config::{BattleConfig, MapConfig, PlaybackConfig};
pub use deploy::Formation;
pub use error::{BattleError, BattleResult};
pub use events::{BattleData, BattleEvent, EventBus, EventReceiver, EventSender};
pub use playback::{Playback, PlaybackStats};
pub use session::BattleSession;
pub use throughput::{FrameClock, ThroughputMeter};
