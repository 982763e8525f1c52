//! # Battle Error Types
//!
//! Errors raised on the consumer side of a battle.

use thiserror::Error;

use hexbattle_core::{CatalogError, GridError};
use hexbattle_sim::{SimError, Turn};

/// Errors raised while deploying, replaying or configuring a battle.
#[derive(Error, Debug)]
pub enum BattleError {
    /// The consumer grid rejected an operation.
    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    /// The simulation engine failed or refused.
    #[error("simulation error: {0}")]
    Sim(#[from] SimError),

    /// The archetype catalog could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A batch arrived out of turn order.
    #[error("out of order batch: expected turn {expected}, got {got}")]
    OutOfOrderBatch {
        /// Turn the battlefield is waiting for.
        expected: Turn,
        /// Turn that arrived.
        got: Turn,
    },

    /// A command does not match the consumer's grid.
    #[error("replay mismatch on turn {turn}: {reason}")]
    ReplayMismatch {
        /// Turn being applied.
        turn: Turn,
        /// What disagreed.
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text is not valid TOML for the schema.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for battle operations.
pub type BattleResult<T> = Result<T, BattleError>;
