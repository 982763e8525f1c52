//! # Simulation Error Types
//!
//! All errors that can end or refuse a simulation session.

use thiserror::Error;

use hexbattle_core::GridError;

/// Errors raised by the turn worker and its plumbing.
#[derive(Error, Debug)]
pub enum SimError {
    /// The private grid hit a structural fault mid-turn.
    #[error("grid fault: {0}")]
    Grid(#[from] GridError),

    /// `start` was called on an engine that already ran.
    #[error("simulation already started")]
    AlreadyStarted,

    /// The consumer side of the command channel is gone.
    #[error("command channel closed")]
    ChannelClosed,

    /// Stop was requested while a batch was waiting for capacity.
    #[error("simulation cancelled")]
    Cancelled,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text is not valid TOML for the schema.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The worker thread could not be spawned or panicked.
    #[error("worker thread failed: {0}")]
    Worker(String),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
