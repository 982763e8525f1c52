//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! backlog_threshold = 10
//! turn_interval_ms = 333
//! seed = 42
//!
//! [growth]
//! min_throughput = 30
//! bootstrap_turns = 20
//! increase = 4
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// When and by how much the map grows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Grow while reported throughput is strictly above this.
    pub min_throughput: u32,
    /// Grow unconditionally while the turn number is below this.
    pub bootstrap_turns: u64,
    /// Rings added per growth.
    pub increase: u32,
    /// Never grow beyond this radius.
    pub max_radius: Option<u32>,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            min_throughput: 30,
            bootstrap_turns: 20,
            increase: 4,
            max_radius: None,
        }
    }
}

/// Turn worker settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Queued batches at which the worker stops producing.
    pub backlog_threshold: usize,
    /// Pause between turns in milliseconds. Zero runs flat out.
    pub turn_interval_ms: u64,
    /// How often a throttled worker re-checks the queue and the stop flag.
    pub backpressure_poll_ms: u64,
    /// Damage RNG seed. `None` seeds from the clock.
    pub seed: Option<u64>,
    /// Map growth policy.
    pub growth: GrowthConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            backlog_threshold: 10,
            turn_interval_ms: 333,
            backpressure_poll_ms: 100,
            seed: None,
            growth: GrowthConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Configuration for tests: no pacing, fast polling, fixed seed.
    #[must_use]
    pub fn unpaced(seed: u64) -> Self {
        Self {
            turn_interval_ms: 0,
            backpressure_poll_ms: 1,
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] or [`SimError::InvalidConfig`].
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// I/O failures plus everything [`Self::from_toml_str`] reports.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> SimResult<()> {
        if self.backlog_threshold == 0 {
            return Err(SimError::InvalidConfig("backlog_threshold must be at least 1".into()));
        }
        if self.backpressure_poll_ms == 0 {
            return Err(SimError::InvalidConfig("backpressure_poll_ms must be at least 1".into()));
        }
        if self.growth.increase == 0 {
            return Err(SimError::InvalidConfig("growth.increase must be at least 1".into()));
        }
        Ok(())
    }

    /// Pause between turns.
    #[must_use]
    pub fn turn_interval(&self) -> Duration {
        Duration::from_millis(self.turn_interval_ms)
    }

    /// Backpressure polling period.
    #[must_use]
    pub fn backpressure_poll(&self) -> Duration {
        Duration::from_millis(self.backpressure_poll_ms)
    }
}
