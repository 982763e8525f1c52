//! # Battle Configuration
//!
//! One TOML file configures the whole battle. Every section and field
//! is optional.
//!
//! ```toml
//! catalog = "assets/archetypes.toml"
//!
//! [map]
//! radius = 6
//! defender_radius = 2
//! attacker_band = 2
//!
//! [simulation]
//! backlog_threshold = 10
//! seed = 42
//!
//! [simulation.growth]
//! increase = 4
//!
//! [playback]
//! tick_interval_ms = 2000
//! pause_on_expand = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use hexbattle_core::{ArchetypeCatalog, Layout, Point, ATTACKER, DEFENDER};
use hexbattle_sim::SimulationConfig;
use serde::{Deserialize, Serialize};

use crate::error::{BattleError, BattleResult};

/// Initial map and formation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Starting radius.
    pub radius: u32,
    /// Pixel position of the center cell.
    pub origin: [f32; 2],
    /// Pixel size of a cell.
    pub cell_size: [f32; 2],
    /// Defenders fill every cell within this distance of the center.
    pub defender_radius: u32,
    /// Attackers fill this many outermost rings.
    pub attacker_band: u32,
    /// Archetype deployed in the center.
    pub defender_archetype: String,
    /// Archetype deployed on the rim.
    pub attacker_archetype: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            radius: 6,
            origin: [0.0, 0.0],
            cell_size: [1.0, 1.0],
            defender_radius: 2,
            attacker_band: 2,
            defender_archetype: DEFENDER.to_owned(),
            attacker_archetype: ATTACKER.to_owned(),
        }
    }
}

impl MapConfig {
    /// Screen layout of the grid.
    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::new(
            Point::new(self.origin[0], self.origin[1]),
            Point::new(self.cell_size[0], self.cell_size[1]),
        )
    }
}

/// Consumer cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Scaled time between applied batches.
    pub tick_interval_ms: u64,
    /// Window over which frame throughput is measured.
    pub throughput_window_ms: u64,
    /// Playback speed. Zero pauses.
    pub time_scale: f64,
    /// Hold playback after every map expansion until acknowledged.
    pub pause_on_expand: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            throughput_window_ms: 500,
            time_scale: 1.0,
            pause_on_expand: false,
        }
    }
}

impl PlaybackConfig {
    /// Scaled time between applied batches.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Throughput measurement window.
    #[must_use]
    pub fn throughput_window(&self) -> Duration {
        Duration::from_millis(self.throughput_window_ms)
    }
}

/// Everything a battle session needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Archetype catalog file. The built-in catalog is used when absent.
    pub catalog: Option<PathBuf>,
    /// Initial map.
    pub map: MapConfig,
    /// Turn worker.
    pub simulation: SimulationConfig,
    /// Consumer cadence.
    pub playback: PlaybackConfig,
}

impl BattleConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// [`BattleError::Config`] or [`BattleError::InvalidConfig`].
    pub fn from_toml_str(text: &str) -> BattleResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file. A relative catalog path
    /// is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// I/O failures plus everything [`Self::from_toml_str`] reports.
    pub fn load(path: impl AsRef<Path>) -> BattleResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let (Some(catalog), Some(dir)) = (config.catalog.as_mut(), path.parent()) {
            if catalog.is_relative() {
                *catalog = dir.join(&*catalog);
            }
        }
        Ok(config)
    }

    /// Checks value ranges across all sections.
    ///
    /// # Errors
    ///
    /// [`BattleError::InvalidConfig`] naming the first bad field, or the
    /// simulation section's own error.
    pub fn validate(&self) -> BattleResult<()> {
        self.simulation.validate()?;

        let map = &self.map;
        if map.radius == 0 {
            return Err(BattleError::InvalidConfig("map.radius must be at least 1".into()));
        }
        if map.defender_radius + map.attacker_band > map.radius {
            return Err(BattleError::InvalidConfig(format!(
                "map.defender_radius ({}) and map.attacker_band ({}) overlap on a radius {} map",
                map.defender_radius, map.attacker_band, map.radius
            )));
        }
        if map.cell_size.iter().any(|size| !(*size > 0.0 && size.is_finite())) {
            return Err(BattleError::InvalidConfig("map.cell_size must be positive".into()));
        }

        let playback = &self.playback;
        if playback.tick_interval_ms == 0 {
            return Err(BattleError::InvalidConfig("playback.tick_interval_ms must be at least 1".into()));
        }
        if playback.throughput_window_ms == 0 {
            return Err(BattleError::InvalidConfig(
                "playback.throughput_window_ms must be at least 1".into(),
            ));
        }
        if !(playback.time_scale >= 0.0 && playback.time_scale.is_finite()) {
            return Err(BattleError::InvalidConfig("playback.time_scale must be non-negative".into()));
        }
        Ok(())
    }

    /// The configured catalog, or the built-in one.
    ///
    /// # Errors
    ///
    /// [`BattleError::Catalog`] if the file cannot be read or parsed.
    pub fn load_catalog(&self) -> BattleResult<ArchetypeCatalog> {
        match &self.catalog {
            Some(path) => Ok(ArchetypeCatalog::load(path)?),
            None => Ok(ArchetypeCatalog::builtin()),
        }
    }
}
