//! # Initial Deployment
//!
//! Defenders hold a disc around the center, attackers the outer rings.
//! Cells in between start empty.

use hexbattle_core::{ArchetypeId, Grid, GridError, GridResult, HexCoordinate, UnitId, ATTACKER, DEFENDER};

use crate::config::MapConfig;

/// Who starts where.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Formation {
    defender_radius: u32,
    attacker_band: u32,
    defender: ArchetypeId,
    attacker: ArchetypeId,
}

impl Default for Formation {
    fn default() -> Self {
        Self::new(2, 2)
    }
}

impl Formation {
    /// Built-in archetypes: defenders within `defender_radius` of the
    /// center, attackers on the outermost `attacker_band` rings.
    #[must_use]
    pub fn new(defender_radius: u32, attacker_band: u32) -> Self {
        Self {
            defender_radius,
            attacker_band,
            defender: ArchetypeId::from(DEFENDER),
            attacker: ArchetypeId::from(ATTACKER),
        }
    }

    /// Formation described by the `[map]` section.
    #[must_use]
    pub fn from_config(map: &MapConfig) -> Self {
        Self::new(map.defender_radius, map.attacker_band)
            .with_archetypes(map.defender_archetype.as_str(), map.attacker_archetype.as_str())
    }

    /// Overrides the deployed archetypes.
    #[must_use]
    pub fn with_archetypes(mut self, defender: impl Into<String>, attacker: impl Into<String>) -> Self {
        self.defender = ArchetypeId::new(defender);
        self.attacker = ArchetypeId::new(attacker);
        self
    }

    /// Archetype for `hex` on a map of `radius`, if the cell is manned.
    /// Defenders win where the two zones overlap.
    #[must_use]
    pub fn archetype_at(&self, hex: HexCoordinate, radius: u32) -> Option<&ArchetypeId> {
        let distance = hex.length();
        if distance <= self.defender_radius {
            Some(&self.defender)
        } else if distance + self.attacker_band > radius {
            Some(&self.attacker)
        } else {
            None
        }
    }

    /// Spawns the formation on `grid` in spiral order from the center.
    ///
    /// # Errors
    ///
    /// [`GridError::UnknownArchetype`] if the catalog lacks a deployed
    /// archetype, or [`GridError::CellOccupiedOnSpawn`] if the grid is
    /// not empty where the formation stands.
    pub fn deploy(&self, grid: &mut Grid) -> GridResult<Vec<UnitId>> {
        for archetype in [&self.defender, &self.attacker] {
            if grid.catalog().lookup(archetype.as_str()).is_none() {
                return Err(GridError::UnknownArchetype(archetype.to_string()));
            }
        }

        let radius = grid.radius();
        let mut deployed = Vec::new();
        for hex in HexCoordinate::ORIGIN.range(radius) {
            if let Some(archetype) = self.archetype_at(hex, radius) {
                deployed.push(grid.spawn(hex, archetype.as_str())?);
            }
        }
        tracing::info!(
            "deployed {} units on a radius {} map",
            deployed.len(),
            radius
        );
        Ok(deployed)
    }
}
