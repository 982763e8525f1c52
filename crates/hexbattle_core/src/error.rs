//! Error types for the battlefield geometry.
//!
//! Structural faults (bad coordinates, corrupted occupancy) are errors.
//! Ordinary battle outcomes such as "no target reachable" are
//! [`PathError`] values the caller is expected to handle quietly.

use std::path::PathBuf;

use thiserror::Error;

use crate::hex::HexCoordinate;
use crate::unit::{Faction, UnitId};

/// Grid faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Coordinate lies outside the current radius.
    #[error("coordinate {coord} is outside the grid (radius {radius})")]
    OutOfBounds {
        /// The rejected coordinate.
        coord: HexCoordinate,
        /// Grid radius at the time of the call.
        radius: u32,
    },

    /// Spawn or move target already holds a unit.
    #[error("cell {0} is already occupied")]
    CellOccupiedOnSpawn(HexCoordinate),

    /// Remove or move source holds no unit.
    #[error("cell {0} is empty")]
    CellEmptyOnRemove(HexCoordinate),

    /// Archetype id not present in the catalog.
    #[error("unknown archetype: {0}")]
    UnknownArchetype(String),

    /// The catalog has nothing to seed a ring with for this faction.
    #[error("no archetype registered for faction {0:?}")]
    NoArchetypeForFaction(Faction),

    /// A unit with this id is already placed.
    #[error("unit {0} is already on the grid")]
    DuplicateUnit(UnitId),

    /// Cube components do not sum to zero.
    #[error("invalid cube coordinate ({q}, {r}, {s}): components must sum to zero")]
    InvalidCoordinate {
        /// `q` component.
        q: i32,
        /// `r` component.
        r: i32,
        /// `s` component.
        s: i32,
    },

    /// Internal bookkeeping disagrees with itself.
    #[error("grid invariant violated: {0}")]
    Inconsistent(String),
}

/// Result alias for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Why a unit found no step to take this turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// No enemy is reachable from the start cell.
    #[error("no enemy reachable")]
    NoTarget,

    /// The nearest enemy is adjacent; there is nothing to walk.
    #[error("enemy at {goal} is adjacent")]
    ZeroLengthPath {
        /// The enemy cell.
        goal: HexCoordinate,
    },

    /// Structural fault while searching.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Catalog loading failures.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not valid TOML for the schema.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two archetypes share an id.
    #[error("duplicate archetype id: {0}")]
    Duplicate(String),

    /// Archetype would spawn dead units.
    #[error("archetype {id} has non-positive hp {hp}")]
    InvalidHp {
        /// Offending archetype.
        id: String,
        /// Configured hit points.
        hp: i32,
    },
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
