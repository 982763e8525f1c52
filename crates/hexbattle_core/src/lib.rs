//! # HEXBATTLE Core
//!
//! Battlefield geometry for a turn-based hex battle:
//! - Cube coordinates, rings and the pointy-top pixel layout
//! - A growable grid that owns its units and recycles retired ones
//! - A read-only archetype catalog
//! - Deterministic breadth-first target acquisition
//!
//! ## Architecture Rules
//!
//! 1. **Single owner** - a grid is touched by one thread; other threads
//!    get a [`Grid::snapshot`]
//! 2. **Fixed neighbour order** - every tie-break derives from
//!    [`DIRECTIONS`]
//! 3. **Faults are errors** - off-grid coordinates and broken occupancy
//!    are never absorbed silently
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hexbattle_core::{ArchetypeCatalog, Faction, Grid, HexCoordinate, PathFinder};
//!
//! let mut grid = Grid::new(2, Arc::new(ArchetypeCatalog::builtin()));
//! grid.spawn(HexCoordinate::axial(-1, 0), "attacker").unwrap();
//! grid.spawn(HexCoordinate::axial(1, 0), "defender").unwrap();
//!
//! let step = PathFinder::new()
//!     .find_step(HexCoordinate::axial(-1, 0), Faction::Attacker, &grid)
//!     .unwrap();
//! assert_eq!(step, HexCoordinate::ORIGIN);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod error;
pub mod grid;
pub mod hex;
pub mod ids;
mod journal;
pub mod layout;
pub mod pathfinding;
pub mod pool;
pub mod seeding;
pub mod unit;

pub use catalog::{Archetype, ArchetypeCatalog, ATTACKER, DEFENDER};
pub use error::{CatalogError, CatalogResult, GridError, GridResult, PathError};
pub use grid::{Expansion, FactionCounts, Grid};
pub use hex::{Direction, HexCoordinate, DIRECTIONS};
pub use ids::IdGenerator;
pub use layout::{Layout, Point};
pub use pathfinding::{find_step, Path, PathFinder};
pub use pool::{PoolStats, UnitPool};
pub use seeding::{AlternatingSeeder, EmptyRings, RingSeeder, UniformSeeder};
pub use unit::{ArchetypeId, Faction, Unit, UnitId};
