//! # Grid Journal
//!
//! Undo records for a run of grid edits. While a journal is open every
//! structural edit made through [`Grid`](crate::grid::Grid) pushes the
//! information needed to reverse it, so a rejected batch is rolled back
//! in proportion to what it touched rather than to the size of the map.
//!
//! Edits made through `unit_mut` are not recorded; use
//! [`Grid::set_hp`](crate::grid::Grid::set_hp) for journaled hit points.

use crate::hex::HexCoordinate;
use crate::ids::IdGenerator;
use crate::unit::{Unit, UnitId};

/// One reversible grid edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum GridEdit {
    /// A unit was placed on an empty cell.
    Inserted { hex: HexCoordinate, id: UnitId },
    /// A unit left the grid. `index` is its place in the active list.
    Removed {
        hex: HexCoordinate,
        unit: Unit,
        index: usize,
    },
    /// A unit moved between cells.
    Relocated { from: HexCoordinate, to: HexCoordinate },
    /// A unit's hit points were overwritten.
    HpChanged { id: UnitId, old: i32 },
    /// Rings were added beyond `old_radius`.
    Extended { old_radius: u32 },
}

/// Edits recorded since the journal was opened.
#[derive(Clone, Debug)]
pub(crate) struct Journal {
    /// Id counter when the journal was opened.
    pub ids: IdGenerator,
    /// Edits in the order they were made.
    pub edits: Vec<GridEdit>,
}

impl Journal {
    pub fn open(ids: IdGenerator) -> Self {
        Self {
            ids,
            edits: Vec::new(),
        }
    }
}
