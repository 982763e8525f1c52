//! # Unit Pool
//!
//! Free list of retired units. Spawning reuses a retired unit's
//! allocations instead of building a new one.

use crate::catalog::Archetype;
use crate::hex::HexCoordinate;
use crate::unit::{Unit, UnitId};

/// Free list for [`Unit`] values.
///
/// # Thread Safety
///
/// Owned by a single grid. The simulation worker and the consumer each
/// have their own grid and therefore their own pool.
#[derive(Debug, Default)]
pub struct UnitPool {
    /// Retired units, reused LIFO.
    free_list: Vec<Unit>,
    /// Units built from scratch.
    created: u64,
    /// Units served from the free list.
    recycled: u64,
}

/// Pool counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Retired units waiting for reuse.
    pub free: usize,
    /// Units built from scratch.
    pub created: u64,
    /// Units served from the free list.
    pub recycled: u64,
}

impl UnitPool {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            free_list: Vec::new(),
            created: 0,
            recycled: 0,
        }
    }

    /// Hands out a fresh unit, reusing the most recently retired one if
    /// there is any.
    pub fn acquire(&mut self, id: UnitId, position: HexCoordinate, archetype: &Archetype) -> Unit {
        if let Some(mut unit) = self.free_list.pop() {
            self.recycled += 1;
            unit.reincarnate(id, position, archetype);
            unit
        } else {
            self.created += 1;
            Unit::new(id, position, archetype)
        }
    }

    /// Returns a removed unit to the free list.
    pub fn release(&mut self, unit: Unit) {
        self.free_list.push(unit);
    }

    /// Retired units waiting for reuse.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            free: self.free_list.len(),
            created: self.created,
            recycled: self.recycled,
        }
    }

    /// Drops every retired unit.
    pub fn clear(&mut self) {
        self.free_list.clear();
    }
}
