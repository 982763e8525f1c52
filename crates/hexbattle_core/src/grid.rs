//! # Hex Grid
//!
//! A hexagon of cells around the origin. Owns its units, an occupancy
//! map, the spawn-ordered active list and a free pool of retired units.
//!
//! ## Invariants
//!
//! - Every coordinate with `|q|, |r|, |s| <= radius` is a key, and no
//!   other coordinate is.
//! - A unit's `position` always equals the key mapping to it.
//! - The active list holds exactly the placed units, in spawn order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{Archetype, ArchetypeCatalog};
use crate::error::{GridError, GridResult};
use crate::hex::HexCoordinate;
use crate::ids::IdGenerator;
use crate::journal::{GridEdit, Journal};
use crate::layout::{Layout, Point};
use crate::pool::{PoolStats, UnitPool};
use crate::seeding::{AlternatingSeeder, RingSeeder};
use crate::unit::{Faction, Unit, UnitId};

/// Cells added by one growth step, in ring order.
///
/// Units are value snapshots taken at spawn time; the receiver adopts
/// them into its own grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expansion {
    /// Rings added.
    pub radius_increase: u32,
    /// Each new cell and the unit spawned on it, if any.
    pub cells: Vec<(HexCoordinate, Option<Unit>)>,
}

impl Expansion {
    /// Units spawned by this expansion, in ring order.
    pub fn spawned(&self) -> impl Iterator<Item = &Unit> {
        self.cells.iter().filter_map(|(_, unit)| unit.as_ref())
    }

    /// Number of new cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cells were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Living unit count per faction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FactionCounts {
    /// Attackers on the grid.
    pub attackers: usize,
    /// Defenders on the grid.
    pub defenders: usize,
}

impl FactionCounts {
    /// Count for one faction.
    #[must_use]
    pub const fn of(&self, faction: Faction) -> usize {
        match faction {
            Faction::Attacker => self.attackers,
            Faction::Defender => self.defenders,
        }
    }

    /// Both factions together.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.attackers + self.defenders
    }
}

/// The battlefield.
#[derive(Debug)]
pub struct Grid {
    radius: u32,
    layout: Layout,
    cells: HashMap<HexCoordinate, Option<UnitId>>,
    units: HashMap<UnitId, Unit>,
    active: Vec<UnitId>,
    pool: UnitPool,
    ids: IdGenerator,
    catalog: Arc<ArchetypeCatalog>,
    journal: Option<Journal>,
}

impl Grid {
    /// Empty grid of `radius` with the default layout.
    #[must_use]
    pub fn new(radius: u32, catalog: Arc<ArchetypeCatalog>) -> Self {
        Self::with_layout(radius, Layout::default(), catalog)
    }

    /// Empty grid of `radius` placed on screen by `layout`.
    #[must_use]
    pub fn with_layout(radius: u32, layout: Layout, catalog: Arc<ArchetypeCatalog>) -> Self {
        let cells = HexCoordinate::ORIGIN
            .range(radius)
            .into_iter()
            .map(|hex| (hex, None))
            .collect();
        Self {
            radius,
            layout,
            cells,
            units: HashMap::new(),
            active: Vec::new(),
            pool: UnitPool::new(),
            ids: IdGenerator::default(),
            catalog,
            journal: None,
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Current radius.
    #[inline]
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Screen placement.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Templates this grid spawns from.
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<ArchetypeCatalog> {
        &self.catalog
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether every cube component lies within the radius.
    #[inline]
    #[must_use]
    pub fn in_bounds(&self, hex: HexCoordinate) -> bool {
        let radius = i64::from(self.radius);
        [hex.q(), hex.r(), hex.s()]
            .into_iter()
            .all(|c| (-radius..=radius).contains(&i64::from(c)))
    }

    fn check_bounds(&self, hex: HexCoordinate) -> GridResult<()> {
        if self.in_bounds(hex) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                coord: hex,
                radius: self.radius,
            })
        }
    }

    #[inline]
    fn occupant_id(&self, hex: HexCoordinate) -> Option<UnitId> {
        self.cells.get(&hex).copied().flatten()
    }

    /// In-bounds neighbours of `hex`, in enumeration order.
    pub fn neighbors(&self, hex: HexCoordinate) -> impl Iterator<Item = HexCoordinate> + '_ {
        hex.neighbors().into_iter().filter(move |n| self.in_bounds(*n))
    }

    /// The unit on `hex`, if any.
    ///
    /// # Errors
    ///
    /// [`GridError::OutOfBounds`] if `hex` is not on the grid.
    pub fn unit_at(&self, hex: HexCoordinate) -> GridResult<Option<&Unit>> {
        self.check_bounds(hex)?;
        Ok(self.occupant_id(hex).and_then(|id| self.units.get(&id)))
    }

    /// Mutable access to the unit on `hex`, if any.
    ///
    /// # Errors
    ///
    /// [`GridError::OutOfBounds`] if `hex` is not on the grid.
    pub fn unit_at_mut(&mut self, hex: HexCoordinate) -> GridResult<Option<&mut Unit>> {
        self.check_bounds(hex)?;
        match self.occupant_id(hex) {
            Some(id) => Ok(self.units.get_mut(&id)),
            None => Ok(None),
        }
    }

    /// Whether `hex` holds a unit.
    ///
    /// # Errors
    ///
    /// [`GridError::OutOfBounds`] if `hex` is not on the grid.
    pub fn is_occupied(&self, hex: HexCoordinate) -> GridResult<bool> {
        self.check_bounds(hex)?;
        Ok(self.occupant_id(hex).is_some())
    }

    /// Unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Mutable unit by id.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Placed unit ids in spawn order.
    #[inline]
    #[must_use]
    pub fn active_ids(&self) -> &[UnitId] {
        &self.active
    }

    /// Placed units in spawn order.
    pub fn active_units(&self) -> impl Iterator<Item = &Unit> {
        self.active.iter().filter_map(move |id| self.units.get(id))
    }

    /// Number of placed units.
    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Placed units per faction.
    #[must_use]
    pub fn faction_counts(&self) -> FactionCounts {
        self.active_units()
            .fold(FactionCounts::default(), |mut counts, unit| {
                match unit.faction() {
                    Faction::Attacker => counts.attackers += 1,
                    Faction::Defender => counts.defenders += 1,
                }
                counts
            })
    }

    /// Every cell and its unit, in no particular order.
    pub fn cells(&self) -> impl Iterator<Item = (HexCoordinate, Option<&Unit>)> {
        self.cells
            .iter()
            .map(move |(hex, id)| (*hex, id.and_then(|id| self.units.get(&id))))
    }

    /// Pixel center of `hex` under this grid's layout.
    #[must_use]
    pub fn hex_to_pixel(&self, hex: HexCoordinate) -> Point {
        self.layout.hex_to_pixel(hex)
    }

    /// Free pool counters.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Spawns a unit of catalog template `archetype` on `hex`.
    ///
    /// # Errors
    ///
    /// - [`GridError::OutOfBounds`] if `hex` is off the grid
    /// - [`GridError::UnknownArchetype`] if the catalog lacks the id
    /// - [`GridError::CellOccupiedOnSpawn`] if `hex` already holds a unit
    pub fn spawn(&mut self, hex: HexCoordinate, archetype: &str) -> GridResult<UnitId> {
        let catalog = Arc::clone(&self.catalog);
        let template = catalog
            .lookup(archetype)
            .ok_or_else(|| GridError::UnknownArchetype(archetype.to_owned()))?;
        self.spawn_archetype(hex, template)
    }

    /// Spawns a unit from an explicit template.
    ///
    /// # Errors
    ///
    /// [`GridError::OutOfBounds`] or [`GridError::CellOccupiedOnSpawn`].
    pub fn spawn_archetype(&mut self, hex: HexCoordinate, archetype: &Archetype) -> GridResult<UnitId> {
        self.check_bounds(hex)?;
        if self.occupant_id(hex).is_some() {
            return Err(GridError::CellOccupiedOnSpawn(hex));
        }
        let id = self.ids.next_id();
        let unit = self.pool.acquire(id, hex, archetype);
        self.insert_unit(hex, unit);
        Ok(id)
    }

    fn insert_unit(&mut self, hex: HexCoordinate, unit: Unit) {
        let id = unit.id();
        self.cells.insert(hex, Some(id));
        self.active.push(id);
        self.units.insert(id, unit);
        self.record(GridEdit::Inserted { hex, id });
    }

    fn record(&mut self, edit: GridEdit) {
        if let Some(journal) = &mut self.journal {
            journal.edits.push(edit);
        }
    }

    /// Places an existing unit value on `hex`, keeping its id.
    ///
    /// Used by a consumer replaying growth it did not simulate itself.
    ///
    /// # Errors
    ///
    /// - [`GridError::OutOfBounds`] if `hex` is off the grid
    /// - [`GridError::CellOccupiedOnSpawn`] if `hex` already holds a unit
    /// - [`GridError::DuplicateUnit`] if the id is already placed
    pub fn adopt(&mut self, hex: HexCoordinate, mut unit: Unit) -> GridResult<()> {
        self.check_bounds(hex)?;
        if self.occupant_id(hex).is_some() {
            return Err(GridError::CellOccupiedOnSpawn(hex));
        }
        if self.units.contains_key(&unit.id()) {
            return Err(GridError::DuplicateUnit(unit.id()));
        }
        unit.set_position(hex);
        self.ids.observe(unit.id());
        self.insert_unit(hex, unit);
        Ok(())
    }

    /// Removes the unit on `hex` and retires it to the pool.
    ///
    /// # Errors
    ///
    /// [`GridError::OutOfBounds`] or [`GridError::CellEmptyOnRemove`].
    pub fn remove(&mut self, hex: HexCoordinate) -> GridResult<UnitId> {
        self.check_bounds(hex)?;
        let id = self
            .occupant_id(hex)
            .ok_or(GridError::CellEmptyOnRemove(hex))?;
        self.cells.insert(hex, None);
        let index = self.active.iter().position(|active| *active == id);
        if let Some(index) = index {
            self.active.remove(index);
        }
        if let Some(unit) = self.units.remove(&id) {
            if let (Some(journal), Some(index)) = (&mut self.journal, index) {
                journal.edits.push(GridEdit::Removed {
                    hex,
                    unit: unit.clone(),
                    index,
                });
            }
            self.pool.release(unit);
        }
        Ok(id)
    }

    /// Moves the unit on `from` to the empty cell `to`.
    ///
    /// # Errors
    ///
    /// - [`GridError::OutOfBounds`] if either cell is off the grid
    /// - [`GridError::CellEmptyOnRemove`] if `from` is empty
    /// - [`GridError::CellOccupiedOnSpawn`] if `to` is occupied
    pub fn relocate(&mut self, from: HexCoordinate, to: HexCoordinate) -> GridResult<UnitId> {
        self.check_bounds(from)?;
        self.check_bounds(to)?;
        let id = self
            .occupant_id(from)
            .ok_or(GridError::CellEmptyOnRemove(from))?;
        if self.occupant_id(to).is_some() {
            return Err(GridError::CellOccupiedOnSpawn(to));
        }
        self.cells.insert(from, None);
        self.cells.insert(to, Some(id));
        if let Some(unit) = self.units.get_mut(&id) {
            unit.set_position(to);
        }
        self.record(GridEdit::Relocated { from, to });
        Ok(id)
    }

    /// Overwrites the hit points of unit `id`. Returns the old value, or
    /// `None` if no such unit is placed.
    pub fn set_hp(&mut self, id: UnitId, hp: i32) -> Option<i32> {
        let unit = self.units.get_mut(&id)?;
        let old = unit.current_hp();
        unit.set_hp(hp);
        self.record(GridEdit::HpChanged { id, old });
        Some(old)
    }

    /// Grows the grid by `increase` rings, seeding them with the default
    /// alternating pattern.
    ///
    /// # Errors
    ///
    /// [`GridError::NoArchetypeForFaction`] if the catalog cannot supply
    /// a seeded faction. The grid is left unchanged in that case.
    pub fn grow(&mut self, increase: u32) -> GridResult<Expansion> {
        self.grow_with(increase, &mut AlternatingSeeder::default())
    }

    /// Grows the grid by `increase` rings, asking `seeder` which faction
    /// fills each one. Rings are processed innermost first, each walked
    /// in ring order.
    ///
    /// # Errors
    ///
    /// [`GridError::NoArchetypeForFaction`] if the catalog cannot supply
    /// a seeded faction. The grid is left unchanged in that case.
    pub fn grow_with(&mut self, increase: u32, seeder: &mut dyn RingSeeder) -> GridResult<Expansion> {
        let first_ring = self.radius + 1;
        let last_ring = self.radius + increase;

        let catalog = Arc::clone(&self.catalog);
        let mut plan = Vec::with_capacity(increase as usize);
        for ring in first_ring..=last_ring {
            let template = match seeder.faction_for(ring) {
                Some(faction) => Some(
                    catalog
                        .primary_for(faction)
                        .ok_or(GridError::NoArchetypeForFaction(faction))?,
                ),
                None => None,
            };
            plan.push((ring, template));
        }

        self.record(GridEdit::Extended {
            old_radius: self.radius,
        });
        self.radius = last_ring;
        let mut cells = Vec::new();
        for (ring, template) in plan {
            for hex in HexCoordinate::ORIGIN.ring(ring) {
                self.cells.insert(hex, None);
                let spawned = match template {
                    Some(template) => {
                        let id = self.spawn_archetype(hex, template)?;
                        self.units.get(&id).cloned()
                    }
                    None => None,
                };
                cells.push((hex, spawned));
            }
        }

        Ok(Expansion {
            radius_increase: increase,
            cells,
        })
    }

    /// Adds `increase` empty rings and returns the new coordinates.
    pub fn extend_radius(&mut self, increase: u32) -> Vec<HexCoordinate> {
        let first_ring = self.radius + 1;
        self.record(GridEdit::Extended {
            old_radius: self.radius,
        });
        self.radius += increase;
        let mut added = Vec::new();
        for ring in first_ring..=self.radius {
            for hex in HexCoordinate::ORIGIN.ring(ring) {
                self.cells.insert(hex, None);
                added.push(hex);
            }
        }
        added
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Independent deep copy: new occupancy map, new unit values, same
    /// ids. The id counter is copied and the read-only catalog shared;
    /// the free pool starts empty and no journal is open.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            radius: self.radius,
            layout: self.layout,
            cells: self.cells.clone(),
            units: self.units.clone(),
            active: self.active.clone(),
            pool: UnitPool::new(),
            ids: self.ids,
            catalog: Arc::clone(&self.catalog),
            journal: None,
        }
    }

    /// Replaces this grid's state with a copy of `snapshot`. The free
    /// pool is kept and any open journal is discarded.
    pub fn restore(&mut self, snapshot: &Self) {
        self.radius = snapshot.radius;
        self.layout = snapshot.layout;
        self.cells.clone_from(&snapshot.cells);
        self.units.clone_from(&snapshot.units);
        self.active.clone_from(&snapshot.active);
        self.ids = snapshot.ids;
        self.catalog = Arc::clone(&snapshot.catalog);
        self.journal = None;
    }

    // =========================================================================
    // JOURNAL
    // =========================================================================

    /// Starts recording undo information for every following edit,
    /// discarding any journal already open.
    pub fn begin_journal(&mut self) {
        self.journal = Some(Journal::open(self.ids));
    }

    /// Whether edits are being recorded.
    #[inline]
    #[must_use]
    pub const fn is_journaling(&self) -> bool {
        self.journal.is_some()
    }

    /// Keeps every recorded edit and closes the journal. Returns the
    /// number of edits recorded.
    pub fn commit_journal(&mut self) -> usize {
        self.journal.take().map_or(0, |journal| journal.edits.len())
    }

    /// Reverses every recorded edit, newest first, and closes the
    /// journal. Returns the number of edits undone. The free pool is not
    /// rewound.
    pub fn rollback_journal(&mut self) -> usize {
        let Some(journal) = self.journal.take() else {
            return 0;
        };
        let undone = journal.edits.len();
        for edit in journal.edits.into_iter().rev() {
            match edit {
                GridEdit::Inserted { hex, id } => {
                    self.cells.insert(hex, None);
                    if let Some(index) = self.active.iter().rposition(|active| *active == id) {
                        self.active.remove(index);
                    }
                    self.units.remove(&id);
                }
                GridEdit::Removed { hex, unit, index } => {
                    let id = unit.id();
                    self.cells.insert(hex, Some(id));
                    self.active.insert(index.min(self.active.len()), id);
                    self.units.insert(id, unit);
                }
                GridEdit::Relocated { from, to } => {
                    if let Some(id) = self.cells.insert(to, None).flatten() {
                        self.cells.insert(from, Some(id));
                        if let Some(unit) = self.units.get_mut(&id) {
                            unit.set_position(from);
                        }
                    }
                }
                GridEdit::HpChanged { id, old } => {
                    if let Some(unit) = self.units.get_mut(&id) {
                        unit.set_hp(old);
                    }
                }
                GridEdit::Extended { old_radius } => {
                    for ring in old_radius + 1..=self.radius {
                        for hex in HexCoordinate::ORIGIN.ring(ring) {
                            self.cells.remove(&hex);
                        }
                    }
                    self.radius = old_radius;
                }
            }
        }
        self.ids = journal.ids;
        undone
    }

    /// Checks every structural invariant.
    ///
    /// # Errors
    ///
    /// [`GridError::Inconsistent`] describing the first violation found.
    pub fn validate(&self) -> GridResult<()> {
        let expected = HexCoordinate::cells_within(self.radius);
        if self.cells.len() != expected {
            return Err(GridError::Inconsistent(format!(
                "{} cells for radius {}, expected {expected}",
                self.cells.len(),
                self.radius
            )));
        }
        if let Some(stray) = self.cells.keys().find(|hex| !self.in_bounds(**hex)) {
            return Err(GridError::Inconsistent(format!("cell {stray} is out of bounds")));
        }
        let mut occupied = 0;
        for (hex, id) in &self.cells {
            let Some(id) = id else { continue };
            occupied += 1;
            match self.units.get(id) {
                Some(unit) if unit.position() == *hex => {}
                Some(unit) => {
                    return Err(GridError::Inconsistent(format!(
                        "unit {id} is keyed at {hex} but positioned at {}",
                        unit.position()
                    )))
                }
                None => {
                    return Err(GridError::Inconsistent(format!("cell {hex} maps to missing unit {id}")))
                }
            }
        }
        if occupied != self.units.len() || self.active.len() != self.units.len() {
            return Err(GridError::Inconsistent(format!(
                "{occupied} occupied cells, {} units, {} active",
                self.units.len(),
                self.active.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ATTACKER, DEFENDER};
    use crate::seeding::EmptyRings;

    fn grid(radius: u32) -> Grid {
        Grid::new(radius, Arc::new(ArchetypeCatalog::builtin()))
    }

    #[test]
    fn test_new_grid_has_hexagon_of_cells() {
        for radius in 0..6 {
            let grid = grid(radius);
            assert_eq!(grid.cell_count(), 3 * (radius as usize) * (radius as usize + 1) + 1);
            assert!(grid.validate().is_ok());
        }
    }

    #[test]
    fn test_in_bounds() {
        let grid = grid(2);
        assert!(grid.in_bounds(HexCoordinate::axial(2, -2)));
        assert!(grid.in_bounds(HexCoordinate::axial(-1, -1)));
        assert!(!grid.in_bounds(HexCoordinate::axial(3, -1)));
        assert!(!grid.in_bounds(HexCoordinate::axial(2, 1)));
    }

    #[test]
    fn test_spawn_and_lookup() {
        let mut grid = grid(2);
        let hex = HexCoordinate::axial(1, 0);
        let id = grid.spawn(hex, ATTACKER).unwrap();
        let unit = grid.unit_at(hex).unwrap().unwrap();
        assert_eq!(unit.id(), id);
        assert_eq!(unit.position(), hex);
        assert_eq!(grid.active_ids(), &[id]);
    }

    #[test]
    fn test_spawn_errors() {
        let mut grid = grid(1);
        let hex = HexCoordinate::ORIGIN;
        grid.spawn(hex, DEFENDER).unwrap();
        assert_eq!(grid.spawn(hex, ATTACKER), Err(GridError::CellOccupiedOnSpawn(hex)));
        assert_eq!(
            grid.spawn(HexCoordinate::axial(1, 0), "dragon"),
            Err(GridError::UnknownArchetype("dragon".into()))
        );
        let far = HexCoordinate::axial(5, 0);
        assert_eq!(
            grid.spawn(far, ATTACKER),
            Err(GridError::OutOfBounds { coord: far, radius: 1 })
        );
    }

    #[test]
    fn test_out_of_bounds_lookup_is_an_error() {
        let grid = grid(1);
        assert!(matches!(
            grid.unit_at(HexCoordinate::axial(0, 4)),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_remove_reuses_pool_and_keeps_order() {
        let mut grid = grid(2);
        let a = grid.spawn(HexCoordinate::axial(1, 0), ATTACKER).unwrap();
        let b = grid.spawn(HexCoordinate::axial(0, 1), ATTACKER).unwrap();
        let c = grid.spawn(HexCoordinate::axial(-1, 0), DEFENDER).unwrap();

        assert_eq!(grid.remove(HexCoordinate::axial(0, 1)), Ok(b));
        assert_eq!(grid.active_ids(), &[a, c]);
        assert_eq!(grid.pool_stats().free, 1);

        let d = grid.spawn(HexCoordinate::axial(0, 1), DEFENDER).unwrap();
        assert_ne!(d, b);
        assert_eq!(grid.pool_stats().recycled, 1);
        assert_eq!(grid.unit(d).unwrap().current_hp(), 30);
        assert_eq!(grid.active_ids(), &[a, c, d]);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_remove_empty_cell() {
        let mut grid = grid(1);
        assert_eq!(
            grid.remove(HexCoordinate::ORIGIN),
            Err(GridError::CellEmptyOnRemove(HexCoordinate::ORIGIN))
        );
    }

    #[test]
    fn test_relocate() {
        let mut grid = grid(2);
        let from = HexCoordinate::axial(2, 0);
        let to = HexCoordinate::axial(1, 0);
        let id = grid.spawn(from, ATTACKER).unwrap();
        assert_eq!(grid.relocate(from, to), Ok(id));
        assert!(grid.unit_at(from).unwrap().is_none());
        assert_eq!(grid.unit(id).unwrap().position(), to);

        grid.spawn(from, DEFENDER).unwrap();
        assert_eq!(grid.relocate(to, from), Err(GridError::CellOccupiedOnSpawn(from)));
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_grow_from_six_by_four() {
        let mut grid = grid(6);
        let expansion = grid.grow(4).unwrap();

        assert_eq!(grid.radius(), 10);
        assert_eq!(grid.cell_count(), 331);
        assert_eq!(expansion.len(), 42 + 48 + 54 + 60);

        let counts = grid.faction_counts();
        assert_eq!(counts.defenders, 42);
        assert_eq!(counts.attackers, 54);

        for (hex, unit) in &expansion.cells {
            match hex.length() {
                7 => assert_eq!(unit.as_ref().unwrap().faction(), Faction::Defender),
                9 => assert_eq!(unit.as_ref().unwrap().faction(), Faction::Attacker),
                8 | 10 => assert!(unit.is_none()),
                other => panic!("unexpected ring {other}"),
            }
        }
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_grow_single_ring_around_lone_attacker() {
        let mut grid = grid(0);
        grid.spawn(HexCoordinate::ORIGIN, ATTACKER).unwrap();
        let expansion = grid.grow(1).unwrap();

        let coords: Vec<_> = expansion.cells.iter().map(|(hex, _)| *hex).collect();
        assert_eq!(coords, HexCoordinate::ORIGIN.ring(1));
        for (hex, unit) in &expansion.cells {
            let unit = unit.as_ref().unwrap();
            assert_eq!(unit.position(), *hex);
            assert_eq!(unit.faction(), Faction::Defender);
        }
        assert_eq!(grid.active_count(), 7);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_grow_alternates_across_odd_rings() {
        let mut grid = grid(0);
        grid.grow(4).unwrap();
        let ring_faction = |ring: u32| {
            grid.unit_at(HexCoordinate::ORIGIN.ring(ring)[0])
                .unwrap()
                .map(Unit::faction)
        };
        assert_eq!(ring_faction(1), Some(Faction::Defender));
        assert_eq!(ring_faction(2), None);
        assert_eq!(ring_faction(3), Some(Faction::Attacker));
        assert_eq!(ring_faction(4), None);
    }

    #[test]
    fn test_grow_missing_faction_leaves_grid_untouched() {
        let catalog = ArchetypeCatalog::new(vec![ArchetypeCatalog::builtin()
            .lookup(ATTACKER)
            .unwrap()
            .clone()])
        .unwrap();
        // Ring 1 is seeded with defenders, which this catalog lacks.
        let mut grid = Grid::new(0, Arc::new(catalog));
        grid.spawn(HexCoordinate::ORIGIN, ATTACKER).unwrap();
        assert_eq!(
            grid.grow(1),
            Err(GridError::NoArchetypeForFaction(Faction::Defender))
        );
        assert_eq!(grid.radius(), 0);
        assert_eq!(grid.cell_count(), 1);
        assert_eq!(grid.active_count(), 1);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_grow_with_empty_rings() {
        let mut grid = grid(1);
        let expansion = grid.grow_with(2, &mut EmptyRings).unwrap();
        assert_eq!(expansion.spawned().count(), 0);
        assert_eq!(expansion.len(), 12 + 18);
        assert_eq!(grid.radius(), 3);
        assert_eq!(grid.cell_count(), 37);
    }

    #[test]
    fn test_extend_radius_then_adopt() {
        let mut source = grid(0);
        let expansion = source.grow(1).unwrap();
        assert_eq!(expansion.spawned().count(), 6);

        let mut mirror = grid(0);
        let added = mirror.extend_radius(1);
        assert_eq!(added.len(), 6);
        for (hex, unit) in expansion.cells {
            if let Some(unit) = unit {
                mirror.adopt(hex, unit).unwrap();
            }
        }
        assert_eq!(mirror.faction_counts(), source.faction_counts());
        assert!(mirror.validate().is_ok());
    }

    #[test]
    fn test_adopt_rejects_duplicate() {
        let mut grid = grid(1);
        let id = grid.spawn(HexCoordinate::ORIGIN, DEFENDER).unwrap();
        let copy = grid.unit(id).unwrap().clone();
        assert_eq!(
            grid.adopt(HexCoordinate::axial(1, 0), copy),
            Err(GridError::DuplicateUnit(id))
        );
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut grid = grid(2);
        let hex = HexCoordinate::axial(1, 0);
        let id = grid.spawn(hex, ATTACKER).unwrap();

        let mut snapshot = grid.snapshot();
        snapshot.unit_mut(id).unwrap().take_damage(3);
        snapshot.relocate(hex, HexCoordinate::axial(2, 0)).unwrap();

        assert_eq!(grid.unit(id).unwrap().current_hp(), 10);
        assert_eq!(grid.unit(id).unwrap().position(), hex);
        assert_eq!(snapshot.unit(id).unwrap().current_hp(), 7);
    }

    #[test]
    fn test_snapshot_continues_ids_independently() {
        let mut grid = grid(2);
        let first = grid.spawn(HexCoordinate::ORIGIN, DEFENDER).unwrap();
        let mut worker = grid.snapshot();
        worker.grow(1).unwrap();
        let worker_next = worker.spawn(HexCoordinate::axial(1, 0), ATTACKER).unwrap();
        assert!(worker_next > first);

        // Growth on the copy does not advance the original's counter.
        let own = grid.spawn(HexCoordinate::axial(0, 1), ATTACKER).unwrap();
        assert_eq!(own, UnitId(first.0 + 1));

        // Adopting the copy's units moves the original past their ids.
        let adopted = worker.unit(worker_next).unwrap().clone();
        grid.adopt(HexCoordinate::axial(1, 0), adopted).unwrap();
        assert!(grid.spawn(HexCoordinate::axial(-1, 0), DEFENDER).unwrap() > worker_next);
    }

    #[test]
    fn test_rollback_reverses_every_edit() {
        let mut grid = grid(1);
        let defender = grid.spawn(HexCoordinate::ORIGIN, DEFENDER).unwrap();
        let attacker = grid.spawn(HexCoordinate::axial(1, 0), ATTACKER).unwrap();
        let bystander = grid.spawn(HexCoordinate::axial(-1, 0), ATTACKER).unwrap();
        let before: Vec<_> = grid.active_units().cloned().collect();
        let next_id = grid.spawn(HexCoordinate::axial(0, 1), DEFENDER).unwrap();
        grid.remove(HexCoordinate::axial(0, 1)).unwrap();

        grid.begin_journal();
        assert_eq!(grid.set_hp(defender, 0), Some(30));
        grid.remove(HexCoordinate::ORIGIN).unwrap();
        grid.relocate(HexCoordinate::axial(1, 0), HexCoordinate::ORIGIN).unwrap();
        grid.grow(2).unwrap();
        grid.extend_radius(1);
        assert_eq!(grid.set_hp(attacker, 4), Some(10));

        assert!(grid.rollback_journal() > 0);
        assert!(!grid.is_journaling());
        assert_eq!(grid.radius(), 1);
        assert_eq!(grid.cell_count(), 7);
        assert_eq!(grid.active_ids(), &[defender, attacker, bystander]);
        assert_eq!(grid.active_units().cloned().collect::<Vec<_>>(), before);
        assert!(grid.validate().is_ok());
        // Ids issued inside the journal are issued again.
        let reissued = grid.spawn(HexCoordinate::axial(0, 1), DEFENDER).unwrap();
        assert_eq!(reissued, UnitId(next_id.0 + 1));
    }

    #[test]
    fn test_commit_keeps_edits() {
        let mut grid = grid(1);
        let id = grid.spawn(HexCoordinate::ORIGIN, DEFENDER).unwrap();
        grid.begin_journal();
        grid.set_hp(id, 12);
        grid.extend_radius(1);
        assert_eq!(grid.commit_journal(), 2);
        assert_eq!(grid.rollback_journal(), 0);
        assert_eq!(grid.radius(), 2);
        assert_eq!(grid.unit(id).unwrap().current_hp(), 12);
    }

    #[test]
    fn test_edits_outside_a_journal_are_not_recorded() {
        let mut grid = grid(1);
        grid.spawn(HexCoordinate::ORIGIN, DEFENDER).unwrap();
        assert_eq!(grid.rollback_journal(), 0);
        assert_eq!(grid.active_count(), 1);
    }

    #[test]
    fn test_restore() {
        let mut grid = grid(1);
        grid.spawn(HexCoordinate::ORIGIN, DEFENDER).unwrap();
        let saved = grid.snapshot();
        grid.remove(HexCoordinate::ORIGIN).unwrap();
        grid.grow(2).unwrap();

        grid.restore(&saved);
        assert_eq!(grid.radius(), 1);
        assert_eq!(grid.active_count(), 1);
        assert!(grid.validate().is_ok());
    }
}
