//! # Units
//!
//! A unit occupies exactly one cell. Hit points and the per-turn flags
//! change only while a turn is being resolved (or while the consumer
//! replays one); position changes only through the grid.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Archetype;
use crate::hex::HexCoordinate;

/// Stable unit identity. Never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two sides of the battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    /// Advances on the center.
    Attacker,
    /// Holds the center.
    Defender,
}

impl Faction {
    /// Both factions.
    pub const ALL: [Self; 2] = [Self::Attacker, Self::Defender];

    /// The other side.
    #[inline]
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attacker => f.write_str("attacker"),
            Self::Defender => f.write_str("defender"),
        }
    }
}

/// Catalog key of a unit template.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeId(String);

impl ArchetypeId {
    /// Wraps an id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ArchetypeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ArchetypeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A combatant on the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    id: UnitId,
    position: HexCoordinate,
    faction: Faction,
    current_hp: i32,
    max_hp: i32,
    movement_range: u32,
    archetype: ArchetypeId,
    moved_this_turn: bool,
    attacked_this_turn: bool,
}

impl Unit {
    /// Creates a fresh unit from a template.
    #[must_use]
    pub fn new(id: UnitId, position: HexCoordinate, archetype: &Archetype) -> Self {
        Self {
            id,
            position,
            faction: archetype.faction,
            current_hp: archetype.hp,
            max_hp: archetype.hp,
            movement_range: archetype.movement_range,
            archetype: archetype.id.clone(),
            moved_this_turn: false,
            attacked_this_turn: false,
        }
    }

    /// Resets a pooled unit to a fresh state, keeping its allocations.
    pub(crate) fn reincarnate(&mut self, id: UnitId, position: HexCoordinate, archetype: &Archetype) {
        self.id = id;
        self.position = position;
        self.faction = archetype.faction;
        self.current_hp = archetype.hp;
        self.max_hp = archetype.hp;
        self.movement_range = archetype.movement_range;
        self.archetype.0.clear();
        self.archetype.0.push_str(archetype.id.as_str());
        self.moved_this_turn = false;
        self.attacked_this_turn = false;
    }

    /// Unit id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Current cell.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> HexCoordinate {
        self.position
    }

    /// Side this unit fights for.
    #[inline]
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Hit points left. May go negative on the killing blow.
    #[inline]
    #[must_use]
    pub const fn current_hp(&self) -> i32 {
        self.current_hp
    }

    /// Hit points at spawn.
    #[inline]
    #[must_use]
    pub const fn max_hp(&self) -> i32 {
        self.max_hp
    }

    /// Cells per turn; zero means the unit never moves.
    #[inline]
    #[must_use]
    pub const fn movement_range(&self) -> u32 {
        self.movement_range
    }

    /// Template this unit was spawned from.
    #[inline]
    #[must_use]
    pub fn archetype(&self) -> &ArchetypeId {
        &self.archetype
    }

    /// Whether the unit moved this turn.
    #[inline]
    #[must_use]
    pub const fn moved_this_turn(&self) -> bool {
        self.moved_this_turn
    }

    /// Whether the unit fought this turn, as attacker or defender.
    #[inline]
    #[must_use]
    pub const fn attacked_this_turn(&self) -> bool {
        self.attacked_this_turn
    }

    /// `current_hp > 0`.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Overwrites hit points.
    #[inline]
    pub fn set_hp(&mut self, hp: i32) {
        self.current_hp = hp;
    }

    /// Subtracts `amount` and returns the new hit points.
    #[inline]
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.current_hp -= amount;
        self.current_hp
    }

    /// Flags a move this turn.
    #[inline]
    pub fn mark_moved(&mut self) {
        self.moved_this_turn = true;
    }

    /// Flags a fight this turn.
    #[inline]
    pub fn mark_attacked(&mut self) {
        self.attacked_this_turn = true;
    }

    /// Clears both per-turn flags.
    #[inline]
    pub fn reset_turn_flags(&mut self) {
        self.moved_this_turn = false;
        self.attacked_this_turn = false;
    }

    #[inline]
    pub(crate) fn set_position(&mut self, position: HexCoordinate) {
        self.position = position;
    }
}
