//! # Turn Commands
//!
//! Everything that happened in one turn, as plain values. Batches are
//! the only thing that crosses from the worker to the consumer.

use hexbattle_core::{Expansion, Faction, HexCoordinate, UnitId};

/// Turn number. The first resolved turn is 1.
pub type Turn = u64;

/// One side of an exchange, captured when it was resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombatDelta {
    /// Unit involved.
    pub unit_id: UnitId,
    /// Where it stood.
    pub position: HexCoordinate,
    /// Hit points before the exchange.
    pub hp_old: i32,
    /// Hit points after the exchange.
    pub hp_new: i32,
    /// Damage this unit inflicted.
    pub damage_dealt: i32,
    /// Damage this unit took.
    pub damage_received: i32,
    /// Whether `hp_new <= 0`.
    pub died: bool,
}

/// A single event of a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// A unit stepped one cell.
    Move {
        /// Turn it happened in.
        turn: Turn,
        /// Faction of the mover.
        faction: Faction,
        /// The mover.
        unit_id: UnitId,
        /// Cell left.
        from: HexCoordinate,
        /// Cell entered.
        to: HexCoordinate,
    },
    /// An attack and its retaliation.
    Attack {
        /// Turn it happened in.
        turn: Turn,
        /// Faction of the attacker.
        faction: Faction,
        /// Attacking side.
        attacker: CombatDelta,
        /// Defending side.
        defender: CombatDelta,
    },
    /// The map grew.
    MapExpand {
        /// Turn it happened in.
        turn: Turn,
        /// New cells and spawned units.
        expansion: Expansion,
    },
    /// Living population per faction at the end of the turn.
    TurnInfo {
        /// Turn summarised.
        turn: Turn,
        /// Attackers on the grid.
        attackers: usize,
        /// Defenders on the grid.
        defenders: usize,
    },
}

impl Command {
    /// Turn this command belongs to.
    #[must_use]
    pub const fn turn(&self) -> Turn {
        match self {
            Self::Move { turn, .. }
            | Self::Attack { turn, .. }
            | Self::MapExpand { turn, .. }
            | Self::TurnInfo { turn, .. } => *turn,
        }
    }

    /// Acting faction, for commands that have one.
    #[must_use]
    pub const fn faction(&self) -> Option<Faction> {
        match self {
            Self::Move { faction, .. } | Self::Attack { faction, .. } => Some(*faction),
            Self::MapExpand { .. } | Self::TurnInfo { .. } => None,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Attack { .. } => "attack",
            Self::MapExpand { .. } => "map_expand",
            Self::TurnInfo { .. } => "turn_info",
        }
    }
}

/// Tally of a batch, for logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Move commands.
    pub moves: usize,
    /// Attack commands.
    pub attacks: usize,
    /// Units killed.
    pub deaths: usize,
    /// Cells added by growth.
    pub new_cells: usize,
}

/// All commands of one turn, in resolution order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    turn: Turn,
    commands: Vec<Command>,
}

impl Batch {
    /// Wraps the commands of `turn`.
    #[must_use]
    pub fn new(turn: Turn, commands: Vec<Command>) -> Self {
        Self { turn, commands }
    }

    /// Turn number.
    #[inline]
    #[must_use]
    pub const fn turn(&self) -> Turn {
        self.turn
    }

    /// Commands in order.
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Takes the commands.
    #[must_use]
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    /// Number of commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch has no commands.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Counts by kind.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for command in &self.commands {
            match command {
                Command::Move { .. } => summary.moves += 1,
                Command::Attack { attacker, defender, .. } => {
                    summary.attacks += 1;
                    summary.deaths += usize::from(attacker.died) + usize::from(defender.died);
                }
                Command::MapExpand { expansion, .. } => summary.new_cells += expansion.len(),
                Command::TurnInfo { .. } => {}
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(died: bool) -> CombatDelta {
        CombatDelta {
            unit_id: UnitId(0),
            position: HexCoordinate::ORIGIN,
            hp_old: 5,
            hp_new: if died { 0 } else { 1 },
            damage_dealt: 4,
            damage_received: if died { 5 } else { 4 },
            died,
        }
    }

    #[test]
    fn test_command_accessors() {
        let attack = Command::Attack {
            turn: 3,
            faction: Faction::Attacker,
            attacker: delta(false),
            defender: delta(true),
        };
        assert_eq!(attack.turn(), 3);
        assert_eq!(attack.faction(), Some(Faction::Attacker));
        assert_eq!(attack.kind(), "attack");

        let info = Command::TurnInfo { turn: 3, attackers: 1, defenders: 1 };
        assert_eq!(info.faction(), None);
    }

    #[test]
    fn test_summary() {
        let batch = Batch::new(
            1,
            vec![
                Command::Move {
                    turn: 1,
                    faction: Faction::Attacker,
                    unit_id: UnitId(1),
                    from: HexCoordinate::axial(2, 0),
                    to: HexCoordinate::axial(1, 0),
                },
                Command::Attack {
                    turn: 1,
                    faction: Faction::Defender,
                    attacker: delta(false),
                    defender: delta(true),
                },
                Command::TurnInfo { turn: 1, attackers: 1, defenders: 1 },
            ],
        );
        assert_eq!(
            batch.summary(),
            BatchSummary { moves: 1, attacks: 1, deaths: 1, new_cells: 0 }
        );
        assert_eq!(batch.len(), 3);
    }
}
