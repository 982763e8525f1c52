//! # Combat Resolution
//!
//! Resolves one turn against a grid. Units act in spawn order:
//!
//! 1. Per-turn flags are cleared on every unit.
//! 2. Each living unit that has neither moved nor fought yet picks the
//!    adjacent enemy with the lowest hit points that is alive and has not
//!    moved this turn. The first such neighbour in direction order wins
//!    ties.
//! 3. With a target it attacks; the defender strikes back unless it
//!    already fought this turn. Otherwise, if it can move, it steps one
//!    cell toward the nearest enemy.
//! 4. Units reduced to zero or less are removed after every unit acted.

use hexbattle_core::{Faction, Grid, GridResult, HexCoordinate, PathError, PathFinder, Unit, UnitId};

use crate::command::{CombatDelta, Command, Turn};
use crate::rng::{damage_for, DamageRng};

/// Per-turn combat tallies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TurnTally {
    /// Units that attacked.
    pub attacks: u32,
    /// Units that were attacked.
    pub defends: u32,
}

/// Turn resolver with an injected damage source.
#[derive(Debug)]
pub struct CombatResolver<R> {
    rng: R,
    path_finder: PathFinder,
    dead: Vec<HexCoordinate>,
    tally: TurnTally,
}

impl<R: DamageRng> CombatResolver<R> {
    /// Resolver drawing rolls from `rng`.
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            path_finder: PathFinder::new(),
            dead: Vec::new(),
            tally: TurnTally::default(),
        }
    }

    /// Draws an attack roll then a defend roll and maps them to damage.
    pub fn roll_damage(&mut self) -> i32 {
        let attack = self.rng.roll();
        let defend = self.rng.roll();
        damage_for(attack, defend)
    }

    /// Tallies of the last resolved turn.
    #[must_use]
    pub const fn last_tally(&self) -> TurnTally {
        self.tally
    }

    /// Resolves every unit on `grid` for `turn` and returns the commands
    /// in resolution order.
    ///
    /// # Errors
    ///
    /// Structural grid faults only. Units with nothing to do are skipped
    /// silently.
    pub fn resolve_turn(&mut self, grid: &mut Grid, turn: Turn) -> GridResult<Vec<Command>> {
        let order: Vec<UnitId> = grid.active_ids().to_vec();
        for id in &order {
            if let Some(unit) = grid.unit_mut(*id) {
                unit.reset_turn_flags();
            }
        }
        self.dead.clear();
        self.tally = TurnTally::default();

        let mut commands = Vec::new();
        for id in order {
            self.resolve_unit(grid, id, turn, &mut commands)?;
        }

        for hex in std::mem::take(&mut self.dead) {
            let id = grid.remove(hex)?;
            tracing::trace!("turn {}: unit {} died at {}", turn, id, hex);
        }
        Ok(commands)
    }

    fn resolve_unit(
        &mut self,
        grid: &mut Grid,
        id: UnitId,
        turn: Turn,
        commands: &mut Vec<Command>,
    ) -> GridResult<()> {
        let Some(unit) = grid.unit(id) else {
            return Ok(());
        };
        // A unit that fought as a defender earlier this turn has acted.
        if !unit.is_alive() || unit.moved_this_turn() || unit.attacked_this_turn() {
            return Ok(());
        }
        let position = unit.position();
        let faction = unit.faction();
        let can_move = unit.movement_range() > 0;

        if let Some(target) = weakest_adjacent_enemy(grid, position, faction)? {
            self.attack(grid, id, target, turn, faction, commands);
        } else if can_move {
            match self.path_finder.find_step(position, faction, grid) {
                Ok(step) => {
                    grid.relocate(position, step)?;
                    if let Some(unit) = grid.unit_mut(id) {
                        unit.mark_moved();
                    }
                    commands.push(Command::Move {
                        turn,
                        faction,
                        unit_id: id,
                        from: position,
                        to: step,
                    });
                }
                Err(PathError::Grid(fault)) => return Err(fault),
                Err(reason) => tracing::trace!("turn {}: unit {} holds: {}", turn, id, reason),
            }
        }
        Ok(())
    }

    fn attack(
        &mut self,
        grid: &mut Grid,
        attacker_id: UnitId,
        defender_id: UnitId,
        turn: Turn,
        faction: Faction,
        commands: &mut Vec<Command>,
    ) {
        let dealt = self.roll_damage();
        let defender_fought = grid
            .unit(defender_id)
            .is_some_and(Unit::attacked_this_turn);
        let retaliation = if defender_fought { 0 } else { self.roll_damage() };

        let Some(defender) = grid.unit_mut(defender_id) else {
            return;
        };
        let defender_delta = CombatDelta {
            unit_id: defender_id,
            position: defender.position(),
            hp_old: defender.current_hp(),
            hp_new: defender.take_damage(dealt),
            damage_dealt: retaliation,
            damage_received: dealt,
            died: !defender.is_alive(),
        };
        defender.mark_attacked();

        let Some(attacker) = grid.unit_mut(attacker_id) else {
            return;
        };
        let attacker_delta = CombatDelta {
            unit_id: attacker_id,
            position: attacker.position(),
            hp_old: attacker.current_hp(),
            hp_new: attacker.take_damage(retaliation),
            damage_dealt: dealt,
            damage_received: retaliation,
            died: !attacker.is_alive(),
        };
        attacker.mark_attacked();

        if attacker_delta.died {
            self.dead.push(attacker_delta.position);
        }
        if defender_delta.died {
            self.dead.push(defender_delta.position);
        }
        self.tally.attacks += 1;
        self.tally.defends += 1;

        commands.push(Command::Attack {
            turn,
            faction,
            attacker: attacker_delta,
            defender: defender_delta,
        });
    }
}

/// The adjacent enemy with the lowest hit points that is alive and has
/// not moved this turn. Earlier directions win ties.
fn weakest_adjacent_enemy(
    grid: &Grid,
    position: HexCoordinate,
    faction: Faction,
) -> GridResult<Option<UnitId>> {
    let mut best: Option<(UnitId, i32)> = None;
    for neighbor in grid.neighbors(position) {
        let Some(other) = grid.unit_at(neighbor)? else {
            continue;
        };
        if other.faction() == faction || !other.is_alive() || other.moved_this_turn() {
            continue;
        }
        if best.map_or(true, |(_, hp)| other.current_hp() < hp) {
            best = Some((other.id(), other.current_hp()));
        }
    }
    Ok(best.map(|(id, _)| id))
}
