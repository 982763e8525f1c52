//! # Battlefield
//!
//! The consumer's authoritative grid. It changes only by deployment and
//! by replaying batches from the worker, in turn order, one whole batch
//! at a time.

use hexbattle_core::{FactionCounts, Grid, HexCoordinate, Unit, UnitId};
use hexbattle_sim::{Batch, CombatDelta, Command, Turn};

use crate::deploy::Formation;
use crate::error::{BattleError, BattleResult};
use crate::events::{BattleData, BattleEvent};

/// Living population per faction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PowerBalance {
    /// Attackers alive.
    pub attackers: usize,
    /// Defenders alive.
    pub defenders: usize,
}

impl PowerBalance {
    /// Balance from grid counts.
    #[must_use]
    pub const fn from_counts(counts: FactionCounts) -> Self {
        Self {
            attackers: counts.attackers,
            defenders: counts.defenders,
        }
    }

    /// Both sides together.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.attackers + self.defenders
    }

    /// Attackers' share of the living, in `[0, 1]`. An empty field is
    /// even.
    #[must_use]
    pub fn attacker_share(&self) -> f32 {
        if self.total() == 0 {
            return 0.5;
        }
        self.attackers as f32 / self.total() as f32
    }
}

/// Applies worker batches to the consumer's grid.
#[derive(Debug)]
pub struct Battlefield {
    grid: Grid,
    last_turn: Turn,
    balance: PowerBalance,
}

impl Battlefield {
    /// Wraps a grid that no batch has touched yet.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        let balance = PowerBalance::from_counts(grid.faction_counts());
        Self {
            grid,
            last_turn: 0,
            balance,
        }
    }

    /// The authoritative grid.
    #[inline]
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Last applied turn, 0 before the first batch.
    #[inline]
    #[must_use]
    pub const fn last_turn(&self) -> Turn {
        self.last_turn
    }

    /// Population after the last applied batch.
    #[inline]
    #[must_use]
    pub const fn balance(&self) -> PowerBalance {
        self.balance
    }

    /// Places the initial formation and announces every unit.
    ///
    /// # Errors
    ///
    /// Whatever [`Formation::deploy`] reports.
    pub fn deploy(&mut self, formation: &Formation) -> BattleResult<Vec<BattleEvent>> {
        let deployed = formation.deploy(&mut self.grid)?;
        self.balance = PowerBalance::from_counts(self.grid.faction_counts());
        Ok(deployed
            .into_iter()
            .filter_map(|id| self.grid.unit(id))
            .map(born)
            .collect())
    }

    /// Replays one batch. Either the whole batch applies or the grid is
    /// left as it was: edits are journaled and undone on failure.
    ///
    /// # Errors
    ///
    /// - [`BattleError::OutOfOrderBatch`] unless `batch` is the next turn
    /// - [`BattleError::ReplayMismatch`] if a command disagrees with the grid
    /// - [`BattleError::Grid`] if the grid rejects a command
    pub fn apply(&mut self, batch: &Batch) -> BattleResult<Vec<BattleEvent>> {
        let expected = self.last_turn + 1;
        if batch.turn() != expected {
            return Err(BattleError::OutOfOrderBatch {
                expected,
                got: batch.turn(),
            });
        }

        self.grid.begin_journal();
        let mut events = Vec::with_capacity(batch.len());
        let mut balance = self.balance;
        for command in batch.commands() {
            if let Err(error) = self.apply_command(command, &mut events, &mut balance) {
                let undone = self.grid.rollback_journal();
                tracing::error!("turn {} rejected, {} edits undone: {}", batch.turn(), undone, error);
                return Err(error);
            }
        }
        self.grid.commit_journal();

        self.last_turn = batch.turn();
        self.balance = balance;
        tracing::debug!(
            "applied turn {}: {} commands, {} events",
            batch.turn(),
            batch.len(),
            events.len()
        );
        Ok(events)
    }

    fn apply_command(
        &mut self,
        command: &Command,
        events: &mut Vec<BattleEvent>,
        balance: &mut PowerBalance,
    ) -> BattleResult<()> {
        tracing::trace!("turn {}: {}", command.turn(), command.kind());
        match command {
            Command::Move {
                turn,
                faction,
                unit_id,
                from,
                to,
            } => {
                self.expect_unit(*turn, *unit_id, *from)?;
                self.grid.relocate(*from, *to)?;
                events.push(BattleEvent::UnitMoved {
                    turn: *turn,
                    unit_id: *unit_id,
                    faction: *faction,
                    from: *from,
                    to: *to,
                });
            }
            Command::Attack {
                turn,
                attacker,
                defender,
                ..
            } => {
                let attacker_data = self.apply_delta(*turn, attacker)?;
                let defender_data = self.apply_delta(*turn, defender)?;
                events.push(BattleEvent::UnitAttacked {
                    turn: *turn,
                    attacker: attacker_data.clone(),
                    defender: defender_data.clone(),
                });
                for fallen in [defender_data, attacker_data] {
                    if fallen.died {
                        self.grid.remove(fallen.position)?;
                        events.push(BattleEvent::UnitDied {
                            turn: *turn,
                            unit_id: fallen.unit_id,
                            faction: fallen.faction,
                            position: fallen.position,
                        });
                    }
                }
            }
            Command::MapExpand { turn, expansion } => {
                let old_radius = self.grid.radius();
                let added = self.grid.extend_radius(expansion.radius_increase);
                if added.len() != expansion.len()
                    || added.iter().zip(&expansion.cells).any(|(hex, (cell, _))| hex != cell)
                {
                    return Err(BattleError::ReplayMismatch {
                        turn: *turn,
                        reason: format!(
                            "expansion of {} cells does not match {} local cells",
                            expansion.len(),
                            added.len()
                        ),
                    });
                }
                let mut spawned = 0;
                for (hex, unit) in &expansion.cells {
                    if let Some(unit) = unit {
                        self.grid.adopt(*hex, unit.clone())?;
                        events.push(born(unit));
                        spawned += 1;
                    }
                }
                events.push(BattleEvent::MapExpanded {
                    turn: *turn,
                    old_radius,
                    new_radius: self.grid.radius(),
                    new_cells: added.len(),
                    spawned,
                });
            }
            Command::TurnInfo {
                turn,
                attackers,
                defenders,
            } => {
                let reported = PowerBalance {
                    attackers: *attackers,
                    defenders: *defenders,
                };
                let local = PowerBalance::from_counts(self.grid.faction_counts());
                if reported != local {
                    return Err(BattleError::ReplayMismatch {
                        turn: *turn,
                        reason: format!(
                            "worker counts {reported:?}, local grid holds {local:?}"
                        ),
                    });
                }
                *balance = reported;
                events.push(BattleEvent::TurnInfoUpdated {
                    turn: *turn,
                    balance: reported,
                });
            }
        }
        Ok(())
    }

    /// Writes one side of an exchange and describes it.
    fn apply_delta(&mut self, turn: Turn, delta: &CombatDelta) -> BattleResult<BattleData> {
        self.expect_unit(turn, delta.unit_id, delta.position)?;
        let unit = self
            .grid
            .unit(delta.unit_id)
            .ok_or_else(|| mismatch(turn, format!("unit {} vanished", delta.unit_id)))?;
        if unit.current_hp() != delta.hp_old {
            return Err(mismatch(
                turn,
                format!(
                    "unit {} has {} hp, worker saw {}",
                    delta.unit_id,
                    unit.current_hp(),
                    delta.hp_old
                ),
            ));
        }
        let (faction, max_hp) = (unit.faction(), unit.max_hp());
        self.grid.set_hp(delta.unit_id, delta.hp_new);
        Ok(BattleData {
            unit_id: delta.unit_id,
            faction,
            position: delta.position,
            hp_old: delta.hp_old,
            hp_new: delta.hp_new,
            max_hp,
            damage_dealt: delta.damage_dealt,
            damage_received: delta.damage_received,
            died: delta.died,
        })
    }

    fn expect_unit(&self, turn: Turn, id: UnitId, hex: HexCoordinate) -> BattleResult<()> {
        match self.grid.unit_at(hex)? {
            Some(unit) if unit.id() == id => Ok(()),
            Some(unit) => Err(mismatch(turn, format!("{hex} holds {}, expected {id}", unit.id()))),
            None => Err(mismatch(turn, format!("{hex} is empty, expected {id}"))),
        }
    }
}

fn mismatch(turn: Turn, reason: String) -> BattleError {
    BattleError::ReplayMismatch { turn, reason }
}

fn born(unit: &Unit) -> BattleEvent {
    BattleEvent::UnitBorn {
        unit_id: unit.id(),
        faction: unit.faction(),
        archetype: unit.archetype().clone(),
        position: unit.position(),
        hp: unit.current_hp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexbattle_core::{ArchetypeCatalog, Faction, ATTACKER, DEFENDER};
    use hexbattle_sim::{NeverGrow, ScriptedRolls, ThroughputGrowth, TurnLoop};
    use std::sync::Arc;

    fn grid(radius: u32) -> Grid {
        Grid::new(radius, Arc::new(ArchetypeCatalog::builtin()))
    }

    /// Attacker two cells from a defender.
    fn duel() -> Grid {
        let mut grid = grid(2);
        grid.spawn(HexCoordinate::axial(-1, 0), ATTACKER).unwrap();
        grid.spawn(HexCoordinate::axial(1, 0), DEFENDER).unwrap();
        grid
    }

    #[test]
    fn test_move_replays() {
        let grid = duel();
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![0]), NeverGrow);
        let mut field = Battlefield::new(grid);

        let events = field.apply(&turns.run_turn(0).unwrap()).unwrap();
        assert!(matches!(
            events[0],
            BattleEvent::UnitMoved { to, .. } if to == HexCoordinate::ORIGIN
        ));
        assert!(field.grid().is_occupied(HexCoordinate::ORIGIN).unwrap());
        assert_eq!(field.last_turn(), 1);
    }

    #[test]
    fn test_attack_writes_hp() {
        let mut grid = grid(1);
        grid.spawn(HexCoordinate::ORIGIN, ATTACKER).unwrap();
        grid.spawn(HexCoordinate::axial(1, 0), DEFENDER).unwrap();
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![1, 0, 1, 0]), NeverGrow);
        let mut field = Battlefield::new(grid);

        let events = field.apply(&turns.run_turn(0).unwrap()).unwrap();
        let BattleEvent::UnitAttacked { attacker, defender, .. } = &events[0] else {
            panic!("expected an attack, got {:?}", events[0]);
        };
        assert_eq!((attacker.hp_old, attacker.hp_new), (10, 5));
        assert_eq!((defender.hp_old, defender.hp_new, defender.max_hp), (30, 25, 30));
        assert_eq!(field.grid().unit_at(HexCoordinate::axial(1, 0)).unwrap().unwrap().current_hp(), 25);
    }

    #[test]
    fn test_death_removes_immediately() {
        let mut grid = grid(1);
        grid.spawn(HexCoordinate::ORIGIN, ATTACKER).unwrap();
        let defender = HexCoordinate::axial(1, 0);
        grid.spawn(defender, DEFENDER).unwrap();
        grid.unit_at_mut(defender).unwrap().unwrap().set_hp(3);
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![1, 0]), NeverGrow);
        let mut field = Battlefield::new(grid);

        let events = field.apply(&turns.run_turn(0).unwrap()).unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, BattleEvent::UnitDied { faction: Faction::Defender, .. })));
        assert!(!field.grid().is_occupied(defender).unwrap());
        assert_eq!(field.balance(), PowerBalance { attackers: 1, defenders: 0 });
    }

    #[test]
    fn test_growth_adopts_worker_units() {
        let grid = duel();
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![0]), ThroughputGrowth::default());
        let mut field = Battlefield::new(grid);

        let batch = turns.run_turn(0).unwrap();
        let events = field.apply(&batch).unwrap();
        assert_eq!(field.grid().radius(), turns.grid().radius());
        let expanded = events
            .iter()
            .find_map(|e| match e {
                BattleEvent::MapExpanded { new_radius, spawned, .. } => Some((*new_radius, *spawned)),
                _ => None,
            })
            .unwrap();
        assert_eq!(expanded.0, 6);
        assert_eq!(expanded.1, field.grid().active_count() - 2);
        // Per-turn flags are worker-side bookkeeping and not replicated.
        for unit in turns.grid().active_units() {
            let local = field.grid().unit(unit.id()).unwrap();
            assert_eq!(
                (local.position(), local.faction(), local.current_hp()),
                (unit.position(), unit.faction(), unit.current_hp())
            );
        }
    }

    #[test]
    fn test_out_of_order_batch() {
        let grid = duel();
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![0]), NeverGrow);
        let mut field = Battlefield::new(grid);
        let first = turns.run_turn(0).unwrap();
        let second = turns.run_turn(0).unwrap();

        assert!(matches!(
            field.apply(&second),
            Err(BattleError::OutOfOrderBatch { expected: 1, got: 2 })
        ));
        field.apply(&first).unwrap();
        assert!(matches!(
            field.apply(&first),
            Err(BattleError::OutOfOrderBatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_mismatch_rolls_back() {
        let grid = duel();
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![0]), NeverGrow);
        let batch = turns.run_turn(0).unwrap();

        // A consumer whose attacker stands elsewhere.
        let mut other = self::grid(2);
        other.spawn(HexCoordinate::axial(0, -1), ATTACKER).unwrap();
        other.spawn(HexCoordinate::axial(1, 0), DEFENDER).unwrap();
        let before: Vec<_> = other.active_units().cloned().collect();
        let mut field = Battlefield::new(other);

        assert!(matches!(field.apply(&batch), Err(BattleError::ReplayMismatch { turn: 1, .. })));
        let after: Vec<_> = field.grid().active_units().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(field.last_turn(), 0);
    }

    #[test]
    fn test_failure_after_deaths_and_growth_rolls_back() {
        let mut grid = grid(1);
        grid.spawn(HexCoordinate::ORIGIN, ATTACKER).unwrap();
        let defender = HexCoordinate::axial(1, 0);
        grid.spawn(defender, DEFENDER).unwrap();
        grid.unit_at_mut(defender).unwrap().unwrap().set_hp(3);
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![1, 0]), ThroughputGrowth::default());
        let batch = turns.run_turn(0).unwrap();

        // A unit the worker never saw takes the id its growth hands out
        // first, so adoption fails after the kill and the new rings.
        grid.spawn(HexCoordinate::axial(-1, 1), ATTACKER).unwrap();
        let before: Vec<_> = grid.active_units().cloned().collect();
        let mut field = Battlefield::new(grid);

        assert!(matches!(field.apply(&batch), Err(BattleError::Grid(_))));
        assert_eq!(field.grid().active_units().cloned().collect::<Vec<_>>(), before);
        assert_eq!(field.grid().radius(), 1);
        assert_eq!(field.grid().cell_count(), 7);
        assert!(!field.grid().is_journaling());
        assert!(field.grid().validate().is_ok());
        assert_eq!(field.last_turn(), 0);
    }

    #[test]
    fn test_deploy_announces_units() {
        let mut field = Battlefield::new(grid(6));
        let events = field.deploy(&Formation::default()).unwrap();
        assert_eq!(events.len(), field.grid().active_count());
        assert!(events.iter().all(|e| matches!(e, BattleEvent::UnitBorn { .. })));
        assert_eq!(field.balance().defenders, 19);
    }

    #[test]
    fn test_attacker_share() {
        assert!((PowerBalance::default().attacker_share() - 0.5).abs() < f32::EPSILON);
        let balance = PowerBalance { attackers: 3, defenders: 1 };
        assert!((balance.attacker_share() - 0.75).abs() < f32::EPSILON);
    }
}
