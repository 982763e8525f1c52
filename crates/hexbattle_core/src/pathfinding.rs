//! # Target Acquisition
//!
//! Breadth-first search from a unit's cell to the nearest enemy.
//!
//! Neighbours are visited in [`DIRECTIONS`](crate::hex::DIRECTIONS)
//! order and the goal is recognised when it is dequeued, so ties between
//! equally distant enemies always resolve the same way. Only empty cells
//! and living enemies enter the frontier: allies and units killed earlier
//! in the turn are walls. Every step of a returned path is therefore
//! free to move into.

use std::collections::{HashMap, VecDeque};

use crate::error::{GridError, PathError};
use crate::grid::Grid;
use crate::hex::HexCoordinate;
use crate::unit::Faction;

/// A route to the nearest enemy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    /// Intermediate cells, start and goal excluded.
    pub steps: Vec<HexCoordinate>,
    /// The enemy's cell.
    pub goal: HexCoordinate,
}

impl Path {
    /// The cell to move into this turn.
    #[inline]
    #[must_use]
    pub fn first_step(&self) -> Option<HexCoordinate> {
        self.steps.first().copied()
    }

    /// Hops from start to goal.
    #[inline]
    #[must_use]
    pub fn hops(&self) -> usize {
        self.steps.len() + 1
    }
}

/// Reusable BFS state. One per worker; buffers are kept between calls.
#[derive(Debug, Default)]
pub struct PathFinder {
    frontier: VecDeque<HexCoordinate>,
    came_from: HashMap<HexCoordinate, HexCoordinate>,
}

impl PathFinder {
    /// Creates a path finder with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The single cell a unit of `seeking` on `start` should step into.
    ///
    /// # Errors
    ///
    /// - [`PathError::NoTarget`] if no enemy is reachable
    /// - [`PathError::ZeroLengthPath`] if the nearest enemy is adjacent
    /// - [`PathError::Grid`] if `start` is off the grid
    pub fn find_step(
        &mut self,
        start: HexCoordinate,
        seeking: Faction,
        grid: &Grid,
    ) -> Result<HexCoordinate, PathError> {
        let path = self.find_path(start, seeking, grid)?;
        path.first_step()
            .ok_or(PathError::ZeroLengthPath { goal: path.goal })
    }

    /// Full route from `start` to the nearest living unit not of `seeking`.
    ///
    /// # Errors
    ///
    /// [`PathError::NoTarget`], or [`PathError::Grid`] if `start` is off
    /// the grid.
    pub fn find_path(
        &mut self,
        start: HexCoordinate,
        seeking: Faction,
        grid: &Grid,
    ) -> Result<Path, PathError> {
        if !grid.in_bounds(start) {
            return Err(GridError::OutOfBounds {
                coord: start,
                radius: grid.radius(),
            }
            .into());
        }

        self.frontier.clear();
        self.came_from.clear();
        self.frontier.push_back(start);
        self.came_from.insert(start, start);

        let mut goal = None;
        while let Some(current) = self.frontier.pop_front() {
            if let Some(unit) = grid.unit_at(current)? {
                if unit.faction() != seeking && unit.is_alive() {
                    goal = Some(current);
                    break;
                }
            }

            for next in grid.neighbors(current) {
                if self.came_from.contains_key(&next) {
                    continue;
                }
                if let Some(unit) = grid.unit_at(next)? {
                    if unit.faction() == seeking || !unit.is_alive() {
                        continue;
                    }
                }
                self.came_from.insert(next, current);
                self.frontier.push_back(next);
            }
        }

        let goal = goal.ok_or(PathError::NoTarget)?;
        let mut steps = Vec::new();
        let mut cursor = goal;
        while let Some(&previous) = self.came_from.get(&cursor) {
            if previous == start {
                break;
            }
            steps.push(previous);
            cursor = previous;
        }
        steps.reverse();

        Ok(Path { steps, goal })
    }
}

/// One-shot [`PathFinder::find_step`] with fresh buffers.
///
/// # Errors
///
/// Same as [`PathFinder::find_step`].
pub fn find_step(start: HexCoordinate, seeking: Faction, grid: &Grid) -> Result<HexCoordinate, PathError> {
    PathFinder::new().find_step(start, seeking, grid)
}
