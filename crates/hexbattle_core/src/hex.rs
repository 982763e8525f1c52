//! # Cube Coordinates
//!
//! Hex cells are addressed with cube coordinates `(q, r, s)` where
//! `q + r + s == 0`. Every constructor upholds that constraint, so a
//! `HexCoordinate` in circulation is always valid.
//!
//! Reference: <https://www.redblobgames.com/grids/hexagons/>

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// The six neighbour offsets in their fixed enumeration order.
///
/// Breadth-first search visits neighbours in this order, which makes it
/// the tie-break for every target choice. Never reorder.
pub const DIRECTIONS: [HexCoordinate; 6] = [
    HexCoordinate::axial(1, 0),
    HexCoordinate::axial(1, -1),
    HexCoordinate::axial(0, -1),
    HexCoordinate::axial(-1, 0),
    HexCoordinate::axial(-1, 1),
    HexCoordinate::axial(0, 1),
];

/// Named neighbour directions, indexed like [`DIRECTIONS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// `(+1, 0, -1)`
    MiddleRight = 0,
    /// `(+1, -1, 0)`
    TopRight = 1,
    /// `(0, -1, +1)`
    TopLeft = 2,
    /// `(-1, 0, +1)`
    MiddleLeft = 3,
    /// `(-1, +1, 0)`
    BottomLeft = 4,
    /// `(0, +1, -1)`
    BottomRight = 5,
}

impl Direction {
    /// All directions in enumeration order.
    pub const ALL: [Self; 6] = [
        Self::MiddleRight,
        Self::TopRight,
        Self::TopLeft,
        Self::MiddleLeft,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// The unit offset for this direction.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> HexCoordinate {
        DIRECTIONS[self as usize]
    }
}

/// A cell address on the hex grid.
///
/// Equality and hashing are by `(q, r, s)` value. Serialized as the
/// triple `[q, r, s]`; deserialization rejects triples that do not sum
/// to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "[i32; 3]", into = "[i32; 3]")]
pub struct HexCoordinate {
    q: i32,
    r: i32,
    s: i32,
}

impl HexCoordinate {
    /// The grid center `(0, 0, 0)`.
    pub const ORIGIN: Self = Self::axial(0, 0);

    /// Builds a coordinate from its axial pair; `s` is derived.
    #[inline]
    #[must_use]
    pub const fn axial(q: i32, r: i32) -> Self {
        Self { q, r, s: -q - r }
    }

    /// Builds a coordinate from all three cube components.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidCoordinate`] if `q + r + s != 0`.
    pub fn new(q: i32, r: i32, s: i32) -> Result<Self, GridError> {
        if i64::from(q) + i64::from(r) + i64::from(s) != 0 {
            return Err(GridError::InvalidCoordinate { q, r, s });
        }
        Ok(Self { q, r, s })
    }

    /// The `q` component.
    #[inline]
    #[must_use]
    pub const fn q(self) -> i32 {
        self.q
    }

    /// The `r` component.
    #[inline]
    #[must_use]
    pub const fn r(self) -> i32 {
        self.r
    }

    /// The `s` component.
    #[inline]
    #[must_use]
    pub const fn s(self) -> i32 {
        self.s
    }

    /// The adjacent cell in `direction`.
    #[inline]
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> Self {
        let d = direction.offset();
        Self::axial(self.q + d.q, self.r + d.r)
    }

    /// All six neighbours in enumeration order.
    ///
    /// The result is not bounds-checked; callers filter against a grid.
    #[inline]
    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        DIRECTIONS.map(|d| self + d)
    }

    /// Multiplies every component by `k`.
    #[inline]
    #[must_use]
    pub const fn scale(self, k: i32) -> Self {
        Self::axial(self.q * k, self.r * k)
    }

    /// Hop count from the origin.
    #[inline]
    #[must_use]
    pub const fn length(self) -> u32 {
        (self.q.unsigned_abs() + self.r.unsigned_abs() + self.s.unsigned_abs()) / 2
    }

    /// Hop count between two cells.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        (self - other).length()
    }

    /// Every cell at exactly `radius` hops, walked counter-clockwise.
    ///
    /// The walk starts at `self + BottomLeft * radius` and takes `radius`
    /// steps in each direction in enumeration order. A radius of zero
    /// yields only `self`.
    #[must_use]
    pub fn ring(self, radius: u32) -> Vec<Self> {
        if radius == 0 {
            return vec![self];
        }

        let mut cells = Vec::with_capacity(6 * radius as usize);
        let mut cursor = self + Direction::BottomLeft.offset().scale(radius as i32);
        for direction in Direction::ALL {
            for _ in 0..radius {
                cells.push(cursor);
                cursor = cursor.neighbor(direction);
            }
        }
        cells
    }

    /// Every cell within `radius` hops, center first, then ring by ring.
    #[must_use]
    pub fn range(self, radius: u32) -> Vec<Self> {
        (0..=radius).flat_map(|k| self.ring(k)).collect()
    }

    /// Number of cells in a hexagon of the given radius: `3r(r+1) + 1`.
    #[inline]
    #[must_use]
    pub const fn cells_within(radius: u32) -> usize {
        let r = radius as usize;
        3 * r * (r + 1) + 1
    }
}

impl Add for HexCoordinate {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::axial(self.q + rhs.q, self.r + rhs.r)
    }
}

impl Sub for HexCoordinate {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::axial(self.q - rhs.q, self.r - rhs.r)
    }
}

impl fmt::Display for HexCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q={};r={};s={}", self.q, self.r, self.s)
    }
}

impl TryFrom<[i32; 3]> for HexCoordinate {
    type Error = GridError;

    fn try_from([q, r, s]: [i32; 3]) -> Result<Self, Self::Error> {
        Self::new(q, r, s)
    }
}

impl From<HexCoordinate> for [i32; 3] {
    fn from(hex: HexCoordinate) -> Self {
        [hex.q, hex.r, hex.s]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_rejects_nonzero_sum() {
        assert!(HexCoordinate::new(1, 1, 1).is_err());
        assert_eq!(
            HexCoordinate::new(2, -3, 1).unwrap(),
            HexCoordinate::axial(2, -3)
        );
    }

    #[test]
    fn test_new_with_extreme_components() {
        assert_eq!(
            HexCoordinate::new(i32::MAX, i32::MAX, 2),
            Err(GridError::InvalidCoordinate {
                q: i32::MAX,
                r: i32::MAX,
                s: 2
            })
        );
        assert!(HexCoordinate::new(i32::MIN, i32::MIN, i32::MIN).is_err());
        assert!(HexCoordinate::new(i32::MAX, i32::MIN + 1, 0).is_ok());
    }

    #[test]
    fn test_direction_order() {
        let expected = [(1, 0, -1), (1, -1, 0), (0, -1, 1), (-1, 0, 1), (-1, 1, 0), (0, 1, -1)];
        for (direction, (q, r, s)) in DIRECTIONS.iter().zip(expected) {
            assert_eq!((direction.q(), direction.r(), direction.s()), (q, r, s));
        }
        assert_eq!(Direction::TopLeft.offset(), DIRECTIONS[2]);
    }

    #[test]
    fn test_neighbors_are_distinct_and_adjacent() {
        let center = HexCoordinate::axial(3, -5);
        let neighbors = center.neighbors();
        let unique: HashSet<_> = neighbors.iter().copied().collect();
        assert_eq!(unique.len(), 6);
        for n in neighbors {
            assert_eq!(center.distance(n), 1);
            assert_eq!(n.q() + n.r() + n.s(), 0);
        }
    }

    #[test]
    fn test_ring_sizes() {
        assert_eq!(HexCoordinate::ORIGIN.ring(0), vec![HexCoordinate::ORIGIN]);
        for radius in 1..6 {
            let ring = HexCoordinate::ORIGIN.ring(radius);
            assert_eq!(ring.len(), 6 * radius as usize);
            let unique: HashSet<_> = ring.iter().copied().collect();
            assert_eq!(unique.len(), ring.len());
            assert!(ring.iter().all(|h| h.length() == radius));
        }
    }

    #[test]
    fn test_ring_starts_bottom_left() {
        let ring = HexCoordinate::ORIGIN.ring(2);
        assert_eq!(ring[0], HexCoordinate::axial(-2, 2));
        assert_eq!(ring[1], HexCoordinate::axial(-1, 2));
    }

    #[test]
    fn test_range_matches_cell_count() {
        for radius in 0..5 {
            let cells = HexCoordinate::ORIGIN.range(radius);
            assert_eq!(cells.len(), HexCoordinate::cells_within(radius));
            assert_eq!(cells[0], HexCoordinate::ORIGIN);
        }
    }

    #[test]
    fn test_distance_symmetric() {
        let a = HexCoordinate::axial(-2, 1);
        let b = HexCoordinate::axial(3, -4);
        assert_eq!(a.distance(b), b.distance(a));
        assert_eq!(a.distance(b), 5);
    }

    #[test]
    fn test_display() {
        assert_eq!(HexCoordinate::axial(1, -2).to_string(), "q=1;r=-2;s=1");
    }
}
