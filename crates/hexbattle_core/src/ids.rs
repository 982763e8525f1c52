//! Unit id generator.
//!
//! Each grid owns its own counter. A snapshot copies the counter value,
//! so the copy continues the sequence without sharing state with the
//! grid it came from.

use crate::unit::UnitId;

/// Monotonic id source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Generator whose first id is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Issues the next id.
    #[inline]
    pub fn next_id(&mut self) -> UnitId {
        let id = UnitId(self.next);
        self.next += 1;
        id
    }

    /// The id the next call will issue.
    #[inline]
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Makes sure `id` is never issued again.
    #[inline]
    pub fn observe(&mut self, id: UnitId) {
        self.next = self.next.max(id.0.saturating_add(1));
    }
}
