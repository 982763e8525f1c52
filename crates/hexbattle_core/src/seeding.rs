//! Ring seeding policies for grid growth.

use crate::unit::Faction;

/// Decides which faction, if any, fills a freshly added ring.
pub trait RingSeeder {
    /// Faction for every cell of ring `ring` (distance from the center),
    /// or `None` to leave the ring empty.
    fn faction_for(&mut self, ring: u32) -> Option<Faction>;
}

/// Even rings stay empty. Odd rings are filled completely, alternating
/// Defender then Attacker across the odd rings of one growth call.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlternatingSeeder {
    populated: u32,
}

impl RingSeeder for AlternatingSeeder {
    fn faction_for(&mut self, ring: u32) -> Option<Faction> {
        if ring % 2 == 0 {
            return None;
        }
        let faction = if self.populated % 2 == 0 {
            Faction::Defender
        } else {
            Faction::Attacker
        };
        self.populated += 1;
        Some(faction)
    }
}

/// Never seeds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyRings;

impl RingSeeder for EmptyRings {
    fn faction_for(&mut self, _ring: u32) -> Option<Faction> {
        None
    }
}

/// Fills every new ring with one faction.
#[derive(Clone, Copy, Debug)]
pub struct UniformSeeder(pub Faction);

impl RingSeeder for UniformSeeder {
    fn faction_for(&mut self, _ring: u32) -> Option<Faction> {
        Some(self.0)
    }
}
