//! # Damage Rolls
//!
//! Damage comes from two independent rolls in `0..3`, one for the
//! attacker and one for the defender:
//!
//! | `(3 + attack - defend) % 3` | damage |
//! |-----------------------------|--------|
//! | 0                           | 4      |
//! | 1                           | 5      |
//! | 2                           | 3      |
//!
//! The source of rolls is injected, so a seeded run replays exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of faces on a damage roll.
pub const ROLL_SIDES: u8 = 3;

/// Source of damage rolls.
pub trait DamageRng: Send {
    /// Uniform integer in `0..ROLL_SIDES`.
    fn roll(&mut self) -> u8;
}

impl<R: DamageRng + ?Sized> DamageRng for Box<R> {
    fn roll(&mut self) -> u8 {
        (**self).roll()
    }
}

/// Damage for a pair of rolls.
#[inline]
#[must_use]
pub const fn damage_for(attack_roll: u8, defend_roll: u8) -> i32 {
    match (ROLL_SIDES + attack_roll % ROLL_SIDES - defend_roll % ROLL_SIDES) % ROLL_SIDES {
        0 => 4,
        1 => 5,
        _ => 3,
    }
}

/// ChaCha8-backed rolls. Same seed, same battle.
#[derive(Clone, Debug)]
pub struct SeededRng {
    inner: ChaCha8Rng,
}

impl SeededRng {
    /// Rolls from a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Rolls seeded from the wall clock.
    #[must_use]
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos() as u64);
        Self::new(nanos)
    }
}

impl DamageRng for SeededRng {
    #[inline]
    fn roll(&mut self) -> u8 {
        self.inner.gen_range(0..ROLL_SIDES)
    }
}

/// Replays a fixed sequence of rolls, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedRolls {
    rolls: Vec<u8>,
    cursor: usize,
}

impl ScriptedRolls {
    /// Script of rolls. Values are taken modulo [`ROLL_SIDES`]; an empty
    /// script always rolls zero.
    #[must_use]
    pub fn new(rolls: Vec<u8>) -> Self {
        Self { rolls, cursor: 0 }
    }

    /// Rolls consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl DamageRng for ScriptedRolls {
    fn roll(&mut self) -> u8 {
        if self.rolls.is_empty() {
            return 0;
        }
        let roll = self.rolls[self.cursor % self.rolls.len()] % ROLL_SIDES;
        self.cursor += 1;
        roll
    }
}
