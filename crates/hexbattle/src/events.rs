//! # Battle Events
//!
//! What presentation sees of a battle.
//!
//! ```text
//! ┌──────────────┐  Batch   ┌──────────────┐  BattleEvent  ┌──────────────┐
//! │  Simulation  │─────────>│  Battlefield │──────────────>│ Presentation │
//! │   (worker)   │          │  (consumer)  │   EventBus    │ (UI, audio)  │
//! └──────────────┘          └──────────────┘               └──────────────┘
//! ```
//!
//! Events are derived from replayed batches, never from the worker's
//! private grid.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use hexbattle_core::{ArchetypeId, Faction, HexCoordinate, UnitId};
use hexbattle_sim::Turn;

use crate::battlefield::PowerBalance;

/// One side of an exchange, as presentation needs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleData {
    /// Unit involved.
    pub unit_id: UnitId,
    /// Its side.
    pub faction: Faction,
    /// Where it stood.
    pub position: HexCoordinate,
    /// Hit points before the exchange.
    pub hp_old: i32,
    /// Hit points after the exchange.
    pub hp_new: i32,
    /// Hit points at spawn, for health bars.
    pub max_hp: i32,
    /// Damage inflicted.
    pub damage_dealt: i32,
    /// Damage taken.
    pub damage_received: i32,
    /// Whether the exchange killed it.
    pub died: bool,
}

/// Events emitted by the battlefield.
#[derive(Clone, Debug, PartialEq)]
pub enum BattleEvent {
    // =========================================================================
    // Unit Events
    // =========================================================================
    /// A unit appeared, by deployment or by growth.
    UnitBorn {
        /// New unit.
        unit_id: UnitId,
        /// Its side.
        faction: Faction,
        /// Template it came from.
        archetype: ArchetypeId,
        /// Cell it occupies.
        position: HexCoordinate,
        /// Hit points at spawn.
        hp: i32,
    },

    /// A unit stepped one cell.
    UnitMoved {
        /// Turn it happened in.
        turn: Turn,
        /// The mover.
        unit_id: UnitId,
        /// Its side.
        faction: Faction,
        /// Cell left.
        from: HexCoordinate,
        /// Cell entered.
        to: HexCoordinate,
    },

    /// An attack and its retaliation.
    UnitAttacked {
        /// Turn it happened in.
        turn: Turn,
        /// Attacking side.
        attacker: BattleData,
        /// Defending side.
        defender: BattleData,
    },

    /// A unit was removed from the grid.
    UnitDied {
        /// Turn it happened in.
        turn: Turn,
        /// The fallen unit.
        unit_id: UnitId,
        /// Its side.
        faction: Faction,
        /// Cell it left empty.
        position: HexCoordinate,
    },

    // =========================================================================
    // Map Events
    // =========================================================================
    /// The map grew.
    MapExpanded {
        /// Turn it happened in.
        turn: Turn,
        /// Radius before.
        old_radius: u32,
        /// Radius after.
        new_radius: u32,
        /// Cells added.
        new_cells: usize,
        /// Units that came with them.
        spawned: usize,
    },

    /// End-of-turn population.
    TurnInfoUpdated {
        /// Turn summarised.
        turn: Turn,
        /// Living units per faction.
        balance: PowerBalance,
    },
}

impl BattleEvent {
    /// Turn the event belongs to. Deployment events have none.
    #[must_use]
    pub const fn turn(&self) -> Option<Turn> {
        match self {
            Self::UnitBorn { .. } => None,
            Self::UnitMoved { turn, .. }
            | Self::UnitAttacked { turn, .. }
            | Self::UnitDied { turn, .. }
            | Self::MapExpanded { turn, .. }
            | Self::TurnInfoUpdated { turn, .. } => Some(*turn),
        }
    }
}

/// Bounded channel carrying battle events to presentation.
pub struct EventBus {
    sender: Sender<BattleEvent>,
    receiver: Receiver<BattleEvent>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Sender and receiver of a fresh bus.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<BattleEvent>,
}

impl EventSender {
    /// Sends without blocking. Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: BattleEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("event bus full, dropping battle event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Sends, waiting for room. Returns `false` if nobody listens.
    #[inline]
    pub fn send_blocking(&self, event: BattleEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<BattleEvent>,
}

impl EventReceiver {
    /// Everything pending, in order.
    #[inline]
    pub fn drain(&self) -> Vec<BattleEvent> {
        self.receiver.try_iter().collect()
    }

    /// One event, if any.
    #[inline]
    pub fn try_recv(&self) -> Option<BattleEvent> {
        self.receiver.try_recv().ok()
    }

    /// Events waiting.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Whether anything is waiting.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}
