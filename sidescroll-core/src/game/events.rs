//! Game Events
//!
//! Outbound notifications for the render/update-list collaborator, plus the
//! combat record used by tests and the demo log.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::corner::CornerOutcome;
use crate::game::health::DamageOutcome;
use crate::game::state::EntityId;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// List removals first, so consumers never touch a dead entity
    Removal = 0,
    /// Then list insertions
    Creation = 1,
    /// Then deaths and the defeat signal
    Death = 2,
    /// Then damage and blocks
    Combat = 3,
    /// Then physics recoveries
    Recovery = 4,
    /// Lowest priority
    Other = 255,
}

/// What kind of entity an id refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player avatar
    Player,
    /// An enemy actor
    Enemy,
    /// A projectile
    Projectile,
}

/// Why an entity left the active list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Enemy finished its death sequence
    Died,
    /// Projectile hit world geometry
    HitTerrain,
    /// Projectile hit its target
    HitTarget,
    /// Projectile ran out of time
    Expired,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Entity was added to the active list
    EntityCreated {
        id: EntityId,
        kind: EntityKind,
    },

    /// Entity was removed from the active list
    EntityRemoved {
        id: EntityId,
        reason: RemovalReason,
    },

    /// Enemy started an attack windup
    AttackStarted {
        id: EntityId,
    },

    /// Windup completed and the hit-check or projectile fired
    AttackFired {
        id: EntityId,
        ranged: bool,
    },

    /// Target lost health
    Damaged {
        source: EntityId,
        target: EntityId,
        amount: i32,
        remaining: i32,
    },

    /// Target blocked a hit
    Blocked {
        source: EntityId,
        target: EntityId,
    },

    /// Target's health reached zero
    Killed {
        source: EntityId,
        target: EntityId,
    },

    /// Player health reached zero. Terminal for the level.
    PlayerDefeated,

    /// A stuck body was freed
    CornerEscaped {
        id: EntityId,
        outcome: CornerOutcome,
    },

    /// A body fell out of the world and was put back
    FallRecovered {
        id: EntityId,
        position: Vec2,
    },
}

impl GameEventData {
    /// Processing priority of this kind of event.
    pub fn priority(&self) -> EventPriority {
        match self {
            Self::EntityRemoved { .. } => EventPriority::Removal,
            Self::EntityCreated { .. } => EventPriority::Creation,
            Self::Killed { .. } | Self::PlayerDefeated => EventPriority::Death,
            Self::Damaged { .. } | Self::Blocked { .. } => EventPriority::Combat,
            Self::CornerEscaped { .. } | Self::FallRecovered { .. } => EventPriority::Recovery,
            Self::AttackStarted { .. } | Self::AttackFired { .. } => EventPriority::Other,
        }
    }

    /// Primary entity involved, for tie-breaking.
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::EntityCreated { id, .. }
            | Self::EntityRemoved { id, .. }
            | Self::AttackStarted { id }
            | Self::AttackFired { id, .. }
            | Self::CornerEscaped { id, .. }
            | Self::FallRecovered { id, .. } => Some(*id),
            Self::Damaged { target, .. } | Self::Blocked { target, .. } | Self::Killed { target, .. } => {
                Some(*target)
            }
            Self::PlayerDefeated => Some(EntityId::PLAYER),
        }
    }
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Entity involved (for tie-breaking)
    pub entity: Option<EntityId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, data: GameEventData) -> Self {
        Self {
            tick,
            priority: data.priority(),
            entity: data.entity(),
            data,
        }
    }

    /// Create entity created event.
    pub fn entity_created(tick: u32, id: EntityId, kind: EntityKind) -> Self {
        Self::new(tick, GameEventData::EntityCreated { id, kind })
    }

    /// Create entity removed event.
    pub fn entity_removed(tick: u32, id: EntityId, reason: RemovalReason) -> Self {
        Self::new(tick, GameEventData::EntityRemoved { id, reason })
    }

    /// Event for a damage outcome. `Ignored` hits produce no event.
    pub fn from_damage(
        tick: u32,
        source: EntityId,
        target: EntityId,
        amount: i32,
        outcome: DamageOutcome,
    ) -> Option<Self> {
        let data = match outcome {
            DamageOutcome::Ignored => return None,
            DamageOutcome::Blocked => GameEventData::Blocked { source, target },
            DamageOutcome::Damaged { remaining } => GameEventData::Damaged {
                source,
                target,
                amount,
                remaining,
            },
            DamageOutcome::Killed => GameEventData::Killed { source, target },
        };
        Some(Self::new(tick, data))
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.entity == other.entity
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then entity
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.entity.cmp(&other.entity))
    }
}
