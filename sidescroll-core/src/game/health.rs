//! Health and Damage
//!
//! `HealthPool` is shared by the player and enemies. `Damageable` is the
//! capability an attacker sees of its target: where it is, whether it can be
//! hit right now, and a way to hurt it.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::state::EntityId;

/// Result of applying damage to a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthChange {
    /// Non-positive amount, nothing happened
    Unchanged,
    /// Health went down but is still above zero
    Damaged {
        /// Health left
        remaining: i32,
    },
    /// This call took health to zero. Reported once per pool.
    Depleted,
    /// Pool was already at zero
    AlreadyDepleted,
}

/// Integer hit points. `current` never drops below zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPool {
    max: i32,
    current: i32,
}

impl HealthPool {
    /// Full pool of `max` points (at least 1).
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { max, current: max }
    }

    /// Maximum health.
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Current health.
    pub fn current(&self) -> i32 {
        self.current
    }

    /// True once health has reached zero.
    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Subtract `amount`, saturating at zero.
    pub fn apply_damage(&mut self, amount: i32) -> HealthChange {
        if self.current == 0 {
            return HealthChange::AlreadyDepleted;
        }
        if amount <= 0 {
            return HealthChange::Unchanged;
        }
        self.current = (self.current - amount).max(0);
        if self.current == 0 {
            HealthChange::Depleted
        } else {
            HealthChange::Damaged { remaining: self.current }
        }
    }
}

/// What a `take_damage` call did to the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Target could not be hurt (dead, invincible)
    Ignored,
    /// Target blocked the hit
    Blocked,
    /// Target lost health and survived
    Damaged {
        /// Health left
        remaining: i32,
    },
    /// This hit killed the target
    Killed,
}

impl DamageOutcome {
    /// True if health was removed.
    pub fn landed(&self) -> bool {
        matches!(self, Self::Damaged { .. } | Self::Killed)
    }

    /// True if the hit was absorbed in some way (landed or blocked).
    pub fn connected(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Anything that can be targeted and hurt.
pub trait Damageable {
    /// Entity id, used for owner and target matching.
    fn entity_id(&self) -> EntityId;

    /// Current hitbox (gives both position and size).
    fn hitbox(&self) -> Rect;

    /// Centre of the hitbox.
    fn center(&self) -> Vec2 {
        self.hitbox().center()
    }

    /// Still in play.
    fn is_alive(&self) -> bool;

    /// Temporarily immune to damage.
    fn is_invincible(&self) -> bool;

    /// Apply `amount` damage coming from `source` (world position of the
    /// attacker, used for knockback direction).
    fn take_damage(&mut self, amount: i32, source: Vec2) -> DamageOutcome;
}
