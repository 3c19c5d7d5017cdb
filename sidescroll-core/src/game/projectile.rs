//! Projectiles
//!
//! Linear movers with a lifetime. A projectile ends on whichever comes
//! first: world geometry, its target, or ttl expiry. Once ended it never
//! evaluates again, so a target can be damaged by a given projectile at most
//! once.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::events::RemovalReason;
use crate::game::health::{Damageable, DamageOutcome};
use crate::game::state::EntityId;
use crate::game::targeting::ProjectileSpawn;
use crate::game::world::CollisionProbe;

/// How a projectile ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectileFate {
    /// Ran into world geometry; no damage dealt
    HitTerrain,
    /// Reached its target
    HitTarget(DamageOutcome),
    /// Lifetime ran out
    Expired,
}

impl ProjectileFate {
    /// Removal reason reported to the entity-list collaborator.
    pub fn removal_reason(&self) -> RemovalReason {
        match self {
            Self::HitTerrain => RemovalReason::HitTerrain,
            Self::HitTarget(_) => RemovalReason::HitTarget,
            Self::Expired => RemovalReason::Expired,
        }
    }
}

/// A live projectile.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Projectile {
    /// Entity id
    pub id: EntityId,
    /// Firing actor
    pub owner: EntityId,
    /// Intended target
    pub target: Option<EntityId>,
    /// Bottom-left of the hitbox
    pub position: Vec2,
    /// Velocity (units/s)
    pub velocity: Vec2,
    /// Hitbox size
    pub size: Vec2,
    /// Damage on hit
    pub damage: i32,
    /// Seconds left
    pub ttl_remaining: f32,
    alive: bool,
}

impl Projectile {
    /// Materialize a spawn request under `id`.
    pub fn from_spawn(id: EntityId, spawn: ProjectileSpawn) -> Self {
        Self {
            id,
            owner: spawn.owner,
            target: spawn.target,
            position: spawn.position,
            velocity: spawn.velocity,
            size: spawn.size,
            damage: spawn.damage,
            ttl_remaining: spawn.ttl,
            alive: true,
        }
    }

    /// Current hitbox.
    pub fn hitbox(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size.x, self.size.y)
    }

    /// Still in flight.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Advance by `dt`. Returns the fate on the tick the projectile ends,
    /// `None` while it is still flying or after it has ended.
    ///
    /// `target` is only considered if it is the projectile's intended
    /// target and not its owner.
    pub fn update(
        &mut self,
        dt: f32,
        world: &dyn CollisionProbe,
        target: Option<&mut dyn Damageable>,
    ) -> Option<ProjectileFate> {
        if !self.alive {
            return None;
        }

        self.position += self.velocity * dt;
        let hitbox = self.hitbox();

        if world.intersects_solid(&hitbox) {
            return Some(self.end(ProjectileFate::HitTerrain));
        }

        if let Some(target) = target {
            let id = target.entity_id();
            let intended = self.target == Some(id) && id != self.owner;
            if intended
                && target.is_alive()
                && !target.is_invincible()
                && hitbox.intersects(&target.hitbox())
            {
                let outcome = target.take_damage(self.damage, hitbox.center());
                return Some(self.end(ProjectileFate::HitTarget(outcome)));
            }
        }

        self.ttl_remaining -= dt;
        if self.ttl_remaining <= 0.0 {
            return Some(self.end(ProjectileFate::Expired));
        }

        None
    }

    fn end(&mut self, fate: ProjectileFate) -> ProjectileFate {
        self.alive = false;
        self.velocity = Vec2::ZERO;
        fate
    }
}
