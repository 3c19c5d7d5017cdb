//! Enemy State Machine
//!
//! One `Enemy` type serves every archetype. The archetype's `AiProfile`
//! supplies the numbers and the `BehaviorKind` tag selects the steering and
//! attack-delivery functions.
//!
//! ```text
//!            target lost / out of aggro
//!   +--------+ <------------------------ +-------------------+
//!   | Patrol |                           | Chase / Maintain  |
//!   +--------+ ------------------------> +-------------------+
//!        |         target acquired               |
//!        |   in range + cooldown ready           |
//!        +-------------------+-------------------+
//!                            v
//!                    +---------------+  windup elapsed   +-----------+
//!                    | AttackWindup  | ----------------> | Attacking |
//!                    +---------------+  (fires once)     +-----------+
//!                                                              | active elapsed
//!   any state but Dead --damage--> Hurt --stagger--> Patrol <--+ (cooldown starts)
//!   any state but Dead --health 0--> Dead --sequence + grace--> removal
//! ```

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::core::rng::RandomSource;
use crate::core::vec2::Vec2;
use crate::game::behavior::{
    chase_velocity, facing_sign, maintain_velocity, patrol_velocity, select_intent, Intent, Perception,
};
use crate::game::body::{FallGuard, KinematicBody};
use crate::game::config::{CombatConfig, PhysicsConfig, SimConfig};
use crate::game::corner::CornerEscape;
use crate::game::events::{GameEventData, RemovalReason};
use crate::game::health::{Damageable, DamageOutcome, HealthChange, HealthPool};
use crate::game::profile::{AiProfile, BehaviorKind};
use crate::game::state::{AnimationKey, EntityId, TickOutbox};
use crate::game::targeting::{aim, melee_hit_check, muzzle_position, ProjectileSpawn};
use crate::game::world::CollisionProbe;

/// Enemy behaviour state. Timers live inside the variants that use them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActorState {
    /// Walking back and forth
    Patrol,
    /// Closing in on the target
    Chase,
    /// Ranged only: holding the preferred distance
    MaintainDistance,
    /// Preparing an attack
    AttackWindup {
        /// Seconds in this state
        elapsed: f32,
    },
    /// Attack fired, recovering
    Attacking {
        /// Seconds in this state
        elapsed: f32,
    },
    /// Staggered by damage
    Hurt {
        /// Seconds in this state
        elapsed: f32,
    },
    /// Health reached zero. Terminal.
    Dead {
        /// Seconds since death
        elapsed: f32,
    },
}

impl ActorState {
    /// States in which the AI makes decisions.
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Patrol | Self::Chase | Self::MaintainDistance)
    }

    /// Windup or active attack phase.
    pub fn is_attacking(&self) -> bool {
        matches!(self, Self::AttackWindup { .. } | Self::Attacking { .. })
    }

    /// Dead.
    pub fn is_dead(&self) -> bool {
        matches!(self, Self::Dead { .. })
    }

    /// Stable numeric tag for hashing.
    fn tag(&self) -> (u8, f32) {
        match *self {
            Self::Patrol => (0, 0.0),
            Self::Chase => (1, 0.0),
            Self::MaintainDistance => (2, 0.0),
            Self::AttackWindup { elapsed } => (3, elapsed),
            Self::Attacking { elapsed } => (4, elapsed),
            Self::Hurt { elapsed } => (5, elapsed),
            Self::Dead { elapsed } => (6, elapsed),
        }
    }
}

/// An enemy actor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enemy {
    /// Entity id
    pub id: EntityId,
    /// Archetype id this enemy was built from
    pub archetype: String,
    /// Behaviour and stats
    pub profile: AiProfile,
    /// Physics body
    pub body: KinematicBody,
    /// Facing direction
    pub facing_right: bool,
    health: HealthPool,
    state: ActorState,
    cooldown_remaining: f32,
    fired: bool,
    patrol_travelled: f32,
    target: Option<EntityId>,
    knockback_distance: f32,
    pending_knockback: f32,
    removal_requested: bool,
    corner: CornerEscape,
    fall_guard: FallGuard,
    spawn_point: Vec2,
}

impl Enemy {
    /// Create an enemy in Patrol at `position`.
    pub fn new(
        id: EntityId,
        archetype: impl Into<String>,
        profile: AiProfile,
        position: Vec2,
        facing_right: bool,
        max_health: i32,
        combat: &CombatConfig,
    ) -> Self {
        let body = KinematicBody::new(position, profile.hitbox, profile.applies_gravity);
        Self {
            id,
            archetype: archetype.into(),
            profile,
            body,
            facing_right,
            health: HealthPool::new(max_health),
            state: ActorState::Patrol,
            cooldown_remaining: 0.0,
            fired: false,
            patrol_travelled: 0.0,
            target: None,
            knockback_distance: combat.knockback_distance,
            pending_knockback: 0.0,
            removal_requested: false,
            corner: CornerEscape::default(),
            fall_guard: FallGuard::default(),
            spawn_point: position,
        }
    }

    /// Current state.
    pub fn state(&self) -> ActorState {
        self.state
    }

    /// Health pool.
    pub fn health(&self) -> &HealthPool {
        &self.health
    }

    /// Seconds until the next attack may start.
    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    /// Current attack has already fired.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Distance walked since the last patrol turn.
    pub fn patrol_travelled(&self) -> f32 {
        self.patrol_travelled
    }

    /// Entity this enemy hunts.
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Wire the target reference.
    pub fn set_target(&mut self, target: Option<EntityId>) {
        self.target = target;
    }

    /// Position used for fall recovery.
    pub fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }

    /// Dead.
    pub fn is_dead(&self) -> bool {
        self.state.is_dead()
    }

    /// Removal has been requested from the active list.
    pub fn removal_requested(&self) -> bool {
        self.removal_requested
    }

    /// Start an attack windup. A silent no-op (returns false) while on
    /// cooldown, already attacking, hurt or dead.
    pub fn request_attack(&mut self) -> bool {
        if !self.state.is_free() || self.cooldown_remaining > 0.0 {
            return false;
        }
        self.state = ActorState::AttackWindup { elapsed: 0.0 };
        self.fired = false;
        self.body.velocity.x = 0.0;
        true
    }

    /// Advance one tick.
    ///
    /// `target` is whatever entity the caller resolved for this enemy's
    /// target id; a dead or mismatched target is treated as no target.
    pub fn update(
        &mut self,
        dt: f32,
        world: &dyn CollisionProbe,
        target: Option<&mut dyn Damageable>,
        rng: &mut dyn RandomSource,
        config: &SimConfig,
        outbox: &mut TickOutbox,
    ) {
        if let ActorState::Dead { elapsed } = &mut self.state {
            *elapsed += dt;
            let total = self.profile.death_duration.unwrap_or(config.combat.default_death_duration)
                + config.combat.death_grace;
            if *elapsed >= total && !self.removal_requested {
                self.removal_requested = true;
                outbox.remove(self.id, RemovalReason::Died);
            }
            return;
        }

        if self.pending_knockback != 0.0 {
            self.body.move_horizontal(self.pending_knockback, world);
            self.pending_knockback = 0.0;
        }

        let own_target = self.target;
        let mut target = target.filter(|t| t.is_alive() && Some(t.entity_id()) == own_target);
        let perception = target
            .as_ref()
            .map(|t| Perception::between(self.body.center(), t.center()));

        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);

        let mut desired = Vec2::ZERO;
        let mut patrolling = false;

        match self.state {
            ActorState::Hurt { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= config.combat.stagger_duration {
                    self.enter_patrol();
                } else {
                    self.state = ActorState::Hurt { elapsed };
                }
            }
            ActorState::AttackWindup { elapsed } => {
                let elapsed = elapsed + dt;
                self.state = ActorState::AttackWindup { elapsed };
                if !self.fired && elapsed >= self.profile.attack.windup {
                    self.fired = true;
                    self.fire(target.take(), world, rng, &config.combat, outbox);
                    self.state = ActorState::Attacking { elapsed: 0.0 };
                }
            }
            ActorState::Attacking { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.profile.attack.active {
                    self.cooldown_remaining = self.profile.attack.cooldown;
                    self.enter_patrol();
                } else {
                    self.state = ActorState::Attacking { elapsed };
                }
            }
            ActorState::Patrol | ActorState::Chase | ActorState::MaintainDistance => {
                let intent = select_intent(&self.profile, perception.as_ref(), self.cooldown_remaining <= 0.0);
                if intent != Intent::Patrol {
                    if let Some(p) = &perception {
                        self.face_toward(p);
                    }
                }
                match (intent, &perception) {
                    (Intent::Attack, _) => {
                        if self.request_attack() {
                            outbox.emit(GameEventData::AttackStarted { id: self.id });
                        }
                    }
                    (Intent::Chase, Some(p)) => {
                        self.state = ActorState::Chase;
                        desired = chase_velocity(&self.profile, p);
                    }
                    (Intent::MaintainDistance, Some(p)) => {
                        self.state = ActorState::MaintainDistance;
                        desired = maintain_velocity(&self.profile, p);
                    }
                    _ => {
                        self.enter_patrol();
                        desired = patrol_velocity(&self.profile, self.facing_right);
                        patrolling = true;
                    }
                }
            }
            ActorState::Dead { .. } => {}
        }

        self.step_physics(desired, patrolling, dt, world, &config.physics);
        self.recover(dt, world, &config.physics, outbox);
    }

    /// Animation the render collaborator should show.
    pub fn animation(&self) -> AnimationKey {
        match self.state {
            ActorState::Dead { .. } => AnimationKey::Death,
            ActorState::Hurt { .. } => AnimationKey::Hurt,
            ActorState::AttackWindup { .. } => AnimationKey::Windup,
            ActorState::Attacking { .. } => AnimationKey::Attack,
            _ => AnimationKey::for_motion(&self.body),
        }
    }

    /// Feed this enemy into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        let (tag, elapsed) = self.state.tag();
        hasher.update_u32(self.id.0);
        hasher.update_vec2(self.body.position);
        hasher.update_vec2(self.body.velocity);
        hasher.update_bool(self.body.grounded);
        hasher.update_bool(self.facing_right);
        hasher.update_u8(tag);
        hasher.update_f32(elapsed);
        hasher.update_i32(self.health.current());
        hasher.update_f32(self.cooldown_remaining);
        hasher.update_f32(self.patrol_travelled);
    }

    fn enter_patrol(&mut self) {
        if self.state != ActorState::Patrol {
            self.patrol_travelled = 0.0;
        }
        self.state = ActorState::Patrol;
    }

    fn face_toward(&mut self, p: &Perception) {
        if p.offset.x.abs() > f32::EPSILON {
            self.facing_right = p.target_is_right();
        }
    }

    fn turn_around(&mut self) {
        self.facing_right = !self.facing_right;
        self.patrol_travelled = 0.0;
    }

    /// Deliver the attack: one projectile or one hit-check.
    fn fire(
        &mut self,
        target: Option<&mut dyn Damageable>,
        world: &dyn CollisionProbe,
        rng: &mut dyn RandomSource,
        combat: &CombatConfig,
        outbox: &mut TickOutbox,
    ) {
        let ranged = self.profile.is_ranged();
        outbox.emit(GameEventData::AttackFired { id: self.id, ranged });

        let Some(target) = target else {
            debug!(id = %self.id, "attack fired with no target");
            return;
        };

        if ranged {
            let Some(projectile) = self.profile.projectile else {
                return;
            };
            let muzzle = muzzle_position(self.body.center(), self.facing_right, &projectile);
            let solution = aim(muzzle, target.center(), self.facing_right, &projectile, rng);
            outbox.spawn(ProjectileSpawn::from_aim(
                self.id,
                Some(target.entity_id()),
                muzzle,
                &solution,
                &projectile,
                self.profile.attack.damage,
                combat.projectile_ttl,
            ));
            return;
        }

        if let BehaviorKind::Charger { lunge_distance } = self.profile.behavior {
            self.lunge(lunge_distance, world);
        }

        let target_id = target.entity_id();
        let damage = self.profile.attack.damage;
        if let Some(outcome) =
            melee_hit_check(self.body.center(), self.facing_right, self.profile.attack.range, damage, target)
        {
            outbox.record_damage(self.id, target_id, damage, outcome);
        }
    }

    /// Collision-checked forward dash, one unit at a time.
    fn lunge(&mut self, distance: f32, world: &dyn CollisionProbe) {
        let sign = facing_sign(self.facing_right);
        let mut moved = 0.0;
        while moved < distance {
            let step = (distance - moved).min(1.0);
            if self.body.move_horizontal(sign * step, world) {
                break;
            }
            moved += step;
        }
    }

    fn step_physics(
        &mut self,
        desired: Vec2,
        patrolling: bool,
        dt: f32,
        world: &dyn CollisionProbe,
        physics: &PhysicsConfig,
    ) {
        if self.state.is_dead() {
            return;
        }

        self.body.velocity.x = desired.x;
        if !self.body.applies_gravity {
            self.body.velocity.y = desired.y;
        }

        let dx = desired.x * dt;
        let walking_on_ground = self.body.applies_gravity && self.body.grounded;

        if patrolling {
            self.patrol_step(dx, walking_on_ground, world, physics);
        } else if dx != 0.0 {
            // Chasers stop at edges instead of walking off
            if !walking_on_ground || self.body.verify_ledge(dx > 0.0, world, physics) {
                self.body.move_horizontal(dx, world);
            }
        }

        self.body.integrate(dt, world, physics);
    }

    /// Walk along the facing direction, turning at walls, ledges, and once
    /// the accumulated distance reaches `patrol_distance`.
    fn patrol_step(&mut self, dx: f32, on_ground: bool, world: &dyn CollisionProbe, physics: &PhysicsConfig) {
        if dx == 0.0 {
            return;
        }
        if on_ground && !self.body.verify_ledge(self.facing_right, world, physics) {
            self.turn_around();
            return;
        }
        if self.body.move_horizontal(dx, world) {
            self.turn_around();
            return;
        }
        self.patrol_travelled += dx.abs();
        if self.patrol_travelled >= self.profile.patrol_distance {
            self.turn_around();
        }
    }

    fn recover(&mut self, dt: f32, world: &dyn CollisionProbe, physics: &PhysicsConfig, outbox: &mut TickOutbox) {
        if self.state.is_dead() {
            return;
        }

        if let Some(outcome) = self.corner.update(dt, &mut self.body, world, physics) {
            outbox.emit(GameEventData::CornerEscaped { id: self.id, outcome });
        }

        if self.fall_guard.check(&mut self.body, self.spawn_point, physics) {
            info!(id = %self.id, archetype = %self.archetype, "enemy fell out of the world");
            outbox.emit(GameEventData::FallRecovered { id: self.id, position: self.spawn_point });
            let outcome = self.apply_hit(physics.fall_damage, 0.0);
            outbox.record_damage(self.id, self.id, physics.fall_damage, outcome);
        }
    }

    fn apply_hit(&mut self, amount: i32, knockback: f32) -> DamageOutcome {
        if self.state.is_dead() {
            return DamageOutcome::Ignored;
        }
        match self.health.apply_damage(amount) {
            HealthChange::Unchanged | HealthChange::AlreadyDepleted => DamageOutcome::Ignored,
            HealthChange::Damaged { remaining } => {
                // A strike that already fired still owes its cooldown
                if self.fired && self.state.is_attacking() {
                    self.cooldown_remaining = self.profile.attack.cooldown;
                }
                // Cancels any windup or active attack
                self.state = ActorState::Hurt { elapsed: 0.0 };
                self.pending_knockback = knockback;
                self.body.velocity.x = 0.0;
                DamageOutcome::Damaged { remaining }
            }
            HealthChange::Depleted => {
                self.state = ActorState::Dead { elapsed: 0.0 };
                self.body.velocity = Vec2::ZERO;
                self.pending_knockback = 0.0;
                info!(id = %self.id, archetype = %self.archetype, "enemy died");
                DamageOutcome::Killed
            }
        }
    }
}

impl Damageable for Enemy {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn hitbox(&self) -> Rect {
        self.body.hitbox()
    }

    fn is_alive(&self) -> bool {
        !self.state.is_dead()
    }

    fn is_invincible(&self) -> bool {
        false
    }

    fn take_damage(&mut self, amount: i32, source: Vec2) -> DamageOutcome {
        let away = if self.body.center().x >= source.x { 1.0 } else { -1.0 };
        self.apply_hit(amount, away * self.knockback_distance)
    }
}
