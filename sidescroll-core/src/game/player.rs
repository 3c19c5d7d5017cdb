//! Player Controller
//!
//! The player's kinematic body plus two jump charges, melee and special
//! strikes, a held block, health and a post-hit invincibility window.
//!
//! Strikes, block and idle are mutually exclusive (`PlayerAction`). A strike
//! produces exactly one hit-check, at its hit time; the tick applies it to
//! every enemy in reach.

use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::body::{FallGuard, KinematicBody};
use crate::game::config::{PlayerConfig, SimConfig, StrikeConfig};
use crate::game::corner::{CornerEscape, CornerOutcome};
use crate::game::health::{Damageable, DamageOutcome, HealthChange, HealthPool};
use crate::game::input::InputFrame;
use crate::game::state::{AnimationKey, EntityId};
use crate::game::world::CollisionProbe;

/// Which strike is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrikeKind {
    /// Quick light attack
    Melee,
    /// Slow heavy attack
    Special,
}

/// What the player is doing besides moving.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Free
    Idle,
    /// Swinging
    Attacking {
        /// Melee or special
        kind: StrikeKind,
        /// Seconds into the swing
        elapsed: f32,
        /// The single hit-check has fired
        hit_done: bool,
    },
    /// Defend held: no movement, no damage
    Blocking,
}

/// A hit-check produced by a strike this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strike {
    /// Melee or special
    pub kind: StrikeKind,
    /// Centre of the player's hitbox
    pub origin: Vec2,
    /// Facing at the moment of the hit
    pub facing_right: bool,
    /// Reach
    pub range: f32,
    /// Damage per target
    pub damage: i32,
}

/// What happened to the player during one update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerStep {
    /// Hit-check to apply this tick
    pub strike: Option<Strike>,
    /// A jump charge was spent
    pub jumped: bool,
    /// Touched down this tick
    pub landed: bool,
    /// Corner recovery ran
    pub corner: Option<CornerOutcome>,
    /// Fell out of the world; outcome of the fall damage
    pub fall: Option<DamageOutcome>,
}

/// The player avatar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    /// Entity id (always `EntityId::PLAYER`)
    pub id: EntityId,
    /// Physics body
    pub body: KinematicBody,
    /// Facing direction
    pub facing_right: bool,
    health: HealthPool,
    jumps_remaining: u8,
    action: PlayerAction,
    invincible_remaining: f32,
    defeated: bool,
    respawn_point: Vec2,
    pending_knockback: f32,
    previous_input: InputFrame,
    invincibility_duration: f32,
    knockback_distance: f32,
    corner: CornerEscape,
    fall_guard: FallGuard,
}

impl Player {
    /// Create the player at `position`, which also becomes the first checkpoint.
    pub fn new(position: Vec2, config: &PlayerConfig) -> Self {
        Self {
            id: EntityId::PLAYER,
            body: KinematicBody::new(position, config.hitbox, true),
            facing_right: true,
            health: HealthPool::new(config.max_health),
            jumps_remaining: config.max_jumps,
            action: PlayerAction::Idle,
            invincible_remaining: 0.0,
            defeated: false,
            respawn_point: position,
            pending_knockback: 0.0,
            previous_input: InputFrame::new(),
            invincibility_duration: config.invincibility_duration,
            knockback_distance: config.knockback_distance,
            corner: CornerEscape::default(),
            fall_guard: FallGuard::default(),
        }
    }

    /// Health pool.
    pub fn health(&self) -> &HealthPool {
        &self.health
    }

    /// Jump charges left before landing.
    pub fn jumps_remaining(&self) -> u8 {
        self.jumps_remaining
    }

    /// Current action.
    pub fn action(&self) -> PlayerAction {
        self.action
    }

    /// Seconds of invincibility left.
    pub fn invincible_remaining(&self) -> f32 {
        self.invincible_remaining
    }

    /// Health reached zero. Terminal until the level is rebuilt.
    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Holding block.
    pub fn is_blocking(&self) -> bool {
        self.action == PlayerAction::Blocking
    }

    /// Where fall recovery puts the player.
    pub fn respawn_point(&self) -> Vec2 {
        self.respawn_point
    }

    /// Move the fall-recovery point.
    pub fn set_checkpoint(&mut self, position: Vec2) {
        self.respawn_point = position;
    }

    /// Advance one tick with this frame's input.
    pub fn update(
        &mut self,
        input: &InputFrame,
        dt: f32,
        world: &dyn CollisionProbe,
        config: &SimConfig,
    ) -> PlayerStep {
        let mut step = PlayerStep::default();
        let pressed = input.pressed_since(&self.previous_input);
        self.previous_input = *input;

        if self.defeated {
            return step;
        }

        let tuning = &config.player;
        let physics = &config.physics;

        self.invincible_remaining = (self.invincible_remaining - dt).max(0.0);

        if self.pending_knockback != 0.0 {
            self.body.move_horizontal(self.pending_knockback, world);
            self.pending_knockback = 0.0;
        }

        // Action state
        match self.action {
            PlayerAction::Attacking { kind, elapsed, hit_done } => {
                let strike = strike_config(kind, tuning);
                let elapsed = elapsed + dt;
                let mut hit_done = hit_done;
                if !hit_done && elapsed >= strike.hit_time {
                    hit_done = true;
                    step.strike = Some(Strike {
                        kind,
                        origin: self.body.center(),
                        facing_right: self.facing_right,
                        range: strike.range,
                        damage: strike.damage,
                    });
                }
                self.action = if elapsed >= strike.duration {
                    PlayerAction::Idle
                } else {
                    PlayerAction::Attacking { kind, elapsed, hit_done }
                };
            }
            PlayerAction::Blocking => {
                if !input.defend() {
                    self.action = PlayerAction::Idle;
                }
            }
            PlayerAction::Idle => {}
        }

        if self.action == PlayerAction::Idle {
            if input.defend() {
                self.action = PlayerAction::Blocking;
            } else if pressed & InputFrame::FLAG_SPECIAL != 0 {
                self.action = start_strike(StrikeKind::Special);
            } else if pressed & InputFrame::FLAG_ATTACK != 0 {
                self.action = start_strike(StrikeKind::Melee);
            }
        }

        // Movement
        let blocking = self.is_blocking();
        let move_x = if blocking { 0.0 } else { input.movement().x };
        if move_x != 0.0 && !matches!(self.action, PlayerAction::Attacking { .. }) {
            self.facing_right = move_x > 0.0;
        }
        self.body.velocity.x = move_x * tuning.run_speed;

        let was_grounded = self.body.grounded;
        if !blocking && pressed & InputFrame::FLAG_JUMP != 0 && self.jumps_remaining > 0 {
            self.body.velocity.y = tuning.jump_velocity;
            self.body.grounded = false;
            self.jumps_remaining -= 1;
            step.jumped = true;
        }

        self.body.move_horizontal(self.body.velocity.x * dt, world);
        let report = self.body.integrate(dt, world, physics);
        step.landed = report.landed;

        if self.body.grounded {
            self.jumps_remaining = tuning.max_jumps;
        } else if was_grounded && !step.jumped {
            // Walked off an edge: the ground jump is gone
            self.jumps_remaining = self.jumps_remaining.min(tuning.max_jumps.saturating_sub(1));
        }

        step.corner = self.corner.update(dt, &mut self.body, world, physics);

        if self.fall_guard.check(&mut self.body, self.respawn_point, physics) {
            info!(respawn = %self.respawn_point, "player fell out of the world");
            step.fall = Some(self.apply_hit(physics.fall_damage, 0.0, true));
        }

        step
    }

    /// Animation the render collaborator should show.
    pub fn animation(&self) -> AnimationKey {
        if self.defeated {
            return AnimationKey::Death;
        }
        match self.action {
            PlayerAction::Blocking => AnimationKey::Block,
            PlayerAction::Attacking { kind: StrikeKind::Melee, .. } => AnimationKey::Attack,
            PlayerAction::Attacking { kind: StrikeKind::Special, .. } => AnimationKey::Special,
            PlayerAction::Idle => AnimationKey::for_motion(&self.body),
        }
    }

    /// Feed the player into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_vec2(self.body.position);
        hasher.update_vec2(self.body.velocity);
        hasher.update_bool(self.body.grounded);
        hasher.update_bool(self.facing_right);
        hasher.update_i32(self.health.current());
        hasher.update_u8(self.jumps_remaining);
        hasher.update_f32(self.invincible_remaining);
        hasher.update_bool(self.defeated);
        match self.action {
            PlayerAction::Idle => hasher.update_u8(0),
            PlayerAction::Attacking { kind, elapsed, hit_done } => {
                hasher.update_u8(1 + kind as u8);
                hasher.update_f32(elapsed);
                hasher.update_bool(hit_done);
            }
            PlayerAction::Blocking => hasher.update_u8(3),
        }
    }

    /// Apply damage. `unguarded` hits (fall damage) ignore block and
    /// invincibility.
    fn apply_hit(&mut self, amount: i32, knockback: f32, unguarded: bool) -> DamageOutcome {
        if self.defeated {
            return DamageOutcome::Ignored;
        }
        if !unguarded {
            if self.invincible_remaining > 0.0 {
                return DamageOutcome::Ignored;
            }
            if self.is_blocking() {
                return DamageOutcome::Blocked;
            }
        }

        match self.health.apply_damage(amount) {
            HealthChange::Unchanged | HealthChange::AlreadyDepleted => DamageOutcome::Ignored,
            HealthChange::Damaged { remaining } => {
                self.invincible_remaining = self.invincibility_duration;
                self.pending_knockback = knockback;
                DamageOutcome::Damaged { remaining }
            }
            HealthChange::Depleted => {
                self.defeated = true;
                self.action = PlayerAction::Idle;
                self.body.velocity = Vec2::ZERO;
                self.pending_knockback = 0.0;
                warn!("player defeated");
                DamageOutcome::Killed
            }
        }
    }
}

fn strike_config(kind: StrikeKind, tuning: &PlayerConfig) -> StrikeConfig {
    match kind {
        StrikeKind::Melee => tuning.melee,
        StrikeKind::Special => tuning.special,
    }
}

fn start_strike(kind: StrikeKind) -> PlayerAction {
    PlayerAction::Attacking { kind, elapsed: 0.0, hit_done: false }
}

impl Damageable for Player {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn hitbox(&self) -> Rect {
        self.body.hitbox()
    }

    fn is_alive(&self) -> bool {
        !self.defeated
    }

    fn is_invincible(&self) -> bool {
        self.invincible_remaining > 0.0
    }

    fn take_damage(&mut self, amount: i32, source: Vec2) -> DamageOutcome {
        let away = if self.body.center().x >= source.x { 1.0 } else { -1.0 };
        self.apply_hit(amount, away * self.knockback_distance, false)
    }
}
