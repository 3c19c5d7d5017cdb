//! Level State Definitions
//!
//! All state for one running level.
//! Uses BTreeMap for deterministic iteration order.
//!
//! Entity-list mutation is deferred: during a tick, actors write spawns,
//! removals and events into a `TickOutbox`, and `LevelState::commit` applies
//! them once every actor has updated.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::body::KinematicBody;
use crate::game::config::SimConfig;
use crate::game::enemy::Enemy;
use crate::game::error::ConfigError;
use crate::game::events::{EntityKind, GameEvent, GameEventData, RemovalReason};
use crate::game::factory::{EnemyFactory, SpawnDescriptor};
use crate::game::health::DamageOutcome;
use crate::game::player::Player;
use crate::game::profile::ArchetypeCatalog;
use crate::game::projectile::Projectile;
use crate::game::targeting::ProjectileSpawn;
use crate::game::world::CollisionProbe;

// =============================================================================
// ENTITY ID
// =============================================================================

/// Unique entity identifier within a level.
///
/// Implements Ord for deterministic BTreeMap ordering. Ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// The player is always entity 0.
    pub const PLAYER: EntityId = EntityId(0);

    /// Is this the player?
    #[inline]
    pub fn is_player(self) -> bool {
        self == Self::PLAYER
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source shared by enemies and projectiles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Allocator whose first id follows the player's.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Allocator whose first id is `first`.
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Hand out the next id.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Id the next `allocate` will return.
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ANIMATION KEY
// =============================================================================

/// Animation the render collaborator should show for an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AnimationKey {
    /// Standing still
    Idle = 0,
    /// Moving horizontally
    Walk = 1,
    /// Rising
    Jump = 2,
    /// Falling
    Fall = 3,
    /// Attack preparation
    Windup = 4,
    /// Attack in progress
    Attack = 5,
    /// Player heavy strike
    Special = 6,
    /// Player defending
    Block = 7,
    /// Staggered
    Hurt = 8,
    /// Death sequence
    Death = 9,
}

impl AnimationKey {
    /// Locomotion animation for a body with no action overriding it.
    pub fn for_motion(body: &KinematicBody) -> Self {
        if body.applies_gravity && !body.grounded {
            if body.velocity.y > 0.0 {
                Self::Jump
            } else {
                Self::Fall
            }
        } else if body.velocity.x.abs() > f32::EPSILON {
            Self::Walk
        } else {
            Self::Idle
        }
    }
}

// =============================================================================
// TICK OUTBOX
// =============================================================================

/// Mutations and events collected while actors update.
///
/// Nothing here touches the entity lists until `LevelState::commit`.
#[derive(Clone, Debug, Default)]
pub struct TickOutbox {
    tick: u32,
    spawns: Vec<ProjectileSpawn>,
    removals: Vec<(EntityId, RemovalReason)>,
    events: Vec<GameEvent>,
}

impl TickOutbox {
    /// Empty outbox for `tick`.
    pub fn new(tick: u32) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    /// Tick this outbox belongs to.
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Queue a projectile for insertion.
    pub fn spawn(&mut self, spawn: ProjectileSpawn) {
        self.spawns.push(spawn);
    }

    /// Queue an entity for removal. Duplicate requests are dropped.
    pub fn remove(&mut self, id: EntityId, reason: RemovalReason) {
        if !self.removals.iter().any(|(queued, _)| *queued == id) {
            self.removals.push((id, reason));
        }
    }

    /// Record an event.
    pub fn emit(&mut self, data: GameEventData) {
        self.events.push(GameEvent::new(self.tick, data));
    }

    /// Record the outcome of one damage application.
    ///
    /// Killing the player also raises the defeat signal.
    pub fn record_damage(&mut self, source: EntityId, target: EntityId, amount: i32, outcome: DamageOutcome) {
        if let Some(event) = GameEvent::from_damage(self.tick, source, target, amount, outcome) {
            self.events.push(event);
        }
        if target.is_player() && outcome == DamageOutcome::Killed {
            self.emit(GameEventData::PlayerDefeated);
        }
    }

    /// Queued projectile spawns.
    pub fn spawns(&self) -> &[ProjectileSpawn] {
        &self.spawns
    }

    /// Queued removals.
    pub fn removals(&self) -> &[(EntityId, RemovalReason)] {
        &self.removals
    }

    /// Recorded events.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Split into spawns, removals and events.
    pub fn into_parts(self) -> (Vec<ProjectileSpawn>, Vec<(EntityId, RemovalReason)>, Vec<GameEvent>) {
        (self.spawns, self.removals, self.events)
    }
}

// =============================================================================
// LEVEL STATE
// =============================================================================

/// Complete state of a running level.
///
/// Uses BTreeMap for deterministic iteration order.
pub struct LevelState {
    /// Ticks simulated so far
    pub tick: u32,

    /// RNG seed (for replay)
    pub rng_seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// The player
    pub player: Player,

    /// Enemies, including dead ones still playing their death sequence
    pub enemies: BTreeMap<EntityId, Enemy>,

    /// Projectiles in flight
    pub projectiles: BTreeMap<EntityId, Projectile>,

    /// Simulation tuning
    pub config: SimConfig,

    pub(crate) ids: IdAllocator,

    /// Events generated since the last `take_events`
    pub(crate) pending_events: Vec<GameEvent>,

    pub(crate) world: Box<dyn CollisionProbe>,
}

impl LevelState {
    /// World geometry.
    pub fn world(&self) -> &dyn CollisionProbe {
        &*self.world
    }

    /// Get an enemy by ID.
    pub fn get_enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Number of enemies not yet dead.
    pub fn living_enemy_count(&self) -> usize {
        self.enemies.values().filter(|e| !e.is_dead()).count()
    }

    /// Has the player been defeated?
    pub fn is_over(&self) -> bool {
        self.player.is_defeated()
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            self.player.hash_into(hasher);

            // BTreeMap iterates in id order
            for enemy in self.enemies.values() {
                enemy.hash_into(hasher);
            }

            for projectile in self.projectiles.values() {
                hasher.update_u32(projectile.id.0);
                hasher.update_u32(projectile.owner.0);
                hasher.update_vec2(projectile.position);
                hasher.update_vec2(projectile.velocity);
                hasher.update_f32(projectile.ttl_remaining);
            }

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
            hasher.update_u32(self.ids.peek().0);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Apply a tick's deferred mutations: removals first, then spawns.
    ///
    /// The tick's events are appended to the pending queue in processing
    /// order; `take_events` drains them.
    pub fn commit(&mut self, outbox: TickOutbox) {
        let tick = outbox.tick();
        let (spawns, removals, mut events) = outbox.into_parts();

        for (id, reason) in removals {
            let removed = self.enemies.remove(&id).is_some() || self.projectiles.remove(&id).is_some();
            if removed {
                events.push(GameEvent::entity_removed(tick, id, reason));
            }
        }

        for spawn in spawns {
            let id = self.ids.allocate();
            self.projectiles.insert(id, Projectile::from_spawn(id, spawn));
            events.push(GameEvent::entity_created(tick, id, EntityKind::Projectile));
        }

        // Stable: same-priority events keep emission order
        events.sort();
        self.pending_events.extend(events);
    }
}

impl fmt::Debug for LevelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelState")
            .field("tick", &self.tick)
            .field("rng_seed", &self.rng_seed)
            .field("player", &self.player.body.position)
            .field("enemies", &self.enemies.len())
            .field("projectiles", &self.projectiles.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// LEVEL BUILDER
// =============================================================================

/// Assembles a `LevelState` at load time.
///
/// The collision probe is mandatory; everything else has a default.
pub struct LevelBuilder {
    seed: u64,
    config: SimConfig,
    world: Option<Box<dyn CollisionProbe>>,
    player_spawn: Vec2,
    catalog: ArchetypeCatalog,
    spawns: Vec<SpawnDescriptor>,
}

impl LevelBuilder {
    /// Start a level with the given RNG seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: SimConfig::default(),
            world: None,
            player_spawn: Vec2::ZERO,
            catalog: ArchetypeCatalog::builtin(),
            spawns: Vec::new(),
        }
    }

    /// Simulation tuning.
    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// World collision probe.
    pub fn world(mut self, world: impl CollisionProbe + 'static) -> Self {
        self.world = Some(Box::new(world));
        self
    }

    /// Player start position (also the first respawn point).
    pub fn player_spawn(mut self, position: Vec2) -> Self {
        self.player_spawn = position;
        self
    }

    /// Archetype table.
    pub fn catalog(mut self, catalog: ArchetypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Enemy spawn list.
    pub fn spawns(mut self, spawns: Vec<SpawnDescriptor>) -> Self {
        self.spawns = spawns;
        self
    }

    /// Build the level, dropping per-entity problems after logging them.
    pub fn build(self) -> Result<LevelState, ConfigError> {
        self.build_with_report().map(|(level, _)| level)
    }

    /// Build the level and return the skipped-spawn problems alongside it.
    pub fn build_with_report(self) -> Result<(LevelState, Vec<ConfigError>), ConfigError> {
        let Some(world) = self.world else {
            warn!("level has no collision probe");
            return Err(ConfigError::MissingCollisionProbe);
        };
        self.config.validate()?;

        let mut player = Player::new(self.player_spawn, &self.config.player);
        if player.body.place_on_ground(crate::game::factory::PLACEMENT_REACH, &*world, &self.config.physics) {
            player.set_checkpoint(player.body.position);
        }

        let mut ids = IdAllocator::new();
        let report = EnemyFactory::new(&self.catalog, &*world, &self.config)
            .with_target(Some(EntityId::PLAYER))
            .spawn_all(&self.spawns, &mut ids);

        let mut level = LevelState {
            tick: 0,
            rng_seed: self.seed,
            rng: DeterministicRng::new(self.seed),
            player,
            enemies: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            config: self.config,
            ids,
            pending_events: Vec::new(),
            world,
        };

        level.push_event(GameEvent::entity_created(0, EntityId::PLAYER, EntityKind::Player));
        for enemy in report.enemies {
            level.push_event(GameEvent::entity_created(0, enemy.id, EntityKind::Enemy));
            level.enemies.insert(enemy.id, enemy);
        }

        info!(
            seed = level.rng_seed,
            enemies = level.enemies.len(),
            skipped = report.problems.len(),
            "level built"
        );
        Ok((level, report.problems))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::TileMap;

    fn floor() -> TileMap {
        TileMap::from_rows(&["................", "................", "################"], 16.0)
    }

    fn spawn(archetype: &str, x: f32) -> SpawnDescriptor {
        SpawnDescriptor::new(archetype, Vec2::new(x, 20.0))
    }

    #[test]
    fn test_entity_id_ordering() {
        assert!(EntityId::PLAYER < EntityId(1));
        assert!(EntityId(2) < EntityId(10));
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn test_id_allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.peek(), EntityId(1));
        assert_eq!(ids.allocate(), EntityId(1));
        assert_eq!(ids.allocate(), EntityId(2));
        assert_eq!(ids.peek(), EntityId(3));
    }

    #[test]
    fn test_missing_probe_is_config_error() {
        let err = LevelBuilder::new(1).spawns(vec![spawn("grunt", 64.0)]).build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCollisionProbe));
    }

    #[test]
    fn test_build_skips_unknown_archetypes() {
        let (level, problems) = LevelBuilder::new(1)
            .world(floor())
            .player_spawn(Vec2::new(16.0, 40.0))
            .spawns(vec![spawn("grunt", 64.0), spawn("wyvern", 96.0), spawn("archer", 160.0)])
            .build_with_report()
            .unwrap();

        assert_eq!(level.enemies.len(), 2);
        assert_eq!(problems.len(), 1);
        assert!(level.player.body.grounded);
        assert_eq!(level.player.respawn_point(), level.player.body.position);

        let ids: Vec<_> = level.enemies.keys().copied().collect();
        assert_eq!(ids, vec![EntityId(1), EntityId(2)]);
    }

    #[test]
    fn test_commit_removes_before_spawning() {
        let mut level = LevelBuilder::new(1)
            .world(floor())
            .spawns(vec![spawn("grunt", 64.0)])
            .build()
            .unwrap();
        level.take_events();

        let mut outbox = TickOutbox::new(5);
        outbox.spawn(ProjectileSpawn {
            owner: EntityId(1),
            target: Some(EntityId::PLAYER),
            position: Vec2::new(10.0, 40.0),
            velocity: Vec2::new(-100.0, 0.0),
            size: Vec2::new(4.0, 4.0),
            damage: 1,
            ttl: 5.0,
        });
        outbox.remove(EntityId(1), RemovalReason::Died);
        outbox.remove(EntityId(1), RemovalReason::Died);

        level.commit(outbox);
        let events = level.take_events();
        assert!(level.enemies.is_empty());
        assert_eq!(level.projectiles.len(), 1);
        assert!(level.projectiles.contains_key(&EntityId(2)));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, GameEventData::EntityRemoved { id: EntityId(1), reason: RemovalReason::Died });
        assert_eq!(events[1].data, GameEventData::EntityCreated { id: EntityId(2), kind: EntityKind::Projectile });
        assert!(level.take_events().is_empty());
    }

    #[test]
    fn test_player_kill_raises_defeat() {
        let mut outbox = TickOutbox::new(3);
        outbox.record_damage(EntityId(4), EntityId::PLAYER, 1, DamageOutcome::Killed);
        outbox.record_damage(EntityId::PLAYER, EntityId(4), 1, DamageOutcome::Killed);
        outbox.record_damage(EntityId(4), EntityId::PLAYER, 1, DamageOutcome::Ignored);

        let defeats = outbox.events().iter().filter(|e| e.data == GameEventData::PlayerDefeated).count();
        assert_eq!(defeats, 1);
        assert_eq!(outbox.events().len(), 3);
    }

    #[test]
    fn test_level_state_determinism() {
        let build = || {
            LevelBuilder::new(12345)
                .world(floor())
                .player_spawn(Vec2::new(16.0, 40.0))
                .spawns(vec![spawn("grunt", 64.0), spawn("caster", 120.0)])
                .build()
                .unwrap()
        };
        assert_eq!(build().compute_hash(), build().compute_hash());

        let other = LevelBuilder::new(54321).world(floor()).player_spawn(Vec2::new(16.0, 40.0)).build().unwrap();
        assert_ne!(build().compute_hash(), other.compute_hash());
    }
}
