//! Game Logic Module
//!
//! All level simulation code. Deterministic for a given seed and input.
//!
//! ## Module Structure
//!
//! - `world`: Collision probe contract and a tile-map implementation
//! - `body`: Kinematic integration, ledge probes, ground placement, fall guard
//! - `corner`: Corner-stuck detection and escape
//! - `health`: Health pools and the damage capability shared by all actors
//! - `profile`: Archetype data (AI, attack and projectile profiles)
//! - `behavior`: Steering and intent selection per behaviour kind
//! - `enemy`: The enemy state machine
//! - `targeting`: Melee hit-checks and ranged aim
//! - `projectile`: Projectile entities
//! - `player`: The player controller
//! - `factory`: Spawn descriptors and the enemy factory
//! - `input`: Input frames and delta-compressed recordings
//! - `state`: Level state, entity ids, deferred tick mutations
//! - `tick`: Authoritative simulation loop and replay
//! - `events`: Outbound events for the render/update-list collaborator

pub mod config;
pub mod error;
pub mod world;
pub mod body;
pub mod corner;
pub mod health;
pub mod profile;
pub mod behavior;
pub mod enemy;
pub mod targeting;
pub mod projectile;
pub mod player;
pub mod factory;
pub mod input;
pub mod state;
pub mod tick;
pub mod events;

// Re-export key types
pub use config::SimConfig;
pub use error::ConfigError;
pub use world::{CollisionProbe, TileMap};
pub use body::{HitboxShape, KinematicBody};
pub use health::{Damageable, DamageOutcome, HealthPool};
pub use profile::{AiProfile, ArchetypeCatalog, BehaviorKind};
pub use enemy::{ActorState, Enemy};
pub use player::Player;
pub use projectile::Projectile;
pub use factory::{EnemyFactory, SpawnDescriptor};
pub use input::{InputFrame, InputRecording};
pub use state::{EntityId, LevelBuilder, LevelState};
pub use tick::{tick, replay, TickResult};
pub use events::{GameEvent, GameEventData};
