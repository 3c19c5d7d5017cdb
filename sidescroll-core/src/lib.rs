//! # Sidescroll Core
//!
//! Kinematic physics, tile collision and enemy behaviour for a 2D
//! side-scrolling action game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SIDESCROLL CORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - 2D vector                                 │
//! │  ├── rect.rs     - Axis-aligned rectangle                    │
//! │  ├── rng.rs      - Seedable Xorshift128+ PRNG                │
//! │  └── hash.rs     - State hashing for replay verification     │
//! │                                                              │
//! │  game/           - Level simulation                          │
//! │  ├── world.rs    - Collision probe + tile map                │
//! │  ├── body.rs     - Kinematic body and ground snapping        │
//! │  ├── corner.rs   - Corner-escape recovery                    │
//! │  ├── enemy.rs    - Enemy state machine                       │
//! │  ├── targeting.rs- Melee checks and ranged aim               │
//! │  ├── player.rs   - Player controller                         │
//! │  ├── factory.rs  - Enemy factory                             │
//! │  ├── state.rs    - Level state                               │
//! │  └── tick.rs     - Authoritative simulation loop             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same seed, level and input recording, `game::tick::replay`
//! reproduces the live run bit for bit:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time inside the tick; the step is a fixed `dt`
//! - All randomness from the level's seeded Xorshift128+
//!
//! Coordinates are Y-up, and a body's position is the bottom-left of its
//! hitbox before the archetype offset.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::rect::Rect;
pub use crate::core::vec2::Vec2;
pub use crate::core::rng::{DeterministicRng, RandomSource};
pub use crate::game::input::{InputFrame, InputRecording};
pub use crate::game::state::{EntityId, LevelBuilder, LevelState};
pub use crate::game::config::SimConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
