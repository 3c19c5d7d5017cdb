//! Core primitives.
//!
//! Math, geometry, randomness and hashing shared by every simulation module.
//! Nothing in here knows about actors or levels.

pub mod vec2;
pub mod rect;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rect::Rect;
pub use rng::{DeterministicRng, RandomSource};
pub use hash::{compute_state_hash, StateHash};
