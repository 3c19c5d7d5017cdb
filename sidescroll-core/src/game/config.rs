//! Simulation Configuration
//!
//! Tunables for physics, the player and combat. Every section has a
//! `Default` and deserializes with `#[serde(default)]`, so a JSON file only
//! needs the keys it overrides.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::body::HitboxShape;
use crate::game::error::ConfigError;

/// Physics and collision tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration (units/s², negative is down)
    pub gravity: f32,
    /// Minimum vertical velocity while falling (negative)
    pub terminal_velocity: f32,
    /// Depth of the strip below the feet that counts as ground support
    pub ground_probe_depth: f32,
    /// Bisection steps used to snap a landing body onto the surface
    pub ground_snap_iterations: u32,
    /// Width of the ledge probe ahead of a walking body
    pub ledge_probe_width: f32,
    /// Depth of the ledge probe below a walking body
    pub ledge_probe_depth: f32,
    /// Bodies whose feet drop below this Y are recovered
    pub world_floor_y: f32,
    /// Damage applied once per fall-out-of-world recovery
    pub fall_damage: i32,
    /// Thickness of the four penetration probes used for corner detection
    pub corner_probe_depth: f32,
    /// Seconds a body must stay corner-stuck before recovery runs
    pub corner_stuck_threshold: f32,
    /// Displacement magnitudes tried (in order) by corner recovery
    pub corner_escape_distances: Vec<f32>,
    /// Upward velocity given when no displacement frees the body
    pub corner_escape_impulse: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -800.0,
            terminal_velocity: -600.0,
            ground_probe_depth: 2.0,
            ground_snap_iterations: 12,
            ledge_probe_width: 4.0,
            ledge_probe_depth: 6.0,
            world_floor_y: -256.0,
            fall_damage: 1,
            corner_probe_depth: 2.0,
            corner_stuck_threshold: 0.5,
            corner_escape_distances: vec![4.0, 8.0, 16.0],
            corner_escape_impulse: 120.0,
        }
    }
}

/// One player strike (melee or special).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrikeConfig {
    /// Total duration of the swing (seconds)
    pub duration: f32,
    /// Time into the swing at which the single hit-check fires
    pub hit_time: f32,
    /// Reach measured between hitbox centres
    pub range: f32,
    /// Damage per hit
    pub damage: i32,
}

/// Player controller tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Horizontal run speed (units/s)
    pub run_speed: f32,
    /// Initial upward velocity of a jump
    pub jump_velocity: f32,
    /// Jump charges restored on landing
    pub max_jumps: u8,
    /// Starting and maximum health
    pub max_health: i32,
    /// Invincibility window after taking damage (seconds)
    pub invincibility_duration: f32,
    /// Player hitbox
    pub hitbox: HitboxShape,
    /// Light attack
    pub melee: StrikeConfig,
    /// Heavy attack
    pub special: StrikeConfig,
    /// Knockback distance applied when hurt
    pub knockback_distance: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            run_speed: 150.0,
            jump_velocity: 380.0,
            max_jumps: 2,
            max_health: 5,
            invincibility_duration: 2.0,
            hitbox: HitboxShape::new(Vec2::new(2.0, 0.0), Vec2::new(12.0, 28.0)),
            melee: StrikeConfig {
                duration: 0.35,
                hit_time: 0.12,
                range: 36.0,
                damage: 1,
            },
            special: StrikeConfig {
                duration: 0.8,
                hit_time: 0.45,
                range: 56.0,
                damage: 3,
            },
            knockback_distance: 12.0,
        }
    }
}

/// Shared combat tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Hurt stagger during which AI decisions are blocked (seconds)
    pub stagger_duration: f32,
    /// Death sequence length when an archetype has no authored duration
    pub default_death_duration: f32,
    /// Extra wait after the death sequence before removal
    pub death_grace: f32,
    /// Projectile time-to-live when a profile does not set one
    pub projectile_ttl: f32,
    /// Knockback distance applied to enemies when hurt
    pub knockback_distance: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            stagger_duration: 0.3,
            default_death_duration: 0.8,
            death_grace: 0.4,
            projectile_ttl: 5.0,
            knockback_distance: 10.0,
        }
    }
}

/// Configuration for a level simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed step used by `tick()` (seconds)
    pub fixed_dt: f32,
    /// Physics section
    pub physics: PhysicsConfig,
    /// Player section
    pub player: PlayerConfig,
    /// Combat section
    pub combat: CombatConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / crate::TICK_RATE as f32,
            physics: PhysicsConfig::default(),
            player: PlayerConfig::default(),
            combat: CombatConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse a JSON document, filling absent keys with defaults, and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::InvalidConfig(msg.to_string()));

        if !(self.fixed_dt > 0.0) {
            return invalid("fixed_dt must be positive");
        }
        if self.physics.gravity > 0.0 {
            return invalid("gravity must point down (<= 0)");
        }
        if self.physics.terminal_velocity >= 0.0 {
            return invalid("terminal_velocity must be negative");
        }
        if self.physics.corner_escape_distances.is_empty() {
            return invalid("corner_escape_distances must not be empty");
        }
        if self.player.max_jumps == 0 {
            return invalid("max_jumps must be at least 1");
        }
        if self.player.max_health <= 0 {
            return invalid("player max_health must be positive");
        }
        for (name, strike) in [("melee", &self.player.melee), ("special", &self.player.special)] {
            if strike.hit_time > strike.duration {
                return Err(ConfigError::InvalidConfig(format!(
                    "{name} hit_time exceeds its duration"
                )));
            }
        }
        Ok(())
    }
}
