//! Archetype Profiles
//!
//! Enemy archetypes are data, not subclasses. Each archetype is one
//! `AiProfile` record; the closed `BehaviorKind` tag picks which behaviour
//! functions drive it (see `behavior.rs`).
//!
//! `ArchetypeCatalog` is the lookup table the factory resolves spawn
//! descriptors against. It ships with built-in archetypes and can be
//! overlaid from JSON.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::body::HitboxShape;
use crate::game::error::ConfigError;

/// Timing and reach of one attack. Immutable per archetype instance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Damage per hit
    pub damage: i32,
    /// Reach between hitbox centres; also the distance that triggers an attack
    pub range: f32,
    /// Preparation time before the hit-check / projectile fires
    pub windup: f32,
    /// Time spent in the active phase after firing
    pub active: f32,
    /// Time after the active phase before the next attack may start
    pub cooldown: f32,
}

/// Ranged attack parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileProfile {
    /// Launch speed (units/s)
    pub speed: f32,
    /// Lifetime; falls back to the combat default when absent
    #[serde(default)]
    pub ttl: Option<f32>,
    /// Projectile hitbox size
    pub size: Vec2,
    /// Muzzle offset from the body centre, X mirrored by facing
    pub muzzle_offset: Vec2,
    /// Spread radius around the aim point
    pub spread_radius: f32,
    /// Fraction of the spread radius used as the per-axis perturbation bound
    #[serde(default = "default_variance")]
    pub variance: f32,
}

impl ProjectileProfile {
    /// Largest per-axis aim perturbation.
    pub fn variance_bound(&self) -> f32 {
        self.spread_radius * self.variance
    }
}

/// Behaviour family. Selects steering and attack delivery.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorKind {
    /// Walks up and strikes
    Melee,
    /// Melee variant that lunges forward when the strike fires
    Charger {
        /// Horizontal distance covered by the lunge
        lunge_distance: f32,
    },
    /// Ground-bound shooter that keeps its distance
    Ranged,
    /// Gravity-free shooter that steers in both axes
    Floating,
}

impl BehaviorKind {
    /// Delivers its attack as a projectile.
    pub fn is_ranged(&self) -> bool {
        matches!(self, Self::Ranged | Self::Floating)
    }

    /// Steers on both axes.
    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Floating)
    }
}

/// Preferred distance band for ranged archetypes, as fractions of attack range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    /// Retreat when closer than `min * range`
    pub min: f32,
    /// Approach when farther than `max * range`
    pub max: f32,
}

impl Default for DistanceBand {
    fn default() -> Self {
        Self { min: 0.7, max: 0.8 }
    }
}

/// Everything that distinguishes one enemy archetype from another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    /// Behaviour family
    pub behavior: BehaviorKind,
    /// Patrol walking speed
    pub speed: f32,
    /// Speed while chasing or repositioning
    pub chase_speed: f32,
    /// Distance walked before a patrol turns around
    pub patrol_distance: f32,
    /// Targets farther than this are ignored
    pub aggro_range: f32,
    /// Chase range as a multiple of attack range
    #[serde(default = "default_chase_multiplier")]
    pub chase_range_multiplier: f32,
    /// Ranged only: band kept around the target
    #[serde(default)]
    pub maintain_band: DistanceBand,
    /// Attack timing and reach
    pub attack: AttackProfile,
    /// Ranged only: projectile parameters
    #[serde(default)]
    pub projectile: Option<ProjectileProfile>,
    /// Floating archetypes disable gravity
    #[serde(default = "default_true")]
    pub applies_gravity: bool,
    /// Starting health
    pub max_health: i32,
    /// Hitbox relative to the body position
    pub hitbox: HitboxShape,
    /// Authored death sequence length; the combat default is used if absent
    #[serde(default)]
    pub death_duration: Option<f32>,
}

fn default_variance() -> f32 {
    0.15
}

fn default_chase_multiplier() -> f32 {
    1.3
}

fn default_true() -> bool {
    true
}

impl AiProfile {
    /// Distance beyond which a ranged archetype closes in.
    pub fn chase_range(&self) -> f32 {
        self.attack.range * self.chase_range_multiplier
    }

    /// Delivers its attack as a projectile.
    pub fn is_ranged(&self) -> bool {
        self.behavior.is_ranged()
    }

    /// Check the profile is usable.
    pub fn validate(&self, id: &str) -> Result<(), ConfigError> {
        let invalid = |what: &str| Err(ConfigError::InvalidConfig(format!("archetype {id}: {what}")));

        if self.speed < 0.0 || self.chase_speed < 0.0 {
            return invalid("speeds must not be negative");
        }
        if self.patrol_distance <= 0.0 {
            return invalid("patrol_distance must be positive");
        }
        if self.attack.range <= 0.0 {
            return invalid("attack range must be positive");
        }
        if self.attack.windup < 0.0 || self.attack.active < 0.0 || self.attack.cooldown < 0.0 {
            return invalid("attack timings must not be negative");
        }
        if self.aggro_range < self.attack.range {
            return invalid("aggro_range must cover the attack range");
        }
        if self.chase_range_multiplier < 1.0 {
            return invalid("chase_range_multiplier must be at least 1");
        }
        if !(0.0 < self.maintain_band.min && self.maintain_band.min <= self.maintain_band.max && self.maintain_band.max <= 1.0) {
            return invalid("maintain_band must satisfy 0 < min <= max <= 1");
        }
        if self.max_health <= 0 {
            return invalid("max_health must be positive");
        }
        if self.behavior.is_ranged() {
            match &self.projectile {
                Some(p) if p.speed > 0.0 => {}
                Some(_) => return invalid("projectile speed must be positive"),
                None => return invalid("ranged behaviour needs a projectile profile"),
            }
        }
        if self.behavior.is_floating() && self.applies_gravity {
            return invalid("floating archetypes cannot apply gravity");
        }
        Ok(())
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Archetype id to profile table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeCatalog {
    profiles: BTreeMap<String, AiProfile>,
}

impl ArchetypeCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in archetypes.
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert("grunt".to_string(), grunt());
        profiles.insert("brute".to_string(), brute());
        profiles.insert("hound".to_string(), hound());
        profiles.insert("archer".to_string(), archer());
        profiles.insert("caster".to_string(), caster());
        Self { profiles }
    }

    /// Built-in archetypes overlaid with the entries of a JSON object
    /// (`{ "id": { ...profile... }, ... }`). Entries replace built-ins of the
    /// same id.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let overlay: BTreeMap<String, AiProfile> = serde_json::from_str(json)?;
        let mut catalog = Self::builtin();
        for (id, profile) in overlay {
            catalog.insert(id, profile)?;
        }
        Ok(catalog)
    }

    /// Add or replace an archetype after validating it.
    pub fn insert(&mut self, id: impl Into<String>, profile: AiProfile) -> Result<(), ConfigError> {
        let id = id.into();
        profile.validate(&id)?;
        self.profiles.insert(id, profile);
        Ok(())
    }

    /// Look up an archetype.
    pub fn get(&self, id: &str) -> Option<&AiProfile> {
        self.profiles.get(id)
    }

    /// Known archetype ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Number of archetypes.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True if no archetypes are registered.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn grunt() -> AiProfile {
    AiProfile {
        behavior: BehaviorKind::Melee,
        speed: 40.0,
        chase_speed: 70.0,
        patrol_distance: 96.0,
        aggro_range: 160.0,
        chase_range_multiplier: 1.5,
        maintain_band: DistanceBand::default(),
        attack: AttackProfile { damage: 1, range: 28.0, windup: 0.35, active: 0.25, cooldown: 1.0 },
        projectile: None,
        applies_gravity: true,
        max_health: 3,
        hitbox: HitboxShape::new(Vec2::new(2.0, 0.0), Vec2::new(14.0, 22.0)),
        death_duration: Some(0.8),
    }
}

fn brute() -> AiProfile {
    AiProfile {
        behavior: BehaviorKind::Charger { lunge_distance: 24.0 },
        speed: 30.0,
        chase_speed: 55.0,
        patrol_distance: 64.0,
        aggro_range: 180.0,
        chase_range_multiplier: 1.5,
        maintain_band: DistanceBand::default(),
        attack: AttackProfile { damage: 2, range: 40.0, windup: 0.6, active: 0.4, cooldown: 1.8 },
        projectile: None,
        applies_gravity: true,
        max_health: 6,
        hitbox: HitboxShape::new(Vec2::ZERO, Vec2::new(22.0, 30.0)),
        death_duration: Some(1.2),
    }
}

fn hound() -> AiProfile {
    AiProfile {
        behavior: BehaviorKind::Charger { lunge_distance: 32.0 },
        speed: 70.0,
        chase_speed: 120.0,
        patrol_distance: 128.0,
        aggro_range: 220.0,
        chase_range_multiplier: 1.5,
        maintain_band: DistanceBand::default(),
        attack: AttackProfile { damage: 1, range: 30.0, windup: 0.25, active: 0.2, cooldown: 0.9 },
        projectile: None,
        applies_gravity: true,
        max_health: 2,
        hitbox: HitboxShape::new(Vec2::ZERO, Vec2::new(18.0, 14.0)),
        // No authored death sequence
        death_duration: None,
    }
}

fn archer() -> AiProfile {
    AiProfile {
        behavior: BehaviorKind::Ranged,
        speed: 35.0,
        chase_speed: 60.0,
        patrol_distance: 80.0,
        aggro_range: 260.0,
        chase_range_multiplier: 1.3,
        maintain_band: DistanceBand { min: 0.7, max: 0.8 },
        attack: AttackProfile { damage: 1, range: 180.0, windup: 0.5, active: 0.3, cooldown: 1.5 },
        projectile: Some(ProjectileProfile {
            speed: 220.0,
            ttl: None,
            size: Vec2::new(6.0, 3.0),
            muzzle_offset: Vec2::new(10.0, 6.0),
            spread_radius: 40.0,
            variance: 0.15,
        }),
        applies_gravity: true,
        max_health: 2,
        hitbox: HitboxShape::new(Vec2::new(2.0, 0.0), Vec2::new(12.0, 24.0)),
        death_duration: Some(0.9),
    }
}

fn caster() -> AiProfile {
    AiProfile {
        behavior: BehaviorKind::Floating,
        speed: 30.0,
        chase_speed: 50.0,
        patrol_distance: 72.0,
        aggro_range: 260.0,
        chase_range_multiplier: 1.4,
        maintain_band: DistanceBand { min: 0.7, max: 0.8 },
        attack: AttackProfile { damage: 2, range: 160.0, windup: 0.7, active: 0.4, cooldown: 2.2 },
        projectile: Some(ProjectileProfile {
            speed: 160.0,
            ttl: Some(4.0),
            size: Vec2::new(8.0, 8.0),
            muzzle_offset: Vec2::new(8.0, 2.0),
            spread_radius: 40.0,
            variance: 0.2,
        }),
        applies_gravity: false,
        max_health: 3,
        hitbox: HitboxShape::new(Vec2::ZERO, Vec2::new(16.0, 16.0)),
        death_duration: Some(1.0),
    }
}
