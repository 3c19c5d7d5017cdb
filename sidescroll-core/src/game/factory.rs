//! Enemy Factory
//!
//! Turns level-authored spawn descriptors into enemies at load time:
//! resolves the archetype, applies a health override, wires the target and
//! corrects the initial placement onto the ground below.
//!
//! Bad descriptors never abort a level. Unknown archetypes are skipped and
//! invalid overrides are ignored; both are logged and reported back.

use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::vec2::Vec2;
use crate::game::body::{HitboxShape, KinematicBody};
use crate::game::config::SimConfig;
use crate::game::enemy::Enemy;
use crate::game::error::ConfigError;
use crate::game::profile::{AiProfile, ArchetypeCatalog};
use crate::game::state::{EntityId, IdAllocator};
use crate::game::world::CollisionProbe;

/// How far below (and above, when embedded) a spawn point the factory looks
/// for ground.
pub const PLACEMENT_REACH: f32 = 64.0;

/// One level-authored spawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnDescriptor {
    /// Archetype id in the catalog
    #[serde(alias = "archetypeId")]
    pub archetype: String,
    /// Spawn position (body origin)
    pub position: Vec2,
    /// Initial facing
    #[serde(default = "default_facing", alias = "facing")]
    pub facing_right: bool,
    /// Replaces the archetype's starting health when positive
    #[serde(default, alias = "healthOverride")]
    pub health_override: Option<i32>,
}

fn default_facing() -> bool {
    true
}

impl SpawnDescriptor {
    /// Descriptor with default facing and no override.
    pub fn new(archetype: impl Into<String>, position: Vec2) -> Self {
        Self {
            archetype: archetype.into(),
            position,
            facing_right: true,
            health_override: None,
        }
    }
}

/// Parse a JSON array of spawn descriptors.
pub fn parse_spawn_list(json: &str) -> Result<Vec<SpawnDescriptor>, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

/// Result of spawning a whole list.
#[derive(Debug, Default)]
pub struct SpawnReport {
    /// Enemies built, in descriptor order
    pub enemies: Vec<Enemy>,
    /// Problems found along the way (skipped descriptors, ignored overrides)
    pub problems: Vec<ConfigError>,
}

/// Builds enemies against one catalog, world and configuration.
pub struct EnemyFactory<'a> {
    catalog: &'a ArchetypeCatalog,
    world: &'a dyn CollisionProbe,
    config: &'a SimConfig,
    target: Option<EntityId>,
}

impl<'a> EnemyFactory<'a> {
    /// Create a factory. Enemies hunt the player unless `with_target` says
    /// otherwise.
    pub fn new(catalog: &'a ArchetypeCatalog, world: &'a dyn CollisionProbe, config: &'a SimConfig) -> Self {
        Self {
            catalog,
            world,
            config,
            target: Some(EntityId::PLAYER),
        }
    }

    /// Target wired into every enemy built.
    pub fn with_target(mut self, target: Option<EntityId>) -> Self {
        self.target = target;
        self
    }

    /// Build one enemy. Unknown archetypes and invalid overrides are errors.
    pub fn spawn(&self, descriptor: &SpawnDescriptor, id: EntityId) -> Result<Enemy, ConfigError> {
        let profile = self.profile_for(descriptor)?;
        let max_health = starting_health(descriptor, profile)?;
        Ok(self.assemble(descriptor, profile, id, max_health))
    }

    /// Build every descriptor, skipping unknown archetypes and ignoring
    /// invalid overrides. Ids are only consumed by enemies actually built.
    pub fn spawn_all(&self, descriptors: &[SpawnDescriptor], ids: &mut IdAllocator) -> SpawnReport {
        let mut report = SpawnReport::default();

        for descriptor in descriptors {
            let profile = match self.profile_for(descriptor) {
                Ok(profile) => profile,
                Err(err) => {
                    warn!(position = %descriptor.position, error = %err, "spawn skipped");
                    report.problems.push(err);
                    continue;
                }
            };

            let max_health = starting_health(descriptor, profile).unwrap_or_else(|err| {
                warn!(error = %err, "health override ignored");
                report.problems.push(err);
                profile.max_health
            });

            let enemy = self.assemble(descriptor, profile, ids.allocate(), max_health);
            report.enemies.push(enemy);
        }

        report
    }

    fn profile_for(&self, descriptor: &SpawnDescriptor) -> Result<&'a AiProfile, ConfigError> {
        self.catalog
            .get(&descriptor.archetype)
            .ok_or_else(|| ConfigError::UnknownArchetype(descriptor.archetype.clone()))
    }

    fn assemble(&self, descriptor: &SpawnDescriptor, profile: &AiProfile, id: EntityId, max_health: i32) -> Enemy {
        let mut profile = profile.clone();
        profile.max_health = max_health;

        let (position, grounded) = self.place(descriptor.position, &profile.hitbox, profile.applies_gravity);

        let mut enemy = Enemy::new(
            id,
            descriptor.archetype.clone(),
            profile,
            position,
            descriptor.facing_right,
            max_health,
            &self.config.combat,
        );
        enemy.body.grounded = grounded;
        enemy.set_target(self.target);

        debug!(id = %id, archetype = %descriptor.archetype, position = %position, "enemy spawned");
        enemy
    }

    /// Lift out of geometry and drop onto the ground within reach. Floating
    /// archetypes keep their authored position.
    fn place(&self, requested: Vec2, shape: &HitboxShape, applies_gravity: bool) -> (Vec2, bool) {
        if !applies_gravity {
            return (requested, false);
        }
        let mut probe = KinematicBody::new(requested, *shape, true);
        if probe.place_on_ground(PLACEMENT_REACH, self.world, &self.config.physics) {
            (probe.position, true)
        } else {
            debug!(position = %requested, "no ground within reach of spawn");
            (requested, false)
        }
    }
}

/// Starting health: the override if present, otherwise the archetype's.
fn starting_health(descriptor: &SpawnDescriptor, profile: &AiProfile) -> Result<i32, ConfigError> {
    match descriptor.health_override {
        Some(value) if value <= 0 => Err(ConfigError::InvalidHealthOverride {
            archetype: descriptor.archetype.clone(),
            value,
        }),
        Some(value) => Ok(value),
        None => Ok(profile.max_health),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::TileMap;

    fn level() -> TileMap {
        // 8 tiles wide, floor on the bottom row
        TileMap::from_rows(&["........", "........", "........", "########"], 16.0)
    }

    #[test]
    fn test_parse_spawn_list() {
        let json = r#"[
            { "archetype": "grunt", "position": { "x": 32.0, "y": 40.0 } },
            { "archetypeId": "archer", "position": { "x": 64.0, "y": 16.0 }, "facing": false, "healthOverride": 7 }
        ]"#;
        let list = parse_spawn_list(json).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].facing_right);
        assert_eq!(list[0].health_override, None);
        assert_eq!(list[1].archetype, "archer");
        assert!(!list[1].facing_right);
        assert_eq!(list[1].health_override, Some(7));
    }

    #[test]
    fn test_spawn_places_on_ground() {
        let map = level();
        let catalog = ArchetypeCatalog::builtin();
        let config = SimConfig::default();
        let factory = EnemyFactory::new(&catalog, &map, &config);

        let enemy = factory.spawn(&SpawnDescriptor::new("grunt", Vec2::new(32.0, 40.0)), EntityId(3)).unwrap();
        assert!(enemy.body.grounded);
        assert!((enemy.body.position.y - 16.0).abs() < 0.01);
        assert_eq!(enemy.target(), Some(EntityId::PLAYER));
        assert_eq!(enemy.spawn_point(), enemy.body.position);

        // Spawned half inside the floor: lifted out
        let sunk = factory.spawn(&SpawnDescriptor::new("grunt", Vec2::new(32.0, 10.0)), EntityId(4)).unwrap();
        assert!(!sunk.body.is_embedded(&map));
        assert!((sunk.body.position.y - 16.0).abs() < 0.01);
    }

    #[test]
    fn test_floating_keeps_position() {
        let map = level();
        let catalog = ArchetypeCatalog::builtin();
        let config = SimConfig::default();
        let factory = EnemyFactory::new(&catalog, &map, &config);

        let caster = factory.spawn(&SpawnDescriptor::new("caster", Vec2::new(40.0, 48.0)), EntityId(3)).unwrap();
        assert_eq!(caster.body.position, Vec2::new(40.0, 48.0));
        assert!(!caster.body.applies_gravity);
    }

    #[test]
    fn test_unknown_archetype_is_error() {
        let map = level();
        let catalog = ArchetypeCatalog::builtin();
        let config = SimConfig::default();
        let factory = EnemyFactory::new(&catalog, &map, &config);

        let err = factory.spawn(&SpawnDescriptor::new("dragon", Vec2::ZERO), EntityId(3)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownArchetype(ref id) if id == "dragon"));
    }

    #[test]
    fn test_spawn_rejects_bad_override_but_spawn_all_falls_back() {
        let map = level();
        let catalog = ArchetypeCatalog::builtin();
        let config = SimConfig::default();
        let factory = EnemyFactory::new(&catalog, &map, &config);

        let mut descriptor = SpawnDescriptor::new("grunt", Vec2::new(16.0, 20.0));
        descriptor.health_override = Some(0);

        let err = factory.spawn(&descriptor, EntityId(3)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHealthOverride { value: 0, .. }));

        let mut ids = IdAllocator::starting_at(1);
        let report = factory.spawn_all(std::slice::from_ref(&descriptor), &mut ids);
        assert_eq!(report.enemies.len(), 1);
        assert_eq!(report.enemies[0].health().max(), catalog.get("grunt").unwrap().max_health);
        assert!(matches!(report.problems[..], [ConfigError::InvalidHealthOverride { value: 0, .. }]));
    }

    #[test]
    fn test_spawn_all_skips_and_reports() {
        let map = level();
        let catalog = ArchetypeCatalog::builtin();
        let config = SimConfig::default();
        let factory = EnemyFactory::new(&catalog, &map, &config);
        let mut ids = IdAllocator::starting_at(1);

        let mut bad_override = SpawnDescriptor::new("archer", Vec2::new(80.0, 20.0));
        bad_override.health_override = Some(-4);
        let mut good_override = SpawnDescriptor::new("grunt", Vec2::new(16.0, 20.0));
        good_override.health_override = Some(9);

        let descriptors = vec![
            good_override,
            SpawnDescriptor::new("dragon", Vec2::new(50.0, 20.0)),
            bad_override,
        ];
        let report = factory.spawn_all(&descriptors, &mut ids);

        assert_eq!(report.enemies.len(), 2);
        assert_eq!(report.problems.len(), 2);
        assert_eq!(report.enemies[0].id, EntityId(1));
        assert_eq!(report.enemies[1].id, EntityId(2));
        assert_eq!(report.enemies[0].health().max(), 9);

        let archer_default = catalog.get("archer").unwrap().max_health;
        assert_eq!(report.enemies[1].health().current(), archer_default);
        assert!(matches!(report.problems[1], ConfigError::InvalidHealthOverride { value: -4, .. }));
    }
}
