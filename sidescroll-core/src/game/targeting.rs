//! Targeting
//!
//! Melee hit-checks and ranged aim solutions. Both player strikes and enemy
//! attacks go through `melee_hit_check`; ranged enemies use `aim` and
//! `ProjectileSpawn` to hand a new projectile to the end-of-tick commit.

use serde::{Serialize, Deserialize};

use crate::core::rng::RandomSource;
use crate::core::vec2::Vec2;
use crate::game::behavior::facing_sign;
use crate::game::health::{Damageable, DamageOutcome};
use crate::game::profile::ProjectileProfile;
use crate::game::state::EntityId;

/// Apply one melee hit if the target is reachable.
///
/// The check passes when the target is alive, not invincible, within
/// `range` (centre to centre) and not behind the attacker. Returns `None`
/// when the check fails, otherwise the outcome of the single `take_damage`
/// call.
pub fn melee_hit_check(
    origin: Vec2,
    facing_right: bool,
    range: f32,
    damage: i32,
    target: &mut dyn Damageable,
) -> Option<DamageOutcome> {
    if !target.is_alive() || target.is_invincible() {
        return None;
    }

    let target_box = target.hitbox();
    let center = target_box.center();
    if origin.distance(center) > range {
        return None;
    }

    // Overlapping targets count as in front
    let forward = (center.x - origin.x) * facing_sign(facing_right);
    if forward < -target_box.w * 0.5 {
        return None;
    }

    Some(target.take_damage(damage, origin))
}

/// Where a ranged attack is aimed and how the projectile will fly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimSolution {
    /// Perturbed point the shot is aimed at
    pub aim_point: Vec2,
    /// Unit direction from the muzzle
    pub direction: Vec2,
    /// Launch velocity
    pub velocity: Vec2,
}

/// Muzzle position for a body centred at `center`.
pub fn muzzle_position(center: Vec2, facing_right: bool, profile: &ProjectileProfile) -> Vec2 {
    Vec2::new(
        center.x + profile.muzzle_offset.x * facing_sign(facing_right),
        center.y + profile.muzzle_offset.y,
    )
}

/// Aim from `muzzle` at `target_center` with bounded random spread.
///
/// Each axis of the aim point is perturbed uniformly within
/// `spread_radius * variance`. A degenerate direction (target on the
/// muzzle) falls back to straight ahead.
pub fn aim(
    muzzle: Vec2,
    target_center: Vec2,
    facing_right: bool,
    profile: &ProjectileProfile,
    rng: &mut dyn RandomSource,
) -> AimSolution {
    let bound = profile.variance_bound();
    let jitter = Vec2::new(rng.next_symmetric(bound), rng.next_symmetric(bound));
    let aim_point = target_center + jitter;

    let mut direction = (aim_point - muzzle).normalize();
    if direction == Vec2::ZERO {
        direction = Vec2::new(facing_sign(facing_right), 0.0);
    }

    AimSolution {
        aim_point,
        direction,
        velocity: direction * profile.speed,
    }
}

/// A projectile waiting to be inserted at the end of the tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpawn {
    /// Firing actor, never hit by its own shot
    pub owner: EntityId,
    /// Entity the shot is meant for
    pub target: Option<EntityId>,
    /// Bottom-left of the projectile hitbox
    pub position: Vec2,
    /// Launch velocity
    pub velocity: Vec2,
    /// Hitbox size
    pub size: Vec2,
    /// Damage on hit
    pub damage: i32,
    /// Lifetime in seconds
    pub ttl: f32,
}

impl ProjectileSpawn {
    /// Build a spawn centred on `muzzle`.
    pub fn from_aim(
        owner: EntityId,
        target: Option<EntityId>,
        muzzle: Vec2,
        solution: &AimSolution,
        profile: &ProjectileProfile,
        damage: i32,
        default_ttl: f32,
    ) -> Self {
        Self {
            owner,
            target,
            position: muzzle - profile.size * 0.5,
            velocity: solution.velocity,
            size: profile.size,
            damage,
            ttl: profile.ttl.unwrap_or(default_ttl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rect::Rect;
    use crate::core::rng::DeterministicRng;

    struct Dummy {
        hitbox: Rect,
        alive: bool,
        invincible: bool,
        hits: u32,
    }

    impl Dummy {
        fn at(x: f32, y: f32) -> Self {
            Self {
                hitbox: Rect::new(x, y, 10.0, 10.0),
                alive: true,
                invincible: false,
                hits: 0,
            }
        }
    }

    impl Damageable for Dummy {
        fn entity_id(&self) -> EntityId {
            EntityId(9)
        }
        fn hitbox(&self) -> Rect {
            self.hitbox
        }
        fn is_alive(&self) -> bool {
            self.alive
        }
        fn is_invincible(&self) -> bool {
            self.invincible
        }
        fn take_damage(&mut self, _amount: i32, _source: Vec2) -> DamageOutcome {
            self.hits += 1;
            DamageOutcome::Damaged { remaining: 1 }
        }
    }

    /// Always returns the same unit value.
    struct Fixed(f32);

    impl RandomSource for Fixed {
        fn next_unit(&mut self) -> f32 {
            self.0
        }
    }

    fn profile() -> ProjectileProfile {
        ProjectileProfile {
            speed: 200.0,
            ttl: None,
            size: Vec2::new(4.0, 4.0),
            muzzle_offset: Vec2::new(10.0, 2.0),
            spread_radius: 40.0,
            variance: 0.15,
        }
    }

    #[test]
    fn test_melee_hits_in_front_within_range() {
        let mut target = Dummy::at(20.0, -5.0); // centre (25, 0)
        let outcome = melee_hit_check(Vec2::ZERO, true, 30.0, 1, &mut target);
        assert!(outcome.is_some());
        assert_eq!(target.hits, 1);
    }

    #[test]
    fn test_melee_misses_out_of_range_or_behind() {
        let mut far = Dummy::at(40.0, -5.0);
        assert!(melee_hit_check(Vec2::ZERO, true, 30.0, 1, &mut far).is_none());

        let mut behind = Dummy::at(-30.0, -5.0);
        assert!(melee_hit_check(Vec2::ZERO, true, 30.0, 1, &mut behind).is_none());
        assert!(melee_hit_check(Vec2::ZERO, false, 30.0, 1, &mut behind).is_some());
    }

    #[test]
    fn test_melee_respects_liveness_and_invincibility() {
        let mut dead = Dummy::at(5.0, -5.0);
        dead.alive = false;
        assert!(melee_hit_check(Vec2::ZERO, true, 30.0, 1, &mut dead).is_none());

        let mut shielded = Dummy::at(5.0, -5.0);
        shielded.invincible = true;
        assert!(melee_hit_check(Vec2::ZERO, true, 30.0, 1, &mut shielded).is_none());
        assert_eq!(shielded.hits, 0);
    }

    #[test]
    fn test_aim_without_jitter_hits_centre() {
        // next_unit = 0.5 maps to zero offset
        let mut rng = Fixed(0.5);
        let solution = aim(Vec2::ZERO, Vec2::new(150.0, 0.0), true, &profile(), &mut rng);
        assert_eq!(solution.aim_point, Vec2::new(150.0, 0.0));
        assert_eq!(solution.direction, Vec2::new(1.0, 0.0));
        assert_eq!(solution.velocity, Vec2::new(200.0, 0.0));
    }

    #[test]
    fn test_aim_jitter_is_bounded() {
        let p = profile();
        let bound = p.variance_bound();
        let mut rng = DeterministicRng::new(42);
        let target = Vec2::new(150.0, 30.0);

        for _ in 0..500 {
            let solution = aim(Vec2::ZERO, target, true, &p, &mut rng);
            assert!((solution.aim_point.x - target.x).abs() <= bound);
            assert!((solution.aim_point.y - target.y).abs() <= bound);
            assert!((solution.velocity.length() - p.speed).abs() < 1e-2);
        }
    }

    #[test]
    fn test_degenerate_aim_falls_back_to_facing() {
        let mut rng = Fixed(0.5);
        let solution = aim(Vec2::new(3.0, 3.0), Vec2::new(3.0, 3.0), false, &profile(), &mut rng);
        assert_eq!(solution.direction, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_spawn_centred_on_muzzle() {
        let p = profile();
        let muzzle = muzzle_position(Vec2::new(100.0, 50.0), false, &p);
        assert_eq!(muzzle, Vec2::new(90.0, 52.0));

        let solution = aim(muzzle, Vec2::ZERO, false, &p, &mut Fixed(0.5));
        let spawn = ProjectileSpawn::from_aim(EntityId(2), Some(EntityId::PLAYER), muzzle, &solution, &p, 1, 5.0);
        assert_eq!(spawn.position, Vec2::new(88.0, 50.0));
        assert_eq!(spawn.ttl, 5.0);
    }
}
