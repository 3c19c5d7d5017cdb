//! Behaviour Functions
//!
//! Pure decision and steering functions, selected by `BehaviorKind`. The
//! enemy state machine feeds them a profile and what it can see, and gets
//! back an intent or a desired velocity. Nothing in here touches the world.

use crate::core::vec2::Vec2;
use crate::game::profile::AiProfile;

/// Melee archetypes stop closing in once this close, as a fraction of range.
const MELEE_STOP_FRACTION: f32 = 0.5;

/// What an enemy sees of its target this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Perception {
    /// Target hitbox centre
    pub target_center: Vec2,
    /// Offset from own centre to the target centre
    pub offset: Vec2,
    /// Centre-to-centre distance
    pub distance: f32,
}

impl Perception {
    /// Build from the two hitbox centres.
    pub fn between(own_center: Vec2, target_center: Vec2) -> Self {
        let offset = target_center - own_center;
        Self {
            target_center,
            offset,
            distance: offset.length(),
        }
    }

    /// True if the target is to the right.
    pub fn target_is_right(&self) -> bool {
        self.offset.x >= 0.0
    }
}

/// High-level decision for one tick of a free (not attacking/hurt/dead) enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// No usable target
    Patrol,
    /// Close in on the target
    Chase,
    /// Ranged only: hold the preferred distance band
    MaintainDistance,
    /// Start an attack
    Attack,
}

/// Pick an intent.
///
/// ```text
/// no target / out of aggro        -> Patrol
/// in range and cooldown ready     -> Attack
/// ranged, beyond chase range      -> Chase
/// ranged, within chase range      -> MaintainDistance
/// melee                           -> Chase
/// ```
pub fn select_intent(profile: &AiProfile, perception: Option<&Perception>, cooldown_ready: bool) -> Intent {
    let Some(p) = perception else {
        return Intent::Patrol;
    };
    if p.distance > profile.aggro_range {
        return Intent::Patrol;
    }
    if p.distance <= profile.attack.range && cooldown_ready {
        return Intent::Attack;
    }
    if profile.is_ranged() {
        if p.distance > profile.chase_range() {
            Intent::Chase
        } else {
            Intent::MaintainDistance
        }
    } else {
        Intent::Chase
    }
}

/// Patrol velocity: walk (or drift, for floaters) along the facing direction.
pub fn patrol_velocity(profile: &AiProfile, facing_right: bool) -> Vec2 {
    Vec2::new(facing_sign(facing_right) * profile.speed, 0.0)
}

/// Chase velocity. Ground archetypes move along X only; floaters steer
/// straight at the target.
pub fn chase_velocity(profile: &AiProfile, perception: &Perception) -> Vec2 {
    let stop = if profile.is_ranged() {
        profile.attack.range * profile.maintain_band.max
    } else {
        profile.attack.range * MELEE_STOP_FRACTION
    };

    if profile.behavior.is_floating() {
        if perception.distance <= stop {
            return Vec2::ZERO;
        }
        return perception.offset.normalize() * profile.chase_speed;
    }

    if perception.offset.x.abs() <= stop {
        return Vec2::ZERO;
    }
    Vec2::new(perception.offset.x.signum() * profile.chase_speed, 0.0)
}

/// Keep the target inside `[band.min, band.max] * range`: back off when too
/// close, approach when too far, hold inside the band.
pub fn maintain_velocity(profile: &AiProfile, perception: &Perception) -> Vec2 {
    let near = profile.attack.range * profile.maintain_band.min;
    let far = profile.attack.range * profile.maintain_band.max;

    let toward = if perception.distance < near {
        -1.0
    } else if perception.distance > far {
        1.0
    } else {
        return Vec2::ZERO;
    };

    if profile.behavior.is_floating() {
        return perception.offset.normalize() * (toward * profile.speed);
    }
    let dir = if perception.offset.x == 0.0 { 0.0 } else { perception.offset.x.signum() };
    Vec2::new(dir * toward * profile.speed, 0.0)
}

/// +1 for right, -1 for left.
#[inline]
pub fn facing_sign(facing_right: bool) -> f32 {
    if facing_right {
        1.0
    } else {
        -1.0
    }
}
