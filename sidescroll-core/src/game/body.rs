//! Kinematic Body
//!
//! Velocity-driven body with axis-separated collision resolution against the
//! world probe. This is the only integrator in the crate: player, enemies and
//! (through the same probe) projectiles all move by these rules.
//!
//! ## Integration order
//!
//! ```text
//! 1. grounded but nothing underneath  -> airborne
//! 2. gravity (if enabled and airborne), clamped at terminal velocity
//! 3. Y step:  blocked falling  -> snap onto surface, grounded, vy = 0
//!             blocked rising   -> vy = 0
//!             free             -> commit, airborne
//! ```
//!
//! Horizontal motion is a separate call (`move_horizontal`) so callers can
//! react to walls (patrol flips, charge stops).

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::config::PhysicsConfig;
use crate::game::world::CollisionProbe;

/// Hitbox offset and size relative to a body's position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitboxShape {
    /// Offset of the hitbox's bottom-left corner from the body position
    pub offset: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl HitboxShape {
    /// Create a shape.
    pub const fn new(offset: Vec2, size: Vec2) -> Self {
        Self { offset, size }
    }

    /// Hitbox for a body standing at `position`.
    #[inline]
    pub fn at(&self, position: Vec2) -> Rect {
        Rect::new(
            position.x + self.offset.x,
            position.y + self.offset.y,
            self.size.x,
            self.size.y,
        )
    }
}

/// What happened during a vertical step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Falling motion was stopped by a surface this step
    pub landed: bool,
    /// Rising motion was stopped by a ceiling this step
    pub hit_ceiling: bool,
}

/// Position/velocity state of one actor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KinematicBody {
    /// Body position (hitbox origin before offset)
    pub position: Vec2,
    /// Velocity in units per second
    pub velocity: Vec2,
    /// Standing on a surface. Implies `velocity.y == 0` after `integrate`.
    pub grounded: bool,
    /// Floating bodies disable gravity
    pub applies_gravity: bool,
    /// Hitbox relative to `position`
    pub shape: HitboxShape,
    /// Most recent position whose hitbox was collision-free
    last_safe_position: Vec2,
}

impl KinematicBody {
    /// Create a body at rest.
    pub fn new(position: Vec2, shape: HitboxShape, applies_gravity: bool) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            grounded: false,
            applies_gravity,
            shape,
            last_safe_position: position,
        }
    }

    /// Current hitbox. Derived on demand, never stored.
    #[inline]
    pub fn hitbox(&self) -> Rect {
        self.shape.at(self.position)
    }

    /// Hitbox if the body stood at `position`.
    #[inline]
    pub fn hitbox_at(&self, position: Vec2) -> Rect {
        self.shape.at(position)
    }

    /// Centre of the hitbox.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.hitbox().center()
    }

    /// Last position known to be free of world geometry.
    pub fn last_safe_position(&self) -> Vec2 {
        self.last_safe_position
    }

    /// True if the current hitbox overlaps world geometry.
    pub fn is_embedded(&self, world: &dyn CollisionProbe) -> bool {
        world.intersects_solid(&self.hitbox())
    }

    /// True if there is solid ground within the support probe below the feet.
    pub fn is_supported(&self, world: &dyn CollisionProbe, physics: &PhysicsConfig) -> bool {
        let hb = self.hitbox();
        let depth = physics.ground_probe_depth;
        world.intersects_solid(&Rect::new(hb.x, hb.bottom() - depth, hb.w, depth))
    }

    /// Advance vertical motion by `dt`.
    pub fn integrate(
        &mut self,
        dt: f32,
        world: &dyn CollisionProbe,
        physics: &PhysicsConfig,
    ) -> StepReport {
        let mut report = StepReport::default();

        // Rising bodies are never grounded
        if self.velocity.y > 0.0 {
            self.grounded = false;
        }

        // Walked off an edge
        if self.grounded && !self.is_supported(world, physics) {
            self.grounded = false;
        }

        if self.applies_gravity && !self.grounded {
            self.velocity.y = (self.velocity.y + physics.gravity * dt).max(physics.terminal_velocity);
        }

        let dy = self.velocity.y * dt;
        if dy != 0.0 {
            let candidate = Vec2::new(self.position.x, self.position.y + dy);
            if world.intersects_solid(&self.hitbox_at(candidate)) {
                if self.velocity.y < 0.0 {
                    self.settle_down(-dy, -dy, world, physics.ground_snap_iterations);
                    self.grounded = true;
                    report.landed = true;
                } else {
                    report.hit_ceiling = true;
                }
                self.velocity.y = 0.0;
            } else {
                self.position = candidate;
                self.grounded = false;
            }
        }

        if self.grounded {
            self.velocity.y = 0.0;
        }

        if !self.is_embedded(world) {
            self.last_safe_position = self.position;
        }

        report
    }

    /// Move horizontally by `dx`. Returns true if a wall blocked the move,
    /// in which case the position is unchanged.
    pub fn move_horizontal(&mut self, dx: f32, world: &dyn CollisionProbe) -> bool {
        if dx == 0.0 {
            return false;
        }
        let candidate = Vec2::new(self.position.x + dx, self.position.y);
        if world.intersects_solid(&self.hitbox_at(candidate)) {
            return true;
        }
        self.position = candidate;
        self.last_safe_position = candidate;
        false
    }

    /// Probe ahead of and below the leading edge. Returns true if there is
    /// ground to walk onto in the facing direction.
    pub fn verify_ledge(
        &self,
        facing_right: bool,
        world: &dyn CollisionProbe,
        physics: &PhysicsConfig,
    ) -> bool {
        let hb = self.hitbox();
        let w = physics.ledge_probe_width;
        let depth = physics.ledge_probe_depth;
        let x = if facing_right { hb.right() } else { hb.left() - w };
        world.intersects_solid(&Rect::new(x, hb.bottom() - depth, w, depth))
    }

    /// Teleport, discarding motion.
    pub fn relocate(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.grounded = false;
        self.last_safe_position = position;
    }

    /// Correct an initial placement: lift the body out of geometry, then drop
    /// it onto the first surface within `max_distance`. Returns true if the
    /// body ends up standing on ground.
    pub fn place_on_ground(
        &mut self,
        max_distance: f32,
        world: &dyn CollisionProbe,
        physics: &PhysicsConfig,
    ) -> bool {
        if self.is_embedded(world) {
            let mut lifted = false;
            let mut climb = 1.0;
            while climb <= max_distance {
                let candidate = Vec2::new(self.position.x, self.position.y + climb);
                if !world.intersects_solid(&self.hitbox_at(candidate)) {
                    self.position = candidate;
                    lifted = true;
                    break;
                }
                climb += 1.0;
            }
            if !lifted {
                return false;
            }
        }

        if !self.settle_down(max_distance, 1.0, world, physics.ground_snap_iterations) {
            return false;
        }
        self.grounded = true;
        self.velocity.y = 0.0;
        self.last_safe_position = self.position;
        true
    }

    /// Step down in increments of `step` until the hitbox would hit something
    /// (at most `max_drop`), then bisect the last free/blocked pair so the
    /// body rests flush on the surface. Returns false if nothing was found.
    fn settle_down(
        &mut self,
        max_drop: f32,
        step: f32,
        world: &dyn CollisionProbe,
        iterations: u32,
    ) -> bool {
        if max_drop <= 0.0 || step <= 0.0 {
            return false;
        }
        let x = self.position.x;
        let lowest = self.position.y - max_drop;
        let mut free = self.position.y;
        let mut blocked = None;

        while free > lowest {
            let next = (free - step).max(lowest);
            if world.intersects_solid(&self.hitbox_at(Vec2::new(x, next))) {
                blocked = Some(next);
                break;
            }
            free = next;
        }

        let Some(mut blocked) = blocked else {
            return false;
        };

        for _ in 0..iterations {
            let mid = 0.5 * (free + blocked);
            if world.intersects_solid(&self.hitbox_at(Vec2::new(x, mid))) {
                blocked = mid;
            } else {
                free = mid;
            }
        }

        self.position.y = free;
        true
    }
}

// =============================================================================
// FALL GUARD
// =============================================================================

/// Recovers a body that dropped below the world's floor bound.
///
/// Fires once per fall: after a recovery it stays disarmed until the body is
/// grounded above the bound again. Gravity-free bodies never ground, so for
/// them being back above the bound is enough.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FallGuard {
    armed: bool,
}

impl Default for FallGuard {
    fn default() -> Self {
        Self { armed: true }
    }
}

impl FallGuard {
    /// Check the body; relocate it to `respawn` if it fell out of the world.
    /// Returns true when a recovery happened this call.
    pub fn check(&mut self, body: &mut KinematicBody, respawn: Vec2, physics: &PhysicsConfig) -> bool {
        if body.position.y < physics.world_floor_y {
            if self.armed {
                body.relocate(respawn);
                self.armed = false;
                return true;
            }
            return false;
        }
        if !self.armed && (body.grounded || !body.applies_gravity) {
            self.armed = true;
        }
        false
    }

    /// True if the next fall will be recovered.
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::TileMap;

    /// Everything below `y` is solid.
    struct FloorAt(f32);

    impl CollisionProbe for FloorAt {
        fn intersects_solid(&self, rect: &Rect) -> bool {
            rect.bottom() < self.0
        }
    }

    /// Nothing is solid.
    struct Void;

    impl CollisionProbe for Void {
        fn intersects_solid(&self, _rect: &Rect) -> bool {
            false
        }
    }

    fn shape() -> HitboxShape {
        HitboxShape::new(Vec2::ZERO, Vec2::new(10.0, 20.0))
    }

    fn physics() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    #[test]
    fn test_gravity_accumulates() {
        let mut body = KinematicBody::new(Vec2::new(0.0, 1000.0), shape(), true);
        let physics = PhysicsConfig {
            gravity: -800.0,
            terminal_velocity: -10_000.0,
            ..physics()
        };

        for _ in 0..5 {
            body.integrate(0.1, &Void, &physics);
        }

        assert!((body.velocity.y + 400.0).abs() < 1e-3, "vy = {}", body.velocity.y);
        assert!(!body.grounded);
    }

    #[test]
    fn test_terminal_velocity_clamp() {
        let mut body = KinematicBody::new(Vec2::new(0.0, 10_000.0), shape(), true);
        let physics = physics();

        for _ in 0..100 {
            body.integrate(0.1, &Void, &physics);
        }

        assert_eq!(body.velocity.y, physics.terminal_velocity);
    }

    #[test]
    fn test_no_gravity_when_disabled() {
        let mut body = KinematicBody::new(Vec2::new(0.0, 100.0), shape(), false);
        body.integrate(0.1, &Void, &physics());
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.position.y, 100.0);
    }

    #[test]
    fn test_landing_snaps_flush_and_grounds() {
        let mut body = KinematicBody::new(Vec2::new(0.0, 3.0), shape(), true);
        body.velocity.y = -100.0;

        let report = body.integrate(0.1, &FloorAt(0.0), &physics());

        assert!(report.landed);
        assert!(body.grounded);
        assert_eq!(body.velocity.y, 0.0);
        assert!(body.position.y >= 0.0 && body.position.y < 0.01, "y = {}", body.position.y);
    }

    #[test]
    fn test_grounded_body_stays_put() {
        let mut body = KinematicBody::new(Vec2::new(0.0, 0.0), shape(), true);
        body.grounded = true;

        for _ in 0..10 {
            body.integrate(1.0 / 60.0, &FloorAt(0.0), &physics());
        }

        assert!(body.grounded);
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.position.y, 0.0);
    }

    #[test]
    fn test_ceiling_stops_rise() {
        struct Ceiling;
        impl CollisionProbe for Ceiling {
            fn intersects_solid(&self, rect: &Rect) -> bool {
                rect.top() > 50.0
            }
        }

        let mut body = KinematicBody::new(Vec2::new(0.0, 28.0), shape(), true);
        body.velocity.y = 300.0;
        let report = body.integrate(0.1, &Ceiling, &physics());

        assert!(report.hit_ceiling);
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.position.y, 28.0);
        assert!(!body.grounded);
    }

    #[test]
    fn test_walks_off_edge() {
        // Platform covers x in [0, 32)
        let map = TileMap::from_rows(&["##....", "##...."], 16.0);
        let mut body = KinematicBody::new(Vec2::new(20.0, 32.0), shape(), true);
        body.grounded = true;
        assert!(body.is_supported(&map, &physics()));

        assert!(!body.move_horizontal(20.0, &map));
        body.integrate(1.0 / 60.0, &map, &physics());

        assert!(!body.grounded);
        assert!(body.velocity.y < 0.0);
    }

    #[test]
    fn test_move_horizontal_blocked_by_wall() {
        let map = TileMap::from_rows(&["....#", "....#", "#####"], 16.0);
        let mut body = KinematicBody::new(Vec2::new(50.0, 16.0), shape(), true);

        // 50 + 10 = 60, wall begins at 64
        assert!(!body.move_horizontal(3.0, &map));
        assert_eq!(body.position.x, 53.0);

        assert!(body.move_horizontal(3.0, &map));
        assert_eq!(body.position.x, 53.0);
    }

    #[test]
    fn test_verify_ledge() {
        // Ground spans x in [0, 48)
        let map = TileMap::from_rows(&["......", "###..."], 16.0);
        let mut body = KinematicBody::new(Vec2::new(20.0, 16.0), shape(), true);
        body.grounded = true;

        assert!(body.verify_ledge(true, &map, &physics()));
        assert!(body.verify_ledge(false, &map, &physics()));

        // Leading edge at 48: nothing ahead
        body.position.x = 38.0;
        assert!(!body.verify_ledge(true, &map, &physics()));
        assert!(body.verify_ledge(false, &map, &physics()));
    }

    #[test]
    fn test_place_on_ground_drops_and_lifts() {
        let mut hovering = KinematicBody::new(Vec2::new(0.0, 20.0), shape(), true);
        assert!(hovering.place_on_ground(64.0, &FloorAt(0.0), &physics()));
        assert!(hovering.grounded);
        assert!(hovering.position.y >= 0.0 && hovering.position.y < 0.01);

        let mut sunk = KinematicBody::new(Vec2::new(0.0, -5.5), shape(), true);
        assert!(sunk.place_on_ground(64.0, &FloorAt(0.0), &physics()));
        assert!(!sunk.is_embedded(&FloorAt(0.0)));
        assert!(sunk.position.y >= 0.0 && sunk.position.y < 0.01);

        let mut too_high = KinematicBody::new(Vec2::new(0.0, 100.0), shape(), true);
        assert!(!too_high.place_on_ground(64.0, &FloorAt(0.0), &physics()));
        assert_eq!(too_high.position.y, 100.0);
    }

    #[test]
    fn test_last_safe_position_tracks_free_positions() {
        let mut body = KinematicBody::new(Vec2::new(0.0, 50.0), shape(), true);
        body.integrate(0.1, &FloorAt(0.0), &physics());
        assert_eq!(body.last_safe_position(), body.position);

        body.move_horizontal(5.0, &FloorAt(0.0));
        assert_eq!(body.last_safe_position().x, 5.0);
    }

    #[test]
    fn test_fall_guard_fires_once_per_fall() {
        let physics = physics();
        let spawn = Vec2::new(10.0, 100.0);
        let mut guard = FallGuard::default();
        let mut body = KinematicBody::new(Vec2::new(0.0, physics.world_floor_y - 1.0), shape(), true);

        assert!(guard.check(&mut body, spawn, &physics));
        assert_eq!(body.position, spawn);
        assert!(!guard.is_armed());

        // Still airborne above the bound: no re-arm, no recovery
        assert!(!guard.check(&mut body, spawn, &physics));

        // Falls again before touching ground: stays disarmed
        body.position.y = physics.world_floor_y - 10.0;
        assert!(!guard.check(&mut body, spawn, &physics));

        // Lands somewhere valid, then a fresh fall is recovered
        body.position.y = 0.0;
        body.grounded = true;
        assert!(!guard.check(&mut body, spawn, &physics));
        assert!(guard.is_armed());
        body.position.y = physics.world_floor_y - 1.0;
        assert!(guard.check(&mut body, spawn, &physics));
    }

    #[test]
    fn test_fall_guard_rearms_gravity_free_body_above_bound() {
        let physics = physics();
        let spawn = Vec2::new(10.0, 100.0);
        let mut guard = FallGuard::default();
        let mut body = KinematicBody::new(Vec2::new(0.0, physics.world_floor_y - 1.0), shape(), false);

        assert!(guard.check(&mut body, spawn, &physics));
        assert!(!body.grounded);

        // Never grounded, but back above the bound
        assert!(!guard.check(&mut body, spawn, &physics));
        assert!(guard.is_armed());

        body.position.y = physics.world_floor_y - 5.0;
        assert!(guard.check(&mut body, spawn, &physics));
        assert_eq!(body.position, spawn);
    }
}
