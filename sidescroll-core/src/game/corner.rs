//! Corner Escape
//!
//! A body can end up wedged into geometry on two axes at once (a wall tile
//! and a floor tile meeting at a corner). Normal axis-separated movement
//! cannot get it out, because every candidate position still overlaps.
//!
//! Detection uses four thin probes lying just inside the hitbox edges,
//! trimmed at the corners so a floor tile never registers as a wall:
//!
//! ```text
//!        +----[ top ]----+
//!        |               |
//!      [left]         [right]
//!        |               |
//!        +---[bottom]----+
//! ```
//!
//! Resting flush against a surface does not count. Geometry has to
//! penetrate the hitbox on a horizontal edge and a vertical edge.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::body::KinematicBody;
use crate::game::config::PhysicsConfig;
use crate::game::world::CollisionProbe;

/// Escape directions, tried in this order for each distance.
const ESCAPE_DIRECTIONS: [Vec2; 6] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
];

/// Which hitbox edges are penetrated by world geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeContacts {
    /// Geometry inside the left edge
    pub left: bool,
    /// Geometry inside the right edge
    pub right: bool,
    /// Geometry inside the top edge
    pub top: bool,
    /// Geometry inside the bottom edge
    pub bottom: bool,
}

impl EdgeContacts {
    /// Sample the four edge probes of `hitbox`.
    pub fn sample(hitbox: &Rect, world: &dyn CollisionProbe, depth: f32) -> Self {
        let d = depth.min(hitbox.w * 0.25).min(hitbox.h * 0.25);
        let side_h = hitbox.h - 2.0 * d;
        let span_w = hitbox.w - 2.0 * d;

        Self {
            left: world.intersects_solid(&Rect::new(hitbox.x, hitbox.y + d, d, side_h)),
            right: world.intersects_solid(&Rect::new(hitbox.right() - d, hitbox.y + d, d, side_h)),
            top: world.intersects_solid(&Rect::new(hitbox.x + d, hitbox.top() - d, span_w, d)),
            bottom: world.intersects_solid(&Rect::new(hitbox.x + d, hitbox.y, span_w, d)),
        }
    }

    /// Wall contact on a horizontal edge and surface contact on a vertical edge.
    pub fn is_corner_stuck(&self) -> bool {
        (self.left || self.right) && (self.top || self.bottom)
    }
}

/// How a stuck body was freed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CornerOutcome {
    /// Moved by `offset` to a collision-free spot
    Displaced {
        /// Applied displacement
        offset: Vec2,
    },
    /// No displacement worked: sent back to the last safe position with an
    /// upward impulse
    Reverted {
        /// Position the body was reverted to
        position: Vec2,
    },
}

/// Per-body corner-stuck tracker.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CornerEscape {
    stuck_time: f32,
    fired: bool,
}

impl CornerEscape {
    /// Seconds the current stuck episode has lasted.
    pub fn stuck_time(&self) -> f32 {
        self.stuck_time
    }

    /// Track the stuck condition and run recovery once it has persisted past
    /// the threshold. Recovery runs at most once per episode; the timer and
    /// the once-flag reset as soon as the condition clears.
    pub fn update(
        &mut self,
        dt: f32,
        body: &mut KinematicBody,
        world: &dyn CollisionProbe,
        physics: &PhysicsConfig,
    ) -> Option<CornerOutcome> {
        let contacts = EdgeContacts::sample(&body.hitbox(), world, physics.corner_probe_depth);
        if !contacts.is_corner_stuck() {
            self.stuck_time = 0.0;
            self.fired = false;
            return None;
        }

        self.stuck_time += dt;
        if self.fired || self.stuck_time <= physics.corner_stuck_threshold {
            return None;
        }

        self.fired = true;
        let outcome = recover(body, world, physics);
        debug!(?outcome, stuck_time = self.stuck_time, "corner escape");
        Some(outcome)
    }
}

/// Try each escape displacement, smallest distance first. Bounded by
/// `distances.len() * 6` probe attempts.
fn recover(body: &mut KinematicBody, world: &dyn CollisionProbe, physics: &PhysicsConfig) -> CornerOutcome {
    for &distance in &physics.corner_escape_distances {
        for direction in ESCAPE_DIRECTIONS {
            let offset = direction * distance;
            let candidate = body.position + offset;
            if !world.intersects_solid(&body.hitbox_at(candidate)) {
                body.position = candidate;
                body.velocity.y = 0.0;
                body.grounded = false;
                return CornerOutcome::Displaced { offset };
            }
        }
    }

    let position = body.last_safe_position();
    body.position = position;
    body.velocity.y = physics.corner_escape_impulse;
    body.grounded = false;
    CornerOutcome::Reverted { position }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::body::HitboxShape;
    use crate::game::world::TileMap;

    fn shape() -> HitboxShape {
        HitboxShape::new(Vec2::ZERO, Vec2::new(12.0, 12.0))
    }

    /// Floor along the bottom row and a wall column at x in [32, 48).
    fn corner_map() -> TileMap {
        TileMap::from_rows(&["..#.", "..#.", "####"], 16.0)
    }

    #[test]
    fn test_flush_contact_is_not_stuck() {
        let map = corner_map();
        // Standing on the floor, flush against the wall
        let hb = Rect::new(20.0, 16.0, 12.0, 12.0);
        let contacts = EdgeContacts::sample(&hb, &map, 2.0);
        assert_eq!(contacts, EdgeContacts::default());
        assert!(!contacts.is_corner_stuck());
    }

    #[test]
    fn test_wedged_in_corner_is_stuck() {
        let map = corner_map();
        let hb = Rect::new(23.0, 13.0, 12.0, 12.0);
        let contacts = EdgeContacts::sample(&hb, &map, 2.0);
        assert!(contacts.right);
        assert!(contacts.bottom);
        assert!(contacts.is_corner_stuck());
    }

    #[test]
    fn test_recovery_waits_for_threshold() {
        let map = corner_map();
        let physics = PhysicsConfig::default();
        let mut body = KinematicBody::new(Vec2::new(23.0, 13.0), shape(), true);
        let mut escape = CornerEscape::default();

        // 0.5 s exactly is not "beyond" the threshold
        for _ in 0..4 {
            assert!(escape.update(0.125, &mut body, &map, &physics).is_none());
        }
        let outcome = escape.update(0.125, &mut body, &map, &physics);
        assert!(outcome.is_some());
        assert!(!body.is_embedded(&map));
    }

    #[test]
    fn test_displacement_order_prefers_smallest_free_offset() {
        let map = corner_map();
        let physics = PhysicsConfig::default();
        let mut body = KinematicBody::new(Vec2::new(23.0, 13.0), shape(), true);

        let outcome = recover(&mut body, &map, &physics);

        // Right and left by 4 still overlap (wall / floor), up by 4 also
        // overlaps the wall, so the first free candidate is a larger move.
        match outcome {
            CornerOutcome::Displaced { offset } => {
                assert!(offset.length() > 4.0);
                assert!(!body.is_embedded(&map));
            }
            other => panic!("expected displacement, got {other:?}"),
        }
    }

    #[test]
    fn test_revert_with_impulse_when_nothing_frees() {
        // Solid everywhere except a pocket the body cannot reach
        let map = TileMap::from_rows(&["#####", "#####", "#####", "#####", "#####"], 16.0);
        let physics = PhysicsConfig::default();
        let mut body = KinematicBody::new(Vec2::new(30.0, 30.0), shape(), true);

        let outcome = recover(&mut body, &map, &physics);

        assert_eq!(outcome, CornerOutcome::Reverted { position: Vec2::new(30.0, 30.0) });
        assert_eq!(body.velocity.y, physics.corner_escape_impulse);
        assert!(!body.grounded);
    }

    #[test]
    fn test_fires_once_per_episode_and_resets() {
        let map = TileMap::from_rows(&["#####", "#####", "#####", "#####", "#####"], 16.0);
        let physics = PhysicsConfig::default();
        let mut body = KinematicBody::new(Vec2::new(30.0, 30.0), shape(), true);
        let mut escape = CornerEscape::default();

        let mut fired = 0;
        for _ in 0..30 {
            if escape.update(0.1, &mut body, &map, &physics).is_some() {
                fired += 1;
            }
            body.velocity.y = 0.0;
        }
        assert_eq!(fired, 1);

        // Condition clears: timer resets
        let open = TileMap::new(8, 8, 16.0);
        escape.update(0.1, &mut body, &open, &physics);
        assert_eq!(escape.stuck_time(), 0.0);

        // A fresh episode can fire again
        let mut fired_again = false;
        for _ in 0..10 {
            fired_again |= escape.update(0.1, &mut body, &map, &physics).is_some();
        }
        assert!(fired_again);
    }
}
