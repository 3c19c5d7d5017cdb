//! Authoritative Simulation Tick
//!
//! The frame-stepped level loop. One call advances everything by one fixed
//! step in a fixed order:
//!
//! 1. player physics and state
//! 2. the player's strike, if one lands this tick, against every enemy
//! 3. each enemy in id order (physics, AI, attack)
//! 4. each projectile in id order
//! 5. commit: deferred removals, then deferred spawns

use crate::game::events::{GameEvent, GameEventData};
use crate::game::health::Damageable;
use crate::game::input::{InputFrame, InputRecording};
use crate::game::projectile::ProjectileFate;
use crate::game::state::{LevelState, TickOutbox};
use crate::game::targeting::melee_hit_check;
use crate::game::world::CollisionProbe;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick that was simulated
    pub tick: u32,
    /// Events drained from the level this tick, in processing order
    pub events: Vec<GameEvent>,
    /// The player has been defeated (this tick or earlier)
    pub player_defeated: bool,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `state` - The level state (will be mutated)
/// * `input` - The player's input for this tick
///
/// # Determinism
///
/// Given the same state and input this produces the same result:
/// - Enemies and projectiles iterate in id order (BTreeMap)
/// - The only randomness is `state.rng`
/// - The step is `config.fixed_dt`, never wall-clock time
pub fn tick(state: &mut LevelState, input: &InputFrame) -> TickResult {
    // 0. Advance tick counter
    state.tick += 1;
    let mut outbox = TickOutbox::new(state.tick);

    {
        let LevelState {
            player,
            enemies,
            projectiles,
            rng,
            config,
            world,
            ..
        } = state;
        let world: &dyn CollisionProbe = &**world;
        let dt = config.fixed_dt;

        // 1. Player
        let step = player.update(input, dt, world, config);
        if let Some(outcome) = step.corner {
            outbox.emit(GameEventData::CornerEscaped { id: player.id, outcome });
        }
        if let Some(outcome) = step.fall {
            outbox.emit(GameEventData::FallRecovered { id: player.id, position: player.respawn_point() });
            outbox.record_damage(player.id, player.id, config.physics.fall_damage, outcome);
        }

        // 2. Player strike: one hit-check per enemy
        if let Some(strike) = step.strike {
            for enemy in enemies.values_mut() {
                let target_id = enemy.id;
                if let Some(outcome) =
                    melee_hit_check(strike.origin, strike.facing_right, strike.range, strike.damage, enemy)
                {
                    outbox.record_damage(player.id, target_id, strike.damage, outcome);
                }
            }
        }

        // 3. Enemies. Only the player is resolvable as an enemy target.
        for enemy in enemies.values_mut() {
            let target = match enemy.target() {
                Some(id) if id == player.id => Some(&mut *player as &mut dyn Damageable),
                _ => None,
            };
            enemy.update(dt, world, target, &mut *rng, config, &mut outbox);
        }

        // 4. Projectiles
        for projectile in projectiles.values_mut() {
            let target = match projectile.target {
                Some(id) if id == player.id => Some(&mut *player as &mut dyn Damageable),
                Some(id) => enemies.get_mut(&id).map(|e| e as &mut dyn Damageable),
                None => None,
            };

            let Some(fate) = projectile.update(dt, world, target) else {
                continue;
            };
            outbox.remove(projectile.id, fate.removal_reason());
            if let (ProjectileFate::HitTarget(outcome), Some(target)) = (fate, projectile.target) {
                outbox.record_damage(projectile.owner, target, projectile.damage, outcome);
            }
        }
    }

    // 5. Commit deferred mutations
    state.commit(outbox);
    let events = state.take_events();

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        tick = state.tick,
        enemies = state.enemies.len(),
        projectiles = state.projectiles.len(),
        events = events.len(),
        "tick"
    );

    TickResult {
        tick: state.tick,
        events,
        player_defeated: state.player.is_defeated(),
    }
}

/// Replay a level from recorded inputs.
///
/// `initial_state` must be freshly built with the recording's seed. Every
/// recorded tick is simulated, including ticks after a defeat, so the final
/// hash matches the live run tick for tick.
pub fn replay(initial_state: LevelState, recording: &InputRecording) -> (LevelState, Vec<GameEvent>) {
    let mut state = initial_state;
    let mut all_events = Vec::new();

    for (_, frame) in recording.replay_iter() {
        let result = tick(&mut state, &frame);
        all_events.extend(result.events);
    }

    (state, all_events)
}
