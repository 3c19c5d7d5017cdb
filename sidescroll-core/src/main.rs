//! Sidescroll Simulation Demo
//!
//! Builds a small tile level, drives the player with a scripted input
//! stream, then replays the recording and checks the state hashes match.
//!
//! Usage: `sidescroll-sim [config.json]`

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sidescroll::{
    TICK_RATE, VERSION,
    core::vec2::Vec2,
    game::{
        config::SimConfig,
        events::GameEventData,
        factory::parse_spawn_list,
        input::{InputFrame, InputRecording},
        state::{LevelBuilder, LevelState},
        tick::{replay, tick},
        world::TileMap,
    },
};

/// Demo length: 20 seconds.
const DEMO_TICKS: u32 = 20 * TICK_RATE;

const LEVEL_SEED: u64 = 12345;

const LEVEL_ROWS: &[&str] = &[
    "........................................................",
    "........................................................",
    "..........................#######.......................",
    "........................................................",
    "..............####...............................####...",
    "#.....................................................#.",
    "#.....................................................#.",
    "##############################....######################",
];

const SPAWNS: &str = r#"[
    { "archetype": "grunt",  "position": { "x": 160.0, "y": 24.0 } },
    { "archetype": "hound",  "position": { "x": 300.0, "y": 24.0 }, "facing": false },
    { "archetype": "archer", "position": { "x": 620.0, "y": 24.0 }, "facing": false },
    { "archetype": "caster", "position": { "x": 440.0, "y": 96.0 }, "healthOverride": 4 },
    { "archetype": "wyvern", "position": { "x": 700.0, "y": 24.0 } }
]"#;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Sidescroll Core v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
            let config = SimConfig::from_json(&json).with_context(|| format!("parsing config {path}"))?;
            info!("Loaded config from {}", path);
            config
        }
        None => SimConfig::default(),
    };

    demo_level(config)
}

fn build_level(config: &SimConfig) -> Result<LevelState> {
    let spawns = parse_spawn_list(SPAWNS).context("parsing spawn list")?;
    let (level, problems) = LevelBuilder::new(LEVEL_SEED)
        .config(config.clone())
        .world(TileMap::from_rows(LEVEL_ROWS, 16.0))
        .player_spawn(Vec2::new(32.0, 40.0))
        .spawns(spawns)
        .build_with_report()
        .context("building level")?;

    for problem in &problems {
        warn!("Spawn skipped: {}", problem);
    }
    Ok(level)
}

/// Scripted joystick: run right, hop every second, swing every half second,
/// and hold block for a moment every few seconds.
fn scripted_input(t: u32) -> InputFrame {
    let x = if (t / 240) % 3 == 2 { -1.0 } else { 1.0 };
    let mut frame = InputFrame::from_axes(x, 0.0);
    frame.set_flag(InputFrame::FLAG_JUMP, t % 60 < 3);
    frame.set_flag(InputFrame::FLAG_ATTACK, t % 30 == 0);
    frame.set_flag(InputFrame::FLAG_SPECIAL, t % 150 == 75);
    frame.set_flag(InputFrame::FLAG_DEFEND, t % 300 >= 280);
    frame
}

/// Demo function to run and verify the simulation.
fn demo_level(config: SimConfig) -> Result<()> {
    info!("=== Starting Demo Level ===");

    let mut state = build_level(&config)?;
    info!("RNG Seed: {}", state.rng_seed);
    info!("Enemies: {}", state.enemies.len());

    let mut recording = InputRecording::new(LEVEL_SEED);
    let mut total_events = 0;

    info!("Running {} ticks...", DEMO_TICKS);

    for t in 1..=DEMO_TICKS {
        let input = scripted_input(t);
        recording.record(t, input);

        let result = tick(&mut state, &input);
        total_events += result.events.len();

        // Report every 5 seconds
        if t % (5 * TICK_RATE) == 0 {
            info!(
                "Tick {}: player at {} hp {}, {} enemies alive, {} projectiles",
                t,
                state.player.body.position,
                state.player.health().current(),
                state.living_enemy_count(),
                state.projectiles.len()
            );
        }

        // Log important events
        for event in &result.events {
            match &event.data {
                GameEventData::Killed { source, target } => {
                    info!("Tick {}: {} killed {}", t, source, target);
                }
                GameEventData::CornerEscaped { id, outcome } => {
                    info!("Tick {}: {} escaped a corner ({:?})", t, id, outcome);
                }
                GameEventData::FallRecovered { id, position } => {
                    info!("Tick {}: {} recovered from a fall at {}", t, id, position);
                }
                GameEventData::PlayerDefeated => {
                    info!("Tick {}: player defeated", t);
                }
                _ => {}
            }
        }
    }

    // Print final results
    info!("=== Level Results ===");
    let hash = state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Player health: {}", state.player.health().current());
    info!("Enemies remaining: {}", state.enemies.len());
    info!("Total events: {}", total_events);
    info!("Input deltas recorded: {} over {} ticks", recording.delta_count(), recording.end_tick);

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (replayed, replay_events) = replay(build_level(&config)?, &recording);
    let replay_hash = replayed.compute_hash();

    info!("Replay State Hash: {}", hex::encode(replay_hash));
    info!("Replay events: {}", replay_events.len());

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        anyhow::bail!("determinism failure: hashes differ");
    }
}
