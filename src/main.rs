//! Block Quest headless runner
//!
//! Runs every maze level's reference solution and one scripted program per
//! remaining variant, pumping the sessions with a fixed frame delta the way
//! a presentation loop would.

use std::path::PathBuf;

use block_quest::catalog::{BlockAction, Variant};
use block_quest::progress::ProgressRecord;
use block_quest::session::{GameSession, SessionState};
use block_quest::settings::Settings;
use block_quest::sim::{MAZE_LEVELS, RUINS_SOLUTION};

/// Host frame delta
const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up on a run after this much simulated time
const MAX_SECONDS: f32 = 120.0;

fn play(
    variant: Variant,
    program: &[BlockAction],
    settings: &Settings,
    progress: &mut ProgressRecord,
) -> SessionState {
    let name = variant.name();
    let mut session = match GameSession::new(variant, settings.clone(), &mut *progress) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Could not load {}: {}", name, e);
            return SessionState::Idle;
        }
    };
    for &action in program {
        match session.variant().block_for(action) {
            Some(def) => {
                session.append(def.id);
            }
            None => log::warn!("{} has no {} block", name, action.as_str()),
        }
    }
    if !session.run() {
        return session.state();
    }

    let mut elapsed = 0.0;
    while session.state().is_busy() && elapsed < MAX_SECONDS {
        session.update(FRAME_DT);
        elapsed += FRAME_DT;
    }

    let events = session.drain_events();
    match session.fail_message() {
        Some(message) => log::info!("{}: FAIL after {} events: {}", name, events.len(), message),
        None => log::info!("{}: {:?} after {} events", name, session.state(), events.len()),
    }
    session.state()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Block Quest (headless) starting...");

    let dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let settings_path = dir.join("settings.json");
    let progress_path = dir.join("progress.json");

    let settings = Settings::load(&settings_path);
    let mut progress = ProgressRecord::load(&progress_path);

    for level in &MAZE_LEVELS {
        log::info!("Level {} ({})", level.id, level.name);
        play(
            Variant::maze(level.id),
            &level.solution_actions(),
            &settings,
            &mut progress,
        );
    }

    let ruins: Vec<BlockAction> = RUINS_SOLUTION
        .iter()
        .filter_map(|s| BlockAction::from_str(s))
        .collect();
    play(Variant::Ruins, &ruins, &settings, &mut progress);

    use BlockAction::*;
    play(
        Variant::Miner,
        &[Scan, Step, Collect, Step, Collect, Step, Collect],
        &settings,
        &mut progress,
    );
    play(Variant::Flight, &[Forever, IfEdge, Bounce, Color], &settings, &mut progress);
    play(Variant::Catch, &[IncScore, GoRight], &settings, &mut progress);

    log::info!(
        "Progress: {} coins, {} score, {} wins",
        progress.coins,
        progress.score,
        progress.wins
    );
    if let Err(e) = progress.save(&progress_path) {
        log::warn!("Could not save progress: {}", e);
    }
}
