//! # HEXBATTLE Headless Runner
//!
//! Runs a whole battle without presentation and logs the outcome.
//!
//! ```bash
//! # Default battle, ten turns
//! hexbattle_headless --turns 10
//!
//! # Custom config, verbose
//! RUST_LOG=debug hexbattle_headless --config battle.toml --turns 200 --time-scale 20
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use hexbattle::sim::EngineState;
use hexbattle::{BattleConfig, BattleEvent, BattleResult, BattleSession, FrameClock};

/// Headless battle runner.
#[derive(Debug, Parser)]
#[command(name = "hexbattle_headless", version, about)]
struct Args {
    /// Battle configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many replayed turns.
    #[arg(long, default_value_t = 50)]
    turns: u64,

    /// Target frame length in milliseconds.
    #[arg(long = "frame-ms", default_value_t = 16)]
    frame_ms: u64,

    /// Playback speed, overriding the config file.
    #[arg(long = "time-scale")]
    time_scale: Option<f64>,
}

fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("battle failed: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> BattleResult<()> {
    let mut config = match &args.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    if let Some(time_scale) = args.time_scale {
        config.playback.time_scale = time_scale;
    }
    let mut clock = FrameClock::new(Duration::from_millis(args.frame_ms.max(1)));

    let mut session = BattleSession::new(config, None)?;
    session.start()?;

    let started = Instant::now();
    let mut attacks = 0_u64;
    let mut deaths = 0_u64;
    while session.battlefield().last_turn() < args.turns && session.winner().is_none() {
        let events = session.frame(clock.begin_frame())?;
        for event in &events {
            match event {
                BattleEvent::UnitAttacked { .. } => attacks += 1,
                BattleEvent::UnitDied { .. } => deaths += 1,
                BattleEvent::MapExpanded { new_radius, spawned, .. } => {
                    tracing::info!("map grew to radius {}, {} reinforcements", new_radius, spawned);
                }
                BattleEvent::TurnInfoUpdated { turn, balance } => {
                    tracing::debug!(
                        "turn {}: {} attackers, {} defenders",
                        turn,
                        balance.attackers,
                        balance.defenders
                    );
                }
                _ => {}
            }
        }
        // Nobody is watching, so expansion holds are released at once.
        if session.playback().is_awaiting_acknowledgement() {
            session.playback_mut().acknowledge_expansion();
        }
        if session.engine_state() == EngineState::Stopped && session.playback().backlog() == 0 {
            tracing::warn!("simulation ended before the battle did");
            break;
        }
        clock.wait_for_next_frame();
    }

    let balance = session.balance();
    let report = session.shutdown();
    tracing::info!(
        "replayed {} turns in {:.1}s: {} attacks, {} deaths, attacker share {:.2}",
        session.battlefield().last_turn(),
        started.elapsed().as_secs_f64(),
        attacks,
        deaths,
        balance.attacker_share()
    );
    if let Some(winner) = session.winner() {
        tracing::info!("{} side holds the field", winner);
    }
    if let Some(fault) = report.and_then(|report| report.fault) {
        tracing::error!("simulation fault: {}", fault);
    }
    Ok(())
}
