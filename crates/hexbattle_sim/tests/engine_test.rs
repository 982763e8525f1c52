//! # Simulation Engine Integration Test
//!
//! Drives the threaded engine end to end: ordering, backpressure,
//! determinism and shutdown.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hexbattle_core::{ArchetypeCatalog, Grid, HexCoordinate, ATTACKER, DEFENDER};
use hexbattle_sim::{
    Batch, BatchConsumer, Command, EngineState, GrowthConfig, NeverGrow, SeededRng,
    SimulationConfig, SimulationEngine,
};

const WAIT: Duration = Duration::from_secs(5);

/// Defenders in the center, attackers on the rim.
fn battlefield() -> Grid {
    let mut grid = Grid::new(4, Arc::new(ArchetypeCatalog::builtin()));
    for hex in HexCoordinate::ORIGIN.range(1) {
        grid.spawn(hex, DEFENDER).unwrap();
    }
    for hex in HexCoordinate::ORIGIN.ring(4) {
        grid.spawn(hex, ATTACKER).unwrap();
    }
    grid
}

/// Unpaced worker whose map stops growing at radius 12.
fn unpaced(seed: u64) -> SimulationConfig {
    SimulationConfig {
        growth: GrowthConfig {
            max_radius: Some(12),
            ..GrowthConfig::default()
        },
        ..SimulationConfig::unpaced(seed)
    }
}

fn take(consumer: &BatchConsumer) -> Batch {
    consumer.take_batch_timeout(WAIT).expect("worker produced no batch in time")
}

/// Polls `condition` until it holds or the wait runs out.
fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

/// Test: Turns arrive in order, each closed by exactly one TurnInfo.
#[test]
fn test_batches_arrive_in_turn_order() {
    let (mut engine, consumer) =
        SimulationEngine::new(&battlefield(), unpaced(11)).unwrap();
    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Running);

    for expected in 1..=25 {
        let batch = take(&consumer);
        assert_eq!(batch.turn(), expected);
        assert!(batch.commands().iter().all(|c| c.turn() == expected));
        assert!(matches!(batch.commands().last(), Some(Command::TurnInfo { .. })));
        let infos = batch
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::TurnInfo { .. }))
            .count();
        assert_eq!(infos, 1);
    }

    let report = engine.shutdown().unwrap();
    assert!(report.fault.is_none());
    assert!(report.turns_published >= 25);
    assert_eq!(engine.state(), EngineState::Stopped);
}

/// Test: A consumer that never drains holds the worker at the threshold.
#[test]
fn test_backlog_never_exceeds_threshold() {
    let config = SimulationConfig {
        backlog_threshold: 3,
        ..unpaced(5)
    };
    let (mut engine, consumer) = SimulationEngine::new(&battlefield(), config).unwrap();
    engine.start().unwrap();

    assert!(eventually(|| consumer.backlog() == 3));
    thread::sleep(Duration::from_millis(50));
    assert_eq!(consumer.backlog(), 3);

    let report = engine.shutdown().unwrap();
    assert_eq!(report.turns_published, 3);
}

/// Test: Draining resumes production where it left off.
#[test]
fn test_draining_resumes_production() {
    let config = SimulationConfig {
        backlog_threshold: 2,
        ..unpaced(5)
    };
    let (mut engine, consumer) = SimulationEngine::new(&battlefield(), config).unwrap();
    engine.start().unwrap();

    assert!(eventually(|| consumer.backlog() == 2));
    assert_eq!(take(&consumer).turn(), 1);
    assert_eq!(take(&consumer).turn(), 2);
    assert_eq!(take(&consumer).turn(), 3);
    engine.shutdown();
}

/// Test: Same seed, same battle.
#[test]
fn test_seeded_runs_are_identical() {
    let run = || {
        let grid = battlefield();
        let (mut engine, consumer) = SimulationEngine::with_parts(
            &grid,
            unpaced(0),
            SeededRng::new(1234),
            NeverGrow,
        )
        .unwrap();
        engine.start().unwrap();
        let batches: Vec<Batch> = (0..15).map(|_| take(&consumer)).collect();
        engine.shutdown();
        batches
    };
    assert_eq!(run(), run());
}

/// Test: A paced worker still stops promptly.
#[test]
fn test_stop_interrupts_pacing() {
    let config = SimulationConfig {
        turn_interval_ms: 60_000,
        backpressure_poll_ms: 5,
        seed: Some(3),
        ..unpaced(3)
    };
    let (mut engine, consumer) = SimulationEngine::new(&battlefield(), config).unwrap();
    engine.start().unwrap();
    assert_eq!(take(&consumer).turn(), 1);

    let started = Instant::now();
    engine.shutdown().unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
}

/// Test: Dropping the consumer ends the worker without a stop request.
#[test]
fn test_worker_exits_when_consumer_drops() {
    let (mut engine, consumer) =
        SimulationEngine::new(&battlefield(), unpaced(9)).unwrap();
    drop(consumer);
    engine.start().unwrap();

    let report = engine.join().unwrap();
    assert_eq!(report.turns_published, 0);
    assert!(report.fault.is_none());
    assert_eq!(engine.state(), EngineState::Stopped);
}

/// Test: The source grid is untouched by the running worker.
#[test]
fn test_source_grid_is_not_shared() {
    let grid = battlefield();
    let before: Vec<_> = grid.active_units().cloned().collect();
    let (mut engine, consumer) =
        SimulationEngine::new(&grid, unpaced(2)).unwrap();
    engine.start().unwrap();
    for _ in 0..5 {
        take(&consumer);
    }
    engine.shutdown();

    let after: Vec<_> = grid.active_units().cloned().collect();
    assert_eq!(before, after);
    assert_eq!(grid.radius(), 4);
}
