//! # Playback
//!
//! Paces how fast replayed turns reach the player. Called once per
//! presented frame:
//!
//! ```text
//! tick(delta)
//!   ├─ count the frame, report throughput when a window closes
//!   ├─ advance scaled time; below tick_interval -> nothing to do
//!   ├─ holding for an expansion acknowledgement -> nothing to do
//!   └─ take at most one batch, replay it, forward its events
//! ```

use std::time::Duration;

use hexbattle_sim::{BatchConsumer, Command, Turn};

use crate::battlefield::Battlefield;
use crate::config::PlaybackConfig;
use crate::error::{BattleError, BattleResult};
use crate::events::{BattleEvent, EventSender};
use crate::throughput::ThroughputMeter;

/// Counters for the playback side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Frames ticked.
    pub frames: u64,
    /// Playback ticks reached.
    pub ticks: u64,
    /// Ticks on which no batch was waiting.
    pub starved_ticks: u64,
    /// Batches replayed.
    pub batches_applied: u64,
    /// Events produced by replayed batches.
    pub events_emitted: u64,
    /// Last replayed turn.
    pub last_turn: Turn,
}

/// Drains the command channel at the configured cadence.
pub struct Playback {
    config: PlaybackConfig,
    consumer: BatchConsumer,
    meter: ThroughputMeter,
    since_tick: Duration,
    awaiting_ack: bool,
    sink: Option<EventSender>,
    stats: PlaybackStats,
}

impl Playback {
    /// Playback over `consumer`.
    #[must_use]
    pub fn new(consumer: BatchConsumer, config: PlaybackConfig) -> Self {
        let meter = ThroughputMeter::new(config.throughput_window());
        Self {
            config,
            consumer,
            meter,
            since_tick: Duration::ZERO,
            awaiting_ack: false,
            sink: None,
            stats: PlaybackStats::default(),
        }
    }

    /// Also forwards every produced event to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: EventSender) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Advances playback by one frame of `delta` real time.
    ///
    /// Returns the events of the batch replayed on this frame, if any.
    ///
    /// # Errors
    ///
    /// Whatever [`Battlefield::apply`] reports. The batch is consumed
    /// either way.
    pub fn tick(&mut self, delta: Duration, battlefield: &mut Battlefield) -> BattleResult<Vec<BattleEvent>> {
        self.stats.frames += 1;
        if let Some(throughput) = self.meter.record_frame(delta) {
            self.consumer.report_throughput(throughput);
        }

        self.since_tick += delta.mul_f64(self.config.time_scale);
        if self.since_tick < self.config.tick_interval() {
            return Ok(Vec::new());
        }
        self.since_tick = Duration::ZERO;
        self.stats.ticks += 1;
        self.consumer.report_throughput(self.meter.current());

        if self.awaiting_ack {
            tracing::trace!("playback holding for expansion acknowledgement");
            return Ok(Vec::new());
        }
        let Some(batch) = self.consumer.try_take_batch() else {
            self.stats.starved_ticks += 1;
            return Ok(Vec::new());
        };

        let events = battlefield.apply(&batch)?;
        self.stats.batches_applied += 1;
        self.stats.events_emitted += events.len() as u64;
        self.stats.last_turn = batch.turn();
        if self.config.pause_on_expand
            && batch
                .commands()
                .iter()
                .any(|command| matches!(command, Command::MapExpand { .. }))
        {
            tracing::debug!("turn {} expanded the map, holding playback", batch.turn());
            self.awaiting_ack = true;
        }
        self.forward(&events);
        Ok(events)
    }

    /// Sends `events` to the sink, if one is attached.
    pub fn forward(&self, events: &[BattleEvent]) {
        if let Some(sink) = &self.sink {
            for event in events {
                sink.send(event.clone());
            }
        }
    }

    /// Resumes playback held after an expansion.
    pub fn acknowledge_expansion(&mut self) {
        self.awaiting_ack = false;
    }

    /// Whether playback is held after an expansion.
    #[inline]
    #[must_use]
    pub const fn is_awaiting_acknowledgement(&self) -> bool {
        self.awaiting_ack
    }

    /// Changes playback speed. Zero pauses.
    ///
    /// # Errors
    ///
    /// [`BattleError::InvalidConfig`] if `time_scale` is negative or not
    /// finite. The current speed is kept.
    pub fn set_time_scale(&mut self, time_scale: f64) -> BattleResult<()> {
        if !time_scale.is_finite() || time_scale < 0.0 {
            return Err(BattleError::InvalidConfig(format!(
                "time scale must be finite and non-negative, got {time_scale}"
            )));
        }
        self.config.time_scale = time_scale;
        Ok(())
    }

    /// Last published frame rate.
    #[inline]
    #[must_use]
    pub const fn throughput(&self) -> u32 {
        self.meter.current()
    }

    /// Batches waiting to be replayed.
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.consumer.backlog()
    }

    /// Counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &PlaybackStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use hexbattle_core::{ArchetypeCatalog, Grid, HexCoordinate, ATTACKER, DEFENDER};
    use hexbattle_sim::{command_channel, CancellationToken, NeverGrow, ScriptedRolls, ThroughputGrowth, TurnLoop};
    use std::sync::Arc;

    const FRAME: Duration = Duration::from_millis(100);
    const POLL: Duration = Duration::from_millis(1);

    fn config() -> PlaybackConfig {
        PlaybackConfig {
            tick_interval_ms: 300,
            throughput_window_ms: 500,
            ..PlaybackConfig::default()
        }
    }

    fn duel() -> Grid {
        let mut grid = Grid::new(3, Arc::new(ArchetypeCatalog::builtin()));
        grid.spawn(HexCoordinate::axial(-3, 0), ATTACKER).unwrap();
        grid.spawn(HexCoordinate::axial(3, 0), DEFENDER).unwrap();
        grid
    }

    #[test]
    fn test_one_batch_per_tick() {
        let grid = duel();
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![0]), NeverGrow);
        let (publisher, consumer) = command_channel(8);
        let token = CancellationToken::new();
        for _ in 0..3 {
            publisher.publish(turns.run_turn(0).unwrap(), POLL, &token).unwrap();
        }

        let mut field = Battlefield::new(grid);
        let mut playback = Playback::new(consumer, config());
        let mut applied = Vec::new();
        for _ in 0..9 {
            if !playback.tick(FRAME, &mut field).unwrap().is_empty() {
                applied.push(field.last_turn());
            }
        }
        assert_eq!(applied, vec![1, 2, 3]);
        assert_eq!(playback.stats().batches_applied, 3);
        assert_eq!(playback.backlog(), 0);
    }

    #[test]
    fn test_zero_time_scale_pauses() {
        let grid = duel();
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![0]), NeverGrow);
        let (publisher, consumer) = command_channel(8);
        publisher
            .publish(turns.run_turn(0).unwrap(), POLL, &CancellationToken::new())
            .unwrap();

        let mut field = Battlefield::new(grid);
        let mut playback = Playback::new(consumer, config());
        playback.set_time_scale(0.0).unwrap();
        for _ in 0..50 {
            assert!(playback.tick(FRAME, &mut field).unwrap().is_empty());
        }
        assert_eq!(field.last_turn(), 0);

        playback.set_time_scale(3.0).unwrap();
        assert!(!playback.tick(FRAME, &mut field).unwrap().is_empty());
        assert_eq!(field.last_turn(), 1);
    }

    #[test]
    fn test_rejects_unusable_time_scale() {
        let (_publisher, consumer) = command_channel(2);
        let mut field = Battlefield::new(duel());
        let mut playback = Playback::new(consumer, config());
        for bad in [f64::INFINITY, f64::NAN, -1.0] {
            assert!(matches!(
                playback.set_time_scale(bad),
                Err(BattleError::InvalidConfig(_))
            ));
        }
        // The previous speed still drives ticks.
        for _ in 0..3 {
            playback.tick(FRAME, &mut field).unwrap();
        }
        assert_eq!(playback.stats().ticks, 1);
    }

    #[test]
    fn test_throughput_reaches_the_worker() {
        let (publisher, consumer) = command_channel(2);
        let mut field = Battlefield::new(duel());
        let mut playback = Playback::new(consumer, config());
        for _ in 0..5 {
            playback.tick(FRAME, &mut field).unwrap();
        }
        // Five 100ms frames in a 500ms window.
        assert_eq!(playback.throughput(), 10);
        assert_eq!(publisher.throughput(), 10);
        assert_eq!(playback.stats().starved_ticks, 1);
    }

    #[test]
    fn test_pause_on_expand_holds_until_acknowledged() {
        let grid = duel();
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![0]), ThroughputGrowth::default());
        let (publisher, consumer) = command_channel(8);
        let token = CancellationToken::new();
        for _ in 0..2 {
            publisher.publish(turns.run_turn(0).unwrap(), POLL, &token).unwrap();
        }

        let mut field = Battlefield::new(grid);
        let mut playback = Playback::new(
            consumer,
            PlaybackConfig {
                pause_on_expand: true,
                ..config()
            },
        );
        for _ in 0..3 {
            playback.tick(FRAME, &mut field).unwrap();
        }
        assert_eq!(field.last_turn(), 1);
        assert!(playback.is_awaiting_acknowledgement());

        for _ in 0..6 {
            playback.tick(FRAME, &mut field).unwrap();
        }
        assert_eq!(field.last_turn(), 1);

        playback.acknowledge_expansion();
        for _ in 0..3 {
            playback.tick(FRAME, &mut field).unwrap();
        }
        assert_eq!(field.last_turn(), 2);
    }

    #[test]
    fn test_events_forwarded_to_sink() {
        let grid = duel();
        let mut turns = TurnLoop::new(grid.snapshot(), ScriptedRolls::new(vec![0]), NeverGrow);
        let (publisher, consumer) = command_channel(8);
        publisher
            .publish(turns.run_turn(0).unwrap(), POLL, &CancellationToken::new())
            .unwrap();

        let (sink, receiver) = EventBus::create_pair(64);
        let mut field = Battlefield::new(grid);
        let mut playback = Playback::new(consumer, config()).with_sink(sink);
        let mut produced = Vec::new();
        for _ in 0..3 {
            produced.extend(playback.tick(FRAME, &mut field).unwrap());
        }
        assert!(!produced.is_empty());
        assert_eq!(receiver.drain(), produced);
    }
}
