//! # Throughput Meter
//!
//! Counts presented frames over a fixed window. The per-second rate is
//! what the worker's growth policy sees.

use std::time::{Duration, Instant};

/// Frame rate measured over a sliding window.
#[derive(Clone, Debug)]
pub struct ThroughputMeter {
    window: Duration,
    elapsed: Duration,
    frames_in_window: u32,
    current: u32,
    frames_total: u64,
}

impl ThroughputMeter {
    /// Meter that publishes a new value every `window`.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.max(Duration::from_millis(1)),
            elapsed: Duration::ZERO,
            frames_in_window: 0,
            current: 0,
            frames_total: 0,
        }
    }

    /// Records one frame that took `delta`. Returns the new rate when a
    /// window closes.
    pub fn record_frame(&mut self, delta: Duration) -> Option<u32> {
        self.frames_total += 1;
        self.frames_in_window += 1;
        self.elapsed += delta;
        if self.elapsed < self.window {
            return None;
        }

        let window_ms = self.window.as_millis().max(1);
        let rate = u128::from(self.frames_in_window) * 1000 / window_ms;
        self.current = u32::try_from(rate).unwrap_or(u32::MAX);
        self.frames_in_window = 0;
        self.elapsed = Duration::ZERO;
        Some(self.current)
    }

    /// Rate published by the last closed window.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Frames recorded since creation.
    #[inline]
    #[must_use]
    pub const fn frames_total(&self) -> u64 {
        self.frames_total
    }

    /// Measurement window.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

/// Wall clock for a frame loop.
///
/// Each frame's delta is the real time since the previous frame, so a
/// consumer that falls behind its target rate reports a lower
/// throughput.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    target: Duration,
    last_frame_time: Instant,
}

impl FrameClock {
    /// Clock aiming for frames of `target` length, starting now.
    #[must_use]
    pub fn new(target: Duration) -> Self {
        Self::starting_at(target, Instant::now())
    }

    /// Clock whose first frame is measured from `start`.
    #[must_use]
    pub const fn starting_at(target: Duration, start: Instant) -> Self {
        Self {
            target,
            last_frame_time: start,
        }
    }

    /// Begins a frame and returns the time since the previous one.
    pub fn begin_frame(&mut self) -> Duration {
        self.begin_frame_at(Instant::now())
    }

    /// Begins a frame at `now`.
    pub fn begin_frame_at(&mut self, now: Instant) -> Duration {
        let delta = now.saturating_duration_since(self.last_frame_time);
        self.last_frame_time = now;
        delta
    }

    /// What is left of the target frame length after `now`.
    #[must_use]
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.target
            .saturating_sub(now.saturating_duration_since(self.last_frame_time))
    }

    /// Sleeps out the rest of the current frame.
    pub fn wait_for_next_frame(&self) {
        let remaining = self.remaining_at(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}
