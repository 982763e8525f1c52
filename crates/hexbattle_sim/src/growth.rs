//! # Growth Policies
//!
//! The map grows while the consumer keeps up. The rule is a tuning
//! heuristic, so it lives behind a trait and can be swapped out.

use crate::command::Turn;
use crate::config::GrowthConfig;

/// Decides, after each resolved turn, whether the map grows.
pub trait GrowthPolicy: Send {
    /// Rings to add after `turn`, or `None` to stay put.
    ///
    /// `throughput` is the consumer's last reported frame rate and
    /// `radius` the current map radius.
    fn expansion(&mut self, turn: Turn, throughput: u32, radius: u32) -> Option<u32>;
}

impl<P: GrowthPolicy + ?Sized> GrowthPolicy for Box<P> {
    fn expansion(&mut self, turn: Turn, throughput: u32, radius: u32) -> Option<u32> {
        (**self).expansion(turn, throughput, radius)
    }
}

/// Grows while the consumer is fast, or unconditionally early on.
///
/// Triggers when `throughput > min_throughput` or
/// `turn < bootstrap_turns`, capped by `max_radius`.
#[derive(Clone, Debug, Default)]
pub struct ThroughputGrowth {
    config: GrowthConfig,
}

impl ThroughputGrowth {
    /// Policy with the given thresholds.
    #[must_use]
    pub const fn new(config: GrowthConfig) -> Self {
        Self { config }
    }
}

impl GrowthPolicy for ThroughputGrowth {
    fn expansion(&mut self, turn: Turn, throughput: u32, radius: u32) -> Option<u32> {
        if throughput <= self.config.min_throughput && turn >= self.config.bootstrap_turns {
            return None;
        }
        let increase = match self.config.max_radius {
            Some(max) => self.config.increase.min(max.saturating_sub(radius)),
            None => self.config.increase,
        };
        (increase > 0).then_some(increase)
    }
}

/// The map never grows.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverGrow;

impl GrowthPolicy for NeverGrow {
    fn expansion(&mut self, _turn: Turn, _throughput: u32, _radius: u32) -> Option<u32> {
        None
    }
}
