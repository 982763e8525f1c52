//! # Command Channel
//!
//! Hands finished turns from the worker to the consumer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   Batch (FIFO)   ┌─────────────┐
//! │   Worker    │─────────────────>│  Consumer   │
//! │ (TurnLoop)  │                  │ (Playback)  │
//! └─────────────┘                  └─────────────┘
//!        ^                                │
//!        └────── throughput (atomic) ─────┘
//! ```
//!
//! The queue is bounded at the backlog threshold. The worker never
//! starts a turn while the backlog is at the threshold, so it never
//! runs more than `threshold` turns ahead of the consumer.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};

use crate::command::Batch;
use crate::error::{SimError, SimResult};

/// Cooperative stop flag, checked between turns.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Last frame rate the consumer reported. Written by the consumer, read
/// by the worker; no lock.
#[derive(Clone, Debug, Default)]
pub struct ThroughputSignal {
    value: Arc<AtomicU32>,
}

impl ThroughputSignal {
    /// Stores a new reading.
    #[inline]
    pub fn report(&self, value: u32) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Latest reading.
    #[inline]
    #[must_use]
    pub fn current(&self) -> u32 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Creates a connected publisher and consumer.
///
/// # Arguments
///
/// * `threshold` - Backlog at which the publisher throttles. Must be at
///   least 1.
#[must_use]
pub fn command_channel(threshold: usize) -> (BatchPublisher, BatchConsumer) {
    let threshold = threshold.max(1);
    let (sender, receiver) = bounded(threshold);
    let throughput = ThroughputSignal::default();
    (
        BatchPublisher {
            sender,
            threshold,
            throughput: throughput.clone(),
        },
        BatchConsumer { receiver, throughput },
    )
}

/// Worker end of the channel.
#[derive(Debug)]
pub struct BatchPublisher {
    sender: Sender<Batch>,
    threshold: usize,
    throughput: ThroughputSignal,
}

impl BatchPublisher {
    /// Enqueues a whole turn.
    ///
    /// Waits in `poll`-sized slices while the queue is full.
    ///
    /// # Errors
    ///
    /// - [`SimError::Cancelled`] if `token` fires while waiting
    /// - [`SimError::ChannelClosed`] if the consumer is gone
    pub fn publish(&self, batch: Batch, poll: Duration, token: &CancellationToken) -> SimResult<()> {
        let mut pending = batch;
        loop {
            match self.sender.send_timeout(pending, poll) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => {
                    if token.is_cancelled() {
                        return Err(SimError::Cancelled);
                    }
                    pending = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => return Err(SimError::ChannelClosed),
            }
        }
    }

    /// Blocks while the backlog is at or above the threshold.
    ///
    /// Returns `false` if `token` fired while waiting.
    pub fn wait_for_capacity(&self, poll: Duration, token: &CancellationToken) -> bool {
        let mut throttled = false;
        while self.sender.len() >= self.threshold {
            if token.is_cancelled() {
                return false;
            }
            if !throttled {
                tracing::debug!("consumer is {} turns behind, throttling", self.sender.len());
                throttled = true;
            }
            thread::sleep(poll);
        }
        !token.is_cancelled()
    }

    /// Queued batches.
    #[inline]
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.sender.len()
    }

    /// Backlog limit.
    #[inline]
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Consumer's last reported throughput.
    #[inline]
    #[must_use]
    pub fn throughput(&self) -> u32 {
        self.throughput.current()
    }
}

/// Consumer end of the channel.
#[derive(Debug)]
pub struct BatchConsumer {
    receiver: Receiver<Batch>,
    throughput: ThroughputSignal,
}

impl BatchConsumer {
    /// Oldest queued turn, without blocking.
    ///
    /// `None` when the queue is empty, including after the worker has
    /// stopped; the consumer treats silence as "no new turns".
    #[inline]
    pub fn try_take_batch(&self) -> Option<Batch> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for the next turn.
    pub fn take_batch_timeout(&self, timeout: Duration) -> Option<Batch> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Publishes the consumer's frame rate for the growth policy.
    #[inline]
    pub fn report_throughput(&self, value: u32) {
        self.throughput.report(value);
    }

    /// Queued batches.
    #[inline]
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.receiver.len()
    }

    /// Handle to the shared throughput value.
    #[must_use]
    pub fn throughput_signal(&self) -> ThroughputSignal {
        self.throughput.clone()
    }
}
