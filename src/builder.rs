//! Fluent builder for LoopBridge construction.

use crate::error::Result;
use crate::reactor::poller::Poller;
use crate::runtime::{InnerLoop, LoopBridge};

use std::time::Duration;

/// Tunables for a [`LoopBridge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    /// How long to wait when the inner loop has no pending timer.
    pub idle_wait: Duration,

    /// Upper bound on any single wait, whatever the inner loop asks for.
    pub max_wait: Option<Duration>,

    /// Consecutive failed waits after which the multiplexor is reopened.
    /// Zero never reopens it.
    pub rebuild_after: u32,
}

impl BridgeConfig {
    pub(crate) fn idle_wait_millis(&self) -> i32 {
        duration_millis(self.idle_wait)
    }

    pub(crate) fn max_wait_millis(&self) -> Option<i32> {
        self.max_wait.map(duration_millis)
    }
}

fn duration_millis(duration: Duration) -> i32 {
    duration.as_millis().min(i32::MAX as u128) as i32
}

/// Builder for constructing [`LoopBridge`] instances.
///
/// # Example
/// ```ignore
/// let bridge = BridgeBuilder::new()
///     .max_wait(Duration::from_millis(16))
///     .build(TimerLoop::new())?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct BridgeBuilder {
    config: BridgeConfig,
}

impl BridgeBuilder {
    /// Starts from the default configuration.
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::default(),
        }
    }

    /// Wait used when the inner loop reports no pending timer. Defaults to
    /// zero: poll the wake channel and return.
    pub fn idle_wait(mut self, wait: Duration) -> Self {
        self.config.idle_wait = wait;
        self
    }

    /// Caps every wait, so the host loop regains control at least this often.
    pub fn max_wait(mut self, wait: Duration) -> Self {
        self.config.max_wait = Some(wait);
        self
    }

    /// Reopens the multiplexor after `failures` consecutive failed waits.
    pub fn rebuild_after(mut self, failures: u32) -> Self {
        self.config.rebuild_after = failures;
        self
    }

    /// Configuration assembled so far.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Builds a bridge on the platform's default poller.
    ///
    /// Fails only if the wake channel or the multiplexor cannot be created.
    pub fn build<L: InnerLoop>(self, inner: L) -> Result<LoopBridge<L>> {
        LoopBridge::with_config(inner, self.config)
    }

    /// Builds a bridge on a caller-chosen poller.
    pub fn build_with_poller<L: InnerLoop, P: Poller>(self, inner: L) -> Result<LoopBridge<L, P>> {
        LoopBridge::with_config(inner, self.config)
    }
}
