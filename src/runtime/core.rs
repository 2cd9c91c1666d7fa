//! Per-tick driver that lets a host's own main loop service an inner loop.
//!
//! The host calls [`LoopBridge::poll_once`] once per iteration of its message
//! loop. Each call waits for the wake channel or the inner loop's next timer,
//! whichever comes first, and then advances the inner loop by exactly one
//! non-blocking tick. Other threads request service through
//! [`LoopBridge::request_wake`] or a [`BridgeWaker`].

use crate::builder::{BridgeBuilder, BridgeConfig};
use crate::error::{BridgeError, Result};
use crate::reactor::multiplexor::{Multiplexor, WaitOutcome};
use crate::reactor::poller::{Poller, SysPoller};
use crate::reactor::wake::WakeChannel;
use crate::runtime::inner::InnerLoop;
use crate::runtime::waker::BridgeWaker;

use log::{debug, error, info, trace, warn};
use std::ops::Deref;
use std::sync::Arc;

// The bridge's own reference to the wake channel. Dropping it closes the
// channel, so wakers and posters stop accepting work however the bridge goes
// away.
struct OwnedWake(Arc<WakeChannel>);

impl Deref for OwnedWake {
    type Target = Arc<WakeChannel>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for OwnedWake {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Counters describing what the bridge has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Completed `poll_once` calls.
    pub polls: u64,
    /// Polls that returned because of a wake request and consumed it.
    pub wakes_consumed: u64,
    /// Polls whose wait ran out without a wake.
    pub timeouts: u64,
    /// Polls whose wait failed and was skipped.
    pub fatal_errors: u64,
    /// Times the multiplexor was reopened after repeated failures.
    pub rebuilds: u64,
}

/// Drives an [`InnerLoop`] from inside a host-owned main loop.
///
/// Only the thread that calls [`poll_once`](Self::poll_once) may block in the
/// bridge. [`request_wake`](Self::request_wake) and [`BridgeWaker::wake`] are
/// safe from any thread and never block.
pub struct LoopBridge<L: InnerLoop, P: Poller = SysPoller> {
    inner: L,
    wake: OwnedWake,
    multiplexor: Multiplexor<P>,
    config: BridgeConfig,
    stats: BridgeStats,
    consecutive_failures: u32,
}

impl<L: InnerLoop> LoopBridge<L> {
    /// Creates a bridge with the default configuration and platform poller.
    pub fn new(inner: L) -> Result<Self> {
        BridgeBuilder::new().build(inner)
    }
}

impl<L: InnerLoop, P: Poller> LoopBridge<L, P> {
    pub(crate) fn with_config(inner: L, config: BridgeConfig) -> Result<Self> {
        let wake = Arc::new(WakeChannel::new()?);
        let multiplexor = Multiplexor::new(&wake)?;

        info!("loop bridge initialised ({config:?})");

        Ok(Self {
            inner,
            wake: OwnedWake(wake),
            multiplexor,
            config,
            stats: BridgeStats::default(),
            consecutive_failures: 0,
        })
    }

    /// Waits for a wake request or the inner loop's next deadline, then runs
    /// one non-blocking tick of the inner loop.
    ///
    /// Never fails and never blocks indefinitely. A failed wait is logged and
    /// the inner loop is advanced anyway.
    pub fn poll_once(&mut self) {
        let timeout = self.compute_timeout();
        trace!("poll_once waiting up to {timeout}ms");

        match self.multiplexor.wait_once(timeout) {
            Ok(WaitOutcome::Woken) => {
                self.consecutive_failures = 0;
                if self.wake.consume() {
                    self.stats.wakes_consumed += 1;
                    debug!("wake request consumed");
                }
            }
            Ok(WaitOutcome::TimedOut) => {
                self.consecutive_failures = 0;
                self.stats.timeouts += 1;
            }
            Err(err) => self.absorb(err),
        }

        self.inner.advance_nonblocking();
        self.stats.polls += 1;
    }

    /// Asks the bridge to be serviced soon. Callable from any thread.
    pub fn request_wake(&self) {
        self.wake.signal();
    }

    /// A handle producer threads can keep to request wakes.
    pub fn waker(&self) -> BridgeWaker {
        BridgeWaker::new(Arc::clone(&self.wake))
    }

    /// Counters accumulated since the bridge was built.
    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// The configuration the bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The inner loop being driven.
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Mutable access to the inner loop, e.g. to add timers between polls.
    pub fn inner_mut(&mut self) -> &mut L {
        &mut self.inner
    }

    /// Tears the bridge down and hands back the inner loop.
    ///
    /// Call this only once the host has stopped calling `poll_once` and
    /// producers have stopped waking. Wakers that still exist afterwards turn
    /// into no-ops; the descriptor is released when the last one is dropped.
    /// Dropping the bridge without calling this closes the channel the same
    /// way.
    pub fn shutdown(self) -> L {
        self.wake.close();

        info!(
            "loop bridge shut down after {} polls ({} wakes, {} timeouts, {} failed waits)",
            self.stats.polls,
            self.stats.wakes_consumed,
            self.stats.timeouts,
            self.stats.fatal_errors
        );

        self.inner
    }

    // A negative deadline means the inner loop has no timer; that still gets a
    // bounded wait so the host thread stays responsive.
    fn compute_timeout(&self) -> i32 {
        let timeout = match self.inner.next_timeout_millis() {
            t if t < 0 => self.config.idle_wait_millis(),
            t => t,
        };

        match self.config.max_wait_millis() {
            Some(max) => timeout.min(max),
            None => timeout,
        }
    }

    fn absorb(&mut self, err: BridgeError) {
        self.stats.fatal_errors += 1;
        self.consecutive_failures += 1;

        error!("{err}, advancing without blocking");

        let limit = self.config.rebuild_after;
        if limit == 0 || self.consecutive_failures < limit {
            return;
        }

        match self.multiplexor.reopen() {
            Ok(fresh) => {
                warn!(
                    "reopening multiplexor after {} consecutive failed waits",
                    self.consecutive_failures
                );
                self.multiplexor = fresh;
                self.stats.rebuilds += 1;
                self.consecutive_failures = 0;
            }
            Err(err) => error!("could not reopen multiplexor: {err}"),
        }
    }
}
