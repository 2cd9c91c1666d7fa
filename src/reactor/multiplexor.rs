//! Interruption-safe single-shot wait on the wake channel.

use crate::error::{BridgeError, Result};
use crate::reactor::poller::{Poller, SysPoller};
use crate::reactor::wake::WakeChannel;

use log::trace;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::time::{Duration, Instant};

/// Why [`Multiplexor::wait_once`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The wake channel became readable.
    Woken,
    /// The timeout elapsed with nothing ready.
    TimedOut,
}

/// Blocks the calling thread until the wake channel fires or a timeout
/// elapses.
///
/// The registration set is fixed when the multiplexor is created. Signals
/// that interrupt the underlying wait are retried against the original
/// deadline and never reach the caller.
pub struct Multiplexor<P: Poller = SysPoller> {
    poller: P,
    wake_fd: RawFd,
}

impl<P: Poller> Multiplexor<P> {
    /// Creates the wait object and registers the channel's readable end.
    pub fn new(wake: &WakeChannel) -> Result<Self> {
        let wake_fd = wake.as_raw_fd();
        let poller = P::open(wake_fd).map_err(|e| BridgeError::creation("multiplexor", e))?;

        Ok(Self { poller, wake_fd })
    }

    /// Wraps an already opened poller registered on `wake_fd`.
    ///
    /// The channel behind `wake_fd` must outlive the multiplexor; once that
    /// descriptor is closed it may be reused by an unrelated file.
    pub fn from_poller(poller: P, wake_fd: RawFd) -> Self {
        Self { poller, wake_fd }
    }

    /// Opens a fresh wait object on the same wake descriptor.
    pub(crate) fn reopen(&self) -> Result<Self> {
        let poller =
            P::open(self.wake_fd).map_err(|e| BridgeError::creation("multiplexor", e))?;

        Ok(Self {
            poller,
            wake_fd: self.wake_fd,
        })
    }

    /// Waits once for at most `timeout_ms` milliseconds.
    ///
    /// Negative timeouts are treated as zero: poll and return immediately.
    pub fn wait_once(&mut self, timeout_ms: i32) -> Result<WaitOutcome> {
        let timeout_ms = timeout_ms.max(0);
        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
        let mut remaining = timeout_ms;

        loop {
            match self.poller.wait(remaining) {
                Ok(0) => return Ok(WaitOutcome::TimedOut),
                Ok(_) => return Ok(WaitOutcome::Woken),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    remaining = millis_until(deadline);
                    trace!("wait interrupted, retrying with {remaining}ms left");
                }
                Err(source) => return Err(BridgeError::FatalWait { source }),
            }
        }
    }

    /// The underlying platform poller.
    pub fn poller(&self) -> &P {
        &self.poller
    }
}

/// Milliseconds left until `deadline`, rounded up so a wait never ends early.
pub(crate) fn millis_until(deadline: Instant) -> i32 {
    let left = deadline.saturating_duration_since(Instant::now());
    let millis = left.as_nanos().div_ceil(1_000_000);

    millis.min(i32::MAX as u128) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactor::poller::PollPoller;

    #[test]
    fn pending_signal_returns_immediately() {
        let wake = WakeChannel::new().unwrap();
        let mut mux = Multiplexor::<SysPoller>::new(&wake).unwrap();

        wake.signal();
        let start = Instant::now();
        let outcome = mux.wait_once(5_000).unwrap();

        assert_eq!(outcome, WaitOutcome::Woken);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn negative_timeout_does_not_block() {
        let wake = WakeChannel::new().unwrap();
        let mut mux = Multiplexor::<PollPoller>::new(&wake).unwrap();

        let start = Instant::now();
        assert_eq!(mux.wait_once(-1).unwrap(), WaitOutcome::TimedOut);
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn stays_woken_until_consumed() {
        let wake = WakeChannel::new().unwrap();
        let mut mux = Multiplexor::<SysPoller>::new(&wake).unwrap();

        wake.signal();
        assert_eq!(mux.wait_once(0).unwrap(), WaitOutcome::Woken);
        assert_eq!(mux.wait_once(0).unwrap(), WaitOutcome::Woken);

        assert!(wake.consume());
        assert_eq!(mux.wait_once(0).unwrap(), WaitOutcome::TimedOut);
    }

    #[test]
    fn reopened_multiplexor_sees_same_channel() {
        let wake = WakeChannel::new().unwrap();
        let mux = Multiplexor::<SysPoller>::new(&wake).unwrap();
        let mut fresh = mux.reopen().unwrap();
        drop(mux);

        wake.signal();
        assert_eq!(fresh.wait_once(1_000).unwrap(), WaitOutcome::Woken);
    }

    #[test]
    fn millis_until_rounds_up() {
        let deadline = Instant::now() + Duration::from_micros(1_500_500);
        let millis = millis_until(deadline);
        assert!((1_000..=1_501).contains(&millis));

        assert_eq!(millis_until(Instant::now()), 0);
    }
}
