//! Event-loop bridge for driving an embedded callback loop from a host's main loop.
//!
//! Hosts such as an Android activity own their main thread and its message
//! loop. This crate lets a single-threaded inner loop (timers plus callbacks)
//! make progress from inside that host loop without owning the thread.
//!
//! # Architecture
//!
//! - **WakeChannel**: eventfd (or self-pipe) any thread can signal; repeated
//!   signals coalesce into one pending wake
//! - **Poller**: per-platform single-descriptor wait (epoll, kqueue, poll)
//! - **Multiplexor**: waits once for the wake channel or a timeout, retrying
//!   interrupted waits
//! - **LoopBridge**: the per-tick driver the host calls via `poll_once`
//! - **BridgeBuilder**: fluent configuration for the bridge
//! - **TimerLoop**: a ready-made inner loop of timers and cross-thread posts

mod builder;
mod error;
mod reactor;
mod runtime;
mod timer;

pub use builder::{BridgeBuilder, BridgeConfig};
pub use error::{BridgeError, Result};
pub use reactor::multiplexor::{Multiplexor, WaitOutcome};
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use reactor::poller::EpollPoller;
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
pub use reactor::poller::KqueuePoller;
pub use reactor::poller::{PollPoller, Poller, SysPoller};
pub use reactor::wake::WakeChannel;
pub use runtime::{BridgeStats, BridgeWaker, InnerLoop, LoopBridge, Poster};
pub use timer::{TimerId, TimerLoop};
