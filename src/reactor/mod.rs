//! Wake and wait primitives.
//!
//! This module provides the blocking half of the bridge:
//! - [`wake`]: the cross-thread wake channel
//! - [`poller`]: per-platform wait primitives (epoll, kqueue, poll)
//! - [`multiplexor`]: interruption-safe single-shot waits over a poller

pub mod multiplexor;
pub mod poller;
pub mod wake;
