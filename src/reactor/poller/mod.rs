//! Platform wait primitives.
//!
//! A [`Poller`] owns a registration set holding exactly one entry: the
//! readable end of the wake channel. It is registered in [`Poller::open`] and
//! never touched again. [`Poller::wait`] is a single raw wait; interruption is
//! reported as-is and retried one level up in the
//! [`Multiplexor`](super::multiplexor::Multiplexor).
//!
//! - [`EpollPoller`] on Linux and Android
//! - [`KqueuePoller`] on Apple platforms and the BSDs
//! - [`PollPoller`] everywhere, used as the fallback on other Unix targets

#[cfg(any(target_os = "linux", target_os = "android"))]
mod epoll;
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
mod kqueue;
mod poll;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use epoll::EpollPoller;
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
pub use kqueue::KqueuePoller;
pub use poll::PollPoller;

use std::io;
use std::os::fd::RawFd;

/// The poller selected for the current target.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub type SysPoller = EpollPoller;

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
pub type SysPoller = KqueuePoller;

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
)))]
pub type SysPoller = PollPoller;

/// A single-registration readiness waiter.
pub trait Poller: Sized {
    /// Creates the wait object and registers `wake_fd` for read readiness.
    fn open(wake_fd: RawFd) -> io::Result<Self>;

    /// Blocks for at most `timeout_ms` milliseconds.
    ///
    /// Returns the number of ready registrations (0 on timeout). A negative
    /// timeout blocks indefinitely; the multiplexor never passes one.
    /// `EINTR` is returned as an error of kind [`io::ErrorKind::Interrupted`].
    fn wait(&mut self, timeout_ms: i32) -> io::Result<usize>;
}

/// Converts a libc return value into an `io::Result`.
pub(crate) fn cvt(res: libc::c_int) -> io::Result<libc::c_int> {
    if res < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(res)
    }
}
