//! Cross-thread wake channel.
//!
//! A [`WakeChannel`] wraps one kernel notification object that any thread can
//! arm and the bridge thread can poll for readability. On Linux and Android it
//! is an `eventfd`, elsewhere a non-blocking self-pipe. Both coalesce: however
//! many signals arrive before the next [`WakeChannel::consume`], that consume
//! drains them all.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;

use crate::error::{BridgeError, Result};

pub struct WakeChannel {
    read: OwnedFd,
    // `None` when the readable end is also writable (eventfd).
    write: Option<OwnedFd>,
    closed: AtomicBool,
}

impl WakeChannel {
    /// Allocates the notification object.
    ///
    /// Fails with [`BridgeError::ResourceExhausted`] when the process is out of
    /// descriptors.
    pub fn new() -> Result<Self> {
        let (read, write) = sys::open().map_err(|e| BridgeError::creation(sys::NAME, e))?;

        Ok(Self {
            read,
            write,
            closed: AtomicBool::new(false),
        })
    }

    /// Arms the pending-wake condition.
    ///
    /// Safe from any thread and never blocks. Transient write failures are
    /// retried; a full counter or pipe already means a wake is pending. After
    /// [`close`](Self::close) this is a no-op.
    pub fn signal(&self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        sys::notify(self.write_fd());
    }

    /// Clears the pending-wake condition, returning whether one was set.
    ///
    /// Single consumer: only the thread that waits on the channel calls this.
    pub fn consume(&self) -> bool {
        sys::drain(self.read.as_raw_fd())
    }

    /// Stops accepting signals. The descriptor itself is released when the
    /// last owner drops the channel.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn write_fd(&self) -> RawFd {
        self.write
            .as_ref()
            .unwrap_or(&self.read)
            .as_raw_fd()
    }
}

impl AsRawFd for WakeChannel {
    /// The readable end, for registration with a poller.
    fn as_raw_fd(&self) -> RawFd {
        self.read.as_raw_fd()
    }
}

fn last_errno() -> Option<i32> {
    io::Error::last_os_error().raw_os_error()
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod sys {
    use super::*;

    pub(super) const NAME: &str = "eventfd";

    pub(super) fn open() -> io::Result<(OwnedFd, Option<OwnedFd>)> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok((unsafe { OwnedFd::from_raw_fd(fd) }, None))
    }

    pub(super) fn notify(fd: RawFd) {
        let value: u64 = 1;

        loop {
            let res = unsafe {
                libc::write(
                    fd,
                    &value as *const u64 as *const libc::c_void,
                    size_of::<u64>(),
                )
            };
            if res >= 0 {
                return;
            }

            match last_errno() {
                Some(libc::EINTR) => continue,
                // Counter saturated: a wake is already pending.
                Some(libc::EAGAIN) => return,
                _ => {
                    warn!("eventfd write failed: {}", io::Error::last_os_error());
                    return;
                }
            }
        }
    }

    pub(super) fn drain(fd: RawFd) -> bool {
        let mut value: u64 = 0;

        loop {
            let res = unsafe {
                libc::read(
                    fd,
                    &mut value as *mut u64 as *mut libc::c_void,
                    size_of::<u64>(),
                )
            };
            if res >= 0 {
                return value > 0;
            }

            match last_errno() {
                Some(libc::EINTR) => continue,
                Some(libc::EAGAIN) => return false,
                _ => {
                    warn!("eventfd read failed: {}", io::Error::last_os_error());
                    return false;
                }
            }
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
mod sys {
    use super::*;

    pub(super) const NAME: &str = "wake pipe";

    pub(super) fn open() -> io::Result<(OwnedFd, Option<OwnedFd>)> {
        let mut fds = [0; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
            return Err(io::Error::last_os_error());
        }

        let read = unsafe { OwnedFd::from_raw_fd(fds[0]) };
        let write = unsafe { OwnedFd::from_raw_fd(fds[1]) };

        for fd in [read.as_raw_fd(), write.as_raw_fd()] {
            set_flags(fd)?;
        }

        Ok((read, Some(write)))
    }

    fn set_flags(fd: RawFd) -> io::Result<()> {
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFL);
            if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
                return Err(io::Error::last_os_error());
            }
            if libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) < 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    pub(super) fn notify(fd: RawFd) {
        let byte = 1u8;

        loop {
            let res = unsafe { libc::write(fd, &byte as *const u8 as *const libc::c_void, 1) };
            if res >= 0 {
                return;
            }

            match last_errno() {
                Some(libc::EINTR) => continue,
                // Pipe full: plenty of wakes already pending.
                Some(libc::EAGAIN) => return,
                _ => {
                    warn!("wake pipe write failed: {}", io::Error::last_os_error());
                    return;
                }
            }
        }
    }

    pub(super) fn drain(fd: RawFd) -> bool {
        let mut buf = [0u8; 64];
        let mut drained = false;

        loop {
            let res = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
            if res > 0 {
                drained = true;
                continue;
            }
            if res == 0 {
                return drained;
            }

            match last_errno() {
                Some(libc::EINTR) => continue,
                Some(libc::EAGAIN) => return drained,
                _ => {
                    warn!("wake pipe read failed: {}", io::Error::last_os_error());
                    return drained;
                }
            }
        }
    }
}
