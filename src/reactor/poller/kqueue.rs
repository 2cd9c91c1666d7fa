use super::{Poller, cvt};

use libc::{EV_ADD, EV_ENABLE, EVFILT_READ, FD_CLOEXEC, F_SETFD, fcntl, kevent, kqueue, timespec};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::{mem, ptr};

pub struct KqueuePoller {
    kqueue: OwnedFd,
    events: [kevent; 1],
}

fn empty_event() -> kevent {
    // Field sets differ between the BSDs; zero then fill what we use.
    unsafe { mem::zeroed() }
}

impl Poller for KqueuePoller {
    fn open(wake_fd: RawFd) -> io::Result<Self> {
        let queue = cvt(unsafe { kqueue() })?;
        let queue = unsafe { OwnedFd::from_raw_fd(queue) };
        cvt(unsafe { fcntl(queue.as_raw_fd(), F_SETFD, FD_CLOEXEC) })?;

        // No EV_CLEAR: stays readable until the pipe is drained.
        let mut event = empty_event();
        event.ident = wake_fd as _;
        event.filter = EVFILT_READ as _;
        event.flags = (EV_ADD | EV_ENABLE) as _;

        cvt(unsafe { kevent(queue.as_raw_fd(), &event, 1, ptr::null_mut(), 0, ptr::null()) })?;

        Ok(Self {
            kqueue: queue,
            events: [empty_event()],
        })
    }

    fn wait(&mut self, timeout_ms: i32) -> io::Result<usize> {
        let ts;
        let ts_ptr = if timeout_ms < 0 {
            ptr::null()
        } else {
            ts = timespec {
                tv_sec: (timeout_ms / 1000) as _,
                tv_nsec: ((timeout_ms % 1000) as i64 * 1_000_000) as _,
            };
            &ts as *const timespec
        };

        let n = cvt(unsafe {
            kevent(
                self.kqueue.as_raw_fd(),
                ptr::null(),
                0,
                self.events.as_mut_ptr(),
                self.events.len() as _,
                ts_ptr,
            )
        })?;

        Ok(n as usize)
    }
}
