use super::{Poller, cvt};

use libc::{EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLLIN, epoll_create1, epoll_ctl, epoll_event, epoll_wait};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

pub struct EpollPoller {
    epoll: OwnedFd,
    events: [epoll_event; 1],
}

impl Poller for EpollPoller {
    fn open(wake_fd: RawFd) -> io::Result<Self> {
        let epoll = cvt(unsafe { epoll_create1(EPOLL_CLOEXEC) })?;
        let epoll = unsafe { OwnedFd::from_raw_fd(epoll) };

        // Level-triggered: the wake fd stays readable until it is consumed.
        let mut event = epoll_event {
            events: EPOLLIN as u32,
            u64: wake_fd as u64,
        };
        cvt(unsafe { epoll_ctl(epoll.as_raw_fd(), EPOLL_CTL_ADD, wake_fd, &mut event) })?;

        Ok(Self {
            epoll,
            events: [epoll_event { events: 0, u64: 0 }],
        })
    }

    fn wait(&mut self, timeout_ms: i32) -> io::Result<usize> {
        let n = cvt(unsafe {
            epoll_wait(
                self.epoll.as_raw_fd(),
                self.events.as_mut_ptr(),
                self.events.len() as i32,
                timeout_ms,
            )
        })?;

        Ok(n as usize)
    }
}
