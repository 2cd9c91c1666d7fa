use super::{Poller, cvt};

use libc::{POLLIN, poll, pollfd};
use std::io;
use std::os::fd::RawFd;

/// `poll(2)` over a single descriptor. Nothing to create or close.
pub struct PollPoller {
    fds: [pollfd; 1],
}

impl Poller for PollPoller {
    fn open(wake_fd: RawFd) -> io::Result<Self> {
        if wake_fd < 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }

        Ok(Self {
            fds: [pollfd {
                fd: wake_fd,
                events: POLLIN,
                revents: 0,
            }],
        })
    }

    fn wait(&mut self, timeout_ms: i32) -> io::Result<usize> {
        self.fds[0].revents = 0;

        let n = cvt(unsafe { poll(self.fds.as_mut_ptr(), self.fds.len() as _, timeout_ms) })?;

        if n > 0 && self.fds[0].revents & libc::POLLNVAL != 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }

        Ok(n as usize)
    }
}
