//! A small timer-and-callback loop that can be driven by a [`LoopBridge`].
//!
//! [`TimerLoop`] keeps a list of deadlines with callbacks, plus a queue of jobs
//! posted from other threads. Each tick runs the posted jobs and fires every
//! timer whose deadline has passed. It never blocks; waiting is the bridge's
//! job.
//!
//! # Example
//! ```ignore
//! use loop_bridge::{LoopBridge, TimerLoop};
//! use std::time::Duration;
//!
//! let mut bridge = LoopBridge::new(TimerLoop::new())?;
//! bridge.inner_mut().add_timer(Duration::from_millis(10), || println!("tick"));
//!
//! let poster = bridge.inner().poster(bridge.waker());
//! std::thread::spawn(move || poster.post(|| println!("from a worker")));
//!
//! loop {
//!     bridge.poll_once();
//! }
//! ```
//!
//! [`LoopBridge`]: crate::LoopBridge

use crate::reactor::multiplexor::millis_until;
use crate::runtime::{BridgeWaker, InnerLoop, PostQueue, Poster};

use log::trace;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identifies a timer registered on a [`TimerLoop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

enum Callback {
    Once(Box<dyn FnOnce()>),
    Repeat(Duration, Box<dyn FnMut()>),
}

struct Timer {
    id: TimerId,
    deadline: Instant,
    callback: Callback,
}

/// Single-threaded loop of timers and posted jobs.
pub struct TimerLoop {
    timers: Vec<Timer>,
    next_id: u64,
    posts: Arc<PostQueue>,
    ticks: u64,
}

impl Default for TimerLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerLoop {
    /// Creates a loop with no timers and an empty post queue.
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
            posts: Arc::new(PostQueue::new()),
            ticks: 0,
        }
    }

    /// Runs `callback` once, on the first tick at or after `delay` from now.
    pub fn add_timer<F>(&mut self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        self.insert(delay, Callback::Once(Box::new(callback)))
    }

    /// Runs `callback` every `period`, starting one period from now.
    ///
    /// A zero period is bumped to one millisecond so a single tick cannot spin.
    pub fn add_repeating<F>(&mut self, period: Duration, callback: F) -> TimerId
    where
        F: FnMut() + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        self.insert(period, Callback::Repeat(period, Box::new(callback)))
    }

    /// Removes a timer. Returns `false` if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);

        self.timers.len() != before
    }

    /// Handle for posting jobs to this loop from other threads.
    ///
    /// `waker` should belong to the bridge driving this loop, so that a post
    /// wakes it.
    pub fn poster(&self, waker: BridgeWaker) -> Poster {
        Poster::new(self.posts.clone(), waker)
    }

    /// Timers still waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn insert(&mut self, delay: Duration, callback: Callback) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        self.timers.push(Timer {
            id,
            deadline: Instant::now() + delay,
            callback,
        });

        id
    }

    fn run_posted(&mut self) {
        for job in self.posts.take_all() {
            job();
        }
    }

    fn fire_expired(&mut self) {
        let now = Instant::now();

        let (mut due, pending): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|timer| timer.deadline <= now);
        self.timers = pending;

        due.sort_by_key(|timer| (timer.deadline, timer.id.0));

        for timer in due {
            match timer.callback {
                Callback::Once(callback) => callback(),
                Callback::Repeat(period, mut callback) => {
                    callback();

                    // Skip missed periods rather than firing a burst.
                    let mut deadline = timer.deadline + period;
                    if deadline <= now {
                        deadline = now + period;
                    }

                    self.timers.push(Timer {
                        id: timer.id,
                        deadline,
                        callback: Callback::Repeat(period, callback),
                    });
                }
            }
        }
    }
}

impl InnerLoop for TimerLoop {
    fn next_timeout_millis(&self) -> i32 {
        if !self.posts.is_empty() {
            return 0;
        }

        match self.timers.iter().map(|timer| timer.deadline).min() {
            Some(deadline) => millis_until(deadline),
            None => -1,
        }
    }

    fn advance_nonblocking(&mut self) {
        self.ticks += 1;
        self.run_posted();
        self.fire_expired();

        trace!(
            "timer loop tick {} done, {} timers pending",
            self.ticks,
            self.timers.len()
        );
    }
}
