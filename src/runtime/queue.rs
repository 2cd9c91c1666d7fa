//! Thread-safe queue of work posted to the inner loop from other threads.
//!
//! Provides a FIFO of boxed jobs and the [`Poster`] handle that pushes onto it
//! and wakes the bridge, so a job posted from a background thread runs on the
//! next `poll_once` rather than whenever the host happens to tick.

use crate::runtime::waker::BridgeWaker;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// A thread-safe, FIFO queue of jobs waiting for the loop thread.
#[derive(Default)]
pub(crate) struct PostQueue {
    jobs: Mutex<VecDeque<Job>>,
}

impl PostQueue {
    pub(crate) fn new() -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, job: Job) {
        self.lock().push_back(job);
    }

    /// Takes every queued job, leaving the queue empty.
    ///
    /// Jobs run outside the lock, so a job may post more work; that work waits
    /// for the next tick.
    pub(crate) fn take_all(&self) -> VecDeque<Job> {
        std::mem::take(&mut *self.lock())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    // Jobs never run under the lock, so a poisoned queue is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle for posting work to the loop thread from anywhere.
#[derive(Clone)]
pub struct Poster {
    queue: Arc<PostQueue>,
    waker: BridgeWaker,
}

impl Poster {
    pub(crate) fn new(queue: Arc<PostQueue>, waker: BridgeWaker) -> Self {
        Self { queue, waker }
    }

    /// Queues `job` for the loop thread and wakes the bridge.
    ///
    /// Returns `false`, dropping the job, once the bridge has shut down.
    pub fn post<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.waker.is_closed() {
            return false;
        }

        // Enqueue first: the woken poll must find the job.
        self.queue.push(Box::new(job));
        self.waker.wake();

        true
    }

    /// Jobs posted but not yet run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn take_all_preserves_order_and_empties() {
        let queue = PostQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            queue.push(Box::new(move || order.lock().unwrap().push(i)));
        }

        let jobs = queue.take_all();
        assert!(queue.is_empty());

        for job in jobs {
            job();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn len_counts_queued_jobs() {
        let queue = PostQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        queue.push(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(queue.len(), 1);
        for job in queue.take_all() {
            job();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.len(), 0);
    }
}
