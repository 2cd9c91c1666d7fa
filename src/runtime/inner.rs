//! Contract between the bridge and the loop it drives.

use std::cell::RefCell;
use std::rc::Rc;

/// A single-threaded, callback-driven event loop the bridge can drive.
///
/// The bridge never enumerates the loop's own descriptors or timers. It only
/// asks how long it may wait and then lets the loop run one tick.
pub trait InnerLoop {
    /// Milliseconds until the next timer is due. Negative means no timer is
    /// pending; zero means work is ready now.
    fn next_timeout_millis(&self) -> i32;

    /// Runs every ready callback and expired timer once, without waiting on
    /// I/O.
    fn advance_nonblocking(&mut self);
}

impl<L: InnerLoop + ?Sized> InnerLoop for &mut L {
    fn next_timeout_millis(&self) -> i32 {
        (**self).next_timeout_millis()
    }

    fn advance_nonblocking(&mut self) {
        (**self).advance_nonblocking()
    }
}

impl<L: InnerLoop + ?Sized> InnerLoop for Box<L> {
    fn next_timeout_millis(&self) -> i32 {
        (**self).next_timeout_millis()
    }

    fn advance_nonblocking(&mut self) {
        (**self).advance_nonblocking()
    }
}

/// Shared ownership for hosts that keep their own handle to the loop.
impl<L: InnerLoop + ?Sized> InnerLoop for Rc<RefCell<L>> {
    fn next_timeout_millis(&self) -> i32 {
        self.borrow().next_timeout_millis()
    }

    fn advance_nonblocking(&mut self) {
        self.borrow_mut().advance_nonblocking()
    }
}
