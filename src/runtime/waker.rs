//! Cross-thread wake handle.
//!
//! A [`BridgeWaker`] is what producer threads hold. Waking it arms the bridge's
//! wake channel so the host's next `poll_once` returns promptly instead of
//! sleeping until the inner loop's next timer.

use crate::reactor::wake::WakeChannel;

use std::sync::Arc;
use std::task::{Wake, Waker};

/// Cloneable, `Send + Sync` handle that requests a bridge wake.
///
/// The handle keeps the wake channel's descriptor alive, so waking after the
/// bridge has shut down is a no-op rather than a write to a closed or reused
/// descriptor.
#[derive(Clone)]
pub struct BridgeWaker {
    channel: Arc<WakeChannel>,
}

impl BridgeWaker {
    pub(crate) fn new(channel: Arc<WakeChannel>) -> Self {
        Self { channel }
    }

    /// Requests that the bridge be serviced soon. Never blocks.
    pub fn wake(&self) {
        self.channel.signal();
    }

    /// Whether the bridge this handle belongs to has shut down.
    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// Converts the handle into a [`std::task::Waker`], so futures polled by
    /// the inner loop can schedule it from any thread.
    pub fn into_task_waker(self) -> Waker {
        Waker::from(Arc::new(self))
    }
}

impl Wake for BridgeWaker {
    fn wake(self: Arc<Self>) {
        self.channel.signal();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.channel.signal();
    }
}

impl std::fmt::Debug for BridgeWaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeWaker")
            .field("closed", &self.is_closed())
            .finish()
    }
}
