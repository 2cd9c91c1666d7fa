//! Bridge subsystem modules.

mod core;
pub(crate) mod inner;
pub(crate) mod queue;
pub(crate) mod waker;

pub use self::core::{BridgeStats, LoopBridge};
pub use inner::InnerLoop;
pub use queue::Poster;
pub(crate) use queue::PostQueue;
pub use waker::BridgeWaker;
