//! Error types for bridge construction and per-tick waits.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The process ran out of descriptors or kernel memory while creating the
    /// wake channel or the multiplexor.
    #[error("out of kernel resources while creating {what}")]
    ResourceExhausted {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    /// Any other failure while setting up the bridge.
    #[error("failed to set up {what}")]
    Setup {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    /// The wait primitive failed with something other than an interruption.
    ///
    /// Never escapes [`LoopBridge::poll_once`](crate::LoopBridge::poll_once).
    #[error("wait failed: {source}")]
    FatalWait {
        #[source]
        source: io::Error,
    },
}

impl BridgeError {
    /// Classifies a creation-time OS error.
    pub(crate) fn creation(what: &'static str, source: io::Error) -> Self {
        match source.raw_os_error() {
            Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOMEM) => {
                Self::ResourceExhausted { what, source }
            }
            _ => Self::Setup { what, source },
        }
    }

    /// Whether construction failed for lack of descriptors or kernel memory.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_exhaustion_is_classified() {
        let err = BridgeError::creation("eventfd", io::Error::from_raw_os_error(libc::EMFILE));
        assert!(err.is_resource_exhausted());

        let err = BridgeError::creation("eventfd", io::Error::from_raw_os_error(libc::ENFILE));
        assert!(err.is_resource_exhausted());
    }

    #[test]
    fn other_errors_are_setup_failures() {
        let err = BridgeError::creation("epoll", io::Error::from_raw_os_error(libc::EINVAL));
        assert!(matches!(err, BridgeError::Setup { what: "epoll", .. }));
        assert_eq!(err.to_string(), "failed to set up epoll");
    }
}
