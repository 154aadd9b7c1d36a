//! Transport error types.

use thiserror::Error;

use super::device::DeviceError;
use super::state::LinkState;

/// Errors surfaced by [`RadioTransport`](super::RadioTransport).
#[derive(Debug, Error)]
pub enum RadioError {
    /// A connect was requested while the link was not disconnected.
    #[error("Radio link is busy ({0})")]
    Busy(LinkState),

    /// Write submitted while the link cannot accept it.
    #[error("Radio link is not connected ({0})")]
    NotConnected(LinkState),

    #[error("Failed to connect radio link: {0}")]
    Connect(#[source] DeviceError),

    #[error("Failed to start notifications: {0}")]
    Notifications(#[source] DeviceError),

    /// The device stayed busy for every allowed attempt on one chunk.
    #[error("Chunk {chunk} still busy after {attempts} attempts")]
    RetriesExhausted { chunk: usize, attempts: u32 },

    /// Any non-transient device failure while writing a chunk.
    #[error("Write failed at chunk {chunk}: {source}")]
    WriteFailed {
        chunk: usize,
        #[source]
        source: DeviceError,
    },

    /// The link went away before the payload was fully sent.
    #[error("Radio link disconnected")]
    Disconnected,

    /// Replaced by a newer payload before it was sent.
    #[error("Payload superseded by a newer write")]
    Superseded,

    /// Dropped from the queue after an earlier payload failed.
    #[error("Payload discarded after a failed write")]
    Cleared,
}

impl RadioError {
    /// Whether this error ends the payload and flushes everything queued behind it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RadioError::RetriesExhausted { .. }
                | RadioError::WriteFailed { .. }
                | RadioError::Disconnected
        )
    }
}
