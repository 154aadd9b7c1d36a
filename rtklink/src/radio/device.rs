//! Hardware seam for the radio link.

use std::future::Future;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

/// Identity of the connected link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    /// Device identifier (address or platform id).
    pub id: String,
    /// Advertised device name.
    pub name: String,
}

/// Events emitted by the device once notifications are started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// One notification buffer from the notify characteristic.
    Notification(Bytes),
    /// The device dropped the link.
    Disconnected,
}

/// Errors reported by a [`RadioDevice`].
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Transient: a previous operation has not completed yet.
    #[error("Operation already in progress")]
    InProgress,

    /// The user dismissed device selection.
    #[error("Device selection cancelled")]
    SelectionCancelled,

    #[error("Device not connected")]
    NotConnected,

    #[error("Device I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// A physical link to the rover.
///
/// Implementations only need to perform single operations; sequencing,
/// chunking and retry live in [`RadioTransport`](super::RadioTransport).
pub trait RadioDevice: Send + Sync + 'static {
    /// Select and connect to the device.
    fn connect(&self) -> impl Future<Output = Result<LinkInfo, DeviceError>> + Send;

    /// Subscribe to the notify characteristic.
    fn start_notifications(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<DeviceEvent>, DeviceError>> + Send;

    /// Write one chunk to the write characteristic.
    fn write_chunk(&self, chunk: &[u8]) -> impl Future<Output = Result<(), DeviceError>> + Send;

    fn stop_notifications(&self) -> impl Future<Output = Result<(), DeviceError>> + Send;

    fn disconnect(&self) -> impl Future<Output = Result<(), DeviceError>> + Send;
}
