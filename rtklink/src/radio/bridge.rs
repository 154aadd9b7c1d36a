//! Radio modem reached through a serial-to-TCP bridge.
//!
//! Many rover radios ship with a transparent bridge: the notify
//! characteristic becomes the socket's read side and writes go straight to the
//! air. Socket reads map to [`DeviceEvent::Notification`], EOF to
//! [`DeviceEvent::Disconnected`].

use std::io::ErrorKind;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::device::{DeviceError, DeviceEvent, LinkInfo, RadioDevice};
use super::profile::LinkProfile;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_BUFFER_SIZE: usize = 512;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// [`RadioDevice`] over a TCP socket.
pub struct TcpRadioBridge {
    address: String,
    connect_timeout: Duration,
    profile: LinkProfile,
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    reader: parking_lot::Mutex<Option<OwnedReadHalf>>,
    reader_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl TcpRadioBridge {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            profile: LinkProfile::default(),
            writer: tokio::sync::Mutex::new(None),
            reader: parking_lot::Mutex::new(None),
            reader_task: parking_lot::Mutex::new(None),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Service layout the bridge forwards; reported on connect.
    pub fn with_profile(mut self, profile: LinkProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn profile(&self) -> &LinkProfile {
        &self.profile
    }
}

impl RadioDevice for TcpRadioBridge {
    async fn connect(&self) -> Result<LinkInfo, DeviceError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| {
                DeviceError::Other(format!(
                    "timed out connecting to {} after {}s",
                    self.address,
                    self.connect_timeout.as_secs()
                ))
            })??;
        stream.set_nodelay(true)?;

        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| self.address.clone());
        let (read_half, write_half) = stream.into_split();
        *self.reader.lock() = Some(read_half);
        *self.writer.lock().await = Some(write_half);

        info!(
            address = %peer,
            service = %self.profile.service_uuid(),
            "Radio bridge connected"
        );
        debug!(
            write = %self.profile.write_uuid(),
            notify = %self.profile.notify_uuid(),
            "Radio bridge characteristics"
        );
        Ok(LinkInfo {
            id: peer,
            name: format!("TCP bridge {}", self.address),
        })
    }

    async fn start_notifications(&self) -> Result<mpsc::Receiver<DeviceEvent>, DeviceError> {
        let mut read_half = self.reader.lock().take().ok_or(DeviceError::NotConnected)?;
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            let mut buf = [0u8; READ_BUFFER_SIZE];
            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        let event = DeviceEvent::Notification(Bytes::copy_from_slice(&buf[..n]));
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "Radio bridge read failed");
                        break;
                    }
                }
            }
            let _ = tx.send(DeviceEvent::Disconnected).await;
        });

        if let Some(previous) = self.reader_task.lock().replace(task) {
            previous.abort();
        }
        Ok(rx)
    }

    async fn write_chunk(&self, chunk: &[u8]) -> Result<(), DeviceError> {
        // A concurrent writer holding the socket is the bridge's busy condition
        let Ok(mut guard) = self.writer.try_lock() else {
            return Err(DeviceError::InProgress);
        };
        let writer = guard.as_mut().ok_or(DeviceError::NotConnected)?;

        match writer.write_all(chunk).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(DeviceError::InProgress),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::NotConnected
                ) =>
            {
                Err(DeviceError::NotConnected)
            }
            Err(e) => Err(DeviceError::Io(e)),
        }
    }

    async fn stop_notifications(&self) -> Result<(), DeviceError> {
        if let Some(task) = self.reader_task.lock().take() {
            task.abort();
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.reader.lock().take();
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            writer.shutdown().await?;
        }
        Ok(())
    }
}
