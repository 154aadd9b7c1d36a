//! Scriptable in-memory device for transport tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::device::{DeviceError, DeviceEvent, LinkInfo, RadioDevice};

#[derive(Default)]
struct Shared {
    written: Mutex<Vec<Vec<u8>>>,
    write_times: Mutex<Vec<Instant>>,
    write_script: Mutex<VecDeque<DeviceError>>,
    write_delay: Mutex<Duration>,
    connect_error: Mutex<Option<DeviceError>>,
    events: Mutex<Option<mpsc::Sender<DeviceEvent>>>,
    disconnects: AtomicUsize,
}

#[derive(Clone, Default)]
pub(crate) struct MockDevice {
    shared: Arc<Shared>,
}

impl MockDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the next write attempt with `error`. Calls queue up.
    pub(crate) fn fail_next(&self, error: DeviceError) {
        self.shared.write_script.lock().push_back(error);
    }

    pub(crate) fn fail_connect(&self, error: DeviceError) {
        *self.shared.connect_error.lock() = Some(error);
    }

    pub(crate) fn set_write_delay(&self, delay: Duration) {
        *self.shared.write_delay.lock() = delay;
    }

    /// Chunks that were accepted, in order.
    pub(crate) fn written(&self) -> Vec<Vec<u8>> {
        self.shared.written.lock().clone()
    }

    /// Time of every write attempt, failed ones included.
    pub(crate) fn write_times(&self) -> Vec<Instant> {
        self.shared.write_times.lock().clone()
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.shared.disconnects.load(Ordering::SeqCst)
    }

    /// Emit an event as if it came from the hardware.
    pub(crate) async fn emit(&self, event: DeviceEvent) {
        let sender = self.shared.events.lock().clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}

impl RadioDevice for MockDevice {
    async fn connect(&self) -> Result<LinkInfo, DeviceError> {
        if let Some(error) = self.shared.connect_error.lock().take() {
            return Err(error);
        }
        Ok(LinkInfo {
            id: "mock-0".to_string(),
            name: "Mock Rover".to_string(),
        })
    }

    async fn start_notifications(&self) -> Result<mpsc::Receiver<DeviceEvent>, DeviceError> {
        let (tx, rx) = mpsc::channel(16);
        *self.shared.events.lock() = Some(tx);
        Ok(rx)
    }

    async fn write_chunk(&self, chunk: &[u8]) -> Result<(), DeviceError> {
        self.shared.write_times.lock().push(Instant::now());
        let scripted = self.shared.write_script.lock().pop_front();
        if let Some(error) = scripted {
            return Err(error);
        }
        let delay = *self.shared.write_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.shared.written.lock().push(chunk.to_vec());
        Ok(())
    }

    async fn stop_notifications(&self) -> Result<(), DeviceError> {
        self.shared.events.lock().take();
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.shared.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
