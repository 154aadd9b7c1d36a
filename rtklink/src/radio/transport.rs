//! Radio transport: link lifecycle, inbound fan-out and the single writer.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::config::{TransportConfig, WritePolicy};
use super::device::{DeviceError, DeviceEvent, LinkInfo, RadioDevice};
use super::error::RadioError;
use super::outbox::{Outbox, WriteJob};
use super::state::LinkState;
use super::stats::{TransportStats, TransportStatsSnapshot};
use super::writer::Transmission;
use crate::subscription::{SubscriberSet, SubscriptionToken};

/// Floor for the latest-wins ticker; a zero period would never yield.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Result of [`RadioTransport::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(LinkInfo),
    /// The user dismissed device selection. Not an error.
    Cancelled,
}

/// Resolves once the submitted payload was sent or discarded.
#[must_use = "a receipt does nothing unless awaited; drop it to fire and forget"]
pub struct WriteReceipt {
    rx: oneshot::Receiver<Result<(), RadioError>>,
}

impl Future for WriteReceipt {
    type Output = Result<(), RadioError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped reply means the job was torn down with its link
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(Err(RadioError::Disconnected)))
    }
}

/// Tasks and tokens belonging to one connected link.
struct LinkSession {
    generation: u64,
    /// Stops the writer from starting new payloads.
    stop: CancellationToken,
    /// Aborts the in-flight payload and the inbound task.
    abort: CancellationToken,
    writer: Option<JoinHandle<()>>,
    inbound: Option<JoinHandle<()>>,
}

struct Inner<D> {
    device: D,
    config: TransportConfig,
    state: watch::Sender<LinkState>,
    outbox: Mutex<Outbox>,
    wakeup: Notify,
    listeners: SubscriberSet<str>,
    session: Mutex<Option<LinkSession>>,
    link: Mutex<Option<LinkInfo>>,
    transmitting: AtomicBool,
    generation: AtomicU64,
    stats: TransportStats,
}

/// Owner of the single radio link to the rover.
///
/// Cloning is cheap; clones share the same link.
pub struct RadioTransport<D: RadioDevice> {
    inner: Arc<Inner<D>>,
}

impl<D: RadioDevice> Clone for RadioTransport<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: RadioDevice> RadioTransport<D> {
    pub fn new(device: D, config: TransportConfig) -> Self {
        let (state, _) = watch::channel(LinkState::Disconnected);
        let outbox = Outbox::new(config.policy);
        Self {
            inner: Arc::new(Inner {
                device,
                config,
                state,
                outbox: Mutex::new(outbox),
                wakeup: Notify::new(),
                listeners: SubscriberSet::new(),
                session: Mutex::new(None),
                link: Mutex::new(None),
                transmitting: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                stats: TransportStats::default(),
            }),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    pub fn state(&self) -> LinkState {
        *self.inner.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.inner.state.subscribe()
    }

    /// Identity of the connected device.
    pub fn link(&self) -> Option<LinkInfo> {
        self.inner.link.lock().clone()
    }

    /// Payloads waiting to be sent (not counting the one in flight).
    pub fn pending_jobs(&self) -> usize {
        self.inner.outbox.lock().len()
    }

    /// Payload that will be sent next.
    pub fn pending_payload(&self) -> Option<Bytes> {
        self.inner.outbox.lock().peek()
    }

    pub fn is_transmitting(&self) -> bool {
        self.inner.transmitting.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> TransportStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Receive inbound notifications decoded as text.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionToken
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.inner.listeners.unsubscribe(token)
    }

    /// Select and connect the device, then start the inbound and writer tasks.
    ///
    /// Rejected with [`RadioError::Busy`] unless the link is disconnected.
    pub async fn connect(&self) -> Result<ConnectOutcome, RadioError> {
        let inner = &self.inner;

        let mut current = LinkState::Disconnected;
        let claimed = inner.state.send_if_modified(|state| {
            if *state == LinkState::Disconnected {
                *state = LinkState::Connecting;
                true
            } else {
                current = *state;
                false
            }
        });
        if !claimed {
            return Err(RadioError::Busy(current));
        }

        info!(policy = %inner.config.policy, "Connecting radio link");

        let info = match inner.device.connect().await {
            Ok(info) => info,
            Err(DeviceError::SelectionCancelled) => {
                info!("Radio device selection cancelled");
                inner.state.send_replace(LinkState::Disconnected);
                return Ok(ConnectOutcome::Cancelled);
            }
            Err(e) => {
                inner.state.send_replace(LinkState::Disconnected);
                return Err(RadioError::Connect(e));
            }
        };

        let events = match inner.device.start_notifications().await {
            Ok(events) => events,
            Err(e) => {
                if let Err(close) = inner.device.disconnect().await {
                    debug!(error = %close, "Device disconnect after failed start");
                }
                inner.state.send_replace(LinkState::Disconnected);
                return Err(RadioError::Notifications(e));
            }
        };

        let generation = inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let stop = CancellationToken::new();
        let abort = CancellationToken::new();

        *inner.outbox.lock() = Outbox::new(inner.config.policy);
        inner.transmitting.store(false, Ordering::Release);
        *inner.link.lock() = Some(info.clone());
        *inner.session.lock() = Some(LinkSession {
            generation,
            stop: stop.clone(),
            abort: abort.clone(),
            writer: None,
            inbound: None,
        });
        inner.state.send_replace(LinkState::Connected);

        let writer = tokio::spawn(Inner::run_writer(
            Arc::clone(inner),
            generation,
            stop.clone(),
            abort.clone(),
        ));
        let inbound = tokio::spawn(Inner::run_inbound(
            Arc::clone(inner),
            events,
            generation,
            abort.clone(),
        ));

        {
            let mut session = inner.session.lock();
            match session.as_mut() {
                Some(active) if active.generation == generation => {
                    active.writer = Some(writer);
                    active.inbound = Some(inbound);
                }
                // Torn down already; the cancelled tokens end both tasks
                _ => {}
            }
        }

        info!(device = %info.name, id = %info.id, "Radio link connected");
        Ok(ConnectOutcome::Connected(info))
    }

    /// Queue a payload. The receipt resolves with its outcome.
    ///
    /// Under [`WritePolicy::LatestWins`] an unsent payload is replaced and its
    /// receipt resolves with [`RadioError::Superseded`].
    pub fn submit(&self, payload: impl Into<Bytes>) -> WriteReceipt {
        let (tx, rx) = oneshot::channel();
        let job = WriteJob::new(payload.into(), tx);

        let superseded = {
            let mut outbox = self.inner.outbox.lock();
            let state = *self.inner.state.borrow();
            if !state.is_connected() {
                drop(outbox);
                job.complete(Err(RadioError::NotConnected(state)));
                return WriteReceipt { rx };
            }
            outbox.push(job)
        };

        if let Some(old) = superseded {
            trace!(bytes = old.payload.len(), "Pending payload superseded");
            old.complete(Err(RadioError::Superseded));
        }
        self.inner.wakeup.notify_one();

        WriteReceipt { rx }
    }

    /// Submit and wait for the outcome.
    pub async fn write(&self, payload: impl Into<Bytes>) -> Result<(), RadioError> {
        self.submit(payload).await
    }

    /// Tear the link down.
    ///
    /// New writes are refused immediately. The in-flight payload gets
    /// `disconnect_timeout` to finish before it is aborted. Disconnecting a
    /// link that is not connected does nothing.
    pub async fn disconnect(&self) {
        let inner = &self.inner;

        let claimed = inner.state.send_if_modified(|state| {
            if *state == LinkState::Connected {
                *state = LinkState::Disconnecting;
                true
            } else {
                false
            }
        });
        if !claimed {
            debug!(state = %self.state(), "Radio disconnect ignored");
            return;
        }

        info!("Disconnecting radio link");
        let session = inner.session.lock().take();

        if let Some(mut session) = session {
            session.stop.cancel();
            inner.wakeup.notify_one();

            if let Some(mut writer) = session.writer.take() {
                let timeout = inner.config.disconnect_timeout;
                if tokio::time::timeout(timeout, &mut writer).await.is_err() {
                    warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "In-flight radio write did not finish, aborting"
                    );
                    session.abort.cancel();
                    let _ = writer.await;
                }
            }

            inner.clear_outbox(|| RadioError::Disconnected);

            let warning = inner.config.notification_stop_warning;
            match tokio::time::timeout(warning, inner.device.stop_notifications()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "Stopping notifications failed"),
                Err(_) => warn!(
                    threshold_secs = warning.as_secs(),
                    "Stopping notifications is taking too long, continuing"
                ),
            }

            session.abort.cancel();
            if let Some(inbound) = session.inbound.take() {
                let _ = inbound.await;
            }
        }

        if let Err(e) = inner.device.disconnect().await {
            warn!(error = %e, "Device disconnect reported an error");
        }

        *inner.link.lock() = None;
        inner.state.send_replace(LinkState::Disconnected);
        info!("Radio link disconnected");
    }
}

impl<D: RadioDevice> Inner<D> {
    async fn run_writer(
        inner: Arc<Self>,
        generation: u64,
        stop: CancellationToken,
        abort: CancellationToken,
    ) {
        match inner.config.policy {
            WritePolicy::Fifo => inner.drive_queue(generation, &stop, &abort).await,
            WritePolicy::LatestWins => inner.drive_ticker(generation, &stop, &abort).await,
        }
        trace!(generation, "Radio writer stopped");
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Drain the queue in order, sleeping on the wakeup when empty.
    async fn drive_queue(
        &self,
        generation: u64,
        stop: &CancellationToken,
        abort: &CancellationToken,
    ) {
        while !stop.is_cancelled() {
            let job = self.outbox.lock().pop();
            match job {
                Some(job) => self.execute(job, generation, abort).await,
                None => {
                    tokio::select! {
                        biased;
                        _ = stop.cancelled() => break,
                        _ = self.wakeup.notified() => {}
                    }
                }
            }
        }
    }

    /// Send whatever is pending on each tick.
    async fn drive_ticker(
        &self,
        generation: u64,
        stop: &CancellationToken,
        abort: &CancellationToken,
    ) {
        let period = self.config.tick_interval.max(MIN_TICK_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let job = self.outbox.lock().pop();
            if let Some(job) = job {
                self.execute(job, generation, abort).await;
            }
        }
    }

    /// Send one payload. A writer from a torn-down session leaves the
    /// shared outbox and flags alone.
    async fn execute(&self, job: WriteJob, generation: u64, abort: &CancellationToken) {
        if self.is_current(generation) {
            self.transmitting.store(true, Ordering::Release);
        }
        let result = Transmission {
            device: &self.device,
            chunk: &self.config.chunk,
            retry: &self.config.retry,
            stats: &self.stats,
            abort,
        }
        .send(&job.payload)
        .await;
        let current = self.is_current(generation);
        if current {
            self.transmitting.store(false, Ordering::Release);
        }

        match &result {
            Ok(()) => {
                self.stats.record_payload();
                trace!(bytes = job.payload.len(), "Payload sent");
            }
            Err(e) => {
                self.stats.record_failure();
                warn!(error = %e, bytes = job.payload.len(), "Radio write failed");
                if e.is_fatal() && current {
                    self.clear_outbox(|| RadioError::Cleared);
                }
            }
        }

        job.complete(result);
    }

    async fn run_inbound(
        inner: Arc<Self>,
        mut events: mpsc::Receiver<DeviceEvent>,
        generation: u64,
        abort: CancellationToken,
    ) {
        loop {
            let event = tokio::select! {
                biased;
                _ = abort.cancelled() => break,
                event = events.recv() => event,
            };

            match event {
                Some(DeviceEvent::Notification(buffer)) => {
                    if !inner.state.borrow().is_connected() {
                        trace!(bytes = buffer.len(), "Notification dropped while not connected");
                        continue;
                    }
                    let text = String::from_utf8_lossy(&buffer);
                    inner.listeners.dispatch(&text);
                }
                Some(DeviceEvent::Disconnected) | None => {
                    inner.handle_device_disconnect(generation);
                    break;
                }
            }
        }
    }

    /// Device-initiated disconnect: drop everything immediately.
    fn handle_device_disconnect(&self, generation: u64) {
        let session = {
            let mut guard = self.session.lock();
            match guard.as_ref() {
                Some(active) if active.generation == generation => guard.take(),
                _ => None,
            }
        };
        // An explicit disconnect already owns the teardown
        let Some(session) = session else {
            return;
        };

        warn!("Radio link lost");
        self.state.send_replace(LinkState::Disconnecting);
        session.stop.cancel();
        session.abort.cancel();
        self.clear_outbox(|| RadioError::Disconnected);
        *self.link.lock() = None;
        self.state.send_replace(LinkState::Disconnected);
    }

    fn clear_outbox(&self, reason: impl Fn() -> RadioError) {
        let jobs = self.outbox.lock().drain();
        if !jobs.is_empty() {
            debug!(count = jobs.len(), "Discarding pending radio writes");
        }
        for job in jobs {
            job.complete(Err(reason()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::mock::MockDevice;
    use std::time::Duration;

    async fn connected(policy: WritePolicy) -> (RadioTransport<MockDevice>, MockDevice) {
        let device = MockDevice::new();
        let transport = RadioTransport::new(
            device.clone(),
            TransportConfig::default().with_policy(policy),
        );
        let outcome = transport.connect().await.unwrap();
        assert!(matches!(outcome, ConnectOutcome::Connected(_)));
        (transport, device)
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_and_disconnect() {
        let (transport, device) = connected(WritePolicy::Fifo).await;
        assert_eq!(transport.state(), LinkState::Connected);
        assert_eq!(transport.link().unwrap().name, "Mock Rover");

        transport.disconnect().await;
        assert_eq!(transport.state(), LinkState::Disconnected);
        assert!(transport.link().is_none());
        assert_eq!(device.disconnects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_connect_rejected() {
        let (transport, _device) = connected(WritePolicy::Fifo).await;
        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, RadioError::Busy(LinkState::Connected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_cancelled_is_not_an_error() {
        let device = MockDevice::new();
        device.fail_connect(DeviceError::SelectionCancelled);
        let transport = RadioTransport::new(device, TransportConfig::default());

        let outcome = transport.connect().await.unwrap();
        assert_eq!(outcome, ConnectOutcome::Cancelled);
        assert_eq!(transport.state(), LinkState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_surfaced() {
        let device = MockDevice::new();
        device.fail_connect(DeviceError::Other("out of range".into()));
        let transport = RadioTransport::new(device, TransportConfig::default());

        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, RadioError::Connect(_)));
        assert_eq!(transport.state(), LinkState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_when_idle_is_noop() {
        let device = MockDevice::new();
        let transport = RadioTransport::new(device.clone(), TransportConfig::default());
        transport.disconnect().await;
        transport.disconnect().await;
        assert_eq!(transport.state(), LinkState::Disconnected);
        assert_eq!(device.disconnects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_rejected_when_disconnected() {
        let transport = RadioTransport::new(MockDevice::new(), TransportConfig::default());
        let err = transport.write(&b"rtcm"[..]).await.unwrap_err();
        assert!(matches!(
            err,
            RadioError::NotConnected(LinkState::Disconnected)
        ));
        assert_eq!(transport.pending_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_transmits_in_submission_order() {
        let (transport, device) = connected(WritePolicy::Fifo).await;

        let receipts: Vec<WriteReceipt> = (0u8..4)
            .map(|n| transport.submit(vec![n; 30]))
            .collect();
        for receipt in receipts {
            receipt.await.unwrap();
        }

        // Chunks never interleave: each job's two chunks are adjacent
        let firsts: Vec<u8> = device.written().iter().map(|c| c[0]).collect();
        assert_eq!(firsts, vec![0, 0, 1, 1, 2, 2, 3, 3]);
        assert_eq!(transport.stats().payloads_sent, 4);
        assert_eq!(transport.stats().chunks_sent, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_wins_keeps_single_pending() {
        let (transport, device) = connected(WritePolicy::LatestWins).await;

        let first = transport.submit(&b"first"[..]);
        let second = transport.submit(&b"second"[..]);

        assert_eq!(transport.pending_jobs(), 1);
        assert_eq!(transport.pending_payload().unwrap(), &b"second"[..]);
        assert!(matches!(first.await, Err(RadioError::Superseded)));

        second.await.unwrap();
        assert_eq!(device.written(), vec![b"second".to_vec()]);
        assert_eq!(transport.pending_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_wins_sends_on_tick() {
        let (transport, device) = connected(WritePolicy::LatestWins).await;
        // Let the immediate first tick pass with nothing pending
        tokio::time::sleep(Duration::from_millis(10)).await;

        let receipt = transport.submit(&b"rtcm"[..]);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(device.written().is_empty());
        assert_eq!(transport.pending_jobs(), 1);

        receipt.await.unwrap();
        assert_eq!(device.written(), vec![b"rtcm".to_vec()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_failure_clears_queue() {
        let (transport, device) = connected(WritePolicy::Fifo).await;
        device.fail_next(DeviceError::Other("link layer".into()));

        let failing = transport.submit(&b"one"[..]);
        let queued = transport.submit(&b"two"[..]);

        assert!(matches!(failing.await, Err(RadioError::WriteFailed { .. })));
        assert!(matches!(queued.await, Err(RadioError::Cleared)));
        assert_eq!(transport.pending_jobs(), 0);
        assert_eq!(transport.state(), LinkState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_during_write_leaves_empty_queue() {
        let (transport, device) = connected(WritePolicy::Fifo).await;
        device.set_write_delay(Duration::from_secs(1));

        let in_flight = transport.submit(vec![7u8; 200]);
        let queued = transport.submit(vec![8u8; 20]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(transport.is_transmitting());

        transport.disconnect().await;

        assert_eq!(transport.state(), LinkState::Disconnected);
        assert_eq!(transport.pending_jobs(), 0);
        assert!(!transport.is_transmitting());
        assert!(matches!(in_flight.await, Err(RadioError::Disconnected)));
        assert!(queued.await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_waits_for_in_flight_payload() {
        let (transport, device) = connected(WritePolicy::Fifo).await;
        device.set_write_delay(Duration::from_millis(300));

        // Three chunks, well inside the disconnect timeout
        let in_flight = transport.submit(vec![7u8; 60]);
        let queued = transport.submit(vec![8u8; 20]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(transport.is_transmitting());

        let started = tokio::time::Instant::now();
        transport.disconnect().await;

        assert!(started.elapsed() >= Duration::from_millis(800));
        assert_eq!(transport.state(), LinkState::Disconnected);
        assert!(matches!(in_flight.await, Ok(())));
        assert!(matches!(queued.await, Err(RadioError::Disconnected)));
        assert_eq!(device.written(), vec![vec![7u8; 20]; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_wins_replaces_pending_while_sending() {
        let (transport, device) = connected(WritePolicy::LatestWins).await;
        device.set_write_delay(Duration::from_millis(300));
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Two chunks, sent on the tick at 1s
        let first = transport.submit(vec![1u8; 40]);
        tokio::time::sleep(Duration::from_millis(1090)).await;
        assert!(transport.is_transmitting());

        let replaced = transport.submit(vec![2u8; 5]);
        let latest = transport.submit(vec![3u8; 5]);
        assert_eq!(transport.pending_jobs(), 1);

        assert!(matches!(replaced.await, Err(RadioError::Superseded)));
        assert!(matches!(first.await, Ok(())));
        assert!(matches!(latest.await, Ok(())));
        assert_eq!(
            device.written(),
            vec![vec![1u8; 20], vec![1u8; 20], vec![3u8; 5]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_tick_interval_still_sends() {
        let device = MockDevice::new();
        let config = TransportConfig {
            tick_interval: Duration::ZERO,
            ..TransportConfig::default().with_policy(WritePolicy::LatestWins)
        };
        let transport = RadioTransport::new(device.clone(), config);
        transport.connect().await.unwrap();

        transport.write(&b"rtcm"[..]).await.unwrap();
        transport.write(&b"more"[..]).await.unwrap();
        assert_eq!(device.written(), vec![b"rtcm".to_vec(), b"more".to_vec()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_writer_leaves_new_session_alone() {
        let (transport, device) = connected(WritePolicy::LatestWins).await;
        let stale = transport.inner.generation.load(Ordering::Acquire);

        let mut states = transport.watch_state();
        device.emit(DeviceEvent::Disconnected).await;
        states
            .wait_for(|s| *s == LinkState::Disconnected)
            .await
            .unwrap();
        transport.connect().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let pending = transport.submit(&b"fresh"[..]);
        assert_eq!(transport.pending_jobs(), 1);

        // A fatal failure on the old session's writer
        device.fail_next(DeviceError::Other("link layer".into()));
        let (tx, old) = oneshot::channel();
        let job = WriteJob::new(Bytes::from_static(b"old"), tx);
        transport
            .inner
            .execute(job, stale, &CancellationToken::new())
            .await;

        assert!(matches!(old.await, Ok(Err(RadioError::WriteFailed { .. }))));
        assert_eq!(transport.pending_jobs(), 1);
        assert!(!transport.is_transmitting());
        assert!(matches!(pending.await, Ok(())));
        assert_eq!(device.written(), vec![b"fresh".to_vec()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_notifications_dispatched_as_text() {
        let (transport, device) = connected(WritePolicy::Fifo).await;
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        transport.subscribe(move |text| sink.lock().push(text.to_string()));
        transport.subscribe(|_| panic!("listener failure"));
        let sink = Arc::clone(&seen);
        transport.subscribe(move |text| sink.lock().push(text.to_uppercase()));

        device
            .emit(DeviceEvent::Notification(Bytes::from_static(b"$GNGGA,1")))
            .await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(*seen.lock(), vec!["$GNGGA,1".to_string(), "$GNGGA,1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_disconnect_forces_disconnected() {
        let (transport, device) = connected(WritePolicy::Fifo).await;
        device.set_write_delay(Duration::from_secs(5));
        let in_flight = transport.submit(vec![1u8; 100]);
        let queued = transport.submit(vec![2u8; 10]);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut states = transport.watch_state();
        device.emit(DeviceEvent::Disconnected).await;
        states
            .wait_for(|s| *s == LinkState::Disconnected)
            .await
            .unwrap();

        assert_eq!(transport.pending_jobs(), 0);
        assert!(matches!(in_flight.await, Err(RadioError::Disconnected)));
        assert!(matches!(queued.await, Err(RadioError::Disconnected)));

        // The link can be brought back up afterwards
        assert!(transport.connect().await.is_ok());
    }
}
