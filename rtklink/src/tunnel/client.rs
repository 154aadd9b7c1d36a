//! The reconnecting tunnel and its session supervisor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::config::{TunnelConfig, TunnelTarget};
use super::connector::{Connector, Route};
use super::error::TunnelError;
use super::handshake::handshake;
use super::state::TunnelState;
use crate::nmea::{encode_gga, ReportPosition};
use crate::subscription::{SubscriberSet, SubscriptionToken};

const READ_CHUNK: usize = 4096;
const MIN_POSITION_INTERVAL: Duration = Duration::from_millis(1);

type Ready = oneshot::Sender<Result<(), TunnelError>>;

/// Counters across every session of one tunnel.
#[derive(Debug, Default)]
pub struct TunnelStats {
    bytes_received: AtomicU64,
    frames_received: AtomicU64,
    reconnects: AtomicU64,
    positions_sent: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TunnelStatsSnapshot {
    pub bytes_received: u64,
    pub frames_received: u64,
    pub reconnects: u64,
    pub positions_sent: u64,
}

impl TunnelStats {
    pub fn snapshot(&self) -> TunnelStatsSnapshot {
        TunnelStatsSnapshot {
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            positions_sent: self.positions_sent.load(Ordering::Relaxed),
        }
    }
}

struct ActiveSession {
    id: u64,
    target: TunnelTarget,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Inner<C> {
    connector: C,
    config: TunnelConfig,
    state: watch::Sender<TunnelState>,
    position: watch::Sender<Option<ReportPosition>>,
    frames: SubscriberSet<Bytes>,
    /// Serializes connect, switch and disconnect.
    session: tokio::sync::Mutex<Option<ActiveSession>>,
    /// Target of the live supervisor, tagged with its session id.
    current: parking_lot::Mutex<Option<(u64, TunnelTarget)>>,
    next_id: AtomicU64,
    stats: TunnelStats,
}

/// Streams corrections from one caster mountpoint at a time.
///
/// Cloning is cheap; clones control the same tunnel.
pub struct CorrectionTunnel<C: Connector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for CorrectionTunnel<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> CorrectionTunnel<C> {
    pub fn new(connector: C, config: TunnelConfig) -> Self {
        let (state, _) = watch::channel(TunnelState::Idle);
        let (position, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                connector,
                config,
                state,
                position,
                frames: SubscriberSet::new(),
                session: tokio::sync::Mutex::new(None),
                current: parking_lot::Mutex::new(None),
                next_id: AtomicU64::new(1),
                stats: TunnelStats::default(),
            }),
        }
    }

    pub fn config(&self) -> &TunnelConfig {
        &self.inner.config
    }

    pub fn state(&self) -> TunnelState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<TunnelState> {
        self.inner.state.subscribe()
    }

    /// Mountpoint the tunnel is streaming from or trying to reach.
    pub fn active_mountpoint(&self) -> Option<String> {
        self.inner
            .current
            .lock()
            .as_ref()
            .map(|(_, target)| target.mountpoint.clone())
    }

    pub fn active_target(&self) -> Option<TunnelTarget> {
        self.inner.current.lock().as_ref().map(|(_, target)| target.clone())
    }

    pub fn stats(&self) -> TunnelStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Receive correction frames exactly as read from the caster.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionToken
    where
        F: Fn(&Bytes) + Send + Sync + 'static,
    {
        self.inner.frames.subscribe(listener)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.inner.frames.unsubscribe(token)
    }

    /// Latest observer position, reported upstream when position reports are on.
    pub fn update_position(&self, position: ReportPosition) {
        self.inner.position.send_replace(Some(position));
    }

    /// Stream from `target`.
    ///
    /// Resolves with the outcome of the first handshake. Asking for the target
    /// that is already streaming does nothing; any other target replaces the
    /// current session. With reconnection enabled a failed first attempt keeps
    /// retrying in the background.
    pub async fn connect(&self, target: TunnelTarget) -> Result<(), TunnelError> {
        let ready = {
            let mut session = self.inner.session.lock().await;

            if let Some(active) = session.as_ref() {
                if active.target == target && self.state().is_streaming() {
                    debug!(target = %target, "Tunnel already streaming from target");
                    return Ok(());
                }
            }
            if let Some(previous) = session.take() {
                info!(from = %previous.target, to = %target, "Replacing correction tunnel session");
                self.inner.teardown(previous).await;
            }

            let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            let cancel = CancellationToken::new();
            let (ready_tx, ready_rx) = oneshot::channel();

            *self.inner.current.lock() = Some((id, target.clone()));
            let task = tokio::spawn(Inner::supervise(
                Arc::clone(&self.inner),
                id,
                target.clone(),
                cancel.clone(),
                ready_tx,
            ));
            *session = Some(ActiveSession {
                id,
                target,
                cancel,
                task,
            });
            ready_rx
        };

        ready.await.unwrap_or(Err(TunnelError::Cancelled))
    }

    /// Redirect to another mountpoint.
    pub async fn switch(&self, target: TunnelTarget) -> Result<(), TunnelError> {
        self.connect(target).await
    }

    /// Stop streaming and cancel any pending reconnection. Never fails.
    pub async fn disconnect(&self) {
        let mut session = self.inner.session.lock().await;
        if let Some(previous) = session.take() {
            info!(target = %previous.target, "Disconnecting correction tunnel");
            self.inner.teardown(previous).await;
        }
        *self.inner.current.lock() = None;
        self.inner.state.send_if_modified(|state| {
            if *state == TunnelState::Idle || *state == TunnelState::Closed {
                false
            } else {
                *state = TunnelState::Closed;
                true
            }
        });
    }
}

impl<C: Connector> Inner<C> {
    async fn teardown(&self, session: ActiveSession) {
        session.cancel.cancel();
        if let Err(e) = session.task.await {
            warn!(error = %e, session = session.id, "Tunnel supervisor ended abnormally");
        }
        self.state.send_replace(TunnelState::Closed);
    }

    /// Run sessions for one target until cancelled or, without reconnection,
    /// until the first session ends.
    async fn supervise(
        self: Arc<Self>,
        id: u64,
        target: TunnelTarget,
        cancel: CancellationToken,
        ready: Ready,
    ) {
        let mut ready = Some(ready);
        let mut attempt: u64 = 0;

        loop {
            if attempt > 0 {
                self.stats.reconnects.fetch_add(1, Ordering::Relaxed);
            }
            self.state.send_replace(TunnelState::Connecting);
            info!(target = %target, attempt, "Opening correction tunnel");

            let ended = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                reason = self.run_session(&target, &mut ready) => Some(reason),
            };
            let Some(reason) = ended else {
                if let Some(ready) = ready.take() {
                    let _ = ready.send(Err(TunnelError::Cancelled));
                }
                break;
            };

            self.state.send_replace(TunnelState::Closed);
            warn!(target = %target, error = %reason, "Correction tunnel closed");

            if let Some(ready) = ready.take() {
                let _ = ready.send(Err(reason));
            }
            if !self.config.reconnect {
                break;
            }

            debug!(
                delay_secs = self.config.reconnect_delay.as_secs(),
                "Scheduling tunnel reconnect"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
            attempt += 1;
        }

        let mut current = self.current.lock();
        if matches!(current.as_ref(), Some((active, _)) if *active == id) && !self.config.reconnect {
            *current = None;
        }
    }

    /// One connection: dial, handshake, stream until it ends. Returns why it ended.
    async fn run_session(&self, target: &TunnelTarget, ready: &mut Option<Ready>) -> TunnelError {
        let (stream, first) = match self.open(target).await {
            Ok(opened) => opened,
            Err(e) => return e,
        };

        self.state.send_replace(TunnelState::Streaming);
        info!(target = %target, "Correction tunnel streaming");
        if let Some(ready) = ready.take() {
            let _ = ready.send(Ok(()));
        }

        self.stream(stream, first, target).await
    }

    async fn open(&self, target: &TunnelTarget) -> Result<(C::Stream, Bytes), TunnelError> {
        let route = Route::derive(&target.caster, self.config.proxy.as_ref());

        let mut stream = tokio::time::timeout(self.config.connect_timeout, route.establish(&self.connector))
            .await
            .map_err(|_| TunnelError::ConnectTimeout {
                address: route.dial.authority(),
                secs: self.config.connect_timeout.as_secs(),
            })??;

        let first = tokio::time::timeout(
            self.config.handshake_timeout,
            handshake(&mut stream, target, &self.config.user_agent),
        )
        .await
        .map_err(|_| TunnelError::HandshakeTimeout(self.config.handshake_timeout.as_secs()))??;

        Ok((stream, first))
    }

    async fn stream(&self, stream: C::Stream, first: Bytes, target: &TunnelTarget) -> TunnelError {
        let (mut reader, mut writer) = tokio::io::split(stream);

        if !first.is_empty() {
            self.deliver(first);
        }

        let reports = target.is_nearest() || self.config.send_position;
        let mut position = self.position.subscribe();
        let mut reported = false;

        let mut ticker = reports.then(|| {
            let mut ticker =
                tokio::time::interval(self.config.position_interval.max(MIN_POSITION_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        let idle_timeout = self.config.idle_timeout;
        let idle = tokio::time::sleep(idle_timeout);
        tokio::pin!(idle);

        let mut buf = BytesMut::with_capacity(READ_CHUNK);

        loop {
            buf.reserve(READ_CHUNK);

            let send_now = tokio::select! {
                read = reader.read_buf(&mut buf) => {
                    match read {
                        Ok(0) => return TunnelError::Closed,
                        Ok(_) => {
                            idle.as_mut().reset(Instant::now() + idle_timeout);
                            self.deliver(buf.split().freeze());
                            false
                        }
                        Err(e) => return TunnelError::Io(e),
                    }
                }
                _ = &mut idle => return TunnelError::Idle(idle_timeout.as_secs()),
                _ = next_tick(&mut ticker) => true,
                changed = position.changed(), if reports && !reported => changed.is_ok(),
            };

            if !send_now {
                continue;
            }

            let latest = *position.borrow_and_update();
            let Some(latest) = latest else {
                trace!("No position to report yet");
                continue;
            };

            let sentence = encode_gga(&latest, Utc::now().time());
            if let Err(e) = writer.write_all(sentence.as_bytes()).await {
                return TunnelError::Io(e);
            }
            reported = true;
            self.stats.positions_sent.fetch_add(1, Ordering::Relaxed);
            debug!(sentence = sentence.trim_end(), "Position reported to caster");
        }
    }

    fn deliver(&self, frame: Bytes) {
        self.stats
            .bytes_received
            .fetch_add(frame.len() as u64, Ordering::Relaxed);
        self.stats.frames_received.fetch_add(1, Ordering::Relaxed);
        self.frames.dispatch(&frame);
    }
}

/// Next report tick; never resolves when reports are off.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caster::{CasterAddress, Credentials};
    use crate::geo::Coordinates;
    use crate::tunnel::DEFAULT_POSITION_INTERVAL;
    use std::io;
    use std::time::Duration;
    use tokio::io::{duplex, DuplexStream};
    use tokio::sync::mpsc;

    /// Connection seen by the fake caster: dialed address, the open time and its end of the pipe.
    struct Accepted {
        address: CasterAddress,
        at: Instant,
        stream: DuplexStream,
    }

    struct MockConnector {
        accepted: mpsc::UnboundedSender<Accepted>,
    }

    impl Connector for MockConnector {
        type Stream = DuplexStream;

        async fn open(&self, address: &CasterAddress) -> io::Result<DuplexStream> {
            let (near, far) = duplex(16 * 1024);
            self.accepted
                .send(Accepted {
                    address: address.clone(),
                    at: Instant::now(),
                    stream: far,
                })
                .map_err(|_| io::Error::new(io::ErrorKind::ConnectionRefused, "caster gone"))?;
            Ok(near)
        }
    }

    fn tunnel(config: TunnelConfig) -> (CorrectionTunnel<MockConnector>, mpsc::UnboundedReceiver<Accepted>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CorrectionTunnel::new(MockConnector { accepted: tx }, config), rx)
    }

    fn target(mountpoint: &str) -> TunnelTarget {
        TunnelTarget::new(
            CasterAddress::new("caster.example.org", 2101),
            mountpoint,
            Credentials::new("rover", "secret"),
        )
    }

    /// Read until the blank line ending a request head.
    async fn read_request(stream: &mut DuplexStream) -> String {
        let mut request = Vec::new();
        let mut byte = [0u8; 1];
        while !request.ends_with(b"\r\n\r\n") {
            if stream.read(&mut byte).await.unwrap() == 0 {
                break;
            }
            request.push(byte[0]);
        }
        String::from_utf8(request).unwrap()
    }

    async fn read_line(stream: &mut DuplexStream) -> String {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        while !line.ends_with(b"\r\n") {
            if stream.read(&mut byte).await.unwrap() == 0 {
                break;
            }
            line.push(byte[0]);
        }
        String::from_utf8(line).unwrap()
    }

    /// Accept the next connection and answer the handshake.
    async fn accept(rx: &mut mpsc::UnboundedReceiver<Accepted>, response: &[u8]) -> (Accepted, String) {
        let mut accepted = rx.recv().await.unwrap();
        let request = read_request(&mut accepted.stream).await;
        accepted.stream.write_all(response).await.unwrap();
        (accepted, request)
    }

    fn no_reconnect() -> TunnelConfig {
        TunnelConfig {
            reconnect: false,
            ..TunnelConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_streams_frames_to_subscribers() {
        let (tunnel, mut rx) = tunnel(no_reconnect());
        let frames = Arc::new(parking_lot::Mutex::new(Vec::<u8>::new()));
        let sink = Arc::clone(&frames);
        tunnel.subscribe(move |frame| sink.lock().extend_from_slice(frame));

        let caster = tokio::spawn(async move {
            let (mut accepted, request) = accept(&mut rx, b"ICY 200 OK\r\n\xd3\x00\x01").await;
            accepted.stream.write_all(b"\xd3\x00\x02").await.unwrap();
            (accepted, request)
        });

        tunnel.connect(target("TLSE00FRA0")).await.unwrap();
        let (_accepted, request) = caster.await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(tunnel.state(), TunnelState::Streaming);
        assert_eq!(tunnel.active_mountpoint().as_deref(), Some("TLSE00FRA0"));
        assert!(request.starts_with("GET /TLSE00FRA0 HTTP/1.1\r\n"));
        assert!(request.contains("Authorization: Basic cm92ZXI6c2VjcmV0\r\n"));
        assert_eq!(*frames.lock(), b"\xd3\x00\x01\xd3\x00\x02".to_vec());
        assert_eq!(tunnel.stats().bytes_received, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_mountpoint_surfaced() {
        let (tunnel, mut rx) = tunnel(no_reconnect());
        let caster = tokio::spawn(async move {
            accept(&mut rx, b"SOURCETABLE 200 OK\r\n\r\nENDSOURCETABLE\r\n").await
        });

        let err = tunnel.connect(target("NOPE")).await.unwrap_err();
        assert!(matches!(err, TunnelError::MountpointNotFound(name) if name == "NOPE"));
        caster.await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(tunnel.state(), TunnelState::Closed);
        assert!(tunnel.active_mountpoint().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_surfaced() {
        let (tunnel, mut rx) = tunnel(no_reconnect());
        tokio::spawn(async move {
            let _keep = accept(&mut rx, b"HTTP/1.1 401 Unauthorized\r\n\r\n").await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let err = tunnel.connect(target("TLSE00FRA0")).await.unwrap_err();
        assert!(matches!(err, TunnelError::Unauthorized));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_target_is_noop_and_other_target_replaces() {
        let (tunnel, mut rx) = tunnel(no_reconnect());
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(mut accepted) = rx.recv().await {
                let request = read_request(&mut accepted.stream).await;
                accepted.stream.write_all(b"ICY 200 OK\r\n").await.unwrap();
                let done = done_tx.clone();
                tokio::spawn(async move {
                    // Wait for the client to hang up
                    let mut rest = Vec::new();
                    let _ = accepted.stream.read_to_end(&mut rest).await;
                    let _ = done.send(request);
                });
            }
        });

        tunnel.connect(target("A")).await.unwrap();
        tunnel.switch(target("A")).await.unwrap();
        assert_eq!(tunnel.active_mountpoint().as_deref(), Some("A"));

        tunnel.switch(target("B")).await.unwrap();
        let closed = done_rx.recv().await.unwrap();
        assert!(closed.starts_with("GET /A "));
        assert_eq!(tunnel.active_mountpoint().as_deref(), Some("B"));
        assert_eq!(tunnel.state(), TunnelState::Streaming);

        tunnel.disconnect().await;
        let closed = done_rx.recv().await.unwrap();
        assert!(closed.starts_with("GET /B "));
        assert!(done_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nearest_reports_position() {
        let (tunnel, mut rx) = tunnel(no_reconnect());
        tunnel.update_position(ReportPosition::new(Coordinates::new(48.85, 2.35), 35.0));

        let caster = tokio::spawn(async move {
            let (mut accepted, _) = accept(&mut rx, b"ICY 200 OK\r\n").await;
            let first = read_line(&mut accepted.stream).await;
            let first_at = Instant::now();
            let second = read_line(&mut accepted.stream).await;
            (first, second, Instant::now() - first_at)
        });

        tunnel.connect(target("NEAR")).await.unwrap();
        let (first, second, gap) = caster.await.unwrap();

        assert!(first.starts_with("$GPGGA,"));
        assert!(first.contains(",4851.00000,N,00221.00000,E,1,12,1.0,"));
        assert!(first.ends_with("\r\n"));
        assert!(second.starts_with("$GPGGA,"));
        assert!(gap >= DEFAULT_POSITION_INTERVAL - Duration::from_millis(1));
        assert!(tunnel.stats().positions_sent >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_named_mountpoint_sends_no_position_by_default() {
        let (tunnel, mut rx) = tunnel(no_reconnect());
        tunnel.update_position(ReportPosition::new(Coordinates::new(48.85, 2.35), 35.0));

        let caster = tokio::spawn(async move { accept(&mut rx, b"ICY 200 OK\r\n").await });
        tunnel.connect(target("TLSE00FRA0")).await.unwrap();
        let (mut accepted, _) = caster.await.unwrap();

        tokio::time::sleep(DEFAULT_POSITION_INTERVAL * 2).await;
        let mut byte = [0u8; 1];
        let read =
            tokio::time::timeout(Duration::from_millis(10), accepted.stream.read(&mut byte)).await;
        assert!(read.is_err(), "caster received upstream bytes");
        assert_eq!(tunnel.stats().positions_sent, 0);
        assert_eq!(tunnel.state(), TunnelState::Streaming);
    }

    #[tokio::test(start_paused = true)]
    async fn test_named_mountpoint_reports_when_enabled() {
        let config = TunnelConfig {
            send_position: true,
            ..no_reconnect()
        };
        let (tunnel, mut rx) = tunnel(config);
        tunnel.update_position(ReportPosition::new(Coordinates::new(48.85, 2.35), 35.0));

        let caster = tokio::spawn(async move {
            let (mut accepted, _) = accept(&mut rx, b"ICY 200 OK\r\n").await;
            read_line(&mut accepted.stream).await
        });

        tunnel.connect(target("TLSE00FRA0")).await.unwrap();
        let line = caster.await.unwrap();
        assert!(line.starts_with("$GPGGA,"));
        assert!(line.contains(",4851.00000,N,00221.00000,E,"));
        assert!(tunnel.stats().positions_sent >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_position_interval_is_clamped() {
        let config = TunnelConfig {
            position_interval: Duration::ZERO,
            ..no_reconnect()
        };
        let (tunnel, mut rx) = tunnel(config);
        tunnel.update_position(ReportPosition::new(Coordinates::new(48.85, 2.35), 35.0));

        let caster = tokio::spawn(async move {
            let (mut accepted, _) = accept(&mut rx, b"ICY 200 OK\r\n").await;
            let first = read_line(&mut accepted.stream).await;
            let second = read_line(&mut accepted.stream).await;
            (first, second)
        });

        tunnel.connect(target("NEAR")).await.unwrap();
        let (first, second) = caster.await.unwrap();
        assert!(first.starts_with("$GPGGA,"));
        assert!(second.starts_with("$GPGGA,"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nearest_reports_first_position_when_it_arrives() {
        let (tunnel, mut rx) = tunnel(no_reconnect());
        let caster = tokio::spawn(async move {
            let (mut accepted, _) = accept(&mut rx, b"ICY 200 OK\r\n").await;
            let line = read_line(&mut accepted.stream).await;
            (line, Instant::now())
        });

        tunnel.connect(target("NEAR")).await.unwrap();
        let started = Instant::now();
        tokio::time::sleep(Duration::from_secs(2)).await;
        tunnel.update_position(ReportPosition::new(Coordinates::new(-33.5, 151.25), 10.0));

        let (line, at) = caster.await.unwrap();
        assert!(line.contains(",S,"));
        assert!(at - started < DEFAULT_POSITION_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_delay() {
        let config = TunnelConfig {
            reconnect: true,
            reconnect_delay: Duration::from_secs(5),
            ..TunnelConfig::default()
        };
        let (tunnel, mut rx) = tunnel(config);

        let (first, _) = {
            let connect = tunnel.connect(target("TLSE00FRA0"));
            let answer = accept(&mut rx, b"ICY 200 OK\r\n");
            let (result, accepted) = tokio::join!(connect, answer);
            result.unwrap();
            accepted
        };

        // Caster hangs up
        drop(first.stream);
        let closed_at = Instant::now();

        let (second, _) = accept(&mut rx, b"ICY 200 OK\r\n").await;
        assert!(second.at - closed_at >= Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err(), "no extra connection attempts");
        assert_eq!(tunnel.state(), TunnelState::Streaming);
        assert_eq!(tunnel.stats().reconnects, 1);

        tunnel.disconnect().await;
        assert_eq!(tunnel.state(), TunnelState::Closed);
        drop(second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_reconnect() {
        let config = TunnelConfig {
            reconnect: true,
            ..TunnelConfig::default()
        };
        let (tunnel, mut rx) = tunnel(config);

        let (result, (accepted, _)) = tokio::join!(
            tunnel.connect(target("TLSE00FRA0")),
            accept(&mut rx, b"HTTP/1.1 500 Internal Server Error\r\n\r\n")
        );
        assert!(matches!(result, Err(TunnelError::UnexpectedResponse(_))));
        drop(accepted);

        tunnel.disconnect().await;
        tunnel.disconnect().await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(tunnel.state(), TunnelState::Closed);
        assert!(tunnel.active_mountpoint().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_stream_times_out() {
        let config = TunnelConfig {
            reconnect: false,
            idle_timeout: Duration::from_secs(30),
            ..TunnelConfig::default()
        };
        let (tunnel, mut rx) = tunnel(config);
        let mut states = tunnel.watch_state();

        let (result, (_accepted, _)) = tokio::join!(
            tunnel.connect(target("TLSE00FRA0")),
            accept(&mut rx, b"ICY 200 OK\r\n")
        );
        result.unwrap();

        let started = Instant::now();
        states.wait_for(|s| *s == TunnelState::Closed).await.unwrap();
        assert!(Instant::now() - started >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_through_proxy() {
        let config = TunnelConfig {
            reconnect: false,
            proxy: Some(CasterAddress::new("proxy.local", 3128)),
            ..TunnelConfig::default()
        };
        let (tunnel, mut rx) = tunnel(config);

        let proxy = tokio::spawn(async move {
            let mut accepted = rx.recv().await.unwrap();
            let connect = read_request(&mut accepted.stream).await;
            accepted
                .stream
                .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
                .await
                .unwrap();
            let get = read_request(&mut accepted.stream).await;
            accepted.stream.write_all(b"ICY 200 OK\r\n").await.unwrap();
            (accepted, connect, get)
        });

        tunnel.connect(target("TLSE00FRA0")).await.unwrap();
        let (accepted, connect, get) = proxy.await.unwrap();

        assert_eq!(accepted.address, CasterAddress::new("proxy.local", 3128));
        assert!(connect.starts_with("CONNECT caster.example.org:2101 HTTP/1.1\r\n"));
        assert!(get.starts_with("GET /TLSE00FRA0 HTTP/1.1\r\n"));
        assert!(get.contains("Host: caster.example.org:2101\r\n"));
    }
}
