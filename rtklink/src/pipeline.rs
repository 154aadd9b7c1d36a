//! The correction loop.
//!
//! Wires the four components together:
//!
//! ```text
//! radio text -> LineAssembler -> SentenceDecoder -> latest fix
//!                                                     |-> tunnel.update_position
//!                                                     '-> nearest mountpoint -> tunnel.switch
//! tunnel frames -> radio.submit
//! ```

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::directory::{RankOptions, Sourcetable};
use crate::nmea::{Fix, LineAssembler, ReportPosition, SentenceDecoder};
use crate::radio::{RadioDevice, RadioTransport};
use crate::subscription::SubscriptionToken;
use crate::tunnel::{Connector, CorrectionTunnel, TunnelTarget};

/// Default period between nearest-mountpoint checks.
pub const DEFAULT_RESELECT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionLoopConfig {
    /// Follow the nearest mountpoint as the rover moves.
    pub auto_select: bool,
    pub rank: RankOptions,
    pub reselect_interval: Duration,
}

impl Default for CorrectionLoopConfig {
    fn default() -> Self {
        Self {
            auto_select: true,
            rank: RankOptions::default(),
            reselect_interval: DEFAULT_RESELECT_INTERVAL,
        }
    }
}

/// Candidate mountpoints and the caster account used to reach them.
#[derive(Debug, Clone)]
pub struct MountpointSelection {
    pub sourcetable: Sourcetable,
    /// Caster and credentials; the mountpoint is replaced by the selected one.
    pub template: TunnelTarget,
}

/// Rover-side decoding state fed by radio notifications.
struct RoverFeed {
    assembler: LineAssembler,
    decoder: SentenceDecoder,
    last_altitude: f64,
}

/// Running correction loop. Dropping it without [`stop`](Self::stop) leaves
/// the listeners attached.
pub struct CorrectionLoop<D: RadioDevice, C: Connector> {
    radio: RadioTransport<D>,
    tunnel: CorrectionTunnel<C>,
    radio_token: SubscriptionToken,
    tunnel_token: SubscriptionToken,
    fixes: watch::Receiver<Option<Fix>>,
    cancel: CancellationToken,
    reselect: Option<JoinHandle<()>>,
}

impl<D: RadioDevice, C: Connector> CorrectionLoop<D, C> {
    /// Attach to the radio and the tunnel and start forwarding.
    ///
    /// Neither side is connected here; the loop only moves data between them.
    pub fn start(
        radio: RadioTransport<D>,
        tunnel: CorrectionTunnel<C>,
        config: CorrectionLoopConfig,
        selection: Option<MountpointSelection>,
    ) -> Self {
        let (fix_sink, fixes) = watch::channel(None);

        let feed = Mutex::new(RoverFeed {
            assembler: LineAssembler::new(),
            decoder: SentenceDecoder::new(),
            last_altitude: 0.0,
        });
        let position_sink = tunnel.clone();
        let radio_token = radio.subscribe(move |text| {
            let mut feed = feed.lock();
            let RoverFeed {
                assembler,
                decoder,
                last_altitude,
            } = &mut *feed;

            for line in assembler.push(text) {
                for fix in decoder.decode(&line) {
                    if let Some(altitude) = fix.altitude_m {
                        *last_altitude = altitude;
                    }
                    if let Some(coordinates) = fix.trusted_coordinates() {
                        position_sink.update_position(ReportPosition::new(coordinates, *last_altitude));
                    }
                    trace!(kind = ?fix.kind, quality = %fix.quality, "Rover fix");
                    fix_sink.send_replace(Some(fix));
                }
            }
        });

        let frame_sink = radio.clone();
        let tunnel_token = tunnel.subscribe(move |frame| {
            if !frame_sink.state().is_connected() {
                trace!(bytes = frame.len(), "Radio down, dropping correction frame");
                return;
            }
            // Outcome is logged by the transport
            drop(frame_sink.submit(frame.clone()));
        });

        let cancel = CancellationToken::new();
        let reselect = match selection {
            Some(selection) if config.auto_select => Some(tokio::spawn(run_reselect(
                tunnel.clone(),
                selection,
                config.clone(),
                fixes.clone(),
                cancel.clone(),
            ))),
            _ => None,
        };

        info!(auto_select = reselect.is_some(), "Correction loop started");
        Self {
            radio,
            tunnel,
            radio_token,
            tunnel_token,
            fixes,
            cancel,
            reselect,
        }
    }

    /// Most recent fix decoded from the rover.
    pub fn latest_fix(&self) -> Option<Fix> {
        self.fixes.borrow().clone()
    }

    pub fn watch_fixes(&self) -> watch::Receiver<Option<Fix>> {
        self.fixes.clone()
    }

    /// Detach from both sides and stop reselection. Connections stay as they are.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        self.radio.unsubscribe(self.radio_token);
        self.tunnel.unsubscribe(self.tunnel_token);
        if let Some(task) = self.reselect.take() {
            let _ = task.await;
        }
        info!("Correction loop stopped");
    }
}

async fn run_reselect<C: Connector>(
    tunnel: CorrectionTunnel<C>,
    selection: MountpointSelection,
    config: CorrectionLoopConfig,
    mut fixes: watch::Receiver<Option<Fix>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.reselect_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // Until something has been picked, react to the first usable fix instead of the ticker
    let mut selected = false;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
            changed = fixes.changed(), if !selected => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let observer = fixes.borrow_and_update().as_ref().and_then(Fix::trusted_coordinates);
        let Some(observer) = observer else {
            continue;
        };

        let nearest = selection
            .sourcetable
            .nearest(observer, &config.rank)
            .first()
            .map(|ranked| (ranked.record.mountpoint.clone(), ranked.distance_km));
        let Some((mountpoint, distance_km)) = nearest else {
            debug!(observer = %observer, radius_km = config.rank.radius_km, "No mountpoint in range");
            continue;
        };
        selected = true;

        if tunnel.active_mountpoint().as_deref() == Some(mountpoint.as_str()) {
            continue;
        }

        info!(mountpoint = %mountpoint, distance_km, "Switching to nearest mountpoint");
        let target = selection.template.with_mountpoint(mountpoint);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = tunnel.switch(target) => {
                if let Err(e) = result {
                    warn!(error = %e, "Mountpoint switch failed");
                }
            }
        }
    }
}
