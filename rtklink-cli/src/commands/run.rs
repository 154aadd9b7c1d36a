//! Run command - relay caster corrections to the rover over its radio link.
//!
//! The correction loop attaches before the tunnel connects, so the first
//! rover position reaches a `NEAR` stream as soon as it is decoded.

use std::time::Duration;

use tracing::{info, warn};

use rtklink::directory::DirectoryClient;
use rtklink::pipeline::{CorrectionLoop, MountpointSelection};
use rtklink::radio::{ConnectOutcome, RadioTransport, TcpRadioBridge, WritePolicy};
use rtklink::tunnel::{CorrectionTunnel, TcpConnector};

use crate::error::CliError;
use crate::runner::CliRunner;

/// How often the status line is logged.
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Arguments for the run command.
#[derive(Default)]
pub struct RunArgs {
    pub mountpoint: Option<String>,
    pub radio: Option<String>,
    pub policy: Option<WritePolicy>,
    pub no_auto_select: bool,
    pub debug: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("run");

    let config = runner.config_mut();
    if let Some(mountpoint) = args.mountpoint {
        config.caster.mountpoint = mountpoint;
        // An explicit mountpoint pins the stream
        config.selection.auto_select = false;
    }
    if let Some(address) = args.radio {
        config.radio.address = Some(address);
    }
    if let Some(policy) = args.policy {
        config.radio.write_policy = policy;
    }
    if args.no_auto_select {
        config.selection.auto_select = false;
    }

    runner.require_caster()?;
    if runner.config().radio.address.is_none() {
        return Err(CliError::Config(
            "No radio configured. Set radio.address or pass --radio host:port.".to_string(),
        ));
    }

    runner.block_on(relay(&runner))?
}

async fn relay(runner: &CliRunner) -> Result<(), CliError> {
    let config = runner.config();
    let address = config.radio.address.clone().unwrap_or_default();

    let radio = RadioTransport::new(TcpRadioBridge::new(&address), config.radio.transport_config());
    match radio.connect().await? {
        ConnectOutcome::Connected(link) => {
            println!("Radio connected: {} ({})", link.name, link.id);
        }
        ConnectOutcome::Cancelled => {
            println!("Radio selection cancelled");
            return Ok(());
        }
    }

    let selection = if config.selection.auto_select {
        let client = DirectoryClient::new(config.caster.address(), config.caster.credentials());
        match client.fetch().await {
            Ok(sourcetable) if !sourcetable.is_empty() => Some(MountpointSelection {
                sourcetable,
                template: config.caster.target(),
            }),
            Ok(_) => {
                warn!("Caster sourcetable is empty, keeping configured mountpoint");
                None
            }
            Err(e) => {
                warn!(error = %e, "Sourcetable unavailable, keeping configured mountpoint");
                None
            }
        }
    } else {
        None
    };

    let tunnel = CorrectionTunnel::new(TcpConnector, config.tunnel_config());
    let correction_loop = CorrectionLoop::start(
        radio.clone(),
        tunnel.clone(),
        config.selection.loop_config(),
        selection,
    );

    let target = config.caster.target();
    println!("Connecting to {}", target);
    let outcome = tokio::select! {
        result = tunnel.connect(target) => result.map_err(CliError::from),
        _ = tokio::signal::ctrl_c() => Ok(()),
    };

    if outcome.is_ok() && tunnel.state().is_streaming() {
        println!("Relaying corrections. Press Ctrl+C to stop.");
        wait_for_shutdown(&radio, &tunnel).await;
    }

    correction_loop.stop().await;
    tunnel.disconnect().await;
    radio.disconnect().await;

    let radio_stats = radio.stats();
    let tunnel_stats = tunnel.stats();
    info!(
        frames = tunnel_stats.frames_received,
        bytes = tunnel_stats.bytes_received,
        payloads = radio_stats.payloads_sent,
        failures = radio_stats.failures,
        "Relay stopped"
    );
    println!(
        "Stopped: {} frames received, {} payloads sent to the rover",
        tunnel_stats.frames_received, radio_stats.payloads_sent
    );
    outcome
}

async fn wait_for_shutdown(radio: &RadioTransport<TcpRadioBridge>, tunnel: &CorrectionTunnel<TcpConnector>) {
    let mut radio_state = radio.watch_state();
    let mut status = tokio::time::interval(STATUS_INTERVAL);
    status.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                return;
            }
            changed = radio_state.changed() => {
                if changed.is_err() || !radio_state.borrow().is_connected() {
                    warn!("Radio link lost, stopping relay");
                    return;
                }
            }
            _ = status.tick() => {
                let stats = tunnel.stats();
                info!(
                    tunnel = %tunnel.state(),
                    mountpoint = tunnel.active_mountpoint().as_deref().unwrap_or("-"),
                    frames = stats.frames_received,
                    reconnects = stats.reconnects,
                    pending = radio.pending_jobs(),
                    "Relay status"
                );
            }
        }
    }
}
