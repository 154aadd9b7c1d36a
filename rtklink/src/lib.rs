//! rtklink - RTK correction relay for field GNSS rovers
//!
//! A rover unit streams positioning sentences over a short-range radio link.
//! This library decodes those sentences, picks the nearest correction source
//! from an NTRIP caster's sourcetable, streams binary corrections from it and
//! pushes them back through the radio link so the rover can compute an RTK fix.
//!
//! # Components
//!
//! - [`nmea`] - Sentence decoder turning rover text into [`nmea::Fix`] records
//! - [`radio`] - Radio transport with chunked, retried, single-writer output
//! - [`directory`] - Sourcetable parsing and nearest-mountpoint ranking
//! - [`tunnel`] - Reconnecting correction stream from a caster mountpoint
//! - [`pipeline`] - The correction loop wiring the four together
//!
//! # Example
//!
//! ```ignore
//! use rtklink::pipeline::{CorrectionLoop, CorrectionLoopConfig};
//! use rtklink::radio::{RadioTransport, TcpRadioBridge, TransportConfig};
//! use rtklink::tunnel::{CorrectionTunnel, TcpConnector, TunnelConfig};
//!
//! let radio = RadioTransport::new(TcpRadioBridge::new("192.168.4.1:8899"), TransportConfig::default());
//! radio.connect().await?;
//!
//! let tunnel = CorrectionTunnel::new(TcpConnector, TunnelConfig::default());
//! tunnel.connect(target).await?;
//!
//! let correction_loop = CorrectionLoop::start(radio, tunnel, CorrectionLoopConfig::default(), None);
//! ```

pub mod caster;
pub mod config;
pub mod directory;
pub mod geo;
pub mod logging;
pub mod nmea;
pub mod pipeline;
pub mod radio;
pub mod subscription;
pub mod tunnel;

/// Version of the rtklink library and CLI.
///
/// The version is defined in the workspace `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent to casters.
///
/// Casters commonly require the agent string to start with `NTRIP`.
pub fn user_agent() -> String {
    format!("NTRIP rtklink/{}", VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_has_ntrip_prefix() {
        let agent = user_agent();
        assert!(agent.starts_with("NTRIP "));
        assert!(agent.ends_with(VERSION));
    }
}
