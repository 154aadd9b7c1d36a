//! Correction tunnel to an NTRIP caster.
//!
//! A [`CorrectionTunnel`] holds one streaming session to a caster
//! mountpoint. The response body after the handshake is forwarded to frame
//! subscribers as opaque bytes. When the channel closes the tunnel waits
//! `reconnect_delay` and opens a new session, until it is disconnected or
//! redirected to another mountpoint.
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Closed
//!             ^                        |
//!             +----- reconnect_delay --+
//! ```
//!
//! The virtual `NEAR` mountpoint selects a base station from the client's
//! position, so for it the tunnel reports the latest position upstream as a
//! GGA sentence right after connecting and then every `position_interval`.

mod client;
mod config;
mod connector;
mod error;
mod handshake;
mod state;

pub use client::{CorrectionTunnel, TunnelStats, TunnelStatsSnapshot};
pub use config::{
    TunnelConfig, TunnelTarget, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HANDSHAKE_TIMEOUT,
    DEFAULT_IDLE_TIMEOUT, DEFAULT_POSITION_INTERVAL, DEFAULT_RECONNECT_DELAY, NEAREST_MOUNTPOINT,
};
pub use connector::{Connector, Route, TcpConnector};
pub use error::TunnelError;
pub use state::TunnelState;
