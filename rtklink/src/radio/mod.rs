//! Radio transport to the rover.
//!
//! The rover is reached over a short-range radio link with a tiny MTU. This
//! module owns that link: connect and disconnect, inbound notifications fanned
//! out as text, and an outbound path that chunks payloads, retries the
//! hardware's transient busy condition and never interleaves two payloads.
//!
//! # Write policies
//!
//! | Policy | Pending payloads | Driver |
//! |--------|------------------|--------|
//! | [`WritePolicy::Fifo`] | unbounded queue, sent in order | woken on submit |
//! | [`WritePolicy::LatestWins`] | at most one, newer replaces older | fixed ticker |
//!
//! The hardware itself sits behind [`RadioDevice`]; [`TcpRadioBridge`] is the
//! implementation for radio modems exposed through a serial-to-TCP bridge.

mod bridge;
mod config;
mod device;
mod error;
#[cfg(test)]
pub(crate) mod mock;
mod outbox;
mod profile;
mod state;
mod stats;
mod transport;
mod writer;

pub use bridge::TcpRadioBridge;
pub use config::{
    ChunkConfig, RetryPolicy, TransportConfig, WritePolicy, DEFAULT_CHUNK_SIZE,
    DEFAULT_DISCONNECT_TIMEOUT, DEFAULT_INTER_CHUNK_DELAY, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_NOTIFICATION_STOP_WARNING, DEFAULT_RETRY_BASE_DELAY, DEFAULT_RETRY_MULTIPLIER,
    DEFAULT_TICK_INTERVAL,
};
pub use device::{DeviceError, DeviceEvent, LinkInfo, RadioDevice};
pub use error::RadioError;
pub use profile::{format_uuid, LinkProfile};
pub use state::LinkState;
pub use stats::{TransportStats, TransportStatsSnapshot};
pub use transport::{ConnectOutcome, RadioTransport, WriteReceipt};
