//! Tunnel error types.

use thiserror::Error;

use crate::caster::ResponseError;

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection to {address} timed out after {secs}s")]
    ConnectTimeout { address: String, secs: u64 },

    /// The proxy refused the `CONNECT` request.
    #[error("Proxy refused tunnel: {0}")]
    Proxy(String),

    #[error("Caster did not answer the handshake within {0}s")]
    HandshakeTimeout(u64),

    #[error("Mountpoint '{0}' not found (caster returned its sourcetable)")]
    MountpointNotFound(String),

    #[error("Caster rejected the credentials")]
    Unauthorized,

    #[error("Unexpected caster response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error("Tunnel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No data from caster for {0}s")]
    Idle(u64),

    #[error("Caster closed the stream")]
    Closed,

    /// Disconnected or redirected before the handshake finished.
    #[error("Tunnel session cancelled")]
    Cancelled,
}
