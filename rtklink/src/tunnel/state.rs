use std::fmt;

/// Lifecycle of the tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TunnelState {
    /// Never connected.
    #[default]
    Idle,
    /// Dialing, proxying or waiting for the handshake response.
    Connecting,
    /// Handshake accepted; frames are flowing.
    Streaming,
    /// Channel closed. May move back to `Connecting` when reconnecting.
    Closed,
}

impl TunnelState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, TunnelState::Streaming)
    }
}

impl fmt::Display for TunnelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TunnelState::Idle => "idle",
            TunnelState::Connecting => "connecting",
            TunnelState::Streaming => "streaming",
            TunnelState::Closed => "closed",
        };
        f.write_str(name)
    }
}
