//! Link lifecycle states.

use std::fmt;

/// Connection state of the radio link.
///
/// ```text
/// Disconnected -> Connecting -> Connected -> Disconnecting -> Disconnected
/// ```
///
/// A device-initiated disconnect jumps straight back to `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl LinkState {
    /// Only a connected link accepts writes and delivers notifications.
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}
