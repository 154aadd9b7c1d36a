//! Tunnel settings and targets.

use std::fmt;
use std::time::Duration;

use crate::caster::{CasterAddress, Credentials};

/// Mountpoint name that asks the caster to pick the nearest base.
pub const NEAREST_MOUNTPOINT: &str = "NEAR";

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_POSITION_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Caster mountpoint to stream from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelTarget {
    pub caster: CasterAddress,
    pub mountpoint: String,
    pub credentials: Credentials,
}

impl TunnelTarget {
    pub fn new(caster: CasterAddress, mountpoint: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            caster,
            mountpoint: mountpoint.into(),
            credentials,
        }
    }

    /// The same caster and account, another mountpoint.
    pub fn with_mountpoint(&self, mountpoint: impl Into<String>) -> Self {
        Self {
            mountpoint: mountpoint.into(),
            ..self.clone()
        }
    }

    pub fn is_nearest(&self) -> bool {
        self.mountpoint.eq_ignore_ascii_case(NEAREST_MOUNTPOINT)
    }
}

impl fmt::Display for TunnelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.caster, self.mountpoint)
    }
}

/// Configuration for [`CorrectionTunnel`](super::CorrectionTunnel).
#[derive(Debug, Clone, PartialEq)]
pub struct TunnelConfig {
    /// HTTP proxy to tunnel through with `CONNECT`.
    pub proxy: Option<CasterAddress>,
    pub reconnect: bool,
    pub reconnect_delay: Duration,
    pub position_interval: Duration,
    /// Report the position for every mountpoint, not just `NEAR`.
    pub send_position: bool,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub handshake_timeout: Duration,
    /// A stream silent for this long is treated as closed.
    pub idle_timeout: Duration,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            reconnect: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            position_interval: DEFAULT_POSITION_INTERVAL,
            send_position: false,
            user_agent: crate::user_agent(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_is_case_insensitive() {
        let target = TunnelTarget::new(
            CasterAddress::new("caster.example.org", 2101),
            "near",
            Credentials::default(),
        );
        assert!(target.is_nearest());
        assert!(!target.with_mountpoint("NEAR_ME").is_nearest());
    }

    #[test]
    fn test_target_display() {
        let target = TunnelTarget::new(
            CasterAddress::new("caster.example.org", 2101),
            "TLSE00FRA0",
            Credentials::default(),
        );
        assert_eq!(target.to_string(), "caster.example.org:2101/TLSE00FRA0");
    }
}
