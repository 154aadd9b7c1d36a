//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file, plus the
//! conversion into the component configuration it feeds.

use std::path::PathBuf;
use std::time::Duration;

use crate::caster::{CasterAddress, Credentials};
use crate::directory::RankOptions;
use crate::pipeline::CorrectionLoopConfig;
use crate::radio::{ChunkConfig, RetryPolicy, TransportConfig, WritePolicy};
use crate::tunnel::{TunnelConfig, TunnelTarget};

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub caster: CasterSettings,
    pub radio: RadioSettings,
    pub tunnel: TunnelSettings,
    pub selection: SelectionSettings,
    pub logging: LoggingSettings,
}

/// NTRIP caster account.
#[derive(Debug, Clone, PartialEq)]
pub struct CasterSettings {
    /// Caster host name; empty when not configured
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Mountpoint to stream from (`NEAR` lets the caster choose)
    pub mountpoint: String,
    /// Optional HTTP proxy
    pub proxy: Option<CasterAddress>,
}

/// Rover radio link.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioSettings {
    /// `host:port` of the radio's serial-to-TCP bridge
    pub address: Option<String>,
    pub write_policy: WritePolicy,
    pub chunk_size: usize,
    pub inter_chunk_delay_ms: u64,
    pub retry_base_ms: u64,
    pub retry_multiplier: f64,
    pub max_attempts: u32,
}

/// Correction tunnel behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct TunnelSettings {
    pub reconnect: bool,
    pub reconnect_delay_secs: u64,
    pub position_interval_secs: u64,
    /// Report position for every mountpoint, not just NEAR
    pub send_position: bool,
}

/// Nearest-mountpoint selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSettings {
    pub auto_select: bool,
    pub radius_km: f64,
    pub max_results: usize,
    pub reselect_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl CasterSettings {
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
    }

    pub fn address(&self) -> CasterAddress {
        CasterAddress::new(self.host.trim(), self.port)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    /// Target for the configured mountpoint.
    pub fn target(&self) -> TunnelTarget {
        TunnelTarget::new(self.address(), &self.mountpoint, self.credentials())
    }
}

impl RadioSettings {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            policy: self.write_policy,
            chunk: ChunkConfig {
                chunk_size: self.chunk_size,
                inter_chunk_delay: Duration::from_millis(self.inter_chunk_delay_ms),
            },
            retry: RetryPolicy {
                base_delay: Duration::from_millis(self.retry_base_ms),
                multiplier: self.retry_multiplier,
                max_attempts: self.max_attempts,
            },
            ..TransportConfig::default()
        }
    }
}

impl TunnelSettings {
    pub fn tunnel_config(&self, proxy: Option<CasterAddress>) -> TunnelConfig {
        TunnelConfig {
            proxy,
            reconnect: self.reconnect,
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            position_interval: Duration::from_secs(self.position_interval_secs),
            send_position: self.send_position,
            ..TunnelConfig::default()
        }
    }
}

impl SelectionSettings {
    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            radius_km: self.radius_km,
            max_results: self.max_results,
        }
    }

    pub fn loop_config(&self) -> CorrectionLoopConfig {
        CorrectionLoopConfig {
            auto_select: self.auto_select,
            rank: self.rank_options(),
            reselect_interval: Duration::from_secs(self.reselect_interval_secs),
        }
    }
}

impl ConfigFile {
    pub fn tunnel_config(&self) -> TunnelConfig {
        self.tunnel.tunnel_config(self.caster.proxy.clone())
    }
}
