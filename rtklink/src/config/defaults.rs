//! Default values for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::radio::{
    WritePolicy, DEFAULT_CHUNK_SIZE, DEFAULT_INTER_CHUNK_DELAY, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RETRY_BASE_DELAY, DEFAULT_RETRY_MULTIPLIER,
};
use crate::tunnel::{DEFAULT_POSITION_INTERVAL, DEFAULT_RECONNECT_DELAY, NEAREST_MOUNTPOINT};

/// Standard NTRIP port.
pub const DEFAULT_CASTER_PORT: u16 = 2101;

/// Largest chunk accepted from the config file.
pub const MAX_CHUNK_SIZE: usize = 512;

pub const DEFAULT_RESELECT_INTERVAL_SECS: u64 = crate::pipeline::DEFAULT_RESELECT_INTERVAL.as_secs();

pub const DEFAULT_LOG_FILE_NAME: &str = "rtklink.log";

/// Default log file: ~/.rtklink/rtklink.log
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE_NAME)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            caster: CasterSettings {
                host: String::new(),
                port: DEFAULT_CASTER_PORT,
                username: String::new(),
                password: String::new(),
                mountpoint: NEAREST_MOUNTPOINT.to_string(),
                proxy: None,
            },
            radio: RadioSettings {
                address: None,
                write_policy: WritePolicy::default(),
                chunk_size: DEFAULT_CHUNK_SIZE,
                inter_chunk_delay_ms: DEFAULT_INTER_CHUNK_DELAY.as_millis() as u64,
                retry_base_ms: DEFAULT_RETRY_BASE_DELAY.as_millis() as u64,
                retry_multiplier: DEFAULT_RETRY_MULTIPLIER,
                max_attempts: DEFAULT_MAX_ATTEMPTS,
            },
            tunnel: TunnelSettings {
                reconnect: true,
                reconnect_delay_secs: DEFAULT_RECONNECT_DELAY.as_secs(),
                position_interval_secs: DEFAULT_POSITION_INTERVAL.as_secs(),
                send_position: false,
            },
            selection: SelectionSettings {
                auto_select: true,
                radius_km: crate::directory::DEFAULT_RADIUS_KM,
                max_results: crate::directory::DEFAULT_MAX_RESULTS,
                reselect_interval_secs: DEFAULT_RESELECT_INTERVAL_SECS,
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
