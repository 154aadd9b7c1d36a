//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let proxy = config
        .caster
        .proxy
        .as_ref()
        .map(|p| p.authority())
        .unwrap_or_default();
    let radio_address = config.radio.address.as_deref().unwrap_or("");

    format!(
        r#"[caster]
; NTRIP caster host name and port
host = {}
port = {}
; Account, leave empty for open casters
username = {}
password = {}
; Mountpoint to stream from. NEAR lets the caster pick from the reported position
mountpoint = {}
; Optional HTTP proxy (host:port) tunneled with CONNECT
proxy = {}

[radio]
; host:port of the rover radio's serial-to-TCP bridge
address = {}
; Outbound buffering:
;   fifo   - every correction is sent, in order
;   latest - only the newest unsent correction is kept, sent once per second
write_policy = {}
; Bytes per radio write (1-512)
chunk_size = {}
; Pause between chunks in milliseconds
inter_chunk_delay_ms = {}
; Retry backoff for a busy radio: retry_base_ms * retry_multiplier^attempt
retry_base_ms = {}
retry_multiplier = {}
max_attempts = {}

[tunnel]
; Reconnect after the caster stream drops
reconnect = {}
reconnect_delay_secs = {}
; How often the rover position is reported upstream
position_interval_secs = {}
; Report position for every mountpoint, not just NEAR
send_position = {}

[selection]
; Pick the nearest mountpoint automatically from the sourcetable
auto_select = {}
; Ignore mountpoints farther than this
radius_km = {}
max_results = {}
; How often the nearest mountpoint is re-evaluated
reselect_interval_secs = {}

[logging]
file = {}
"#,
        config.caster.host,
        config.caster.port,
        config.caster.username,
        config.caster.password,
        config.caster.mountpoint,
        proxy,
        radio_address,
        config.radio.write_policy,
        config.radio.chunk_size,
        config.radio.inter_chunk_delay_ms,
        config.radio.retry_base_ms,
        config.radio.retry_multiplier,
        config.radio.max_attempts,
        config.tunnel.reconnect,
        config.tunnel.reconnect_delay_secs,
        config.tunnel.position_interval_secs,
        config.tunnel.send_position,
        config.selection.auto_select,
        config.selection.radius_km,
        config.selection.max_results,
        config.selection.reselect_interval_secs,
        path_to_string(&config.logging.file),
    )
}

/// Collapse the home directory back to `~` for readability.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::settings::ConfigFile;
    use crate::caster::CasterAddress;
    use crate::radio::WritePolicy;
    use tempfile::TempDir;

    #[test]
    fn test_saved_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.caster.host = "caster.example.org".to_string();
        config.caster.username = "rover".to_string();
        config.caster.password = "secret".to_string();
        config.caster.proxy = Some(CasterAddress::new("proxy.local", 3128));
        config.radio.address = Some("10.0.0.2:5000".to_string());
        config.radio.write_policy = WritePolicy::LatestWins;
        config.selection.radius_km = 12.5;

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_file_has_empty_optionals() {
        let content = super::to_config_string(&ConfigFile::default());
        assert!(content.contains("\nproxy = \n"));
        assert!(content.contains("\naddress = \n"));
        assert!(content.contains("write_policy = fifo"));
    }
}
