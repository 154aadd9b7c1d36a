//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::defaults::MAX_CHUNK_SIZE;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::caster::CasterAddress;
use crate::radio::WritePolicy;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [caster] section
    if let Some(section) = ini.section(Some("caster")) {
        if let Some(v) = section.get("host") {
            config.caster.host = v.trim().to_string();
        }
        if let Some(v) = section.get("port") {
            config.caster.port = parse_number("caster", "port", v)?;
        }
        if let Some(v) = section.get("username") {
            config.caster.username = v.trim().to_string();
        }
        if let Some(v) = section.get("password") {
            config.caster.password = v.to_string();
        }
        if let Some(v) = section.get("mountpoint") {
            let v = v.trim();
            if !v.is_empty() {
                config.caster.mountpoint = v.to_string();
            }
        }
        if let Some(v) = section.get("proxy") {
            let v = v.trim();
            if !v.is_empty() {
                config.caster.proxy = Some(parse_address(v).ok_or_else(|| {
                    invalid("caster", "proxy", v, "expected host:port")
                })?);
            }
        }
    }

    // [radio] section
    if let Some(section) = ini.section(Some("radio")) {
        if let Some(v) = section.get("address") {
            let v = v.trim();
            if !v.is_empty() {
                if parse_address(v).is_none() {
                    return Err(invalid("radio", "address", v, "expected host:port"));
                }
                config.radio.address = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("write_policy") {
            config.radio.write_policy = WritePolicy::from_str(v)
                .map_err(|reason| invalid("radio", "write_policy", v, &reason))?;
        }
        if let Some(v) = section.get("chunk_size") {
            let size: usize = parse_number("radio", "chunk_size", v)?;
            if size == 0 || size > MAX_CHUNK_SIZE {
                return Err(invalid(
                    "radio",
                    "chunk_size",
                    v,
                    &format!("must be between 1 and {}", MAX_CHUNK_SIZE),
                ));
            }
            config.radio.chunk_size = size;
        }
        if let Some(v) = section.get("inter_chunk_delay_ms") {
            config.radio.inter_chunk_delay_ms = parse_number("radio", "inter_chunk_delay_ms", v)?;
        }
        if let Some(v) = section.get("retry_base_ms") {
            config.radio.retry_base_ms = parse_number("radio", "retry_base_ms", v)?;
        }
        if let Some(v) = section.get("retry_multiplier") {
            let multiplier: f64 = parse_number("radio", "retry_multiplier", v)?;
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(invalid("radio", "retry_multiplier", v, "must be at least 1.0"));
            }
            config.radio.retry_multiplier = multiplier;
        }
        if let Some(v) = section.get("max_attempts") {
            config.radio.max_attempts = parse_at_least_one("radio", "max_attempts", v)?;
        }
    }

    // [tunnel] section
    if let Some(section) = ini.section(Some("tunnel")) {
        if let Some(v) = section.get("reconnect") {
            config.tunnel.reconnect = parse_bool(v);
        }
        if let Some(v) = section.get("reconnect_delay_secs") {
            config.tunnel.reconnect_delay_secs = parse_number("tunnel", "reconnect_delay_secs", v)?;
        }
        if let Some(v) = section.get("position_interval_secs") {
            config.tunnel.position_interval_secs =
                parse_at_least_one("tunnel", "position_interval_secs", v)?;
        }
        if let Some(v) = section.get("send_position") {
            config.tunnel.send_position = parse_bool(v);
        }
    }

    // [selection] section
    if let Some(section) = ini.section(Some("selection")) {
        if let Some(v) = section.get("auto_select") {
            config.selection.auto_select = parse_bool(v);
        }
        if let Some(v) = section.get("radius_km") {
            let radius: f64 = parse_number("selection", "radius_km", v)?;
            if !radius.is_finite() || radius <= 0.0 {
                return Err(invalid("selection", "radius_km", v, "must be greater than 0"));
            }
            config.selection.radius_km = radius;
        }
        if let Some(v) = section.get("max_results") {
            config.selection.max_results = parse_at_least_one("selection", "max_results", v)?;
        }
        if let Some(v) = section.get("reselect_interval_secs") {
            config.selection.reselect_interval_secs =
                parse_at_least_one("selection", "reselect_interval_secs", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "expected a number"))
}

fn parse_at_least_one<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + From<u8>,
{
    let n: T = parse_number(section, key, value)?;
    if n < T::from(1) {
        return Err(invalid(section, key, value, "must be at least 1"));
    }
    Ok(n)
}

/// Parse `host:port`.
pub(crate) fn parse_address(value: &str) -> Option<CasterAddress> {
    let (host, port) = value.trim().rsplit_once(':')?;
    let port = port.parse().ok()?;
    if host.is_empty() {
        return None;
    }
    Some(CasterAddress::new(host, port))
}

/// Parse a boolean value from config string.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_parse_full_config() {
        let config = load(
            r#"
[caster]
host = caster.example.org
port = 2102
username = rover
password = secret
mountpoint = TLSE00FRA0
proxy = proxy.local:3128

[radio]
address = 192.168.4.1:8080
write_policy = latest
chunk_size = 180
inter_chunk_delay_ms = 0
retry_base_ms = 5
retry_multiplier = 2.0
max_attempts = 6

[tunnel]
reconnect = no
reconnect_delay_secs = 3
position_interval_secs = 5
send_position = true

[selection]
auto_select = false
radius_km = 25.5
max_results = 3
reselect_interval_secs = 120

[logging]
file = /var/log/rtklink.log
"#,
        )
        .unwrap();

        assert_eq!(config.caster.host, "caster.example.org");
        assert_eq!(config.caster.port, 2102);
        assert_eq!(config.caster.mountpoint, "TLSE00FRA0");
        assert_eq!(
            config.caster.proxy,
            Some(CasterAddress::new("proxy.local", 3128))
        );
        assert_eq!(config.radio.address.as_deref(), Some("192.168.4.1:8080"));
        assert_eq!(config.radio.write_policy, WritePolicy::LatestWins);
        assert_eq!(config.radio.chunk_size, 180);
        assert_eq!(config.radio.inter_chunk_delay_ms, 0);
        assert_eq!(config.radio.max_attempts, 6);
        assert!(!config.tunnel.reconnect);
        assert_eq!(config.tunnel.position_interval_secs, 5);
        assert!(config.tunnel.send_position);
        assert!(!config.selection.auto_select);
        assert_eq!(config.selection.radius_km, 25.5);
        assert_eq!(config.selection.max_results, 3);
        assert_eq!(config.logging.file, PathBuf::from("/var/log/rtklink.log"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = load("[caster]\nhost = caster.example.org\n").unwrap();
        assert_eq!(config.caster.port, DEFAULT_CASTER_PORT);
        assert_eq!(config.caster.mountpoint, "NEAR");
        assert_eq!(config.radio, ConfigFile::default().radio);
        assert_eq!(config.selection, ConfigFile::default().selection);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            "[caster]\nport = 70000\n",
            "[caster]\nproxy = no-port\n",
            "[radio]\naddress = :80\n",
            "[radio]\nwrite_policy = random\n",
            "[radio]\nchunk_size = 0\n",
            "[radio]\nchunk_size = 1024\n",
            "[radio]\nretry_multiplier = 0.5\n",
            "[radio]\nmax_attempts = 0\n",
            "[tunnel]\nposition_interval_secs = 0\n",
            "[selection]\nradius_km = -1\n",
            "[selection]\nmax_results = abc\n",
        ];
        for content in cases {
            let err = load(content).unwrap_err();
            assert!(
                matches!(err, ConfigFileError::InvalidValue { .. }),
                "{content:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_invalid_value_names_the_key() {
        let err = load("[radio]\nchunk_size = 0\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("radio.chunk_size"));
        assert!(message.contains("between 1 and 512"));
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("localhost:2101"),
            Some(CasterAddress::new("localhost", 2101))
        );
        assert_eq!(parse_address("localhost"), None);
        assert_eq!(parse_address("localhost:port"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("YES"));
        assert!(parse_bool(" on "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("off"));
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs/a.log"), home.join("logs/a.log"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
