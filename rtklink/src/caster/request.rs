//! Request line and headers sent to a caster.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Host and port of an NTRIP caster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CasterAddress {
    pub host: String,
    pub port: u16,
}

impl CasterAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port` form used for dialing and the `Host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for CasterAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Caster account. Either part may be empty for open casters.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// `Basic <base64(user:pass)>` header value.
pub fn basic_authorization(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.username, credentials.password);
    format!("Basic {}", STANDARD.encode(raw))
}

/// Build the request for a mountpoint; an empty mountpoint requests the sourcetable.
pub fn build_request(
    caster: &CasterAddress,
    mountpoint: &str,
    credentials: &Credentials,
    user_agent: &str,
) -> String {
    let path = mountpoint.trim_start_matches('/');
    format!(
        "GET /{path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Authorization: {auth}\r\n\
         User-Agent: {user_agent}\r\n\
         Accept: */*\r\n\
         Connection: close\r\n\
         \r\n",
        host = caster.authority(),
        auth = basic_authorization(credentials),
    )
}
