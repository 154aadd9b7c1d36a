//! Response head parsing.
//!
//! Casters answer in one of three dialects:
//!
//! - NTRIP 1.0 stream: `ICY 200 OK\r\n` and then binary data
//! - NTRIP 1.0 sourcetable: `SOURCETABLE 200 OK\r\n<headers>\r\n\r\n<table>`
//! - NTRIP 2.0: a regular `HTTP/1.1` status line and headers
//!
//! [`read_head`] consumes exactly the head and hands back any body bytes that
//! arrived in the same read.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound on the response head.
pub const MAX_HEAD_SIZE: usize = 8 * 1024;

/// How long an `ICY` head waits for its optional blank line to arrive in a
/// later read before the body is taken as is.
const ICY_BLANK_LINE_WAIT: Duration = Duration::from_millis(250);

/// Errors while reading a response head.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("I/O error reading response: {0}")]
    Io(#[from] std::io::Error),

    #[error("Response head exceeds {0} bytes")]
    HeadTooLarge(usize),

    #[error("Connection closed before a complete response head")]
    ClosedBeforeResponse,
}

/// Classified status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    /// `ICY 200` or `HTTP/1.x 200`: the body is the requested resource.
    Ok,
    /// The caster answered with its sourcetable (unknown mountpoint or a
    /// sourcetable request).
    Sourcetable,
    /// `401`: credentials rejected.
    Unauthorized,
    /// Anything else, with the raw status line.
    Other(String),
}

/// Parsed response head.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status_line: String,
    pub status: ResponseStatus,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut lines = text.split("\r\n").filter(|l| !l.is_empty());
        let status_line = lines.next().unwrap_or("").trim().to_string();

        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        let mut status = classify(&status_line);

        // NTRIP 2.0 sends the sourcetable as a regular 200 with this content type
        let is_table = headers.iter().any(|(k, v)| {
            k.eq_ignore_ascii_case("content-type") && v.eq_ignore_ascii_case("gnss/sourcetable")
        });
        if status == ResponseStatus::Ok && is_table {
            status = ResponseStatus::Sourcetable;
        }

        Self {
            status_line,
            status,
            headers,
        }
    }
}

fn classify(status_line: &str) -> ResponseStatus {
    let mut parts = status_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("ICY"), Some("200")) => ResponseStatus::Ok,
        (Some("SOURCETABLE"), Some("200")) => ResponseStatus::Sourcetable,
        (Some(proto), Some("200")) if proto.starts_with("HTTP/") => ResponseStatus::Ok,
        (Some(proto), Some("401")) if proto.starts_with("HTTP/") => ResponseStatus::Unauthorized,
        _ => ResponseStatus::Other(status_line.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeadEnd {
    head_len: usize,
    body_start: usize,
    /// The buffer stops where an optional blank line may still follow.
    open: bool,
}

/// Locate the end of the head.
fn find_head_end(buf: &[u8]) -> Option<HeadEnd> {
    if buf.starts_with(b"ICY") {
        // Single status line; some casters add an empty line, others go straight to data
        let eol = find(buf, b"\r\n")?;
        let mut body_start = eol + 2;
        let rest = &buf[body_start..];
        if rest.starts_with(b"\r\n") {
            body_start += 2;
        }
        return Some(HeadEnd {
            head_len: eol,
            body_start,
            open: rest.len() < 2 && b"\r\n".starts_with(rest),
        });
    }

    let end = find(buf, b"\r\n\r\n")?;
    Some(HeadEnd {
        head_len: end,
        body_start: end + 4,
        open: false,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Read a response head, returning it along with any body bytes already received.
pub async fn read_head<R>(reader: &mut R, limit: usize) -> Result<(ResponseHead, Bytes), ResponseError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(512);
    let mut waited = false;

    loop {
        if let Some(end) = find_head_end(&buf) {
            if end.open && !waited {
                // One more read, bounded: a caster may hold data until it hears from us
                waited = true;
                let more = tokio::time::timeout(ICY_BLANK_LINE_WAIT, reader.read_buf(&mut buf)).await;
                if let Ok(read) = more {
                    read?;
                }
                continue;
            }
            let head = ResponseHead::parse(&buf[..end.head_len]);
            let body = buf.split_off(end.body_start).freeze();
            return Ok((head, body));
        }

        if buf.len() > limit {
            return Err(ResponseError::HeadTooLarge(limit));
        }

        let n = reader.read_buf(&mut buf).await?;
        if n == 0 {
            return Err(ResponseError::ClosedBeforeResponse);
        }
    }
}
