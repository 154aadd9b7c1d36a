//! Sourcetable retrieval from a caster.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::error::DirectoryError;
use super::sourcetable::{is_complete, Sourcetable};
use crate::caster::{build_request, read_head, CasterAddress, Credentials, ResponseStatus, MAX_HEAD_SIZE};

/// Default timeout for the whole fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cap on the sourcetable body (1 MiB).
pub const DEFAULT_MAX_SOURCETABLE_SIZE: usize = 1024 * 1024;

/// Fetches a caster's sourcetable over a plain TCP connection.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    caster: CasterAddress,
    credentials: Credentials,
    user_agent: String,
    timeout: Duration,
    max_size: usize,
}

impl DirectoryClient {
    pub fn new(caster: CasterAddress, credentials: Credentials) -> Self {
        Self {
            caster,
            credentials,
            user_agent: crate::user_agent(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_size: DEFAULT_MAX_SOURCETABLE_SIZE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn caster(&self) -> &CasterAddress {
        &self.caster
    }

    /// Connect to the caster and download its sourcetable.
    pub async fn fetch(&self) -> Result<Sourcetable, DirectoryError> {
        tokio::time::timeout(self.timeout, async {
            let address = self.caster.authority();
            let mut stream =
                TcpStream::connect(&address)
                    .await
                    .map_err(|source| DirectoryError::Connect {
                        address: address.clone(),
                        source,
                    })?;
            self.fetch_from(&mut stream).await
        })
        .await
        .map_err(|_| DirectoryError::Timeout(self.timeout.as_secs()))?
    }

    /// Run the sourcetable exchange over an already open stream.
    pub async fn fetch_from<S>(&self, stream: &mut S) -> Result<Sourcetable, DirectoryError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let request = build_request(&self.caster, "", &self.credentials, &self.user_agent);
        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;

        let (head, first) = read_head(stream, MAX_HEAD_SIZE).await?;
        match head.status {
            ResponseStatus::Sourcetable | ResponseStatus::Ok => {}
            ResponseStatus::Unauthorized => return Err(DirectoryError::Unauthorized),
            ResponseStatus::Other(line) => return Err(DirectoryError::UnexpectedResponse(line)),
        }

        let mut body = first.to_vec();
        let mut chunk = [0u8; 4096];
        while !is_complete(&body) {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                debug!(bytes = body.len(), "Caster closed before ENDSOURCETABLE");
                break;
            }
            body.extend_from_slice(&chunk[..n]);
            if body.len() > self.max_size {
                return Err(DirectoryError::TooLarge(self.max_size));
            }
        }

        let table = Sourcetable::parse(&String::from_utf8_lossy(&body));
        info!(
            caster = %self.caster,
            mountpoints = table.mountpoints.len(),
            "Sourcetable fetched"
        );
        Ok(table)
    }
}
