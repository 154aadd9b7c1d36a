//! Error types for sourcetable retrieval.

use thiserror::Error;

use crate::caster::ResponseError;

/// Errors that can occur when fetching a sourcetable.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Could not reach the caster.
    #[error("Failed to connect to caster {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while exchanging the request.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or truncated response head.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Caster rejected the credentials.
    #[error("Caster rejected the credentials")]
    Unauthorized,

    /// Caster answered with something other than a sourcetable.
    #[error("Unexpected caster response: {0}")]
    UnexpectedResponse(String),

    /// The sourcetable exceeded the size limit.
    #[error("Sourcetable exceeds {0} bytes")]
    TooLarge(usize),

    /// Fetching took longer than the configured timeout.
    #[error("Sourcetable fetch timed out after {0}s")]
    Timeout(u64),
}
