//! Mountpoint request and response classification.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::config::TunnelTarget;
use super::error::TunnelError;
use crate::caster::{build_request, read_head, ResponseStatus, MAX_HEAD_SIZE};

/// Request the mountpoint and wait for the response head.
///
/// Returns the body bytes that arrived with the head; they are the first frame.
pub(crate) async fn handshake<S>(
    stream: &mut S,
    target: &TunnelTarget,
    user_agent: &str,
) -> Result<Bytes, TunnelError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = build_request(&target.caster, &target.mountpoint, &target.credentials, user_agent);
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    let (head, leftover) = read_head(stream, MAX_HEAD_SIZE).await?;
    match head.status {
        ResponseStatus::Ok => Ok(leftover),
        ResponseStatus::Sourcetable => Err(TunnelError::MountpointNotFound(target.mountpoint.clone())),
        ResponseStatus::Unauthorized => Err(TunnelError::Unauthorized),
        ResponseStatus::Other(line) => Err(TunnelError::UnexpectedResponse(line)),
    }
}
