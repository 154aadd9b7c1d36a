//! Network seam and proxy routing.

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::error::TunnelError;
use crate::caster::{read_head, CasterAddress, ResponseStatus, MAX_HEAD_SIZE};

/// Opens byte streams to caster or proxy addresses.
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    fn open(&self, address: &CasterAddress) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Plain TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn open(&self, address: &CasterAddress) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(address.authority()).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Where to dial, and which caster to `CONNECT` to once there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub dial: CasterAddress,
    pub tunnel_to: Option<CasterAddress>,
}

impl Route {
    pub fn derive(caster: &CasterAddress, proxy: Option<&CasterAddress>) -> Self {
        match proxy {
            Some(proxy) => Self {
                dial: proxy.clone(),
                tunnel_to: Some(caster.clone()),
            },
            None => Self {
                dial: caster.clone(),
                tunnel_to: None,
            },
        }
    }

    /// Dial the route and, through a proxy, open the `CONNECT` tunnel.
    pub(crate) async fn establish<C: Connector>(&self, connector: &C) -> Result<C::Stream, TunnelError> {
        let mut stream = connector
            .open(&self.dial)
            .await
            .map_err(|source| TunnelError::Connect {
                address: self.dial.authority(),
                source,
            })?;

        if let Some(caster) = &self.tunnel_to {
            proxy_connect(&mut stream, caster).await?;
            debug!(proxy = %self.dial, caster = %caster, "Proxy tunnel established");
        }
        Ok(stream)
    }
}

async fn proxy_connect<S>(stream: &mut S, caster: &CasterAddress) -> Result<(), TunnelError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let authority = caster.authority();
    let request = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    let (head, _) = read_head(stream, MAX_HEAD_SIZE).await?;
    match head.status {
        ResponseStatus::Ok => Ok(()),
        _ => Err(TunnelError::Proxy(head.status_line)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_without_proxy_dials_caster() {
        let caster = CasterAddress::new("caster.example.org", 2101);
        let route = Route::derive(&caster, None);
        assert_eq!(route.dial, caster);
        assert!(route.tunnel_to.is_none());
    }

    #[test]
    fn test_route_with_proxy() {
        let caster = CasterAddress::new("caster.example.org", 2101);
        let proxy = CasterAddress::new("proxy.local", 3128);
        let route = Route::derive(&caster, Some(&proxy));
        assert_eq!(route.dial, proxy);
        assert_eq!(route.tunnel_to, Some(caster));
    }

    #[tokio::test]
    async fn test_proxy_refusal() {
        let (mut near, mut far) = tokio::io::duplex(1024);
        far.write_all(b"HTTP/1.1 403 Forbidden\r\n\r\n").await.unwrap();

        let caster = CasterAddress::new("caster.example.org", 2101);
        let err = proxy_connect(&mut near, &caster).await.unwrap_err();
        assert!(matches!(err, TunnelError::Proxy(line) if line == "HTTP/1.1 403 Forbidden"));
    }
}
