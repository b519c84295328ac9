use async_compat::Compat;
use futures_lite::io::{AsyncRead, AsyncWrite};
use hearth_http::Transport;
use std::{
    io::Result,
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::net::TcpStream;

/// a [`hearth_http::Transport`] newtype over a tokio stream, bridged through
/// [`async_compat::Compat`] since `hearth_http` reads and writes against
/// `futures_lite`'s io traits rather than tokio's.
#[derive(Debug)]
pub struct TokioTransport<T>(pub(crate) T);

impl<T> TokioTransport<T> {
    /// returns the contained type
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for TokioTransport<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> AsyncRead for TokioTransport<T>
where
    T: Unpin + AsyncRead,
{
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<Result<usize>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl<T> AsyncWrite for TokioTransport<T>
where
    T: Unpin + AsyncWrite,
{
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        Pin::new(&mut self.0).poll_close(cx)
    }
}

impl Transport for TokioTransport<Compat<TcpStream>> {
    fn peer_addr(&self) -> Result<Option<SocketAddr>> {
        self.0.get_ref().peer_addr().map(Some)
    }

    fn set_ip_ttl(&mut self, ttl: u32) -> Result<()> {
        self.0.get_mut().set_ttl(ttl)
    }

    fn set_nodelay(&mut self, nodelay: bool) -> Result<()> {
        self.0.get_mut().set_nodelay(nodelay)
    }
}
