use futures_lite::io::{AsyncRead, AsyncWrite};
use std::{
    any::Any,
    fmt::{self, Debug},
    io::Result,
    net::SocketAddr,
    ops::Deref,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

/// The interface a connection is communicated over. Implemented for
/// `TcpStream` and any TLS stream wrapping one; all methods are optional.
#[allow(unused)]
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static {
    /// See [`std::net::TcpStream::set_linger`].
    fn set_linger(&mut self, linger: Option<Duration>) -> Result<()> {
        Ok(())
    }

    /// See [`std::net::TcpStream::set_nodelay`].
    fn set_nodelay(&mut self, nodelay: bool) -> Result<()> {
        Ok(())
    }

    /// See [`std::net::TcpStream::set_ttl`].
    fn set_ip_ttl(&mut self, ttl: u32) -> Result<()> {
        Ok(())
    }

    /// the remote peer's address, if this transport has one.
    fn peer_addr(&self) -> Result<Option<SocketAddr>> {
        Ok(None)
    }
}

impl Transport for Box<dyn Transport> {
    fn set_linger(&mut self, linger: Option<Duration>) -> Result<()> {
        (**self).set_linger(linger)
    }

    fn set_nodelay(&mut self, nodelay: bool) -> Result<()> {
        (**self).set_nodelay(nodelay)
    }

    fn set_ip_ttl(&mut self, ttl: u32) -> Result<()> {
        (**self).set_ip_ttl(ttl)
    }

    fn peer_addr(&self) -> Result<Option<SocketAddr>> {
        (**self).peer_addr()
    }
}

trait AnyTransport: Transport + Any {
    fn as_box_any(self: Box<Self>) -> Box<dyn Any>;
    fn as_transport(&self) -> &dyn Transport;
}

impl<T: Transport + Any> AnyTransport for T {
    fn as_box_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_transport(&self) -> &dyn Transport {
        self
    }
}

/// A `Box<dyn Transport + Any>` that supports downcasting back to the
/// concrete transport it was built from. Used to erase the accepted
/// connection type from the connection loop so it doesn't need a generic
/// parameter threaded through every signature.
pub struct BoxedTransport(Box<dyn AnyTransport>);

impl Debug for BoxedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedTransport")
            .field("inner", &"Box<dyn Transport>")
            .finish()
    }
}

impl BoxedTransport {
    pub fn new<T: Transport + Any>(t: T) -> Self {
        Self(Box::new(t))
    }

    /// attempt to recover the concrete transport this was built from.
    #[must_use = "downcasting takes the inner transport, so you should use it"]
    pub fn downcast<T: 'static>(self) -> Option<Box<T>> {
        self.0.as_box_any().downcast().ok()
    }
}

impl Deref for BoxedTransport {
    type Target = dyn Transport;

    fn deref(&self) -> &Self::Target {
        self.0.as_transport()
    }
}

impl AsyncRead for BoxedTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<Result<usize>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl AsyncWrite for BoxedTransport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        Pin::new(&mut self.0).poll_close(cx)
    }
}

impl Transport for BoxedTransport {
    fn set_linger(&mut self, linger: Option<Duration>) -> Result<()> {
        self.0.set_linger(linger)
    }

    fn set_nodelay(&mut self, nodelay: bool) -> Result<()> {
        self.0.set_nodelay(nodelay)
    }

    fn set_ip_ttl(&mut self, ttl: u32) -> Result<()> {
        self.0.set_ip_ttl(ttl)
    }

    fn peer_addr(&self) -> Result<Option<SocketAddr>> {
        self.0.peer_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::io::Cursor;

    impl Transport for Cursor<Vec<u8>> {}

    #[test]
    fn downcast_round_trips() {
        let boxed = BoxedTransport::new(Cursor::new(vec![1, 2, 3]));
        let downcast: Option<Box<Cursor<Vec<u8>>>> = boxed.downcast();
        assert!(downcast.is_some());
    }

    #[test]
    fn downcast_to_wrong_type_fails() {
        let boxed = BoxedTransport::new(Cursor::new(vec![1, 2, 3]));
        let downcast: Option<Box<String>> = boxed.downcast();
        assert!(downcast.is_none());
    }
}
