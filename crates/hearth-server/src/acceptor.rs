use std::{convert::Infallible, fmt::Debug, future::Future};

/// the seam between an accepted transport and the handler loop: a TLS
/// acceptor wraps `Input` (a plain [`crate::TokioTransport`]) in a
/// certificate-negotiating stream here, before [`hearth_http::serve_connection`]
/// ever sees it. no TLS implementation ships in this crate; `()` is the only
/// [`Acceptor`] provided, and it's a no-op passthrough.
pub trait Acceptor<Input>: Clone + Send + Sync + 'static {
    /// the wrapped transport handed to the connection loop.
    type Output: hearth_http::Transport;
    /// why negotiation failed; the connection is dropped and this is logged.
    type Error: Debug + Send + Sync + 'static;

    /// negotiate whatever this acceptor negotiates over `input`.
    fn accept(&self, input: Input) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

impl<Input: hearth_http::Transport> Acceptor<Input> for () {
    type Output = Input;
    type Error = Infallible;

    async fn accept(&self, input: Input) -> Result<Self::Output, Self::Error> {
        Ok(input)
    }
}
