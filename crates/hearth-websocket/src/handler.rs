use crate::{connection::WebSocketConn, handshake};
use hearth_http::{BoxedTransport, Handler, Request, Response, Result as HttpResult, Status, UpgradeFuture, UpgradeHandler};
use std::{future::Future, pin::Pin, sync::Arc};

/// something that drives one websocket connection to completion.
pub trait WebSocketHandler: Send + Sync + 'static {
    fn handle(&self, conn: WebSocketConn) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

impl<F, Fut> WebSocketHandler for F
where
    F: Fn(WebSocketConn) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn handle(&self, conn: WebSocketConn) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(self(conn))
    }
}

/// a [`hearth_http::Handler`] that negotiates the RFC 6455 upgrade and hands
/// the resulting [`WebSocketConn`] to a [`WebSocketHandler`].
///
/// a request missing the upgrade headers falls through as a plain `200 Ok`
/// by default; [`Self::required`] rejects it with `426 Upgrade Required`
/// instead.
pub struct WebSocket<H> {
    handler: Arc<H>,
    protocols: Vec<String>,
    required: bool,
}

impl<H> std::fmt::Debug for WebSocket<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocket")
            .field("protocols", &self.protocols)
            .field("required", &self.required)
            .finish()
    }
}

/// build a [`WebSocket`] handler from an async function or closure that
/// receives an owned [`WebSocketConn`].
pub fn websocket<H: WebSocketHandler>(handler: H) -> WebSocket<H> {
    WebSocket::new(handler)
}

impl<H: WebSocketHandler> WebSocket<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            protocols: Vec::new(),
            required: false,
        }
    }

    /// a sequence of known subprotocols. on a successful handshake, the
    /// response carries the first of these the client also offered.
    #[must_use]
    pub fn with_protocols(mut self, protocols: &[&str]) -> Self {
        self.protocols = protocols.iter().map(ToString::to_string).collect();
        self
    }

    /// reject non-upgrade requests with `426 Upgrade Required` instead of
    /// passing them through unanswered.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

fn connection_is_upgrade(request: &Request) -> bool {
    request
        .headers()
        .get_str("Connection")
        .is_some_and(|v| v.split(',').any(|token| token.trim().eq_ignore_ascii_case("upgrade")))
}

fn upgrade_to_websocket(request: &Request) -> bool {
    request.headers().eq_ignore_ascii_case("Upgrade", "websocket")
}

fn upgrade_requested(request: &Request) -> bool {
    connection_is_upgrade(request) && upgrade_to_websocket(request)
}

fn negotiate_protocol(request: &Request, protocols: &[String]) -> Option<String> {
    request.headers().get_str("Sec-WebSocket-Protocol").and_then(|value| {
        value
            .split(',')
            .map(str::trim)
            .find(|requested| protocols.iter().any(|known| known == requested))
            .map(str::to_owned)
    })
}

impl<H: WebSocketHandler> Handler for WebSocket<H> {
    fn handle(&self, request: Request) -> HttpResult<Response> {
        if !upgrade_requested(&request) {
            return Ok(if self.required {
                Response::new(Status::UpgradeRequired)
            } else {
                Response::new(Status::Ok)
            });
        }

        let Some(key) = request.headers().get_str("Sec-WebSocket-Key") else {
            return Ok(Response::new(Status::BadRequest));
        };
        let accept = handshake::accept_hash(key);
        let protocol = negotiate_protocol(&request, &self.protocols);
        let path = request.url().full_path();
        let query = request.url().query().to_vec();

        let mut response = Response::new(Status::SwitchingProtocols)
            .with_header("Connection", "Upgrade")
            .with_header("Upgrade", "websocket")
            .with_header("Sec-WebSocket-Version", "13")
            .with_header("Sec-WebSocket-Accept", accept)
            .with_upgrade(WebSocketUpgrade {
                handler: Arc::clone(&self.handler),
                path,
                query,
            });

        if let Some(protocol) = protocol {
            response = response.with_header("Sec-WebSocket-Protocol", protocol);
        }

        Ok(response)
    }
}

struct WebSocketUpgrade<H> {
    handler: Arc<H>,
    path: String,
    query: Vec<(String, Vec<String>)>,
}

impl<H: WebSocketHandler> UpgradeHandler for WebSocketUpgrade<H> {
    fn upgrade(&self, transport: BoxedTransport) -> UpgradeFuture {
        let handler = Arc::clone(&self.handler);
        let conn = WebSocketConn::new(transport, self.path.clone(), self.query.clone());
        Box::pin(async move {
            handler.handle(conn).await;
        })
    }
}
