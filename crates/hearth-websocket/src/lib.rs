#![forbid(unsafe_code)]

/*!
# A websocket upgrade handler for `hearth_http`

There are two primary ways to use this crate.

## With an async function that receives a [`WebSocketConn`]

This is the simplest way to use it, but doesn't provide any of the
affordances of implementing [`WebSocketHandler`] directly, such as holding
configuration or shared state alongside the handler. The `WebSocketConn` is
fully owned here, and disconnects when dropped, not when the async function
passed to [`websocket`] completes.

```
use hearth_websocket::{websocket, Message, WebSocketConn};

let handler = websocket(|mut conn: WebSocketConn| async move {
    while let Ok(Some(Message::Text(input))) = conn.read_message().await {
        let _ = conn.send_text(format!("received your message: {input}")).await;
    }
});
```

## Implementing [`WebSocketHandler`]

Implement the trait directly for a named handler type, e.g. one that closes
over a shared connection registry or other server-wide state.

Unlike most websocket libraries built on `async-tungstenite`, frame parsing
and emission here is hand-written against RFC 6455 directly, so this crate
has no dependency on a general-purpose websocket implementation.
*/

mod connection;
mod error;
mod frame;
mod handler;
mod handshake;
mod message;
mod opcode;

pub use connection::WebSocketConn;
pub use error::{Error, Result};
pub use handler::{websocket, WebSocket, WebSocketHandler};
pub use handshake::{accept_hash, generate_key};
pub use message::Message;
pub use opcode::Opcode;
