use crate::{
    frame::{read_frame, write_frame},
    Error, Message, Opcode, Result,
};
use hearth_http::BoxedTransport;

/// an upgraded connection, reading and writing websocket frames over the
/// raw transport the connection loop handed off after the 101 handshake.
pub struct WebSocketConn {
    transport: BoxedTransport,
    path: String,
    query: Vec<(String, Vec<String>)>,
    fragment_opcode: Option<Opcode>,
    on_end: Option<Box<dyn FnOnce() + Send>>,
    ended: bool,
}

impl WebSocketConn {
    pub(crate) fn new(transport: BoxedTransport, path: String, query: Vec<(String, Vec<String>)>) -> Self {
        Self {
            transport,
            path,
            query,
            fragment_opcode: None,
            on_end: None,
            ended: false,
        }
    }

    /// the request path this socket was upgraded from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// the first value for `key` in the upgrade request's query string.
    pub fn query_first(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }

    /// register a callback invoked exactly once when this connection ends,
    /// whether via a close frame, a socket error, or EOF.
    pub fn set_on_end(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.on_end = Some(Box::new(callback));
    }

    fn end(&mut self) {
        if !self.ended {
            self.ended = true;
            if let Some(callback) = self.on_end.take() {
                callback();
            }
        }
    }

    /// read the next complete message, reassembling fragments and replying
    /// to pings automatically. `Ok(None)` means the connection ended
    /// (a close frame, a socket error, or EOF); [`Self::set_on_end`]'s
    /// callback has already run by the time this returns.
    pub async fn read_message(&mut self) -> Result<Option<Message>> {
        let mut accumulator = Vec::new();
        let mut message_opcode = None;

        loop {
            let frame = match read_frame(&mut self.transport).await {
                Ok(frame) => frame,
                Err(e) => {
                    self.end();
                    return if matches!(e, Error::Io(_)) { Ok(None) } else { Err(e) };
                }
            };

            match frame.opcode {
                Opcode::Continuation => accumulator.extend_from_slice(&frame.payload),
                Opcode::Text | Opcode::Binary => {
                    message_opcode = Some(frame.opcode);
                    accumulator = frame.payload;
                }
                Opcode::Close => {
                    self.end();
                    return Ok(None);
                }
                Opcode::Ping => {
                    write_frame(&mut self.transport, true, Opcode::Pong, &frame.payload).await?;
                    continue;
                }
                Opcode::Pong => continue,
            }

            if frame.fin {
                let opcode = message_opcode.unwrap_or(Opcode::Binary);
                let message = match opcode {
                    Opcode::Text => {
                        Message::Text(String::from_utf8(accumulator).map_err(|_| Error::InvalidUtf8)?)
                    }
                    _ => Message::Binary(accumulator),
                };
                return Ok(Some(message));
            }
        }
    }

    /// send a whole text message.
    pub async fn send_text(&mut self, text: impl AsRef<str>) -> Result<()> {
        write_frame(&mut self.transport, true, Opcode::Text, text.as_ref().as_bytes()).await
    }

    /// send a whole binary message.
    pub async fn send_binary(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        write_frame(&mut self.transport, true, Opcode::Binary, data.as_ref()).await
    }

    #[cfg(feature = "json")]
    /// serialize `value` and send it as a text message. json messages are
    /// not part of RFC 6455; this is a convenience layered on top of it.
    pub async fn send_json(&mut self, value: &impl serde::Serialize) -> Result<()> {
        self.send_text(serde_json::to_string(value)?).await
    }

    #[cfg(feature = "json")]
    /// read the next message and deserialize it as json. `Ok(None)` means
    /// the connection ended, same as [`Self::read_message`].
    pub async fn read_json<T: serde::de::DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.read_message().await? {
            Some(message) => Ok(Some(serde_json::from_slice(&message.into_bytes())?)),
            None => Ok(None),
        }
    }

    /// begin or continue a fragmented message: the first call's `opcode`
    /// becomes the message's opcode, and later calls are continuations.
    pub async fn send_fragment_continue(&mut self, opcode: Opcode, payload: &[u8]) -> Result<()> {
        let frame_opcode = match self.fragment_opcode.replace(opcode) {
            Some(_) => Opcode::Continuation,
            None => opcode,
        };
        write_frame(&mut self.transport, false, frame_opcode, payload).await
    }

    /// finish a fragmented message with an empty FIN frame.
    pub async fn send_fragment_end(&mut self) -> Result<()> {
        self.fragment_opcode = None;
        write_frame(&mut self.transport, true, Opcode::Continuation, &[]).await
    }

    /// send a close frame with no status payload.
    pub async fn close(&mut self) -> Result<()> {
        write_frame(&mut self.transport, true, Opcode::Close, &[]).await
    }
}

impl std::fmt::Debug for WebSocketConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketConn").field("path", &self.path).finish()
    }
}
