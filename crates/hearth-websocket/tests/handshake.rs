use futures_lite::future::block_on;
use futures_lite::io::{AsyncRead, AsyncWrite, Cursor};
use hearth_http::{serve_connection, HttpConfig, Transport};
use hearth_websocket::{websocket, Message};
use std::io::Result as IoResult;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

/// an in-memory transport: reads come from a fixed input buffer, writes
/// land in a shared `Vec<u8>` the test can inspect afterward. unlike
/// `hearth-router`'s version, the websocket handler keeps reading after the
/// head is written, so the input buffer carries the handshake request
/// followed immediately by the client's first frame.
struct MemoryTransport {
    input: Cursor<Vec<u8>>,
    output: Arc<Mutex<Vec<u8>>>,
}

impl AsyncRead for MemoryTransport {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        Pin::new(&mut self.input).poll_read(cx, buf)
    }
}

impl AsyncWrite for MemoryTransport {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<IoResult<usize>> {
        self.output.lock().expect("output mutex poisoned").extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        Poll::Ready(Ok(()))
    }
}

impl Transport for MemoryTransport {}

fn handshake_request(key: &str) -> String {
    format!(
        "GET /chat HTTP/1.1\r\n\
         Host: example.com\r\n\
         Connection: Upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: {key}\r\n\r\n"
    )
}

fn masked_text_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x81, 0x80 | payload.len() as u8];
    frame.extend_from_slice(&[0, 0, 0, 0]);
    frame.extend_from_slice(payload);
    frame
}

fn masked_close_frame() -> Vec<u8> {
    vec![0x88, 0x80, 0, 0, 0, 0]
}

#[test]
fn handshake_returns_the_rfc_accept_hash() {
    let key = "dGhlIHNhbXBsZSBub25jZQ==";
    let mut wire = handshake_request(key).into_bytes();
    wire.extend_from_slice(&masked_close_frame());

    let output = Arc::new(Mutex::new(Vec::new()));
    let transport = MemoryTransport {
        input: Cursor::new(wire),
        output: Arc::clone(&output),
    };

    let handler = websocket(|mut conn| async move {
        let _ = conn.read_message().await;
    });

    block_on(serve_connection(transport, &handler, &HttpConfig::default(), false, 80)).unwrap();

    let response = String::from_utf8(output.lock().unwrap().clone()).unwrap();
    assert!(response.starts_with("HTTP/1.1 101"));
    assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
    assert!(response.contains("Upgrade: websocket\r\n"));
}

#[test]
fn echoes_a_text_message_then_closes() {
    let mut wire = handshake_request("x3JJHMbDL1EzLkh9GBhXDw==").into_bytes();
    wire.extend_from_slice(&masked_text_frame(b"hello"));
    wire.extend_from_slice(&masked_close_frame());

    let output = Arc::new(Mutex::new(Vec::new()));
    let transport = MemoryTransport {
        input: Cursor::new(wire),
        output: Arc::clone(&output),
    };

    let handler = websocket(|mut conn| async move {
        while let Ok(Some(message)) = conn.read_message().await {
            if let Message::Text(text) = message {
                let _ = conn.send_text(format!("echo: {text}")).await;
            }
        }
    });

    block_on(serve_connection(transport, &handler, &HttpConfig::default(), false, 80)).unwrap();

    let written = output.lock().unwrap().clone();
    let head_end = written.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    let frames = &written[head_end..];

    assert_eq!(frames[0], 0x81);
    assert_eq!(frames[1], b"echo: hello".len() as u8);
    assert_eq!(&frames[2..], b"echo: hello");
}

#[test]
fn non_upgrade_request_falls_through() {
    let request = "GET /chat HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n";
    let output = Arc::new(Mutex::new(Vec::new()));
    let transport = MemoryTransport {
        input: Cursor::new(request.as_bytes().to_vec()),
        output: Arc::clone(&output),
    };

    let handler = websocket(|mut conn| async move {
        let _ = conn.read_message().await;
    })
    .required();

    block_on(serve_connection(transport, &handler, &HttpConfig::default(), false, 80)).unwrap();

    let response = String::from_utf8(output.lock().unwrap().clone()).unwrap();
    assert!(response.starts_with("HTTP/1.1 426"));
}
