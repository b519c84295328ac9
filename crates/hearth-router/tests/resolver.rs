use futures_lite::future::block_on;
use futures_lite::io::{AsyncRead, AsyncWrite, Cursor};
use hearth_http::{serve_connection, HttpConfig, Response, Transport};
use hearth_router::{Hook, Resolver};
use std::io::Result as IoResult;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

/// an in-memory transport: reads come from a fixed request buffer, writes
/// land in a shared `Vec<u8>` the test can inspect afterward.
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

fn dispatch(resolver: &Resolver, request: &str) -> String {
    let output = Arc::new(Mutex::new(Vec::new()));
    let transport = MemoryTransport {
        input: Cursor::new(request.as_bytes().to_vec()),
        output: Arc::clone(&output),
    };
    block_on(serve_connection(transport, resolver, &HttpConfig::default(), false, 80)).unwrap();
    String::from_utf8(output.lock().unwrap().clone()).unwrap()
}

fn get(path: &str, host: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n")
}

#[test]
fn matches_exact_path() {
    let resolver = Resolver::new();
    resolver
        .add_handler(Hook::any().with_path("/hello"), |_req| Ok(Response::text("hi")))
        .unwrap();

    let response = dispatch(&resolver, &get("/hello", "example.com"));
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("hi"));
}

#[test]
fn unmatched_path_is_404() {
    let resolver = Resolver::new();
    resolver
        .add_handler(Hook::any().with_path("/hello"), |_req| Ok(Response::text("hi")))
        .unwrap();

    let response = dispatch(&resolver, &get("/other", "example.com"));
    assert!(response.starts_with("HTTP/1.1 404"));
}

#[test]
fn domain_hierarchy_prefers_more_specific_host() {
    let resolver = Resolver::new();
    resolver
        .add_handler(Hook::any(), |_req| Ok(Response::text("catch-all")))
        .unwrap();
    resolver
        .add_handler(Hook::any().with_domain("api.example.com").specific_domain(), |_req| {
            Ok(Response::text("api"))
        })
        .unwrap();

    let response = dispatch(&resolver, &get("/", "api.example.com"));
    assert!(response.ends_with("api"));

    let response = dispatch(&resolver, &get("/", "other.example.com"));
    assert!(response.ends_with("catch-all"));
}

#[test]
fn path_prefix_rewrites_the_nested_request_url() {
    let resolver = Resolver::new();
    resolver
        .add_handler(Hook::any().with_path("/api"), |request| {
            Ok(Response::text(request.url().path().to_string()))
        })
        .unwrap();

    let response = dispatch(&resolver, &get("/api/widgets/42", "example.com"));
    assert!(response.ends_with("/widgets/42"));
}

#[test]
fn skippable_hook_falls_through_to_the_next_match() {
    let resolver = Resolver::new();
    resolver
        .add(
            Hook::any().with_path("/items").skippable(),
            |request: hearth_http::Request| hearth_router::Outcome::NotHandled(request),
        )
        .unwrap();
    resolver
        .add_handler(Hook::any().with_path("/items"), |_req| Ok(Response::text("fallback")))
        .unwrap();

    let response = dispatch(&resolver, &get("/items", "example.com"));
    assert!(response.ends_with("fallback"));
}

#[test]
fn duplicate_non_skippable_hooks_are_rejected() {
    let resolver = Resolver::new();
    resolver
        .add_handler(Hook::any().with_path("/x"), |_req| Ok(Response::text("a")))
        .unwrap();
    let err = resolver
        .add_handler(Hook::any().with_path("/x"), |_req| Ok(Response::text("b")))
        .unwrap_err();
    assert_eq!(err, hearth_router::RouterError::DuplicateHook);
}

#[test]
fn nested_resolver_dispatches_through_a_parent_prefix() {
    let inner = Resolver::new();
    inner
        .add_handler(Hook::any().with_path("/ping"), |_req| Ok(Response::text("pong")))
        .unwrap();

    let outer = Resolver::new();
    outer
        .add(Hook::any().with_path("/api"), Arc::new(inner))
        .unwrap();

    let response = dispatch(&outer, &get("/api/ping", "example.com"));
    assert!(response.ends_with("pong"));
}
