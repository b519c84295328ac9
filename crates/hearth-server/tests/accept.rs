use hearth_http::{Request, Response, Result as HttpResult, Status};
use hearth_server::{run_async_with_shutdown, Config, Shutdown};
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

fn handler(request: Request) -> HttpResult<Response> {
    Ok(Response::new(Status::Ok).with_content(format!("hello {}", request.url().full_path())))
}

#[tokio::test]
async fn serves_requests_until_shut_down() {
    let config = Config::new().with_port(0).with_host("127.0.0.1").without_signals();
    let shutdown = Shutdown::new();
    let shutdown_clone = shutdown.clone();

    // bind on an ephemeral port ourselves so the test can connect without a race.
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let config = config.with_port(addr.port());

    let server = tokio::spawn(run_async_with_shutdown(config, handler, shutdown_clone));

    // give the accept loop a moment to bind.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /chat HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8(response).unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("hello /chat"));

    shutdown.stop();
    tokio::time::timeout(Duration::from_secs(1), server)
        .await
        .expect("server should shut down promptly")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn rejects_connections_once_at_capacity() {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config::new()
        .with_port(addr.port())
        .with_host("127.0.0.1")
        .without_signals()
        .with_max_connections(0);
    let shutdown = Shutdown::new();
    let shutdown_clone = shutdown.clone();

    let server = tokio::spawn(run_async_with_shutdown(config, handler, shutdown_clone));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8(response).unwrap();
    assert!(response.starts_with("HTTP/1.1 503"));

    shutdown.stop();
    tokio::time::timeout(Duration::from_secs(1), server).await.unwrap().unwrap().unwrap();
}
