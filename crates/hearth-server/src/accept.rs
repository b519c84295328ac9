use crate::{Acceptor, Config, Shutdown, TokioTransport};
use async_compat::Compat;
use hearth_http::Handler;
use std::{io::Result, sync::Arc};
use tokio::{io::AsyncWriteExt, net::TcpListener};

const SERVICE_UNAVAILABLE: &[u8] =
    b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

/// bind and serve `handler` until [`Shutdown::stop`] is called (directly, or
/// via the signal handler installed when [`Config::register_signals`] is
/// set). blocks until every in-flight connection has drained or
/// [`Config::drain_timeout`] elapses.
pub async fn run_async<A, H>(config: Config<A>, handler: H) -> Result<()>
where
    A: Acceptor<TokioTransport<Compat<tokio::net::TcpStream>>>,
    H: Handler + Send + Sync + 'static,
{
    run_async_with_shutdown(config, handler, Shutdown::new()).await
}

/// like [`run_async`], but with a [`Shutdown`] handle the caller already
/// holds, so it can trigger the stop from outside the accept loop.
pub async fn run_async_with_shutdown<A, H>(config: Config<A>, handler: H, shutdown: Shutdown) -> Result<()>
where
    A: Acceptor<TokioTransport<Compat<tokio::net::TcpStream>>>,
    H: Handler + Send + Sync + 'static,
{
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    log::info!("hearth-server listening on {}", listener.local_addr()?);

    if config.register_signals {
        shutdown.register_signals();
    }

    let handler = Arc::new(handler);
    let http_config = Arc::new(config.http);
    let secure = config.secure_port.is_some();
    let default_port = config.secure_port.unwrap_or(config.port);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        log::error!("accept failed: {e}");
                        continue;
                    }
                };

                if let Some(max) = config.max_connections {
                    if shutdown.active_connections() >= max {
                        log::debug!("rejecting {peer}, at capacity ({max} connections)");
                        let mut stream = stream;
                        let _ = stream.write_all(SERVICE_UNAVAILABLE).await;
                        continue;
                    }
                }

                if config.nodelay {
                    if let Err(e) = stream.set_nodelay(true) {
                        log::debug!("failed to set nodelay for {peer}: {e}");
                    }
                }

                let guard = shutdown.guard();
                let handler = Arc::clone(&handler);
                let http_config = Arc::clone(&http_config);
                let acceptor = config.acceptor.clone();

                tokio::spawn(async move {
                    let _guard = guard;
                    let transport = TokioTransport(Compat::new(stream));
                    match acceptor.accept(transport).await {
                        Ok(transport) => {
                            if let Err(e) =
                                hearth_http::serve_connection(transport, &*handler, &http_config, secure, default_port).await
                            {
                                log::debug!("connection from {peer} closed: {e}");
                            }
                        }
                        Err(e) => log::warn!("acceptor rejected {peer}: {e:?}"),
                    }
                });
            }
            () = shutdown.stopped() => {
                log::info!(
                    "stop requested, draining {} connection(s)",
                    shutdown.active_connections()
                );
                break;
            }
        }
    }

    shutdown.drain(config.drain_timeout).await;
    Ok(())
}

/// block the current thread on [`run_async`], spinning up a multi-thread
/// tokio runtime if one isn't already running.
pub fn run<A, H>(config: Config<A>, handler: H) -> Result<()>
where
    A: Acceptor<TokioTransport<Compat<tokio::net::TcpStream>>>,
    H: Handler + Send + Sync + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle.block_on(run_async(config, handler)),
        Err(_) => tokio::runtime::Runtime::new()?.block_on(run_async(config, handler)),
    }
}
