#![forbid(unsafe_code)]

//! Tokio accept loop for `hearth_http`: binds a TCP listener, spawns one
//! task per connection, and drives each through
//! [`hearth_http::serve_connection`].
//!
//! ```rust,no_run
//! fn main() -> std::io::Result<()> {
//!     hearth_server::run(hearth_server::config(), |request: hearth_http::Request| {
//!         Ok(hearth_http::Response::new(hearth_http::Status::Ok).with_content("hello"))
//!     })
//! }
//! ```
//!
//! TLS is a seam, not a feature: [`Acceptor`] wraps the accepted transport
//! before the connection loop ever sees it, and `()` (the default) is a
//! no-op passthrough. [`Config::with_secure_port`]/[`Config::with_certificate_path`]
//! are accepted and reported so an `Acceptor` implementation can read them,
//! but nothing in this crate terminates TLS on its own.

mod accept;
mod acceptor;
mod config;
mod shutdown;
mod transport;

pub use accept::{run, run_async, run_async_with_shutdown};
pub use acceptor::Acceptor;
pub use config::Config;
pub use shutdown::{ConnectionGuard, Shutdown};
pub use transport::TokioTransport;

pub use async_compat;
pub use tokio;

/// a default [`Config`] with the no-op `()` acceptor. see [`Config::default`]
/// for what the defaults are.
pub fn config() -> Config<()> {
    Config::new()
}
