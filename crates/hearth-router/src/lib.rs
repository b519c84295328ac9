#![forbid(unsafe_code)]

//! Scheme/port/domain/path resolution for `hearth_http` requests.
//!
//! A [`Resolver`] holds a sorted list of [`Hook`]s; each dispatch tries them
//! in order, most specific first, rewriting the request's [`hearth_http::Url`]
//! so the matched handler only sees the domain/path suffix it owns. Hooks
//! can be marked [`Hook::skippable`] to form a chain-of-responsibility at
//! the same match point, and a `Resolver` can itself be registered as a
//! handler in another `Resolver`, so routers nest.
//!
//! ```
//! use hearth_http::Response;
//! use hearth_router::{Hook, Resolver};
//!
//! let resolver = Resolver::new();
//! resolver
//!     .add_handler(Hook::any().with_path("/hello"), |_req| {
//!         Ok(Response::text("hello"))
//!     })
//!     .unwrap();
//! ```

mod error;
mod hook;
mod resolver;

pub use error::{Result, RouterError};
pub use hook::{Hook, Scheme};
pub use resolver::{Outcome, Resolver, RouteHandler};
