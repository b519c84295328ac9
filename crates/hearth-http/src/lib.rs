#![forbid(unsafe_code)]

//! The HTTP/1.1 wire protocol: request parsing, response framing, and the
//! connection state machine that ties them together.
//!
//! This crate knows nothing about routing or TLS. It reads a request off a
//! [`Transport`], hands it to a [`Handler`], and writes the [`Response`]
//! back: chunked transfer-encoding, gzip, keep-alive, and
//! 100-continue are all handled here so that callers only have to write
//! `Fn(Request) -> Result<Response>`.

mod body;
mod buffer;
mod bufwriter;
mod chunked_encoder;
mod conn;
mod cookie;
mod error;
mod gzip;
mod headers;
mod http_config;
mod method;
mod multipart;
mod request;
mod response;
mod status;
mod transport;
mod upload;
mod url;
mod version;

pub use body::{Content, ReceivedBody, SpooledBody};
pub(crate) use buffer::Buffer;
pub use chunked_encoder::ChunkedEncoder;
pub use conn::{serve_connection, Handler};
pub use cookie::{Cookie, SameSite};
pub use error::{Error, Result};
pub use headers::{Entry, HeaderName, HeaderValue, HeaderValues, KnownHeaderName, OccupiedEntry, VacantEntry};
pub use http_config::HttpConfig;
pub use method::Method;
pub use request::Request;
pub use response::{
    CacheDirective, Connection, ContentEncoding, GzipPreference, Response, ResponseHeaders, TransferEncoding,
    UpgradeFuture, UpgradeHandler,
};
pub use status::Status;
pub use transport::{BoxedTransport, Transport};
pub use upload::{UploadDescriptor, UploadStorage};
pub use url::Url;
pub use version::Version;

pub(crate) use headers::Headers;
