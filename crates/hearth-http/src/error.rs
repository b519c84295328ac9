use crate::{HeaderName, Status, Version};
use std::num::TryFromIntError;
use thiserror::Error;

/// Concrete errors that occur while reading, parsing, or writing an HTTP/1.1
/// connection.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// [`std::io::Error`]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// the peer closed the connection before sending a complete request
    #[error("connection closed by client")]
    Closed,

    /// headers exceeded `HttpConfig::max_size_headers`
    #[error("headers were malformed or longer than allowed")]
    HeadersTooLong,

    /// a well-formed but unparseable request line
    #[error("partial or invalid HTTP head")]
    InvalidHead,

    /// the request line named a method hearth does not recognize
    #[error("unrecognized method {0}")]
    UnrecognizedMethod(String),

    /// the request line was missing a method entirely
    #[error("missing method")]
    MissingMethod,

    /// the request named a method hearth recognizes but does not route
    /// (surfaced as a 501)
    #[error("unsupported method {0}")]
    UnsupportedMethod(crate::Method),

    /// request path was missing from the request line
    #[error("request path missing")]
    RequestPathMissing,

    /// we could not parse the HTTP version token
    #[error("invalid or missing version")]
    InvalidVersion,

    /// we parsed a version we do not implement
    #[error("unsupported version {0}")]
    UnsupportedVersion(Version),

    /// a status code outside the registry this crate recognizes
    #[error("invalid status code")]
    InvalidStatus,

    /// header name failed to parse
    #[error("invalid or unparseable header name")]
    InvalidHeaderName,

    /// header value failed to parse, or was not valid for its header
    #[error("invalid or unparseable header value for header: {0}")]
    InvalidHeaderValue(HeaderName<'static>),

    /// a header appeared in a context that does not make sense, such as a
    /// duplicate `Host`, or both `Content-Length` and `Transfer-Encoding:
    /// chunked`
    #[error("unexpected header: {0}")]
    UnexpectedHeader(HeaderName<'static>),

    /// a POST/PUT with no Content-Length
    #[error("length required")]
    LengthRequired,

    /// body exceeded `HttpConfig::max_size_post_content`
    #[error("received body too long, maximum {0} bytes")]
    EntityTooLarge(u64),

    /// a malformed `multipart/form-data` body
    #[error("malformed multipart body: {0}")]
    MalformedMultipart(String),

    /// no bytes arrived on the socket within `HttpConfig::idle_timeout_ms`,
    /// either between requests or while reading a request's head
    #[error("connection idle for longer than the configured timeout")]
    IdleTimeout,

    /// [`TryFromIntError`]
    #[error(transparent)]
    TryFromIntError(#[from] TryFromIntError),

    /// a handler-raised error carrying the status it would like surfaced,
    /// and an optional message to include in the body when
    /// `output_exception_information` is enabled.
    #[error("handler error {status}: {message:?}")]
    Handler {
        /// the status code the handler would like surfaced
        status: Status,
        /// an optional diagnostic message
        message: Option<String>,
    },
}

impl Error {
    /// maps this error to the status code it should produce a response
    /// with, for errors that produce a response rather than a silent close.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::UnrecognizedMethod(_) | Error::UnsupportedMethod(_) => {
                Some(Status::NotImplemented)
            }
            Error::LengthRequired => Some(Status::LengthRequired),
            Error::EntityTooLarge(_) => Some(Status::PayloadTooLarge),
            Error::InvalidHead
            | Error::MissingMethod
            | Error::RequestPathMissing
            | Error::InvalidVersion
            | Error::InvalidStatus
            | Error::InvalidHeaderName
            | Error::InvalidHeaderValue(_)
            | Error::UnexpectedHeader(_)
            | Error::MalformedMultipart(_) => Some(Status::BadRequest),
            Error::UnsupportedVersion(_) => Some(Status::HttpVersionNotSupported),
            Error::Handler { status, .. } => Some(*status),
            Error::IdleTimeout => Some(Status::RequestTimeout),
            Error::Io(_) | Error::Closed | Error::HeadersTooLong | Error::TryFromIntError(_) => {
                None
            }
        }
    }
}

/// this crate's result type
pub type Result<T> = std::result::Result<T, Error>;
