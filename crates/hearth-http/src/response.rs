use crate::{cookie::Cookie, transport::BoxedTransport, Content, Headers, KnownHeaderName, Status};
use httpdate::fmt_http_date;
use std::{future::Future, pin::Pin, sync::Arc, time::SystemTime};

/// a future driving a hijacked connection after a protocol upgrade, e.g. a
/// WebSocket frame loop.
pub type UpgradeFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// something that takes ownership of the raw transport once the connection
/// loop has written the upgrade response's head, such as a WebSocket frame
/// reader/writer.
pub trait UpgradeHandler: Send + Sync {
    fn upgrade(&self, transport: BoxedTransport) -> UpgradeFuture;
}

/// `Connection` response header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connection {
    #[default]
    None,
    Close,
    KeepAlive,
}

/// `Content-Encoding` response header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEncoding {
    #[default]
    Identity,
    Gzip,
    Compress,
    Deflate,
}

/// `Transfer-Encoding` response header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    #[default]
    None,
    Chunked,
}

/// how eagerly the connection writer should gzip this response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GzipPreference {
    #[default]
    Auto,
    Always,
    Never,
}

/// one directive in a `Cache-Control` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDirective {
    NoCache,
    NoStore,
    NoTransform,
    Public,
    Private,
    MustRevalidate,
    MaxAge(u64),
    SMaxAge(u64),
}

impl std::fmt::Display for CacheDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheDirective::NoCache => f.write_str("no-cache"),
            CacheDirective::NoStore => f.write_str("no-store"),
            CacheDirective::NoTransform => f.write_str("no-transform"),
            CacheDirective::Public => f.write_str("public"),
            CacheDirective::Private => f.write_str("private"),
            CacheDirective::MustRevalidate => f.write_str("must-revalidate"),
            CacheDirective::MaxAge(secs) => write!(f, "max-age={secs}"),
            CacheDirective::SMaxAge(secs) => write!(f, "s-maxage={secs}"),
        }
    }
}

/// A strongly-typed bundle of the response headers the wire codec knows
/// how to serialize. Anything not represented here can still be set via
/// [`Self::extra`], reached through [`Response::headers_mut`].
#[derive(Debug, Clone)]
pub struct ResponseHeaders {
    pub accept_ranges: Option<String>,
    pub age: Option<u64>,
    pub allow: Vec<String>,
    pub cache_control: Vec<CacheDirective>,
    pub connection: Connection,
    pub content_encoding: ContentEncoding,
    pub content_length: Option<u64>,
    pub content_disposition: Option<String>,
    pub content_range: Option<String>,
    pub content_type: String,
    pub date: Option<SystemTime>,
    pub etag: Option<String>,
    pub expires: Option<SystemTime>,
    pub last_modified: Option<SystemTime>,
    pub location: Option<String>,
    pub pragma: Option<String>,
    pub server: Option<String>,
    pub set_cookie: Vec<Cookie>,
    pub transfer_encoding: TransferEncoding,
    /// headers with no dedicated field above, e.g. `Upgrade` and
    /// `Sec-WebSocket-Accept` on a protocol-switching response.
    pub extra: Headers,
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self {
            accept_ranges: None,
            age: None,
            allow: Vec::new(),
            cache_control: Vec::new(),
            connection: Connection::default(),
            content_encoding: ContentEncoding::default(),
            content_length: None,
            content_disposition: None,
            content_range: None,
            content_type: "text/html; charset=utf-8".to_owned(),
            date: None,
            etag: None,
            expires: None,
            last_modified: None,
            location: None,
            pragma: None,
            server: None,
            set_cookie: Vec::new(),
            transfer_encoding: TransferEncoding::default(),
            extra: Headers::new(),
        }
    }
}

impl ResponseHeaders {
    /// materialize this bundle onto a wire [`Headers`] map. `Content-Length`
    /// and `Transfer-Encoding` are decided by the connection writer's
    /// framing logic and are intentionally not emitted here.
    pub(crate) fn write_into(&self, headers: &mut Headers) {
        if let Some(v) = &self.accept_ranges {
            headers.insert(KnownHeaderName::AcceptRanges, v.clone());
        }
        if let Some(v) = self.age {
            headers.insert(KnownHeaderName::Age, v);
        }
        if !self.allow.is_empty() {
            headers.insert(KnownHeaderName::Allow, self.allow.join(", "));
        }
        if !self.cache_control.is_empty() {
            let joined = self
                .cache_control
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            headers.insert(KnownHeaderName::CacheControl, joined);
        }
        match self.connection {
            Connection::None => {}
            Connection::Close => headers.insert(KnownHeaderName::Connection, "close"),
            Connection::KeepAlive => headers.insert(KnownHeaderName::Connection, "keep-alive"),
        }
        if self.content_encoding != ContentEncoding::Identity {
            headers.insert(
                KnownHeaderName::ContentEncoding,
                match self.content_encoding {
                    ContentEncoding::Identity => unreachable!(),
                    ContentEncoding::Gzip => "gzip",
                    ContentEncoding::Compress => "compress",
                    ContentEncoding::Deflate => "deflate",
                },
            );
        }
        if let Some(v) = &self.content_disposition {
            headers.insert(KnownHeaderName::ContentDisposition, v.clone());
        }
        if let Some(v) = &self.content_range {
            headers.insert(KnownHeaderName::ContentRange, v.clone());
        }
        headers.insert(KnownHeaderName::ContentType, self.content_type.clone());
        if let Some(date) = self.date {
            headers.insert(KnownHeaderName::Date, fmt_http_date(date));
        }
        if let Some(v) = &self.etag {
            headers.insert(KnownHeaderName::ETag, v.clone());
        }
        if let Some(expires) = self.expires {
            headers.insert(KnownHeaderName::Expires, fmt_http_date(expires));
        }
        if let Some(last_modified) = self.last_modified {
            headers.insert(KnownHeaderName::LastModified, fmt_http_date(last_modified));
        }
        if let Some(v) = &self.location {
            headers.insert(KnownHeaderName::Location, v.clone());
        }
        if let Some(v) = &self.pragma {
            headers.insert(KnownHeaderName::Pragma, v.clone());
        }
        if let Some(v) = &self.server {
            headers.insert(KnownHeaderName::Server, v.clone());
        }
        if !self.set_cookie.is_empty() {
            headers.insert(
                KnownHeaderName::SetCookie,
                self.set_cookie
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
            );
        }
        for (name, values) in &self.extra {
            headers.insert(name.to_owned(), values.clone());
        }
    }
}

/// A response, ready for the connection writer to frame and stream.
pub struct Response {
    status: Status,
    headers: ResponseHeaders,
    content: Content,
    gzip_preference: GzipPreference,
    upgrade: Option<Arc<dyn UpgradeHandler>>,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content", &self.content)
            .field("gzip_preference", &self.gzip_preference)
            .field("upgrade", &self.upgrade.is_some())
            .finish()
    }
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: ResponseHeaders::default(),
            content: Content::Empty,
            gzip_preference: GzipPreference::default(),
            upgrade: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut ResponseHeaders {
        &mut self.headers
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn into_content(self) -> Content {
        self.content
    }

    pub fn gzip_preference(&self) -> GzipPreference {
        self.gzip_preference
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<Content>) -> Self {
        self.content = content.into();
        self
    }

    #[must_use]
    pub fn with_gzip_preference(mut self, preference: GzipPreference) -> Self {
        self.gzip_preference = preference;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.headers.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.headers.set_cookie.push(cookie);
        self
    }

    /// set a header with no dedicated field on [`ResponseHeaders`].
    #[must_use]
    pub fn with_header(mut self, name: impl Into<crate::HeaderName<'static>>, value: impl Into<crate::HeaderValues>) -> Self {
        self.headers.extra.insert(name, value);
        self
    }

    /// mark this response as a protocol upgrade: once the connection loop
    /// has written the head, it hands the raw transport to `handler` and
    /// ends the request loop for this connection.
    #[must_use]
    pub fn with_upgrade(mut self, handler: impl UpgradeHandler + 'static) -> Self {
        self.upgrade = Some(Arc::new(handler));
        self
    }

    /// take the upgrade handler, if this response carries one.
    pub(crate) fn take_upgrade(&mut self) -> Option<Arc<dyn UpgradeHandler>> {
        self.upgrade.take()
    }

    /// a plain text response
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(Status::Ok)
            .with_content_type("text/plain; charset=utf-8")
            .with_content(body.into())
    }

    /// an html response from a complete string
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(Status::Ok)
            .with_content_type("text/html; charset=utf-8")
            .with_content(body.into())
    }

    /// an html response streamed from a lazy sequence of string chunks, so
    /// the writer can begin sending bytes before the page is fully rendered
    pub fn html_stream(chunks: impl Iterator<Item = String> + Send + 'static) -> Self {
        Self::new(Status::Ok)
            .with_content_type("text/html; charset=utf-8")
            .with_content(Content::Lazy(Box::new(chunks)))
    }

    /// a JSON response from an already-serialized payload
    pub fn json(body: impl Into<Vec<u8>>) -> Self {
        Self::new(Status::Ok)
            .with_content_type("application/json; charset=utf-8")
            .with_content(Content::Bytes(body.into()))
    }

    /// a 3xx redirect
    pub fn redirect(status: Status, location: impl Into<String>) -> Self {
        let mut response = Self::new(status);
        response.headers.location = Some(location.into());
        response
    }

    /// a status-only response with no body, e.g. an error page before a
    /// message is filled in
    pub fn status_only(status: Status) -> Self {
        Self::new(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_content_type_is_html() {
        let response = Response::new(Status::Ok);
        assert_eq!(response.headers().content_type, "text/html; charset=utf-8");
    }

    #[test]
    fn redirect_sets_location() {
        let response = Response::redirect(Status::Found, "/login");
        assert_eq!(response.headers().location.as_deref(), Some("/login"));
    }

    #[test]
    fn write_into_serializes_cache_control_directives() {
        let mut response = Response::new(Status::Ok);
        response.headers_mut().cache_control = vec![CacheDirective::Public, CacheDirective::MaxAge(60)];
        let mut headers = Headers::new();
        response.headers().write_into(&mut headers);
        assert_eq!(headers.get_str(KnownHeaderName::CacheControl), Some("public, max-age=60"));
    }
}
