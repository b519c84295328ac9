use crate::{
    bufwriter::BufWriter,
    gzip,
    headers::{HeaderName, HeaderValue},
    response::{Connection as ConnectionHeader, ContentEncoding, GzipPreference, ResponseHeaders, TransferEncoding},
    status::Status,
    transport::{BoxedTransport, Transport},
    Buffer, ChunkedEncoder, Content, Error, Headers, HttpConfig, KnownHeaderName, Method,
    ReceivedBody, Request, Response, Result, Url, Version,
};
use async_compression::futures::bufread::GzipEncoder;
use futures_lite::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader, Cursor};
use memchr::memmem::Finder;
use std::{
    io::Write as _,
    path::Path,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

/// Something that can answer a [`Request`] with a [`Response`].
///
/// Handling is synchronous: the connection state machine runs the handler
/// to completion before moving on to writing the response, same as a
/// request would be served by an ordinary function call. A response built
/// with [`Response::with_upgrade`] hands the raw transport to its handler
/// once the head is written, ending the request loop for this connection.
pub trait Handler: Send + Sync {
    fn handle(&self, request: Request) -> Result<Response>;
}

impl<F> Handler for F
where
    F: Fn(Request) -> Result<Response> + Send + Sync,
{
    fn handle(&self, request: Request) -> Result<Response> {
        self(request)
    }
}

/// Serve one transport for as long as the peer keeps the connection alive,
/// dispatching every request on it to `handler`.
///
/// `secure` and `default_port` describe how this transport was accepted
/// (plain vs. TLS, and which port it's bound to) and are used to resolve
/// origin-form request targets that carry no scheme or port of their own.
pub async fn serve_connection<T, H>(
    mut transport: T,
    handler: &H,
    config: &HttpConfig,
    secure: bool,
    default_port: u16,
) -> Result<()>
where
    T: Transport,
    H: Handler + ?Sized,
{
    let mut buffer = Buffer::with_capacity(config.read_buffer_len);

    loop {
        let request = match read_request(&mut transport, &mut buffer, config, secure, default_port).await {
            Ok(request) => request,
            Err(e) => {
                if let Some(status) = e.status() {
                    let response = error_response(status, &e, config);
                    let _ = write_response(&mut transport, Version::Http1_1, Method::Get, None, false, response, config).await;
                }
                return if matches!(e, Error::Closed) { Ok(()) } else { Err(e) };
            }
        };

        let version = request.version();
        let method = request.method();
        let accept_encoding = request
            .headers()
            .get_str(KnownHeaderName::AcceptEncoding)
            .map(str::to_owned);
        let request_wants_close = request.headers().eq_ignore_ascii_case(KnownHeaderName::Connection, "close");
        let request_wants_keep_alive = request.headers().eq_ignore_ascii_case(KnownHeaderName::Connection, "keep-alive");

        let mut response = match handler.handle(request) {
            Ok(response) => response,
            Err(e) => {
                let status = e.status().unwrap_or(Status::InternalServerError);
                log::error!("handler error: {e}");
                error_response(status, &e, config)
            }
        };

        if let Some(upgrade_handler) = response.take_upgrade() {
            let mut headers_bundle = response.headers().clone();
            headers_bundle.connection = ConnectionHeader::None;
            headers_bundle.transfer_encoding = TransferEncoding::None;
            headers_bundle.content_length = None;
            let head = write_head(version, response.status(), &headers_bundle, config.write_buffer_len);
            transport.write_all(&head).await.map_err(Error::Io)?;
            transport.flush().await.map_err(Error::Io)?;
            upgrade_handler.upgrade(BoxedTransport::new(transport)).await;
            return Ok(());
        }

        let response_wants_close = response.headers().connection == ConnectionHeader::Close;
        let keep_alive = !request_wants_close
            && !response_wants_close
            && (version == Version::Http1_1 || request_wants_keep_alive);

        write_response(&mut transport, version, method, accept_encoding.as_deref(), keep_alive, response, config).await?;

        if !keep_alive {
            return Ok(());
        }
    }
}

fn error_response(status: Status, error: &Error, config: &HttpConfig) -> Response {
    let mut body = format!(
        "<!doctype html><title>{reason}</title><h1>{code} {reason}</h1>",
        code = status as u16,
        reason = status.canonical_reason(),
    );
    if config.output_exception_information() {
        body.push_str(&format!("<pre>{error}</pre>"));
    }
    Response::new(status)
        .with_content_type("text/html; charset=utf-8")
        .with_content(body)
}

// ---- reading the request ----

async fn read_request<T: Transport>(
    transport: &mut T,
    buffer: &mut Buffer,
    config: &HttpConfig,
    secure: bool,
    default_port: u16,
) -> Result<Request> {
    let idle_timeout = Duration::from_millis(config.idle_timeout_ms());
    let head_len = read_until(transport, buffer, b"\r\n\r\n", config.max_size_headers(), idle_timeout).await?;

    let head: Vec<u8> = buffer[..head_len].to_vec();
    let (method, target, version, headers) = parse_request_head(&head)?;
    buffer.ignore_front(head_len);

    validate_headers(&headers)?;

    let url = resolve_url(&target, &headers, secure, default_port)?;

    if version == Version::Http1_1 && headers.eq_ignore_ascii_case(KnownHeaderName::Expect, "100-continue") {
        transport
            .write_all(b"HTTP/1.1 100 Continue\r\n\r\n")
            .await
            .map_err(Error::Io)?;
    }

    let content_length = request_content_length(&headers, method)?;
    let is_chunked = headers.eq_ignore_ascii_case(KnownHeaderName::TransferEncoding, "chunked");

    let body = read_body(transport, buffer, content_length, is_chunked, config).await?;

    Ok(Request::new(
        method,
        url,
        version,
        headers,
        body,
        config.store_file_upload_in_file_at_size(),
        config.temp_dir().to_path_buf(),
    ))
}

/// read into `buf`, aborting with [`Error::IdleTimeout`] if no bytes arrive
/// within `idle_timeout`. racing a fresh timer against each individual read
/// (rather than one timer over the whole connection) is what makes this an
/// *idle* timeout: it keeps resetting as long as the peer keeps sending.
async fn read_with_idle_timeout<T: Transport>(transport: &mut T, buf: &mut [u8], idle_timeout: Duration) -> Result<usize> {
    let read = async { transport.read(buf).await.map_err(Error::Io) };
    let timer = async {
        async_io::Timer::after(idle_timeout).await;
        Err(Error::IdleTimeout)
    };
    futures_lite::future::or(read, timer).await
}

/// accumulate from `transport` into `buffer` until `pattern` is found,
/// returning the offset just past it. bounded by `max_len` total bytes.
async fn read_until<T: Transport>(
    transport: &mut T,
    buffer: &mut Buffer,
    pattern: &[u8],
    max_len: usize,
    idle_timeout: Duration,
) -> Result<usize> {
    let finder = Finder::new(pattern);
    let mut len = buffer.len();

    loop {
        let search_start = len.saturating_sub(pattern.len().saturating_sub(1));
        if let Some(index) = finder.find(&buffer[search_start..]) {
            return Ok(search_start + index + pattern.len());
        }

        if len >= max_len {
            return Err(Error::HeadersTooLong);
        }

        buffer.expand();
        let bytes = read_with_idle_timeout(transport, &mut buffer[len..], idle_timeout).await?;
        len += bytes;
        buffer.truncate(len);

        if bytes == 0 {
            return if len == 0 {
                Err(Error::Closed)
            } else {
                Err(Error::InvalidHead)
            };
        }
    }
}

async fn read_at_least<T: Transport>(
    transport: &mut T,
    buffer: &mut Buffer,
    needed: usize,
    idle_timeout: Duration,
) -> Result<()> {
    let mut len = buffer.len();
    while len < needed {
        buffer.expand();
        let bytes = read_with_idle_timeout(transport, &mut buffer[len..], idle_timeout).await?;
        len += bytes;
        buffer.truncate(len);
        if bytes == 0 {
            return Err(Error::InvalidHead);
        }
    }
    Ok(())
}

fn parse_request_head(head: &[u8]) -> Result<(Method, String, Version, Headers)> {
    let mut raw_headers = [httparse::EMPTY_HEADER; 128];
    let mut parsed = httparse::Request::new(&mut raw_headers);

    let status = parsed.parse(head).map_err(map_httparse_error)?;
    if status.is_partial() {
        return Err(Error::InvalidHead);
    }

    let method = Method::parse(parsed.method.ok_or(Error::MissingMethod)?.as_bytes())?;
    let target = parsed.path.ok_or(Error::RequestPathMissing)?.to_owned();
    let version_bytes: &[u8] = match parsed.version {
        Some(0) => b"HTTP/1.0",
        Some(1) => b"HTTP/1.1",
        _ => return Err(Error::InvalidVersion),
    };
    let version = Version::parse(version_bytes)?;

    let mut headers = Headers::new();
    for header in parsed.headers.iter() {
        let name = HeaderName::parse(header.name.as_bytes())?.to_owned();
        let value = HeaderValue::from(header.value.to_vec());
        headers.append(name, value);
    }

    Ok((method, target, version, headers))
}

fn map_httparse_error(e: httparse::Error) -> Error {
    match e {
        httparse::Error::HeaderName => Error::InvalidHeaderName,
        httparse::Error::TooManyHeaders => Error::HeadersTooLong,
        httparse::Error::Version => Error::InvalidVersion,
        httparse::Error::HeaderValue | httparse::Error::Status | httparse::Error::Token | httparse::Error::NewLine => {
            Error::InvalidHead
        }
        _ => Error::InvalidHead,
    }
}

/// both `Content-Length` and `Transfer-Encoding: chunked` on the
/// same request is nonsensical and rejected outright; a duplicate `Host`
/// header is likewise a 400.
fn validate_headers(headers: &Headers) -> Result<()> {
    let has_length = headers.has_header(KnownHeaderName::ContentLength);
    let is_chunked = headers.eq_ignore_ascii_case(KnownHeaderName::TransferEncoding, "chunked");
    if has_length && is_chunked {
        return Err(Error::UnexpectedHeader(KnownHeaderName::TransferEncoding.into()));
    }

    if headers
        .get_values(KnownHeaderName::Host)
        .map(|values| values.len())
        .unwrap_or(0)
        > 1
    {
        return Err(Error::UnexpectedHeader(KnownHeaderName::Host.into()));
    }

    Ok(())
}

fn request_content_length(headers: &Headers, method: Method) -> Result<Option<u64>> {
    if headers.eq_ignore_ascii_case(KnownHeaderName::TransferEncoding, "chunked") {
        return Ok(None);
    }
    match headers.get_str(KnownHeaderName::ContentLength) {
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidHeaderValue(KnownHeaderName::ContentLength.into())),
        None if method.requires_content_length() => Err(Error::LengthRequired),
        None => Ok(Some(0)),
    }
}

/// absolute-form targets (`http://host:port/path`)
/// carry their own authority; origin-form targets (a bare path) require a
/// `Host` header. Either way a trailing dot on the host is stripped by
/// [`Url::new`].
fn resolve_url(target: &str, headers: &Headers, secure: bool, default_port: u16) -> Result<Url> {
    if let Some(rest) = target.strip_prefix("http://").or_else(|| target.strip_prefix("https://")) {
        let is_secure = target.starts_with("https://");
        let (authority, path_and_query) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };
        let (host, port) = split_host_port(authority, if is_secure { 443 } else { 80 });
        let (path, query) = split_path_query(path_and_query);
        return Ok(Url::new(is_secure, host, port, path, query));
    }

    let host_header = headers
        .get_str(KnownHeaderName::Host)
        .ok_or(Error::InvalidHead)?;
    let (host, port) = split_host_port(host_header, default_port);
    let (path, query) = split_path_query(target);
    Ok(Url::new(secure, host, port, path, query))
}

/// splits `host[:port]`. IPv6 literals in bracket notation (`[::1]:8080`)
/// are not handled; hearth targets are expected to address IPv6 hosts via
/// DNS names rather than bracketed literals.
fn split_host_port(authority: &str, default_port: u16) -> (&str, u16) {
    match authority.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host, port),
            Err(_) => (authority, default_port),
        },
        None => (authority, default_port),
    }
}

fn split_path_query(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

// ---- reading the body ----

async fn read_body<T: Transport>(
    transport: &mut T,
    buffer: &mut Buffer,
    content_length: Option<u64>,
    is_chunked: bool,
    config: &HttpConfig,
) -> Result<ReceivedBody> {
    let idle_timeout = Duration::from_millis(config.idle_timeout_ms());

    if is_chunked {
        let bytes = read_chunked_body(transport, buffer, config.max_size_post_content(), idle_timeout).await?;
        return store_body(bytes, config);
    }

    let len = content_length.unwrap_or(0);
    if len == 0 {
        return Ok(ReceivedBody::Empty);
    }
    if len > config.max_size_post_content() {
        return Err(Error::EntityTooLarge(config.max_size_post_content()));
    }

    if len <= config.store_file_upload_in_file_at_size() {
        read_at_least(transport, buffer, len as usize, idle_timeout).await?;
        let bytes = buffer[..len as usize].to_vec();
        buffer.ignore_front(len as usize);
        Ok(ReceivedBody::InMemory(bytes))
    } else {
        spool_body_to_disk(transport, buffer, len, config).await
    }
}

async fn read_chunked_body<T: Transport>(
    transport: &mut T,
    buffer: &mut Buffer,
    max_len: u64,
    idle_timeout: Duration,
) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let line_end = read_until(transport, buffer, b"\r\n", buffer.len() + 4096, idle_timeout).await?;
        let size_line = std::str::from_utf8(&buffer[..line_end - 2]).map_err(|_| Error::InvalidHead)?;
        let size_str = size_line.split(';').next().unwrap_or(size_line).trim();
        let chunk_size =
            usize::from_str_radix(size_str, 16).map_err(|_| Error::InvalidHead)?;
        buffer.ignore_front(line_end);

        if chunk_size == 0 {
            let trailer_end = read_until(transport, buffer, b"\r\n", buffer.len() + 4096, idle_timeout).await?;
            buffer.ignore_front(trailer_end);
            return Ok(body);
        }

        if body.len() as u64 + chunk_size as u64 > max_len {
            return Err(Error::EntityTooLarge(max_len));
        }

        read_at_least(transport, buffer, chunk_size + 2, idle_timeout).await?;
        body.extend_from_slice(&buffer[..chunk_size]);
        buffer.ignore_front(chunk_size + 2);
    }
}

fn store_body(bytes: Vec<u8>, config: &HttpConfig) -> Result<ReceivedBody> {
    if bytes.len() as u64 <= config.store_file_upload_in_file_at_size() {
        Ok(ReceivedBody::InMemory(bytes))
    } else {
        let (path, mut file) = open_unique_temp_file(config.temp_dir(), "hearth-body")?;
        file.write_all(&bytes).map_err(Error::Io)?;
        Ok(ReceivedBody::File(crate::body::SpooledBody::new(path, bytes.len() as u64)))
    }
}

async fn spool_body_to_disk<T: Transport>(
    transport: &mut T,
    buffer: &mut Buffer,
    len: u64,
    config: &HttpConfig,
) -> Result<ReceivedBody> {
    let (path, mut file) = open_unique_temp_file(config.temp_dir(), "hearth-body")?;

    let already = buffer.len().min(len as usize);
    if already > 0 {
        file.write_all(&buffer[..already]).map_err(Error::Io)?;
        buffer.ignore_front(already);
    }

    let idle_timeout = Duration::from_millis(config.idle_timeout_ms());
    let mut remaining = len - already as u64;
    let mut chunk = vec![0u8; 64 * 1024];
    while remaining > 0 {
        let to_read = chunk.len().min(remaining as usize);
        let bytes = read_with_idle_timeout(transport, &mut chunk[..to_read], idle_timeout).await?;
        if bytes == 0 {
            return Err(Error::InvalidHead);
        }
        file.write_all(&chunk[..bytes]).map_err(Error::Io)?;
        remaining -= bytes as u64;
    }

    Ok(ReceivedBody::File(crate::body::SpooledBody::new(path, len)))
}

fn open_unique_temp_file(temp_dir: &Path, prefix: &str) -> Result<(std::path::PathBuf, std::fs::File)> {
    for _ in 0..16 {
        let path = temp_dir.join(format!("{prefix}-{}", fastrand::u64(..)));
        match std::fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        "could not allocate a unique spool filename",
    )))
}

// ---- writing the response ----

struct SyncFileReader(std::fs::File);

impl AsyncRead for SyncFileReader {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<std::io::Result<usize>> {
        use std::io::Read;
        Poll::Ready(self.0.read(buf))
    }
}

struct LazyReader {
    iter: Box<dyn Iterator<Item = String> + Send>,
    pending: Vec<u8>,
    offset: usize,
}

impl AsyncRead for LazyReader {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<std::io::Result<usize>> {
        loop {
            if self.offset < self.pending.len() {
                let n = (self.pending.len() - self.offset).min(buf.len());
                buf[..n].copy_from_slice(&self.pending[self.offset..self.offset + n]);
                self.offset += n;
                return Poll::Ready(Ok(n));
            }
            match self.iter.next() {
                Some(chunk) => {
                    self.pending = chunk.into_bytes();
                    self.offset = 0;
                }
                None => return Poll::Ready(Ok(0)),
            }
        }
    }
}

enum ContentReader {
    Cursor(Cursor<Vec<u8>>),
    File(SyncFileReader),
    Lazy(LazyReader),
}

impl AsyncRead for ContentReader {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            ContentReader::Cursor(c) => Pin::new(c).poll_read(cx, buf),
            ContentReader::File(f) => Pin::new(f).poll_read(cx, buf),
            ContentReader::Lazy(l) => Pin::new(l).poll_read(cx, buf),
        }
    }
}

fn content_into_reader(content: Content) -> Result<ContentReader> {
    match content {
        Content::Empty => Ok(ContentReader::Cursor(Cursor::new(Vec::new()))),
        Content::Bytes(bytes) => Ok(ContentReader::Cursor(Cursor::new(bytes))),
        Content::File { path, .. } => {
            let file = std::fs::File::open(&path).map_err(Error::Io)?;
            Ok(ContentReader::File(SyncFileReader(file)))
        }
        Content::Lazy(iter) => Ok(ContentReader::Lazy(LazyReader {
            iter,
            pending: Vec::new(),
            offset: 0,
        })),
    }
}

fn content_into_bytes(content: Content) -> Result<Vec<u8>> {
    match content {
        Content::Empty => Ok(Vec::new()),
        Content::Bytes(bytes) => Ok(bytes),
        Content::File { path, .. } => std::fs::read(path).map_err(Error::Io),
        Content::Lazy(iter) => Ok(iter.flat_map(String::into_bytes).collect()),
    }
}

fn read_middle_sample(path: &Path, len: u64) -> Result<Vec<u8>> {
    use std::io::{Read, Seek, SeekFrom};
    let sample_len = 8192u64.min(len);
    let start = (len / 2).saturating_sub(sample_len / 2);
    let mut file = std::fs::File::open(path).map_err(Error::Io)?;
    file.seek(SeekFrom::Start(start)).map_err(Error::Io)?;
    let mut buf = vec![0u8; sample_len as usize];
    let read = file.read(&mut buf).map_err(Error::Io)?;
    buf.truncate(read);
    Ok(buf)
}

fn write_head(
    version: Version,
    status: Status,
    headers_bundle: &ResponseHeaders,
    write_buffer_len: usize,
) -> Vec<u8> {
    let mut wire_headers = Headers::new();
    headers_bundle.write_into(&mut wire_headers);
    if let Some(len) = headers_bundle.content_length {
        wire_headers.insert(KnownHeaderName::ContentLength, len);
    }
    if headers_bundle.transfer_encoding == TransferEncoding::Chunked {
        wire_headers.insert(KnownHeaderName::TransferEncoding, "chunked");
    }

    let mut head = Vec::with_capacity(write_buffer_len);
    let _ = write!(head, "{version} {} {}\r\n", status as u16, status.canonical_reason());
    for (name, values) in &wire_headers {
        if !name.is_valid() {
            log::error!("skipping invalid header name {name:?}");
            continue;
        }
        for value in values {
            if !value.is_valid() {
                log::error!("skipping invalid header value for {name}");
                continue;
            }
            let _ = write!(head, "{name}: ");
            head.extend_from_slice(value.as_ref());
            let _ = write!(head, "\r\n");
        }
    }
    let _ = write!(head, "\r\n");
    head
}

async fn write_response<T: Transport>(
    transport: &mut T,
    version: Version,
    method: Method,
    accept_encoding: Option<&str>,
    keep_alive: bool,
    mut response: Response,
    config: &HttpConfig,
) -> Result<()> {
    let status = response.status();

    {
        let headers_mut = response.headers_mut();
        headers_mut.connection = if keep_alive {
            ConnectionHeader::KeepAlive
        } else {
            ConnectionHeader::Close
        };
        if headers_mut.date.is_none() {
            headers_mut.date = Some(std::time::SystemTime::now());
        }
        if headers_mut.server.is_none() {
            headers_mut.server = Some("hearth".to_owned());
        }
    }

    let mut headers_bundle = response.headers().clone();

    if status.forbids_body() || method == Method::Head {
        headers_bundle.content_encoding = ContentEncoding::Identity;
        headers_bundle.transfer_encoding = TransferEncoding::None;
        headers_bundle.content_length = None;
        let head = write_head(version, status, &headers_bundle, config.write_buffer_len);
        let mut writer = BufWriter::new_with_buffer(head, &mut *transport);
        writer.flush().await.map_err(Error::Io)?;
        return Ok(());
    }

    let gzip_preference = response.gzip_preference();
    let client_accepts_gzip = accept_encoding.is_some_and(gzip::accepts_gzip);
    let content = response.into_content();
    let known_len = content.known_len();

    let mut gzip_desired = client_accepts_gzip && gzip_preference != GzipPreference::Never;

    if gzip_desired && gzip_preference == GzipPreference::Auto {
        if let Content::File { ref path, len } = content {
            if len > config.gzip_autodetect_threshold() {
                let sample = read_middle_sample(path, len)?;
                if !gzip::is_compressible(&sample).await.map_err(Error::Io)? {
                    gzip_desired = false;
                }
            }
        }
    }

    // rule 2: small, known-length, gzip-desired bodies are gzipped whole in memory
    if gzip_desired && known_len.is_some_and(|l| l < config.gzip_in_memory_up_to_size()) {
        let bytes = content_into_bytes(content)?;
        let compressed = gzip::gzip_in_memory(&bytes).await.map_err(Error::Io)?;
        headers_bundle.content_encoding = ContentEncoding::Gzip;
        headers_bundle.transfer_encoding = TransferEncoding::None;
        headers_bundle.content_length = Some(compressed.len() as u64);
        let head = write_head(version, status, &headers_bundle, config.write_buffer_len);
        let mut writer = BufWriter::new_with_buffer(head, &mut *transport);
        let mut reader = Cursor::new(compressed);
        futures_lite::io::copy(&mut reader, &mut writer).await.map_err(Error::Io)?;
        writer.flush().await.map_err(Error::Io)?;
        return Ok(());
    }

    // rule 3: gzip streamed through chunked framing on a persistent connection
    if gzip_desired && keep_alive {
        headers_bundle.content_encoding = ContentEncoding::Gzip;
        headers_bundle.transfer_encoding = TransferEncoding::Chunked;
        headers_bundle.content_length = None;
        let reader = content_into_reader(content)?;
        let gzipped = GzipEncoder::new(BufReader::new(reader));
        let head = write_head(version, status, &headers_bundle, config.write_buffer_len);
        let mut writer = BufWriter::new_with_buffer(head, &mut *transport);
        let mut encoder = ChunkedEncoder::new(gzipped);
        futures_lite::io::copy(&mut encoder, &mut writer).await.map_err(Error::Io)?;
        writer.flush().await.map_err(Error::Io)?;
        return Ok(());
    }

    // rule 4: gzip streamed raw, connection closes when the body ends
    if gzip_desired {
        headers_bundle.content_encoding = ContentEncoding::Gzip;
        headers_bundle.transfer_encoding = TransferEncoding::None;
        headers_bundle.content_length = None;
        let reader = content_into_reader(content)?;
        let mut gzipped = GzipEncoder::new(BufReader::new(reader));
        let head = write_head(version, status, &headers_bundle, config.write_buffer_len);
        let mut writer = BufWriter::new_with_buffer(head, &mut *transport);
        futures_lite::io::copy(&mut gzipped, &mut writer).await.map_err(Error::Io)?;
        writer.flush().await.map_err(Error::Io)?;
        return Ok(());
    }

    // rule 5: unknown length on a persistent connection, chunked framing
    if keep_alive && known_len.is_none() {
        headers_bundle.transfer_encoding = TransferEncoding::Chunked;
        headers_bundle.content_length = None;
        let reader = content_into_reader(content)?;
        let head = write_head(version, status, &headers_bundle, config.write_buffer_len);
        let mut writer = BufWriter::new_with_buffer(head, &mut *transport);
        let mut encoder = ChunkedEncoder::new(reader);
        futures_lite::io::copy(&mut encoder, &mut writer).await.map_err(Error::Io)?;
        writer.flush().await.map_err(Error::Io)?;
        return Ok(());
    }

    // rule 6: known length (or none, closing after) streamed as-is
    headers_bundle.transfer_encoding = TransferEncoding::None;
    headers_bundle.content_length = known_len;
    let mut reader = content_into_reader(content)?;
    let head = write_head(version, status, &headers_bundle, config.write_buffer_len);
    let mut writer = BufWriter::new_with_buffer(head, &mut *transport);
    futures_lite::io::copy(&mut reader, &mut writer).await.map_err(Error::Io)?;
    writer.flush().await.map_err(Error::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::block_on;
    use futures_lite::io::Cursor as IoCursor;

    impl Transport for IoCursor<Vec<u8>> {}

    fn config() -> HttpConfig {
        HttpConfig::default()
    }

    struct Echo;
    impl Handler for Echo {
        fn handle(&self, request: Request) -> Result<Response> {
            Ok(Response::text(format!("{} {}", request.method(), request.url().path())))
        }
    }

    #[test]
    fn serves_a_simple_keep_alive_request() {
        let input = b"GET /hello HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n".to_vec();
        let transport = IoCursor::new(input);
        let result = block_on(serve_connection(transport, &Echo, &config(), false, 80));
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_missing_content_length_on_post() {
        let input = b"POST /submit HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec();
        let transport = IoCursor::new(input);
        let result = block_on(serve_connection(transport, &Echo, &config(), false, 80));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_host_headers() {
        let input = b"GET / HTTP/1.1\r\nHost: a.example.com\r\nHost: b.example.com\r\n\r\n".to_vec();
        let transport = IoCursor::new(input);
        let result = block_on(serve_connection(transport, &Echo, &config(), false, 80));
        assert!(result.is_err());
    }

    #[test]
    fn resolves_absolute_form_target() {
        let url = resolve_url("http://example.com:8080/a/b?x=1", &Headers::new(), false, 80).unwrap();
        assert_eq!(url.domain(), "example.com");
        assert_eq!(url.port(), 8080);
        assert_eq!(url.path(), "/a/b");
        assert_eq!(url.query_first("x"), Some("1"));
    }

    #[test]
    fn resolves_origin_form_target_from_host_header() {
        let mut headers = Headers::new();
        headers.insert(KnownHeaderName::Host, "example.com");
        let url = resolve_url("/a/b", &headers, true, 443).unwrap();
        assert_eq!(url.domain(), "example.com");
        assert_eq!(url.port(), 443);
        assert!(url.secure());
    }

    #[test]
    fn missing_host_on_origin_form_is_an_error() {
        assert!(resolve_url("/a/b", &Headers::new(), false, 80).is_err());
    }

    struct TestUpgrade;
    impl crate::UpgradeHandler for TestUpgrade {
        fn upgrade(&self, mut transport: BoxedTransport) -> crate::UpgradeFuture {
            Box::pin(async move {
                let _ = transport.write_all(b"hijacked").await;
            })
        }
    }

    struct Upgrades;
    impl Handler for Upgrades {
        fn handle(&self, _request: Request) -> Result<Response> {
            Ok(Response::new(Status::SwitchingProtocols).with_upgrade(TestUpgrade))
        }
    }

    #[test]
    fn upgrade_response_hands_off_the_transport() {
        let input = b"GET /ws HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n".to_vec();
        let transport = IoCursor::new(input);
        let result = block_on(serve_connection(transport, &Upgrades, &config(), false, 80));
        assert!(result.is_ok());
    }

    /// a socket that never has bytes to offer, used to exercise the idle
    /// timeout without a real (slow) network peer.
    struct Stalled;

    impl AsyncRead for Stalled {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut [u8]) -> Poll<std::io::Result<usize>> {
            Poll::Pending
        }
    }

    impl AsyncWrite for Stalled {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    impl Transport for Stalled {}

    #[test]
    fn idle_connection_is_aborted_after_the_configured_timeout() {
        let config = config().with_idle_timeout_ms(10);
        let result = block_on(serve_connection(Stalled, &Echo, &config, false, 80));
        assert!(matches!(result, Err(Error::IdleTimeout)));
    }
}
