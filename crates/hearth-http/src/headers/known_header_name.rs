use super::{HeaderName, HeaderNameInner};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};
use HeaderNameInner::{KnownHeader, UnknownHeader};

impl Display for KnownHeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<KnownHeaderName> for HeaderName<'_> {
    fn from(khn: KnownHeaderName) -> Self {
        Self(KnownHeader(khn))
    }
}

impl PartialEq<HeaderName<'_>> for KnownHeaderName {
    fn eq(&self, other: &HeaderName<'_>) -> bool {
        match &other.0 {
            KnownHeader(k) => self == k,
            UnknownHeader(_) => false,
        }
    }
}

macro_rules! known_headers {
    ($(($capitalized:literal, $variant:tt)),+ $(,)?) => {
        /// A closed set of header names this crate can represent without
        /// allocating, so the wire codec can match on them directly instead
        /// of comparing strings. Everything else falls through to the
        /// unknown-header map on [`super::Headers`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[non_exhaustive]
        #[repr(u8)]
        pub enum KnownHeaderName {
            $(
                #[doc = concat!("The `", $capitalized, "` header.")]
                $variant,
            )+
        }

        impl AsRef<str> for KnownHeaderName {
            fn as_ref(&self) -> &str {
                match self {
                    $( Self::$variant => $capitalized, )+
                }
            }
        }

        impl FromStr for KnownHeaderName {
            type Err = ();
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if !s.is_ascii() {
                    return Err(());
                }
                $( if s.eq_ignore_ascii_case($capitalized) { return Ok(Self::$variant); } )+
                Err(())
            }
        }
    };
}

// the response headers bundle, commonly required request headers, and
// the handful of extras (Host, Content-Type, Transfer-Encoding, the
// websocket upgrade headers) the wire codec and connection loop need to
// reference by name.
known_headers! {
    ("Host", Host),
    ("Date", Date),
    ("Connection", Connection),
    ("Content-Length", ContentLength),
    ("Content-Type", ContentType),
    ("Content-Encoding", ContentEncoding),
    ("Content-Disposition", ContentDisposition),
    ("Content-Range", ContentRange),
    ("Transfer-Encoding", TransferEncoding),
    ("Accept-Encoding", AcceptEncoding),
    ("Accept-Ranges", AcceptRanges),
    ("Age", Age),
    ("Allow", Allow),
    ("Cache-Control", CacheControl),
    ("Cookie", Cookie),
    ("Set-Cookie", SetCookie),
    ("ETag", ETag),
    ("Expect", Expect),
    ("Expires", Expires),
    ("If-Modified-Since", IfModifiedSince),
    ("If-None-Match", IfNoneMatch),
    ("Last-Modified", LastModified),
    ("Location", Location),
    ("Pragma", Pragma),
    ("Range", Range),
    ("Server", Server),
    ("Upgrade", Upgrade),
    ("User-Agent", UserAgent),
    ("X-Forwarded-For", XForwardedFor),
    ("Sec-WebSocket-Accept", SecWebSocketAccept),
    ("Sec-WebSocket-Key", SecWebSocketKey),
    ("Sec-WebSocket-Protocol", SecWebSocketProtocol),
    ("Sec-WebSocket-Version", SecWebSocketVersion),
}
