use crate::Error;
use std::{
    convert::TryFrom,
    fmt::{self, Display},
    str::FromStr,
};

/// HTTP response status codes, as defined by
/// [RFC 7231 §6](https://tools.ietf.org/html/rfc7231#section-6).
#[repr(u16)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum Status {
    /// 100 Continue
    Continue = 100,
    /// 101 Switching Protocols
    SwitchingProtocols = 101,
    /// 200 Ok
    Ok = 200,
    /// 201 Created
    Created = 201,
    /// 202 Accepted
    Accepted = 202,
    /// 204 No Content
    NoContent = 204,
    /// 206 Partial Content
    PartialContent = 206,
    /// 301 Moved Permanently
    MovedPermanently = 301,
    /// 302 Found
    Found = 302,
    /// 303 See Other
    SeeOther = 303,
    /// 304 Not Modified
    NotModified = 304,
    /// 307 Temporary Redirect
    TemporaryRedirect = 307,
    /// 308 Permanent Redirect
    PermanentRedirect = 308,
    /// 400 Bad Request
    BadRequest = 400,
    /// 401 Unauthorized
    Unauthorized = 401,
    /// 403 Forbidden
    Forbidden = 403,
    /// 404 Not Found
    NotFound = 404,
    /// 405 Method Not Allowed
    MethodNotAllowed = 405,
    /// 408 Request Timeout
    RequestTimeout = 408,
    /// 409 Conflict
    Conflict = 409,
    /// 411 Length Required
    LengthRequired = 411,
    /// 413 Payload Too Large
    PayloadTooLarge = 413,
    /// 414 Uri Too Long
    UriTooLong = 414,
    /// 415 Unsupported Media Type
    UnsupportedMediaType = 415,
    /// 416 Range Not Satisfiable
    RangeNotSatisfiable = 416,
    /// 417 Expectation Failed
    ExpectationFailed = 417,
    /// 426 Upgrade Required
    UpgradeRequired = 426,
    /// 431 Request Header Fields Too Large
    RequestHeaderFieldsTooLarge = 431,
    /// 500 Internal Server Error
    InternalServerError = 500,
    /// 501 Not Implemented
    NotImplemented = 501,
    /// 502 Bad Gateway
    BadGateway = 502,
    /// 503 Service Unavailable
    ServiceUnavailable = 503,
    /// 505 HTTP Version Not Supported
    HttpVersionNotSupported = 505,
}

impl Status {
    /// true for 1xx, 204, and 304 — the statuses that must
    /// never carry a body, regardless of what content a handler set.
    pub fn forbids_body(self) -> bool {
        let code = self as u16;
        (100..200).contains(&code) || matches!(self, Status::NoContent | Status::NotModified)
    }

    pub fn is_informational(self) -> bool {
        (100..200).contains(&(self as u16))
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&(self as u16))
    }

    pub fn is_redirection(self) -> bool {
        (300..400).contains(&(self as u16))
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&(self as u16))
    }

    pub fn is_server_error(self) -> bool {
        (500..600).contains(&(self as u16))
    }

    /// the reason phrase RFC 7230 §3.1.2 calls the status line's third
    /// component.
    pub fn canonical_reason(self) -> &'static str {
        match self {
            Status::Continue => "Continue",
            Status::SwitchingProtocols => "Switching Protocols",
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::Accepted => "Accepted",
            Status::NoContent => "No Content",
            Status::PartialContent => "Partial Content",
            Status::MovedPermanently => "Moved Permanently",
            Status::Found => "Found",
            Status::SeeOther => "See Other",
            Status::NotModified => "Not Modified",
            Status::TemporaryRedirect => "Temporary Redirect",
            Status::PermanentRedirect => "Permanent Redirect",
            Status::BadRequest => "Bad Request",
            Status::Unauthorized => "Unauthorized",
            Status::Forbidden => "Forbidden",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::RequestTimeout => "Request Timeout",
            Status::Conflict => "Conflict",
            Status::LengthRequired => "Length Required",
            Status::PayloadTooLarge => "Payload Too Large",
            Status::UriTooLong => "URI Too Long",
            Status::UnsupportedMediaType => "Unsupported Media Type",
            Status::RangeNotSatisfiable => "Range Not Satisfiable",
            Status::ExpectationFailed => "Expectation Failed",
            Status::UpgradeRequired => "Upgrade Required",
            Status::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            Status::InternalServerError => "Internal Server Error",
            Status::NotImplemented => "Not Implemented",
            Status::BadGateway => "Bad Gateway",
            Status::ServiceUnavailable => "Service Unavailable",
            Status::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

impl From<Status> for u16 {
    fn from(status: Status) -> u16 {
        status as u16
    }
}

impl TryFrom<u16> for Status {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_str(&code.to_string())
    }
}

impl TryFrom<i32> for Status {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        u16::try_from(code)
            .map_err(Error::from)
            .and_then(Status::try_from)
    }
}

impl PartialEq<u16> for Status {
    fn eq(&self, other: &u16) -> bool {
        *self as u16 == *other
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", *self as u16, self.canonical_reason())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "100" => Ok(Self::Continue),
            "101" => Ok(Self::SwitchingProtocols),
            "200" => Ok(Self::Ok),
            "201" => Ok(Self::Created),
            "202" => Ok(Self::Accepted),
            "204" => Ok(Self::NoContent),
            "206" => Ok(Self::PartialContent),
            "301" => Ok(Self::MovedPermanently),
            "302" => Ok(Self::Found),
            "303" => Ok(Self::SeeOther),
            "304" => Ok(Self::NotModified),
            "307" => Ok(Self::TemporaryRedirect),
            "308" => Ok(Self::PermanentRedirect),
            "400" => Ok(Self::BadRequest),
            "401" => Ok(Self::Unauthorized),
            "403" => Ok(Self::Forbidden),
            "404" => Ok(Self::NotFound),
            "405" => Ok(Self::MethodNotAllowed),
            "408" => Ok(Self::RequestTimeout),
            "409" => Ok(Self::Conflict),
            "411" => Ok(Self::LengthRequired),
            "413" => Ok(Self::PayloadTooLarge),
            "414" => Ok(Self::UriTooLong),
            "415" => Ok(Self::UnsupportedMediaType),
            "416" => Ok(Self::RangeNotSatisfiable),
            "417" => Ok(Self::ExpectationFailed),
            "426" => Ok(Self::UpgradeRequired),
            "431" => Ok(Self::RequestHeaderFieldsTooLarge),
            "500" => Ok(Self::InternalServerError),
            "501" => Ok(Self::NotImplemented),
            "502" => Ok(Self::BadGateway),
            "503" => Ok(Self::ServiceUnavailable),
            "505" => Ok(Self::HttpVersionNotSupported),
            _ => Err(Error::InvalidStatus),
        }
    }
}
