use crate::{Error, Result};
use std::fmt::{self, Display, Formatter};

/// the HTTP version of a request or response.
///
/// Only the two HTTP/1.x versions are represented; anything else is an
/// [`Error::UnsupportedVersion`] at parse time; HTTP/2 and HTTP/3 are out
/// of scope entirely.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum Version {
    /// HTTP/1.0
    Http1_0,
    /// HTTP/1.1
    Http1_1,
}

impl Version {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        match bytes {
            b"HTTP/1.1" => Ok(Version::Http1_1),
            b"HTTP/1.0" => Ok(Version::Http1_0),
            _ => Err(Error::InvalidVersion),
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Version::Http1_0 => "HTTP/1.0",
            Version::Http1_1 => "HTTP/1.1",
        })
    }
}
