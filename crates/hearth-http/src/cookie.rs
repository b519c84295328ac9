use httpdate::fmt_http_date;
use std::{
    fmt::{self, Display, Formatter},
    time::SystemTime,
};

/// `SameSite` cookie attribute, per RFC 6265bis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    None,
    Lax,
    Strict,
}

impl Display for SameSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::None => "None",
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
        })
    }
}

/// A single cookie, as set via `Set-Cookie` or read from `Cookie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    expires: Option<SystemTime>,
    http_only: bool,
    same_site: Option<SameSite>,
    secure: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
            http_only: false,
            same_site: None,
            secure: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_expires(mut self, expires: SystemTime) -> Self {
        self.expires = Some(expires);
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// parse the `Cookie` request header: `name=value; name2=value2`,
    /// tolerating quoted values and the legacy `$Version`/`$Path`/`$Domain`
    /// attributes by skipping any pair whose name starts with `$`.
    pub fn parse_request_header(value: &str) -> Vec<Self> {
        value
            .split(';')
            .filter_map(|pair| {
                let pair = pair.trim();
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() || name.starts_with('$') {
                    return None;
                }
                let value = value.trim().trim_matches('"');
                Some(Cookie::new(name, value))
            })
            .collect()
    }
}

impl Display for Cookie {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(domain) = &self.domain {
            write!(f, "; domain={domain}")?;
        }
        if let Some(path) = &self.path {
            write!(f, "; path={path}")?;
        }
        if let Some(expires) = self.expires {
            write!(f, "; expires={}", fmt_http_date(expires))?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; samesite={same_site}")?;
        }
        if self.http_only {
            f.write_str("; httponly")?;
        }
        if self.secure {
            f.write_str("; secure")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn serializes_all_attributes() {
        let cookie = Cookie::new("session", "abc123")
            .with_path("/")
            .with_domain("example.com")
            .with_http_only(true)
            .with_secure(true)
            .with_same_site(SameSite::Lax);
        let s = cookie.to_string();
        assert!(s.starts_with("session=abc123"));
        assert!(s.contains("; domain=example.com"));
        assert!(s.contains("; path=/"));
        assert!(s.contains("; samesite=Lax"));
        assert!(s.contains("; httponly"));
        assert!(s.contains("; secure"));
    }

    #[test]
    fn expires_uses_rfc1123_date() {
        let epoch = SystemTime::UNIX_EPOCH + Duration::from_secs(0);
        let cookie = Cookie::new("a", "b").with_expires(epoch);
        assert!(cookie.to_string().contains("; expires=Thu, 01 Jan 1970"));
    }

    #[test]
    fn parses_request_header_and_skips_legacy_attributes() {
        let cookies = Cookie::parse_request_header(r#"$Version=1; a=1; b="two"; $Path=/"#);
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name(), "a");
        assert_eq!(cookies[0].value(), "1");
        assert_eq!(cookies[1].name(), "b");
        assert_eq!(cookies[1].value(), "two");
    }
}
