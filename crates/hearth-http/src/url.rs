use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};

/// A parsed request URL.
///
/// As the resolver dispatches through nested hooks, each match pushes the
/// consumed domain/path suffix onto the `parent_*` stacks and narrows
/// `current_*` to what remains, so inner handlers only ever see the part of
/// the URL they own. Concatenating the parent stack (innermost last) with
/// the current value always reconstructs the original host or path.
///
/// All mutating methods are copy-on-write: they return a new `Url` rather
/// than modifying in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    secure: bool,
    current_domain: String,
    parent_domains: SmallVec<[String; 2]>,
    port: u16,
    current_path: String,
    parent_paths: SmallVec<[String; 4]>,
    query: Vec<(String, Vec<String>)>,
}

impl Url {
    pub fn new(secure: bool, host: &str, port: u16, path: &str, query: &str) -> Self {
        let host = host.strip_suffix('.').unwrap_or(host);
        Self {
            secure,
            current_domain: host.to_owned(),
            parent_domains: SmallVec::new(),
            port,
            current_path: path.to_owned(),
            parent_paths: SmallVec::new(),
            query: parse_query(query),
        }
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// the domain suffix not yet consumed by any outer resolver
    pub fn domain(&self) -> &str {
        &self.current_domain
    }

    /// domain suffixes consumed by outer resolvers, outermost first
    pub fn parent_domains(&self) -> &[String] {
        &self.parent_domains
    }

    /// the original, unrewritten host: parent domains (innermost last)
    /// followed by the current domain
    pub fn full_domain(&self) -> String {
        let mut s = String::new();
        for parent in self.parent_domains.iter().rev() {
            s.push_str(parent);
        }
        s.push_str(&self.current_domain);
        s
    }

    /// the path suffix not yet consumed by any outer resolver
    pub fn path(&self) -> &str {
        &self.current_path
    }

    /// path prefixes consumed by outer resolvers, outermost first
    pub fn parent_paths(&self) -> &[String] {
        &self.parent_paths
    }

    /// the original, unrewritten path: parent paths (innermost last)
    /// followed by the current path
    pub fn full_path(&self) -> String {
        let mut s = String::new();
        for parent in self.parent_paths.iter().rev() {
            s.push_str(parent);
        }
        s.push_str(&self.current_path);
        s
    }

    pub fn query(&self) -> &[(String, Vec<String>)] {
        &self.query
    }

    pub fn query_first(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }

    pub fn query_all(&self, key: &str) -> impl Iterator<Item = &str> {
        self.query
            .iter()
            .filter(move |(k, _)| k == key)
            .flat_map(|(_, v)| v.iter().map(String::as_str))
    }

    #[must_use]
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.current_path = path.into();
        new
    }

    #[must_use]
    pub fn with_domain(&self, domain: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.current_domain = domain.into();
        new
    }

    /// push `consumed` onto the parent-path stack and set the remaining
    /// suffix as the current path
    #[must_use]
    pub fn with_path_consumed(&self, consumed: &str, remaining: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.parent_paths.push(consumed.to_owned());
        new.current_path = remaining.into();
        new
    }

    /// push `consumed` onto the parent-domain stack and set the remaining
    /// prefix as the current domain
    #[must_use]
    pub fn with_domain_consumed(&self, consumed: &str, remaining: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.parent_domains.push(consumed.to_owned());
        new.current_domain = remaining.into();
        new
    }
}

impl Display for Url {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}:{}{}",
            if self.secure { "https" } else { "http" },
            self.full_domain(),
            self.port,
            self.full_path()
        )?;
        if !self.query.is_empty() {
            write!(f, "?{}", serialize_query(&self.query))?;
        }
        Ok(())
    }
}

fn parse_query(query: &str) -> Vec<(String, Vec<String>)> {
    let mut pairs: Vec<(String, Vec<String>)> = Vec::new();
    if query.is_empty() {
        return pairs;
    }
    for segment in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = match segment.split_once('=') {
            Some((k, v)) => (decode_form(k), decode_form(v)),
            None => (decode_form(segment), String::new()),
        };
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => pairs.push((key, vec![value])),
        }
    }
    pairs
}

fn serialize_query(pairs: &[(String, Vec<String>)]) -> String {
    let mut out = String::new();
    let mut first = true;
    for (key, values) in pairs {
        for value in values {
            if !first {
                out.push('&');
            }
            first = false;
            out.push_str(&encode_form(key));
            out.push('=');
            out.push_str(&encode_form(value));
        }
    }
    out
}

pub(crate) fn decode_form(s: &str) -> String {
    let mut out = Vec::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi * 16 + lo) as u8);
                        i += 3;
                    }
                    _ => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

pub(crate) fn encode_form(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_query() {
        let url = Url::new(false, "example.com", 80, "/search", "q=rust&q=http&empty=");
        assert_eq!(url.query_all("q").collect::<Vec<_>>(), vec!["rust", "http"]);
        assert_eq!(url.query_first("empty"), Some(""));
    }

    #[test]
    fn with_path_round_trips() {
        let url = Url::new(false, "example.com", 80, "/foo/bar", "");
        assert_eq!(url.with_path("/baz").path(), "/baz");
    }

    #[test]
    fn domain_consumption_reconstructs_original() {
        let url = Url::new(true, "v2.api.example.com", 443, "/", "");
        let narrowed = url.with_domain_consumed("example.com", "v2.api.");
        assert_eq!(narrowed.domain(), "v2.api.");
        assert_eq!(narrowed.parent_domains(), &["example.com".to_owned()]);
        assert_eq!(narrowed.full_domain(), "v2.api.example.com");
    }

    #[test]
    fn path_consumption_reconstructs_original() {
        let url = Url::new(false, "example.com", 80, "/foo/bar/baz", "");
        let narrowed = url.with_path_consumed("/foo/bar", "/baz");
        assert_eq!(narrowed.path(), "/baz");
        assert_eq!(narrowed.full_path(), "/foo/bar/baz");
    }

    #[test]
    fn trailing_dot_on_host_is_stripped() {
        let url = Url::new(false, "example.com.", 80, "/", "");
        assert_eq!(url.domain(), "example.com");
    }
}
