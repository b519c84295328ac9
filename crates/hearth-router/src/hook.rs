use hearth_http::Url;
use std::cmp::Ordering;

/// the schemes a [`Hook`] is willing to match. an empty set matches any
/// scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

fn scheme_of(url: &Url) -> Scheme {
    if url.secure() {
        Scheme::Https
    } else {
        Scheme::Http
    }
}

/// the match point a [`crate::Resolver`] dispatches against.
///
/// a hook with `domain: None` matches any domain; `specific_domain: false`
/// additionally allows a subdomain suffix match. the same shape applies to
/// `path`/`specific_path`. `skippable` controls whether a handler that
/// declines to answer lets the resolver fall through to the next hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    pub(crate) protocols: Vec<Scheme>,
    pub(crate) port: Option<u16>,
    pub(crate) domain: Option<String>,
    pub(crate) specific_domain: bool,
    pub(crate) path: Option<String>,
    pub(crate) specific_path: bool,
    pub(crate) skippable: bool,
}

impl Hook {
    /// a hook matching any scheme, port, domain, or path.
    pub fn any() -> Self {
        Self {
            protocols: Vec::new(),
            port: None,
            domain: None,
            specific_domain: false,
            path: None,
            specific_path: false,
            skippable: false,
        }
    }

    #[must_use]
    pub fn with_protocols(mut self, protocols: impl Into<Vec<Scheme>>) -> Self {
        self.protocols = protocols.into();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// match this exact domain, or (unless [`Self::specific_domain`] is set)
    /// any subdomain of it.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn specific_domain(mut self) -> Self {
        self.specific_domain = true;
        self
    }

    /// match this exact path, or (unless [`Self::specific_path`] is set)
    /// any path nested under it.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn specific_path(mut self) -> Self {
        self.specific_path = true;
        self
    }

    /// allow the resolver to fall through to the next hook when this one's
    /// handler declines to answer.
    #[must_use]
    pub fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }

    /// does this hook match `url`? returns the consumed/remaining domain
    /// and path the resolver should rewrite the request's url to.
    pub(crate) fn matches(&self, url: &Url) -> Option<MatchedUrl> {
        if !self.protocols.is_empty() && !self.protocols.contains(&scheme_of(url)) {
            return None;
        }
        if let Some(port) = self.port {
            if port != url.port() {
                return None;
            }
        }
        let (domain_consumed, domain_remaining) = match_domain(self, url)?;
        let (path_consumed, path_remaining) = match_path(self, url)?;
        Some(MatchedUrl {
            domain_consumed,
            domain_remaining,
            path_consumed,
            path_remaining,
        })
    }
}

pub(crate) struct MatchedUrl {
    pub(crate) domain_consumed: String,
    pub(crate) domain_remaining: String,
    pub(crate) path_consumed: String,
    pub(crate) path_remaining: String,
}

fn match_domain(hook: &Hook, url: &Url) -> Option<(String, String)> {
    match &hook.domain {
        None => Some((String::new(), url.domain().to_owned())),
        Some(domain) => {
            if url.domain() == domain {
                Some((domain.clone(), String::new()))
            } else if !hook.specific_domain {
                let suffix = format!(".{domain}");
                url.domain()
                    .strip_suffix(&suffix)
                    .map(|prefix| (domain.clone(), format!("{prefix}.")))
            } else {
                None
            }
        }
    }
}

fn match_path(hook: &Hook, url: &Url) -> Option<(String, String)> {
    match &hook.path {
        None => Some((String::new(), url.path().to_owned())),
        Some(path) => {
            if url.path() == path.as_str() || (path.is_empty() && url.path() == "/") {
                Some((path.clone(), String::new()))
            } else if !hook.specific_path {
                let prefix = format!("{path}/");
                url.path()
                    .strip_prefix(&prefix)
                    .map(|rest| (path.clone(), format!("/{rest}")))
            } else {
                None
            }
        }
    }
}

/// total order over hooks: port, then domain specificity/length, then path
/// specificity/length, then non-skippable before skippable. the resolver
/// keeps its mappings sorted by this order so the most specific hook is
/// always tried first and a catch-all last.
pub(crate) fn compare_hooks(a: &Hook, b: &Hook) -> Ordering {
    compare_port(a.port, b.port)
        .then_with(|| compare_bool_true_first(a.specific_domain, b.specific_domain))
        .then_with(|| compare_option_longest_first(a.domain.as_deref(), b.domain.as_deref()))
        .then_with(|| compare_bool_true_first(a.specific_path, b.specific_path))
        .then_with(|| compare_option_longest_first(a.path.as_deref(), b.path.as_deref()))
        .then_with(|| a.skippable.cmp(&b.skippable))
}

fn compare_port(a: Option<u16>, b: Option<u16>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_bool_true_first(a: bool, b: bool) -> Ordering {
    b.cmp(&a)
}

fn compare_option_longest_first(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.len().cmp(&a.len()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(domain: &str, path: &str) -> Url {
        Url::new(false, domain, 80, path, "")
    }

    #[test]
    fn any_hook_matches_everything() {
        let hook = Hook::any();
        let matched = hook.matches(&url("example.com", "/a/b")).unwrap();
        assert_eq!(matched.domain_remaining, "example.com");
        assert_eq!(matched.path_remaining, "/a/b");
    }

    #[test]
    fn subdomain_suffix_match() {
        let hook = Hook::any().with_domain("example.com");
        let matched = hook.matches(&url("v2.api.example.com", "/")).unwrap();
        assert_eq!(matched.domain_consumed, "example.com");
        assert_eq!(matched.domain_remaining, "v2.api.");
    }

    #[test]
    fn specific_domain_rejects_subdomains() {
        let hook = Hook::any().with_domain("example.com").specific_domain();
        assert!(hook.matches(&url("v2.api.example.com", "/")).is_none());
        assert!(hook.matches(&url("example.com", "/")).is_some());
    }

    #[test]
    fn path_prefix_match() {
        let hook = Hook::any().with_path("/foo/bar");
        let matched = hook.matches(&url("example.com", "/foo/bar/baz")).unwrap();
        assert_eq!(matched.path_consumed, "/foo/bar");
        assert_eq!(matched.path_remaining, "/baz");
    }

    #[test]
    fn empty_path_matches_root() {
        let hook = Hook::any().with_path("");
        assert!(hook.matches(&url("example.com", "/")).is_some());
    }

    #[test]
    fn port_mismatch_rejects() {
        let hook = Hook::any().with_port(8080);
        assert!(hook.matches(&url("example.com", "/")).is_none());
    }

    #[test]
    fn ordering_prefers_specific_port_then_longer_domain_then_longer_path() {
        let specific_port = Hook::any().with_port(443);
        let any_port = Hook::any();
        assert_eq!(compare_hooks(&specific_port, &any_port), Ordering::Less);

        let long_domain = Hook::any().with_domain("api.example.com");
        let short_domain = Hook::any().with_domain("com");
        assert_eq!(compare_hooks(&long_domain, &short_domain), Ordering::Less);

        let non_skippable = Hook::any();
        let skippable = Hook::any().skippable();
        assert_eq!(compare_hooks(&non_skippable, &skippable), Ordering::Less);
    }
}
