use hearth_http::HttpConfig;
use std::time::Duration;

/// server-level configuration: bind address, connection admission, and the
/// TLS acceptor seam, plus an embedded [`HttpConfig`] for wire-level
/// tunables. build one with [`crate::config`], or [`Config::new`] directly.
#[derive(Debug, Clone)]
pub struct Config<A> {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) secure_port: Option<u16>,
    pub(crate) certificate_path: Option<String>,
    pub(crate) certificate_password: Option<String>,
    pub(crate) acceptor: A,
    pub(crate) http: HttpConfig,
    pub(crate) max_connections: Option<usize>,
    pub(crate) nodelay: bool,
    pub(crate) register_signals: bool,
    pub(crate) drain_timeout: Duration,
}

impl Default for Config<()> {
    /// * host: the `HOST` env var, or else `"localhost"`
    /// * port: the `PORT` env var, or else `8080`
    /// * secure port: none
    /// * acceptor: `()`, the no-op TLS passthrough
    /// * max connections: unbounded
    /// * tcp nodelay: disabled
    /// * signal handling: enabled on unix, a no-op elsewhere
    /// * drain timeout: 30 seconds
    fn default() -> Self {
        let port = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080);
        let host = std::env::var("HOST").unwrap_or_else(|_| String::from("localhost"));

        Self {
            host,
            port,
            secure_port: None,
            certificate_path: None,
            certificate_password: None,
            acceptor: (),
            http: HttpConfig::default(),
            max_connections: None,
            nodelay: false,
            register_signals: cfg!(unix),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl Config<()> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A> Config<A> {
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// the port a TLS-terminating [`crate::Acceptor`] listens on, if
    /// different from the plaintext [`Self::with_port`]. accepted and
    /// reported through [`Self::secure_port`]; no TLS implementation ships,
    /// so nothing in this crate enforces this split on its own.
    #[must_use]
    pub fn with_secure_port(mut self, port: u16) -> Self {
        self.secure_port = Some(port);
        self
    }

    pub fn secure_port(&self) -> Option<u16> {
        self.secure_port
    }

    /// path to a TLS certificate. stored for an [`crate::Acceptor`]
    /// implementation to read; this crate does not read the file itself.
    #[must_use]
    pub fn with_certificate_path(mut self, path: impl Into<String>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    pub fn certificate_path(&self) -> Option<&str> {
        self.certificate_path.as_deref()
    }

    #[must_use]
    pub fn with_certificate_password(mut self, password: impl Into<String>) -> Self {
        self.certificate_password = Some(password.into());
        self
    }

    pub fn certificate_password(&self) -> Option<&str> {
        self.certificate_password.as_deref()
    }

    #[must_use]
    pub fn with_acceptor<B>(self, acceptor: B) -> Config<B> {
        Config {
            host: self.host,
            port: self.port,
            secure_port: self.secure_port,
            certificate_path: self.certificate_path,
            certificate_password: self.certificate_password,
            acceptor,
            http: self.http,
            max_connections: self.max_connections,
            nodelay: self.nodelay,
            register_signals: self.register_signals,
            drain_timeout: self.drain_timeout,
        }
    }

    pub fn acceptor(&self) -> &A {
        &self.acceptor
    }

    /// reject new connections once this many are in flight, replying
    /// `503 Service Unavailable` on the ones turned away.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    pub fn max_connections(&self) -> Option<usize> {
        self.max_connections
    }

    #[must_use]
    pub fn with_nodelay(mut self) -> Self {
        self.nodelay = true;
        self
    }

    pub fn nodelay(&self) -> bool {
        self.nodelay
    }

    #[must_use]
    pub fn without_signals(mut self) -> Self {
        self.register_signals = false;
        self
    }

    pub fn register_signals(&self) -> bool {
        self.register_signals
    }

    /// how long the accept loop waits for in-flight connections to finish
    /// after a graceful stop before returning anyway.
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// the embedded wire-level configuration (buffer sizes, upload spooling,
    /// gzip thresholds, idle timeout, and the rest of [`HttpConfig`]).
    #[must_use]
    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn http_config(&self) -> &HttpConfig {
        &self.http
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unbound_and_localhost_absent_env() {
        let config = Config::new();
        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), 8080);
        assert!(config.secure_port().is_none());
        assert!(config.max_connections().is_none());
        assert!(!config.nodelay());
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = Config::new()
            .with_port(9000)
            .with_host("0.0.0.0")
            .with_secure_port(9443)
            .with_max_connections(64)
            .with_nodelay()
            .without_signals();

        assert_eq!(config.port(), 9000);
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.secure_port(), Some(9443));
        assert_eq!(config.max_connections(), Some(64));
        assert!(config.nodelay());
        assert!(!config.register_signals());
    }

    #[test]
    fn with_acceptor_changes_the_acceptor_type() {
        let config = Config::new().with_acceptor(String::from("placeholder"));
        assert_eq!(config.acceptor(), &String::from("placeholder"));
    }
}
