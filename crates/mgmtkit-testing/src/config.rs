//! Mock server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use mgmtkit_core::MgmtError;
use url::{Host, Url};

/// Address prefix the mock server listens on by default.
pub const DEFAULT_MOCK_PREFIX: &str = "http://127.0.0.1:12345/";

/// Environment variable overriding [`DEFAULT_MOCK_PREFIX`].
pub const MOCK_PREFIX_ENV: &str = "MGMTKIT_MOCK_PREFIX";

/// Default time allowed for binding the listener.
pub const DEFAULT_BIND_TIMEOUT: Duration = Duration::from_secs(5);

/// Default maximum request body size (16 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// What the mock server does with inbound calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReplayMode {
    /// Answer from the recorded session.
    #[default]
    Replay,
    /// Forward to a live service and record the exchanges.
    Record {
        /// The live service.
        upstream: Url,
    },
}

/// Configuration for [`MockHttpServer`](crate::MockHttpServer).
#[derive(Debug, Clone)]
pub struct MockServerConfig {
    /// Listener prefix, e.g. `http://127.0.0.1:12345/`. Port 0 picks a free port;
    /// the path must be `/`.
    pub prefix: String,
    /// Time allowed for binding the listener.
    pub bind_timeout: Duration,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Replay or record.
    pub mode: ReplayMode,
}

impl MockServerConfig {
    /// Create a configuration listening on `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            bind_timeout: DEFAULT_BIND_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            mode: ReplayMode::Replay,
        }
    }

    /// Use [`MOCK_PREFIX_ENV`] if set, or [`DEFAULT_MOCK_PREFIX`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var(MOCK_PREFIX_ENV).unwrap_or_else(|_| DEFAULT_MOCK_PREFIX.to_string()))
    }

    /// Listen on a free loopback port.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::new("http://127.0.0.1:0/")
    }

    /// Set the bind timeout.
    #[must_use]
    pub const fn with_bind_timeout(mut self, timeout: Duration) -> Self {
        self.bind_timeout = timeout;
        self
    }

    /// Set the maximum request body size.
    #[must_use]
    pub const fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Forward to `upstream` and record instead of replaying.
    #[must_use]
    pub fn recording(mut self, upstream: Url) -> Self {
        self.mode = ReplayMode::Record { upstream };
        self
    }

    /// Parse the prefix.
    pub fn prefix_url(&self) -> Result<Url, MgmtError> {
        let url = Url::parse(&self.prefix)
            .map_err(|e| MgmtError::invalid_address(&self.prefix, e.to_string()))?;
        if url.scheme() != "http" {
            return Err(MgmtError::invalid_address(
                &self.prefix,
                "only plain http prefixes are supported",
            ));
        }
        if url.path() != "/" || url.query().is_some() {
            return Err(MgmtError::invalid_address(
                &self.prefix,
                "recorded URLs are rooted at '/', so the prefix cannot carry a path",
            ));
        }
        Ok(url)
    }

    /// The socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, MgmtError> {
        let url = self.prefix_url()?;
        let ip = match url.host() {
            Some(Host::Ipv4(ip)) => IpAddr::V4(ip),
            Some(Host::Ipv6(ip)) => IpAddr::V6(ip),
            Some(Host::Domain("localhost")) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Some(Host::Domain(other)) => {
                return Err(MgmtError::invalid_address(
                    &self.prefix,
                    format!("cannot listen on host '{other}'"),
                ));
            }
            None => {
                return Err(MgmtError::invalid_address(&self.prefix, "missing host"));
            }
        };
        let port = url.port_or_known_default().unwrap_or(80);
        Ok(SocketAddr::new(ip, port))
    }
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_PREFIX)
    }
}
