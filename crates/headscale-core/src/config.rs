//! Configuration structures for Headscale clients.
//!
//! [`HeadscaleConfig`] can be built in code or deserialized from any serde
//! source. The API key is never serialized back out.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Path prefix of the Headscale REST gateway.
pub const API_PREFIX: &str = "api/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout for pooled connections in seconds.
pub const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Default maximum idle connections per host.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Connection settings for a Headscale control plane.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HeadscaleConfig {
    /// Base URL of the Headscale server (e.g. `https://headscale.example.com`)
    #[validate(url)]
    pub server_url: String,

    /// API key sent as a bearer token
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a PEM encoded CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Idle timeout for pooled connections in seconds
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle connections kept per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_pool_idle_timeout_secs() -> u64 {
    DEFAULT_POOL_IDLE_TIMEOUT_SECS
}

const fn default_pool_max_idle_per_host() -> usize {
    DEFAULT_POOL_MAX_IDLE_PER_HOST
}

impl HeadscaleConfig {
    /// Create a new configuration for the given server URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(server_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            server_url: server_url.into(),
            ..Self::default()
        };

        config.ensure_valid()?;
        Ok(config)
    }

    /// Run field validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing every failed field.
    pub fn ensure_valid(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set a custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set the connection pool limits.
    #[must_use]
    pub const fn with_pool(mut self, idle_timeout_secs: u64, max_idle_per_host: usize) -> Self {
        self.pool_idle_timeout_secs = idle_timeout_secs;
        self.pool_max_idle_per_host = max_idle_per_host;
        self
    }

    /// Request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Pool idle timeout as a Duration.
    #[must_use]
    pub const fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }

    /// Resolve the REST gateway root, appending `/api/v1/` unless the server
    /// URL already ends with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or cannot carry a path.
    pub fn api_base_url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.server_url)
            .map_err(|e| Error::ConfigError(format!("Invalid server URL: {e}")))?;

        if url.cannot_be_a_base() {
            return Err(Error::ConfigError(format!(
                "Server URL `{}` cannot be used as a base",
                self.server_url
            )));
        }

        let path = url.path().trim_end_matches('/').to_string();
        if path.ends_with(API_PREFIX) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/{API_PREFIX}/"));
        }
        Ok(url)
    }
}

impl Default for HeadscaleConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            api_key: None,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
        }
    }
}
