//! Asynchronous Headscale client.

use crate::Result;
use headscale_core::config::HeadscaleConfig;
use headscale_core::{Error, HttpTransport, Transport};
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for [`HeadscaleClient`].
#[derive(Clone)]
pub struct HeadscaleClientBuilder {
    config: HeadscaleConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl HeadscaleClientBuilder {
    /// Create a builder for the given server URL.
    ///
    /// The URL should include the protocol and hostname (e.g.
    /// `https://headscale.example.com`); `/api/v1` is appended automatically.
    pub fn new(server_url: impl AsRef<str>) -> Result<Self> {
        let config = HeadscaleConfig::new(server_url.as_ref()).map_err(|err| {
            Error::ConfigError(format!(
                "Invalid Headscale server URL `{}`: {err}",
                server_url.as_ref()
            ))
        })?;
        Ok(Self::from_config(config))
    }

    /// Create a builder from a prepared configuration.
    #[must_use]
    pub fn from_config(config: HeadscaleConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// Configure the API key sent as a bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config = self.config.with_api_key(api_key);
        self
    }

    /// Override the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config = self.config.with_timeout(seconds);
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.config = self.config.with_tls_verify(verify);
        self
    }

    /// Trust an additional PEM encoded CA certificate.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.config = self.config.with_ca_cert(path);
        self
    }

    /// Use a custom HTTP primitive instead of the built-in reqwest transport.
    ///
    /// Connection settings on the builder are ignored when a transport is set.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HeadscaleClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                self.config.ensure_valid()?;
                Arc::new(HttpTransport::from_config(&self.config)?)
            }
        };
        Ok(HeadscaleClient { transport })
    }
}

/// Asynchronous Headscale client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct HeadscaleClient {
    transport: Arc<dyn Transport>,
}

impl HeadscaleClient {
    /// Construct a client for `server_url` authenticated with `api_key`.
    pub fn new(server_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        HeadscaleClientBuilder::new(server_url)?
            .with_api_key(api_key)
            .build()
    }

    /// Construct a client from a configuration.
    pub fn from_config(config: HeadscaleConfig) -> Result<Self> {
        HeadscaleClientBuilder::from_config(config).build()
    }

    /// Construct a client over an existing HTTP primitive.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_url() {
        let err = HeadscaleClient::new("not a url", "key").err().unwrap();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn build_rejects_out_of_range_timeout() {
        let err = HeadscaleClientBuilder::new("https://headscale.example.com")
            .unwrap()
            .with_timeout(0)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn build_with_missing_ca_cert_fails() {
        let err = HeadscaleClientBuilder::new("https://headscale.example.com")
            .unwrap()
            .with_ca_cert(PathBuf::from("/nonexistent/headscale-ca.pem"))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn from_config_builds_client() {
        let config = HeadscaleConfig::new("https://headscale.example.com")
            .unwrap()
            .with_api_key("key")
            .with_tls_verify(false);
        assert!(HeadscaleClient::from_config(config).is_ok());
    }
}
