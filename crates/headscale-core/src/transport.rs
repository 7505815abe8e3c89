//! The HTTP primitive resource handlers are built on.
//!
//! [`Transport`] exposes exactly three verbs. Implementations own
//! authentication and connection handling, and must hand back a
//! [`RawResponse`] whose body has already been read to completion so the
//! underlying connection is released regardless of how the caller proceeds.

use crate::config::HeadscaleConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("headscale-client/", env!("CARGO_PKG_VERSION"));

/// A fully drained HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: StatusCode,
    body: String,
}

impl RawResponse {
    /// Wrap a status code and body.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response body as text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|err| {
            Error::Decode(format!(
                "Failed to decode HTTP {} response body: {err}",
                self.status.as_u16()
            ))
        })
    }

    /// Turn the response into an [`Error::Unclassified`].
    #[must_use]
    pub fn into_unclassified(self) -> Error {
        Error::Unclassified {
            status: self.status.as_u16(),
            body: self.body,
        }
    }
}

/// Minimal authenticated HTTP primitive.
///
/// Paths are relative to the API root (for example `user/alice`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request.
    async fn get(&self, path: &str) -> Result<RawResponse>;

    /// Issue a POST request with a JSON body.
    async fn post(&self, path: &str, body: &Value) -> Result<RawResponse>;

    /// Issue a DELETE request.
    async fn delete(&self, path: &str) -> Result<RawResponse>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build a transport from a client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the URL, CA certificate or HTTP
    /// client settings are unusable.
    pub fn from_config(config: &HeadscaleConfig) -> Result<Self> {
        let base_url = config.api_base_url()?;

        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .pool_idle_timeout(config.pool_idle_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(10));

        if !config.tls_verify {
            warn!("TLS verification disabled for Headscale client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &config.tls_ca_cert {
            debug!("loading Headscale CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build Headscale HTTP client: {err}"))
        })?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone().map(SecretString::from),
        })
    }

    /// API root every request path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidEndpoint(format!("Base URL `{}` cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<RawResponse> {
        let url = self.build_url(path)?;
        let mut request = self
            .http
            .request(method.clone(), url)
            .header("Accept", "application/json");

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }
        if let Some(payload) = body {
            request = request.json(payload);
        }

        info!(%method, path, "Headscale request");

        let response = request.send().await.map_err(Error::from)?;
        let status = response.status();
        let text = response.text().await.map_err(|err| {
            Error::Transport(format!("Failed to read response body for `{path}`: {err}"))
        })?;

        debug!(%method, path, status = status.as_u16(), bytes = text.len(), "Headscale response");

        Ok(RawResponse::new(status, text))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<RawResponse> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<RawResponse> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<RawResponse> {
        self.send(Method::DELETE, path, None).await
    }
}
