//! The network seam.
//!
//! The interceptor and the lifecycle controller talk to the network through
//! the [`Network`] trait so tests can swap in a deterministic implementation.
//! [`HttpNetwork`] is the real one, built on reqwest.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

use shelter_core::{AppConfig, Error};

/// A response obtained from the network, fully buffered.
///
/// Non-2xx statuses are still responses; only transport-level failures
/// (unreachable, timeout, abort) surface as errors.
#[derive(Debug, Clone)]
pub struct NetResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Whether the final URL differs from the requested one.
    pub redirected: bool,
}

impl NetResponse {
    /// Whether this response may be written into the cache: a plain 2xx
    /// that was not the product of a redirect.
    pub fn is_cacheable(&self) -> bool {
        (200..300).contains(&self.status) && !self.redirected
    }
}

/// Issues one request and buffers the response.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<NetResponse, Error>;
}

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_body_bytes: usize,
    pub max_redirects: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            user_agent: "shelter/0.1".to_string(),
            timeout: Duration::from_millis(20_000),
            max_body_bytes: 5 * 1024 * 1024,
            max_redirects: 5,
        }
    }
}

impl NetConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_body_bytes: config.max_body_bytes,
            ..Default::default()
        }
    }
}

/// HTTP-backed [`Network`] implementation.
pub struct HttpNetwork {
    http: Client,
    config: NetConfig,
}

impl HttpNetwork {
    /// Create a new client with the given configuration.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpClient(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, url: &Url) -> Result<NetResponse, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::NetworkUnreachable(e.to_string()))?;

        let status = response.status().as_u16();
        let redirected = response.url().as_str() != url.as_str();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_body_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_body_bytes)));
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect::<Vec<_>>();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkUnreachable(format!("failed to read response: {e}")))?;

        if body.len() > self.config.max_body_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                body.len(),
                self.config.max_body_bytes
            )));
        }

        tracing::debug!(
            url = %url,
            status,
            redirected,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "network fetch"
        );

        Ok(NetResponse { status, headers, body, redirected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_config_default() {
        let config = NetConfig::default();
        assert_eq!(config.user_agent, "shelter/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20_000));
        assert_eq!(config.max_body_bytes, 5 * 1024 * 1024);
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_net_config_from_app_config() {
        let app = AppConfig { user_agent: "test/1".into(), timeout_ms: 5_000, max_body_bytes: 1024, ..Default::default() };
        let config = NetConfig::from_config(&app);
        assert_eq!(config.user_agent, "test/1");
        assert_eq!(config.timeout, Duration::from_millis(5_000));
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn test_http_network_new() {
        let client = HttpNetwork::new(NetConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_cacheable() {
        let ok = NetResponse { status: 200, headers: vec![], body: Bytes::new(), redirected: false };
        assert!(ok.is_cacheable());

        let redirected = NetResponse { status: 200, headers: vec![], body: Bytes::new(), redirected: true };
        assert!(!redirected.is_cacheable());

        let not_found = NetResponse { status: 404, headers: vec![], body: Bytes::new(), redirected: false };
        assert!(!not_found.is_cacheable());
    }
}
