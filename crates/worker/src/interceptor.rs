//! Network-first fetch handling with cache fallback.
//!
//! Invoked once per intercepted request. The policy table:
//!
//! | class                  | network ok        | network down            |
//! |------------------------|-------------------|-------------------------|
//! | `Ignored`              | pass through      | pass through            |
//! | `Navigation`           | serve + write-back| cache, shell, or 503    |
//! | `EssentialAsset`       | serve + write-back| cache or 503            |
//! | `OtherSameOrigin`      | serve             | cache or 503            |
//! | `AllowlistedCrossOrigin`| serve (+ opt-in write-back) | cache or 503  |
//!
//! The interceptor is infallible toward the caller: transient network
//! failures and cache-store errors degrade, they never surface as `Err`.
//! No retry or backoff happens here; that belongs to the calling page.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::watch;

use shelter_core::{CacheDb, CacheName, CachedEntry};

use crate::net::{NetResponse, Network};
use crate::request::{PageRequest, RequestClass, ScopePolicy, classify};

/// Outcome of one intercepted request.
#[derive(Debug, Clone)]
pub enum Intercept {
    /// Not handled; the request proceeds unmodified.
    PassThrough,
    /// Handled; this response goes back to the page.
    Response(ServedResponse),
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
    Network,
    Cache,
    OfflineFallback,
    Synthetic,
}

/// A response handed back to the page.
#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub source: ServeSource,
}

impl ServedResponse {
    fn from_net(resp: NetResponse) -> Self {
        Self { status: resp.status, headers: resp.headers, body: resp.body, source: ServeSource::Network }
    }

    fn from_entry(entry: CachedEntry, source: ServeSource) -> Self {
        Self { status: entry.status, headers: entry.headers, body: Bytes::from(entry.body), source }
    }

    /// The synthetic "no data" result for offline misses. A normal value,
    /// distinguishable from a crash, never an error.
    fn service_unavailable() -> Self {
        Self {
            status: 503,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: Bytes::from_static(b"offline"),
            source: ServeSource::Synthetic,
        }
    }
}

/// Stateless fetch handler.
///
/// Holds only durable or event-scoped inputs: the cache store, the network,
/// the scope policy, and a watch on the currently activated cache name. The
/// name is re-read on every event, so an activation between two requests is
/// picked up without any in-memory handoff.
#[derive(Clone)]
pub struct FetchInterceptor {
    cache: CacheDb,
    net: Arc<dyn Network>,
    policy: Arc<ScopePolicy>,
    current: watch::Receiver<CacheName>,
}

impl FetchInterceptor {
    pub fn new(
        cache: CacheDb,
        net: Arc<dyn Network>,
        policy: Arc<ScopePolicy>,
        current: watch::Receiver<CacheName>,
    ) -> Self {
        Self { cache, net, policy, current }
    }

    /// Handle one intercepted request.
    pub async fn handle(&self, req: &PageRequest) -> Intercept {
        let class = classify(req, &self.policy);
        if class == RequestClass::Ignored {
            return Intercept::PassThrough;
        }

        let cache_name = self.current.borrow().clone().to_string();

        match self.net.fetch(&req.url).await {
            Ok(resp) => {
                if self.should_write_back(class, &resp) {
                    self.write_back(&cache_name, req, &resp).await;
                }
                Intercept::Response(ServedResponse::from_net(resp))
            }
            Err(err) => {
                tracing::debug!(url = %req.url, %err, "network attempt failed, falling back to cache");
                self.fall_back(&cache_name, req, class).await
            }
        }
    }

    fn should_write_back(&self, class: RequestClass, resp: &NetResponse) -> bool {
        if !resp.is_cacheable() {
            return false;
        }
        match class {
            RequestClass::Navigation | RequestClass::EssentialAsset => true,
            RequestClass::AllowlistedCrossOrigin => self.policy.cache_cross_origin(),
            RequestClass::OtherSameOrigin | RequestClass::Ignored => false,
        }
    }

    async fn write_back(&self, cache_name: &str, req: &PageRequest, resp: &NetResponse) {
        let entry = CachedEntry::from_response(
            &req.method,
            req.url.as_str(),
            resp.status,
            resp.headers.clone(),
            resp.body.to_vec(),
        );
        // Last write wins on concurrent fetches of the same key.
        if let Err(err) = self.cache.put_entry(cache_name, &entry).await {
            tracing::warn!(url = %req.url, %err, "cache write-back failed");
        } else {
            tracing::debug!(url = %req.url, cache = cache_name, "cached response");
        }
    }

    async fn fall_back(&self, cache_name: &str, req: &PageRequest, class: RequestClass) -> Intercept {
        match self.cache.get_entry(cache_name, &req.method, req.url.as_str()).await {
            Ok(Some(entry)) => {
                tracing::debug!(url = %req.url, "served from cache");
                Intercept::Response(ServedResponse::from_entry(entry, ServeSource::Cache))
            }
            Ok(None) if class == RequestClass::Navigation => self.fall_back_to_shell(cache_name, req).await,
            Ok(None) => Intercept::Response(ServedResponse::service_unavailable()),
            Err(err) => {
                tracing::warn!(url = %req.url, %err, "cache store unavailable");
                Intercept::Response(ServedResponse::service_unavailable())
            }
        }
    }

    async fn fall_back_to_shell(&self, cache_name: &str, req: &PageRequest) -> Intercept {
        let shell_url = match self.policy.fallback_url() {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(%err, "invalid offline fallback path");
                return Intercept::Response(ServedResponse::service_unavailable());
            }
        };

        match self.cache.get_entry(cache_name, "GET", shell_url.as_str()).await {
            Ok(Some(entry)) => {
                tracing::debug!(url = %req.url, shell = %shell_url, "navigation served from offline shell");
                Intercept::Response(ServedResponse::from_entry(entry, ServeSource::OfflineFallback))
            }
            Ok(None) => Intercept::Response(ServedResponse::service_unavailable()),
            Err(err) => {
                tracing::warn!(%err, "cache store unavailable");
                Intercept::Response(ServedResponse::service_unavailable())
            }
        }
    }
}
