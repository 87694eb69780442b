//! Shared test doubles for the worker crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use shelter_core::{AppConfig, Error};

use crate::net::{NetResponse, Network};
use crate::request::ScopePolicy;

/// Deterministic in-memory network.
///
/// Routed URLs answer with their configured response; unrouted URLs answer
/// 404 while online. Flipping `set_offline` makes every fetch fail the way
/// an unreachable network does.
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, NetResponse>>,
    offline: AtomicBool,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self { routes: Mutex::new(HashMap::new()), offline: AtomicBool::new(false) }
    }

    pub fn route(&self, url: &str, resp: NetResponse) {
        self.routes.lock().unwrap().insert(url.to_string(), resp);
    }

    pub fn route_ok(&self, url: &str, body: &[u8]) {
        self.route(
            url,
            NetResponse {
                status: 200,
                headers: vec![("content-type".to_string(), "text/html".to_string())],
                body: Bytes::copy_from_slice(body),
                redirected: false,
            },
        );
    }

    pub fn route_redirected(&self, url: &str, body: &[u8]) {
        self.route(
            url,
            NetResponse { status: 200, headers: vec![], body: Bytes::copy_from_slice(body), redirected: true },
        );
    }

    pub fn remove_route(&self, url: &str) {
        self.routes.lock().unwrap().remove(url);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, url: &Url) -> Result<NetResponse, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::NetworkUnreachable("offline".to_string()));
        }
        let routes = self.routes.lock().unwrap();
        Ok(routes.get(url.as_str()).cloned().unwrap_or(NetResponse {
            status: 404,
            headers: vec![],
            body: Bytes::new(),
            redirected: false,
        }))
    }
}

/// Config pointing at `https://app.example` with a two-asset essential set.
pub fn test_config() -> AppConfig {
    AppConfig {
        origin: "https://app.example".into(),
        essential_assets: vec!["/".into(), "/manifest.json".into()],
        allowed_hosts: vec!["cdn.cards.example".into()],
        ..Default::default()
    }
}

pub fn test_policy() -> ScopePolicy {
    ScopePolicy::from_config(&test_config()).unwrap()
}
