//! Open-page registry and the claim mechanism.
//!
//! Claiming takes control of already-open pages without reloading them: the
//! registry broadcasts the newly activated cache name on a watch channel,
//! and each page decides for itself whether a controller change warrants a
//! reload. The worker never reloads anything.

use async_trait::async_trait;
use tokio::sync::{RwLock, watch};

use shelter_core::CacheName;

/// Takes control of open pages after activation.
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Claim every in-scope page for `controller`. Returns how many pages
    /// are now controlled.
    async fn claim(&self, controller: &CacheName) -> usize;
}

/// The registry of pages connected under one scope.
pub struct PageClients {
    scope: String,
    pages: RwLock<Vec<String>>,
    controller_tx: watch::Sender<Option<String>>,
}

impl PageClients {
    pub fn new(scope: impl Into<String>) -> Self {
        let (controller_tx, _) = watch::channel(None);
        Self { scope: scope.into(), pages: RwLock::new(Vec::new()), controller_tx }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Register an open page by path. Pages outside the scope are not
    /// tracked and never claimed.
    pub async fn connect(&self, path: &str) -> bool {
        if !path.starts_with(&self.scope) {
            tracing::debug!(path, scope = %self.scope, "page outside scope, not tracked");
            return false;
        }
        self.pages.write().await.push(path.to_string());
        true
    }

    /// Observe controller changes. Starts at `None` until a first
    /// activation claims the pages.
    pub fn controller_changes(&self) -> watch::Receiver<Option<String>> {
        self.controller_tx.subscribe()
    }

    pub async fn page_count(&self) -> usize {
        self.pages.read().await.len()
    }
}

#[async_trait]
impl ClientRegistry for PageClients {
    async fn claim(&self, controller: &CacheName) -> usize {
        let claimed = self.pages.read().await.len();
        self.controller_tx.send_replace(Some(controller.to_string()));
        tracing::debug!(controller = %controller, claimed, "claimed open pages");
        claimed
    }
}
