//! Install/activate lifecycle for a single worker version.
//!
//! A new version always starts at `Installing` while a previously activated
//! version keeps serving traffic. Install never promotes itself; activation
//! happens either immediately on a first-ever install or when the update
//! channel says so. That separation is what prevents reload storms: an
//! install that forced activation would change the controller under every
//! open page at once.

use std::sync::Arc;

use shelter_core::{CacheDb, CacheName, CachedEntry, Error};

use crate::clients::ClientRegistry;
use crate::net::Network;
use crate::request::ScopePolicy;

/// Lifecycle states of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    /// Installed, possibly waiting for promotion.
    Installed,
    Activating,
    Activated,
}

/// Outcome of the install step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Essential assets stored.
    pub cached: usize,
    /// Essential assets that failed to fetch or store.
    pub failed: usize,
}

/// Outcome of the activate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    /// Stale cache names deleted.
    pub pruned: Vec<String>,
    /// Open pages claimed.
    pub claimed: usize,
}

/// Owns install and activate for one versioned cache name.
pub struct LifecycleController {
    cache: CacheDb,
    net: Arc<dyn Network>,
    policy: Arc<ScopePolicy>,
    cache_name: CacheName,
    state: WorkerState,
}

impl LifecycleController {
    pub fn new(cache: CacheDb, net: Arc<dyn Network>, policy: Arc<ScopePolicy>, cache_name: CacheName) -> Self {
        Self { cache, net, policy, cache_name, state: WorkerState::Installing }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn cache_name(&self) -> &CacheName {
        &self.cache_name
    }

    /// Populate this version's cache with the essential asset set.
    ///
    /// Each asset is independent: a failed fetch or store is logged and
    /// counted, and the remaining assets still get cached. Install never
    /// triggers activation.
    pub async fn install(&mut self) -> Result<InstallReport, Error> {
        self.state = WorkerState::Installing;
        let cache_name = self.cache_name.to_string();
        let mut report = InstallReport { cached: 0, failed: 0 };

        for path in self.policy.essential_assets() {
            let url = match self.policy.asset_url(path) {
                Ok(url) => url,
                Err(err) => {
                    tracing::warn!(%path, %err, "skipping unresolvable essential asset");
                    report.failed += 1;
                    continue;
                }
            };

            match self.net.fetch(&url).await {
                Ok(resp) if resp.is_cacheable() => {
                    let entry =
                        CachedEntry::from_response("GET", url.as_str(), resp.status, resp.headers, resp.body.to_vec());
                    match self.cache.put_entry(&cache_name, &entry).await {
                        Ok(()) => report.cached += 1,
                        Err(err) => {
                            tracing::warn!(%url, %err, "failed to store essential asset");
                            report.failed += 1;
                        }
                    }
                }
                Ok(resp) => {
                    tracing::warn!(%url, status = resp.status, "essential asset not cacheable");
                    report.failed += 1;
                }
                Err(err) => {
                    tracing::warn!(%url, %err, "failed to fetch essential asset");
                    report.failed += 1;
                }
            }
        }

        self.state = WorkerState::Installed;
        tracing::info!(cache = %self.cache_name, cached = report.cached, failed = report.failed, "install finished");
        Ok(report)
    }

    /// Prune stale sibling caches, record the controller, and claim pages.
    ///
    /// Idempotent: re-running with no new version deletes nothing and
    /// re-claims the same pages.
    pub async fn activate(&mut self, clients: &dyn ClientRegistry) -> Result<ActivateReport, Error> {
        self.state = WorkerState::Activating;

        let mut pruned = Vec::new();
        for name in self.cache.list_cache_names().await? {
            if self.cache_name.is_stale_sibling(&name) {
                let deleted = self.cache.delete_entries(&name).await?;
                tracing::info!(cache = %name, entries = deleted, "pruned stale cache");
                pruned.push(name);
            }
        }

        self.cache
            .set_controller(self.cache_name.namespace(), &self.cache_name.to_string())
            .await?;

        let claimed = clients.claim(&self.cache_name).await;

        self.state = WorkerState::Activated;
        tracing::info!(cache = %self.cache_name, claimed, "activated");
        Ok(ActivateReport { pruned, claimed })
    }
}
