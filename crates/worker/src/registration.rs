//! Worker registration and the host task.
//!
//! `register` is the one call a page makes to install the worker for a
//! scope. It opens the store, installs the configured version, and decides
//! whether that version activates now (first install, or re-registration of
//! the already-active version) or waits for the update channel. The host
//! task it spawns is the only place a waiting version gets promoted.
//!
//! Registration failure is an ordinary `Err` for the page to log; the app
//! keeps working as a plain network-dependent app without it.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use shelter_core::{AppConfig, CacheDb, CacheName, Error};

use crate::clients::PageClients;
use crate::interceptor::FetchInterceptor;
use crate::lifecycle::LifecycleController;
use crate::net::Network;
use crate::request::ScopePolicy;
use crate::update::{Command, UpdateChannel};

/// A live worker registration for one scope.
pub struct Registration {
    scope: String,
    interceptor: FetchInterceptor,
    channel: UpdateChannel,
    clients: Arc<PageClients>,
    current: watch::Receiver<CacheName>,
}

impl Registration {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The fetch handler pages route their requests through.
    pub fn interceptor(&self) -> &FetchInterceptor {
        &self.interceptor
    }

    /// Sender half of the update channel.
    pub fn update_channel(&self) -> UpdateChannel {
        self.channel.clone()
    }

    /// The page registry for this scope.
    pub fn clients(&self) -> Arc<PageClients> {
        Arc::clone(&self.clients)
    }

    /// Observe controller changes, as a page would.
    pub fn controller_changes(&self) -> watch::Receiver<Option<String>> {
        self.clients.controller_changes()
    }

    /// The currently active cache name.
    pub fn cache_name(&self) -> CacheName {
        self.current.borrow().clone()
    }

    /// Observe cache-name changes (activations of newer versions).
    pub fn cache_name_changes(&self) -> watch::Receiver<CacheName> {
        self.current.clone()
    }
}

/// Install (or update) the worker for a path scope, opening the store at
/// the configured path.
pub async fn register(config: AppConfig, net: Arc<dyn Network>, scope: &str) -> Result<Registration, Error> {
    let cache = CacheDb::open(&config.db_path).await?;
    register_with(cache, config, net, scope).await
}

/// Install (or update) the worker on an already-open store.
pub async fn register_with(
    cache: CacheDb,
    config: AppConfig,
    net: Arc<dyn Network>,
    scope: &str,
) -> Result<Registration, Error> {
    let policy = Arc::new(ScopePolicy::from_config(&config)?);
    let target = config.cache_name();
    let clients = Arc::new(PageClients::new(scope));

    let active = cache.controller(&config.namespace).await?;

    let mut ctl = LifecycleController::new(cache.clone(), Arc::clone(&net), Arc::clone(&policy), target.clone());
    ctl.install().await?;

    // The interceptor serves from whatever is active right now; a freshly
    // installed version only shows up here once it activates.
    let initial = match active.as_deref() {
        Some(name) => CacheName::parse(name).unwrap_or_else(|_| target.clone()),
        None => target.clone(),
    };
    let (name_tx, name_rx) = watch::channel(initial);

    let target_str = target.to_string();
    let waiting = match active.as_deref() {
        Some(current) if current != target_str => {
            tracing::info!(active = current, waiting = %target, "version installed, waiting for SKIP_WAITING");
            Some(ctl)
        }
        _ => {
            let report = ctl.activate(clients.as_ref()).await?;
            name_tx.send_replace(target.clone());
            tracing::info!(cache = %target, pruned = report.pruned.len(), claimed = report.claimed, "version active");
            None
        }
    };

    let (tx, mut rx) = mpsc::channel(8);
    let host_clients = Arc::clone(&clients);
    tokio::spawn(async move {
        let mut waiting = waiting;
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::SkipWaiting => match waiting.take() {
                    Some(mut ctl) => match ctl.activate(host_clients.as_ref()).await {
                        Ok(report) => {
                            name_tx.send_replace(ctl.cache_name().clone());
                            tracing::info!(
                                cache = %ctl.cache_name(),
                                pruned = report.pruned.len(),
                                claimed = report.claimed,
                                "waiting version took effect"
                            );
                        }
                        Err(err) => {
                            tracing::error!(%err, "activation failed, version stays waiting");
                            waiting = Some(ctl);
                        }
                    },
                    None => tracing::debug!("skip-waiting received with no waiting version"),
                },
                Command::GetVersion(reply) => {
                    let _ = reply.send(name_tx.borrow().to_string());
                }
            }
        }
    });

    let interceptor = FetchInterceptor::new(cache, net, policy, name_rx.clone());

    Ok(Registration {
        scope: scope.to_string(),
        interceptor,
        channel: UpdateChannel { tx },
        clients,
        current: name_rx,
    })
}
