//! The offline caching worker.
//!
//! This crate provides the stateful half of shelter: a network intermediary
//! that intercepts page requests, serves cached content when the network is
//! unavailable, and manages versioned cache lifecycles without triggering
//! reload loops.
//!
//! Components:
//! - [`request`] — per-request classification into a tagged variant
//! - [`net`] — the network seam ([`Network`]) and its reqwest implementation
//! - [`interceptor`] — network-first fetch handling with scoped write-back
//! - [`lifecycle`] — install/activate state machine for one worker version
//! - [`update`] — the one-message protocol that promotes a waiting version
//! - [`registration`] — bootstrap entry point wiring the pieces together

pub mod clients;
pub mod interceptor;
pub mod lifecycle;
pub mod net;
pub mod registration;
pub mod request;
pub mod update;

#[cfg(test)]
pub(crate) mod testutil;

pub use clients::{ClientRegistry, PageClients};
pub use interceptor::{FetchInterceptor, Intercept, ServeSource, ServedResponse};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleController, WorkerState};
pub use net::{HttpNetwork, NetConfig, NetResponse, Network};
pub use registration::{Registration, register, register_with};
pub use request::{PageRequest, RequestClass, RequestMode, ScopePolicy, classify};
pub use update::{UpdateChannel, WorkerMessage};
