//! SQLite-backed store for cached response snapshots.
//!
//! This module provides the durable half of the worker: a persistent
//! key-value cache using SQLite with async access via tokio-rusqlite.
//! It supports:
//!
//! - Entries keyed by request identity (method + URL, SHA-256 hashed)
//! - Versioned cache names, listed and pruned as whole units
//! - A durable per-namespace controller record set at activation
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
