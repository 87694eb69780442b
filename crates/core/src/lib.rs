//! Core types and shared functionality for shelter.
//!
//! This crate provides:
//! - The cache store with SQLite backend
//! - Versioned cache names
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod name;

pub use cache::{CacheDb, CachedEntry};
pub use config::AppConfig;
pub use error::Error;
pub use name::CacheName;
