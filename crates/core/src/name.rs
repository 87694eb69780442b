//! Versioned cache names.
//!
//! A cache name encodes a logical namespace plus a monotonically increasing
//! version, e.g. `app-cache-v3`. At any point in time exactly one name per
//! namespace is current; every sibling with the same namespace is stale and
//! eligible for deletion at activation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A versioned cache name: `{namespace}-v{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheName {
    namespace: String,
    version: u32,
}

impl CacheName {
    /// Create a cache name from a namespace and version.
    pub fn new(namespace: impl Into<String>, version: u32) -> Self {
        Self { namespace: namespace.into(), version }
    }

    /// Parse a stored cache name back into namespace and version.
    ///
    /// The version suffix is the last `-v<digits>` segment, so namespaces
    /// may themselves contain hyphens (`app-cache-v3` -> `app-cache`, 3).
    pub fn parse(s: &str) -> Result<Self, Error> {
        let idx = s.rfind("-v").ok_or_else(|| Error::InvalidCacheName(s.to_string()))?;
        let (namespace, suffix) = s.split_at(idx);
        let version: u32 = suffix[2..]
            .parse()
            .map_err(|_| Error::InvalidCacheName(s.to_string()))?;
        if namespace.is_empty() {
            return Err(Error::InvalidCacheName(s.to_string()));
        }
        Ok(Self { namespace: namespace.to_string(), version })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether `stored` belongs to this name's namespace but is a different
    /// version, i.e. a stale sibling to prune at activation.
    pub fn is_stale_sibling(&self, stored: &str) -> bool {
        match Self::parse(stored) {
            Ok(other) => other.namespace == self.namespace && other.version != self.version,
            // Unparseable names under this namespace prefix are stale debris
            // from older naming schemes.
            Err(_) => stored.starts_with(self.namespace.as_str()) && stored != self.to_string(),
        }
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-v{}", self.namespace, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let name = CacheName::new("app-cache", 3);
        assert_eq!(name.to_string(), "app-cache-v3");
        let parsed = CacheName::parse("app-cache-v3").unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_parse_hyphenated_namespace() {
        let parsed = CacheName::parse("my-app-cache-v12").unwrap();
        assert_eq!(parsed.namespace(), "my-app-cache");
        assert_eq!(parsed.version(), 12);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(CacheName::parse("nodashv").is_err());
        assert!(CacheName::parse("app-vx").is_err());
        assert!(CacheName::parse("-v3").is_err());
    }

    #[test]
    fn test_stale_sibling() {
        let current = CacheName::new("app-cache", 2);
        assert!(current.is_stale_sibling("app-cache-v1"));
        assert!(current.is_stale_sibling("app-cache-v3"));
        assert!(!current.is_stale_sibling("app-cache-v2"));
        assert!(!current.is_stale_sibling("other-cache-v2"));
    }

    #[test]
    fn test_stale_sibling_legacy_name() {
        let current = CacheName::new("app-cache", 2);
        assert!(current.is_stale_sibling("app-cache-legacy"));
    }
}
