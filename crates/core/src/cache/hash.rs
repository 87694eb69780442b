//! Request-key generation.
//!
//! A cached entry is keyed by request identity: method plus full URL,
//! hashed so the key is fixed-width and index-friendly.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let k1 = compute_request_key("GET", "https://example.com/");
        let k2 = compute_request_key("GET", "https://example.com/");
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        let k1 = compute_request_key("get", "https://example.com/");
        let k2 = compute_request_key("GET", "https://example.com/");
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_key_differs_by_url() {
        let k1 = compute_request_key("GET", "https://example.com/");
        let k2 = compute_request_key("GET", "https://example.com/manifest.json");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", "https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
