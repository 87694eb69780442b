//! Request model and classification.
//!
//! Every intercepted request is classified once, per event, into a tagged
//! variant; the interceptor's fallback and write-back policy is then a single
//! match over that variant. Nothing derived here is cached across events.

use shelter_core::{AppConfig, Error};
use url::Url;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A top-level page navigation.
    Navigate,
    /// Any subresource load (scripts, styles, data, images).
    Subresource,
}

/// An intercepted request, as handed over by the page.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
}

impl PageRequest {
    pub fn new(method: impl Into<String>, url: Url, mode: RequestMode) -> Self {
        Self { method: method.into(), url, mode }
    }

    /// A GET navigation request.
    pub fn navigate(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Navigate)
    }

    /// A GET subresource request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Subresource)
    }
}

/// Per-request classification, computed from method, scheme, origin, and
/// path membership in the essential asset set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Navigation,
    EssentialAsset,
    OtherSameOrigin,
    AllowlistedCrossOrigin,
    /// Not intercepted at all; the request passes through unmodified.
    Ignored,
}

/// The worker's view of its scope: own origin, essential asset set,
/// cross-origin allowlist, and the offline fallback path.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    origin: Url,
    essential_assets: Vec<String>,
    allowed_hosts: Vec<String>,
    offline_fallback_path: String,
    cache_cross_origin: bool,
}

impl ScopePolicy {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            origin,
            essential_assets: config.essential_assets.clone(),
            allowed_hosts: config.allowed_hosts.clone(),
            offline_fallback_path: config.offline_fallback_path.clone(),
            cache_cross_origin: config.cache_cross_origin,
        })
    }

    pub fn essential_assets(&self) -> &[String] {
        &self.essential_assets
    }

    pub fn cache_cross_origin(&self) -> bool {
        self.cache_cross_origin
    }

    /// Absolute URL of a root-relative asset path on the app's own origin.
    pub fn asset_url(&self, path: &str) -> Result<Url, Error> {
        self.origin.join(path).map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Absolute URL of the offline fallback shell.
    pub fn fallback_url(&self) -> Result<Url, Error> {
        self.asset_url(&self.offline_fallback_path)
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.origin.scheme()
            && url.host_str() == self.origin.host_str()
            && url.port_or_known_default() == self.origin.port_or_known_default()
    }

    fn is_allowlisted_host(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => self.allowed_hosts.iter().any(|h| h == host),
            None => false,
        }
    }

    fn is_essential_path(&self, url: &Url) -> bool {
        self.essential_assets.iter().any(|p| p == url.path())
    }
}

/// Classify one request against the scope policy.
pub fn classify(req: &PageRequest, policy: &ScopePolicy) -> RequestClass {
    if !req.method.eq_ignore_ascii_case("GET") {
        return RequestClass::Ignored;
    }

    if !matches!(req.url.scheme(), "http" | "https") {
        return RequestClass::Ignored;
    }

    if !policy.is_same_origin(&req.url) {
        return if policy.is_allowlisted_host(&req.url) {
            RequestClass::AllowlistedCrossOrigin
        } else {
            RequestClass::Ignored
        };
    }

    if req.mode == RequestMode::Navigate {
        return RequestClass::Navigation;
    }

    if policy.is_essential_path(&req.url) {
        return RequestClass::EssentialAsset;
    }

    RequestClass::OtherSameOrigin
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_core::AppConfig;

    fn policy() -> ScopePolicy {
        let config = AppConfig {
            origin: "https://app.example".into(),
            essential_assets: vec!["/".into(), "/manifest.json".into()],
            allowed_hosts: vec!["cdn.cards.example".into()],
            ..Default::default()
        };
        ScopePolicy::from_config(&config).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classify_navigation() {
        let req = PageRequest::navigate(url("https://app.example/decks"));
        assert_eq!(classify(&req, &policy()), RequestClass::Navigation);
    }

    #[test]
    fn test_classify_essential_asset() {
        let req = PageRequest::get(url("https://app.example/manifest.json"));
        assert_eq!(classify(&req, &policy()), RequestClass::EssentialAsset);
    }

    #[test]
    fn test_classify_other_same_origin() {
        let req = PageRequest::get(url("https://app.example/api/cards?page=2"));
        assert_eq!(classify(&req, &policy()), RequestClass::OtherSameOrigin);
    }

    #[test]
    fn test_classify_allowlisted_cross_origin() {
        let req = PageRequest::get(url("https://cdn.cards.example/images/001.png"));
        assert_eq!(classify(&req, &policy()), RequestClass::AllowlistedCrossOrigin);
    }

    #[test]
    fn test_classify_foreign_origin_ignored() {
        let req = PageRequest::get(url("https://tracker.example/pixel.gif"));
        assert_eq!(classify(&req, &policy()), RequestClass::Ignored);
    }

    #[test]
    fn test_classify_non_get_ignored() {
        let req = PageRequest::new("POST", url("https://app.example/api/favorites"), RequestMode::Subresource);
        assert_eq!(classify(&req, &policy()), RequestClass::Ignored);
    }

    #[test]
    fn test_classify_extension_scheme_ignored() {
        let req = PageRequest::get(url("chrome-extension://abcdef/script.js"));
        assert_eq!(classify(&req, &policy()), RequestClass::Ignored);
    }

    #[test]
    fn test_classify_scheme_mismatch_not_same_origin() {
        // http vs https is a different origin, and app.example is not in
        // the cross-origin allowlist
        let req = PageRequest::get(url("http://app.example/manifest.json"));
        assert_eq!(classify(&req, &policy()), RequestClass::Ignored);
    }

    #[test]
    fn test_asset_and_fallback_urls() {
        let p = policy();
        assert_eq!(p.asset_url("/manifest.json").unwrap().as_str(), "https://app.example/manifest.json");
        assert_eq!(p.fallback_url().unwrap().as_str(), "https://app.example/");
    }
}
