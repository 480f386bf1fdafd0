//! Request identity, cacheable response, and asset manifest models.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// HTTP request method relevant to cache identity.
pub enum RequestMethod {
    /// `GET`, the only method the cache stores.
    Get,
    /// `HEAD`.
    Head,
    /// `POST`.
    Post,
    /// Any other method, stored upper-cased.
    Other(String),
}

impl RequestMethod {
    /// Parses a method name case-insensitively.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("GET") {
            Self::Get
        } else if trimmed.eq_ignore_ascii_case("HEAD") {
            Self::Head
        } else if trimmed.eq_ignore_ascii_case("POST") {
            Self::Post
        } else {
            Self::Other(trimmed.to_ascii_uppercase())
        }
    }

    /// Returns the canonical upper-case method name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identity of a request inside a cache bucket: method plus URL.
pub struct RequestKey {
    /// Request method.
    pub method: RequestMethod,
    /// Request URL exactly as presented to the cache.
    pub url: String,
}

impl RequestKey {
    /// Builds a `GET` key for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: RequestMethod::Get,
            url: url.into(),
        }
    }

    /// Builds a key for an arbitrary method.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A request type that can report its cache identity.
pub trait CacheRequest {
    /// Returns the method+URL identity used for bucket lookups.
    fn cache_key(&self) -> RequestKey;
}

impl CacheRequest for RequestKey {
    fn cache_key(&self) -> RequestKey {
        self.clone()
    }
}

/// A response type whose HTTP status can be inspected before it is cached.
pub trait ResponseStatus {
    /// Returns the HTTP status code.
    fn status(&self) -> u16;

    /// Returns whether the status is in the success range `200..=299`.
    fn is_success(&self) -> bool {
        (200..=299).contains(&self.status())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Owned response used by in-memory adapters and tests.
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// Builds a `200 OK` response with `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Builds an empty response with `status`.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

impl ResponseStatus for CachedResponse {
    fn status(&self) -> u16 {
        self.status
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
/// Ordered set of root-relative asset paths pre-cached at install time.
pub struct AssetManifest {
    paths: Vec<String>,
}

impl AssetManifest {
    /// Builds a manifest, dropping repeated paths while keeping first-seen order.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for path in paths {
            let path = path.into();
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        Self { paths: unique }
    }

    /// Iterates paths in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Returns the number of paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns whether the manifest lists no paths.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl From<Vec<String>> for AssetManifest {
    fn from(paths: Vec<String>) -> Self {
        Self::from_paths(paths)
    }
}

impl From<AssetManifest> for Vec<String> {
    fn from(manifest: AssetManifest) -> Self {
        manifest.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!(RequestMethod::parse("get"), RequestMethod::Get);
        assert_eq!(RequestMethod::parse(" Post "), RequestMethod::Post);
        assert_eq!(RequestMethod::parse("patch").as_str(), "PATCH");
        assert_eq!(RequestMethod::parse("patch"), RequestMethod::parse("PATCH"));
    }

    #[test]
    fn request_keys_compare_by_method_and_url() {
        assert_eq!(RequestKey::get("/index.html"), RequestKey::get("/index.html"));
        assert_ne!(
            RequestKey::get("/index.html"),
            RequestKey::new(RequestMethod::Post, "/index.html")
        );
        assert_eq!(RequestKey::get("/").to_string(), "GET /");
    }

    #[test]
    fn manifest_keeps_first_occurrence_order() {
        let manifest = AssetManifest::from_paths(["/", "/a.js", "/", "/b.wasm", "/a.js"]);
        assert_eq!(manifest.iter().collect::<Vec<_>>(), vec!["/", "/a.js", "/b.wasm"]);

        let parsed: AssetManifest = serde_json::from_str(r#"["/x", "/x", "/y"]"#).expect("json");
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(CachedResponse::ok("x").is_success());
        assert!(CachedResponse::with_status(204).is_success());
        assert!(!CachedResponse::with_status(304).is_success());
        assert!(!CachedResponse::with_status(404).is_success());
    }
}
