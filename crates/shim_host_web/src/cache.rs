//! Cache API and `fetch` backed implementations of the offline cache contracts.

use shim_host::{
    CacheRequest, CacheStore, CacheStoreFuture, Network, NetworkFuture, RequestKey,
    RequestMethod, ResponseStatus,
};

#[derive(Debug, Clone)]
/// Native request intercepted by the service worker.
pub struct WebRequest(web_sys::Request);

impl WebRequest {
    /// Borrows the native request.
    pub fn as_raw(&self) -> &web_sys::Request {
        &self.0
    }
}

impl From<web_sys::Request> for WebRequest {
    fn from(request: web_sys::Request) -> Self {
        Self(request)
    }
}

impl CacheRequest for WebRequest {
    fn cache_key(&self) -> RequestKey {
        RequestKey::new(RequestMethod::parse(&self.0.method()), self.0.url())
    }
}

#[derive(Debug, Clone)]
/// Native response passed through untouched to the page.
pub struct WebResponse(web_sys::Response);

impl WebResponse {
    /// Unwraps the native response.
    pub fn into_raw(self) -> web_sys::Response {
        self.0
    }
}

impl From<web_sys::Response> for WebResponse {
    fn from(response: web_sys::Response) -> Self {
        Self(response)
    }
}

impl ResponseStatus for WebResponse {
    fn status(&self) -> u16 {
        self.0.status()
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Bucket store backed by the global `caches` object.
pub struct WebCacheStore;

impl CacheStore for WebCacheStore {
    type Response = WebResponse;

    fn has_bucket<'a>(&'a self, bucket: &'a str) -> CacheStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move { crate::bridge::cache_bucket_exists(bucket).await })
    }

    fn populate_bucket<'a>(
        &'a self,
        bucket: &'a str,
        entries: Vec<(RequestKey, WebResponse)>,
    ) -> CacheStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let entries = entries
                .into_iter()
                .map(|(key, response)| (key.url, response.0))
                .collect();
            crate::bridge::cache_bucket_put_all(bucket, entries).await
        })
    }

    fn match_request<'a>(
        &'a self,
        bucket: &'a str,
        request: &'a RequestKey,
    ) -> CacheStoreFuture<'a, Result<Option<WebResponse>, String>> {
        Box::pin(async move {
            if request.method != RequestMethod::Get {
                return Ok(None);
            }
            Ok(crate::bridge::cache_bucket_match(bucket, &request.url)
                .await?
                .map(WebResponse))
        })
    }

    fn bucket_names<'a>(&'a self) -> CacheStoreFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async move { crate::bridge::cache_bucket_names().await })
    }

    fn delete_bucket<'a>(&'a self, bucket: &'a str) -> CacheStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move { crate::bridge::cache_bucket_delete(bucket).await })
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Network backed by the worker's `fetch`.
pub struct WebNetwork;

impl Network for WebNetwork {
    type Request = WebRequest;
    type Response = WebResponse;

    fn manifest_request(&self, path: &str) -> Result<WebRequest, String> {
        crate::bridge::build_get_request(path).map(WebRequest)
    }

    fn fetch<'a>(
        &'a self,
        request: &'a WebRequest,
    ) -> NetworkFuture<'a, Result<WebResponse, String>> {
        Box::pin(async move {
            crate::bridge::fetch_request(&request.0)
                .await
                .map(WebResponse)
        })
    }
}
