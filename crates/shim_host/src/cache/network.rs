//! Network contract used by the offline cache controller, plus a scripted test adapter.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use super::request::{CacheRequest, CachedResponse, RequestKey, ResponseStatus};

/// Object-safe boxed future used by [`Network`] async methods.
pub type NetworkFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Network boundary of the offline cache controller.
pub trait Network {
    /// Native request type forwarded on a cache miss.
    type Request: CacheRequest;
    /// Native response type returned by the network.
    type Response: ResponseStatus;

    /// Builds the `GET` request used to pre-cache a manifest `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when `path` cannot be turned into a request.
    fn manifest_request(&self, path: &str) -> Result<Self::Request, String>;

    /// Sends `request` and resolves to the network's response.
    fn fetch<'a>(
        &'a self,
        request: &'a Self::Request,
    ) -> NetworkFuture<'a, Result<Self::Response, String>>;
}

#[derive(Debug, Clone, Default)]
/// Scripted network keyed by URL that records every request it serves.
pub struct MemoryNetwork {
    routes: Rc<RefCell<HashMap<String, Result<CachedResponse, String>>>>,
    calls: Rc<RefCell<Vec<RequestKey>>>,
}

impl MemoryNetwork {
    /// Serves `response` for `url`.
    pub fn with_route(self, url: &str, response: CachedResponse) -> Self {
        self.routes.borrow_mut().insert(url.to_string(), Ok(response));
        self
    }

    /// Fails requests for `url` with `reason`.
    pub fn with_failure(self, url: &str, reason: &str) -> Self {
        self.routes
            .borrow_mut()
            .insert(url.to_string(), Err(reason.to_string()));
        self
    }

    /// Returns every request served so far, in order.
    pub fn calls(&self) -> Vec<RequestKey> {
        self.calls.borrow().clone()
    }

    /// Returns how many requests were served.
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Network for MemoryNetwork {
    type Request = RequestKey;
    type Response = CachedResponse;

    fn manifest_request(&self, path: &str) -> Result<RequestKey, String> {
        Ok(RequestKey::get(path))
    }

    fn fetch<'a>(
        &'a self,
        request: &'a RequestKey,
    ) -> NetworkFuture<'a, Result<CachedResponse, String>> {
        Box::pin(async move {
            self.calls.borrow_mut().push(request.clone());
            self.routes
                .borrow()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| Err(format!("connection refused: {}", request.url)))
        })
    }
}
