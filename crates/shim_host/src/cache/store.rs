//! Versioned cache bucket store contract and its in-memory adapter.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use super::request::{CachedResponse, RequestKey};

/// Object-safe boxed future used by [`CacheStore`] async methods.
pub type CacheStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host cache store holding one bucket of responses per version string.
///
/// Buckets are populated once and then only read or deleted as a whole.
pub trait CacheStore {
    /// Stored response type handed back on a lookup hit.
    type Response;

    /// Returns whether a bucket named `bucket` exists.
    fn has_bucket<'a>(&'a self, bucket: &'a str) -> CacheStoreFuture<'a, Result<bool, String>>;

    /// Creates `bucket` holding exactly `entries`.
    fn populate_bucket<'a>(
        &'a self,
        bucket: &'a str,
        entries: Vec<(RequestKey, Self::Response)>,
    ) -> CacheStoreFuture<'a, Result<(), String>>;

    /// Looks up `request` by method+URL inside `bucket`. A missing bucket is a miss.
    fn match_request<'a>(
        &'a self,
        bucket: &'a str,
        request: &'a RequestKey,
    ) -> CacheStoreFuture<'a, Result<Option<Self::Response>, String>>;

    /// Lists every bucket name.
    fn bucket_names<'a>(&'a self) -> CacheStoreFuture<'a, Result<Vec<String>, String>>;

    /// Deletes `bucket`, returning whether it existed.
    fn delete_bucket<'a>(&'a self, bucket: &'a str) -> CacheStoreFuture<'a, Result<bool, String>>;
}

#[derive(Debug)]
/// In-memory bucket store keyed by bucket name, then request identity.
pub struct MemoryCacheStore<R = CachedResponse> {
    buckets: Rc<RefCell<BTreeMap<String, HashMap<RequestKey, R>>>>,
    reject_writes: Rc<Cell<bool>>,
    write_limit: Rc<Cell<Option<usize>>>,
    reject_deletes: Rc<Cell<bool>>,
    lookups: Rc<Cell<usize>>,
}

impl<R> Clone for MemoryCacheStore<R> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            reject_writes: self.reject_writes.clone(),
            write_limit: self.write_limit.clone(),
            reject_deletes: self.reject_deletes.clone(),
            lookups: self.lookups.clone(),
        }
    }
}

impl<R> Default for MemoryCacheStore<R> {
    fn default() -> Self {
        Self {
            buckets: Rc::new(RefCell::new(BTreeMap::new())),
            reject_writes: Rc::new(Cell::new(false)),
            write_limit: Rc::new(Cell::new(None)),
            reject_deletes: Rc::new(Cell::new(false)),
            lookups: Rc::new(Cell::new(0)),
        }
    }
}

impl<R> MemoryCacheStore<R> {
    /// Makes subsequent bucket writes fail, simulating a quota error.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    /// Makes subsequent populates write only the first `limit` entries, then fail.
    ///
    /// The bucket is left behind holding the written entries, as a host cache does when a put is
    /// rejected mid-way.
    pub fn fail_writes_after(&self, limit: Option<usize>) {
        self.write_limit.set(limit);
    }

    /// Makes subsequent bucket deletes fail.
    pub fn reject_deletes(&self, reject: bool) {
        self.reject_deletes.set(reject);
    }

    /// Returns the sorted keys stored in `bucket`, or `None` when it does not exist.
    pub fn entries(&self, bucket: &str) -> Option<Vec<RequestKey>> {
        self.buckets.borrow().get(bucket).map(|entries| {
            let mut keys: Vec<RequestKey> = entries.keys().cloned().collect();
            keys.sort_by(|a, b| {
                a.url
                    .cmp(&b.url)
                    .then_with(|| a.method.as_str().cmp(b.method.as_str()))
            });
            keys
        })
    }

    /// Returns how many lookups have been served.
    pub fn lookup_count(&self) -> usize {
        self.lookups.get()
    }
}

impl<R: Clone + 'static> CacheStore for MemoryCacheStore<R> {
    type Response = R;

    fn has_bucket<'a>(&'a self, bucket: &'a str) -> CacheStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move { Ok(self.buckets.borrow().contains_key(bucket)) })
    }

    fn populate_bucket<'a>(
        &'a self,
        bucket: &'a str,
        entries: Vec<(RequestKey, R)>,
    ) -> CacheStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            if self.reject_writes.get() {
                return Err(format!("quota exceeded while writing bucket {bucket}"));
            }
            let mut buckets = self.buckets.borrow_mut();
            if buckets.contains_key(bucket) {
                return Err(format!("bucket {bucket} is already populated"));
            }
            match self.write_limit.get() {
                Some(limit) if limit < entries.len() => {
                    buckets.insert(bucket.to_string(), entries.into_iter().take(limit).collect());
                    Err(format!("quota exceeded after {limit} entries in bucket {bucket}"))
                }
                _ => {
                    buckets.insert(bucket.to_string(), entries.into_iter().collect());
                    Ok(())
                }
            }
        })
    }

    fn match_request<'a>(
        &'a self,
        bucket: &'a str,
        request: &'a RequestKey,
    ) -> CacheStoreFuture<'a, Result<Option<R>, String>> {
        Box::pin(async move {
            self.lookups.set(self.lookups.get() + 1);
            Ok(self
                .buckets
                .borrow()
                .get(bucket)
                .and_then(|entries| entries.get(request))
                .cloned())
        })
    }

    fn bucket_names<'a>(&'a self) -> CacheStoreFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async move { Ok(self.buckets.borrow().keys().cloned().collect()) })
    }

    fn delete_bucket<'a>(&'a self, bucket: &'a str) -> CacheStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move {
            if self.reject_deletes.get() {
                return Err(format!("cannot delete bucket {bucket}"));
            }
            Ok(self.buckets.borrow_mut().remove(bucket).is_some())
        })
    }
}
