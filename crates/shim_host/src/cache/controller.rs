//! Versioned, cache-first offline controller.
//!
//! The controller runs inside the service-worker context. `install` pre-populates the bucket for
//! the configured version from the asset manifest, all-or-nothing, and `handle_fetch` serves later
//! requests from that bucket before falling back to the network. Misses are never written back.

use futures::future::try_join_all;

use super::{
    network::Network,
    request::{AssetManifest, CacheRequest, RequestKey, ResponseStatus},
    store::CacheStore,
};
use crate::{
    config::{OfflineCacheConfig, StaleBucketPolicy},
    error::CacheError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where a fetch response came from.
pub enum ResponseSource {
    /// Served from the active bucket without touching the network.
    Cache,
    /// Forwarded to the network after a miss.
    Network,
}

impl ResponseSource {
    /// Returns a stable token for log lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "hit",
            Self::Network => "miss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Response selected for one intercepted request.
pub struct FetchOutcome<R> {
    /// Identity of the intercepted request.
    pub key: RequestKey,
    /// Whether the response is a cache hit or a network response.
    pub source: ResponseSource,
    /// Selected response.
    pub response: R,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a successful install.
pub struct InstallReport {
    /// Bucket name that was populated or reused.
    pub version: String,
    /// Request identities written to the bucket; empty when reused.
    pub cached: Vec<RequestKey>,
    /// The bucket already existed, so nothing was fetched.
    pub reused: bool,
    /// An incomplete bucket left by an interrupted install was discarded first.
    pub repaired: bool,
}

/// Offline cache controller bound to one store/network pair and one version.
pub struct OfflineCacheController<S, N> {
    store: S,
    network: N,
    version: String,
    manifest: AssetManifest,
    stale_buckets: StaleBucketPolicy,
}

impl<S, N> OfflineCacheController<S, N>
where
    N: Network,
    S: CacheStore<Response = N::Response>,
{
    /// Creates a controller from injected store/network handles and cache settings.
    pub fn new(store: S, network: N, config: &OfflineCacheConfig) -> Self {
        Self {
            store,
            network,
            version: config.version.clone(),
            manifest: config.manifest.clone(),
            stale_buckets: config.stale_buckets,
        }
    }

    /// Returns the active bucket name.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the manifest pre-cached on install.
    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    /// Returns the injected store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the injected network handle.
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Populates the active bucket with every manifest entry.
    ///
    /// All manifest fetches are issued together and joined. The bucket is only written once every
    /// fetch has produced a success response, so a failed install leaves no bucket behind. An
    /// existing bucket holding every manifest entry is immutable and is reused without fetching;
    /// one missing any entry is discarded and populated again.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Precache`] when any entry fails or answers outside `2xx`, and
    /// [`CacheError::Store`] when the store cannot be queried, written, or rolled back.
    pub async fn install(&self) -> Result<InstallReport, CacheError> {
        let requests = self
            .manifest
            .iter()
            .map(|path| {
                self.network
                    .manifest_request(path)
                    .map(|request| (path, request))
                    .map_err(|reason| CacheError::Precache {
                        url: path.to_string(),
                        reason,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut repaired = false;
        if self
            .store
            .has_bucket(&self.version)
            .await
            .map_err(CacheError::Store)?
        {
            if self.holds_every_entry(&requests).await? {
                return Ok(InstallReport {
                    version: self.version.clone(),
                    cached: Vec::new(),
                    reused: true,
                    repaired: false,
                });
            }
            self.store
                .delete_bucket(&self.version)
                .await
                .map_err(|err| {
                    CacheError::Store(format!(
                        "cannot discard incomplete bucket {}: {err}",
                        self.version
                    ))
                })?;
            repaired = true;
        }

        let entries = try_join_all(requests.iter().map(|(path, request)| async move {
            let response =
                self.network
                    .fetch(request)
                    .await
                    .map_err(|reason| CacheError::Precache {
                        url: path.to_string(),
                        reason,
                    })?;
            if !response.is_success() {
                return Err(CacheError::Precache {
                    url: path.to_string(),
                    reason: format!("HTTP {}", response.status()),
                });
            }
            Ok((request.cache_key(), response))
        }))
        .await?;

        let cached: Vec<RequestKey> = entries.iter().map(|(key, _)| key.clone()).collect();
        if let Err(err) = self.store.populate_bucket(&self.version, entries).await {
            return Err(match self.store.delete_bucket(&self.version).await {
                Ok(_) => CacheError::Store(err),
                Err(rollback) => CacheError::Store(format!(
                    "{err}; rolling back bucket {} failed: {rollback}",
                    self.version
                )),
            });
        }

        Ok(InstallReport {
            version: self.version.clone(),
            cached,
            reused: false,
            repaired,
        })
    }

    async fn holds_every_entry(
        &self,
        requests: &[(&str, N::Request)],
    ) -> Result<bool, CacheError> {
        for (_, request) in requests {
            let key = request.cache_key();
            if self
                .store
                .match_request(&self.version, &key)
                .await
                .map_err(CacheError::Store)?
                .is_none()
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Applies the stale bucket policy and returns the names of evicted buckets.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] when buckets cannot be listed or deleted.
    pub async fn activate(&self) -> Result<Vec<String>, CacheError> {
        if self.stale_buckets == StaleBucketPolicy::Retain {
            return Ok(Vec::new());
        }

        let mut evicted = Vec::new();
        let names = self.store.bucket_names().await.map_err(CacheError::Store)?;
        for name in names.into_iter().filter(|name| *name != self.version) {
            if self
                .store
                .delete_bucket(&name)
                .await
                .map_err(CacheError::Store)?
            {
                evicted.push(name);
            }
        }
        Ok(evicted)
    }

    /// Serves `request` cache-first.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] when the lookup fails and [`CacheError::Network`] when a
    /// miss cannot be fetched.
    pub async fn handle_fetch(
        &self,
        request: &N::Request,
    ) -> Result<FetchOutcome<N::Response>, CacheError> {
        let key = request.cache_key();
        if let Some(response) = self
            .store
            .match_request(&self.version, &key)
            .await
            .map_err(CacheError::Store)?
        {
            return Ok(FetchOutcome {
                key,
                source: ResponseSource::Cache,
                response,
            });
        }

        let response = self
            .network
            .fetch(request)
            .await
            .map_err(|reason| CacheError::Network {
                url: key.url.clone(),
                reason,
            })?;
        Ok(FetchOutcome {
            key,
            source: ResponseSource::Network,
            response,
        })
    }
}
