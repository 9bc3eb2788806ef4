//! The cache namespace: loader + local store + optional peer picker.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::store::{CacheStats, CacheStore};
use crate::cache::view::ByteView;
use crate::error::{CacheError, Result};
use crate::peers::{FetchRequest, PeerFetcher, PeerPicker};

use super::flight::SingleFlight;
use super::registry;

/// Fetches a key's value from the source of truth on a cache miss.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

type BoxedLoaderFn = Box<
    dyn Fn(String) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + Send>>
        + Send
        + Sync,
>;

/// Adapter so a plain async closure can act as a [`Loader`].
pub struct LoaderFn {
    inner: BoxedLoaderFn,
}

impl LoaderFn {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<u8>>> + Send + 'static,
    {
        Self {
            inner: Box::new(move |key| Box::pin(f(key))),
        }
    }
}

#[async_trait]
impl Loader for LoaderFn {
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.inner)(key.to_string()).await
    }
}

/// A named cache namespace bound to one loader.
///
/// Immutable after construction except for the peer picker, which is wired
/// exactly once during bootstrap.
pub struct Group {
    name: String,
    loader: Box<dyn Loader>,
    cache: CacheStore,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: SingleFlight<ByteView>,
}

impl Group {
    /// Creates a group and registers it process-wide under `name`.
    ///
    /// Registering a name that already exists replaces the previous group.
    pub fn new(name: &str, cache_bytes: u64, loader: impl Loader + 'static) -> Arc<Self> {
        let group = Arc::new(Self {
            name: name.to_string(),
            loader: Box::new(loader),
            cache: CacheStore::new(cache_bytes),
            peers: OnceLock::new(),
            flight: SingleFlight::new(),
        });
        registry::register(group.clone());
        group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wires the peer picker used to route misses to their owning node.
    ///
    /// # Panics
    /// Panics if called more than once; the picker is bootstrap wiring, not
    /// runtime state.
    pub fn register_peers(&self, picker: Arc<dyn PeerPicker>) {
        if self.peers.set(picker).is_err() {
            panic!("register_peers called more than once on group {:?}", self.name);
        }
    }

    /// Looks up `key`, resolving misses through peers or the loader.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }

        if let Some(view) = self.cache.get(key) {
            debug!(group = %self.name, %key, "cache hit");
            return Ok(view);
        }

        self.load(key).await
    }

    /// Occupancy of the local store.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Miss path. Coalesced per key: however many callers pile onto a cold
    /// key, the owner is asked (or the loader invoked) once.
    async fn load(&self, key: &str) -> Result<ByteView> {
        self.flight
            .run(key, async {
                if let Some(picker) = self.peers.get()
                    && let Some(peer) = picker.pick_peer(key)
                {
                    match self.fetch_from_peer(peer.as_ref(), key).await {
                        Ok(view) => return Ok(view),
                        Err(e) => {
                            warn!(group = %self.name, %key, error = %e,
                                "peer fetch failed, falling back to loader");
                        }
                    }
                }
                self.load_locally(key).await
            })
            .await
    }

    /// Asks the owning peer for the value. The result is returned without
    /// populating the local store; the owner already caches it.
    async fn fetch_from_peer(&self, peer: &dyn PeerFetcher, key: &str) -> Result<ByteView> {
        let request = FetchRequest {
            group: self.name.clone(),
            key: key.to_string(),
        };
        let response = peer
            .fetch(&request)
            .await
            .map_err(|e| CacheError::PeerFetch(e.to_string()))?;
        Ok(ByteView::from(response.value))
    }

    /// Invokes the loader and caches the result locally.
    async fn load_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = self
            .loader
            .load(key)
            .await
            .map_err(|e| CacheError::Loader(e.to_string()))?;
        let view = ByteView::from(bytes);
        self.cache.add(key, view.clone());
        Ok(view)
    }
}
