//! Peer pool: membership, peer selection, and the server-side router.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{debug, error, info};

use crate::group::get_group;
use crate::peers::{FetchResponse, PeerFetcher, PeerPicker};
use crate::ring::hash::HashRing;

use super::fetcher::HttpFetcher;
use super::{DEFAULT_BASE_PATH, DEFAULT_REPLICAS};

/// One node's view of the peer group.
///
/// Holds the node's own address, the placement ring, and a fetcher per
/// remote peer. [`HttpPool::set_peers`] replaces ring and fetchers together
/// under one lock, so a concurrent [`PeerPicker::pick_peer`] sees either the
/// old membership or the new one, never a mix.
pub struct HttpPool {
    self_addr: String,
    base_path: String,
    replicas: usize,
    client: reqwest::Client,
    state: Mutex<PoolState>,
}

struct PoolState {
    ring: HashRing,
    fetchers: HashMap<String, Arc<HttpFetcher>>,
}

impl HttpPool {
    /// Creates a pool for the node reachable at `self_addr`
    /// (e.g. `http://10.0.0.1:8001`).
    pub fn new(self_addr: &str) -> Arc<Self> {
        Self::with_config(self_addr, DEFAULT_BASE_PATH, DEFAULT_REPLICAS)
    }

    /// Creates a pool with a custom base path and virtual-node count. Both
    /// are deployment constants: every peer must use the same values.
    pub fn with_config(self_addr: &str, base_path: &str, replicas: usize) -> Arc<Self> {
        Arc::new(Self {
            self_addr: self_addr.to_string(),
            base_path: base_path.to_string(),
            replicas,
            client: reqwest::Client::new(),
            state: Mutex::new(PoolState {
                ring: HashRing::new(replicas, None),
                fetchers: HashMap::new(),
            }),
        })
    }

    /// Replaces the full membership list, rebuilding the placement ring and
    /// the peer fetcher table. The list should include this node itself.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers
            .into_iter()
            .map(|peer| peer.as_ref().to_string())
            .collect();

        let mut ring = HashRing::new(self.replicas, None);
        ring.add(peers.iter());

        let mut fetchers = HashMap::with_capacity(peers.len());
        for peer in &peers {
            let base_url = format!("{}{}", peer, self.base_path);
            fetchers.insert(
                peer.clone(),
                Arc::new(HttpFetcher::new(base_url, self.client.clone())),
            );
        }

        let mut state = lock_state(&self.state);
        state.ring = ring;
        state.fetchers = fetchers;
        info!(node = %self.self_addr, peers = peers.len(), "peer membership updated");
    }

    /// Builds the server-side router for the peer protocol. Only the base
    /// path is routed; anything else is refused with a 404.
    pub fn router(self: &Arc<Self>) -> Router {
        let route = format!("{}:group/:key", self.base_path);
        Router::new()
            .route(&route, get(handle_fetch))
            .layer(Extension(self.clone()))
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>> {
        let state = lock_state(&self.state);
        let owner = state.ring.get(key)?;
        if owner == self.self_addr {
            return None;
        }
        debug!(node = %self.self_addr, %owner, %key, "picked peer");
        let fetcher: Arc<dyn PeerFetcher> = state.fetchers.get(owner)?.clone();
        Some(fetcher)
    }
}

/// Serves `GET <base>/:group/:key` for other peers.
async fn handle_fetch(
    Extension(pool): Extension<Arc<HttpPool>>,
    Path((group_name, key)): Path<(String, String)>,
) -> Response {
    debug!(node = %pool.self_addr, group = %group_name, %key, "serving peer fetch");

    let Some(group) = get_group(&group_name) else {
        return (
            StatusCode::NOT_FOUND,
            format!("no such group: {group_name}"),
        )
            .into_response();
    };

    let view = match group.get(&key).await {
        Ok(view) => view,
        Err(e) => {
            error!(node = %pool.self_addr, group = %group_name, %key, error = %e,
                "peer fetch failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let body = FetchResponse {
        value: view.as_slice(),
    };
    match bincode::serialize(&body) {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode peer response");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn lock_state(state: &Mutex<PoolState>) -> std::sync::MutexGuard<'_, PoolState> {
    state.lock().expect("pool lock poisoned")
}
