//! Peer Contract Module
//!
//! The abstractions a group uses to reach the rest of the deployment, and
//! the wire messages exchanged with it. Transports implement these traits;
//! the core never sees sockets or URLs.
//!
//! - **[`PeerPicker`]** answers "who owns this key" — `None` means the local
//!   node (or that no remote owner is known), so the caller falls through to
//!   its own loader.
//! - **[`PeerFetcher`]** retrieves a value from one specific remote peer.
//! - **[`FetchRequest`]/[`FetchResponse`]** are the wire schema. Adapters
//!   encode the response with bincode; the request travels in the URL path.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Asks the owner of (`group`, `key`) for its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub group: String,
    pub key: String,
}

/// The owner's reply: raw value bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub value: Vec<u8>,
}

/// Selects the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the owning peer's fetcher, or `None` when the key belongs to
    /// the local node or no remote owner is known.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>>;
}

/// Retrieves a value from a specific remote peer.
#[async_trait]
pub trait PeerFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<FetchResponse>;
}
