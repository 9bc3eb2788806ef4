//! Error types surfaced by the cache core.
//!
//! The variants are `Clone` because a coalesced load hands the same outcome
//! to every waiter; loader and transport failures are carried as rendered
//! messages rather than source errors for that reason.

use thiserror::Error;

/// Unified error type for cache lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// `get` was called with an empty key.
    #[error("key is required")]
    InvalidKey,

    /// The backing loader failed; never cached.
    #[error("loader failed: {0}")]
    Loader(String),

    /// A remote owner could not serve the key. Logged and followed by a
    /// local-loader fallback; callers only see it if that also fails.
    #[error("peer fetch failed: {0}")]
    PeerFetch(String),

    /// The in-flight load for this key was dropped before completing.
    /// The key is cleared so a later call can retry.
    #[error("in-flight load aborted")]
    LoadAborted,
}

/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
