//! HTTP Transport Module
//!
//! The built-in transport between peers. One [`pool::HttpPool`] per node
//! plays both sides of the protocol:
//!
//! - **Server**: an axum router under the base path answers
//!   `GET <base>/:group/:key` with the bincode-encoded value, resolving the
//!   group through the process-wide registry.
//! - **Client**: a [`fetcher::HttpFetcher`] per remote peer issues the same
//!   request against that peer's base URL, with bounded retry.
//!
//! Membership updates rebuild the placement ring and the fetcher table
//! atomically; the pool's lock is never held across network I/O.

pub mod fetcher;
pub mod pool;


/// Path prefix the peer protocol lives under.
pub const DEFAULT_BASE_PATH: &str = "/_shardcache/";

/// Virtual-node multiplier for the placement ring.
pub const DEFAULT_REPLICAS: usize = 50;
