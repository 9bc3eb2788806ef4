//! Sharded In-Memory Cache Library
//!
//! This library crate defines the core of a distributed key-value cache
//! spread across a peer group. Each node is authoritative for the slice of
//! the keyspace that consistent hashing assigns to it; every other node
//! proxies lookups for those keys to the owner.
//!
//! ## Architecture Modules
//! The system is composed of five loosely coupled subsystems:
//!
//! - **`cache`**: The per-node storage layer. A byte-budgeted LRU store
//!   behind a mutex, holding immutable `ByteView` payloads.
//! - **`group`**: The namespace layer. Binds a user-supplied loader to a
//!   local store and orchestrates miss resolution, coalescing concurrent
//!   lookups of the same key through single-flight.
//! - **`ring`**: The placement layer. A consistent-hash ring with virtual
//!   nodes that every peer computes identically from the membership list.
//! - **`peers`**: The transport contract. `PeerPicker`/`PeerFetcher`
//!   capabilities plus the wire message shapes, so transports stay
//!   interchangeable.
//! - **`http`**: The built-in transport. An axum server and reqwest client
//!   speaking bincode-encoded values under a shared base path.

pub mod cache;
pub mod error;
pub mod group;
pub mod http;
pub mod peers;
pub mod ring;
