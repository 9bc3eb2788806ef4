//! Placement Ring Module
//!
//! Maps keys to the peer that owns them using consistent hashing.
//!
//! ## Mechanism
//! - **Virtual nodes**: each peer occupies `replicas` positions on the ring,
//!   smoothing out load skew between peers.
//! - **Determinism**: every node builds the ring from the same membership
//!   list with the same hash function and therefore computes the exact same
//!   owner for every key, with no coordination.
//!
//! All peers in a deployment must use the same hash function; mixing hashes
//! breaks the sharding contract.

pub mod hash;
