//! Process-wide lookup of groups by name.
//!
//! Transports resolve incoming requests against this registry, so it lives
//! for the whole process. It is a leaf: nothing is ever looked up while a
//! cache or flight lock is held.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::namespace::Group;

static GROUPS: Lazy<DashMap<String, Arc<Group>>> = Lazy::new(DashMap::new);

/// Registers a group under its name. Last writer wins.
pub(super) fn register(group: Arc<Group>) {
    GROUPS.insert(group.name().to_string(), group);
}

/// Looks up a previously created group.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    GROUPS.get(name).map(|entry| entry.value().clone())
}
