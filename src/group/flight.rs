//! Single-flight: at most one in-flight load per key.
//!
//! The first caller for a key becomes the leader and runs the producer;
//! everyone who arrives while it is in flight parks on a completion channel
//! and receives a clone of the leader's result. The in-flight map's mutex is
//! only ever held for map bookkeeping, never across the producer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::{CacheError, Result};

type Waiters<T> = Vec<oneshot::Sender<Result<T>>>;

/// Coalesces concurrent loads of the same key into one producer run.
pub struct SingleFlight<T> {
    inflight: Mutex<HashMap<String, Waiters<T>>>,
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `producer` for `key`, unless a run is already in flight, in
    /// which case the call waits for that run and shares its outcome.
    pub async fn run<F>(&self, key: &str, producer: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let waiter = {
            let mut inflight = lock_inflight(&self.inflight);
            if let Some(waiters) = inflight.get_mut(key) {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Some(rx)
            } else {
                inflight.insert(key.to_string(), Vec::new());
                None
            }
        };

        if let Some(rx) = waiter {
            // The leader's channel closing without a value means it never
            // completed; the slot is already cleared for a retry.
            return match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(CacheError::LoadAborted),
            };
        }

        // Leader path. The guard clears the slot on every exit, including a
        // panicking or cancelled producer.
        let guard = FlightGuard {
            inflight: &self.inflight,
            key,
        };
        let outcome = producer.await;
        for tx in guard.finish() {
            let _ = tx.send(outcome.clone());
        }
        outcome
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the in-flight entry when the leader finishes or is dropped.
struct FlightGuard<'a, T> {
    inflight: &'a Mutex<HashMap<String, Waiters<T>>>,
    key: &'a str,
}

impl<T> FlightGuard<'_, T> {
    /// Clears the slot and hands back the parked waiters for completion.
    fn finish(self) -> Waiters<T> {
        let waiters = lock_inflight(self.inflight)
            .remove(self.key)
            .unwrap_or_default();
        std::mem::forget(self);
        waiters
    }
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        // Leader never completed; dropping the senders wakes the waiters
        // with a closed channel.
        lock_inflight(self.inflight).remove(self.key);
    }
}

fn lock_inflight<T>(
    inflight: &Mutex<HashMap<String, Waiters<T>>>,
) -> std::sync::MutexGuard<'_, HashMap<String, Waiters<T>>> {
    // Recover from poisoning: the map stays consistent because every
    // critical section is a plain map operation.
    inflight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
