#[cfg(test)]
mod tests {
    use crate::error::CacheError;
    use crate::group::flight::SingleFlight;
    use crate::group::{Group, Loader, LoaderFn, get_group};
    use crate::peers::{FetchRequest, FetchResponse, PeerFetcher, PeerPicker};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Loader over a fixed table, counting how often it runs.
    struct TableLoader {
        table: HashMap<&'static str, &'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl TableLoader {
        fn scores() -> Self {
            Self::scores_counted().0
        }

        fn scores_counted() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let loader = Self {
                table: HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]),
                calls: calls.clone(),
            };
            (loader, calls)
        }
    }

    #[async_trait]
    impl Loader for TableLoader {
        async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.table.get(key) {
                Some(value) => Ok(value.as_bytes().to_vec()),
                None => Err(anyhow::anyhow!("{key} not exist")),
            }
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl PeerFetcher for FailingFetcher {
        async fn fetch(&self, _request: &FetchRequest) -> anyhow::Result<FetchResponse> {
            Err(anyhow::anyhow!("peer unreachable"))
        }
    }

    struct FixedFetcher {
        value: Vec<u8>,
    }

    #[async_trait]
    impl PeerFetcher for FixedFetcher {
        async fn fetch(&self, _request: &FetchRequest) -> anyhow::Result<FetchResponse> {
            Ok(FetchResponse {
                value: self.value.clone(),
            })
        }
    }

    /// Routes every key to the single fetcher it was built with.
    struct StaticPicker {
        fetcher: Arc<dyn PeerFetcher>,
    }

    impl PeerPicker for StaticPicker {
        fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerFetcher>> {
            Some(self.fetcher.clone())
        }
    }

    // ============================================================
    // GROUP LOOKUPS
    // ============================================================

    #[tokio::test]
    async fn test_group_empty_key_is_invalid() {
        let group = Group::new("empty-key", 1024, TableLoader::scores());
        assert_eq!(group.get("").await, Err(CacheError::InvalidKey));
    }

    #[tokio::test]
    async fn test_group_miss_loads_and_caches() {
        let (loader, calls) = TableLoader::scores_counted();
        let group = Group::new("scores-hit-miss", 1024, loader);

        let first = group.get("Tom").await.unwrap();
        assert_eq!(first.as_str(), "630");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(group.stats().entries, 1);

        // Second lookup is served from the cache; the loader does not run.
        let second = group.get("Tom").await.unwrap();
        assert_eq!(second.as_str(), "630");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(group.stats().entries, 1);
    }

    #[tokio::test]
    async fn test_group_loader_runs_once_per_key() {
        let group = Group::new(
            "loader-once",
            1024,
            LoaderFn::new({
                let calls = Arc::new(AtomicUsize::new(0));
                move |key: String| {
                    let calls = calls.clone();
                    async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        Ok(format!("{key}:{n}").into_bytes())
                    }
                }
            }),
        );

        assert_eq!(group.get("alpha").await.unwrap().as_str(), "alpha:0");
        assert_eq!(group.get("alpha").await.unwrap().as_str(), "alpha:0");
        assert_eq!(group.get("beta").await.unwrap().as_str(), "beta:1");
    }

    #[tokio::test]
    async fn test_group_unknown_key_propagates_loader_error() {
        let group = Group::new("loader-error", 1024, TableLoader::scores());

        match group.get("unknown").await {
            Err(CacheError::Loader(msg)) => assert!(msg.contains("unknown")),
            other => panic!("expected loader error, got {other:?}"),
        }
        // Failures are never cached.
        assert_eq!(group.stats().entries, 0);
    }

    #[tokio::test]
    async fn test_group_peer_failure_falls_back_to_loader() {
        let group = Group::new("peer-fallback", 1024, TableLoader::scores());
        group.register_peers(Arc::new(StaticPicker {
            fetcher: Arc::new(FailingFetcher),
        }));

        let view = group.get("Sam").await.unwrap();
        assert_eq!(view.as_str(), "567");
    }

    #[tokio::test]
    async fn test_group_remote_hit_is_not_stored_locally() {
        let group = Group::new("peer-hit", 1024, TableLoader::scores());
        group.register_peers(Arc::new(StaticPicker {
            fetcher: Arc::new(FixedFetcher {
                value: b"remote-value".to_vec(),
            }),
        }));

        let view = group.get("Tom").await.unwrap();
        assert_eq!(view.as_str(), "remote-value");
        // The owner is authoritative; this node keeps nothing.
        assert_eq!(group.stats().entries, 0);
    }

    #[tokio::test]
    #[should_panic(expected = "register_peers called more than once")]
    async fn test_group_register_peers_twice_panics() {
        let group = Group::new("double-register", 1024, TableLoader::scores());
        let picker = || {
            Arc::new(StaticPicker {
                fetcher: Arc::new(FailingFetcher),
            })
        };
        group.register_peers(picker());
        group.register_peers(picker());
    }

    #[tokio::test]
    async fn test_group_concurrent_gets_share_one_load() {
        let counter = Arc::new(AtomicUsize::new(0));
        let group = Group::new(
            "concurrent-gets",
            1024,
            LoaderFn::new({
                let counter = counter.clone();
                move |_key: String| {
                    let counter = counter.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        Ok(n.to_string().into_bytes())
                    }
                }
            }),
        );

        let mut handles = Vec::new();
        for _ in 0..10 {
            let group = group.clone();
            handles.push(tokio::spawn(async move {
                group.get("hot-key").await.unwrap()
            }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap());
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1, "loader ran once");
        assert!(values.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(values[0].as_str(), "1");
    }

    // ============================================================
    // REGISTRY
    // ============================================================

    #[tokio::test]
    async fn test_registry_lookup_by_name() {
        let group = Group::new("registry-lookup", 1024, TableLoader::scores());

        let found = get_group("registry-lookup").expect("group should be registered");
        assert_eq!(found.name(), group.name());
        assert!(get_group("registry-no-such-group").is_none());
    }

    #[tokio::test]
    async fn test_registry_reregistration_replaces() {
        let _first = Group::new("registry-replace", 1024, TableLoader::scores());
        let second = Group::new(
            "registry-replace",
            1024,
            LoaderFn::new(|_key: String| async move { Ok(b"replacement".to_vec()) }),
        );

        let found = get_group("registry-replace").unwrap();
        assert_eq!(found.get("x").await.unwrap().as_str(), "replacement");
        assert!(Arc::ptr_eq(&found, &second));
    }

    // ============================================================
    // SINGLE-FLIGHT
    // ============================================================

    #[tokio::test]
    async fn test_flight_coalesces_concurrent_calls() {
        let flight = Arc::new(SingleFlight::<u64>::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let flight = flight.clone();
            let runs = runs.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .run("k", async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        runs.fetch_add(1, Ordering::SeqCst);
                        Ok(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flight_shares_errors_with_waiters() {
        let flight = Arc::new(SingleFlight::<u64>::new());

        let leader = {
            let flight = flight.clone();
            tokio::spawn(async move {
                flight
                    .run("bad", async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err(CacheError::Loader("boom".into()))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let waiter = {
            let flight = flight.clone();
            tokio::spawn(async move { flight.run("bad", async { Ok(1) }).await })
        };

        let expected: Result<u64, CacheError> = Err(CacheError::Loader("boom".into()));
        assert_eq!(leader.await.unwrap(), expected);
        assert_eq!(waiter.await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_flight_keys_do_not_interfere() {
        let flight = SingleFlight::<&'static str>::new();
        let (a, b) = tokio::join!(
            flight.run("a", async { Ok("value-a") }),
            flight.run("b", async { Ok("value-b") }),
        );
        assert_eq!(a, Ok("value-a"));
        assert_eq!(b, Ok("value-b"));
    }

    #[tokio::test]
    async fn test_flight_aborted_leader_releases_waiters_and_key() {
        let flight = Arc::new(SingleFlight::<u64>::new());

        let leader = {
            let flight = flight.clone();
            tokio::spawn(async move {
                flight
                    .run("stuck", async {
                        std::future::pending::<()>().await;
                        unreachable!()
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let waiter = {
            let flight = flight.clone();
            tokio::spawn(async move { flight.run("stuck", async { Ok(7) }).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        leader.abort();
        assert_eq!(waiter.await.unwrap(), Err(CacheError::LoadAborted));

        // The slot was cleared, so a fresh call runs its own producer.
        assert_eq!(flight.run("stuck", async { Ok(7) }).await, Ok(7));
    }
}
