//! HTTP client side of the peer protocol.

use std::time::Duration;

use async_trait::async_trait;

use crate::peers::{FetchRequest, FetchResponse, PeerFetcher};

const FETCH_TIMEOUT: Duration = Duration::from_millis(500);
const FETCH_ATTEMPTS: usize = 3;

/// Fetches values from one remote peer over HTTP.
///
/// Retries are transport policy: bounded attempts with doubling backoff and
/// jitter. The cache core itself never retries.
pub struct HttpFetcher {
    /// The peer's address plus base path, e.g. `http://10.0.0.2:8002/_shardcache/`.
    base_url: String,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(base_url: String, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }

    async fn get_with_retry(&self, url: String) -> anyhow::Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..FETCH_ATTEMPTS {
            let response = self
                .client
                .get(url.clone())
                .timeout(FETCH_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == FETCH_ATTEMPTS {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("retry attempts exhausted"))
    }
}

#[async_trait]
impl PeerFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<FetchResponse> {
        let url = format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(&request.group),
            urlencoding::encode(&request.key),
        );

        let response = self.get_with_retry(url).await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("peer returned {}", response.status()));
        }

        let body = response.bytes().await?;
        let decoded: FetchResponse = bincode::deserialize(&body)?;
        Ok(decoded)
    }
}
