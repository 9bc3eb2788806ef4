//! Cache node binary.
//!
//! Starts one peer of the cache deployment: the peer-protocol server on
//! `--bind`, and optionally a user-facing API server on `--api`. Membership
//! is static, passed as repeated `--peer` flags (including this node's own
//! address).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use shardcache::group::{Group, LoaderFn};
use shardcache::http::pool::HttpPool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardcache=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --bind <addr:port> [--api <addr:port>] [--peer <url>]...",
            args[0]
        );
        eprintln!("Example: {} --bind 127.0.0.1:8001", args[0]);
        eprintln!(
            "Example: {} --bind 127.0.0.1:8001 --api 127.0.0.1:9999 \\",
            args[0]
        );
        eprintln!("             --peer http://127.0.0.1:8001 --peer http://127.0.0.1:8002");
        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut api_addr: Option<SocketAddr> = None;
    let mut peer_urls: Vec<String> = vec![];

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--api" => {
                api_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--peer" => {
                peer_urls.push(args[i + 1].clone());
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.expect("--bind is required");
    let self_url = format!("http://{bind_addr}");
    if peer_urls.is_empty() {
        peer_urls.push(self_url.clone());
    }

    let cache_bytes = std::env::var("CACHE_BYTES")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(2 << 10);

    tracing::info!("Starting cache node on {}", self_url);
    tracing::info!("Membership: {:?}", peer_urls);

    // 1. The demo namespace, backed by a slow static table:
    let group = scores_group(cache_bytes);

    // 2. Peer wiring:
    let pool = HttpPool::new(&self_url);
    pool.set_peers(peer_urls.iter());
    group.register_peers(pool.clone());

    // 3. Optional user-facing API server:
    if let Some(api_addr) = api_addr {
        let api_group = group.clone();
        tokio::spawn(async move {
            let app = Router::new()
                .route("/api", get(handle_api))
                .route("/stats", get(handle_stats))
                .layer(Extension(api_group));

            tracing::info!("API server listening on {}", api_addr);
            let listener = tokio::net::TcpListener::bind(api_addr).await.unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    }

    // 4. Peer-protocol server:
    tracing::info!("Peer server listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, pool.router()).await?;

    Ok(())
}

/// The "scores" namespace over a stand-in slow datastore.
fn scores_group(cache_bytes: u64) -> Arc<Group> {
    const DB: [(&str, &str); 3] = [("Tom", "630"), ("Jack", "589"), ("Sam", "567")];

    Group::new(
        "scores",
        cache_bytes,
        LoaderFn::new(|key: String| async move {
            tracing::info!(%key, "slow datastore lookup");
            match DB.iter().find(|(name, _)| *name == key) {
                Some((_, score)) => Ok(score.as_bytes().to_vec()),
                None => Err(anyhow::anyhow!("{key} not exist")),
            }
        }),
    )
}

#[derive(Deserialize)]
struct ApiQuery {
    key: String,
}

async fn handle_api(
    Extension(group): Extension<Arc<Group>>,
    Query(query): Query<ApiQuery>,
) -> Response {
    match group.get(&query.key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.as_slice(),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn handle_stats(Extension(group): Extension<Arc<Group>>) -> String {
    let stats = group.stats();
    format!(
        "group={} entries={} used_bytes={}\n",
        group.name(),
        stats.entries,
        stats.used_bytes
    )
}
